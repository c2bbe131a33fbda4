//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by the artist metadata crates:
//! - Logging and tracing setup
//! - Configuration and bridge wiring
//! - Event bus for cache change notifications

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
