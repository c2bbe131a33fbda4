//! # Event Bus System
//!
//! Broadcasts artist-cache changes and upstream source failures to anyone who
//! cares (views, diagnostics panels) using `tokio::sync::broadcast`.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{ArtistEvent, CoreEvent, EventBus};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut subscriber = event_bus.subscribe();
//!
//! event_bus.emit(CoreEvent::Artist(ArtistEvent::Cleared)).ok();
//!
//! assert_eq!(
//!     subscriber.recv().await.unwrap(),
//!     CoreEvent::Artist(ArtistEvent::Cleared)
//! );
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber was too slow and missed `n`
//!   events. Non-fatal; refresh from a snapshot and keep receiving.
//! - **`RecvError::Closed`**: every sender was dropped. Treat as shutdown.
//!
//! Emitting with no subscribers returns `Err`, which publishers ignore.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event published through the event bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Artist cache state changes
    Artist(ArtistEvent),
    /// Upstream lookup service diagnostics
    Source(SourceEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Artist(e) => e.description(),
            CoreEvent::Source(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Source(SourceEvent::Failed { .. }) => EventSeverity::Warning,
            CoreEvent::Artist(ArtistEvent::Resolved { .. }) => EventSeverity::Info,
            CoreEvent::Artist(ArtistEvent::Hydrated { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Artist Events
// ============================================================================

/// Changes to the resolved-artist cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum ArtistEvent {
    /// A resolution finished and was committed to the cache.
    Resolved {
        /// Normalized artist key
        key: String,
        /// `false` for a negative ("nothing found") entry
        found: bool,
    },
    /// One entry was removed on request.
    Removed { key: String },
    /// The whole cache was cleared.
    Cleared,
    /// Startup hydration finished.
    Hydrated {
        /// Entries merged in from durable storage
        loaded: usize,
    },
}

impl ArtistEvent {
    pub fn description(&self) -> &str {
        match self {
            ArtistEvent::Resolved { found: true, .. } => "Artist resolved",
            ArtistEvent::Resolved { found: false, .. } => "Artist not found",
            ArtistEvent::Removed { .. } => "Artist entry removed",
            ArtistEvent::Cleared => "Artist cache cleared",
            ArtistEvent::Hydrated { .. } => "Artist cache hydrated",
        }
    }
}

// ============================================================================
// Source Events
// ============================================================================

/// Diagnostics from the upstream lookup services.
///
/// Failures never reach `resolve` callers; this is the only place they are
/// observable besides the logs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SourceEvent {
    Failed {
        /// Service name, e.g. "musicbrainz"
        source: String,
        /// Normalized artist key being resolved
        key: String,
        message: String,
    },
}

impl SourceEvent {
    pub fn description(&self) -> &str {
        match self {
            SourceEvent::Failed { .. } => "Lookup service failed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Broadcast channel for [`CoreEvent`]s.
///
/// Cloning is cheap; all clones publish into the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// Subscribers that fall behind by more than `capacity` events receive
    /// `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(key: &str, found: bool) -> CoreEvent {
        CoreEvent::Artist(ArtistEvent::Resolved {
            key: key.to_string(),
            found,
        })
    }

    #[test]
    fn test_emit_without_subscribers_is_an_error() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
        assert!(bus.emit(CoreEvent::Artist(ArtistEvent::Cleared)).is_err());
    }

    #[tokio::test]
    async fn test_all_subscribers_receive_event() {
        let bus = EventBus::new(10);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        assert_eq!(bus.emit(resolved("radiohead", true)).unwrap(), 2);

        assert_eq!(first.recv().await.unwrap(), resolved("radiohead", true));
        assert_eq!(second.recv().await.unwrap(), resolved("radiohead", true));
    }

    #[test]
    fn test_source_failure_is_a_warning() {
        let event = CoreEvent::Source(SourceEvent::Failed {
            source: "deezer".to_string(),
            key: "bjork".to_string(),
            message: "HTTP 503".to_string(),
        });
        assert_eq!(event.severity(), EventSeverity::Warning);
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut subscriber = bus.subscribe();

        for i in 0..5 {
            bus.emit(resolved(&format!("artist-{}", i), true)).unwrap();
        }

        assert!(matches!(subscriber.recv().await, Err(RecvError::Lagged(3))));
        assert_eq!(subscriber.recv().await.unwrap(), resolved("artist-3", true));
    }

    #[test]
    fn test_descriptions_and_severity() {
        assert_eq!(resolved("x", false).description(), "Artist not found");
        assert_eq!(resolved("x", true).severity(), EventSeverity::Info);
        assert_eq!(
            CoreEvent::Artist(ArtistEvent::Removed {
                key: "x".to_string()
            })
            .severity(),
            EventSeverity::Debug
        );
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let json = serde_json::to_value(resolved("bjork", true)).unwrap();
        assert_eq!(json["type"], "Artist");
        assert_eq!(json["payload"]["event"], "Resolved");
        assert_eq!(json["payload"]["key"], "bjork");
    }
}
