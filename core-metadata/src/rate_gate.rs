//! Process-wide spacing of MusicBrainz calls
//!
//! A turn is reserved synchronously when a key is admitted, so turns are
//! handed out in admission order no matter which task wakes first. Each turn
//! waits for the one before it to be granted, then for `min_interval` after
//! that grant. Spacing is measured from the real grant time, so a task that
//! wakes late pushes every later turn back with it.
//!
//! Every admitted resolution consumes a turn, even if its result becomes
//! known before the turn arrives.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug)]
pub(crate) struct RateGate {
    min_interval: Duration,
    state: Mutex<GateState>,
}

#[derive(Debug, Default)]
struct GateState {
    /// Resolves once the most recently reserved turn is granted
    tail: Option<oneshot::Receiver<()>>,
    last_grant: Option<Instant>,
}

/// A reserved place in the queue
#[derive(Debug)]
pub(crate) struct Turn {
    previous: Option<oneshot::Receiver<()>>,
    granted: oneshot::Sender<()>,
}

impl RateGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            state: Mutex::new(GateState::default()),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    fn state(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take the next place in the queue
    pub fn reserve(&self) -> Turn {
        let (granted, next) = oneshot::channel();
        let previous = self.state().tail.replace(next);
        Turn { previous, granted }
    }

    /// Wait for `turn` and return the instant it was granted
    pub async fn wait(&self, turn: Turn) -> Instant {
        if let Some(previous) = turn.previous {
            // An error means the earlier turn was abandoned; its place is free
            let _ = previous.await;
        }

        let earliest = self.state().last_grant.map(|last| last + self.min_interval);
        if let Some(earliest) = earliest {
            let now = Instant::now();
            if earliest > now {
                debug!(wait = ?(earliest - now), "Rate limiting: waiting for turn");
                tokio::time::sleep_until(earliest).await;
            }
        }

        let granted = Instant::now();
        self.state().last_grant = Some(granted);
        let _ = turn.granted.send(());
        granted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_turns_are_granted_in_order_and_spaced() {
        let gate = Arc::new(RateGate::new(Duration::from_millis(1000)));
        let start = Instant::now();

        let turns: Vec<Turn> = (0..3).map(|_| gate.reserve()).collect();
        let grants = Arc::new(Mutex::new(Vec::new()));

        // Start waiting in reverse order; grants still follow reservation order
        let mut handles = Vec::new();
        for (index, turn) in turns.into_iter().enumerate().rev() {
            let gate = Arc::clone(&gate);
            let grants = Arc::clone(&grants);
            handles.push(tokio::spawn(async move {
                let at = gate.wait(turn).await;
                grants.lock().unwrap().push((index, at));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let grants = grants.lock().unwrap().clone();
        let order: Vec<usize> = grants.iter().map(|(index, _)| *index).collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert_eq!(grants[0].1, start);
        assert!(grants[1].1 - grants[0].1 >= Duration::from_millis(1000));
        assert!(grants[2].1 - grants[1].1 >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_gate_grants_immediately() {
        let gate = RateGate::new(Duration::from_millis(1000));
        let first = gate.reserve();
        assert_eq!(gate.wait(first).await, Instant::now());

        tokio::time::advance(Duration::from_secs(5)).await;

        let second = gate.reserve();
        assert_eq!(gate.wait(second).await, Instant::now());
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_grant_pushes_next_turn_back() {
        let gate = RateGate::new(Duration::from_millis(1000));
        let first = gate.reserve();
        let second = gate.reserve();

        // Both reserved slots pass before the first turn is picked up
        tokio::time::advance(Duration::from_millis(2500)).await;

        let first_at = gate.wait(first).await;
        let second_at = gate.wait(second).await;

        assert_eq!(second_at - first_at, Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_turn_frees_its_place() {
        let gate = RateGate::new(Duration::from_millis(1000));
        let start = Instant::now();

        let abandoned = gate.reserve();
        let next = gate.reserve();
        drop(abandoned);

        assert_eq!(gate.wait(next).await, start);
    }
}
