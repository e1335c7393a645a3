//! Shutdown coordination for the transport.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

/// Process-wide "shutting down" flag.
///
/// Starts false, flips to true exactly once and never resets. Clones share
/// the same flag. Reads on the upgrade path are a single atomic load;
/// waiters use [`ShutdownState::triggered`].
#[derive(Debug, Clone)]
pub struct ShutdownState {
    flag: Arc<AtomicBool>,
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownState {
    /// Create a new, untriggered shutdown state.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            tx: Arc::new(tx),
        }
    }

    /// Begin shutdown. Returns `true` only for the call that flipped the flag.
    pub fn trigger(&self) -> bool {
        let flipped = self
            .flag
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if flipped {
            self.tx.send_replace(true);
        }
        flipped
    }

    /// Whether shutdown has begun.
    pub fn is_shutting_down(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Resolve once shutdown has begun (immediately if it already has).
    pub async fn triggered(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this cannot fail while we wait.
        let _ = rx.wait_for(|shutting_down| *shutting_down).await;
    }
}

impl Default for ShutdownState {
    fn default() -> Self {
        Self::new()
    }
}
