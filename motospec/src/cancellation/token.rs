//! Cancellation token for cooperative cancellation.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Default)]
struct Shared {
    /// Whether cancellation has been requested.
    cancelled: AtomicBool,
    /// The reason for cancellation (first one wins).
    reason: RwLock<Option<String>>,
    /// Wakes tasks parked in [`CancellationToken::cancelled`].
    notify: Notify,
}

/// A shared token for cooperative cancellation.
///
/// Clones observe the same state. The pipeline owner creates the token and
/// hands clones to every worker; workers only ever observe it.
///
/// Cancellation is idempotent - only the first cancellation reason is kept.
#[derive(Clone, Default)]
pub struct CancellationToken {
    shared: Arc<Shared>,
}

impl CancellationToken {
    /// Creates a new cancellation token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation and wakes every waiter.
    ///
    /// Only the first call has an effect; later reasons are ignored.
    pub fn cancel(&self, reason: impl Into<String>) {
        let mut slot = self.shared.reason.write();
        if self.shared.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        *slot = Some(reason.into());
        drop(slot);
        self.shared.notify.notify_waiters();
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::SeqCst)
    }

    /// Returns the cancellation reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.shared.reason.read().clone()
    }

    /// Completes once cancellation has been requested.
    ///
    /// Safe to race inside `tokio::select!`: dropping the future loses nothing.
    pub async fn cancelled(&self) {
        loop {
            // Created before the flag check so a concurrent `cancel` cannot slip between.
            let notified = self.shared.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .field("reason", &self.reason())
            .finish()
    }
}
