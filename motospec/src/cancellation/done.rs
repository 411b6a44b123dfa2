//! One-shot completion signal.

use tokio::sync::watch;

/// Creates a linked notifier/observer pair.
#[must_use]
pub fn done_signal() -> (DoneNotifier, Done) {
    let (tx, rx) = watch::channel(false);
    (DoneNotifier { tx }, Done { rx })
}

/// Firing side of a [`Done`] signal.
///
/// `fire` consumes the notifier, so a signal can be raised at most once.
#[derive(Debug)]
pub struct DoneNotifier {
    tx: watch::Sender<bool>,
}

impl DoneNotifier {
    /// Marks the owning component as fully terminated.
    pub fn fire(self) {
        self.tx.send_replace(true);
    }
}

/// Observer of a one-shot completion signal. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Done {
    rx: watch::Receiver<bool>,
}

impl Done {
    /// Returns true once the signal fired.
    #[must_use]
    pub fn is_done(&self) -> bool {
        *self.rx.borrow()
    }

    /// Waits until the signal fires.
    ///
    /// Also returns if the notifier was dropped without firing, which only
    /// happens when its owner panicked; check [`Done::is_done`] to tell them apart.
    pub async fn wait(&mut self) {
        let _ = self.rx.wait_for(|done| *done).await;
    }
}
