//! The worker side a stage talks to.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::cancellation::CancellationToken;
use crate::core::{ExitReason, Item};
use crate::document::Document;
use crate::errors::ScrapeError;
use crate::fetch::{ClientStats, FetchClient, FetchRequest};

/// Returned by [`WorkerHandle::emit`] once the worker must stop producing.
///
/// A stage receiving this should return; the worker exits after it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Halted {
    /// The pipeline was cancelled.
    #[error("pipeline cancelled")]
    Cancelled,
    /// The next worker is gone and will not read further items.
    #[error("downstream closed")]
    DownstreamClosed,
}

impl From<Halted> for ExitReason {
    fn from(halt: Halted) -> Self {
        match halt {
            Halted::Cancelled => Self::Cancelled,
            Halted::DownstreamClosed => Self::DownstreamClosed,
        }
    }
}

/// What a stage sees of its owning worker.
///
/// Handed to [`Stage::process`](crate::stages::Stage::process) by reference
/// for every item.
pub struct WorkerHandle {
    stage: String,
    output: mpsc::Sender<Item>,
    errors: mpsc::Sender<ScrapeError>,
    cancel: CancellationToken,
    client: FetchClient,
    emitted: AtomicUsize,
    reported: AtomicUsize,
    halted: OnceLock<Halted>,
}

impl WorkerHandle {
    pub(crate) fn new(
        stage: String,
        output: mpsc::Sender<Item>,
        errors: mpsc::Sender<ScrapeError>,
        cancel: CancellationToken,
        client: FetchClient,
    ) -> Self {
        Self {
            stage,
            output,
            errors,
            cancel,
            client,
            emitted: AtomicUsize::new(0),
            reported: AtomicUsize::new(0),
            halted: OnceLock::new(),
        }
    }

    /// Name of the owning stage.
    #[must_use]
    pub fn stage_name(&self) -> &str {
        &self.stage
    }

    /// Whether the pipeline has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Forwards `item` to the next worker, waiting for it to be taken.
    ///
    /// Fails without sending if the pipeline is cancelled, before or while
    /// waiting, or if the next worker has gone away.
    pub async fn emit(&self, item: Item) -> Result<(), Halted> {
        if let Some(halt) = self.halted() {
            return Err(halt);
        }
        if self.cancel.is_cancelled() {
            return Err(self.halt(Halted::Cancelled));
        }

        debug!(stage = %self.stage, item = %item, "OUT");
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(self.halt(Halted::Cancelled)),
            sent = self.output.send(item) => match sent {
                Ok(()) => {
                    self.emitted.fetch_add(1, Ordering::Relaxed);
                    Ok(())
                }
                Err(_) => Err(self.halt(Halted::DownstreamClosed)),
            },
        }
    }

    /// Puts `err` on the shared error channel, waiting for capacity.
    pub async fn report(&self, err: ScrapeError) {
        self.reported.fetch_add(1, Ordering::Relaxed);
        if let Err(mpsc::error::SendError(err)) = self.errors.send(err).await {
            warn!(stage = %self.stage, "error sink gone, dropping: {}", err);
        }
    }

    /// Fetches `request` through the worker's own client.
    ///
    /// A failure observed after cancellation halts the worker; such errors
    /// are abandonments, not page failures.
    pub async fn fetch(&self, request: FetchRequest) -> Result<String, ScrapeError> {
        let result = self.client.fetch(request).await;
        if result.is_err() && self.cancel.is_cancelled() {
            self.halt(Halted::Cancelled);
        }
        result
    }

    /// Fetches `request`, parses the body and runs `extract` on it.
    ///
    /// The parsed document never outlives the call, so the surrounding
    /// future stays `Send`.
    pub async fn fetch_document<T, F>(&self, request: FetchRequest, extract: F) -> Result<T, ScrapeError>
    where
        F: FnOnce(&Document) -> T + Send,
    {
        let body = self.fetch(request).await?;
        Ok(extract(&Document::parse(&body)))
    }

    /// Why the worker must stop producing, once it must.
    #[must_use]
    pub fn halted(&self) -> Option<Halted> {
        self.halted.get().copied()
    }

    fn halt(&self, halt: Halted) -> Halted {
        *self.halted.get_or_init(|| halt)
    }

    pub(crate) fn emitted(&self) -> usize {
        self.emitted.load(Ordering::Relaxed)
    }

    pub(crate) fn reported(&self) -> usize {
        self.reported.load(Ordering::Relaxed)
    }

    /// Closes the fetch client and waits for it to finish.
    pub(crate) async fn shutdown_client(&mut self) -> ClientStats {
        self.client.join().await
    }
}

impl std::fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("stage", &self.stage)
            .field("emitted", &self.emitted())
            .field("reported", &self.reported())
            .field("halted", &self.halted())
            .finish_non_exhaustive()
    }
}
