//! Shared error channel consumer.
//!
//! Every worker holds a clone of one bounded error sender. The [`ErrorSink`]
//! owns the receiving end, classifies each error by [`ErrorKind`] and hands
//! it to the [`ErrorLog`] routed for that kind. It finishes once every
//! sender has been dropped.

mod targets;

pub use targets::{CollectingErrorLog, ErrorLog, FileErrorLog, TracingErrorLog};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::errors::{ErrorKind, ScrapeError};

/// Per-kind totals reported when the sink finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCounts {
    counts: BTreeMap<ErrorKind, usize>,
}

impl ErrorCounts {
    /// Count for one kind.
    #[must_use]
    pub fn get(&self, kind: ErrorKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Count over all kinds.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Count over the transport kinds.
    #[must_use]
    pub fn transport(&self) -> usize {
        ErrorKind::ALL
            .iter()
            .filter(|k| k.is_transport())
            .map(|k| self.get(*k))
            .sum()
    }

    fn bump(&mut self, kind: ErrorKind) {
        *self.counts.entry(kind).or_insert(0) += 1;
    }
}

/// Routes errors from the shared channel to their log targets.
#[derive(Clone)]
pub struct ErrorSink {
    routes: BTreeMap<ErrorKind, Arc<dyn ErrorLog>>,
}

impl Default for ErrorSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorSink {
    /// A sink that logs transport errors to a "client" tracing target and
    /// processing errors to a "processor" one.
    #[must_use]
    pub fn new() -> Self {
        Self::new_split(
            Arc::new(TracingErrorLog::new("client")),
            Arc::new(TracingErrorLog::new("processor")),
        )
    }

    /// Routes transport kinds to `client` and Processing to
    /// `processor`.
    #[must_use]
    pub fn new_split(client: Arc<dyn ErrorLog>, processor: Arc<dyn ErrorLog>) -> Self {
        let routes = ErrorKind::ALL
            .into_iter()
            .map(|kind| {
                let log = if kind.is_transport() { client.clone() } else { processor.clone() };
                (kind, log)
            })
            .collect();
        Self { routes }
    }

    /// Sends every kind to the same target.
    #[must_use]
    pub fn single(log: Arc<dyn ErrorLog>) -> Self {
        Self::new_split(log.clone(), log)
    }

    /// Classifies and records one error.
    pub fn route(&self, err: &ScrapeError) -> ErrorKind {
        let kind = err.kind();
        match self.routes.get(&kind) {
            Some(log) => log.record(kind, err),
            None => warn!(%kind, "no error log routed: {}", err),
        }
        kind
    }

    /// Drains `errors` on a blocking thread until every sender is gone.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(self, mut errors: mpsc::Receiver<ScrapeError>) -> JoinHandle<ErrorCounts> {
        tokio::task::spawn_blocking(move || {
            let mut counts = ErrorCounts::default();
            while let Some(err) = errors.blocking_recv() {
                counts.bump(self.route(&err));
            }
            debug!(total = counts.total(), "error sink drained");
            counts
        })
    }
}

impl std::fmt::Debug for ErrorSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorSink")
            .field("routes", &self.routes.keys().collect::<Vec<_>>())
            .finish()
    }
}
