//! One stage, one task.
//!
//! A worker reads items from its input, waits the inter-item delay, runs
//! its stage and lets the stage emit into the output. On input exhaustion
//! or cancellation it tears down in a fixed order:
//!
//! 1. close its fetch client and wait for it to finish
//! 2. drop its output sender, so the next worker sees end-of-input
//! 3. close and drain its input, so a blocked upstream sender is released
//!
//! and only then returns its [`WorkerReport`].

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, info_span, Instrument};

use super::handle::WorkerHandle;
use crate::cancellation::CancellationToken;
use crate::core::{ExitReason, Item, WorkerState};
use crate::errors::ScrapeError;
use crate::fetch::{ClientStats, FetchClient, Fetcher, RetryPolicy};
use crate::stages::Stage;

/// What a worker did before it closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerReport {
    /// Stage name.
    pub stage: String,
    /// Items handed to the stage.
    pub processed: usize,
    /// Items forwarded downstream.
    pub emitted: usize,
    /// Errors put on the error channel.
    pub errors: usize,
    /// Items received but never processed.
    pub discarded: usize,
    /// Why the run loop stopped.
    pub exit: ExitReason,
    /// Fetch client counters.
    #[serde(skip)]
    pub client: ClientStats,
}

pub(crate) struct Worker {
    stage: Arc<dyn Stage>,
    input: mpsc::Receiver<Item>,
    output: mpsc::Sender<Item>,
    errors: mpsc::Sender<ScrapeError>,
    cancel: CancellationToken,
    fetcher: Arc<dyn Fetcher>,
    retry: RetryPolicy,
    interval: Duration,
}

impl Worker {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        stage: Arc<dyn Stage>,
        input: mpsc::Receiver<Item>,
        output: mpsc::Sender<Item>,
        errors: mpsc::Sender<ScrapeError>,
        cancel: CancellationToken,
        fetcher: Arc<dyn Fetcher>,
        retry: RetryPolicy,
        interval: Duration,
    ) -> Self {
        Self {
            stage,
            input,
            output,
            errors,
            cancel,
            fetcher,
            retry,
            interval,
        }
    }

    pub(crate) fn name(&self) -> &str {
        self.stage.name()
    }

    /// Runs until input exhaustion or cancellation, then tears down.
    pub(crate) async fn run(self) -> WorkerReport {
        let span = info_span!("worker", stage = %self.name());
        self.run_inner().instrument(span).await
    }

    async fn run_inner(self) -> WorkerReport {
        let Self {
            stage,
            mut input,
            output,
            errors,
            cancel,
            fetcher,
            retry,
            interval,
        } = self;
        let name = stage.name().to_string();

        let client = FetchClient::spawn(name.clone(), fetcher, retry, cancel.clone());
        let mut handle = WorkerHandle::new(name.clone(), output, errors, cancel.clone(), client);
        let mut state = WorkerState::Idle;
        let mut processed = 0;
        let mut discarded = 0;

        let exit = loop {
            if let Some(halt) = handle.halted() {
                break ExitReason::from(halt);
            }

            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                received = input.recv() => Some(received),
            };
            let item = match next {
                None => break ExitReason::Cancelled,
                Some(None) => break ExitReason::InputExhausted,
                Some(Some(item)) => item,
            };

            transition(&mut state, WorkerState::Processing);
            debug!(item = %item, "IN");

            if !interval.is_zero() {
                let waited = tokio::select! {
                    biased;
                    () = cancel.cancelled() => false,
                    () = tokio::time::sleep(interval) => true,
                };
                if !waited {
                    discarded += 1;
                    break ExitReason::Cancelled;
                }
            }

            stage.process(&handle, item).await;
            processed += 1;
            transition(&mut state, WorkerState::Idle);
        };

        if exit == ExitReason::InputExhausted {
            transition(&mut state, WorkerState::Draining);
        }

        let client = handle.shutdown_client().await;
        let emitted = handle.emitted();
        let errors = handle.reported();
        drop(handle);

        input.close();
        while input.recv().await.is_some() {
            discarded += 1;
        }

        transition(&mut state, WorkerState::Closed);
        let report = WorkerReport {
            stage: name,
            processed,
            emitted,
            errors,
            discarded,
            exit,
            client,
        };
        info!(
            processed = report.processed,
            emitted = report.emitted,
            errors = report.errors,
            discarded = report.discarded,
            "worker closed: {}",
            report.exit
        );
        report
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("stage", &self.stage.name())
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

fn transition(state: &mut WorkerState, next: WorkerState) {
    debug!(from = %state, to = %next, "state");
    *state = next;
}
