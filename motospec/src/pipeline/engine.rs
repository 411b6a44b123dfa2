//! Running a built pipeline.

use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::worker::{Worker, WorkerReport};
use crate::cancellation::{CancellationToken, Done, DoneNotifier};
use crate::core::{ExitReason, Item};
use crate::errors::ScrapeError;
use crate::sink::{ErrorCounts, ErrorSink};

/// The caller's ends of a built pipeline.
#[derive(Debug)]
pub struct PipelineHandles {
    /// Feeds the first stage. Drop it to signal end-of-input.
    pub input: mpsc::Sender<Item>,
    /// Items emitted by the last stage. Closes once the last worker is done.
    pub output: mpsc::Receiver<Item>,
    /// Fires once the whole pipeline, error sink included, has terminated.
    pub done: Done,
    /// Cancels every worker and fetch client.
    pub cancel: CancellationToken,
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// One report per worker that terminated normally, in stage order.
    pub workers: Vec<WorkerReport>,
    /// Errors seen by the sink, per kind.
    pub errors: ErrorCounts,
    /// Whether the run ended through cancellation.
    pub cancelled: bool,
    /// Wall time of the run in milliseconds.
    pub duration_ms: u64,
}

impl PipelineReport {
    /// Items emitted by the last stage.
    #[must_use]
    pub fn delivered(&self) -> usize {
        self.workers.last().map_or(0, |w| w.emitted)
    }

    /// Whether every worker stopped because its input ran out.
    #[must_use]
    pub fn completed_naturally(&self) -> bool {
        !self.cancelled && self.workers.iter().all(|w| w.exit == ExitReason::InputExhausted)
    }
}

/// A wired chain of workers, ready to run.
///
/// Built by [`PipelineBuilder`](super::PipelineBuilder).
pub struct Pipeline {
    workers: Vec<Worker>,
    errors: mpsc::Sender<ScrapeError>,
    error_rx: mpsc::Receiver<ScrapeError>,
    sink: ErrorSink,
    cancel: CancellationToken,
    done: DoneNotifier,
}

impl Pipeline {
    pub(crate) fn new(
        workers: Vec<Worker>,
        errors: mpsc::Sender<ScrapeError>,
        error_rx: mpsc::Receiver<ScrapeError>,
        sink: ErrorSink,
        cancel: CancellationToken,
        done: DoneNotifier,
    ) -> Self {
        Self {
            workers,
            errors,
            error_rx,
            sink,
            cancel,
            done,
        }
    }

    /// Stage names in chain order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.workers.iter().map(Worker::name).collect()
    }

    /// Runs every worker and the error sink until the chain has shut down.
    ///
    /// Returns after all workers finished, the error channel closed and the
    /// sink drained it. The [`Done`] signal fires just before returning.
    pub async fn run(self) -> PipelineReport {
        let Self {
            workers,
            errors,
            error_rx,
            sink,
            cancel,
            done,
        } = self;
        let start = Instant::now();
        let stage_count = workers.len();
        info!(stages = stage_count, "pipeline started");

        let sink_task = sink.spawn(error_rx);

        let mut running: FuturesUnordered<_> = workers
            .into_iter()
            .enumerate()
            .map(|(index, worker)| {
                let task = tokio::spawn(worker.run());
                async move { (index, task.await) }
            })
            .collect();

        let mut outstanding = stage_count;
        let mut reports: Vec<Option<WorkerReport>> = vec![None; stage_count];
        while let Some((index, joined)) = running.next().await {
            outstanding -= 1;
            match joined {
                Ok(report) => {
                    debug!(stage = %report.stage, outstanding, "worker joined");
                    reports[index] = Some(report);
                }
                Err(e) => error!(index, outstanding, "worker task failed: {}", e),
            }
        }

        // Workers dropped their clones; this closes the error channel.
        drop(errors);
        let errors = match sink_task.await {
            Ok(counts) => counts,
            Err(e) => {
                warn!("error sink task failed: {}", e);
                ErrorCounts::default()
            }
        };

        let report = PipelineReport {
            workers: reports.into_iter().flatten().collect(),
            errors,
            cancelled: cancel.is_cancelled(),
            duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        info!(
            delivered = report.delivered(),
            errors = report.errors.total(),
            cancelled = report.cancelled,
            "pipeline finished"
        );
        done.fire();
        report
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("workers", &self.workers)
            .field("sink", &self.sink)
            .finish_non_exhaustive()
    }
}
