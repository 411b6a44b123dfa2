//! Pipeline construction.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::engine::{Pipeline, PipelineHandles};
use super::worker::Worker;
use crate::cancellation::{done_signal, CancellationToken};
use crate::core::Item;
use crate::errors::ScrapeError;
use crate::fetch::{Fetcher, RetryPolicy};
use crate::sink::ErrorSink;
use crate::stages::Stage;

/// Capacity of every channel in the pipeline.
pub const CHANNEL_CAPACITY: usize = 1;

/// Builder for a linear chain of stages.
#[derive(Clone)]
pub struct PipelineBuilder {
    fetcher: Arc<dyn Fetcher>,
    stages: Vec<Arc<dyn Stage>>,
    interval: Duration,
    retry: RetryPolicy,
    cancel: Option<CancellationToken>,
    sink: Option<ErrorSink>,
}

impl PipelineBuilder {
    /// Starts a pipeline whose workers fetch through `fetcher`.
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            stages: Vec::new(),
            interval: Duration::ZERO,
            retry: RetryPolicy::default(),
            cancel: None,
            sink: None,
        }
    }

    /// Appends a stage to the chain.
    #[must_use]
    pub fn stage(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Appends several stages, in order.
    #[must_use]
    pub fn stages(mut self, stages: impl IntoIterator<Item = Arc<dyn Stage>>) -> Self {
        self.stages.extend(stages);
        self
    }

    /// Fixed delay each worker waits before processing an item.
    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Retry policy for every worker's fetch client.
    #[must_use]
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Shares an existing cancellation token instead of creating one.
    #[must_use]
    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Where errors are routed. Defaults to [`ErrorSink::new`].
    #[must_use]
    pub fn error_sink(mut self, sink: ErrorSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Number of stages added so far.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Wires one worker per stage.
    ///
    /// Stage 1 reads the returned input sender; the last stage writes the
    /// returned output receiver.
    ///
    /// # Panics
    ///
    /// Panics if no stage was added.
    #[must_use]
    pub fn build(self) -> (Pipeline, PipelineHandles) {
        assert!(!self.stages.is_empty(), "a pipeline needs at least one stage");

        let cancel = self.cancel.unwrap_or_default();
        let (errors, error_rx) = mpsc::channel::<ScrapeError>(CHANNEL_CAPACITY);
        let (input, mut upstream) = mpsc::channel::<Item>(CHANNEL_CAPACITY);

        let mut workers = Vec::with_capacity(self.stages.len());
        for stage in self.stages {
            let (output, next) = mpsc::channel::<Item>(CHANNEL_CAPACITY);
            workers.push(Worker::new(
                stage,
                upstream,
                output,
                errors.clone(),
                cancel.clone(),
                self.fetcher.clone(),
                self.retry.clone(),
                self.interval,
            ));
            upstream = next;
        }

        let (notifier, done) = done_signal();
        let pipeline = Pipeline::new(
            workers,
            errors,
            error_rx,
            self.sink.unwrap_or_default(),
            cancel.clone(),
            notifier,
        );
        let handles = PipelineHandles {
            input,
            output: upstream,
            done,
            cancel,
        };
        (pipeline, handles)
    }
}

impl std::fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("stages", &self.stages.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("interval", &self.interval)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingStage, StaticFetcher};

    #[test]
    fn test_build_wires_one_worker_per_stage() {
        let (pipeline, handles) = PipelineBuilder::new(Arc::new(StaticFetcher::new()))
            .stage(Arc::new(RecordingStage::new("a")))
            .stage(Arc::new(RecordingStage::new("b")))
            .stage(Arc::new(RecordingStage::new("c")))
            .build();

        assert_eq!(pipeline.stage_names(), vec!["a", "b", "c"]);
        assert!(!handles.done.is_done());
        assert!(!handles.cancel.is_cancelled());
    }

    #[test]
    fn test_shared_token_is_used() {
        let token = CancellationToken::new();
        let (_pipeline, handles) = PipelineBuilder::new(Arc::new(StaticFetcher::new()))
            .stage(Arc::new(RecordingStage::new("a")))
            .cancellation(token.clone())
            .build();

        token.cancel("outer");
        assert!(handles.cancel.is_cancelled());
    }

    #[test]
    #[should_panic(expected = "at least one stage")]
    fn test_empty_chain_panics() {
        let _ = PipelineBuilder::new(Arc::new(StaticFetcher::new())).build();
    }
}
