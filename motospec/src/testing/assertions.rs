//! Assertions over pipeline runs.

use tokio::sync::mpsc;

use crate::core::{ExitReason, Item};
use crate::pipeline::PipelineReport;

/// Asserts that every stage produced a report, i.e. no worker task panicked.
pub fn assert_all_closed(report: &PipelineReport, stages: usize) {
    assert_eq!(
        report.workers.len(),
        stages,
        "Expected {} worker reports, got {}: {:?}",
        stages,
        report.workers.len(),
        report.workers
    );
}

/// Asserts each worker's exit reason, in stage order.
pub fn assert_exit_reasons(report: &PipelineReport, expected: &[ExitReason]) {
    let actual: Vec<_> = report.workers.iter().map(|w| w.exit).collect();
    assert_eq!(actual, expected, "Unexpected exit reasons: {:?}", report.workers);
}

/// Drains `output` until it closes.
pub async fn collect_output(mut output: mpsc::Receiver<Item>) -> Vec<Item> {
    let mut items = Vec::new();
    while let Some(item) = output.recv().await {
        items.push(item);
    }
    items
}
