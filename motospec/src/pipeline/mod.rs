//! Pipeline building and execution.
//!
//! This module provides:
//! - [`PipelineBuilder`] wiring an ordered list of stages into workers
//! - [`Pipeline::run`] with the ordered shutdown join
//! - [`WorkerHandle`], the surface a stage uses to emit, report and fetch

mod builder;
mod engine;
mod handle;
mod worker;

#[cfg(test)]
mod integration_tests;

pub use builder::{PipelineBuilder, CHANNEL_CAPACITY};
pub use engine::{Pipeline, PipelineHandles, PipelineReport};
pub use handle::{Halted, WorkerHandle};
pub use worker::WorkerReport;
