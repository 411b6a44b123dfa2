//! Testing utilities for motospec pipelines.
//!
//! This module provides:
//! - A scripted in-memory [`Fetcher`](crate::fetch::Fetcher)
//! - A recording pass-through stage
//! - HTML fixtures shaped like the catalogue pages
//! - Assertions over pipeline reports

mod assertions;
pub mod fixtures;
mod mocks;

pub use assertions::{assert_all_closed, assert_exit_reasons, collect_output};
pub use mocks::{RecordingStage, StaticFetcher};
