//! # Motospec
//!
//! A staged, concurrent scraper for motorcycle specification tables.
//!
//! A pipeline is an ordered list of stages. Each stage runs in its own
//! worker task, reads items from the previous worker over a bounded
//! channel and emits items to the next one:
//!
//! - **Stage chain**: brand pages -> model pages -> variant pages -> spec tables
//! - **Worker-owned fetching**: every worker has a private retrying fetch client
//! - **Error routing**: one shared error channel, drained by a sink that
//!   routes each error by kind to its log target
//! - **Cancellation**: one token observed by every worker and fetch client,
//!   with an ordered shutdown that never loses or blocks on in-flight items
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use motospec::prelude::*;
//! use std::sync::Arc;
//!
//! let config = ScraperConfig::default();
//! let fetcher = Arc::new(HttpFetcher::new(config.fetch.clone())?);
//! let (pipeline, handles) = PipelineBuilder::new(fetcher)
//!     .stages(default_chain(&config.selectors))
//!     .interval(config.interval())
//!     .build();
//!
//! let run = tokio::spawn(pipeline.run());
//! handles.input.send(Item::from(config.start_url.as_str())).await?;
//! drop(handles.input);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod config;
pub mod core;
pub mod document;
pub mod errors;
pub mod fetch;
pub mod observability;
pub mod output;
pub mod pipeline;
pub mod sink;
pub mod stages;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::{CancellationToken, Done};
    pub use crate::config::{LogConfig, ScraperConfig};
    pub use crate::core::{BrandUrl, ExitReason, Item, ModelUrl, MotoUrl, Spec, WorkerState};
    pub use crate::document::{Document, Node};
    pub use crate::errors::{ConfigError, ErrorKind, OutputError, ScrapeError};
    #[cfg(feature = "http")]
    pub use crate::fetch::HttpFetcher;
    pub use crate::fetch::{FetchConfig, FetchRequest, Fetcher, RetryPolicy};
    pub use crate::output::JsonLinesWriter;
    pub use crate::pipeline::{
        Halted, Pipeline, PipelineBuilder, PipelineHandles, PipelineReport, WorkerHandle,
        WorkerReport,
    };
    pub use crate::sink::{ErrorCounts, ErrorLog, ErrorSink, FileErrorLog, TracingErrorLog};
    pub use crate::stages::{default_chain, SiteSelectors, Stage};
}

/// Version of the motospec library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
