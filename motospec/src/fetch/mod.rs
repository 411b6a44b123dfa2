//! Fetch collaborator.
//!
//! This module provides:
//! - Request descriptors
//! - The [`Fetcher`] transport protocol and an HTTP implementation
//! - Retry policy with backoff and jitter
//! - The worker-owned [`FetchClient`] session

mod client;
mod config;
#[cfg(feature = "http")]
mod http;
mod protocols;
mod request;
mod retry;

pub use client::{ClientStats, FetchClient};
pub use config::FetchConfig;
#[cfg(feature = "http")]
pub use http::HttpFetcher;
pub use protocols::Fetcher;
pub use request::{FetchRequest, Method, DEFAULT_HEADER_SET};
pub use retry::{BackoffStrategy, JitterStrategy, RetryPolicy};
