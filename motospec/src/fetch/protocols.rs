//! Transport protocol used by fetch clients.

use async_trait::async_trait;

use super::request::FetchRequest;
use crate::errors::ScrapeError;

/// Performs a single attempt of a request and returns the response body.
///
/// Implementations classify their failures with the matching
/// [`ScrapeError`] transport variant; retrying is the fetch client's job.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `request` once.
    async fn fetch(&self, request: &FetchRequest) -> Result<String, ScrapeError>;
}
