//! Stage trait and the site stages.
//!
//! A stage turns one input [`Item`] into zero or more output items. It is
//! opaque to the engine: everything it does goes through the
//! [`WorkerHandle`] of the worker that owns it.

mod brand;
mod model;
mod selectors;
mod spec;
mod variant;

pub use brand::{extract_brands, BrandStage};
pub use model::{extract_models, ModelStage};
pub use selectors::SiteSelectors;
pub use spec::{extract_spec, SpecStage};
pub use variant::{extract_variants, VariantStage};

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::debug;

use crate::core::Item;
use crate::errors::ScrapeError;
use crate::fetch::{FetchRequest, DEFAULT_HEADER_SET};
use crate::pipeline::WorkerHandle;

/// Per-record results of one page, or a page-level failure.
pub type Extracted<T> = Result<Vec<Result<T, ScrapeError>>, ScrapeError>;

/// A transform run by one worker.
///
/// Implementations report per-item failures through
/// [`WorkerHandle::report`] and never panic on bad input.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Processes one input item.
    async fn process(&self, handle: &WorkerHandle, item: Item);
}

/// The brand -> model -> variant -> spec chain, in order.
#[must_use]
pub fn default_chain(selectors: &SiteSelectors) -> Vec<Arc<dyn Stage>> {
    let selectors = Arc::new(selectors.clone());
    vec![
        Arc::new(BrandStage::new(selectors.clone())),
        Arc::new(ModelStage::new(selectors.clone())),
        Arc::new(VariantStage::new(selectors.clone())),
        Arc::new(SpecStage::new(selectors)),
    ]
}

/// Builds the GET request every site stage issues.
fn page_request(url: &str) -> FetchRequest {
    FetchRequest::get(url).with_header_set(DEFAULT_HEADER_SET)
}

/// Error for an item of the wrong shape.
fn unexpected(stage: &str, item: &Item, expected: &str) -> ScrapeError {
    ScrapeError::processing(stage, format!("{item} is not a valid {expected}"))
}

/// Emits successful records and reports failed ones, in document order.
///
/// Stops early once the worker is halted. A page error raised by a halted
/// worker is dropped.
async fn forward<T>(handle: &WorkerHandle, extracted: Extracted<T>)
where
    T: Into<Item> + Send,
{
    let records = match extracted {
        Ok(records) => records,
        Err(err) => {
            match handle.halted() {
                Some(halt) => debug!(stage = %handle.stage_name(), %halt, "dropping page error: {}", err),
                None => handle.report(err).await,
            }
            return;
        }
    };

    for record in records {
        match record {
            Ok(value) => {
                if handle.emit(value.into()).await.is_err() {
                    return;
                }
            }
            Err(err) => handle.report(err).await,
        }
    }
}
