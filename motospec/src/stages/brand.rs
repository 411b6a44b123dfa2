//! Brand discovery on the start page.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{forward, page_request, unexpected, Extracted, SiteSelectors, Stage};
use crate::core::{BrandUrl, Item};
use crate::document::Document;
use crate::errors::ScrapeError;
use crate::pipeline::WorkerHandle;

const NAME: &str = "brand";

/// Reads a listing page and emits one [`BrandUrl`] per brand link.
#[derive(Debug, Clone)]
pub struct BrandStage {
    selectors: Arc<SiteSelectors>,
}

impl BrandStage {
    /// Creates the stage.
    #[must_use]
    pub fn new(selectors: Arc<SiteSelectors>) -> Self {
        Self { selectors }
    }
}

/// Extracts every brand link on `doc`, in document order.
///
/// A link without an `href` yields an error in its place.
pub fn extract_brands(doc: &Document, selectors: &SiteSelectors) -> Extracted<BrandUrl> {
    let links = doc.select(&selectors.brand_link)?;
    Ok(links
        .into_iter()
        .map(|link| {
            let brand = link.first_child_text().unwrap_or_else(|| link.text());
            if brand.is_empty() {
                return Err(ScrapeError::processing(NAME, "brand link has no name"));
            }
            match link.first_attr("href") {
                Some(url) => Ok(BrandUrl { brand, url }),
                None => Err(ScrapeError::processing(NAME, format!("{brand} has no link"))),
            }
        })
        .collect())
}

#[async_trait]
impl Stage for BrandStage {
    fn name(&self) -> &str {
        NAME
    }

    async fn process(&self, handle: &WorkerHandle, item: Item) {
        let url = match item {
            Item::Url(url) => url,
            other => {
                handle.report(unexpected(NAME, &other, "url string")).await;
                return;
            }
        };
        debug!(stage = NAME, %url, "IN");

        let extracted = handle
            .fetch_document(page_request(&url), |doc| {
                extract_brands(doc, &self.selectors)
            })
            .await
            .and_then(|records| records);
        forward(handle, extracted).await;
    }
}
