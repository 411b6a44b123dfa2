//! Model discovery on a brand page.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{forward, page_request, unexpected, Extracted, SiteSelectors, Stage};
use crate::core::{BrandUrl, Item, ModelUrl};
use crate::document::Document;
use crate::errors::ScrapeError;
use crate::pipeline::WorkerHandle;

const NAME: &str = "model";

/// Reads a brand page and emits one [`ModelUrl`] per model link.
#[derive(Debug, Clone)]
pub struct ModelStage {
    selectors: Arc<SiteSelectors>,
}

impl ModelStage {
    /// Creates the stage.
    #[must_use]
    pub fn new(selectors: Arc<SiteSelectors>) -> Self {
        Self { selectors }
    }
}

/// Extracts the models of `brand` listed on `doc`.
pub fn extract_models(doc: &Document, brand: &BrandUrl, selectors: &SiteSelectors) -> Extracted<ModelUrl> {
    let mut records = Vec::new();
    for link in doc.select(&selectors.model_link)? {
        let Some(name) = link.select_first(&selectors.model_name)? else {
            records.push(Err(ScrapeError::processing(
                NAME,
                format!("{} model link has no name", brand.brand),
            )));
            continue;
        };
        let model = name.text();
        records.push(match link.first_attr("href") {
            Some(url) => Ok(ModelUrl {
                brand: brand.brand.clone(),
                model,
                url,
            }),
            None => Err(ScrapeError::processing(NAME, format!("{model} has no href"))),
        });
    }
    Ok(records)
}

#[async_trait]
impl Stage for ModelStage {
    fn name(&self) -> &str {
        NAME
    }

    async fn process(&self, handle: &WorkerHandle, item: Item) {
        let brand = match item {
            Item::Brand(brand) => brand,
            other => {
                handle.report(unexpected(NAME, &other, "brand")).await;
                return;
            }
        };
        debug!(stage = NAME, url = %brand.url, "IN");

        let extracted = handle
            .fetch_document(page_request(&brand.url), |doc| {
                extract_models(doc, &brand, &self.selectors)
            })
            .await
            .and_then(|records| records);
        forward(handle, extracted).await;
    }
}
