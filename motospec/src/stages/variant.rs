//! Variant discovery on a model page.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{forward, page_request, unexpected, Extracted, SiteSelectors, Stage};
use crate::core::{Item, ModelUrl, MotoUrl};
use crate::document::{Document, Node};
use crate::errors::ScrapeError;
use crate::pipeline::WorkerHandle;

const NAME: &str = "variant";

/// Reads a model page and emits one [`MotoUrl`] per variant block.
#[derive(Debug, Clone)]
pub struct VariantStage {
    selectors: Arc<SiteSelectors>,
}

impl VariantStage {
    /// Creates the stage.
    #[must_use]
    pub fn new(selectors: Arc<SiteSelectors>) -> Self {
        Self { selectors }
    }
}

fn required_text(block: &Node<'_>, selector: &str, what: &str, model: &ModelUrl) -> Result<String, ScrapeError> {
    let text = block.select_first(selector)?.map(|n| n.text()).unwrap_or_default();
    if text.is_empty() {
        return Err(ScrapeError::processing(
            NAME,
            format!("{} {} variant has no {what}", model.brand, model.model),
        ));
    }
    Ok(text)
}

fn variant(block: &Node<'_>, model: &ModelUrl, selectors: &SiteSelectors) -> Result<MotoUrl, ScrapeError> {
    let moto = required_text(block, &selectors.variant_name, "name", model)?;
    let year = required_text(block, &selectors.variant_years, "years", model)?;
    let url = block
        .select_first(&selectors.variant_link)?
        .and_then(|link| link.first_attr("href"))
        .ok_or_else(|| ScrapeError::processing(NAME, format!("{moto}({year}) has no valid href")))?;

    Ok(MotoUrl {
        brand: model.brand.clone(),
        model: model.model.clone(),
        moto,
        year,
        url,
    })
}

/// Extracts the variants of `model` listed on `doc`.
///
/// Each block stands alone: a block missing its name, years or link yields
/// an error in its place.
pub fn extract_variants(doc: &Document, model: &ModelUrl, selectors: &SiteSelectors) -> Extracted<MotoUrl> {
    let blocks = doc.select(&selectors.variant_block)?;
    Ok(blocks.iter().map(|block| variant(block, model, selectors)).collect())
}

#[async_trait]
impl Stage for VariantStage {
    fn name(&self) -> &str {
        NAME
    }

    async fn process(&self, handle: &WorkerHandle, item: Item) {
        let model = match item {
            Item::Model(model) => model,
            other => {
                handle.report(unexpected(NAME, &other, "model")).await;
                return;
            }
        };
        debug!(stage = NAME, url = %model.url, "IN");

        let extracted = handle
            .fetch_document(page_request(&model.url), |doc| {
                extract_variants(doc, &model, &self.selectors)
            })
            .await
            .and_then(|records| records);
        forward(handle, extracted).await;
    }
}
