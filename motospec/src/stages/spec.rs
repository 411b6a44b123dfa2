//! Specification table extraction.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{forward, page_request, unexpected, SiteSelectors, Stage};
use crate::core::{Item, MotoUrl, Spec};
use crate::document::Document;
use crate::errors::ScrapeError;
use crate::pipeline::WorkerHandle;

const NAME: &str = "spec";

/// Reads a variant page and emits its [`Spec`].
#[derive(Debug, Clone)]
pub struct SpecStage {
    selectors: Arc<SiteSelectors>,
}

impl SpecStage {
    /// Creates the stage.
    #[must_use]
    pub fn new(selectors: Arc<SiteSelectors>) -> Self {
        Self { selectors }
    }
}

/// Builds the spec record for `moto` from the first table on `doc`.
///
/// Terms and values are paired by position; differing counts reject the
/// whole table.
pub fn extract_spec(doc: &Document, moto: &MotoUrl, selectors: &SiteSelectors) -> Result<Spec, ScrapeError> {
    let Some(table) = doc.select(&selectors.spec_table)?.into_iter().next() else {
        return Err(ScrapeError::processing(
            NAME,
            format!("{} {} {}({}) has no spec table", moto.brand, moto.model, moto.moto, moto.year),
        ));
    };

    let terms = table.select(&selectors.spec_term)?;
    let values = table.select(&selectors.spec_value)?;
    if terms.len() != values.len() {
        return Err(ScrapeError::processing(
            NAME,
            format!(
                "spec table counts not equal: {} terms, {} values ({})",
                terms.len(),
                values.len(),
                moto.url
            ),
        ));
    }

    let mut spec = Spec::for_moto(moto);
    spec.specs = terms.iter().zip(&values).map(|(t, v)| (t.text(), v.text())).collect();
    Ok(spec)
}

#[async_trait]
impl Stage for SpecStage {
    fn name(&self) -> &str {
        NAME
    }

    async fn process(&self, handle: &WorkerHandle, item: Item) {
        let moto = match item {
            Item::Moto(moto) => moto,
            other => {
                handle.report(unexpected(NAME, &other, "moto")).await;
                return;
            }
        };
        debug!(stage = NAME, url = %moto.url, "IN");

        let extracted = handle
            .fetch_document(page_request(&moto.url), |doc| {
                extract_spec(doc, &moto, &self.selectors)
            })
            .await
            .and_then(|spec| spec)
            .map(|spec| vec![Ok(spec)]);
        forward(handle, extracted).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn fireblade() -> MotoUrl {
        MotoUrl {
            brand: "Honda".into(),
            model: "CBR1000RR".into(),
            moto: "Fireblade".into(),
            year: "2020".into(),
            url: "/honda/cbr/2020".into(),
        }
    }

    #[test]
    fn test_pairs_terms_and_values() {
        let doc = Document::parse(&fixtures::spec_page(
            &["Displacement", "Power", "Weight"],
            &["999 cc", "215 HP", "201 kg"],
        ));
        let spec = extract_spec(&doc, &fireblade(), &SiteSelectors::default()).unwrap();

        let expected: BTreeMap<String, String> = [
            ("Displacement", "999 cc"),
            ("Power", "215 HP"),
            ("Weight", "201 kg"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(spec.specs, expected);
        assert_eq!(spec.moto, "Fireblade");
        assert_eq!(spec.year, "2020");
    }

    #[test]
    fn test_count_mismatch_rejects_table() {
        let doc = Document::parse(&fixtures::spec_page(
            &["A", "B", "C", "D", "E"],
            &["1", "2", "3", "4"],
        ));
        let err = extract_spec(&doc, &fireblade(), &SiteSelectors::default()).unwrap_err();
        assert!(err.to_string().contains("counts not equal"));
        assert_eq!(err.kind(), crate::errors::ErrorKind::Processing);
    }

    #[test]
    fn test_missing_table() {
        let doc = Document::parse("<html><body><dl><dt><em>A</em></dt><dd>1</dd></dl></body></html>");
        let err = extract_spec(&doc, &fireblade(), &SiteSelectors::default()).unwrap_err();
        assert_eq!(
            err,
            ScrapeError::processing("spec", "Honda CBR1000RR Fireblade(2020) has no spec table")
        );
    }
}
