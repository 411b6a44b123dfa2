//! CSS selectors used by the site stages.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Every selector the four site stages evaluate.
///
/// Defaults match the autoevolution motorcycle catalogue layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSelectors {
    /// Brand links on the start page.
    pub brand_link: String,
    /// Model links on a brand page.
    pub model_link: String,
    /// Model name inside a model link.
    pub model_name: String,
    /// One variant block on a model page.
    pub variant_block: String,
    /// Variant name inside a block.
    pub variant_name: String,
    /// Production years inside a block.
    pub variant_years: String,
    /// Link to the spec page inside a block.
    pub variant_link: String,
    /// Specification table on a variant page.
    pub spec_table: String,
    /// Attribute names inside the table.
    pub spec_term: String,
    /// Attribute values inside the table.
    pub spec_value: String,
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            brand_link: ".carman h5 a".to_string(),
            model_link: ".carmod a".to_string(),
            model_name: "h4".to_string(),
            variant_block: ".carmodel".to_string(),
            variant_name: r#"span[itemprop="name"]"#.to_string(),
            variant_years: r#"p[class="years"]"#.to_string(),
            variant_link: r#"a[itemprop="url"]"#.to_string(),
            spec_table: ".enginedata".to_string(),
            spec_term: "dt em".to_string(),
            spec_value: "dd".to_string(),
        }
    }
}

impl SiteSelectors {
    fn all(&self) -> [(&'static str, &str); 10] {
        [
            ("brand_link", &self.brand_link),
            ("model_link", &self.model_link),
            ("model_name", &self.model_name),
            ("variant_block", &self.variant_block),
            ("variant_name", &self.variant_name),
            ("variant_years", &self.variant_years),
            ("variant_link", &self.variant_link),
            ("spec_table", &self.spec_table),
            ("spec_term", &self.spec_term),
            ("spec_value", &self.spec_value),
        ]
    }

    /// Checks that every selector parses.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, selector) in self.all() {
            scraper::Selector::parse(selector).map_err(|e| {
                ConfigError::Invalid(format!("selectors.{field} `{selector}` does not parse: {e:?}"))
            })?;
        }
        Ok(())
    }
}
