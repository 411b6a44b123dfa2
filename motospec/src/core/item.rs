//! Items flowing between stages.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A brand listing entry discovered on the start page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandUrl {
    /// Brand display name.
    pub brand: String,
    /// Link to the brand page.
    pub url: String,
}

/// A model family discovered on a brand page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelUrl {
    /// Owning brand.
    pub brand: String,
    /// Model family name.
    pub model: String,
    /// Link to the model page.
    pub url: String,
}

/// A concrete trim/variant discovered on a model page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotoUrl {
    /// Owning brand.
    pub brand: String,
    /// Model family name.
    pub model: String,
    /// Variant name.
    pub moto: String,
    /// Production years as printed on the page.
    pub year: String,
    /// Link to the specification page.
    pub url: String,
}

/// A fully resolved specification record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spec {
    /// Brand name.
    pub brand: String,
    /// Model family name.
    pub model: String,
    /// Variant name.
    #[serde(rename = "type")]
    pub moto: String,
    /// Production years.
    pub year: String,
    /// Attribute name to value.
    pub specs: BTreeMap<String, String>,
}

impl Spec {
    /// Starts a record for `moto` with no attributes.
    #[must_use]
    pub fn for_moto(moto: &MotoUrl) -> Self {
        Self {
            brand: moto.brand.clone(),
            model: moto.model.clone(),
            moto: moto.moto.clone(),
            year: moto.year.clone(),
            specs: BTreeMap::new(),
        }
    }
}

/// One unit of data passed between workers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Item {
    /// A bare URL, the usual input of the first stage.
    Url(String),
    /// Output of brand discovery.
    Brand(BrandUrl),
    /// Output of model discovery.
    Model(ModelUrl),
    /// Output of variant discovery.
    Moto(MotoUrl),
    /// Output of specification extraction.
    Spec(Spec),
}

impl Item {
    /// Short name of the variant, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Url(_) => "url",
            Self::Brand(_) => "brand",
            Self::Model(_) => "model",
            Self::Moto(_) => "moto",
            Self::Spec(_) => "spec",
        }
    }

    /// The link this item points to, if any.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Url(url) => Some(url),
            Self::Brand(b) => Some(&b.url),
            Self::Model(m) => Some(&m.url),
            Self::Moto(m) => Some(&m.url),
            Self::Spec(_) => None,
        }
    }

    /// Unwraps a [`Spec`] item.
    #[must_use]
    pub fn into_spec(self) -> Option<Spec> {
        match self {
            Self::Spec(spec) => Some(spec),
            _ => None,
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => write!(f, "url({url})"),
            Self::Brand(b) => write!(f, "brand({} @ {})", b.brand, b.url),
            Self::Model(m) => write!(f, "model({} {} @ {})", m.brand, m.model, m.url),
            Self::Moto(m) => write!(f, "moto({} {} {} ({}) @ {})", m.brand, m.model, m.moto, m.year, m.url),
            Self::Spec(s) => write!(f, "spec({} {} {} ({}), {} attributes)", s.brand, s.model, s.moto, s.year, s.specs.len()),
        }
    }
}

impl From<String> for Item {
    fn from(url: String) -> Self {
        Self::Url(url)
    }
}

impl From<&str> for Item {
    fn from(url: &str) -> Self {
        Self::Url(url.to_string())
    }
}

impl From<BrandUrl> for Item {
    fn from(value: BrandUrl) -> Self {
        Self::Brand(value)
    }
}

impl From<ModelUrl> for Item {
    fn from(value: ModelUrl) -> Self {
        Self::Model(value)
    }
}

impl From<MotoUrl> for Item {
    fn from(value: MotoUrl) -> Self {
        Self::Moto(value)
    }
}

impl From<Spec> for Item {
    fn from(value: Spec) -> Self {
        Self::Spec(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_moto() -> MotoUrl {
        MotoUrl {
            brand: "Honda".to_string(),
            model: "CBR".to_string(),
            moto: "CBR600RR".to_string(),
            year: "2013 - 2016".to_string(),
            url: "/honda/cbr600rr".to_string(),
        }
    }

    #[test]
    fn test_spec_serializes_moto_as_type() {
        let mut spec = Spec::for_moto(&sample_moto());
        spec.specs.insert("Displacement".to_string(), "599 cc".to_string());

        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "brand": "Honda",
                "model": "CBR",
                "type": "CBR600RR",
                "year": "2013 - 2016",
                "specs": {"Displacement": "599 cc"}
            })
        );
    }

    #[test]
    fn test_item_kind_and_url() {
        let item = Item::from(sample_moto());
        assert_eq!(item.kind(), "moto");
        assert_eq!(item.url(), Some("/honda/cbr600rr"));

        let spec = Item::from(Spec::default());
        assert_eq!(spec.url(), None);
        assert!(spec.into_spec().is_some());
        assert!(Item::from("/x").into_spec().is_none());
    }

    #[test]
    fn test_display_mentions_names() {
        let item = Item::Brand(BrandUrl {
            brand: "Yamaha".to_string(),
            url: "/yamaha".to_string(),
        });
        assert_eq!(item.to_string(), "brand(Yamaha @ /yamaha)");
    }
}
