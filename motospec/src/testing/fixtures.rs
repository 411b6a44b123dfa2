//! HTML page builders shaped like the catalogue's markup.

use std::fmt::Write;

fn page(body: &str) -> String {
    format!("<!DOCTYPE html><html><head><title>fixture</title></head><body>{body}</body></html>")
}

/// A start page listing `(brand, href)` entries. `None` omits the `href`.
#[must_use]
pub fn brand_page(brands: &[(&str, Option<&str>)]) -> String {
    let mut body = String::from(r#"<div class="container">"#);
    for (brand, href) in brands {
        let href = href.map(|h| format!(r#" href="{h}""#)).unwrap_or_default();
        let _ = write!(
            body,
            r#"<div class="carman col2"><h5><a{href} title="{brand} motorcycles">{brand}</a></h5><p>models</p></div>"#
        );
    }
    body.push_str("</div>");
    page(&body)
}

/// A brand page listing `(model name, href)` entries. `None` omits the piece.
#[must_use]
pub fn model_page(models: &[(Option<&str>, Option<&str>)]) -> String {
    let mut body = String::new();
    for (name, href) in models {
        let href = href.map(|h| format!(r#" href="{h}""#)).unwrap_or_default();
        let name = name.map(|n| format!("<h4>{n}</h4>")).unwrap_or_default();
        let _ = write!(
            body,
            r#"<div class="carmod clearfix"><a{href}><img src="/x.jpg">{name}</a></div>"#
        );
    }
    page(&body)
}

/// One variant block on a model page.
#[derive(Debug, Clone)]
pub struct VariantBlock {
    name: Option<String>,
    years: Option<String>,
    link: Option<String>,
}

impl VariantBlock {
    /// A complete block.
    #[must_use]
    pub fn new(name: &str, years: &str, link: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            years: Some(years.to_string()),
            link: Some(link.to_string()),
        }
    }

    /// Drops the name span.
    #[must_use]
    pub fn without_name(mut self) -> Self {
        self.name = None;
        self
    }

    /// Drops the years paragraph.
    #[must_use]
    pub fn without_years(mut self) -> Self {
        self.years = None;
        self
    }

    /// Drops the link's `href`.
    #[must_use]
    pub fn without_link(mut self) -> Self {
        self.link = None;
        self
    }

    fn render(&self) -> String {
        let name = self
            .name
            .as_ref()
            .map(|n| format!(r#"<span itemprop="name">{n}</span>"#))
            .unwrap_or_default();
        let years = self
            .years
            .as_ref()
            .map(|y| format!(r#"<p class="years">{y}</p>"#))
            .unwrap_or_default();
        let href = self.link.as_ref().map(|l| format!(r#" href="{l}""#)).unwrap_or_default();
        format!(r#"<div class="carmodel"><h2>{name}</h2>{years}<a itemprop="url"{href}>specs</a></div>"#)
    }
}

/// A model page with the given variant blocks.
#[must_use]
pub fn variant_page(blocks: &[VariantBlock]) -> String {
    page(&blocks.iter().map(VariantBlock::render).collect::<String>())
}

/// A variant page whose spec table has the given terms and values.
///
/// Counts may differ, to exercise mismatched tables.
#[must_use]
pub fn spec_page(terms: &[&str], values: &[&str]) -> String {
    let mut table = String::from(r#"<div class="enginedata"><dl>"#);
    for i in 0..terms.len().max(values.len()) {
        if let Some(term) = terms.get(i) {
            let _ = write!(table, "<dt><em>{term}</em></dt>");
        }
        if let Some(value) = values.get(i) {
            let _ = write!(table, "<dd>{value}</dd>");
        }
    }
    table.push_str("</dl></div>");
    // A second table that must be ignored.
    table.push_str(r#"<div class="enginedata"><dl><dt><em>Ignored</em></dt><dd>x</dd></dl></div>"#);
    page(&table)
}
