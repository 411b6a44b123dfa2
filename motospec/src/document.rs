//! Parsed, queryable HTML documents.
//!
//! Thin layer over `scraper`: selectors are evaluated against the document
//! root or any node, matches come back in document order, and nodes expose
//! their text, element children and a multi-valued attribute lookup.
//!
//! A [`Document`] is not `Send`. Stages parse and extract between await
//! points, see [`WorkerHandle::fetch_document`](crate::pipeline::WorkerHandle::fetch_document).

use scraper::{ElementRef, Html, Selector};

use crate::errors::ScrapeError;

/// Attributes whose value is a whitespace-separated list.
const LIST_ATTRIBUTES: &[&str] = &["class", "rel"];

fn compile(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|e| ScrapeError::selector(selector, format!("{e:?}")))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A parsed response body.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses `body` as an HTML document. Parsing is lenient and never fails.
    #[must_use]
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }

    /// The `<html>` element.
    #[must_use]
    pub fn root(&self) -> Node<'_> {
        Node {
            element: self.html.root_element(),
        }
    }

    /// All elements matching `selector`, in document order.
    pub fn select(&self, selector: &str) -> Result<Vec<Node<'_>>, ScrapeError> {
        let compiled = compile(selector)?;
        Ok(self.html.select(&compiled).map(Node::from).collect())
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("errors", &self.html.errors.len())
            .finish()
    }
}

/// An element inside a [`Document`].
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    element: ElementRef<'a>,
}

impl<'a> From<ElementRef<'a>> for Node<'a> {
    fn from(element: ElementRef<'a>) -> Self {
        Self { element }
    }
}

impl<'a> Node<'a> {
    /// Tag name, lowercase.
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.element.value().name()
    }

    /// All descendant text, whitespace collapsed and trimmed.
    #[must_use]
    pub fn text(&self) -> String {
        collapse_whitespace(&self.element.text().collect::<String>())
    }

    /// Text of the first child node, whether a text node or an element.
    ///
    /// Returns `None` when there is no child or it holds no visible text.
    #[must_use]
    pub fn first_child_text(&self) -> Option<String> {
        let child = self.element.children().next()?;
        let text = match (child.value().as_text(), ElementRef::wrap(child)) {
            (Some(text), _) => collapse_whitespace(text),
            (None, Some(element)) => Node::from(element).text(),
            (None, None) => String::new(),
        };
        (!text.is_empty()).then_some(text)
    }

    /// Values of attribute `name`.
    ///
    /// List attributes (`class`, `rel`) are split on whitespace; every other
    /// attribute yields exactly one value. `None` if the attribute is absent.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<Vec<String>> {
        let raw = self.element.value().attr(name)?;
        if LIST_ATTRIBUTES.contains(&name) {
            Some(raw.split_whitespace().map(String::from).collect())
        } else {
            Some(vec![raw.to_string()])
        }
    }

    /// First value of attribute `name`, trimmed; `None` if absent or blank.
    #[must_use]
    pub fn first_attr(&self, name: &str) -> Option<String> {
        self.attr(name)?
            .into_iter()
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
    }

    /// Element children, in document order.
    #[must_use]
    pub fn children(&self) -> Vec<Node<'a>> {
        self.element.children().filter_map(ElementRef::wrap).map(Node::from).collect()
    }

    /// Descendants matching `selector`, in document order.
    pub fn select(&self, selector: &str) -> Result<Vec<Node<'a>>, ScrapeError> {
        let compiled = compile(selector)?;
        Ok(self.element.select(&compiled).map(Node::from).collect())
    }

    /// First descendant matching `selector`.
    pub fn select_first(&self, selector: &str) -> Result<Option<Node<'a>>, ScrapeError> {
        let compiled = compile(selector)?;
        Ok(self.element.select(&compiled).next().map(Node::from))
    }
}
