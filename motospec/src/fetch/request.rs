//! Request descriptors handed to a fetch client.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Header set applied when a request does not name one.
pub const DEFAULT_HEADER_SET: &str = "motoSpecHeader";

/// HTTP method of a [`FetchRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// GET
    #[default]
    Get,
    /// POST
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
        }
    }
}

/// Everything a fetcher needs to perform one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL, or a path resolved against the fetcher's base URL.
    pub url: String,
    /// Request body; empty for GET.
    #[serde(default)]
    pub body: String,
    /// Name of the configured header set to apply.
    pub header_set: String,
    /// Extra headers, multi-valued, applied after the header set.
    #[serde(default)]
    pub headers: BTreeMap<String, Vec<String>>,
}

impl FetchRequest {
    /// Creates a request with the default header set.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: String::new(),
            header_set: DEFAULT_HEADER_SET.to_string(),
            headers: BTreeMap::new(),
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// Creates a POST request with a body.
    #[must_use]
    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::new(Method::Post, url)
        }
    }

    /// Selects a named header set.
    #[must_use]
    pub fn with_header_set(mut self, name: impl Into<String>) -> Self {
        self.header_set = name.into();
        self
    }

    /// Appends a value for an extra header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.entry(name.into()).or_default().push(value.into());
        self
    }
}

impl fmt::Display for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_defaults() {
        let req = FetchRequest::get("/honda");
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.header_set, DEFAULT_HEADER_SET);
        assert!(req.body.is_empty());
        assert_eq!(req.to_string(), "GET /honda");
    }

    #[test]
    fn test_post_with_headers() {
        let req = FetchRequest::post("/specs", "a=1")
            .with_header_set("form")
            .with_header("Accept", "text/html")
            .with_header("Accept", "application/xhtml+xml");

        assert_eq!(req.method, Method::Post);
        assert_eq!(req.body, "a=1");
        assert_eq!(req.header_set, "form");
        assert_eq!(req.headers["Accept"], vec!["text/html", "application/xhtml+xml"]);
    }
}
