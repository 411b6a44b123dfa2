//! `reqwest`-backed [`Fetcher`].

use async_trait::async_trait;
use reqwest::Url;
use tracing::{debug, warn};

use super::config::FetchConfig;
use super::protocols::Fetcher;
use super::request::{FetchRequest, Method};
use crate::errors::{ConfigError, ScrapeError};

/// Fetches over HTTP(S) with the timeout, user agent and header sets of a [`FetchConfig`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base: Url,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Builds the underlying client.
    pub fn new(config: FetchConfig) -> Result<Self, ConfigError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| ConfigError::Invalid(format!("base_url `{}`: {e}", config.base_url)))?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ConfigError::Invalid(format!("cannot build HTTP client: {e}")))?;

        Ok(Self { client, base, config })
    }

    /// Resolves `url` against the base URL unless it is already absolute.
    pub fn resolve(&self, url: &str) -> Result<Url, ScrapeError> {
        Url::parse(url)
            .or_else(|_| self.base.join(url))
            .map_err(|e| ScrapeError::transport(url, format!("invalid url: {e}")))
    }
}

fn classify(url: &str, error: &reqwest::Error) -> ScrapeError {
    if error.is_timeout() {
        ScrapeError::timeout(url)
    } else if error.is_connect() || error.is_request() {
        ScrapeError::network(url, error.to_string())
    } else {
        ScrapeError::transport(url, error.to_string())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<String, ScrapeError> {
        let url = self.resolve(&request.url)?;
        debug!(method = %request.method, url = %url, "fetching");

        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url).body(request.body.clone()),
        };

        match self.config.header_set(&request.header_set) {
            Some(set) => {
                for (name, value) in set {
                    builder = builder.header(name.as_str(), value.as_str());
                }
            }
            None => warn!(header_set = %request.header_set, "unknown header set, sending without it"),
        }
        for (name, values) in &request.headers {
            for value in values {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }

        let response = builder.send().await.map_err(|e| classify(&request.url, &e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::status(&request.url, status.as_u16()));
        }

        response.text().await.map_err(|e| classify(&request.url, &e))
    }
}
