//! Scraper configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config file
//! and a partial one only overrides what it names.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ConfigError;
use crate::fetch::FetchConfig;
use crate::sink::{ErrorLog, ErrorSink, FileErrorLog, TracingErrorLog};
use crate::stages::SiteSelectors;

/// Where logs go and how verbose they are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log file for fetch-layer errors; `None` logs them through tracing.
    #[serde(default = "default_client_error_log")]
    pub client_error_log: Option<PathBuf>,
    /// Log file for stage errors; `None` logs them through tracing.
    #[serde(default = "default_processor_error_log")]
    pub processor_error_log: Option<PathBuf>,
    /// File receiving the general tracing output, in addition to stderr.
    #[serde(default = "default_processor_log")]
    pub processor_log: Option<PathBuf>,
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_client_error_log() -> Option<PathBuf> {
    Some(PathBuf::from("errClient.log"))
}

fn default_processor_error_log() -> Option<PathBuf> {
    Some(PathBuf::from("errProcessor.log"))
}

fn default_processor_log() -> Option<PathBuf> {
    Some(PathBuf::from("processor.log"))
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            client_error_log: default_client_error_log(),
            processor_error_log: default_processor_error_log(),
            processor_log: default_processor_log(),
            level: default_level(),
        }
    }
}

impl LogConfig {
    /// Logs everything through tracing only, with no files.
    #[must_use]
    pub fn tracing_only() -> Self {
        Self {
            client_error_log: None,
            processor_error_log: None,
            processor_log: None,
            level: default_level(),
        }
    }

    /// Builds the error sink: transport errors to the client log,
    /// processing errors to the processor log.
    pub fn error_sink(&self) -> Result<ErrorSink, ConfigError> {
        let client: Arc<dyn ErrorLog> = match &self.client_error_log {
            Some(path) => Arc::new(open_log(path, "Client error:")?),
            None => Arc::new(TracingErrorLog::new("client")),
        };
        let processor: Arc<dyn ErrorLog> = match &self.processor_error_log {
            Some(path) => Arc::new(open_log(path, "Processor error:")?),
            None => Arc::new(TracingErrorLog::new("processor")),
        };
        Ok(ErrorSink::new_split(client, processor))
    }
}

fn open_log(path: &Path, prefix: &'static str) -> Result<FileErrorLog, ConfigError> {
    FileErrorLog::open(path, prefix).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Page the brand stage starts from.
    #[serde(default = "default_start_url")]
    pub start_url: String,
    /// Seconds each worker waits before processing an item.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: f64,
    /// JSON-lines file receiving the specs.
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    /// HTTP settings.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Logging settings.
    #[serde(default)]
    pub logs: LogConfig,
    /// Selectors for the site stages.
    #[serde(default)]
    pub selectors: SiteSelectors,
}

fn default_start_url() -> String {
    "https://www.autoevolution.com/moto/".to_string()
}

fn default_interval_secs() -> f64 {
    4.0
}

fn default_output_path() -> PathBuf {
    PathBuf::from("motospecs.json")
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            start_url: default_start_url(),
            interval_secs: default_interval_secs(),
            output_path: default_output_path(),
            fetch: FetchConfig::default(),
            logs: LogConfig::default(),
            selectors: SiteSelectors::default(),
        }
    }
}

impl ScraperConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the start URL.
    #[must_use]
    pub fn with_start_url(mut self, url: impl Into<String>) -> Self {
        self.start_url = url.into();
        self
    }

    /// Sets the inter-item delay.
    #[must_use]
    pub fn with_interval_secs(mut self, seconds: f64) -> Self {
        self.interval_secs = seconds;
        self
    }

    /// Sets the output file.
    #[must_use]
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    /// Sets the logging configuration.
    #[must_use]
    pub fn with_logs(mut self, logs: LogConfig) -> Self {
        self.logs = logs;
        self
    }

    /// The inter-item delay.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval_secs.max(0.0))
    }

    /// Checks ranges and selector syntax.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_url.trim().is_empty() {
            return Err(ConfigError::Invalid("start_url is empty".into()));
        }
        if !self.interval_secs.is_finite() || self.interval_secs < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "interval_secs must be a non-negative number, got {}",
                self.interval_secs
            )));
        }
        if !self.fetch.timeout_seconds.is_finite() || self.fetch.timeout_seconds <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "fetch.timeout_seconds must be positive, got {}",
                self.fetch.timeout_seconds
            )));
        }
        if self.fetch.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid("fetch.retry.max_attempts must be at least 1".into()));
        }
        self.selectors.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ScraperConfig::default();
        assert_eq!(config.start_url, "https://www.autoevolution.com/moto/");
        assert_eq!(config.interval(), Duration::from_secs(4));
        assert_eq!(config.fetch.retry.max_attempts, 3);
        assert_eq!(config.fetch.timeout_seconds, 10.0);
        config.validate().unwrap();
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"interval_secs": 0.5, "fetch": {{"timeout_seconds": 3}}, "selectors": {{"spec_table": ".specs"}}}}"#
        )
        .unwrap();

        let config = ScraperConfig::load(file.path()).unwrap();
        assert_eq!(config.interval(), Duration::from_millis(500));
        assert_eq!(config.fetch.timeout_seconds, 3.0);
        assert_eq!(config.fetch.user_agent, FetchConfig::default().user_agent);
        assert_eq!(config.selectors.spec_table, ".specs");
        assert_eq!(config.selectors.brand_link, ".carman h5 a");
        assert_eq!(config.logs, LogConfig::default());
    }

    #[test]
    fn test_load_errors() {
        let err = ScraperConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = ScraperConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_validation() {
        assert!(ScraperConfig::new().with_interval_secs(-1.0).validate().is_err());
        assert!(ScraperConfig::new().with_start_url(" ").validate().is_err());

        let mut config = ScraperConfig::new();
        config.fetch.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_error_sink_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let logs = LogConfig {
            client_error_log: Some(dir.path().join("client.log")),
            processor_error_log: Some(dir.path().join("processor.log")),
            processor_log: None,
            level: "debug".into(),
        };
        let sink = logs.error_sink().unwrap();
        sink.route(&crate::errors::ScrapeError::timeout("/a"));
        sink.route(&crate::errors::ScrapeError::processing("spec", "bad table"));

        let client = std::fs::read_to_string(dir.path().join("client.log")).unwrap();
        let processor = std::fs::read_to_string(dir.path().join("processor.log")).unwrap();
        assert!(client.contains("Client error:"));
        assert!(processor.contains("Processor error:"));
        assert!(processor.contains("bad table"));
    }
}
