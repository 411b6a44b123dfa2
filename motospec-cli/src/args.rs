use clap::Parser;
use std::path::PathBuf;

use motospec::config::ScraperConfig;
use motospec::errors::ConfigError;

/// Scrape motorcycle specifications into a JSON-lines file.
#[derive(Debug, Clone, Parser)]
#[command(name = "motospec", version)]
#[command(about = "Walk brand, model and variant pages and write one spec per line. Ctrl-C stops cleanly.")]
pub struct Cli {
    /// JSON config file. Flags below override its values.
    #[arg(long, short, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Page listing the brands.
    #[arg(long, value_name = "URL")]
    pub start_url: Option<String>,

    /// Seconds each stage waits before processing an item.
    #[arg(long, short, value_name = "SECS")]
    pub interval: Option<f64>,

    /// JSON-lines output file.
    #[arg(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Debug-level logging unless RUST_LOG is set.
    #[arg(long, short)]
    pub verbose: bool,
}

impl Cli {
    /// Loads the config file (or defaults) and applies flag overrides.
    pub fn resolve_config(&self) -> Result<ScraperConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ScraperConfig::load(path)?,
            None => ScraperConfig::default(),
        };
        if let Some(url) = &self.start_url {
            config = config.with_start_url(url.clone());
        }
        if let Some(interval) = self.interval {
            config = config.with_interval_secs(interval);
        }
        if let Some(output) = &self.output {
            config = config.with_output_path(output.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from(["motospec", "--interval", "0.25", "--output", "out.json", "-v"]);
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.interval(), Duration::from_millis(250));
        assert_eq!(config.output_path, PathBuf::from("out.json"));
        assert!(cli.verbose);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let cli = Cli::parse_from(["motospec", "--start-url", ""]);
        assert!(cli.resolve_config().is_err());
    }
}
