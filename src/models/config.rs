//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Upstream feed served by the deployed instance.
pub const EPRINT_FEED_URL: &str = "https://eprint.iacr.org/rss/rss.xml";

/// Refresh period of the deployed instance.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(2 * 60 * 60);

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where and how to fetch the upstream document
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Refresh schedule
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Public-facing site settings used in derived feeds
    #[serde(default)]
    pub site: SiteConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.upstream.url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::validation(format!(
                "upstream.url must be http(s), got scheme {:?}",
                url.scheme()
            )));
        }
        Url::parse(&self.site.base_url)?;
        if self.upstream.user_agent.trim().is_empty() {
            return Err(AppError::validation("upstream.user_agent is empty"));
        }
        if self.upstream.timeout_secs == 0 {
            return Err(AppError::validation("upstream.timeout_secs must be > 0"));
        }
        if self.refresh.interval_secs == 0 {
            return Err(AppError::validation("refresh.interval_secs must be > 0"));
        }
        self.logging.level_filter()?;
        Ok(())
    }
}

/// Which ingestion path decodes the upstream document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamFormat {
    /// Strict line-oriented parser for the exact ePrint RSS layout
    #[default]
    Legacy,
    /// Any RSS/Atom/JSON feed, decoded by a general-purpose feed parser
    Generic,
}

/// Upstream fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Feed URL
    #[serde(default = "defaults::url")]
    pub url: String,

    /// Decoding path
    #[serde(default)]
    pub format: UpstreamFormat,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: defaults::url(),
            format: UpstreamFormat::default(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Refresh schedule settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Seconds between refresh cycles
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
        }
    }
}

/// Site settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Base URL that derived feed links are built on
    #[serde(default = "defaults::base_url")]
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "defaults::level")]
    pub level: String,
}

impl LoggingConfig {
    /// The configured level as a `log` filter.
    pub fn level_filter(&self) -> Result<log::LevelFilter> {
        self.level.trim().parse().map_err(|_| {
            AppError::validation(format!("logging.level is not a log level: {:?}", self.level))
        })
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::level(),
        }
    }
}

mod defaults {
    pub fn url() -> String {
        super::EPRINT_FEED_URL.into()
    }
    pub fn user_agent() -> String {
        concat!("eprint-feed/", env!("CARGO_PKG_VERSION")).into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn interval() -> u64 {
        super::DEFAULT_REFRESH_INTERVAL.as_secs()
    }
    pub fn base_url() -> String {
        "https://eprint.fans".into()
    }
    pub fn level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn validate_default_config_ok() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.refresh.interval(), DEFAULT_REFRESH_INTERVAL);
        assert_eq!(config.upstream.format, UpstreamFormat::Legacy);
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.upstream.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let mut config = Config::default();
        config.refresh.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_http_upstream() {
        let mut config = Config::default();
        config.upstream.url = "ftp://eprint.iacr.org/rss.xml".to_string();
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));

        config.upstream.url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(AppError::Url(_))));
    }

    #[test]
    fn load_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[upstream]\nformat = \"generic\"\n\n[refresh]\ninterval_secs = 60"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.upstream.format, UpstreamFormat::Generic);
        assert_eq!(config.upstream.url, EPRINT_FEED_URL);
        assert_eq!(config.refresh.interval_secs, 60);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn logging_level_filter() {
        let mut config = Config::default();
        assert_eq!(config.logging.level_filter().unwrap(), log::LevelFilter::Info);

        config.logging.level = "DEBUG".to_string();
        assert_eq!(config.logging.level_filter().unwrap(), log::LevelFilter::Debug);

        config.logging.level = "chatty".to_string();
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn load_or_default_on_missing_file() {
        let config = Config::load_or_default("/nonexistent/eprint-feed.toml");
        assert_eq!(config.upstream.url, EPRINT_FEED_URL);
    }
}
