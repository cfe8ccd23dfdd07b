// src/error.rs

//! Unified error handling for the feed service.

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type alias for feed operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Upstream answered, but not with a usable document
    #[error("Fetch error for {url}: {message}")]
    Fetch { url: String, message: String },

    /// The upstream document broke the expected line grammar
    #[error("Parse error at line {line} ({field}): {message}")]
    Parse {
        line: usize,
        field: String,
        message: String,
    },

    /// The generic feed decoder rejected the document
    #[error("Feed error: {0}")]
    Feed(String),

    /// Malformed query parameters (year/week)
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// No snapshot has been committed yet
    #[error("Feed unavailable: no snapshot has been loaded yet")]
    Unavailable,

    /// A commit offered a snapshot older than the installed one
    #[error("Stale snapshot: offered {offered}, current is {current}")]
    StaleSnapshot {
        current: DateTime<Utc>,
        offered: DateTime<Utc>,
    },

    /// Rendering a derived view failed
    #[error("Render error: {0}")]
    Render(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a fetch error for the given upstream URL.
    pub fn fetch(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a parse error pointing at a 1-based line and the awaited field.
    pub fn parse(line: usize, field: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self::Parse {
            line,
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    /// Create an invalid query error.
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether this error came from the upstream side of a refresh cycle.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Fetch { .. } | Self::Parse { .. } | Self::Feed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = AppError::parse(12, "title", "unexpected prefix");
        assert_eq!(
            err.to_string(),
            "Parse error at line 12 (title): unexpected prefix"
        );
        assert!(err.is_upstream());
    }

    #[test]
    fn test_query_errors_are_not_upstream() {
        assert!(!AppError::invalid_query("week").is_upstream());
        assert!(!AppError::Unavailable.is_upstream());
    }
}
