// src/services/source.rs

//! Upstream feed sources.
//!
//! A source fetches the upstream document and decodes it into a snapshot.
//! The refresh scheduler only sees the `FeedSource` trait.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::Result;
use crate::models::{FeedSnapshot, UpstreamConfig, UpstreamFormat};
use crate::services::generic::parse_generic;
use crate::services::parser::parse_document;
use crate::utils::http::{create_async_client, fetch_bytes};

/// Trait for upstream feed sources.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch and decode the current upstream document.
    async fn fetch(&self) -> Result<FeedSnapshot>;

    /// URL this source polls, for logging.
    fn url(&self) -> &str;
}

/// Source for the exact ePrint RSS layout, decoded by the strict line parser.
pub struct LegacySource {
    client: Client,
    url: String,
}

impl LegacySource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl FeedSource for LegacySource {
    async fn fetch(&self) -> Result<FeedSnapshot> {
        let body = fetch_bytes(&self.client, &self.url).await?;
        parse_document(&body)
    }

    fn url(&self) -> &str {
        &self.url
    }
}

/// Source for arbitrary RSS/Atom/JSON feeds.
pub struct GenericSource {
    client: Client,
    url: String,
}

impl GenericSource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl FeedSource for GenericSource {
    async fn fetch(&self) -> Result<FeedSnapshot> {
        let body = fetch_bytes(&self.client, &self.url).await?;
        parse_generic(&body)
    }

    fn url(&self) -> &str {
        &self.url
    }
}

/// Build the source selected by the upstream configuration.
pub fn from_config(config: &UpstreamConfig) -> Result<Arc<dyn FeedSource>> {
    let client = create_async_client(config)?;
    let source: Arc<dyn FeedSource> = match config.format {
        UpstreamFormat::Legacy => Arc::new(LegacySource::new(client, &config.url)),
        UpstreamFormat::Generic => Arc::new(GenericSource::new(client, &config.url)),
    };
    log::debug!("Using {:?} source for {}", config.format, config.url);
    Ok(source)
}
