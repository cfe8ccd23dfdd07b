// src/models/mod.rs

//! Domain models for the feed service.

mod config;
mod item;

// Re-export all public types
pub use config::{
    Config, DEFAULT_REFRESH_INTERVAL, EPRINT_FEED_URL, LoggingConfig, RefreshConfig, SiteConfig,
    UpstreamConfig, UpstreamFormat,
};
pub use item::{FeedSnapshot, Item, WeekKey};
