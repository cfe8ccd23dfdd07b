//! Service layer for the feed service.
//!
//! This module contains the ingestion pipeline:
//! - Strict line parsing of the upstream document (`parser`)
//! - Markup stripping and author joining (`normalize`)
//! - The tolerant generic-feed path (`generic`)
//! - Upstream fetching (`FeedSource`)

pub mod generic;
pub mod normalize;
pub mod parser;
mod source;

pub use generic::{from_generic_feed, parse_generic};
pub use normalize::{join_authors, sanitize};
pub use parser::{LineParser, parse_document};
pub use source::{FeedSource, GenericSource, LegacySource, from_config};
