//! Pipeline entry points.
//!
//! - `query`: keyword filtering and derived feed views
//! - `atom`: Atom rendering of feed views
//! - `refresh`: periodic fetch-and-commit loop

pub mod atom;
pub mod query;
pub mod refresh;

pub use query::{FULL_FEED_TITLE, FeedView, feed_link, filter_by_keywords, filter_items};
pub use refresh::RefreshScheduler;
