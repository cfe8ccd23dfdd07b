// src/pipeline/refresh.rs

//! Periodic refresh of the feed store.
//!
//! Each refresh fetches the upstream document, decodes it and commits the
//! snapshot. A failed refresh leaves the previous snapshot in place and the
//! next tick tries again.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};

use crate::error::{AppError, Result};
use crate::services::FeedSource;
use crate::storage::{CommitSummary, FeedStore};

/// Drives refreshes of a [`FeedStore`] from a [`FeedSource`].
pub struct RefreshScheduler {
    source: Arc<dyn FeedSource>,
    store: Arc<FeedStore>,
    interval: Duration,
}

impl RefreshScheduler {
    pub fn new(source: Arc<dyn FeedSource>, store: Arc<FeedStore>, interval: Duration) -> Self {
        Self {
            source,
            store,
            interval,
        }
    }

    pub fn store(&self) -> &Arc<FeedStore> {
        &self.store
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Fetch, decode and commit once.
    ///
    /// Errors are logged and returned; the store is untouched on failure.
    pub async fn run_once(&self) -> Result<CommitSummary> {
        log::debug!("Refreshing feed from {}", self.source.url());

        let snapshot = match self.source.fetch().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::error!(
                    "Refresh from {} failed, keeping previous snapshot: {}",
                    self.source.url(),
                    e
                );
                return Err(e);
            }
        };

        match self.store.commit(snapshot) {
            Ok(summary) => {
                log::info!(
                    "Committed {} items ({} newly indexed across {} weeks), feed updated {}",
                    summary.item_count,
                    summary.newly_indexed,
                    summary.weeks_touched,
                    summary.updated
                );
                Ok(summary)
            }
            Err(e @ AppError::StaleSnapshot { .. }) => {
                log::warn!("Ignoring refresh: {}", e);
                Err(e)
            }
            Err(e) => {
                log::error!("Commit failed: {}", e);
                Err(e)
            }
        }
    }

    /// Refresh every interval until the process exits.
    ///
    /// The first refresh happens one interval after the call; callers that
    /// want an immediate fill run [`run_once`](Self::run_once) first.
    pub async fn run_forever(&self) {
        self.run_until(std::future::pending()).await
    }

    /// Refresh every interval until `shutdown` resolves.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        log::info!(
            "Refreshing {} every {}s",
            self.source.url(),
            self.interval.as_secs()
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    log::info!("Refresh loop stopped");
                    return;
                }
                _ = ticker.tick() => {
                    // Failures are already logged; the next tick retries.
                    let _ = self.run_once().await;
                }
            }
        }
    }
}
