//! Ingestion collaborator contract and the background refresher.
//!
//! The catalog is never fetched by the core itself: a [`CatalogSource`]
//! (typically a video platform API client plus its download cache) returns
//! raw entries, and the [`CatalogRefresher`] validates them and publishes a
//! new snapshot into the [`CatalogStore`].

use crate::{Catalog, CatalogError, CatalogStore, MediaItem, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Raw entry as reported by the ingestion collaborator.
#[derive(Debug, Clone)]
pub struct SourceEntry {
    pub id: String,
    /// ISO 8601 duration (`PT4M13S`)
    pub duration: String,
    pub title: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// Result of one fetch from the ingestion collaborator.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub channel_title: Option<String>,
    pub entries: Vec<SourceEntry>,
}

impl CatalogSnapshot {
    /// Converts entries to items, dropping the ones that break an invariant.
    pub fn into_items(self) -> Vec<MediaItem> {
        self.entries
            .into_iter()
            .filter_map(|entry| {
                let Some(published_at) = entry.published_at else {
                    warn!(id = %entry.id, "Skipping entry without publication date");
                    return None;
                };
                match MediaItem::from_iso8601(entry.id, &entry.duration, entry.title, published_at)
                {
                    Ok(item) => Some(item),
                    Err(e) => {
                        warn!("Skipping catalog entry: {}", e);
                        None
                    }
                }
            })
            .collect()
    }
}

/// Catalog ingestion collaborator
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetches the full list of media currently available for playback.
    async fn fetch(&self) -> anyhow::Result<CatalogSnapshot>;
}

/// Refreshes a [`CatalogStore`] from a [`CatalogSource`].
///
/// A failed refresh keeps the previous snapshot in place.
#[derive(Clone)]
pub struct CatalogRefresher {
    store: CatalogStore,
    source: Arc<dyn CatalogSource>,
}

impl CatalogRefresher {
    pub fn new(store: CatalogStore, source: Arc<dyn CatalogSource>) -> Self {
        Self { store, source }
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    /// Fetches once and publishes the result. Returns the number of items.
    pub async fn refresh_now(&self) -> Result<usize> {
        let snapshot = self.source.fetch().await.map_err(CatalogError::Source)?;
        let channel_title = snapshot.channel_title.clone();
        let fetched = snapshot.entries.len();
        let items = snapshot.into_items();
        let count = items.len();

        if fetched > 0 && count == 0 {
            warn!(fetched, "No valid entry in fetched catalog, keeping previous snapshot");
            return Ok(self.store.current().len());
        }

        if channel_title.is_some() {
            self.store.set_channel_title(channel_title);
        }
        self.store.publish(Catalog::new(items));
        info!(fetched, kept = count, "🔄 Catalog refreshed");
        Ok(count)
    }

    /// Spawns the periodic refresh task.
    ///
    /// The first refresh happens one `period` after the call; run
    /// [`refresh_now`](Self::refresh_now) first to populate the store at
    /// startup. The task stops when `stop` is cancelled.
    pub fn spawn_periodic(&self, period: Duration, stop: CancellationToken) -> JoinHandle<()> {
        let refresher = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = stop.cancelled() => {
                        info!("Catalog refresh task stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Err(e) = refresher.refresh_now().await {
                            error!("Catalog refresh failed: {}", e);
                        }
                    }
                }
            }
        })
    }
}
