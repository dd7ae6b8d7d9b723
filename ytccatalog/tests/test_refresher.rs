use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use ytccatalog::{
    CatalogError, CatalogRefresher, CatalogSnapshot, CatalogSource, CatalogStore, SourceEntry,
};

/// Source de test : chaque appel renvoie une entrée de plus que le précédent
struct GrowingSource {
    calls: AtomicUsize,
    fail: bool,
}

impl GrowingSource {
    fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail,
        })
    }
}

#[async_trait]
impl CatalogSource for GrowingSource {
    async fn fetch(&self) -> anyhow::Result<CatalogSnapshot> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail {
            anyhow::bail!("quota exceeded");
        }
        let entries = (0..n)
            .map(|i| SourceEntry {
                id: format!("vid{i}"),
                duration: "PT1M".to_string(),
                title: format!("Video {i}"),
                published_at: Some(Utc::now()),
            })
            .collect();
        Ok(CatalogSnapshot {
            channel_title: Some("Test Channel".to_string()),
            entries,
        })
    }
}

fn entry(id: &str, duration: &str, dated: bool) -> SourceEntry {
    SourceEntry {
        id: id.to_string(),
        duration: duration.to_string(),
        title: id.to_string(),
        published_at: dated.then(Utc::now),
    }
}

#[test]
fn test_invalid_entries_are_dropped() {
    let snapshot = CatalogSnapshot {
        channel_title: None,
        entries: vec![
            entry("ok", "PT3M", true),
            entry("live", "P0D", true),
            entry("garbage", "three minutes", true),
            entry("undated", "PT3M", false),
        ],
    };
    let items = snapshot.into_items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, "ok");
    assert_eq!(items[0].duration_secs, 180);
}

#[tokio::test]
async fn test_refresh_now_publishes_snapshot() {
    let store = CatalogStore::new();
    let refresher = CatalogRefresher::new(store.clone(), GrowingSource::new(false));

    assert_eq!(refresher.refresh_now().await.unwrap(), 1);
    assert!(store.is_ready());
    assert_eq!(store.current().total_duration_secs(), 60);
    assert_eq!(store.channel_title().as_deref(), Some("Test Channel"));
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_snapshot() {
    let store = CatalogStore::new();
    let refresher = CatalogRefresher::new(store.clone(), GrowingSource::new(true));

    let err = refresher.refresh_now().await.unwrap_err();
    assert!(matches!(err, CatalogError::Source(_)));
    assert!(!store.is_ready());
    assert!(store.current().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_periodic_refresh_until_cancelled() {
    let store = CatalogStore::new();
    let source = GrowingSource::new(false);
    let refresher = CatalogRefresher::new(store.clone(), source.clone());
    let stop = CancellationToken::new();

    let handle = refresher.spawn_periodic(Duration::from_secs(3600), stop.clone());

    tokio::time::sleep(Duration::from_secs(3600 * 2 + 10)).await;
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    assert_eq!(store.current().len(), 2);

    stop.cancel();
    handle.await.unwrap();

    tokio::time::sleep(Duration::from_secs(3600 * 3)).await;
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
}
