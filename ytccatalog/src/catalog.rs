//! Catalog snapshots and the store publishing them.

use crate::MediaItem;
use std::sync::{
    Arc, RwLock,
    atomic::{AtomicBool, Ordering},
};
use tracing::info;

/// Immutable snapshot of the catalog.
///
/// Prefix sums are computed once at construction: item `i` covers the
/// half-open interval `[starts[i], starts[i] + duration)` of the concatenated
/// timeline.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<MediaItem>,
    starts: Vec<u64>,
    total_secs: u64,
}

impl Catalog {
    pub fn new(items: Vec<MediaItem>) -> Self {
        let mut starts = Vec::with_capacity(items.len());
        let mut accumulated: u64 = 0;
        for item in &items {
            starts.push(accumulated);
            accumulated = accumulated.saturating_add(item.duration_secs);
        }
        Self {
            items,
            starts,
            total_secs: accumulated,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total duration `T` of the concatenated timeline, in seconds
    pub fn total_duration_secs(&self) -> u64 {
        self.total_secs
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    /// Start of item `index` on the concatenated timeline
    pub fn prefix_start(&self, index: usize) -> Option<u64> {
        self.starts.get(index).copied()
    }

    /// Locates the item whose interval contains `position`.
    ///
    /// A position landing exactly on a boundary belongs to the item starting
    /// there. Returns the item index and its interval start, or `None` when
    /// `position >= T`.
    pub fn locate(&self, position: u64) -> Option<(usize, u64)> {
        if position >= self.total_secs {
            return None;
        }
        // starts[0] == 0 <= position, so the partition point is at least 1
        let index = self.starts.partition_point(|&start| start <= position) - 1;
        Some((index, self.starts[index]))
    }
}

struct StoreInner {
    snapshot: RwLock<Arc<Catalog>>,
    channel_title: RwLock<Option<String>>,
    ready: AtomicBool,
}

/// Shared holder of the current catalog snapshot.
///
/// Readers clone the `Arc` of the current snapshot and keep working on it
/// while a refresh publishes a new one; they never see a half-updated
/// catalog. Cloning the store is cheap and shares the same snapshot.
#[derive(Clone)]
pub struct CatalogStore {
    inner: Arc<StoreInner>,
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                snapshot: RwLock::new(Arc::new(Catalog::empty())),
                channel_title: RwLock::new(None),
                ready: AtomicBool::new(false),
            }),
        }
    }

    /// Creates a store already holding `catalog` and marked ready.
    pub fn with_catalog(catalog: Catalog) -> Self {
        let store = Self::new();
        store.publish(catalog);
        store
    }

    /// Current snapshot
    pub fn current(&self) -> Arc<Catalog> {
        match self.inner.snapshot.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replaces the snapshot atomically and marks the store ready.
    pub fn publish(&self, catalog: Catalog) {
        let items = catalog.len();
        let total = catalog.total_duration_secs();
        let fresh = Arc::new(catalog);
        match self.inner.snapshot.write() {
            Ok(mut guard) => *guard = fresh,
            Err(poisoned) => *poisoned.into_inner() = fresh,
        }
        self.inner.ready.store(true, Ordering::Release);
        info!(items, total_secs = total, "📚 Catalog snapshot published");
    }

    /// `true` once a first snapshot has been published
    pub fn is_ready(&self) -> bool {
        self.inner.ready.load(Ordering::Acquire)
    }

    /// Title of the channel the catalog was built from
    pub fn channel_title(&self) -> Option<String> {
        match self.inner.channel_title.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_channel_title(&self, title: Option<String>) {
        match self.inner.channel_title.write() {
            Ok(mut guard) => *guard = title,
            Err(poisoned) => *poisoned.into_inner() = title,
        }
    }
}
