//! Duration-weighted clip selection.
//!
//! Items are picked with a probability proportional to their length, which
//! is the same as drawing a uniform instant on the concatenated timeline of
//! the whole catalog. Only the draw is random: [`select_at`] is a pure
//! function of the draw so selections can be replayed in tests.

use crate::{Catalog, CatalogError, CatalogStore, MediaItem, Result};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::debug;

/// A clip cut out of one catalog item.
///
/// Invariant: `start_offset_secs + actual_length_secs <= item.duration_secs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipSelection {
    pub item: MediaItem,
    pub start_offset_secs: u64,
    pub actual_length_secs: u64,
}

impl ClipSelection {
    pub fn end_offset_secs(&self) -> u64 {
        self.start_offset_secs + self.actual_length_secs
    }

    /// Deep link to the source video at the clip start.
    pub fn source_url(&self) -> String {
        format!("https://youtu.be/{}?t={}", self.item.id, self.start_offset_secs)
    }
}

/// Selects the clip for a known draw `r` in `[0, T)`.
///
/// The clip starts at `r - start` inside the located item. When fewer than
/// `desired_secs` remain, the start is rolled back so the clip fits; an item
/// shorter than the request is played whole.
pub fn select_at(catalog: &Catalog, desired_secs: u64, draw: u64) -> Result<ClipSelection> {
    if desired_secs == 0 {
        return Err(CatalogError::InvalidLength(desired_secs));
    }
    let total = catalog.total_duration_secs();
    if catalog.is_empty() || total == 0 {
        return Err(CatalogError::EmptyCatalog);
    }

    let (index, start) = catalog
        .locate(draw)
        .ok_or(CatalogError::DrawOutOfRange { draw, total })?;
    let item = &catalog.items()[index];

    let mut offset = draw - start;
    let mut length = desired_secs;
    if item.duration_secs - offset < desired_secs {
        if item.duration_secs < desired_secs {
            offset = 0;
            length = item.duration_secs;
        } else {
            offset = item.duration_secs - desired_secs;
        }
    }

    debug!(
        draw,
        total,
        item = %item.id,
        offset,
        length,
        duration = item.duration_secs,
        "Clip selected"
    );

    Ok(ClipSelection {
        item: item.clone(),
        start_offset_secs: offset,
        actual_length_secs: length,
    })
}

/// Draws `r` uniformly in `[0, T)` from `rng` and selects the matching clip.
pub fn select<R: Rng>(
    catalog: &Catalog,
    desired_secs: u64,
    rng: &mut R,
) -> Result<ClipSelection> {
    let total = catalog.total_duration_secs();
    if catalog.is_empty() || total == 0 {
        return Err(CatalogError::EmptyCatalog);
    }
    let draw = rng.random_range(0..total);
    select_at(catalog, desired_secs, draw)
}

/// Selector bound to a [`CatalogStore`].
///
/// Each call works on one snapshot taken at call time. The random source is
/// owned by the selector and can be seeded for replay.
pub struct ClipSelector {
    store: CatalogStore,
    rng: Mutex<StdRng>,
}

impl ClipSelector {
    pub fn new(store: CatalogStore) -> Self {
        Self::with_rng(store, StdRng::from_os_rng())
    }

    pub fn with_rng(store: CatalogStore, rng: StdRng) -> Self {
        Self {
            store,
            rng: Mutex::new(rng),
        }
    }

    pub fn seeded(store: CatalogStore, seed: u64) -> Self {
        Self::with_rng(store, StdRng::seed_from_u64(seed))
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    pub fn select(&self, desired_secs: u64) -> Result<ClipSelection> {
        let catalog = self.store.current();
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        select(&catalog, desired_secs, &mut *rng)
    }
}
