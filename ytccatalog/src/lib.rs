//! # ytccatalog - Catalogue de médias et sélection aléatoire de clips
//!
//! Cette crate fournit :
//! - `MediaItem` : un média du catalogue (id, durée, titre, date de publication)
//! - `Catalog` : un snapshot immuable avec les sommes préfixes des durées
//! - `CatalogStore` : publication atomique des snapshots, lectures concurrentes
//! - `CatalogSource` / `CatalogRefresher` : rafraîchissement périodique depuis
//!   un collaborateur d'ingestion externe
//! - `select` / `ClipSelector` : tirage d'un clip uniforme sur la durée totale
//!
//! # Exemple d'utilisation
//!
//! ```
//! use rand::{SeedableRng, rngs::StdRng};
//! use ytccatalog::{Catalog, MediaItem, select};
//!
//! let published = chrono::Utc::now();
//! let catalog = Catalog::new(vec![
//!     MediaItem::new("A", 30, "Long one", published)?,
//!     MediaItem::new("B", 10, "Short one", published)?,
//! ]);
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let clip = select(&catalog, 10, &mut rng)?;
//! assert!(clip.start_offset_secs + clip.actual_length_secs <= clip.item.duration_secs);
//! # Ok::<(), ytccatalog::CatalogError>(())
//! ```

mod catalog;
mod duration;
mod error;
mod item;
mod selector;
mod source;

#[cfg(feature = "ytcconfig")]
mod config_ext;

pub use catalog::{Catalog, CatalogStore};
pub use duration::parse_iso8601_duration;
pub use error::{CatalogError, Result};
pub use item::MediaItem;
pub use selector::{ClipSelection, ClipSelector, select, select_at};
pub use source::{CatalogRefresher, CatalogSnapshot, CatalogSource, SourceEntry};

#[cfg(feature = "ytcconfig")]
pub use config_ext::CatalogConfigExt;
