//! MediaItem : un média du catalogue

use crate::{CatalogError, Result, parse_iso8601_duration};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Un média connu du catalogue.
///
/// Immuable pendant toute la durée de vie d'un snapshot : un rafraîchissement
/// remplace le catalogue entier, jamais un item en place. La désérialisation
/// passe par [`MediaItem::new`] et applique donc les mêmes contrôles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MediaItemRecord")]
pub struct MediaItem {
    /// Identifiant du média côté plateforme (ex: id de vidéo YouTube)
    pub id: String,
    /// Durée en secondes, toujours strictement positive
    pub duration_secs: u64,
    pub title: String,
    pub published_at: DateTime<Utc>,
}

/// Forme brute, non validée, d'un `MediaItem` sérialisé
#[derive(Deserialize)]
struct MediaItemRecord {
    id: String,
    duration_secs: u64,
    title: String,
    published_at: DateTime<Utc>,
}

impl TryFrom<MediaItemRecord> for MediaItem {
    type Error = CatalogError;

    fn try_from(record: MediaItemRecord) -> Result<Self> {
        Self::new(
            record.id,
            record.duration_secs,
            record.title,
            record.published_at,
        )
    }
}

impl MediaItem {
    /// Crée un item en validant ses invariants.
    pub fn new(
        id: impl Into<String>,
        duration_secs: u64,
        title: impl Into<String>,
        published_at: DateTime<Utc>,
    ) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(CatalogError::InvalidItem {
                id,
                reason: "empty id".to_string(),
            });
        }
        if duration_secs == 0 {
            return Err(CatalogError::InvalidItem {
                id,
                reason: "duration must be positive".to_string(),
            });
        }
        Ok(Self {
            id,
            duration_secs,
            title: title.into(),
            published_at,
        })
    }

    /// Crée un item à partir d'une durée ISO 8601 (`PT3M20S`).
    pub fn from_iso8601(
        id: impl Into<String>,
        duration: &str,
        title: impl Into<String>,
        published_at: DateTime<Utc>,
    ) -> Result<Self> {
        let secs = parse_iso8601_duration(duration)?;
        Self::new(id, secs, title, published_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_duration() {
        let err = MediaItem::new("abc", 0, "t", Utc::now()).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidItem { .. }));
    }

    #[test]
    fn test_rejects_empty_id() {
        assert!(MediaItem::new("  ", 12, "t", Utc::now()).is_err());
    }

    #[test]
    fn test_deserialization_is_validated() {
        let valid = "id: abc\nduration_secs: 42\ntitle: Title\npublished_at: 2024-05-01T12:00:00Z\n";
        let item: MediaItem = serde_yaml::from_str(valid).unwrap();
        assert_eq!(item.duration_secs, 42);

        let zero = "id: abc\nduration_secs: 0\ntitle: Title\npublished_at: 2024-05-01T12:00:00Z\n";
        assert!(serde_yaml::from_str::<MediaItem>(zero).is_err());

        let blank = "id: \"\"\nduration_secs: 5\ntitle: Title\npublished_at: 2024-05-01T12:00:00Z\n";
        assert!(serde_yaml::from_str::<MediaItem>(blank).is_err());
    }

    #[test]
    fn test_from_iso8601() {
        let item = MediaItem::from_iso8601("abc", "PT2M5S", "Title", Utc::now()).unwrap();
        assert_eq!(item.duration_secs, 125);

        // Les lives sans durée sont rapportés en P0D
        assert!(MediaItem::from_iso8601("live", "P0D", "Live", Utc::now()).is_err());
    }
}
