//! Types d'erreurs pour ytccatalog

/// Erreurs du catalogue et de la sélection de clips
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Aucun média à échantillonner (catalogue vide ou durée totale nulle)
    #[error("Catalog is empty: nothing to sample")]
    EmptyCatalog,

    #[error("Draw {draw} is outside the catalog timeline [0, {total})")]
    DrawOutOfRange { draw: u64, total: u64 },

    #[error("Invalid clip length: {0}s")]
    InvalidLength(u64),

    #[error("Invalid media item {id}: {reason}")]
    InvalidItem { id: String, reason: String },

    #[error("Invalid ISO 8601 duration: {0}")]
    InvalidDuration(String),

    #[error("Catalog source error: {0}")]
    Source(#[source] anyhow::Error),
}

/// Type Result spécialisé pour ytccatalog
pub type Result<T> = std::result::Result<T, CatalogError>;
