//! Types d'erreurs pour ytcplayer

use ytccatalog::CatalogError;

/// Erreurs de lecture des clips
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Catalog is not ready yet")]
    CatalogNotReady,

    #[error("Materialization failed: {0}")]
    Materialization(String),

    #[error("Requester {0} is not in a voice channel")]
    RequesterAbsent(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Playback failed: {0}")]
    Playback(String),

    #[error("Cleanup failed: {0}")]
    Cleanup(String),

    /// Un collaborateur (transport, matérialiseur, ressource) a paniqué
    #[error("Collaborator panicked: {0}")]
    Panic(String),
}

/// Catégorie d'erreur rapportée pour un job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobErrorKind {
    Catalog,
    Materialization,
    RequesterAbsent,
    Connection,
    Playback,
    Cleanup,
    Panic,
}

impl Error {
    pub fn kind(&self) -> JobErrorKind {
        match self {
            Error::Catalog(_) | Error::CatalogNotReady => JobErrorKind::Catalog,
            Error::Materialization(_) => JobErrorKind::Materialization,
            Error::RequesterAbsent(_) => JobErrorKind::RequesterAbsent,
            Error::Connection(_) => JobErrorKind::Connection,
            Error::Playback(_) => JobErrorKind::Playback,
            Error::Cleanup(_) => JobErrorKind::Cleanup,
            Error::Panic(_) => JobErrorKind::Panic,
        }
    }
}

impl std::fmt::Display for JobErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JobErrorKind::Catalog => "catalog",
            JobErrorKind::Materialization => "materialization",
            JobErrorKind::RequesterAbsent => "requester_absent",
            JobErrorKind::Connection => "connection",
            JobErrorKind::Playback => "playback",
            JobErrorKind::Cleanup => "cleanup",
            JobErrorKind::Panic => "panic",
        };
        f.write_str(name)
    }
}

/// Type Result spécialisé pour ytcplayer
pub type Result<T> = std::result::Result<T, Error>;
