//! Ressources audio jouables et leur suppression après usage

use crate::{Error, Result};
use async_trait::async_trait;
use std::fmt::Debug;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Une ressource prête à être jouée par une connexion vocale.
///
/// Consommée une seule fois par le scheduler, qui appelle `delete()` après
/// la lecture, qu'elle ait réussi ou non.
#[async_trait]
pub trait PlayableResource: Send + Sync + Debug {
    /// Chemin de fichier ou URL que le transport sait ouvrir
    fn locator(&self) -> &str;

    /// Supprime la ressource transitoire
    async fn delete(self: Box<Self>) -> Result<()>;
}

/// Fichier temporaire supprimé après lecture
#[derive(Debug, Clone)]
pub struct TempFileResource {
    path: PathBuf,
    locator: String,
}

impl TempFileResource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let locator = path.to_string_lossy().to_string();
        Self { path, locator }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PlayableResource for TempFileResource {
    fn locator(&self) -> &str {
        &self.locator
    }

    async fn delete(self: Box<Self>) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            // Déjà supprimé : rien à faire
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Cleanup(format!("{}: {}", self.path.display(), e))),
        }
    }
}
