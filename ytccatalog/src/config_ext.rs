//! Extension de ytcconfig pour le catalogue

use std::path::PathBuf;
use std::time::Duration;

/// Trait d'extension pour ytcconfig::Config
pub trait CatalogConfigExt {
    /// Répertoire où l'ingestion dépose les fichiers audio (`<id>.opus`)
    fn media_dir(&self) -> anyhow::Result<PathBuf>;

    /// Période de rafraîchissement du catalogue
    fn refresh_interval(&self) -> Duration;
}

impl CatalogConfigExt for ytcconfig::Config {
    fn media_dir(&self) -> anyhow::Result<PathBuf> {
        let dir = self.get_managed_dir(&["catalog", "media_dir"], "media")?;
        Ok(PathBuf::from(dir))
    }

    fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.get_refresh_interval())
    }
}
