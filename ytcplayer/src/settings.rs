//! Réglages du lecteur de clips

use std::time::Duration;

/// Paramètres de lecture, indépendants de la source de configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSettings {
    /// Longueur demandée pour un clip joué par commande (secondes)
    pub clip_secs: u64,
    /// Longueur demandée pour un clip déclenché par une récompense Twitch
    pub redemption_secs: u64,
    /// Gain appliqué lors de la découpe
    pub volume: f64,
    /// Délai avant le retour au statut par défaut
    pub status_timeout: Duration,
    /// Commande affichée dans le statut (`"<titre> | <commande>"`)
    pub command_prefix: String,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            clip_secs: 10,
            redemption_secs: 10,
            volume: 0.5,
            status_timeout: Duration::from_secs(60),
            command_prefix: "!play".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = PlayerSettings::default();
        assert_eq!(settings.clip_secs, 10);
        assert_eq!(settings.redemption_secs, 10);
        assert_eq!(settings.volume, 0.5);
        assert_eq!(settings.status_timeout, Duration::from_secs(60));
        assert_eq!(settings.command_prefix, "!play");
    }
}
