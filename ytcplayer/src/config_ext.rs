//! Extension de ytcconfig pour le lecteur

use crate::{PlayerSettings, RedemptionMatcher, RedemptionRoute};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Trait d'extension pour ytcconfig::Config
pub trait PlayerConfigExt {
    /// Réglages du lecteur, valeurs invalides remplacées par les défauts
    fn player_settings(&self) -> PlayerSettings;

    /// Matcher des récompenses Twitch.
    ///
    /// `None` si le motif, la guilde principale ou l'identifiant du streamer
    /// ne sont pas configurés.
    fn redemption_matcher(&self) -> Option<RedemptionMatcher>;

    /// Répertoire des clips découpés (répertoire temporaire du système par
    /// défaut)
    fn clip_output_dir(&self) -> PathBuf;
}

impl PlayerConfigExt for ytcconfig::Config {
    fn player_settings(&self) -> PlayerSettings {
        PlayerSettings {
            clip_secs: self.get_clip_duration(),
            redemption_secs: self.get_redemption_duration(),
            volume: self.get_volume(),
            status_timeout: Duration::from_secs(self.get_status_timeout()),
            command_prefix: self.get_command_prefix(),
        }
    }

    fn redemption_matcher(&self) -> Option<RedemptionMatcher> {
        let pattern = self.get_redemption_match()?;
        let (Some(guild), Some(streamer)) =
            (self.get_primary_guild_id(), self.get_streamer_discord_id())
        else {
            warn!("Redemption pattern set but primary guild or streamer id missing, ignoring");
            return None;
        };

        RedemptionMatcher::new(
            &pattern,
            RedemptionRoute {
                destination: guild.into(),
                requester: streamer.into(),
                clip_secs: self.get_redemption_duration(),
            },
        )
    }

    fn clip_output_dir(&self) -> PathBuf {
        self.get_temp_dir()
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
    }
}
