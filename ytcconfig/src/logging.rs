//! Initialisation du système de logging
//!
//! Installe un subscriber `tracing` global dont le niveau minimum vient de
//! `host.logger.min_level`. La variable `RUST_LOG`, si elle est définie,
//! prend le pas sur la configuration.

use crate::Config;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Convertit un nom de niveau ("INFO", "debug", …) en `Level`
pub fn string_to_level(level: &str) -> Option<Level> {
    match level.trim().to_uppercase().as_str() {
        "ERROR" => Some(Level::ERROR),
        "WARN" | "WARNING" => Some(Level::WARN),
        "INFO" => Some(Level::INFO),
        "DEBUG" => Some(Level::DEBUG),
        "TRACE" => Some(Level::TRACE),
        _ => None,
    }
}

/// Construit le filtre à partir de la configuration
///
/// Un niveau inconnu retombe sur INFO.
pub fn build_filter(config: &Config) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let level = string_to_level(&config.get_log_min_level()).unwrap_or(Level::INFO);
    EnvFilter::new(level.as_str().to_lowercase())
}

/// Initialise le logging global
///
/// Retourne `false` si un subscriber était déjà installé (tests, double
/// initialisation) ; ce n'est pas une erreur.
///
/// ```no_run
/// let config = ytcconfig::get_config();
/// ytcconfig::logging::init_logging(&config);
/// ```
pub fn init_logging(config: &Config) -> bool {
    let registry = tracing_subscriber::registry().with(build_filter(config));

    let result = if config.get_log_enable_console() {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(true),
            )
            .try_init()
    } else {
        registry.try_init()
    };

    result.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_to_level() {
        assert_eq!(string_to_level("info"), Some(Level::INFO));
        assert_eq!(string_to_level(" Warning "), Some(Level::WARN));
        assert_eq!(string_to_level("TRACE"), Some(Level::TRACE));
        assert_eq!(string_to_level("verbose"), None);
    }

    #[test]
    fn test_init_logging_twice_is_harmless() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        config.set_log_min_level("debug".to_string()).unwrap();

        let _ = init_logging(&config);
        assert!(!init_logging(&config));
    }
}
