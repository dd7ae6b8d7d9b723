//! # YTClip Configuration Module
//!
//! This module provides configuration management for YTClip, including:
//! - Loading configuration from YAML files
//! - Merging with embedded default configuration
//! - Environment variable overrides
//! - Typed getters falling back to documented defaults
//! - Thread-safe singleton access pattern
//!
//! ## Usage
//!
//! ```no_run
//! use ytcconfig::get_config;
//!
//! let config = get_config();
//!
//! let clip = config.get_clip_duration();
//! let volume = config.get_volume();
//! let media_dir = config.get_managed_dir(&["catalog", "media_dir"], "media")?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Context, Result, anyhow, bail};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde_yaml::{Mapping, Number, Value};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::{info, warn};

pub mod logging;

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("ytclip.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Failed to load YTClip configuration"));
}

const ENV_CONFIG_DIR: &str = "YTCLIP_CONFIG";
const ENV_PREFIX: &str = "YTCLIP_CONFIG__";

// Default values for configuration
pub const DEFAULT_CLIP_DURATION: u64 = 10;
pub const DEFAULT_REDEMPTION_DURATION: u64 = 10;
pub const DEFAULT_VOLUME: f64 = 0.5;
pub const DEFAULT_STATUS_TIMEOUT: u64 = 60;
pub const DEFAULT_COMMAND_PREFIX: &str = "!play";
pub const DEFAULT_REFRESH_INTERVAL: u64 = 24 * 60 * 60;
const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";
const DEFAULT_LOG_ENABLE_CONSOLE: bool = true;

/// Getter for a strictly positive integer value.
///
/// Missing, malformed or zero values fall back to the default with a warning.
macro_rules! positive_u64_getter {
    ($getter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> u64 {
            let value = self.get_value($path).ok();
            match value.as_ref().and_then(positive_number) {
                Some(v) if v.fract() == 0.0 => v as u64,
                _ => {
                    warn!(
                        path = %$path.join("."),
                        value = ?value,
                        "Invalid or missing value, using default {}",
                        $default
                    );
                    $default
                }
            }
        }
    };
}

/// Getter for an optional, non-blank string value.
///
/// Numbers are returned as text so Discord ids can be written unquoted.
macro_rules! optional_string_getter {
    ($getter:ident, $path:expr) => {
        pub fn $getter(&self) -> Option<String> {
            match self.get_value($path) {
                Ok(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Ok(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            }
        }
    };
}

/// Configuration manager for YTClip
///
/// # Examples
///
/// ```no_run
/// use ytcconfig::get_config;
///
/// let config = get_config();
/// println!("Status timeout: {}s", config.get_status_timeout());
/// ```
#[derive(Debug)]
pub struct Config {
    config_dir: String,
    path: String,
    data: Mutex<Value>,
}

impl Config {
    /// Config directory: argument, `$YTCLIP_CONFIG`, then the first existing
    /// of `./.ytclip` and `~/.ytclip`; `./.ytclip` when none exists.
    fn find_config_dir(directory: &str) -> String {
        if !directory.is_empty() {
            return directory.to_string();
        }
        if let Ok(dir) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %dir, "Config directory from environment");
            return dir;
        }

        let local = PathBuf::from(".ytclip");
        let home = home_dir().map(|h| h.join(".ytclip"));
        [Some(local.clone()), home]
            .into_iter()
            .flatten()
            .find(|candidate| candidate.is_dir())
            .unwrap_or(local)
            .to_string_lossy()
            .into_owned()
    }

    /// Creates the directory if needed and refuses read-only locations,
    /// since the merged configuration is written back on load.
    fn prepare_config_dir(path: &Path) -> Result<()> {
        fs::create_dir_all(path)
            .with_context(|| format!("Cannot create config directory {}", path.display()))?;
        if fs::metadata(path)?.permissions().readonly() {
            bail!("Config directory is read-only: {}", path.display());
        }
        Ok(())
    }

    /// Loads the configuration from the specified directory
    ///
    /// This method:
    /// 1. Determines the configuration directory
    /// 2. Loads the default embedded configuration
    /// 3. Merges it with the external config.yaml file if present
    /// 4. Applies `YTCLIP_CONFIG__SECTION__KEY` environment overrides
    /// 5. Saves the merged configuration
    ///
    /// # Arguments
    ///
    /// * `directory` - The directory containing the config.yaml file, or empty to use defaults
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::find_config_dir(directory);
        Self::prepare_config_dir(Path::new(&config_dir))?;
        info!(config_dir = %config_dir, "Using config directory");

        let path = Path::new(&config_dir)
            .join("config.yaml")
            .to_string_lossy()
            .into_owned();

        let mut merged = lowercase_keys(serde_yaml::from_str(DEFAULT_CONFIG)?);
        match fs::read_to_string(&path) {
            Ok(text) => {
                let external: Value = serde_yaml::from_str(&text)
                    .with_context(|| format!("Invalid YAML in {}", path))?;
                // Fichier vide : on garde les valeurs par défaut
                if !external.is_null() {
                    merge_yaml(&mut merged, &lowercase_keys(external));
                }
                info!(config_file = %path, "Loaded config file");
            }
            Err(_) => info!(config_file = %path, "No config file, using embedded defaults"),
        }
        Self::apply_env_overrides(&mut merged);

        let config = Config {
            config_dir,
            path,
            data: Mutex::new(merged),
        };

        config.save()?;
        Ok(config)
    }

    /// Directory holding `config.yaml`
    pub fn directory(&self) -> &str {
        &self.config_dir
    }

    /// Saves the current configuration to the config.yaml file
    pub fn save(&self) -> Result<()> {
        let yaml = {
            let data = self.lock_data()?;
            serde_yaml::to_string(&*data)?
        };
        fs::write(&self.path, yaml)?;
        Ok(())
    }

    fn lock_data(&self) -> Result<std::sync::MutexGuard<'_, Value>> {
        self.data
            .lock()
            .map_err(|_| anyhow!("Configuration lock poisoned"))
    }

    /// Sets a configuration value at the specified path and saves it
    ///
    /// * `path` - Array of keys representing the path (e.g., `&["player", "volume"]`)
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        {
            let mut data = self.lock_data()?;
            Self::set_value_internal(&mut data, path, value)?;
        }
        self.save()
    }

    fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
        let Some((last, parents)) = path.split_last() else {
            *data = value;
            return Ok(());
        };
        let mut node = data;
        for key in parents {
            let map = node
                .as_mapping_mut()
                .ok_or_else(|| anyhow!("Cannot set {}: {} is not a mapping", path.join("."), key))?;
            node = map
                .entry(Value::String(key.to_lowercase()))
                .or_insert(Value::Mapping(Mapping::new()));
        }
        node.as_mapping_mut()
            .ok_or_else(|| anyhow!("Cannot set {}: parent is not a mapping", path.join(".")))?
            .insert(Value::String(last.to_lowercase()), value);
        Ok(())
    }

    /// Gets a configuration value at the specified path
    ///
    /// Returns an error if the path doesn't exist.
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.lock_data()?;
        Self::get_value_internal(&data, path)
    }

    fn get_value_internal(data: &Value, path: &[&str]) -> Result<Value> {
        let mut node = data;
        for (depth, key) in path.iter().enumerate() {
            node = node
                .as_mapping()
                .and_then(|map| map.get(&Value::String(key.to_lowercase())))
                .ok_or_else(|| anyhow!("Path {} does not exist", path[..=depth].join(".")))?;
        }
        Ok(node.clone())
    }

    /// `YTCLIP_CONFIG__PLAYER__VOLUME=0.8` sets `player.volume`; values are
    /// parsed as YAML scalars.
    fn apply_env_overrides(config: &mut Value) {
        for (key, raw) in env::vars() {
            let Some(stripped) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let path: Vec<&str> = stripped.split("__").collect();
            let value = serde_yaml::from_str(&raw).unwrap_or(Value::String(raw));
            if let Err(e) = Self::set_value_internal(config, &path, value) {
                warn!(variable = %key, "Ignoring environment override: {}", e);
            }
        }
    }

    /// Absolute path of a managed directory, created if missing
    fn resolve_and_create_dir(&self, dir_path: &str) -> Result<String> {
        let absolute = Path::new(&self.config_dir).join(dir_path);
        if !absolute.is_dir() {
            fs::create_dir_all(&absolute)
                .with_context(|| format!("Cannot create {}", absolute.display()))?;
            info!(directory = %absolute.display(), "Created managed directory");
        }
        Ok(absolute.to_string_lossy().into_owned())
    }

    /// Récupère un répertoire géré par la configuration
    ///
    /// Le répertoire peut être absolu ou relatif au répertoire de
    /// configuration. Il sera créé s'il n'existe pas.
    ///
    /// ```no_run
    /// use ytcconfig::get_config;
    ///
    /// let config = get_config();
    /// let media = config.get_managed_dir(&["catalog", "media_dir"], "media")?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn get_managed_dir(&self, path: &[&str], default: &str) -> Result<String> {
        let dir_path = match self.get_value(path) {
            Ok(Value::String(s)) if !s.trim().is_empty() => s,
            _ => {
                self.set_value(path, Value::String(default.to_string()))?;
                default.to_string()
            }
        };
        self.resolve_and_create_dir(&dir_path)
    }

    positive_u64_getter!(
        get_clip_duration,
        &["player", "clip_duration"],
        DEFAULT_CLIP_DURATION
    );

    positive_u64_getter!(
        get_redemption_duration,
        &["twitch", "clip_duration"],
        DEFAULT_REDEMPTION_DURATION
    );

    positive_u64_getter!(
        get_status_timeout,
        &["presence", "status_timeout"],
        DEFAULT_STATUS_TIMEOUT
    );

    positive_u64_getter!(
        get_refresh_interval,
        &["catalog", "refresh_interval_secs"],
        DEFAULT_REFRESH_INTERVAL
    );

    optional_string_getter!(get_temp_dir, &["player", "temp_dir"]);
    optional_string_getter!(get_redemption_match, &["twitch", "redemption_match"]);
    optional_string_getter!(get_primary_guild_id, &["twitch", "primary_guild_id"]);
    optional_string_getter!(get_streamer_discord_id, &["twitch", "streamer_discord_id"]);

    /// Whether logs go to the console (`host.logger.enable_console`)
    pub fn get_log_enable_console(&self) -> bool {
        match self.get_value(&["host", "logger", "enable_console"]) {
            Ok(Value::Bool(b)) => b,
            _ => DEFAULT_LOG_ENABLE_CONSOLE,
        }
    }

    /// Gets the playback volume
    ///
    /// Returns the configured volume, or 0.5 if absent, malformed or not
    /// strictly positive.
    pub fn get_volume(&self) -> f64 {
        match self.get_value(&["player", "volume"]) {
            Ok(value) => positive_number(&value).unwrap_or_else(|| {
                warn!(value = ?value, "Invalid volume, using default {}", DEFAULT_VOLUME);
                DEFAULT_VOLUME
            }),
            Err(err) => {
                warn!("Failed to get volume: {}, using default {}", err, DEFAULT_VOLUME);
                DEFAULT_VOLUME
            }
        }
    }

    pub fn set_volume(&self, volume: f64) -> Result<()> {
        if !(volume.is_finite() && volume > 0.0) {
            return Err(anyhow!("Volume must be a positive number"));
        }
        self.set_value(&["player", "volume"], Value::Number(Number::from(volume)))
    }

    /// Chat command the status line advertises
    pub fn get_command_prefix(&self) -> String {
        match self.get_value(&["chat", "command_prefix"]) {
            Ok(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => DEFAULT_COMMAND_PREFIX.to_string(),
        }
    }

    /// Récupère le niveau de log minimum depuis la configuration
    pub fn get_log_min_level(&self) -> String {
        match self.get_value(&["host", "logger", "min_level"]) {
            Ok(Value::String(s)) => s,
            _ => DEFAULT_LOG_MIN_LEVEL.to_string(),
        }
    }

    /// Définit le niveau de log minimum dans la configuration
    pub fn set_log_min_level(&self, level: String) -> Result<()> {
        self.set_value(&["host", "logger", "min_level"], Value::String(level))
    }
}

/// Extracts a finite, strictly positive number from a YAML scalar.
///
/// Strings are parsed so env overrides such as `YTCLIP_CONFIG__PLAYER__VOLUME="0.8"`
/// behave like numbers.
fn positive_number(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (v.is_finite() && v > 0.0).then_some(v)
}

/// Returns the global configuration instance
///
/// The configuration is lazily loaded on first access.
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

/// Merges external YAML configuration into default configuration
///
/// - For mappings, keys from `external` are merged recursively into `default`
/// - For scalars and sequences, external values replace default values
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(), // pour les scalaires ou séquences, on remplace
    }
}

/// Keys are matched case-insensitively by storing them lowercased
fn lowercase_keys(value: Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(key, inner)| {
                    let key = match key {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    (key, lowercase_keys(inner))
                })
                .collect(),
        ),
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(lowercase_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_with(yaml: &str) -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.yaml"), yaml).unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        (dir, config)
    }

    #[test]
    fn test_defaults_from_embedded_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();

        assert_eq!(config.get_clip_duration(), DEFAULT_CLIP_DURATION);
        assert_eq!(config.get_status_timeout(), DEFAULT_STATUS_TIMEOUT);
        assert_eq!(config.get_volume(), DEFAULT_VOLUME);
        assert_eq!(config.get_command_prefix(), "!play");
        assert!(config.get_redemption_match().is_none());
        assert!(dir.path().join("config.yaml").exists());
    }

    #[test]
    fn test_file_values_override_defaults() {
        let (_dir, config) = load_with(
            "player:\n  clip_duration: 15\n  volume: 0.8\npresence:\n  status_timeout: 30\n",
        );

        assert_eq!(config.get_clip_duration(), 15);
        assert_eq!(config.get_volume(), 0.8);
        assert_eq!(config.get_status_timeout(), 30);
        // Les clés absentes du fichier gardent la valeur par défaut
        assert_eq!(config.get_redemption_duration(), DEFAULT_REDEMPTION_DURATION);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let (_dir, config) = load_with(
            "player:\n  clip_duration: -4\n  volume: loud\npresence:\n  status_timeout: 0\n",
        );

        assert_eq!(config.get_clip_duration(), DEFAULT_CLIP_DURATION);
        assert_eq!(config.get_volume(), DEFAULT_VOLUME);
        assert_eq!(config.get_status_timeout(), DEFAULT_STATUS_TIMEOUT);
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let (_dir, config) = load_with("player:\n  clip_duration: \"12\"\n  volume: \"0.25\"\n");

        assert_eq!(config.get_clip_duration(), 12);
        assert_eq!(config.get_volume(), 0.25);
    }

    #[test]
    fn test_setters_persist_and_validate() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();

        config
            .set_value(&["Player", "Clip_Duration"], Value::Number(Number::from(20)))
            .unwrap();
        assert!(config.set_volume(-1.0).is_err());

        let reloaded = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(reloaded.get_clip_duration(), 20);
    }

    #[test]
    fn test_managed_dir_is_relative_to_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();

        let media = config
            .get_managed_dir(&["catalog", "media_dir"], "media")
            .unwrap();
        assert_eq!(Path::new(&media), dir.path().join("media"));
        assert!(Path::new(&media).is_dir());
    }

    #[test]
    fn test_empty_config_file_keeps_defaults() {
        let (_dir, config) = load_with("");

        assert_eq!(config.get_clip_duration(), DEFAULT_CLIP_DURATION);
        assert_eq!(config.get_command_prefix(), "!play");
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let (_dir, config) = load_with("Player:\n  Clip_Duration: 7\n");

        assert_eq!(config.get_clip_duration(), 7);
        assert!(config.get_value(&["PLAYER", "volume"]).is_ok());
        assert!(config.get_value(&["player", "missing"]).is_err());
    }

    #[test]
    fn test_merge_yaml_replaces_scalars_only() {
        let mut default: Value = serde_yaml::from_str("a:\n  b: 1\n  c: 2\n").unwrap();
        let external: Value = serde_yaml::from_str("a:\n  c: 3\n").unwrap();
        merge_yaml(&mut default, &external);

        let expected: Value = serde_yaml::from_str("a:\n  b: 1\n  c: 3\n").unwrap();
        assert_eq!(default, expected);
    }
}
