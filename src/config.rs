//! Layered configuration for embedding applications.
//!
//! Settings resolve in three layers:
//! - Default values
//! - `pathwatch.toml` in the current directory (or an explicit path)
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables use the `PATHWATCH_` prefix with double
//! underscores separating nested levels:
//! - `PATHWATCH_WATCH__FILTER="*.rs"` sets `watch.filter`
//! - `PATHWATCH_WATCH__QUEUE_EVENTS=true` sets `watch.queue_events`
//! - `PATHWATCH_LOGGING__DEFAULT=debug` sets `logging.default`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Name of the configuration file looked up in the current directory.
pub const CONFIG_FILE: &str = "pathwatch.toml";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Settings {
    /// Watch behavior applied by `Monitor::from_settings`.
    #[serde(default)]
    pub watch: WatchConfig,

    /// Logging configuration consumed by `logging::init_with_config`.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Watch scope and delivery options.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WatchConfig {
    /// Glob pattern restricting which file names produce events.
    #[serde(default = "default_filter")]
    pub filter: String,

    /// Whether subdirectories are included in the watch scope.
    #[serde(default = "default_true")]
    pub recursive: bool,

    /// Whether events are buffered into the pull queue.
    #[serde(default = "default_false")]
    pub queue_events: bool,
}

/// Logging levels: a default plus per-module overrides.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level for all modules (error, warn, info, debug, trace).
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module level overrides, e.g. `monitor = "debug"`.
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_filter() -> String {
    "*".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            recursive: true,
            queue_events: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, Box<figment::Error>> {
        Self::load_from(PathBuf::from(CONFIG_FILE))
    }

    /// Load configuration from a specific file plus environment overrides.
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            // Double underscore separates nested levels; single underscores
            // stay part of the field name.
            .merge(Env::prefixed("PATHWATCH_").map(|key| {
                key.as_str()
                    .to_lowercase()
                    .replace("__", ".")
                    .into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Save the current configuration as pretty TOML.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_contract() {
        let settings = Settings::default();

        assert_eq!(settings.watch.filter, "*");
        assert!(settings.watch.recursive);
        assert!(!settings.watch.queue_events);
        assert_eq!(settings.logging.default, "warn");
        assert!(settings.logging.modules.is_empty());
    }

    #[test]
    fn toml_layer_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pathwatch.toml");
        std::fs::write(
            &path,
            "[watch]\nfilter = \"*.md\"\nqueue_events = true\n",
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();

        assert_eq!(settings.watch.filter, "*.md");
        assert!(settings.watch.queue_events);
        // Untouched keys keep their defaults.
        assert!(settings.watch.recursive);
    }

    #[test]
    fn env_layer_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pathwatch.toml");
        std::fs::write(&path, "[logging]\ndefault = \"info\"\n").unwrap();

        // Other tests in this module never read logging.default through
        // figment, so this process-global override cannot race them.
        unsafe {
            std::env::set_var("PATHWATCH_LOGGING__DEFAULT", "debug");
        }
        let settings = Settings::load_from(&path).unwrap();
        unsafe {
            std::env::remove_var("PATHWATCH_LOGGING__DEFAULT");
        }

        assert_eq!(settings.logging.default, "debug");
    }

    #[test]
    fn save_round_trips_through_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.toml");

        let mut settings = Settings::default();
        settings.watch.filter = "*.log".to_string();
        settings
            .logging
            .modules
            .insert("monitor".to_string(), "debug".to_string());
        settings.save(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded.watch.filter, "*.log");
        assert_eq!(
            loaded.logging.modules.get("monitor").map(String::as_str),
            Some("debug")
        );
    }
}
