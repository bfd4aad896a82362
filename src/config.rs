//! Configuration and settings management
//!
//! Loads process configuration from layered config files and environment
//! variables. The operational toggles (notifications, always-online and so
//! on) are *not* here — they live in the persisted settings document and are
//! managed by [`crate::toggles::ToggleManager`].

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Process configuration loaded from environment variables and config files
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// Telegram username of the single authorized operator (without `@`)
    pub owner_username: String,

    /// Root directory for persisted data files
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Upper bound for the remote fetch during a catalog import, in seconds
    #[serde(default = "default_import_timeout_secs")]
    pub import_timeout_secs: u64,

    /// Cooldown between onboarding replies to the same unauthenticated chat,
    /// in seconds
    #[serde(default = "default_onboarding_cooldown_secs")]
    pub onboarding_cooldown_secs: u64,
}

const fn default_import_timeout_secs() -> u64 {
    30
}

const fn default_onboarding_cooldown_secs() -> u64 {
    300
}

fn default_data_dir() -> String {
    "data".to_string()
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading or deserialization fails.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(File::with_name("config/default").required(false))
            // Add in the current environment file
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Local overrides, not checked into git
            .add_source(File::with_name("config/local").required(false))
            // Environment variables win over files.
            // ignore_empty treats empty env vars as unset.
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        s.try_deserialize()
    }

    /// Path of the persisted auto-issue catalog document
    #[must_use]
    pub fn catalog_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
            .join("configs")
            .join("delivery.json")
    }

    /// Path of the persisted settings document
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
            .join("configs")
            .join("settings.json")
    }

    /// Path of the small persisted constants document
    #[must_use]
    pub fn consts_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("consts.json")
    }
}

/// Filename the operator must upload when replacing the catalog
pub const CATALOG_FILE_NAME: &str = "delivery.json";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_paths_live_under_data_dir() {
        let settings = Settings {
            telegram_token: "dummy".to_string(),
            owner_username: "owner".to_string(),
            data_dir: "var/bot".to_string(),
            import_timeout_secs: 30,
            onboarding_cooldown_secs: 300,
        };

        assert_eq!(
            settings.catalog_path(),
            PathBuf::from("var/bot/configs/delivery.json")
        );
        assert_eq!(
            settings.settings_path(),
            PathBuf::from("var/bot/configs/settings.json")
        );
        assert_eq!(settings.consts_path(), PathBuf::from("var/bot/consts.json"));
    }
}
