//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use aw_core::{ChannelId, UserId};

const DEFAULT_WATCHED_USER_ID: u64 = 861_974_078_431_821_885;
const DEFAULT_CHANNEL_ID: u64 = 866_699_773_700_341_760;

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// User whose presence is tracked.
    pub watched_user_id: UserId,
    /// Channel that receives start/stop notifications.
    pub channel_id: ChannelId,
    /// Bot token. Notifications are printed to stdout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("watched_user_id", &self.watched_user_id)
            .field("channel_id", &self.channel_id)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("aw.db"),
            watched_user_id: UserId::from(DEFAULT_WATCHED_USER_ID),
            channel_id: ChannelId::from(DEFAULT_CHANNEL_ID),
            token: None,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (AW_*)
        figment = figment.merge(Env::prefixed("AW_"));

        figment.extract()
    }

    /// The configured bot token, ignoring blank values.
    pub fn token(&self) -> Option<&str> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// Returns the platform-specific config directory for aw.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("aw"))
}

/// Returns the platform-specific data directory for aw.
///
/// On Linux: `~/.local/share/aw`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("aw"))
}
