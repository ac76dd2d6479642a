//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// How long a write waits for another terminal's transaction.
    pub busy_timeout_ms: u64,

    /// Worker used when a command gets no `--worker`.
    ///
    /// Set per terminal on the floor, e.g. `SHOP_DEFAULT_WORKER=ana`.
    #[serde(default)]
    pub default_worker: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("busy_timeout_ms", &self.busy_timeout_ms)
            .field("default_worker", &self.default_worker)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("shop.db"),
            busy_timeout_ms: 5_000,
            default_worker: None,
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

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // SHOP_DATABASE_PATH, SHOP_BUSY_TIMEOUT_MS, SHOP_DEFAULT_WORKER
        figment = figment.merge(Env::prefixed("SHOP_"));

        figment.extract()
    }

    pub const fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

/// Returns the platform-specific config directory for shop.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("shop"))
}

/// Returns the platform-specific data directory for shop.
///
/// On Linux: `~/.local/share/shop`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("shop"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_data_dir_for_db() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.database_path, data_dir.join("shop.db"));
        assert_eq!(config.busy_timeout(), Duration::from_secs(5));
        assert!(config.default_worker.is_none());
    }

    #[test]
    fn config_file_overrides_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("shop.toml");
        std::fs::write(
            &path,
            "database_path = \"/var/lib/shop/floor.db\"\ndefault_worker = \"ana\"\n",
        )
        .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/var/lib/shop/floor.db"));
        assert_eq!(config.default_worker.as_deref(), Some("ana"));
        assert_eq!(config.busy_timeout_ms, 5_000);
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config::load_from(Some(&temp.path().join("absent.toml"))).unwrap();
        assert_eq!(config.busy_timeout_ms, 5_000);
    }
}
