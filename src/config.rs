//! Persistent application configuration model and defaults.

use std::path::PathBuf;

use log::warn;

pub const DEFAULT_CATALOG_POLL_SECS: u64 = 30;

/// Root configuration persisted to `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Config {
    /// Remote library server connection.
    #[serde(default)]
    pub server: ServerConfig,
    /// Catalog refresh behavior.
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CatalogConfig {
    /// Seconds between remote catalog polls.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_CATALOG_POLL_SECS
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

fn config_path() -> PathBuf {
    dirs::config_dir()
        .expect("Could not find config directory")
        .join("playdeck")
        .join("config.toml")
}

impl Config {
    /// Loads the configuration, falling back to defaults when the file
    /// is missing or malformed.
    pub fn load() -> Config {
        let path = config_path();
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(_) => return Config::default(),
        };
        match toml::from_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                warn!("Failed to parse {}: {}", path.display(), err);
                Config::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), String> {
        let path = config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| format!("Failed to create config directory: {err}"))?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|err| format!("Failed to serialize config: {err}"))?;
        std::fs::write(&path, contents).map_err(|err| format!("Failed to write config: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.catalog.poll_interval_secs, 30);
    }

    #[test]
    fn test_partial_toml_fills_missing_sections_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            base_url = "http://music.local:9000"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.base_url, "http://music.local:9000");
        assert_eq!(config.catalog.poll_interval_secs, 30);
    }

    #[test]
    fn test_empty_toml_is_all_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }
}
