//! Configuration for the engine and dev tooling
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (~/.config/agora/config.toml)
//! 3. Built-in defaults (lowest priority)

use crate::favorites::FavoritesStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the dev server binds to
    pub bind_addr: SocketAddr,

    /// Root directory of the static site
    pub site_dir: PathBuf,

    /// URL of the page the engine drives (favorites/share target)
    pub page_url: String,

    /// Retry ceiling for the fault handler
    pub max_retries: u32,

    /// Base delay between retry attempts, in milliseconds; the actual
    /// sleep grows linearly with the attempt number
    pub retry_base_delay_ms: u64,

    /// Where the favorites list is persisted
    pub favorites_path: PathBuf,

    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default filter level when RUST_LOG is unset
    pub level: String,
    /// Also write JSON logs to rotating files
    pub file_enabled: bool,
    pub file_dir: PathBuf,
    pub file_prefix: String,
    pub file_rotation: LogRotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Hourly,
    Daily,
    Never,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".parse().expect("valid default addr"),
            site_dir: PathBuf::from("site"),
            page_url: "/topic-detail.html".to_string(),
            max_retries: 3,
            retry_base_delay_ms: 1000,
            favorites_path: FavoritesStore::default_path(),
            logging: LoggingConfig {
                level: "info".to_string(),
                file_enabled: false,
                file_dir: PathBuf::from("logs"),
                file_prefix: "agora".to_string(),
                file_rotation: LogRotation::Daily,
            },
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File format
// ─────────────────────────────────────────────────────────────────────────────

/// On-disk config shape; every field optional so partial files merge
/// over the defaults
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FileConfig {
    pub bind_addr: Option<SocketAddr>,
    pub site_dir: Option<PathBuf>,
    pub page_url: Option<String>,
    pub max_retries: Option<u32>,
    pub retry_base_delay_ms: Option<u64>,
    pub favorites_path: Option<PathBuf>,
    pub logging: Option<FileLogging>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FileLogging {
    pub level: Option<String>,
    pub file_enabled: Option<bool>,
    pub file_dir: Option<PathBuf>,
    pub file_prefix: Option<String>,
    pub file_rotation: Option<LogRotation>,
}

impl Config {
    /// Platform config file location
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("agora")
            .join("config.toml")
    }

    /// Load configuration from the config file and environment
    pub fn from_env() -> Self {
        let file = std::fs::read_to_string(Self::config_path())
            .ok()
            .and_then(|raw| match toml::from_str::<FileConfig>(&raw) {
                Ok(parsed) => Some(parsed),
                Err(error) => {
                    eprintln!("Warning: ignoring malformed config file: {error}");
                    None
                }
            });

        let env: HashMap<String, String> = std::env::vars().collect();
        Self::from_sources(file, &env)
    }

    /// Pure merge of defaults, file values and environment overrides
    pub fn from_sources(file: Option<FileConfig>, env: &HashMap<String, String>) -> Self {
        let mut config = Config::default();

        if let Some(file) = file {
            if let Some(addr) = file.bind_addr {
                config.bind_addr = addr;
            }
            if let Some(dir) = file.site_dir {
                config.site_dir = dir;
            }
            if let Some(url) = file.page_url {
                config.page_url = url;
            }
            if let Some(retries) = file.max_retries {
                config.max_retries = retries;
            }
            if let Some(delay) = file.retry_base_delay_ms {
                config.retry_base_delay_ms = delay;
            }
            if let Some(path) = file.favorites_path {
                config.favorites_path = path;
            }
            if let Some(logging) = file.logging {
                if let Some(level) = logging.level {
                    config.logging.level = level;
                }
                if let Some(enabled) = logging.file_enabled {
                    config.logging.file_enabled = enabled;
                }
                if let Some(dir) = logging.file_dir {
                    config.logging.file_dir = dir;
                }
                if let Some(prefix) = logging.file_prefix {
                    config.logging.file_prefix = prefix;
                }
                if let Some(rotation) = logging.file_rotation {
                    config.logging.file_rotation = rotation;
                }
            }
        }

        if let Some(addr) = env.get("AGORA_BIND").and_then(|v| v.parse().ok()) {
            config.bind_addr = addr;
        }
        if let Some(port) = env.get("AGORA_PORT").and_then(|v| v.parse::<u16>().ok()) {
            config.bind_addr.set_port(port);
        }
        if let Some(dir) = env.get("AGORA_SITE_DIR") {
            config.site_dir = PathBuf::from(dir);
        }
        if let Some(level) = env.get("AGORA_LOG_LEVEL") {
            config.logging.level = level.clone();
        }
        if let Some(retries) = env.get("AGORA_MAX_RETRIES").and_then(|v| v.parse().ok()) {
            config.max_retries = retries;
        }

        config
    }

    /// Serialize the effective configuration as TOML
    pub fn to_toml(&self) -> String {
        let file = FileConfig {
            bind_addr: Some(self.bind_addr),
            site_dir: Some(self.site_dir.clone()),
            page_url: Some(self.page_url.clone()),
            max_retries: Some(self.max_retries),
            retry_base_delay_ms: Some(self.retry_base_delay_ms),
            favorites_path: Some(self.favorites_path.clone()),
            logging: Some(FileLogging {
                level: Some(self.logging.level.clone()),
                file_enabled: Some(self.logging.file_enabled),
                file_dir: Some(self.logging.file_dir.clone()),
                file_prefix: Some(self.logging.file_prefix.clone()),
                file_rotation: Some(self.logging.file_rotation),
            }),
        };
        toml::to_string_pretty(&file).expect("config serializes")
    }

    /// Write a default config template on first run so users can
    /// discover the available options
    pub fn ensure_config_exists() {
        let path = Self::config_path();
        if path.exists() {
            return;
        }
        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return;
            }
        }
        let _ = std::fs::write(path, Config::default().to_toml());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_sources(None, &HashMap::new());
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file: FileConfig = toml::from_str(
            r#"
            site_dir = "public"
            max_retries = 5

            [logging]
            level = "debug"
            file_rotation = "hourly"
            "#,
        )
        .unwrap();

        let config = Config::from_sources(Some(file), &HashMap::new());
        assert_eq!(config.site_dir, PathBuf::from("public"));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file_rotation, LogRotation::Hourly);
        // Untouched fields keep their defaults
        assert_eq!(config.bind_addr.port(), 3000);
    }

    #[test]
    fn test_env_overrides_file() {
        let file: FileConfig = toml::from_str(r#"max_retries = 5"#).unwrap();
        let env: HashMap<String, String> = [
            ("AGORA_MAX_RETRIES".to_string(), "7".to_string()),
            ("AGORA_PORT".to_string(), "4100".to_string()),
            ("AGORA_LOG_LEVEL".to_string(), "trace".to_string()),
        ]
        .into();

        let config = Config::from_sources(Some(file), &env);
        assert_eq!(config.max_retries, 7);
        assert_eq!(config.bind_addr.port(), 4100);
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn test_effective_config_roundtrips() {
        let config = Config::default();
        let rendered = config.to_toml();
        let parsed: FileConfig = toml::from_str(&rendered).expect("default config round-trips");
        assert_eq!(parsed.max_retries, Some(3));
        assert_eq!(parsed.logging.unwrap().level.as_deref(), Some("info"));
    }
}
