//! src/config.rs
//! ============================================================================
//! # Config: Application Configuration Loader
//!
//! User-editable settings, stored as TOML in the platform config directory
//! resolved by [`directories`](https://docs.rs/directories). A missing file is
//! created with defaults on first start; missing fields fall back to defaults.
//!
//! ## Example
//! ```rust,ignore
//! let config = Config::load().await?;
//! let page_size = config.drive.page_size;
//! ```

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use tokio::fs as TokioFs;

use crate::{backend::pagination::MAX_PAGE_SIZE, error::AppError};

const APPLICATION: &str = "storage";

/// Google Drive connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Base URL of the Drive v3 REST API.
    pub api_base: String,

    /// Entries requested per `files.list` call (clamped to 1..=100).
    pub page_size: u32,

    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Breadcrumb label for the root folder.
    pub root_name: String,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            api_base: "https://www.googleapis.com/drive/v3".to_string(),
            page_size: MAX_PAGE_SIZE,
            request_timeout: Duration::from_secs(30),
            root_name: "My Drive".to_string(),
        }
    }
}

/// Local filesystem backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LocalConfig {
    /// Directory served as root; the working directory when unset.
    pub root: Option<PathBuf>,

    pub show_hidden: bool,
}

/// OAuth credential locations and consent flow settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Client secrets JSON; `<config dir>/credentials.json` when unset.
    pub credentials_file: Option<PathBuf>,

    /// Token cache; `<config dir>/token.json` when unset.
    pub token_file: Option<PathBuf>,

    /// Loopback port for the OAuth redirect.
    pub redirect_port: u16,

    #[serde(with = "humantime_serde")]
    pub consent_timeout: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            credentials_file: None,
            token_file: None,
            redirect_port: 9874,
            consent_timeout: Duration::from_secs(300),
        }
    }
}

/// Retry policy applied by the listing service to transient failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first; 1 disables retries.
    pub max_attempts: u32,

    #[serde(with = "humantime_serde")]
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// File logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` wins when set.
    pub level: String,

    /// Log directory; platform data dir + `logs` when unset.
    pub directory: Option<PathBuf>,

    pub file_prefix: String,

    /// Rotated files kept on disk.
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "storage".to_string(),
            max_files: 7,
        }
    }
}

/// Main configuration struct for the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub drive: DriveConfig,

    pub local: LocalConfig,

    pub auth: AuthConfig,

    pub retry: RetryConfig,

    pub logging: LoggingConfig,
}

impl Config {
    /// Loads config from the platform config dir, creating it when missing.
    pub async fn load() -> Result<Self, AppError> {
        let path = Self::config_path()?;
        Self::load_from(&path).await
    }

    /// Loads config from `path`, writing defaults there if it does not exist.
    pub async fn load_from(path: &Path) -> Result<Self, AppError> {
        match TokioFs::read_to_string(path).await {
            Ok(text) => {
                info!("Loading config from {}", path.display());
                let cfg: Self = toml::from_str(&text)?;

                Ok(cfg)
            }

            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "No config file found at {}, using default configuration. Creating it now.",
                    path.display()
                );

                let default_config = Self::default();
                default_config.save_to(path).await?;

                Ok(default_config)
            }

            Err(e) => Err(AppError::ConfigIo {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    pub async fn save_to(&self, path: &Path) -> Result<(), AppError> {
        info!("Saving config to {}", path.display());

        if let Some(parent) = path.parent() {
            TokioFs::create_dir_all(parent).await?;
        }

        let toml_str = toml::to_string_pretty(self)
            .map_err(|e| AppError::Other(format!("cannot serialize config: {e}")))?;
        TokioFs::write(path, toml_str)
            .await
            .map_err(|e| AppError::ConfigIo {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs, AppError> {
        ProjectDirs::from("", "", APPLICATION)
            .ok_or_else(|| AppError::Other("Could not determine config directory.".into()))
    }

    /// Returns the canonical config file path.
    pub fn config_path() -> Result<PathBuf, AppError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the config directory, which also holds credentials and tokens.
    pub fn config_dir() -> Result<PathBuf, AppError> {
        Ok(Self::project_dirs()?.config_dir().to_path_buf())
    }

    /// Returns the default log directory.
    pub fn log_dir() -> Result<PathBuf, AppError> {
        Ok(Self::project_dirs()?.data_local_dir().join("logs"))
    }
}
