//! src/auth/token.rs
//! ============================================================================
//! # OAuth2 client secrets and cached tokens
//!
//! Both live as JSON files in the config directory. The client secrets file is
//! the one Google Cloud Console downloads for a "Desktop app" OAuth client; the
//! token file is written by us after a successful consent or refresh.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs as TokioFs;
use tracing::{debug, info};

use crate::error::AppError;

/// Refresh this long before the server-side expiry.
const EXPIRY_SKEW_SECS: i64 = 60;

/// OAuth client registration, as found under `installed` or `web`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,

    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,

    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    "https://accounts.google.com/o/oauth2/auth".to_owned()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_owned()
}

#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Parse a Google client secrets document.
    pub fn from_json(text: &str) -> Result<Self, AppError> {
        let file: ClientSecretsFile = serde_json::from_str(text)
            .map_err(|e| AppError::Auth(format!("unable to parse credentials: {e}")))?;

        file.installed.or(file.web).ok_or_else(|| {
            AppError::Auth("credentials file has neither an `installed` nor a `web` client".into())
        })
    }

    /// Read and parse the secrets file, explaining how to create it when absent.
    pub async fn load(path: &Path) -> Result<Self, AppError> {
        let text = TokioFs::read_to_string(path).await.map_err(|e| {
            AppError::Auth(format!(
                "unable to read credentials file at {}: {e}\n\n\
                 To set up credentials:\n\
                 1. Go to https://console.cloud.google.com/apis/credentials\n\
                 2. Create an OAuth 2.0 Client ID (Desktop app)\n\
                 3. Download the JSON and save it to {}",
                path.display(),
                path.display()
            ))
        })?;

        Self::from_json(&text)
    }
}

/// Response body of the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,

    #[serde(default)]
    pub refresh_token: Option<String>,

    #[serde(default)]
    pub expires_in: Option<i64>,

    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "Bearer".to_owned()
}

/// Token persisted between sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,

    #[serde(default)]
    pub refresh_token: Option<String>,

    #[serde(default = "default_token_type")]
    pub token_type: String,

    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

impl StoredToken {
    /// Convert a token endpoint response, keeping `previous_refresh` when the
    /// server did not rotate the refresh token.
    #[must_use]
    pub fn from_response(
        response: TokenResponse,
        previous_refresh: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(previous_refresh),
            token_type: response.token_type,
            expiry: response
                .expires_in
                .map(|secs| now + ChronoDuration::seconds(secs)),
        }
    }

    /// Tokens without an expiry are assumed valid.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry
            .is_some_and(|expiry| expiry - ChronoDuration::seconds(EXPIRY_SKEW_SECS) <= now)
    }

    pub async fn load(path: &Path) -> Result<Option<Self>, AppError> {
        match TokioFs::read_to_string(path).await {
            Ok(text) => {
                debug!("Loaded cached token from {}", path.display());
                Ok(Some(serde_json::from_str(&text)?))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::ConfigIo {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    /// Write the token, readable by the owner only on unix.
    pub async fn save(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            TokioFs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(self)?;
        TokioFs::write(path, json)
            .await
            .map_err(|e| AppError::Other(format!("unable to save token: {e}")))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            TokioFs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
        }

        info!("Saved token to {}", path.display());
        Ok(())
    }
}

/// Default location of a file inside the storage config directory.
pub fn default_path(file_name: &str) -> Result<PathBuf, AppError> {
    Ok(crate::config::Config::config_dir()?.join(file_name))
}
