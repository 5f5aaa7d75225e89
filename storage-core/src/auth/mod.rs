//! src/auth/mod.rs
//! ============================================================================
//! # Credential providers
//!
//! A credential provider is consulted at startup and hands back a
//! [`ConnectionContext`]: the request-signing material a backend needs. The
//! context is passed explicitly into backend construction; there is no
//! process-wide client. Backends that hold on to the provider may ask it to
//! re-sign once the server rejects an expired access token.

use async_trait::async_trait;
use tracing::info;

use crate::error::AppError;

pub mod oauth;
pub mod token;

pub use oauth::OAuthProvider;

/// Environment variable consulted by [`StaticTokenProvider::from_env`].
pub const ACCESS_TOKEN_ENV: &str = "STORAGE_ACCESS_TOKEN";

/// Authenticated request-signing context for one session.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionContext {
    access_token: String,
    token_type: String,
}

impl ConnectionContext {
    pub fn new(access_token: impl Into<String>, token_type: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: token_type.into(),
        }
    }

    /// Bearer-token context, the only kind Google issues.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self::new(access_token, "Bearer")
    }

    /// Value for the `Authorization` header.
    #[must_use]
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

// Never print the token.
impl std::fmt::Debug for ConnectionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionContext")
            .field("token_type", &self.token_type)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Produce an authenticated context or fail with [`AppError::Auth`].
    async fn authenticated_context(&self) -> Result<ConnectionContext, AppError>;

    /// Mint a fresh context without user interaction after the server
    /// rejected the current one. `None` when this provider cannot refresh.
    async fn refreshed_context(&self) -> Result<Option<ConnectionContext>, AppError> {
        Ok(None)
    }
}

/// Uses a pre-issued access token, e.g. from `gcloud auth print-access-token`.
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// `Some` when [`ACCESS_TOKEN_ENV`] is set and non-empty.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        std::env::var(ACCESS_TOKEN_ENV)
            .ok()
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
            .map(Self::new)
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenProvider {
    async fn authenticated_context(&self) -> Result<ConnectionContext, AppError> {
        info!("Using access token from {ACCESS_TOKEN_ENV}");
        Ok(ConnectionContext::bearer(self.token.clone()))
    }
}
