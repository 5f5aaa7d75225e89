//! src/error.rs
//! ============================================================================
//! # `AppError`: Unified Error Type for the Storage Browser
//!
//! Every fallible operation in the crate returns `Result<T, AppError>`. Provider
//! failures are folded into four user-facing classes (see [`ErrorKind`]) so the
//! navigation layer can decide between "show in the folder view" and "the
//! session is dead" without knowing which backend produced the error.

use reqwest::StatusCode;
use std::{io, path::PathBuf};
use thiserror::Error;

/// User-facing classification of a listing failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Credentials invalid or expired. Terminal for the whole session.
    Auth,

    /// Folder id does not exist or is not accessible.
    NotFound,

    /// Network or server hiccup, safe to retry.
    Transient,

    /// Anything else. Presented like `Transient`, logged louder.
    Unknown,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s: &str = match self {
            Self::Auth => "auth",
            Self::NotFound => "not_found",
            Self::Transient => "transient",
            Self::Unknown => "unknown",
        };

        write!(f, "{s}")
    }
}

/// Unified error type for all storage browser operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// Credentials were rejected or could not be obtained.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Folder id unknown to the provider, or not visible to this account.
    #[error("Folder not found or inaccessible: {0}")]
    NotFound(String),

    /// Retry-safe failure (timeouts, connection resets, 5xx, rate limits).
    #[error("Temporary failure: {0}")]
    Transient(String),

    /// Remote API answered with something we could not interpret.
    #[error("Unexpected provider response: {0}")]
    Provider(String),

    /// Standard IO error, auto-converted from `io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TOML config parsing error.
    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// Config file I/O error with path.
    #[error("Failed to read config file {path:?}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Serialization or deserialization error (e.g., JSON).
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Any other error, with description.
    #[error("Unexpected error: {0}")]
    Other(String),
}

impl AppError {
    /// Classify this error for the navigation layer.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth(_) => ErrorKind::Auth,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Transient(_) => ErrorKind::Transient,
            Self::Io(e) | Self::ConfigIo { source: e, .. } => match e.kind() {
                io::ErrorKind::NotFound
                | io::ErrorKind::PermissionDenied
                | io::ErrorKind::NotADirectory
                | io::ErrorKind::InvalidFilename => ErrorKind::NotFound,
                _ => ErrorKind::Transient,
            },
            Self::Provider(_) | Self::Config(_) | Self::Serde(_) | Self::Other(_) => {
                ErrorKind::Unknown
            }
        }
    }

    /// Auth failures invalidate the whole session.
    #[must_use]
    pub fn is_session_fatal(&self) -> bool {
        self.kind() == ErrorKind::Auth
    }

    /// Whether a caller-side retry layer may try again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }

    #[must_use]
    /// Attach extra context to an error without losing its classification.
    pub fn with_context<S: Into<String>>(self, ctx: S) -> Self {
        let message = format!("{}: {}", ctx.into(), self);

        match self.kind() {
            ErrorKind::Auth => Self::Auth(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::Transient => Self::Transient(message),
            ErrorKind::Unknown => Self::Other(message),
        }
    }

    /// Map an HTTP failure onto the four listing classes.
    ///
    /// `body` is the raw response text. Drive overloads `403`: rate limits
    /// (`*RateLimitExceeded`) stay retryable, file-scoped denials mean the
    /// folder is inaccessible, and only credential or scope failures are auth.
    pub fn from_status<S: Into<String>>(status: StatusCode, body: S) -> Self {
        let body: String = body.into();
        let message = format!("HTTP {status}: {}", summarize_body(&body));

        match status.as_u16() {
            401 => Self::Auth(message),
            403 => match forbidden_reason(&body).as_deref() {
                Some(reason) if reason.to_ascii_lowercase().ends_with("ratelimitexceeded") => {
                    Self::Transient(message)
                }
                Some("insufficientFilePermissions" | "notFound" | "appNotAuthorizedToFile") => {
                    Self::NotFound(message)
                }
                Some(_) => Self::Auth(message),
                None if body.contains("RateLimitExceeded") || body.contains("rateLimitExceeded") => {
                    Self::Transient(message)
                }
                None if body.contains("insufficientFilePermissions") => Self::NotFound(message),
                None => Self::Auth(message),
            },
            404 => Self::NotFound(message),
            408 | 429 => Self::Transient(message),
            500..=599 => Self::Transient(message),
            _ => Self::Provider(message),
        }
    }
}

/// First `reason` of a Google `{"error":{"errors":[{"reason":...}]}}` body.
fn forbidden_reason(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .pointer("/error/errors/0/reason")
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned)
}

/// Trim a response body down to something fit for a one-line message.
///
/// Google APIs wrap failures as `{"error": {"message": ...}}`; prefer that.
fn summarize_body(body: &str) -> String {
    const MAX_LEN: usize = 200;

    let message: String = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned)
        })
        .unwrap_or_else(|| body.trim().to_owned());

    if message.chars().count() > MAX_LEN {
        let truncated: String = message.chars().take(MAX_LEN).collect();
        format!("{truncated}…")
    } else {
        message
    }
}

// Manual Clone implementation to handle non-Clone fields
impl Clone for AppError {
    fn clone(&self) -> Self {
        match self {
            Self::Auth(msg) => Self::Auth(msg.clone()),
            Self::NotFound(msg) => Self::NotFound(msg.clone()),
            Self::Transient(msg) => Self::Transient(msg.clone()),
            Self::Provider(msg) => Self::Provider(msg.clone()),
            Self::Io(e) => Self::Io(io::Error::new(e.kind(), e.to_string())),
            Self::Config(e) => Self::Other(format!("Config error: {e}")),
            Self::ConfigIo { path, source } => Self::ConfigIo {
                path: path.clone(),
                source: io::Error::new(source.kind(), source.to_string()),
            },
            Self::Serde(e) => Self::Other(format!("Serde error: {e}")),
            Self::Other(msg) => Self::Other(msg.clone()),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return Self::from_status(status, e.to_string());
        }

        if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() {
            Self::Transient(e.to_string())
        } else if e.is_decode() {
            Self::Provider(format!("could not decode response: {e}"))
        } else {
            Self::Other(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_listing_classes() {
        assert_eq!(
            AppError::from_status(StatusCode::UNAUTHORIZED, "").kind(),
            ErrorKind::Auth
        );
        assert_eq!(
            AppError::from_status(StatusCode::NOT_FOUND, "").kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            AppError::from_status(StatusCode::TOO_MANY_REQUESTS, "").kind(),
            ErrorKind::Transient
        );
        assert_eq!(
            AppError::from_status(StatusCode::BAD_GATEWAY, "").kind(),
            ErrorKind::Transient
        );
        assert_eq!(
            AppError::from_status(StatusCode::IM_A_TEAPOT, "").kind(),
            ErrorKind::Unknown
        );
    }

    #[test]
    fn drive_rate_limit_403_stays_retryable() {
        let body = r#"{"error":{"errors":[{"reason":"userRateLimitExceeded"}],"code":403,"message":"User Rate Limit Exceeded"}}"#;
        let err = AppError::from_status(StatusCode::FORBIDDEN, body);

        assert!(err.is_retryable());
        assert!(err.to_string().contains("User Rate Limit Exceeded"));

        let denied = AppError::from_status(StatusCode::FORBIDDEN, "insufficientPermissions");
        assert!(denied.is_session_fatal());
    }

    #[test]
    fn drive_file_permission_403_is_folder_scoped() {
        let body = r#"{"error":{"errors":[{"domain":"global","reason":"insufficientFilePermissions","message":"The user does not have sufficient permissions for this file."}],"code":403,"message":"The user does not have sufficient permissions for this file."}}"#;
        let err = AppError::from_status(StatusCode::FORBIDDEN, body);

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(!err.is_session_fatal());
        assert!(!err.is_retryable());

        let scope = r#"{"error":{"errors":[{"reason":"insufficientPermissions"}],"code":403,"message":"Insufficient Permission"}}"#;
        assert_eq!(
            AppError::from_status(StatusCode::FORBIDDEN, scope).kind(),
            ErrorKind::Auth
        );

        let quota = r#"{"error":{"errors":[{"reason":"rateLimitExceeded"}],"code":403,"message":"Rate Limit Exceeded"}}"#;
        assert!(AppError::from_status(StatusCode::FORBIDDEN, quota).is_retryable());
    }

    #[test]
    fn io_errors_classify_by_kind() {
        let missing = AppError::from(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        let reset = AppError::from(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
        assert_eq!(reset.kind(), ErrorKind::Transient);

        let file = AppError::from(io::Error::new(io::ErrorKind::NotADirectory, "not a dir"));
        assert_eq!(file.kind(), ErrorKind::NotFound);
        assert!(!file.is_retryable());
    }

    #[test]
    fn context_keeps_classification() {
        let err = AppError::NotFound("f1".into()).with_context("listing Docs");

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("listing Docs"));
    }

    #[test]
    fn clone_preserves_message() {
        let err = AppError::Io(io::Error::new(io::ErrorKind::TimedOut, "slow"));
        let cloned = err.clone();

        assert_eq!(err.to_string(), cloned.to_string());
        assert_eq!(cloned.kind(), ErrorKind::Transient);
    }
}
