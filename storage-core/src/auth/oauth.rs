//! src/auth/oauth.rs
//! ============================================================================
//! # Installed-app OAuth2 flow for Google Drive
//!
//! Resolution order on every start:
//! 1. cached token still valid → use it
//! 2. cached token expired with a refresh token → refresh and persist
//! 3. otherwise → interactive consent through a loopback redirect
//!
//! The consent step prints the authorization URL, waits for the browser to hit
//! `http://127.0.0.1:<port>/callback`, and exchanges the code for a token.

use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Url};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};
use tracing::{debug, info, warn};

use crate::{
    auth::{
        ConnectionContext, CredentialProvider,
        token::{self, ClientSecrets, StoredToken, TokenResponse},
    },
    config::AuthConfig,
    error::{AppError, ErrorKind},
};

/// Read-only access to file metadata and content.
pub const DRIVE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";

const CALLBACK_PATH: &str = "/callback";
const MAX_REQUEST_HEAD: usize = 8 * 1024;

/// What the loopback listener made of one incoming request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CallbackOutcome {
    /// Authorization code plus the echoed `state`, if any.
    Code { code: String, state: Option<String> },

    /// The user denied consent or the redirect carried no code.
    Denied(String),

    /// Unrelated request (favicon, health checks); keep listening.
    Ignored,
}

/// Interpret the request line of an HTTP request sent to the loopback server.
pub(crate) fn parse_callback(request_head: &str) -> CallbackOutcome {
    let Some(request_line) = request_head.lines().next() else {
        return CallbackOutcome::Ignored;
    };

    let mut parts = request_line.split_whitespace();
    let (Some("GET"), Some(target)) = (parts.next(), parts.next()) else {
        return CallbackOutcome::Ignored;
    };

    let Ok(url) = Url::parse(&format!("http://127.0.0.1{target}")) else {
        return CallbackOutcome::Ignored;
    };

    if url.path() != CALLBACK_PATH {
        return CallbackOutcome::Ignored;
    }

    let mut code: Option<String> = None;
    let mut state: Option<String> = None;

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" if !value.is_empty() => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => return CallbackOutcome::Denied(value.into_owned()),
            _ => {}
        }
    }

    match code {
        Some(code) => CallbackOutcome::Code { code, state },
        None => CallbackOutcome::Denied("no code in callback".to_owned()),
    }
}

/// Build the consent URL the user opens in a browser.
pub fn authorization_url(
    secrets: &ClientSecrets,
    redirect_uri: &str,
    state: &str,
) -> Result<String, AppError> {
    let url = Url::parse_with_params(
        &secrets.auth_uri,
        &[
            ("client_id", secrets.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
            ("scope", DRIVE_READONLY_SCOPE),
            ("access_type", "offline"),
            ("state", state),
        ],
    )
    .map_err(|e| AppError::Auth(format!("invalid auth_uri in credentials: {e}")))?;

    Ok(url.into())
}

/// Per-attempt nonce echoed back through the redirect.
fn state_nonce() -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("{nanos:x}{:x}", std::process::id())
}

/// Credential provider backed by a client secrets file and a token cache.
#[derive(Debug, Clone)]
pub struct OAuthProvider {
    credentials_path: PathBuf,
    token_path: PathBuf,
    redirect_port: u16,
    consent_timeout: Duration,
    http: Client,
}

impl OAuthProvider {
    pub fn new(config: &AuthConfig) -> Result<Self, AppError> {
        let credentials_path = match &config.credentials_file {
            Some(path) => path.clone(),
            None => token::default_path("credentials.json")?,
        };
        let token_path = match &config.token_file {
            Some(path) => path.clone(),
            None => token::default_path("token.json")?,
        };

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            credentials_path,
            token_path,
            redirect_port: config.redirect_port,
            consent_timeout: config.consent_timeout,
            http,
        })
    }

    fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}{CALLBACK_PATH}", self.redirect_port)
    }

    async fn token_request(
        &self,
        secrets: &ClientSecrets,
        form: &[(&str, &str)],
    ) -> Result<TokenResponse, AppError> {
        let response = self.http.post(&secrets.token_uri).form(form).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // invalid_grant and friends come back as 400; everything but 5xx is fatal
            let err = AppError::from_status(status, body);
            return Err(match err.kind() {
                ErrorKind::Transient => err,
                _ => AppError::Auth(format!("token endpoint rejected the request: {err}")),
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| AppError::Auth(format!("unreadable token response: {e}")))
    }

    async fn refresh(
        &self,
        secrets: &ClientSecrets,
        refresh_token: &str,
    ) -> Result<StoredToken, AppError> {
        info!("Refreshing expired access token");

        let response = self
            .token_request(
                secrets,
                &[
                    ("client_id", secrets.client_id.as_str()),
                    ("client_secret", secrets.client_secret.as_str()),
                    ("refresh_token", refresh_token),
                    ("grant_type", "refresh_token"),
                ],
            )
            .await?;

        Ok(StoredToken::from_response(
            response,
            Some(refresh_token.to_owned()),
            Utc::now(),
        ))
    }

    async fn consent(&self, secrets: &ClientSecrets) -> Result<StoredToken, AppError> {
        let redirect_uri = self.redirect_uri();
        let state = state_nonce();

        let listener = TcpListener::bind(("127.0.0.1", self.redirect_port))
            .await
            .map_err(|e| {
                AppError::Auth(format!(
                    "cannot listen for the OAuth redirect on port {}: {e}",
                    self.redirect_port
                ))
            })?;

        let url = authorization_url(secrets, &redirect_uri, &state)?;
        eprintln!("Open this URL in your browser to authorize:\n\n{url}\n");

        let code = tokio::time::timeout(self.consent_timeout, await_callback(&listener, &state))
            .await
            .map_err(|_| {
                AppError::Auth(format!(
                    "no authorization received within {:?}",
                    self.consent_timeout
                ))
            })??;

        let response = self
            .token_request(
                secrets,
                &[
                    ("client_id", secrets.client_id.as_str()),
                    ("client_secret", secrets.client_secret.as_str()),
                    ("code", code.as_str()),
                    ("redirect_uri", redirect_uri.as_str()),
                    ("grant_type", "authorization_code"),
                ],
            )
            .await?;

        Ok(StoredToken::from_response(response, None, Utc::now()))
    }
}

/// Accept loopback connections until the OAuth redirect arrives.
async fn await_callback(listener: &TcpListener, expected_state: &str) -> Result<String, AppError> {
    loop {
        let (mut stream, peer) = listener.accept().await?;
        let head = read_request_head(&mut stream).await?;
        debug!(%peer, "OAuth loopback request");

        match parse_callback(&head) {
            CallbackOutcome::Code { code, state } => {
                if state.as_deref() != Some(expected_state) {
                    respond(&mut stream, "400 Bad Request", "State mismatch; please retry.").await;
                    return Err(AppError::Auth("OAuth state mismatch in callback".into()));
                }

                respond(
                    &mut stream,
                    "200 OK",
                    "Authorization successful! You can close this tab.",
                )
                .await;
                return Ok(code);
            }

            CallbackOutcome::Denied(reason) => {
                respond(
                    &mut stream,
                    "400 Bad Request",
                    "Error: no authorization code received.",
                )
                .await;
                return Err(AppError::Auth(format!("authorization failed: {reason}")));
            }

            CallbackOutcome::Ignored => respond(&mut stream, "404 Not Found", "").await,
        }
    }
}

async fn read_request_head(stream: &mut TcpStream) -> Result<String, AppError> {
    let mut buf: Vec<u8> = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        if buf.windows(4).any(|w| w == b"\r\n\r\n") || buf.len() >= MAX_REQUEST_HEAD {
            break;
        }
    }

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

async fn respond(stream: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );

    if let Err(e) = stream.write_all(response.as_bytes()).await {
        warn!("Failed to answer OAuth loopback request: {e}");
    }
    let _ = stream.shutdown().await;
}

#[async_trait]
impl CredentialProvider for OAuthProvider {
    async fn authenticated_context(&self) -> Result<ConnectionContext, AppError> {
        let secrets = ClientSecrets::load(&self.credentials_path).await?;

        let cached = match StoredToken::load(&self.token_path).await {
            Ok(cached) => cached,
            Err(e) => {
                warn!("Ignoring unreadable token cache: {e}");
                None
            }
        };

        let token = match cached {
            Some(token) if !token.is_expired(Utc::now()) => {
                debug!("Cached access token still valid");
                token
            }

            Some(StoredToken {
                refresh_token: Some(refresh_token),
                ..
            }) => match self.refresh(&secrets, &refresh_token).await {
                Ok(token) => {
                    token.save(&self.token_path).await?;
                    token
                }
                Err(e) if e.is_session_fatal() => {
                    warn!("Refresh token rejected, starting consent: {e}");
                    let token = self.consent(&secrets).await?;
                    token.save(&self.token_path).await?;
                    token
                }
                Err(e) => return Err(e),
            },

            _ => {
                let started = Instant::now();
                let token = self.consent(&secrets).await?;
                info!("Consent completed in {:?}", started.elapsed());
                token.save(&self.token_path).await?;
                token
            }
        };

        Ok(ConnectionContext::new(token.access_token, token.token_type))
    }

    /// Trade the cached refresh token for a new access token. Never prompts.
    async fn refreshed_context(&self) -> Result<Option<ConnectionContext>, AppError> {
        let Some(StoredToken {
            refresh_token: Some(refresh_token),
            ..
        }) = StoredToken::load(&self.token_path).await?
        else {
            debug!("No refresh token cached; cannot re-sign");
            return Ok(None);
        };

        let secrets = ClientSecrets::load(&self.credentials_path).await?;
        let token = self.refresh(&secrets, &refresh_token).await?;
        token.save(&self.token_path).await?;

        Ok(Some(ConnectionContext::new(token.access_token, token.token_type)))
    }
}
