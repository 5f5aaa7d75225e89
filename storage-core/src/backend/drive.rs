//! src/backend/drive.rs
//! ============================================================================
//! # Google Drive backend
//!
//! Lists folders through the Drive v3 `files.list` endpoint. One HTTP client is
//! built at construction and reused for every page. The `Authorization` header
//! is attached per request so that an expired access token can be swapped for
//! a refreshed one mid-session: a `401` triggers one re-sign and one retry.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, trace, warn};

use crate::{
    auth::{ConnectionContext, CredentialProvider},
    backend::{
        Backend,
        pagination::{Page, PageRequest, PageSource, Paginator},
    },
    config::DriveConfig,
    error::AppError,
    model::entry::{DRIVE_FOLDER_MIME_TYPE, Entry},
};

/// Partial response selector: only what [`Entry`] needs.
const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType, size)";

// ─── Wire types ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,

    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    mime_type: String,

    /// int64 encoded as a decimal string; absent for folders and Google Docs.
    #[serde(default)]
    size: Option<String>,
}

impl From<DriveFile> for Entry {
    fn from(file: DriveFile) -> Self {
        let size: u64 = file
            .size
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        Self::new(file.id, file.name, file.mime_type, size, DRIVE_FOLDER_MIME_TYPE)
    }
}

/// Decode one `files.list` response body.
pub(crate) fn parse_page(body: &str) -> Result<Page, AppError> {
    let list: DriveFileList = serde_json::from_str(body)
        .map_err(|e| AppError::Provider(format!("malformed files.list response: {e}")))?;

    Ok(Page {
        entries: list.files.into_iter().map(Entry::from).collect(),
        next_page_token: list.next_page_token.filter(|t| !t.is_empty()),
    })
}

// ─── HTTP page source ────────────────────────────────────────────────────

fn authorization_header(context: &ConnectionContext) -> Result<HeaderValue, AppError> {
    let mut value = HeaderValue::from_str(&context.authorization())
        .map_err(|e| AppError::Auth(format!("access token is not a valid header: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Authenticated connection to the Drive REST API.
#[derive(Clone)]
pub struct DriveConnection {
    client: Client,
    files_url: String,
    authorization: Arc<RwLock<HeaderValue>>,
    credentials: Option<Arc<dyn CredentialProvider>>,
}

impl DriveConnection {
    pub fn new(context: &ConnectionContext, config: &DriveConfig) -> Result<Self, AppError> {
        let authorization = authorization_header(context)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .user_agent(concat!("storage/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            files_url: format!("{}/files", config.api_base.trim_end_matches('/')),
            authorization: Arc::new(RwLock::new(authorization)),
            credentials: None,
        })
    }

    /// Re-sign through `provider` when the server rejects the access token.
    #[must_use]
    pub fn with_credentials(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(provider);
        self
    }

    async fn send(&self, params: &[(&str, &str)]) -> Result<(StatusCode, String), AppError> {
        let authorization = self.authorization.read().await.clone();

        let response = self
            .client
            .get(&self.files_url)
            .header(AUTHORIZATION, authorization)
            .query(params)
            .send()
            .await?;

        let status: StatusCode = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }

    /// Swap in a refreshed access token. `false` when no refresh is possible.
    async fn resign(&self) -> Result<bool, AppError> {
        let Some(provider) = &self.credentials else {
            return Ok(false);
        };

        match provider.refreshed_context().await? {
            Some(context) => {
                *self.authorization.write().await = authorization_header(&context)?;
                info!("Access token refreshed after 401");
                Ok(true)
            }
            None => {
                warn!("Access token rejected and credentials cannot be refreshed");
                Ok(false)
            }
        }
    }
}

// Never print the token.
impl std::fmt::Debug for DriveConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveConnection")
            .field("files_url", &self.files_url)
            .field("refreshable", &self.credentials.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PageSource for DriveConnection {
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Page, AppError> {
        let page_size = request.page_size.to_string();

        let mut params: Vec<(&str, &str)> = vec![
            ("q", request.query),
            ("fields", LIST_FIELDS),
            ("orderBy", request.order_by),
            ("pageSize", &page_size),
        ];
        if let Some(token) = request.page_token {
            params.push(("pageToken", token));
        }

        trace!(url = %self.files_url, token = ?request.page_token, "Requesting Drive page");

        let (mut status, mut body) = self.send(&params).await?;

        if status == StatusCode::UNAUTHORIZED && self.resign().await? {
            (status, body) = self.send(&params).await?;
        }

        if !status.is_success() {
            return Err(AppError::from_status(status, body));
        }

        parse_page(&body)
    }
}

// ─── Backend ─────────────────────────────────────────────────────────────

/// Drive-backed implementation of [`Backend`].
#[derive(Debug, Clone)]
pub struct DriveBackend {
    paginator: Paginator<DriveConnection>,
}

impl DriveBackend {
    /// Build a backend from an authenticated context.
    pub fn new(context: &ConnectionContext, config: &DriveConfig) -> Result<Self, AppError> {
        Ok(Self::from_connection(
            DriveConnection::new(context, config)?,
            config,
        ))
    }

    /// Like [`DriveBackend::new`], re-signing through `provider` on a `401`.
    pub fn with_credentials(
        context: &ConnectionContext,
        config: &DriveConfig,
        provider: Arc<dyn CredentialProvider>,
    ) -> Result<Self, AppError> {
        let connection = DriveConnection::new(context, config)?.with_credentials(provider);
        Ok(Self::from_connection(connection, config))
    }

    fn from_connection(connection: DriveConnection, config: &DriveConfig) -> Self {
        info!(api_base = %config.api_base, page_size = config.page_size, "Drive backend ready");

        Self {
            paginator: Paginator::new(connection, config.page_size),
        }
    }
}

#[async_trait]
impl Backend for DriveBackend {
    fn name(&self) -> &'static str {
        "drive"
    }

    async fn list_folder(&self, folder_id: &str) -> Result<Vec<Entry>, AppError> {
        debug!(folder_id, "Listing Drive folder");
        self.paginator.list_all(folder_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_server;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn parses_files_list_page() {
        let body = r#"{
            "nextPageToken": "tok-2",
            "files": [
                {"id": "f1", "name": "Docs", "mimeType": "application/vnd.google-apps.folder"},
                {"id": "n1", "name": "notes.txt", "mimeType": "text/plain", "size": "120"},
                {"id": "g1", "name": "Budget", "mimeType": "application/vnd.google-apps.spreadsheet"}
            ]
        }"#;

        let page = parse_page(body).unwrap();

        assert_eq!(page.next_page_token.as_deref(), Some("tok-2"));
        assert_eq!(page.entries.len(), 3);
        assert!(page.entries[0].is_folder());
        assert_eq!(page.entries[1].size(), 120);
        assert_eq!(page.entries[2].size(), 0);
        assert!(!page.entries[2].is_folder());
    }

    #[test]
    fn last_page_has_no_token() {
        let page = parse_page(r#"{"files": []}"#).unwrap();
        assert!(page.entries.is_empty());
        assert!(page.next_page_token.is_none());

        let page = parse_page(r#"{"files": [], "nextPageToken": ""}"#).unwrap();
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn malformed_body_is_a_provider_error() {
        let err = parse_page("<html>oops</html>").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Unknown);
    }

    #[test]
    fn files_url_joins_api_base() {
        let context = ConnectionContext::bearer("token");
        let config = DriveConfig {
            api_base: "https://example.test/drive/v3/".into(),
            ..DriveConfig::default()
        };

        let connection = DriveConnection::new(&context, &config).unwrap();
        assert_eq!(connection.files_url, "https://example.test/drive/v3/files");
    }

    #[test]
    fn invalid_token_is_an_auth_error() {
        let context = ConnectionContext::bearer("bad\ntoken");
        let err = DriveConnection::new(&context, &DriveConfig::default()).unwrap_err();
        assert!(err.is_session_fatal());
    }

    /// Hands out `fresh` once asked to refresh.
    struct RefreshingProvider {
        refreshes: AtomicU32,
        fresh: Option<&'static str>,
    }

    #[async_trait]
    impl CredentialProvider for RefreshingProvider {
        async fn authenticated_context(&self) -> Result<ConnectionContext, AppError> {
            Ok(ConnectionContext::bearer("stale"))
        }

        async fn refreshed_context(&self) -> Result<Option<ConnectionContext>, AppError> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            Ok(self.fresh.map(ConnectionContext::bearer))
        }
    }

    /// Drive stand-in accepting only `Bearer fresh`.
    async fn drive_accepting_fresh_token() -> DriveConfig {
        let addr = test_server::serve(|request| {
            assert!(request.target.starts_with("/drive/v3/files?"));
            match request.header("authorization") {
                Some("Bearer fresh") => (
                    200,
                    r#"{"files":[{"id":"f1","name":"Docs","mimeType":"application/vnd.google-apps.folder"}]}"#
                        .to_owned(),
                ),
                _ => (
                    401,
                    r#"{"error":{"code":401,"message":"Request had invalid authentication credentials."}}"#
                        .to_owned(),
                ),
            }
        })
        .await;

        DriveConfig {
            api_base: format!("http://{addr}/drive/v3"),
            ..DriveConfig::default()
        }
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_request_retried() {
        let config = drive_accepting_fresh_token().await;
        let provider = Arc::new(RefreshingProvider {
            refreshes: AtomicU32::new(0),
            fresh: Some("fresh"),
        });

        let backend = DriveBackend::with_credentials(
            &ConnectionContext::bearer("stale"),
            &config,
            provider.clone(),
        )
        .unwrap();

        let first = backend.list_folder("root").await.unwrap();
        assert_eq!(first[0].name(), "Docs");

        // The refreshed header sticks for later listings.
        backend.list_folder("root").await.unwrap();
        assert_eq!(provider.refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unrefreshable_401_stays_an_auth_error() {
        let config = drive_accepting_fresh_token().await;
        let provider = Arc::new(RefreshingProvider {
            refreshes: AtomicU32::new(0),
            fresh: None,
        });

        let backend =
            DriveBackend::with_credentials(&ConnectionContext::bearer("stale"), &config, provider)
                .unwrap();
        let err = backend.list_folder("root").await.unwrap_err();
        assert!(err.is_session_fatal());

        let plain = DriveBackend::new(&ConnectionContext::bearer("stale"), &config).unwrap();
        assert!(plain.list_folder("root").await.unwrap_err().is_session_fatal());
    }
}
