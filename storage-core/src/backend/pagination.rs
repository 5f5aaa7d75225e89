//! src/backend/pagination.rs
//! ============================================================================
//! # Pagination Driver
//!
//! Turns a page-at-a-time list API into one complete, ordered listing.
//!
//! The driver asks the server for `folder,name` ordering so pages can simply be
//! concatenated. Total order across pages therefore depends on the provider
//! keeping that ordering stable under a continuation token. The driver does not
//! re-sort; it drops ids it has already seen and logs ordering violations.
//!
//! Any failed page fails the whole listing. Retries belong to the caller.

use std::{collections::HashSet, time::Instant};

use async_trait::async_trait;
use compact_str::CompactString;
use tracing::{debug, instrument, warn};

use crate::{error::AppError, model::entry::Entry};

/// Upper bound on entries requested per page.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Server-side ordering requested for every page.
pub const ORDER_BY: &str = "folder,name";

/// One page request as handed to a [`PageSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest<'a> {
    /// Provider filter expression selecting the folder's children.
    pub query: &'a str,

    /// Requested ordering, always [`ORDER_BY`].
    pub order_by: &'a str,

    /// Maximum entries in this page (1..=[`MAX_PAGE_SIZE`]).
    pub page_size: u32,

    /// Continuation token from the previous page, `None` for the first.
    pub page_token: Option<&'a str>,
}

/// One page of results plus the continuation token, if more remain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub entries: Vec<Entry>,
    pub next_page_token: Option<String>,
}

/// Transport for a single page. Implemented by the Drive HTTP client and by
/// in-memory fixtures in tests.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Page, AppError>;
}

/// Filter selecting non-trashed children of `folder_id`.
///
/// Single quotes and backslashes inside the id are escaped per the Drive
/// query grammar.
#[must_use]
pub fn children_query(folder_id: &str) -> String {
    let escaped = folder_id.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}' in parents and trashed = false")
}

/// Stateless driver; owns only the page source and its page size.
#[derive(Debug, Clone)]
pub struct Paginator<S> {
    source: S,
    page_size: u32,
}

impl<S: PageSource> Paginator<S> {
    /// `page_size` is clamped to `1..=MAX_PAGE_SIZE`.
    pub fn new(source: S, page_size: u32) -> Self {
        Self {
            source,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Fetch every page of `folder_id`'s children and return them in order.
    #[instrument(level = "debug", skip(self), fields(page_size = self.page_size))]
    pub async fn list_all(&self, folder_id: &str) -> Result<Vec<Entry>, AppError> {
        let start = Instant::now();
        let query = children_query(folder_id);

        let mut entries: Vec<Entry> = Vec::new();
        let mut seen: HashSet<CompactString> = HashSet::new();
        let mut page_token: Option<String> = None;
        let mut tokens: HashSet<String> = HashSet::new();
        let mut pages: u32 = 0;
        let mut dropped: usize = 0;

        loop {
            let request = PageRequest {
                query: &query,
                order_by: ORDER_BY,
                page_size: self.page_size,
                page_token: page_token.as_deref(),
            };

            let page: Page = self.source.fetch_page(&request).await?;
            pages += 1;

            for entry in page.entries {
                if !seen.insert(CompactString::new(entry.id())) {
                    dropped += 1;
                    continue;
                }

                if let Some(prev) = entries.last()
                    && prev.sort_key() > entry.sort_key()
                {
                    warn!(
                        marker = "PAGINATION_ORDER",
                        folder_id,
                        previous = prev.name(),
                        current = entry.name(),
                        "Server returned entries out of folder,name order"
                    );
                }

                entries.push(entry);
            }

            // Any token seen before would cycle forever.
            match page.next_page_token {
                Some(next) if next.is_empty() => break,
                Some(next) if tokens.insert(next.clone()) => page_token = Some(next),
                Some(next) => {
                    warn!(folder_id, token = %next, pages, "Continuation token repeated; stopping");
                    break;
                }
                None => break,
            }
        }

        if dropped > 0 {
            warn!(folder_id, dropped, "Dropped entries repeated across pages");
        }

        debug!(
            folder_id,
            pages,
            entries = entries.len(),
            "Folder listing completed in {:?}",
            start.elapsed()
        );

        Ok(entries)
    }
}
