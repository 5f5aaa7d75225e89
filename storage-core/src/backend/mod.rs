//! src/backend/mod.rs
//! ============================================================================
//! # Backend: the listing capability every storage provider implements
//!
//! A backend answers exactly one question: "what are the immediate children of
//! this folder?". Providers are added by implementing [`Backend`], never by
//! wrapping a concrete type. Implementations hold only their connection; no
//! per-listing state survives between calls.

use async_trait::async_trait;

use crate::{error::AppError, model::entry::Entry};

pub mod drive;
pub mod local;
pub mod pagination;

pub use drive::DriveBackend;
pub use local::LocalBackend;
pub use pagination::{Page, PageRequest, PageSource, Paginator};

/// Distinguished id of the top-level folder. Every backend accepts it.
pub const ROOT_FOLDER_ID: &str = "root";

#[async_trait]
pub trait Backend: Send + Sync {
    /// Short provider name for logs and the status bar.
    fn name(&self) -> &'static str;

    /// List the direct children of `folder_id`, folders first then by name.
    ///
    /// Fails as a whole: no partial listing is ever returned.
    async fn list_folder(&self, folder_id: &str) -> Result<Vec<Entry>, AppError>;
}
