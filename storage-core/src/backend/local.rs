//! ``src/backend/local.rs``
//!
//! # `LocalBackend`: Asynchronous Filesystem Listing
//!
//! Implements [`Backend`] over a directory tree so the browser can run without
//! network access. Folder ids are absolute paths; [`ROOT_FOLDER_ID`] maps to the
//! configured root directory.

use std::{
    cmp::Ordering,
    ffi::OsStr,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use tokio::fs::{self, DirEntry, ReadDir};
use tracing::{debug, info};

use crate::{
    backend::{Backend, ROOT_FOLDER_ID},
    error::AppError,
    model::entry::{Entry, LOCAL_FOLDER_MIME_TYPE},
};

/// Lists directories on the local disk.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    root: PathBuf,
    show_hidden: bool,
}

impl LocalBackend {
    /// * `root` - Directory served for the `"root"` folder id.
    /// * `show_hidden` - Whether to include entries starting with '.'.
    pub fn new(root: impl Into<PathBuf>, show_hidden: bool) -> Self {
        Self {
            root: root.into(),
            show_hidden,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, folder_id: &str) -> PathBuf {
        if folder_id == ROOT_FOLDER_ID {
            self.root.clone()
        } else {
            PathBuf::from(folder_id)
        }
    }

    fn should_skip(&self, file_name: &str) -> bool {
        !self.show_hidden && file_name.starts_with('.')
    }

    async fn entry_for(dir_entry: &DirEntry) -> Result<Entry, AppError> {
        let entry_path: PathBuf = dir_entry.path();
        let name: &str = entry_path
            .file_name()
            .and_then(OsStr::to_str)
            .unwrap_or("");

        // Follow symlinks so a linked directory is browsable.
        let metadata = fs::metadata(&entry_path).await?;

        let (mime_type, size) = if metadata.is_dir() {
            (LOCAL_FOLDER_MIME_TYPE, 0)
        } else {
            (guess_mime_type(&entry_path), metadata.len())
        };

        Ok(Entry::new(
            entry_path.to_string_lossy().as_ref(),
            name,
            mime_type,
            size,
            LOCAL_FOLDER_MIME_TYPE,
        ))
    }
}

#[async_trait]
impl Backend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    /// Scans the folder asynchronously and returns a sorted list of entries.
    async fn list_folder(&self, folder_id: &str) -> Result<Vec<Entry>, AppError> {
        let start_time = Instant::now();
        let path = self.resolve(folder_id);

        let metadata = fs::metadata(&path)
            .await
            .map_err(|e| AppError::from(e).with_context(path.display().to_string()))?;
        if !metadata.is_dir() {
            return Err(AppError::NotFound(format!("{} is not a folder", path.display())));
        }

        let mut entries: Vec<Entry> = Vec::new();
        let mut read_dir: ReadDir = fs::read_dir(&path)
            .await
            .map_err(|e| AppError::from(e).with_context(path.display().to_string()))?;

        while let Some(dir_entry) = read_dir.next_entry().await? {
            let file_name = dir_entry.file_name();
            if self.should_skip(&file_name.to_string_lossy()) {
                continue;
            }

            match Self::entry_for(&dir_entry).await {
                Ok(entry) => entries.push(entry),

                Err(e) => {
                    // Dangling symlinks and races with deletion; skip the entry
                    debug!("Failed to stat {:?}: {}", dir_entry.path(), e);
                }
            }
        }

        sort_entries(&mut entries);

        let duration: Duration = start_time.elapsed();
        info!(
            marker = "PERF_DIRECTORY_SCAN",
            operation_type = "local_list_folder",
            entries = entries.len(),
            "Directory scan completed in {:?}",
            duration
        );

        Ok(entries)
    }
}

/// Sort entries: directories first, then by name.
fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(|a: &Entry, b: &Entry| -> Ordering {
        if a.is_folder() && !b.is_folder() {
            Ordering::Less
        } else if !a.is_folder() && b.is_folder() {
            Ordering::Greater
        } else {
            a.name().cmp(b.name())
        }
    });
}

fn guess_mime_type(path: &Path) -> &'static str {
    let extension: String = path
        .extension()
        .and_then(OsStr::to_str)
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "txt" | "log" => "text/plain",
        "md" => "text/markdown",
        "html" | "htm" => "text/html",
        "csv" => "text/csv",
        "json" => "application/json",
        "toml" => "application/toml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        _ => "application/octet-stream",
    }
}
