//! src/model/entry.rs
//! ============================================================================
//! # Entry: one listed file or folder
//!
//! Provider-independent value type produced by every [`Backend`]. Entries are
//! built once per fetch and never mutated afterwards, so all fields are private
//! behind accessors and `is_folder` is derived at construction time.
//!
//! [`Backend`]: crate::backend::Backend

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Google Drive's folder mime type.
pub const DRIVE_FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Folder sentinel used by the local filesystem backend.
pub const LOCAL_FOLDER_MIME_TYPE: &str = "inode/directory";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    id: CompactString,
    name: CompactString,
    mime_type: CompactString,
    size: u64,
    is_folder: bool,
}

impl Entry {
    /// Build an entry, deriving `is_folder` from the provider's folder sentinel.
    pub fn new(
        id: impl Into<CompactString>,
        name: impl Into<CompactString>,
        mime_type: impl Into<CompactString>,
        size: u64,
        folder_mime_type: &str,
    ) -> Self {
        let mime_type: CompactString = mime_type.into();
        let is_folder = mime_type.as_str() == folder_mime_type;

        Self {
            id: id.into(),
            name: name.into(),
            size: if is_folder { 0 } else { size },
            mime_type,
            is_folder,
        }
    }

    /// Shorthand for a Drive folder.
    pub fn drive_folder(id: impl Into<CompactString>, name: impl Into<CompactString>) -> Self {
        Self::new(id, name, DRIVE_FOLDER_MIME_TYPE, 0, DRIVE_FOLDER_MIME_TYPE)
    }

    /// Shorthand for a Drive file.
    pub fn drive_file(
        id: impl Into<CompactString>,
        name: impl Into<CompactString>,
        mime_type: impl Into<CompactString>,
        size: u64,
    ) -> Self {
        Self::new(id, name, mime_type, size, DRIVE_FOLDER_MIME_TYPE)
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Byte length; `0` for folders and unknown sizes.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    #[inline]
    #[must_use]
    pub const fn is_folder(&self) -> bool {
        self.is_folder
    }

    /// Key used for the listing order: folders first, then by name.
    #[must_use]
    pub fn sort_key(&self) -> (bool, &str) {
        (!self.is_folder, self.name())
    }
}

/// One `(id, name)` step on the navigation path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Breadcrumb {
    pub id: CompactString,
    pub name: CompactString,
}

impl Breadcrumb {
    pub fn new(id: impl Into<CompactString>, name: impl Into<CompactString>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl From<&Entry> for Breadcrumb {
    fn from(entry: &Entry) -> Self {
        Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
        }
    }
}
