//! src/view/icons.rs
//! ============================================================================
//! # Entry icons
//!
//! Folders get an emoji; files get blank padding of the same display width so
//! names line up in both the TUI and `storage list` output.

pub const FOLDER_ICON: &str = "📁 ";
pub const FILE_ICON: &str = "   ";

#[must_use]
pub const fn icon_for(is_folder: bool) -> &'static str {
    if is_folder { FOLDER_ICON } else { FILE_ICON }
}
