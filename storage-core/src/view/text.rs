//! src/view/text.rs
//! ============================================================================
//! # Plain-text frame renderer
//!
//! [`render`] is a pure function of the navigation state and the number of list
//! rows available. The ratatui painter in [`crate::view::ui`] reuses the same
//! window and label helpers so both views scroll identically.

use std::ops::Range;

use crate::{
    model::{
        entry::{Breadcrumb, Entry},
        nav_state::{NavigationState, Phase},
    },
    util::humanize::human_readable_size,
    view::icons,
};

pub const TITLE_PREFIX: &str = "storage > ";
pub const PATH_SEPARATOR: &str = " / ";
pub const KEY_HINTS: &str =
    "j/k: navigate | enter/l: open | backspace/h: back | r: reload | q: quit";

pub const LOADING_TEXT: &str = "Loading...";
pub const EMPTY_FOLDER_TEXT: &str = "(empty folder)";

/// Title, blank line, blank line, status line and a spare row.
const CHROME_ROWS: u16 = 5;

/// List rows that fit in a terminal of `terminal_height` lines (at least 1).
#[must_use]
pub fn list_rows(terminal_height: u16) -> usize {
    usize::from(terminal_height.saturating_sub(CHROME_ROWS)).max(1)
}

/// Indices of the entries visible with the cursor kept on the last row.
///
/// The offset is `max(0, cursor - rows + 1)`.
#[must_use]
pub fn visible_window(len: usize, cursor: usize, rows: usize) -> Range<usize> {
    let rows = rows.max(1);
    let start = (cursor + 1).saturating_sub(rows).min(len);
    start..(start + rows).min(len)
}

#[must_use]
pub fn breadcrumb_title(path: &[Breadcrumb]) -> String {
    let names: Vec<&str> = path.iter().map(|crumb| crumb.name.as_str()).collect();
    format!("{TITLE_PREFIX}{}", names.join(PATH_SEPARATOR))
}

/// `📁 Docs` for folders, `   notes.txt  120 B` for files.
#[must_use]
pub fn entry_label(entry: &Entry) -> String {
    let icon = icons::icon_for(entry.is_folder());

    if entry.is_folder() {
        format!("{icon}{}", entry.name())
    } else {
        let size = human_readable_size(entry.size());
        if size.is_empty() {
            format!("{icon}{}", entry.name())
        } else {
            format!("{icon}{}  {size}", entry.name())
        }
    }
}

#[must_use]
pub fn status_line(state: &NavigationState) -> String {
    format!("{} items | {KEY_HINTS}", state.entries().len())
}

/// Persistent banner text shown after an authentication failure.
#[must_use]
pub fn session_banner(state: &NavigationState) -> Option<String> {
    let error = state.session_error()?;
    match state.phase() {
        Phase::Errored(_) => None,
        _ => Some(format!("! {error}. Restart to sign in again.")),
    }
}

/// Render a full frame as text.
#[must_use]
pub fn render(state: &NavigationState, viewport_height: usize) -> String {
    let mut out = breadcrumb_title(state.path());
    out.push_str("\n\n");

    if let Some(banner) = session_banner(state) {
        out.push_str("  ");
        out.push_str(&banner);
        out.push('\n');
    }

    match state.phase() {
        Phase::Loading => {
            out.push_str("  ");
            out.push_str(LOADING_TEXT);
            out.push('\n');
        }

        Phase::Errored(error) => {
            out.push_str(&format!("  Error: {error}\n"));
        }

        Phase::Ready if state.entries().is_empty() => {
            out.push_str("  ");
            out.push_str(EMPTY_FOLDER_TEXT);
            out.push('\n');
        }

        Phase::Ready => {
            let entries = state.entries();
            for index in visible_window(entries.len(), state.cursor(), viewport_height) {
                let marker = if index == state.cursor() { "> " } else { "  " };
                out.push_str(marker);
                out.push_str(&entry_label(&entries[index]));
                out.push('\n');
            }
        }
    }

    out.push('\n');
    out.push_str(&status_line(state));
    out
}
