//! src/controller/actions.rs
//! ============================================================================
//! # Actions: everything the event loop reacts to
//!
//! User input is mapped to an [`Action`] by the keymap; fetch completions come
//! back from spawned tasks and are turned into actions too, so both kinds of
//! event flow through one dispatcher in arrival order.

use crate::{error::AppError, model::entry::Entry, model::nav_state::FetchTicket};

#[derive(Debug, Clone)]
pub enum Action {
    MoveSelectionUp,

    MoveSelectionDown,

    /// Move up one screen.
    PageUp,

    /// Move down one screen.
    PageDown,

    SelectFirst,

    SelectLast,

    /// Open the folder under the cursor.
    EnterSelected,

    GoToParent,

    /// Re-fetch the current folder.
    ReloadDirectory,

    /// Terminal resized to (width, height).
    Resize(u16, u16),

    /// A listing finished.
    FetchSucceeded {
        ticket: FetchTicket,
        entries: Vec<Entry>,
    },

    /// A listing failed.
    FetchFailed { ticket: FetchTicket, error: AppError },

    Quit,
}
