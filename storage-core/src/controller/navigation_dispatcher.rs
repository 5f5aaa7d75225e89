//! src/controller/navigation_dispatcher.rs
//!
//! Applies one [`Action`] to the [`NavigationState`] and reports the resulting
//! [`Effect`]. Fetch outcomes are logged here, at a level chosen by error kind.

use tracing::{debug, error, info, warn};

use crate::{
    controller::actions::Action,
    error::ErrorKind,
    model::nav_state::{Effect, FetchTicket, NavigationState},
};

/// * `page_rows` - rows moved by `PageUp`/`PageDown`.
pub fn dispatch(state: &mut NavigationState, action: Action, page_rows: usize) -> Effect {
    match action {
        Action::MoveSelectionUp => state.move_cursor_up(),
        Action::MoveSelectionDown => state.move_cursor_down(),
        Action::PageUp => state.page_up(page_rows),
        Action::PageDown => state.page_down(page_rows),
        Action::SelectFirst => state.select_first(),
        Action::SelectLast => state.select_last(),

        Action::EnterSelected => state.activate(),
        Action::GoToParent => state.back(),
        Action::ReloadDirectory => state.reload(),

        Action::FetchSucceeded { ticket, entries } => {
            let count = entries.len();
            if state.fetch_succeeded(&ticket, entries) {
                debug!(
                    folder_id = ticket.folder_id(),
                    generation = ticket.generation(),
                    entries = count,
                    "Folder listing applied"
                );
            } else {
                log_stale(&ticket);
            }
            Effect::None
        }

        Action::FetchFailed { ticket, error } => {
            let kind = error.kind();
            let message = error.to_string();

            if state.fetch_failed(&ticket, error) {
                log_failure(&ticket, kind, &message);
            } else {
                log_stale(&ticket);
            }
            Effect::None
        }

        // Viewport bookkeeping lives in the event loop.
        Action::Resize(..) => Effect::None,

        Action::Quit => state.quit(),
    }
}

fn log_stale(ticket: &FetchTicket) {
    debug!(
        folder_id = ticket.folder_id(),
        generation = ticket.generation(),
        "Discarding stale fetch result"
    );
}

fn log_failure(ticket: &FetchTicket, kind: ErrorKind, message: &str) {
    let folder_id = ticket.folder_id();

    match kind {
        ErrorKind::Auth => {
            error!(marker = "AUTH_FAILURE", folder_id, "Session credentials rejected: {message}");
        }
        ErrorKind::NotFound => info!(folder_id, "Folder not found: {message}"),
        ErrorKind::Transient => warn!(folder_id, "Transient listing failure: {message}"),
        ErrorKind::Unknown => {
            error!(marker = "UNEXPECTED_FAILURE", folder_id, "Unexpected listing failure: {message}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::AppError,
        model::entry::{Breadcrumb, Entry},
    };

    #[test]
    fn maps_navigation_actions() {
        let (mut state, ticket) = NavigationState::new(Breadcrumb::new("root", "My Drive"));
        let entries: Vec<Entry> = (0..30)
            .map(|i| Entry::drive_file(format!("f{i}"), format!("file-{i:02}"), "text/plain", 1))
            .collect();

        dispatch(&mut state, Action::FetchSucceeded { ticket, entries }, 10);
        assert!(!state.is_loading());

        dispatch(&mut state, Action::PageDown, 10);
        assert_eq!(state.cursor(), 10);
        dispatch(&mut state, Action::MoveSelectionDown, 10);
        assert_eq!(state.cursor(), 11);
        dispatch(&mut state, Action::SelectLast, 10);
        assert_eq!(state.cursor(), 29);
        dispatch(&mut state, Action::PageUp, 10);
        assert_eq!(state.cursor(), 19);
        dispatch(&mut state, Action::SelectFirst, 10);
        assert_eq!(state.cursor(), 0);

        assert_eq!(dispatch(&mut state, Action::Resize(80, 24), 10), Effect::None);
        assert_eq!(dispatch(&mut state, Action::Quit, 10), Effect::Quit);
    }

    #[test]
    fn failed_fetch_is_recorded() {
        let (mut state, ticket) = NavigationState::new(Breadcrumb::new("root", "My Drive"));

        let error = AppError::Provider("bad json".into());
        dispatch(&mut state, Action::FetchFailed { ticket, error }, 10);

        assert_eq!(
            state.last_error().map(AppError::kind),
            Some(ErrorKind::Unknown)
        );
    }
}
