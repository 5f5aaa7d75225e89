//! ``src/model/nav_state.rs``
//! ============================================================================
//! # `NavigationState`: breadcrumb path, cursor and fetch lifecycle
//!
//! Owned by the event loop and mutated only there. Every folder change clears
//! the entries and issues a [`FetchTicket`]; a completion is applied only if it
//! carries the outstanding ticket while the state is loading. Anything else is
//! stale and dropped, which is what keeps fast navigation consistent.

use compact_str::CompactString;

use crate::{
    error::{AppError, ErrorKind},
    model::entry::{Breadcrumb, Entry},
};

/// Identifies one fetch: a monotonic generation plus the folder it targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchTicket {
    generation: u64,
    folder_id: CompactString,
}

impl FetchTicket {
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn folder_id(&self) -> &str {
        &self.folder_id
    }
}

/// Work the event loop must perform after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    Fetch(FetchTicket),
    Quit,
}

/// Observable lifecycle of the displayed folder.
#[derive(Debug, Clone, Copy)]
pub enum Phase<'a> {
    Loading,
    Ready,
    Errored(&'a AppError),
}

// AppError is not PartialEq; errors compare by kind and message.
impl PartialEq for Phase<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Loading, Self::Loading) | (Self::Ready, Self::Ready) => true,
            (Self::Errored(a), Self::Errored(b)) => {
                a.kind() == b.kind() && a.to_string() == b.to_string()
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NavigationState {
    /// Root first, displayed folder last. Never empty.
    path: Vec<Breadcrumb>,

    /// Children of the displayed folder, in backend order.
    entries: Vec<Entry>,

    cursor: usize,

    loading: bool,

    /// Failure of the latest fetch; cleared when a new fetch starts.
    last_error: Option<AppError>,

    /// Auth failure; outlives folder changes until a fetch succeeds.
    session_error: Option<AppError>,

    pending: Option<FetchTicket>,

    next_generation: u64,

    quit: bool,
}

impl NavigationState {
    /// Start at `root` in the loading state, returning the initial fetch.
    #[must_use]
    pub fn new(root: Breadcrumb) -> (Self, FetchTicket) {
        let mut state = Self {
            path: vec![root],
            entries: Vec::new(),
            cursor: 0,
            loading: false,
            last_error: None,
            session_error: None,
            pending: None,
            next_generation: 1,
            quit: false,
        };

        let ticket = state.begin_fetch();
        (state, ticket)
    }

    // ─── Accessors ─────────────────────────────────────────────────────────

    #[must_use]
    pub fn path(&self) -> &[Breadcrumb] {
        &self.path
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub const fn last_error(&self) -> Option<&AppError> {
        self.last_error.as_ref()
    }

    #[must_use]
    pub const fn session_error(&self) -> Option<&AppError> {
        self.session_error.as_ref()
    }

    #[must_use]
    pub const fn pending(&self) -> Option<&FetchTicket> {
        self.pending.as_ref()
    }

    #[must_use]
    pub const fn should_quit(&self) -> bool {
        self.quit
    }

    #[must_use]
    pub fn phase(&self) -> Phase<'_> {
        match (&self.last_error, self.loading) {
            (_, true) => Phase::Loading,
            (Some(e), false) => Phase::Errored(e),
            (None, false) => Phase::Ready,
        }
    }

    /// Folder currently displayed (top of the path).
    #[must_use]
    pub fn current_folder(&self) -> &Breadcrumb {
        // path is never empty: `new` seeds it and `back` keeps the root
        &self.path[self.path.len() - 1]
    }

    #[must_use]
    pub fn selected_entry(&self) -> Option<&Entry> {
        self.entries.get(self.cursor)
    }

    // ─── Cursor movement ───────────────────────────────────────────────────

    pub fn move_cursor_up(&mut self) -> Effect {
        self.cursor = self.cursor.saturating_sub(1);
        Effect::None
    }

    pub fn move_cursor_down(&mut self) -> Effect {
        if self.cursor + 1 < self.entries.len() {
            self.cursor += 1;
        }
        Effect::None
    }

    pub fn page_up(&mut self, rows: usize) -> Effect {
        self.cursor = self.cursor.saturating_sub(rows.max(1));
        Effect::None
    }

    pub fn page_down(&mut self, rows: usize) -> Effect {
        let last = self.entries.len().saturating_sub(1);
        self.cursor = (self.cursor + rows.max(1)).min(last);
        Effect::None
    }

    pub fn select_first(&mut self) -> Effect {
        self.cursor = 0;
        Effect::None
    }

    pub fn select_last(&mut self) -> Effect {
        self.cursor = self.entries.len().saturating_sub(1);
        Effect::None
    }

    // ─── Folder changes ────────────────────────────────────────────────────

    /// Enter the folder under the cursor. Files and empty listings are no-ops.
    pub fn activate(&mut self) -> Effect {
        let Some(entry) = self.selected_entry() else {
            return Effect::None;
        };

        if !entry.is_folder() {
            return Effect::None;
        }

        let crumb = Breadcrumb::from(entry);
        self.path.push(crumb);
        Effect::Fetch(self.begin_fetch())
    }

    /// Return to the parent folder. No-op at the root.
    pub fn back(&mut self) -> Effect {
        if self.path.len() <= 1 {
            return Effect::None;
        }

        self.path.pop();
        Effect::Fetch(self.begin_fetch())
    }

    /// Re-fetch the displayed folder, whatever the current phase.
    pub fn reload(&mut self) -> Effect {
        Effect::Fetch(self.begin_fetch())
    }

    pub fn quit(&mut self) -> Effect {
        self.quit = true;
        self.pending = None;
        Effect::Quit
    }

    fn begin_fetch(&mut self) -> FetchTicket {
        let ticket = FetchTicket {
            generation: self.next_generation,
            folder_id: self.current_folder().id.clone(),
        };
        self.next_generation += 1;

        self.entries.clear();
        self.cursor = 0;
        self.loading = true;
        self.last_error = None;
        self.pending = Some(ticket.clone());

        ticket
    }

    // ─── Fetch completions ─────────────────────────────────────────────────

    fn is_outstanding(&self, ticket: &FetchTicket) -> bool {
        self.loading && self.pending.as_ref() == Some(ticket)
    }

    /// Apply a successful listing. Returns `false` if the result was stale.
    pub fn fetch_succeeded(&mut self, ticket: &FetchTicket, entries: Vec<Entry>) -> bool {
        if !self.is_outstanding(ticket) {
            return false;
        }

        self.entries = entries;
        self.cursor = 0;
        self.loading = false;
        self.pending = None;
        self.session_error = None;
        true
    }

    /// Apply a failed listing. Returns `false` if the result was stale.
    pub fn fetch_failed(&mut self, ticket: &FetchTicket, error: AppError) -> bool {
        if !self.is_outstanding(ticket) {
            return false;
        }

        if error.kind() == ErrorKind::Auth {
            self.session_error = Some(error.clone());
        }

        self.loading = false;
        self.pending = None;
        self.last_error = Some(error);
        true
    }
}
