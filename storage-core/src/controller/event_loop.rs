//! ``src/controller/event_loop.rs``
//! ============================================================================
//! # Event Loop: the single consumer of navigation events
//!
//! Owns the [`NavigationState`]. User actions are dispatched synchronously;
//! listings run on spawned tokio tasks and report back through an unbounded
//! channel, so a slow provider never blocks input. Starting a new fetch aborts
//! the previous task, while the ticket check in the state stays the authority
//! on which result is current.

use std::time::{Duration, Instant};

use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, trace};

use crate::{
    controller::{actions::Action, navigation_dispatcher},
    error::AppError,
    model::{
        entry::{Breadcrumb, Entry},
        nav_state::{Effect, FetchTicket, NavigationState},
    },
    service::ListingService,
    view::text,
};

/// Rows assumed until the first resize event.
const DEFAULT_PAGE_ROWS: usize = 10;

/// Outcome of a background task.
#[derive(Debug, Clone)]
pub enum TaskResult {
    FolderListed {
        ticket: FetchTicket,
        result: Result<Vec<Entry>, AppError>,
        execution_time: Duration,
    },
}

impl From<TaskResult> for Action {
    fn from(task: TaskResult) -> Self {
        match task {
            TaskResult::FolderListed {
                ticket,
                result: Ok(entries),
                ..
            } => Self::FetchSucceeded { ticket, entries },

            TaskResult::FolderListed {
                ticket,
                result: Err(error),
                ..
            } => Self::FetchFailed { ticket, error },
        }
    }
}

pub struct EventLoop {
    state: NavigationState,
    service: ListingService,
    task_tx: mpsc::UnboundedSender<TaskResult>,
    task_rx: mpsc::UnboundedReceiver<TaskResult>,
    in_flight: Option<JoinHandle<()>>,
    page_rows: usize,
    actions_handled: u64,
}

impl EventLoop {
    /// Build the loop and start listing `root`. Must run inside a tokio runtime.
    pub fn new(service: ListingService, root: Breadcrumb) -> Self {
        info!(backend = service.backend_name(), root = %root.id, "Initializing event loop");

        let (task_tx, task_rx) = mpsc::unbounded_channel::<TaskResult>();
        let (state, ticket) = NavigationState::new(root);

        let mut event_loop = Self {
            state,
            service,
            task_tx,
            task_rx,
            in_flight: None,
            page_rows: DEFAULT_PAGE_ROWS,
            actions_handled: 0,
        };

        event_loop.spawn_fetch(ticket);
        event_loop
    }

    #[must_use]
    pub const fn state(&self) -> &NavigationState {
        &self.state
    }

    #[must_use]
    pub const fn service(&self) -> &ListingService {
        &self.service
    }

    #[must_use]
    pub const fn page_rows(&self) -> usize {
        self.page_rows
    }

    #[must_use]
    pub const fn actions_handled(&self) -> u64 {
        self.actions_handled
    }

    pub fn set_terminal_height(&mut self, height: u16) {
        self.page_rows = text::list_rows(height);
    }

    /// Wait for the next background result, already converted to an action.
    pub async fn next_task_action(&mut self) -> Option<Action> {
        let task = self.task_rx.recv().await?;
        trace!("Task result received: {:?}", task);
        Some(Action::from(task))
    }

    /// Apply an action. Returns `false` once the loop should stop.
    pub fn dispatch(&mut self, action: Action) -> bool {
        self.actions_handled += 1;

        if let Action::Resize(_, height) = action {
            self.set_terminal_height(height);
        }

        match navigation_dispatcher::dispatch(&mut self.state, action, self.page_rows) {
            Effect::None => true,

            Effect::Fetch(ticket) => {
                self.spawn_fetch(ticket);
                true
            }

            Effect::Quit => {
                self.abort_in_flight();
                info!("Quit requested after {} actions", self.actions_handled);
                false
            }
        }
    }

    fn abort_in_flight(&mut self) {
        if let Some(handle) = self.in_flight.take()
            && !handle.is_finished()
        {
            handle.abort();
            debug!("Aborted in-flight listing");
        }
    }

    fn spawn_fetch(&mut self, ticket: FetchTicket) {
        self.abort_in_flight();

        let service = self.service.clone();
        let task_tx = self.task_tx.clone();
        debug!(
            folder_id = ticket.folder_id(),
            generation = ticket.generation(),
            "Spawning folder listing"
        );

        self.in_flight = Some(tokio::spawn(async move {
            let start_time = Instant::now();
            let result = service.list_folder(ticket.folder_id()).await;
            let execution_time = start_time.elapsed();

            info!(
                marker = "PERF_FOLDER_LISTING",
                operation_type = "list_folder",
                folder_id = ticket.folder_id(),
                ok = result.is_ok(),
                "Folder listing completed in {:?}",
                execution_time
            );

            // Receiver is gone only during shutdown.
            let _ = task_tx.send(TaskResult::FolderListed {
                ticket,
                result,
                execution_time,
            });
        }));
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        self.abort_in_flight();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Backend;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct StaticBackend;

    #[async_trait]
    impl Backend for StaticBackend {
        fn name(&self) -> &'static str {
            "static"
        }

        async fn list_folder(&self, folder_id: &str) -> Result<Vec<Entry>, AppError> {
            match folder_id {
                "root" => Ok(vec![Entry::drive_folder("f1", "Docs")]),
                _ => Err(AppError::NotFound(folder_id.to_owned())),
            }
        }
    }

    #[tokio::test]
    async fn initial_listing_arrives_through_the_channel() {
        let service = ListingService::new(Arc::new(StaticBackend));
        let mut event_loop = EventLoop::new(service, Breadcrumb::new("root", "My Drive"));
        assert!(event_loop.state().is_loading());

        let action = event_loop.next_task_action().await.unwrap();
        assert!(matches!(action, Action::FetchSucceeded { .. }));
        assert!(event_loop.dispatch(action));

        assert!(!event_loop.state().is_loading());
        assert_eq!(event_loop.state().entries().len(), 1);
    }

    #[tokio::test]
    async fn resize_sets_page_rows_and_quit_stops() {
        let service = ListingService::new(Arc::new(StaticBackend));
        let mut event_loop = EventLoop::new(service, Breadcrumb::new("root", "My Drive"));

        assert_eq!(event_loop.page_rows(), DEFAULT_PAGE_ROWS);
        assert!(event_loop.dispatch(Action::Resize(80, 30)));
        assert_eq!(event_loop.page_rows(), 25);

        assert!(!event_loop.dispatch(Action::Quit));
        assert!(event_loop.state().should_quit());
    }
}
