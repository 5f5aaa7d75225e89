pub mod error;
pub use error::{AppError, ErrorKind};

pub mod config;

pub mod logging;
pub use logging::Logger;

pub mod auth;

pub mod backend;
pub use backend::{Backend, ROOT_FOLDER_ID};

pub mod service;
pub use service::{ListingService, RetryPolicy};

pub mod cli;

pub mod controller {
    pub mod actions;
    pub use actions::Action;

    pub mod keymap;

    pub mod navigation_dispatcher;

    pub mod event_loop;
    pub use event_loop::{EventLoop, TaskResult};
}

pub mod model {
    pub mod entry;
    pub use entry::{Breadcrumb, Entry};

    pub mod nav_state;
    pub use nav_state::{Effect, FetchTicket, NavigationState, Phase};
}

pub mod util {
    pub mod humanize;

    #[cfg(test)]
    pub(crate) mod test_server;
}

pub mod view {
    pub mod icons;

    pub mod theme;

    pub mod text;

    pub mod ui;

    pub mod components {
        pub mod entry_table;
        pub use entry_table::EntryTable;
        pub mod error_overlay;
        pub use error_overlay::ErrorOverlay;
        pub mod loading_overlay;
        pub use loading_overlay::LoadingOverlay;
        pub mod status_bar;
        pub use status_bar::StatusBar;
    }
}
