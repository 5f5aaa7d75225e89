//! src/main.rs
//! Terminal cloud-storage browser: `storage list` and the interactive TUI

use std::{
    io::{self, Stdout},
    panic::PanicHookInfo,
    path::PathBuf,
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::EventStream,
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Frame, Terminal, backend::CrosstermBackend};
use tokio::{signal, sync::Notify};
use tracing::{debug, error, info, warn};

use storage_core::{
    Logger,
    auth::{CredentialProvider, OAuthProvider, StaticTokenProvider},
    backend::{Backend, DriveBackend, LocalBackend, ROOT_FOLDER_ID},
    cli::{self, BackendKind, Cli, Command},
    config::Config,
    controller::{event_loop::EventLoop, keymap},
    model::entry::Breadcrumb,
    service::{ListingService, RetryPolicy},
    view::ui::UIRenderer,
};

type AppTerminal = Terminal<CrosstermBackend<Stdout>>;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path).await,
        None => Config::load().await,
    }
    .context("Failed to load configuration")?;

    let _log_guard = Logger::init(&config.logging).context("Failed to initialize logging")?;
    info!(version = env!("CARGO_PKG_VERSION"), "Starting storage browser");

    let (service, root) = build_service(&cli, &config)
        .await
        .context("Failed to connect to storage backend")?;

    match cli.command() {
        Command::List { folder_id } => {
            let mut stdout = io::stdout().lock();
            let count = cli::run_list(&service, &folder_id, &mut stdout)
                .await
                .with_context(|| format!("Failed to list folder {folder_id}"))?;
            info!(folder_id = %folder_id, count, "Listed folder");
        }

        Command::Tui => {
            setup_panic_handler();

            let app = App::new(service, root).context("Failed to initialize application")?;
            app.run().await.context("Application runtime error")?;
        }
    }

    info!("Application exited cleanly");
    Ok(())
}

/// Pick the backend, authenticate if needed, and wrap it in the listing service.
async fn build_service(cli: &Cli, config: &Config) -> Result<(ListingService, Breadcrumb)> {
    let (backend, root): (Arc<dyn Backend>, Breadcrumb) = match cli.backend {
        BackendKind::Local => {
            let root_dir: PathBuf = match cli.root.clone().or_else(|| config.local.root.clone()) {
                Some(dir) => dir,
                None => std::env::current_dir().context("Failed to get current directory")?,
            };
            let root_dir = tokio::fs::canonicalize(&root_dir)
                .await
                .with_context(|| format!("Local root {} is not accessible", root_dir.display()))?;

            let name = root_dir
                .file_name()
                .map_or_else(|| root_dir.display().to_string(), |n| n.to_string_lossy().into_owned());

            let backend = LocalBackend::new(root_dir, config.local.show_hidden);
            (Arc::new(backend), Breadcrumb::new(ROOT_FOLDER_ID, name))
        }

        BackendKind::Drive => {
            let provider: Arc<dyn CredentialProvider> = match StaticTokenProvider::from_env() {
                Some(provider) => Arc::new(provider),
                None => Arc::new(OAuthProvider::new(&config.auth)?),
            };

            let context = provider.authenticated_context().await?;
            debug!(?context, "Authenticated");

            let backend = DriveBackend::with_credentials(&context, &config.drive, provider)?;
            (
                Arc::new(backend),
                Breadcrumb::new(ROOT_FOLDER_ID, config.drive.root_name.as_str()),
            )
        }
    };

    let service = ListingService::new(backend).with_retry(RetryPolicy::from(&config.retry));
    Ok((service, root))
}

struct App {
    terminal: AppTerminal,
    event_loop: EventLoop,
    ui_renderer: UIRenderer,
    shutdown: Arc<Notify>,
}

impl App {
    fn new(service: ListingService, root: Breadcrumb) -> Result<Self> {
        let terminal = setup_terminal().context("Failed to initialize terminal")?;
        let event_loop = EventLoop::new(service, root);

        Ok(Self {
            terminal,
            event_loop,
            ui_renderer: UIRenderer::new(),
            shutdown: Arc::new(Notify::new()),
        })
    }

    async fn run(mut self) -> Result<()> {
        self.setup_shutdown_handler();
        info!("Starting event loop");

        let size = self.terminal.size().context("Failed to read terminal size")?;
        self.event_loop.set_terminal_height(size.height);

        let mut event_stream: EventStream = EventStream::new();

        loop {
            self.render()?;

            tokio::select! {
                // Shutdown signal
                () = self.shutdown.notified() => {
                    info!("Shutdown signal received");
                    break;
                }

                // Terminal events
                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(terminal_event)) => {
                            if let Some(action) = keymap::map_terminal_event(&terminal_event) {
                                debug!("Dispatching action: {:?}", action);
                                if !self.event_loop.dispatch(action) {
                                    break;
                                }
                            }
                        }
                        Some(Err(e)) => warn!("Terminal event error: {}", e),
                        None => {
                            info!("Terminal event stream closed");
                            break;
                        }
                    }
                }

                // Background task results
                Some(action) = self.event_loop.next_task_action() => {
                    if !self.event_loop.dispatch(action) {
                        break;
                    }
                }
            }
        }

        let stats = self.ui_renderer.stats();
        info!(
            "Event loop terminated cleanly: {} actions, {} frames ({} slow, avg {:.2}ms)",
            self.event_loop.actions_handled(),
            stats.frames,
            stats.slow,
            stats.avg_frame_ms()
        );
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let state = self.event_loop.state();
        let backend = self.event_loop.service().backend_name();
        let renderer = &mut self.ui_renderer;

        self.terminal
            .draw(|frame: &mut Frame<'_>| renderer.render(frame, state, backend))
            .context("Failed to draw terminal")?;

        Ok(())
    }

    fn setup_shutdown_handler(&self) {
        let shutdown: Arc<Notify> = self.shutdown.clone();

        tokio::spawn(async move {
            #[cfg(unix)]
            {
                use tokio::signal::unix::{SignalKind, signal};

                let mut sigterm = match signal(SignalKind::terminate()) {
                    Ok(sigterm) => sigterm,
                    Err(e) => {
                        warn!("Failed to create SIGTERM handler: {}", e);
                        return;
                    }
                };

                tokio::select! {
                    _ = sigterm.recv() => info!("Received SIGTERM"),
                    _ = signal::ctrl_c() => info!("Received Ctrl+C"),
                }
            }

            #[cfg(not(unix))]
            {
                if let Err(e) = signal::ctrl_c().await {
                    warn!("Failed to listen for Ctrl+C: {}", e);
                    return;
                }
                info!("Received Ctrl+C");
            }

            shutdown.notify_one();
        });
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Err(e) = cleanup_terminal(&mut self.terminal) {
            warn!("Failed to cleanup terminal: {}", e);
        }
    }
}

fn setup_terminal() -> Result<AppTerminal> {
    enable_raw_mode().context("Failed to enable raw mode")?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;

    info!("Terminal setup complete");
    Ok(terminal)
}

fn cleanup_terminal(terminal: &mut AppTerminal) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    info!("Terminal cleanup complete");
    Ok(())
}

fn setup_panic_handler() {
    let original_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info: &PanicHookInfo<'_>| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);

        error!("Application panicked: {}", panic_info);
        original_hook(panic_info);
    }));
}
