//! End-to-end navigation through the event loop against in-memory and local
//! backends.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use storage_core::{
    AppError, Backend, ErrorKind, ListingService, RetryPolicy,
    cli,
    controller::{Action, EventLoop},
    model::{Breadcrumb, Entry, Phase},
    view::text,
};

/// Serves canned listings, optionally after a per-folder delay.
#[derive(Default)]
struct FakeBackend {
    listings: HashMap<&'static str, Result<Vec<Entry>, AppError>>,
    delays: HashMap<&'static str, Duration>,
    calls: Mutex<Vec<String>>,
}

impl FakeBackend {
    fn with(mut self, folder_id: &'static str, listing: Result<Vec<Entry>, AppError>) -> Self {
        self.listings.insert(folder_id, listing);
        self
    }

    fn delayed(mut self, folder_id: &'static str, delay: Duration) -> Self {
        self.delays.insert(folder_id, delay);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backend for FakeBackend {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn list_folder(&self, folder_id: &str) -> Result<Vec<Entry>, AppError> {
        self.calls.lock().unwrap().push(folder_id.to_owned());

        if let Some(delay) = self.delays.get(folder_id) {
            tokio::time::sleep(*delay).await;
        }

        self.listings
            .get(folder_id)
            .cloned()
            .unwrap_or_else(|| Err(AppError::NotFound(folder_id.to_owned())))
    }
}

fn root_listing() -> Vec<Entry> {
    vec![
        Entry::drive_folder("f1", "Docs"),
        Entry::drive_folder("f2", "Photos"),
        Entry::drive_file("n1", "notes.txt", "text/plain", 120),
    ]
}

fn root() -> Breadcrumb {
    Breadcrumb::new("root", "My Drive")
}

/// Feed task results back into the loop until nothing is loading.
async fn settle(event_loop: &mut EventLoop) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while event_loop.state().is_loading() {
            let action = event_loop.next_task_action().await.unwrap();
            assert!(event_loop.dispatch(action));
        }
    })
    .await
    .expect("listing did not settle");
}

#[tokio::test]
async fn list_prints_folders_then_files() {
    let backend = FakeBackend::default().with("root", Ok(root_listing()));
    let service = ListingService::new(Arc::new(backend));

    let mut out: Vec<u8> = Vec::new();
    let count = cli::run_list(&service, "root", &mut out).await.unwrap();

    assert_eq!(count, 3);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "📁 Docs\n📁 Photos\n   notes.txt\n"
    );
}

#[tokio::test]
async fn list_auth_failure_is_an_error() {
    let backend = FakeBackend::default().with("root", Err(AppError::Auth("revoked".into())));
    let service = ListingService::new(Arc::new(backend));

    let mut out: Vec<u8> = Vec::new();
    let err = cli::run_list(&service, "root", &mut out).await.unwrap_err();

    assert!(err.is_session_fatal());
    assert!(out.is_empty());
}

#[tokio::test]
async fn activate_folder_loads_its_children() {
    let docs = vec![Entry::drive_file("r1", "report.pdf", "application/pdf", 4096)];
    let backend = Arc::new(
        FakeBackend::default()
            .with("root", Ok(root_listing()))
            .with("f1", Ok(docs)),
    );
    let mut event_loop = EventLoop::new(ListingService::new(backend.clone()), root());

    settle(&mut event_loop).await;
    assert_eq!(event_loop.state().phase(), Phase::Ready);

    assert!(event_loop.dispatch(Action::EnterSelected));
    assert_eq!(event_loop.state().phase(), Phase::Loading);
    assert_eq!(
        event_loop.state().path(),
        [root(), Breadcrumb::new("f1", "Docs")]
    );

    settle(&mut event_loop).await;
    let state = event_loop.state();
    assert_eq!(state.phase(), Phase::Ready);
    assert_eq!(state.cursor(), 0);
    assert_eq!(state.entries()[0].name(), "report.pdf");
    assert_eq!(backend.calls(), ["root", "f1"]);

    let frame = text::render(state, 10);
    assert!(frame.starts_with("storage > My Drive / Docs\n"));
    assert!(frame.contains(">    report.pdf  4.0 KB\n"));
}

#[tokio::test]
async fn auth_failure_keeps_path_and_back_refetches_root() {
    let backend = Arc::new(
        FakeBackend::default()
            .with("root", Ok(root_listing()))
            .with("f1", Err(AppError::Auth("token expired".into()))),
    );
    let mut event_loop = EventLoop::new(ListingService::new(backend.clone()), root());
    settle(&mut event_loop).await;

    event_loop.dispatch(Action::EnterSelected);
    settle(&mut event_loop).await;

    match event_loop.state().phase() {
        Phase::Errored(error) => assert_eq!(error.kind(), ErrorKind::Auth),
        other => panic!("expected an auth error, got {other:?}"),
    }
    assert_eq!(event_loop.state().path().len(), 2);

    event_loop.dispatch(Action::GoToParent);
    assert_eq!(event_loop.state().path(), [root()]);
    settle(&mut event_loop).await;

    assert_eq!(event_loop.state().entries().len(), 3);
    assert_eq!(backend.calls(), ["root", "f1", "root"]);
}

#[tokio::test]
async fn leaving_a_slow_folder_aborts_its_listing() {
    let photos = vec![Entry::drive_file("p1", "beach.jpg", "image/jpeg", 10)];
    let docs = vec![Entry::drive_file("r1", "report.pdf", "application/pdf", 1)];
    let backend = Arc::new(
        FakeBackend::default()
            .with("root", Ok(root_listing()))
            .with("f1", Ok(docs))
            .with("f2", Ok(photos))
            .delayed("f1", Duration::from_millis(300)),
    );
    let mut event_loop = EventLoop::new(ListingService::new(backend), root());
    settle(&mut event_loop).await;

    // Into Docs (slow), straight back, then into Photos.
    event_loop.dispatch(Action::EnterSelected);
    event_loop.dispatch(Action::GoToParent);
    settle(&mut event_loop).await;
    event_loop.dispatch(Action::MoveSelectionDown);
    event_loop.dispatch(Action::EnterSelected);
    settle(&mut event_loop).await;

    // The aborted Docs task never reports back.
    tokio::time::sleep(Duration::from_millis(400)).await;
    let late = tokio::time::timeout(Duration::from_millis(50), event_loop.next_task_action()).await;
    assert!(late.is_err(), "unexpected late result: {late:?}");

    let state = event_loop.state();
    assert_eq!(state.current_folder().name, "Photos");
    assert_eq!(state.entries()[0].name(), "beach.jpg");
}

#[tokio::test]
async fn stale_result_through_the_loop_is_discarded() {
    let photos = vec![Entry::drive_file("p1", "beach.jpg", "image/jpeg", 10)];
    let backend = Arc::new(
        FakeBackend::default()
            .with("root", Ok(root_listing()))
            .with("f2", Ok(photos)),
    );
    let mut event_loop = EventLoop::new(ListingService::new(backend), root());
    settle(&mut event_loop).await;

    // Ticket for Docs, superseded before its result is applied.
    event_loop.dispatch(Action::EnterSelected);
    let docs_ticket = event_loop.state().pending().cloned().unwrap();
    event_loop.dispatch(Action::GoToParent);
    settle(&mut event_loop).await;
    event_loop.dispatch(Action::MoveSelectionDown);
    event_loop.dispatch(Action::EnterSelected);
    settle(&mut event_loop).await;

    assert!(event_loop.dispatch(Action::FetchSucceeded {
        ticket: docs_ticket.clone(),
        entries: vec![Entry::drive_file("r1", "report.pdf", "application/pdf", 1)],
    }));
    assert!(event_loop.dispatch(Action::FetchFailed {
        ticket: docs_ticket,
        error: AppError::Auth("late".into()),
    }));

    let state = event_loop.state();
    assert_eq!(state.phase(), Phase::Ready);
    assert_eq!(state.current_folder().name, "Photos");
    assert_eq!(state.entries().len(), 1);
    assert_eq!(state.entries()[0].name(), "beach.jpg");
    assert!(state.session_error().is_none());
}

#[tokio::test]
async fn transient_failure_recovers_on_reload() {
    struct OnceFailing {
        failed: Mutex<bool>,
    }

    #[async_trait]
    impl Backend for OnceFailing {
        fn name(&self) -> &'static str {
            "once-failing"
        }

        async fn list_folder(&self, _folder_id: &str) -> Result<Vec<Entry>, AppError> {
            let mut failed = self.failed.lock().unwrap();
            if *failed {
                Ok(root_listing())
            } else {
                *failed = true;
                Err(AppError::Transient("connection reset".into()))
            }
        }
    }

    let backend = Arc::new(OnceFailing {
        failed: Mutex::new(false),
    });
    let mut event_loop = EventLoop::new(ListingService::new(backend), root());
    settle(&mut event_loop).await;

    assert!(matches!(event_loop.state().phase(), Phase::Errored(_)));
    assert!(text::render(event_loop.state(), 10).contains("  Error: Temporary failure: connection reset"));

    event_loop.dispatch(Action::ReloadDirectory);
    settle(&mut event_loop).await;
    assert_eq!(event_loop.state().entries().len(), 3);
}

#[tokio::test]
async fn retrying_service_hides_a_single_transient_failure() {
    let backend = Arc::new(
        FakeBackend::default().with("root", Err(AppError::Transient("503".into()))),
    );
    let service = ListingService::new(backend.clone()).with_retry(RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
    });

    let err = service.list_folder("root").await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(backend.calls().len(), 3);
}

#[tokio::test]
async fn local_tree_is_browsable() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir(tmp.path().join("Docs")).unwrap();
    std::fs::write(tmp.path().join("Docs").join("report.pdf"), b"%PDF-1.7").unwrap();
    std::fs::write(tmp.path().join("notes.txt"), b"hello").unwrap();

    let backend = storage_core::backend::LocalBackend::new(tmp.path(), false);
    let mut event_loop = EventLoop::new(ListingService::new(Arc::new(backend)), root());
    settle(&mut event_loop).await;

    let names: Vec<&str> = event_loop.state().entries().iter().map(Entry::name).collect();
    assert_eq!(names, ["Docs", "notes.txt"]);

    event_loop.dispatch(Action::EnterSelected);
    settle(&mut event_loop).await;
    assert_eq!(event_loop.state().entries()[0].name(), "report.pdf");

    event_loop.dispatch(Action::GoToParent);
    settle(&mut event_loop).await;
    assert_eq!(event_loop.state().path().len(), 1);
    assert_eq!(event_loop.state().entries().len(), 2);
}
