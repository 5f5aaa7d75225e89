//! src/service.rs
//! ============================================================================
//! # ListingService: the façade every front-end talks to
//!
//! Wraps exactly one [`Backend`]. The CLI and the TUI both list folders through
//! it, so retry behaviour and logging are shared. Retries happen here, above the
//! pagination driver, and only for [`ErrorKind::Transient`] failures.

use std::{sync::Arc, time::Duration};

use tracing::{debug, warn};

use crate::{
    backend::Backend,
    config::RetryConfig,
    error::{AppError, ErrorKind},
    model::entry::Entry,
};

/// Longest single backoff sleep.
const MAX_BACKOFF: Duration = Duration::from_secs(8);

/// Exponential backoff for transient listing failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based): base, 2×base, 4×base, …
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor: u32 = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: config.base_delay,
        }
    }
}

#[derive(Clone)]
pub struct ListingService {
    backend: Arc<dyn Backend>,
    retry: Option<RetryPolicy>,
}

impl ListingService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            retry: None,
        }
    }

    #[must_use]
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = (policy.max_attempts > 1).then_some(policy);
        self
    }

    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// List the immediate children of `folder_id`.
    pub async fn list_folder(&self, folder_id: &str) -> Result<Vec<Entry>, AppError> {
        let Some(policy) = self.retry else {
            return self.backend.list_folder(folder_id).await;
        };

        let mut attempt: u32 = 1;
        loop {
            match self.backend.list_folder(folder_id).await {
                Ok(entries) => {
                    if attempt > 1 {
                        debug!(folder_id, attempt, "Listing succeeded after retry");
                    }
                    return Ok(entries);
                }

                Err(e) if e.kind() == ErrorKind::Transient && attempt < policy.max_attempts => {
                    let wait = policy.delay_for(attempt);
                    warn!(
                        folder_id,
                        "Transient listing failure, retrying in {:?} (attempt {}/{}): {}",
                        wait,
                        attempt + 1,
                        policy.max_attempts,
                        e
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }

                Err(e) => return Err(e),
            }
        }
    }
}

impl std::fmt::Debug for ListingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingService")
            .field("backend", &self.backend.name())
            .field("retry", &self.retry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails with `error` for the first `failures` calls.
    struct FlakyBackend {
        failures: u32,
        error: AppError,
        calls: AtomicU32,
    }

    impl FlakyBackend {
        fn new(failures: u32, error: AppError) -> Arc<Self> {
            Arc::new(Self {
                failures,
                error,
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl Backend for FlakyBackend {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn list_folder(&self, _folder_id: &str) -> Result<Vec<Entry>, AppError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(self.error.clone())
            } else {
                Ok(vec![Entry::drive_folder("f1", "Docs")])
            }
        }
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn without_retry_the_first_error_is_returned() {
        let backend = FlakyBackend::new(1, AppError::Transient("reset".into()));
        let service = ListingService::new(backend.clone());

        assert!(service.list_folder("root").await.is_err());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transient_errors_are_retried() {
        let backend = FlakyBackend::new(2, AppError::Transient("503".into()));
        let service = ListingService::new(backend.clone()).with_retry(policy(3));

        let entries = service.list_folder("root").await.unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retries_stop_at_max_attempts() {
        let backend = FlakyBackend::new(10, AppError::Transient("503".into()));
        let service = ListingService::new(backend.clone()).with_retry(policy(3));

        let err = service.list_folder("root").await.unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn auth_and_not_found_are_never_retried() {
        for error in [
            AppError::Auth("expired".into()),
            AppError::NotFound("f9".into()),
            AppError::Provider("garbage".into()),
        ] {
            let backend = FlakyBackend::new(1, error);
            let service = ListingService::new(backend.clone()).with_retry(policy(5));

            assert!(service.list_folder("f9").await.is_err());
            assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_millis(500),
        };

        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_secs(1));
        assert_eq!(policy.delay_for(3), Duration::from_secs(2));
        assert_eq!(policy.delay_for(10), MAX_BACKOFF);
    }
}
