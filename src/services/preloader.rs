//! Startup cache preload.
//!
//! Streams every row of the record store into the cache, one `put` per row.
//! A failure part way through leaves the rows already loaded in place (each
//! is a complete copy of one committed row) and reports the error; the
//! caller decides whether to serve with the partial cache or abort.

use futures::TryStreamExt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::adapters::cache::TaskCache;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::TaskStore;

const DEFAULT_PRELOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Outcome of a completed preload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreloadReport {
    /// Rows copied into the cache.
    pub loaded: usize,
    pub elapsed: Duration,
}

pub struct Preloader<S: TaskStore> {
    store: Arc<S>,
    cache: Arc<TaskCache>,
    timeout: Duration,
}

impl<S: TaskStore> Preloader<S> {
    pub fn new(store: Arc<S>, cache: Arc<TaskCache>) -> Self {
        Self {
            store,
            cache,
            timeout: DEFAULT_PRELOAD_TIMEOUT,
        }
    }

    /// Bound the whole scan by `timeout`.
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Copy the full table into the cache.
    ///
    /// On success the cache is marked populated. On failure it is marked
    /// not populated, whatever it held before.
    pub async fn run(&self) -> DomainResult<PreloadReport> {
        let started = Instant::now();
        let mut loaded = 0usize;

        let scan = async {
            let mut rows = self.store.stream_all();
            while let Some(task) = rows.try_next().await? {
                self.cache.put(task);
                loaded += 1;
            }
            Ok::<_, DomainError>(())
        };

        let result = match tokio::time::timeout(self.timeout, scan).await {
            Ok(result) => result,
            Err(_) => Err(DomainError::StoreTimeout(self.timeout)),
        };

        match result {
            Ok(()) => {
                self.cache.set_populated(true);
                let report = PreloadReport { loaded, elapsed: started.elapsed() };
                tracing::info!(
                    loaded = report.loaded,
                    cached = self.cache.len(),
                    elapsed_ms = u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
                    "task cache preloaded"
                );
                Ok(report)
            }
            Err(err) => {
                self.cache.set_populated(false);
                tracing::error!(error = %err, loaded, "task cache preload failed");
                Err(err)
            }
        }
    }
}
