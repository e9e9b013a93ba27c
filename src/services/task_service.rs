//! Task service: write-through coordination and cache-first reads.
//!
//! Every write goes to the record store first and is mirrored into the cache
//! only after the store confirms it. Writes run on a detached task so that a
//! caller dropping its future cannot separate a committed store write from
//! its mirror. Store calls are bounded by the request timeout; a timed-out
//! call is reported as [`DomainError::StoreTimeout`] and nothing is mirrored.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::adapters::cache::TaskCache;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{NewTask, Task, TaskPatch, TaskQuery};
use crate::domain::ports::TaskStore;
use crate::services::preloader::{PreloadReport, Preloader};
use crate::services::write_gate::WriteGate;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_PRELOAD_TIMEOUT: Duration = Duration::from_secs(60);

pub struct TaskService<S: TaskStore + 'static> {
    store: Arc<S>,
    cache: Arc<TaskCache>,
    gate: Arc<WriteGate>,
    request_timeout: Duration,
    preload_timeout: Duration,
}

impl<S: TaskStore + 'static> Clone for TaskService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            gate: Arc::clone(&self.gate),
            request_timeout: self.request_timeout,
            preload_timeout: self.preload_timeout,
        }
    }
}

impl<S: TaskStore + 'static> TaskService<S> {
    pub fn new(store: Arc<S>, cache: Arc<TaskCache>) -> Self {
        Self {
            store,
            cache,
            gate: Arc::new(WriteGate::new()),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            preload_timeout: DEFAULT_PRELOAD_TIMEOUT,
        }
    }

    /// Deadline applied to each individual store call.
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub const fn with_preload_timeout(mut self, timeout: Duration) -> Self {
        self.preload_timeout = timeout;
        self
    }

    pub fn cache(&self) -> &Arc<TaskCache> {
        &self.cache
    }

    /// Store a new task and mirror it into the cache under its assigned id.
    pub async fn create(&self, task: NewTask) -> DomainResult<Task> {
        let this = self.clone();
        detached(async move {
            let id = this.bounded("insert", this.store.insert(&task)).await?;
            let created = task.into_task(id);
            this.cache.put(created.clone());
            tracing::info!(task_id = id, "task created");
            Ok(created)
        })
        .await
    }

    /// Replace every field of an existing task.
    ///
    /// The cache entry is overwritten only if the id was already cached.
    pub async fn update(&self, task: Task) -> DomainResult<Task> {
        let this = self.clone();
        detached(async move {
            let _turn = this.gate.lock(task.id).await;
            let affected = this.bounded("update_full", this.store.update_full(&task)).await?;
            if affected == 0 {
                return Err(DomainError::TaskNotFound(task.id));
            }
            let mirrored = this.cache.replace_if_present(&task);
            tracing::info!(task_id = task.id, mirrored, "task updated");
            Ok(task)
        })
        .await
    }

    /// Overwrite only the fields supplied in `patch`.
    ///
    /// A cached entry is merged field by field. For an uncached id the cache
    /// is left alone and the row the store committed is returned.
    pub async fn update_partial(&self, id: i64, patch: TaskPatch) -> DomainResult<Task> {
        if patch.is_empty() {
            return Err(DomainError::ValidationFailed(
                "partial update must supply at least one field".to_string(),
            ));
        }

        let this = self.clone();
        detached(async move {
            let _turn = this.gate.lock(id).await;
            let committed = this
                .bounded("update_partial", this.store.update_partial(id, &patch))
                .await?
                .ok_or(DomainError::TaskNotFound(id))?;
            let merged = this.cache.merge(id, &patch);
            tracing::info!(task_id = id, mirrored = merged.is_some(), "task patched");
            Ok(merged.unwrap_or(committed))
        })
        .await
    }

    pub async fn delete(&self, id: i64) -> DomainResult<()> {
        let this = self.clone();
        detached(async move {
            let _turn = this.gate.lock(id).await;
            let affected = this.bounded("delete", this.store.delete(id)).await?;
            if affected == 0 {
                return Err(DomainError::TaskNotFound(id));
            }
            let mirrored = this.cache.delete(id);
            tracing::info!(task_id = id, mirrored, "task deleted");
            Ok(())
        })
        .await
    }

    /// Cached copy if present, otherwise the store's.
    pub async fn find_by_id(&self, id: i64) -> DomainResult<Task> {
        if let Some(task) = self.cache.get(id) {
            tracing::debug!(task_id = id, source = "cache", "task read");
            return Ok(task);
        }
        let task = self.bounded("find_by_id", self.store.find_by_id(id)).await?;
        tracing::debug!(task_id = id, source = "store", "task read");
        Ok(task)
    }

    /// Answer a list read from the cache when it can, otherwise from the store.
    ///
    /// A non-empty cache result is always returned. An empty one is trusted
    /// only once a full preload has completed; before that the store is asked.
    pub async fn find(&self, query: TaskQuery) -> DomainResult<Vec<Task>> {
        let cached = self.cache.filter(&query);
        if !cached.is_empty() || self.cache.is_populated() {
            tracing::debug!(query = query.as_str(), count = cached.len(), source = "cache", "tasks listed");
            return Ok(cached);
        }
        let tasks = self.bounded(query.as_str(), self.store.find(query)).await?;
        tracing::debug!(query = query.as_str(), count = tasks.len(), source = "store", "tasks listed");
        Ok(tasks)
    }

    pub async fn find_all(&self) -> DomainResult<Vec<Task>> {
        self.find(TaskQuery::All).await
    }

    pub async fn find_by_status(&self, status: bool) -> DomainResult<Vec<Task>> {
        self.find(TaskQuery::ByStatus(status)).await
    }

    pub async fn find_by_date_and_status(
        &self,
        date: DateTime<Utc>,
        status: bool,
    ) -> DomainResult<Vec<Task>> {
        self.find(TaskQuery::ByDateAndStatus { date, status }).await
    }

    /// Fill the cache from a full store scan. Meant to run before requests
    /// are accepted.
    pub async fn preload(&self) -> DomainResult<PreloadReport> {
        Preloader::new(Arc::clone(&self.store), Arc::clone(&self.cache))
            .with_timeout(self.preload_timeout)
            .run()
            .await
    }

    /// Drop every cache entry and preload again.
    ///
    /// While the scan runs the cache is partly filled and not marked
    /// populated, so list reads may return a partial non-empty result.
    /// Writes that land during the scan may be overwritten by the row the
    /// scan read before them. Run this with reads and writes quiesced.
    pub async fn reload_cache(&self) -> DomainResult<PreloadReport> {
        self.cache.clear();
        tracing::info!("task cache cleared for reload");
        self.preload().await
    }

    async fn bounded<T, F>(&self, op: &'static str, call: F) -> DomainResult<T>
    where
        F: Future<Output = DomainResult<T>>,
    {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                if err.is_store_failure() {
                    tracing::warn!(op, error = %err, "store call failed");
                }
                Err(err)
            }
            Err(_) => {
                tracing::warn!(op, timeout_ms = duration_ms(self.request_timeout), "store call timed out");
                Err(DomainError::StoreTimeout(self.request_timeout))
            }
        }
    }
}

/// Run a write to completion on its own task.
async fn detached<T, F>(write: F) -> DomainResult<T>
where
    F: Future<Output = DomainResult<T>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(write)
        .await
        .map_err(|err| DomainError::ExecutionFailed(err.to_string()))?
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
