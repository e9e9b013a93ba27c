//! In-memory TaskStore with fault injection.
//!
//! Behaves like the SQLite store (ids assigned from 1 upwards and never
//! reused, affected-row counts, id-ordered results) and can be told to fail
//! or stall upcoming calls so failure paths can be driven deterministically.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{NewTask, Task, TaskPatch, TaskQuery};
use crate::domain::ports::TaskStore;

/// Injected misbehaviour for upcoming store calls.
#[derive(Debug, Clone, Default)]
struct Faults {
    /// Number of upcoming calls that fail with a database error.
    fail_calls: usize,
    /// Delay applied before every call touches the rows.
    stall: Option<Duration>,
    /// Fail a full scan after this many rows have been yielded.
    fail_scan_after: Option<usize>,
    /// Fail every read call while set. Writes are unaffected.
    fail_reads: bool,
}

#[derive(Debug, Default)]
struct Rows {
    tasks: BTreeMap<i64, Task>,
    last_id: i64,
}

#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    rows: RwLock<Rows>,
    faults: Mutex<Faults>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed rows directly, bypassing counters and faults.
    pub async fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let store = Self::new();
        {
            let mut rows = store.rows.write().await;
            for task in tasks {
                rows.last_id = rows.last_id.max(task.id);
                rows.tasks.insert(task.id, task);
            }
        }
        store
    }

    /// Make the next `n` calls fail with a database error.
    pub async fn fail_next(&self, n: usize) {
        self.faults.lock().await.fail_calls = n;
    }

    /// Delay every call by `delay` before it touches any row.
    pub async fn stall(&self, delay: Option<Duration>) {
        self.faults.lock().await.stall = delay;
    }

    /// Make the next full scan fail after yielding `rows` rows.
    pub async fn fail_scan_after(&self, rows: usize) {
        self.faults.lock().await.fail_scan_after = Some(rows);
    }

    /// Make every read call fail while `on` is set.
    pub async fn fail_reads(&self, on: bool) {
        self.faults.lock().await.fail_reads = on;
    }

    /// Number of read calls served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of write calls received so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Current committed copy of a row, bypassing counters and faults.
    pub async fn snapshot(&self, id: i64) -> Option<Task> {
        self.rows.read().await.tasks.get(&id).cloned()
    }

    async fn enter(&self, counter: &AtomicUsize) -> DomainResult<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        let stall = {
            let mut faults = self.faults.lock().await;
            if faults.fail_calls > 0 {
                faults.fail_calls -= 1;
                return Err(DomainError::DatabaseError("injected store failure".to_string()));
            }
            faults.stall
        };
        if let Some(delay) = stall {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    async fn enter_read(&self) -> DomainResult<()> {
        self.enter(&self.reads).await?;
        if self.faults.lock().await.fail_reads {
            return Err(DomainError::DatabaseError("injected read failure".to_string()));
        }
        Ok(())
    }

    async fn select(&self, query: TaskQuery) -> DomainResult<Vec<Task>> {
        self.enter_read().await?;
        let rows = self.rows.read().await;
        Ok(rows.tasks.values().filter(|t| query.matches(t)).cloned().collect())
    }

    async fn scan(&self) -> Vec<DomainResult<Task>> {
        if let Err(err) = self.enter_read().await {
            return vec![Err(err)];
        }
        let fail_after = self.faults.lock().await.fail_scan_after.take();
        let rows = self.rows.read().await;

        let mut out: Vec<DomainResult<Task>> = rows.tasks.values().cloned().map(Ok).collect();
        if let Some(n) = fail_after {
            out.truncate(n);
            out.push(Err(DomainError::DatabaseError("injected scan failure".to_string())));
        }
        out
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn insert(&self, task: &NewTask) -> DomainResult<i64> {
        self.enter(&self.writes).await?;
        let mut rows = self.rows.write().await;
        rows.last_id += 1;
        let id = rows.last_id;
        rows.tasks.insert(id, task.clone().into_task(id));
        Ok(id)
    }

    async fn find_by_id(&self, id: i64) -> DomainResult<Task> {
        self.enter_read().await?;
        self.rows.read().await.tasks.get(&id).cloned().ok_or(DomainError::TaskNotFound(id))
    }

    fn stream_all(&self) -> BoxStream<'_, DomainResult<Task>> {
        stream::once(self.scan()).flat_map(stream::iter).boxed()
    }

    async fn find_all(&self) -> DomainResult<Vec<Task>> {
        self.select(TaskQuery::All).await
    }

    async fn find_all_by_status(&self, status: bool) -> DomainResult<Vec<Task>> {
        self.select(TaskQuery::ByStatus(status)).await
    }

    async fn find_all_by_date_and_status(
        &self,
        date: DateTime<Utc>,
        status: bool,
    ) -> DomainResult<Vec<Task>> {
        self.select(TaskQuery::ByDateAndStatus { date, status }).await
    }

    async fn update_full(&self, task: &Task) -> DomainResult<u64> {
        self.enter(&self.writes).await?;
        let mut rows = self.rows.write().await;
        Ok(rows.tasks.get_mut(&task.id).map_or(0, |row| {
            row.clone_from(task);
            1
        }))
    }

    async fn update_partial(&self, id: i64, patch: &TaskPatch) -> DomainResult<Option<Task>> {
        if patch.is_empty() {
            return Err(DomainError::ValidationFailed(
                "partial update must supply at least one field".to_string(),
            ));
        }
        self.enter(&self.writes).await?;
        let mut rows = self.rows.write().await;
        Ok(rows.tasks.get_mut(&id).map(|row| {
            patch.apply_to(row);
            row.clone()
        }))
    }

    async fn delete(&self, id: i64) -> DomainResult<u64> {
        self.enter(&self.writes).await?;
        let mut rows = self.rows.write().await;
        Ok(u64::from(rows.tasks.remove(&id).is_some()))
    }
}
