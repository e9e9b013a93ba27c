//! Record store port.
//!
//! The store is the source of truth for task records. Writes report the
//! number of affected rows, or the committed row for a partial update, so
//! callers can tell a missing id apart from a failed statement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use crate::domain::errors::DomainResult;
use crate::domain::models::{NewTask, Task, TaskPatch, TaskQuery};

/// Durable storage for task records.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a task and return the identifier the store assigned.
    async fn insert(&self, task: &NewTask) -> DomainResult<i64>;

    /// Fetch one task. Fails with `TaskNotFound` when no row matches.
    async fn find_by_id(&self, id: i64) -> DomainResult<Task>;

    /// Stream every task row by row, without materialising the table.
    fn stream_all(&self) -> BoxStream<'_, DomainResult<Task>>;

    async fn find_all(&self) -> DomainResult<Vec<Task>>;

    async fn find_all_by_status(&self, status: bool) -> DomainResult<Vec<Task>>;

    async fn find_all_by_date_and_status(
        &self,
        date: DateTime<Utc>,
        status: bool,
    ) -> DomainResult<Vec<Task>>;

    /// Replace every field of the task with `task.id`. Returns affected rows.
    async fn update_full(&self, task: &Task) -> DomainResult<u64>;

    /// Write only the supplied fields and return the committed row, read in
    /// the same statement. `None` when no row has `id`.
    async fn update_partial(&self, id: i64, patch: &TaskPatch) -> DomainResult<Option<Task>>;

    /// Returns affected rows.
    async fn delete(&self, id: i64) -> DomainResult<u64>;

    /// Run a list-shaped read. Results are ordered by ascending id.
    async fn find(&self, query: TaskQuery) -> DomainResult<Vec<Task>> {
        match query {
            TaskQuery::All => self.find_all().await,
            TaskQuery::ByStatus(status) => self.find_all_by_status(status).await,
            TaskQuery::ByDateAndStatus { date, status } => {
                self.find_all_by_date_and_status(date, status).await
            }
        }
    }
}
