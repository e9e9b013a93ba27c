//! SQLite implementation of the TaskStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use futures::StreamExt;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::{format_datetime, parse_datetime};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{FieldUpdate, NewTask, Task, TaskPatch};
use crate::domain::ports::TaskStore;

const SELECT_TASKS: &str = "SELECT id, title, description, date, status FROM tasks";

#[derive(Clone)]
pub struct SqliteTaskStore {
    pool: SqlitePool,
}

impl SqliteTaskStore {
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn into_tasks(rows: Vec<TaskRow>) -> DomainResult<Vec<Task>> {
    rows.into_iter().map(Task::try_from).collect()
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn insert(&self, task: &NewTask) -> DomainResult<i64> {
        let result = sqlx::query(
            "INSERT INTO tasks (title, description, date, status) VALUES (?, ?, ?, ?)"
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(format_datetime(&task.date))
        .bind(task.status)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn find_by_id(&self, id: i64) -> DomainResult<Task> {
        let row: Option<TaskRow> = sqlx::query_as(&format!("{SELECT_TASKS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.ok_or(DomainError::TaskNotFound(id))?.try_into()
    }

    fn stream_all(&self) -> BoxStream<'_, DomainResult<Task>> {
        sqlx::query_as::<_, TaskRow>("SELECT id, title, description, date, status FROM tasks ORDER BY id")
            .fetch(&self.pool)
            .map(|row| row.map_err(DomainError::from).and_then(Task::try_from))
            .boxed()
    }

    async fn find_all(&self) -> DomainResult<Vec<Task>> {
        let rows: Vec<TaskRow> = sqlx::query_as(&format!("{SELECT_TASKS} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        into_tasks(rows)
    }

    async fn find_all_by_status(&self, status: bool) -> DomainResult<Vec<Task>> {
        let rows: Vec<TaskRow> = sqlx::query_as(&format!("{SELECT_TASKS} WHERE status = ? ORDER BY id"))
            .bind(status)
            .fetch_all(&self.pool)
            .await?;
        into_tasks(rows)
    }

    async fn find_all_by_date_and_status(
        &self,
        date: DateTime<Utc>,
        status: bool,
    ) -> DomainResult<Vec<Task>> {
        let rows: Vec<TaskRow> =
            sqlx::query_as(&format!("{SELECT_TASKS} WHERE date = ? AND status = ? ORDER BY id"))
                .bind(format_datetime(&date))
                .bind(status)
                .fetch_all(&self.pool)
                .await?;
        into_tasks(rows)
    }

    async fn update_full(&self, task: &Task) -> DomainResult<u64> {
        let result = sqlx::query(
            "UPDATE tasks SET title = ?, description = ?, date = ?, status = ? WHERE id = ?"
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(format_datetime(&task.date))
        .bind(task.status)
        .bind(task.id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn update_partial(&self, id: i64, patch: &TaskPatch) -> DomainResult<Option<Task>> {
        if patch.is_empty() {
            return Err(DomainError::ValidationFailed(
                "partial update must supply at least one field".to_string(),
            ));
        }

        // Column names come from FieldUpdate::column, values are always bound.
        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE tasks SET ");
        let mut assignments = builder.separated(", ");
        for update in patch.updates() {
            assignments.push(update.column());
            assignments.push_unseparated(" = ");
            match update {
                FieldUpdate::Title(title) => assignments.push_bind_unseparated(title.to_owned()),
                FieldUpdate::Description(description) => {
                    assignments.push_bind_unseparated(description.to_owned())
                }
                FieldUpdate::Date(date) => assignments.push_bind_unseparated(format_datetime(&date)),
                FieldUpdate::Status(status) => assignments.push_bind_unseparated(status),
            };
        }
        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(" RETURNING id, title, description, date, status");

        let row: Option<TaskRow> = builder.build_query_as().fetch_optional(&self.pool).await?;
        row.map(Task::try_from).transpose()
    }

    async fn delete(&self, id: i64) -> DomainResult<u64> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: i64,
    title: String,
    description: String,
    date: String,
    status: bool,
}

impl TryFrom<TaskRow> for Task {
    type Error = DomainError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            description: row.description,
            date: parse_datetime(&row.date)?,
            status: row.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use futures::TryStreamExt;

    async fn setup_test_store() -> SqliteTaskStore {
        let pool = create_migrated_test_pool().await.unwrap();
        SqliteTaskStore::new(pool)
    }

    fn new_task(title: &str) -> NewTask {
        NewTask::new(title, "Description", "2023-09-21T12:00:00Z".parse().unwrap())
    }

    #[tokio::test]
    async fn test_insert_and_find_by_id() {
        let store = setup_test_store().await;

        let id = store.insert(&new_task("Test Task")).await.unwrap();
        let task = store.find_by_id(id).await.unwrap();

        assert_eq!(task.id, id);
        assert_eq!(task.title, "Test Task");
        assert_eq!(task.date, "2023-09-21T12:00:00Z".parse::<DateTime<Utc>>().unwrap());
        assert!(!task.status);
    }

    #[tokio::test]
    async fn test_find_missing_id_is_not_found() {
        let store = setup_test_store().await;
        let err = store.find_by_id(404).await.unwrap_err();
        assert!(matches!(err, DomainError::TaskNotFound(404)));
    }

    #[tokio::test]
    async fn test_sub_second_dates_survive_round_trip() {
        let store = setup_test_store().await;
        let date: DateTime<Utc> = "2024-02-29T08:15:30.123456789Z".parse().unwrap();

        let id = store.insert(&NewTask::new("t", "d", date)).await.unwrap();
        assert_eq!(store.find_by_id(id).await.unwrap().date, date);

        let matching = store.find_all_by_date_and_status(date, false).await.unwrap();
        assert_eq!(matching.len(), 1);
    }

    #[tokio::test]
    async fn test_filters_are_ordered_by_id() {
        let store = setup_test_store().await;
        let a = store.insert(&new_task("a").with_status(true)).await.unwrap();
        let _b = store.insert(&new_task("b")).await.unwrap();
        let c = store.insert(&new_task("c").with_status(true)).await.unwrap();

        let done = store.find_all_by_status(true).await.unwrap();
        assert_eq!(done.iter().map(|t| t.id).collect::<Vec<_>>(), vec![a, c]);
        assert_eq!(store.find_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_update_full_reports_affected_rows() {
        let store = setup_test_store().await;
        let id = store.insert(&new_task("before")).await.unwrap();

        let mut task = store.find_by_id(id).await.unwrap();
        task.title = "after".to_string();
        task.status = true;
        assert_eq!(store.update_full(&task).await.unwrap(), 1);
        assert_eq!(store.find_by_id(id).await.unwrap(), task);

        task.id = id + 100;
        assert_eq!(store.update_full(&task).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_partial_writes_only_supplied_columns() {
        let store = setup_test_store().await;
        let id = store.insert(&new_task("A")).await.unwrap();

        let returned = store
            .update_partial(id, &TaskPatch::default().title("C").status(true))
            .await
            .unwrap()
            .expect("row exists");

        let task = store.find_by_id(id).await.unwrap();
        assert_eq!(returned, task);
        assert_eq!(task.title, "C");
        assert_eq!(task.description, "Description");
        assert!(task.status);

        assert!(store
            .update_partial(id + 1, &TaskPatch::default().title("x"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_partial_rejects_empty_patch() {
        let store = setup_test_store().await;
        let err = store.update_partial(1, &TaskPatch::default()).await.unwrap_err();
        assert!(matches!(err, DomainError::ValidationFailed(_)));
    }

    #[tokio::test]
    async fn test_delete_reports_affected_rows() {
        let store = setup_test_store().await;
        let id = store.insert(&new_task("doomed")).await.unwrap();

        assert_eq!(store.delete(id).await.unwrap(), 1);
        assert_eq!(store.delete(id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_stream_all_yields_every_row() {
        let store = setup_test_store().await;
        for title in ["x", "y", "z"] {
            store.insert(&new_task(title)).await.unwrap();
        }

        let tasks: Vec<Task> = store.stream_all().try_collect().await.unwrap();
        assert_eq!(tasks.iter().map(|t| t.title.as_str()).collect::<Vec<_>>(), vec!["x", "y", "z"]);
    }
}
