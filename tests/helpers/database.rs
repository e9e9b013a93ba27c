use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;

use taskcache::{NewTask, SqliteTaskStore, TaskCache, TaskService};

/// Create an in-memory SQLite database for testing
///
/// Creates a fresh in-memory database with migrations applied.
/// Each call creates a completely isolated database instance.
pub async fn setup_test_db() -> SqlitePool {
    taskcache::adapters::sqlite::create_migrated_test_pool()
        .await
        .expect("failed to create test database")
}

/// Teardown test database
pub async fn teardown_test_db(pool: SqlitePool) {
    pool.close().await;
}

/// A service over `pool` with a fresh, cold cache.
pub fn service_for(pool: &SqlitePool) -> TaskService<SqliteTaskStore> {
    TaskService::new(
        Arc::new(SqliteTaskStore::new(pool.clone())),
        Arc::new(TaskCache::new()),
    )
}

pub fn at(timestamp: &str) -> DateTime<Utc> {
    timestamp.parse().expect("valid RFC 3339 timestamp")
}

pub fn sample_task(title: &str) -> NewTask {
    NewTask::new(title, "B", at("2023-09-21T12:00:00Z"))
}
