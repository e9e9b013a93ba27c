mod helpers;

use taskcache::domain::ports::TaskStore;
use taskcache::{DomainError, NewTask, SqliteTaskStore, Task, TaskPatch, TaskQuery};

use helpers::database::{at, sample_task, service_for, setup_test_db, teardown_test_db};

#[tokio::test]
async fn test_create_is_committed_and_cached() {
    let pool = setup_test_db().await;
    let service = service_for(&pool);

    let created = service.create(sample_task("A")).await.expect("create");

    let store = SqliteTaskStore::new(pool.clone());
    assert_eq!(store.find_by_id(created.id).await.unwrap(), created);
    assert_eq!(service.cache().get(created.id), Some(created.clone()));
    assert_eq!(service.find_by_id(created.id).await.unwrap(), created);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_partial_update_persists_only_supplied_fields() {
    let pool = setup_test_db().await;
    let service = service_for(&pool);
    let created = service.create(sample_task("A")).await.unwrap();

    let patched = service
        .update_partial(created.id, TaskPatch::default().title("C"))
        .await
        .unwrap();

    let expected = Task { title: "C".to_string(), ..created };
    assert_eq!(patched, expected);

    // A second service with a cold cache reads straight from the database.
    let cold = service_for(&pool);
    assert_eq!(cold.find_by_id(expected.id).await.unwrap(), expected);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_delete_removes_row_and_entry() {
    let pool = setup_test_db().await;
    let service = service_for(&pool);
    let created = service.create(sample_task("A")).await.unwrap();

    service.delete(created.id).await.unwrap();

    assert!(!service.cache().contains(created.id));
    let err = service.find_by_id(created.id).await.unwrap_err();
    assert!(matches!(err, DomainError::TaskNotFound(id) if id == created.id));
    assert!(service.delete(created.id).await.unwrap_err().is_not_found());

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_preload_serves_existing_rows_from_cache() {
    let pool = setup_test_db().await;
    let writer = service_for(&pool);
    let mut expected = Vec::new();
    for title in ["first", "second", "third"] {
        expected.push(writer.create(sample_task(title)).await.unwrap());
    }

    let service = service_for(&pool);
    let report = service.preload().await.unwrap();

    assert_eq!(report.loaded, 3);
    assert!(service.cache().is_populated());
    assert_eq!(service.cache().filter(&TaskQuery::All), expected);

    // Rows deleted behind the cache's back are still served: the cache is
    // authoritative for reads once populated.
    sqlx::query("DELETE FROM tasks").execute(&pool).await.unwrap();
    assert_eq!(service.find_all().await.unwrap(), expected);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_populated_cache_answers_empty_results() {
    let pool = setup_test_db().await;
    let service = service_for(&pool);
    service.preload().await.unwrap();

    sqlx::query("INSERT INTO tasks (title, description, date, status) VALUES ('hidden', '', ?, 1)")
        .bind("2023-09-21T12:00:00.000000000Z")
        .execute(&pool)
        .await
        .unwrap();

    assert!(service.find_by_status(true).await.unwrap().is_empty());
    // By-id misses still reach the store.
    assert_eq!(service.find_by_id(1).await.unwrap().title, "hidden");

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_cold_cache_falls_back_to_store_for_lists() {
    let pool = setup_test_db().await;
    let writer = service_for(&pool);
    let open = writer.create(sample_task("open")).await.unwrap();
    let done = writer
        .create(sample_task("done").with_status(true))
        .await
        .unwrap();

    let service = service_for(&pool);
    assert_eq!(service.find_all().await.unwrap(), vec![open.clone(), done.clone()]);
    assert_eq!(service.find_by_status(true).await.unwrap(), vec![done]);
    assert_eq!(
        service
            .find_by_date_and_status(at("2023-09-21T12:00:00Z"), false)
            .await
            .unwrap(),
        vec![open]
    );
    assert!(service.cache().is_empty());

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_date_filter_matches_subsecond_timestamps() {
    let pool = setup_test_db().await;
    let writer = service_for(&pool);
    let precise = at("2023-09-21T12:00:00.123456789Z");
    let created = writer
        .create(NewTask::new("precise", "", precise).with_status(true))
        .await
        .unwrap();

    let cold = service_for(&pool);
    assert_eq!(
        cold.find_by_date_and_status(precise, true).await.unwrap(),
        vec![created.clone()]
    );

    cold.preload().await.unwrap();
    assert_eq!(cold.find_by_date_and_status(precise, true).await.unwrap(), vec![created]);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_full_update_of_uncached_row_is_not_mirrored() {
    let pool = setup_test_db().await;
    let created = service_for(&pool).create(sample_task("A")).await.unwrap();
    let service = service_for(&pool);

    let replacement = Task {
        title: "Z".to_string(),
        description: String::new(),
        status: true,
        ..created
    };
    let returned = service.update(replacement.clone()).await.unwrap();

    assert_eq!(returned, replacement);
    assert!(service.cache().is_empty());
    assert_eq!(service.find_by_id(replacement.id).await.unwrap(), replacement);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_partial_update_of_uncached_row_returns_committed_row() {
    let pool = setup_test_db().await;
    let created = service_for(&pool).create(sample_task("A")).await.unwrap();
    let service = service_for(&pool);

    let patched = service
        .update_partial(created.id, TaskPatch::default().status(true))
        .await
        .unwrap();

    assert_eq!(patched, Task { status: true, ..created });
    assert!(service.cache().is_empty());
    let err = service
        .update_partial(created.id + 1, TaskPatch::default().status(true))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_concurrent_patches_to_one_row_keep_both_fields() {
    let pool = setup_test_db().await;
    let service = service_for(&pool);
    let id = service.create(sample_task("A")).await.unwrap().id;

    let patches = [
        TaskPatch::default().title("T"),
        TaskPatch::default().status(true),
        TaskPatch::default().description("D"),
    ];
    let handles: Vec<_> = patches
        .into_iter()
        .map(|patch| {
            let service = service.clone();
            tokio::spawn(async move { service.update_partial(id, patch).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let cached = service.cache().get(id).unwrap();
    let stored = service_for(&pool).find_by_id(id).await.unwrap();
    assert_eq!(cached, stored);
    assert_eq!(cached.title, "T");
    assert_eq!(cached.description, "D");
    assert!(cached.status);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_closed_pool_surfaces_store_error_without_mirroring() {
    let pool = setup_test_db().await;
    let service = service_for(&pool);
    let created = service.create(sample_task("A")).await.unwrap();
    pool.close().await;

    let err = service
        .update_partial(created.id, TaskPatch::default().title("lost"))
        .await
        .unwrap_err();

    assert!(err.is_store_failure());
    assert_eq!(service.cache().get(created.id), Some(created));
}
