//! Integration tests for database initialization and migrations

use rayo_common::db::init::{init_database, init_memory_database};

#[tokio::test]
async fn test_init_creates_all_tables() {
    let pool = init_memory_database().await.expect("init should succeed");

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
    )
    .fetch_all(&pool)
    .await
    .expect("should list tables");

    for expected in [
        "projects",
        "keywords",
        "blogs",
        "background_tasks",
        "wordpress_credentials",
        "shopify_credentials",
        "schema_version",
    ] {
        assert!(
            tables.iter().any(|t| t == expected),
            "missing table {expected}, got {tables:?}"
        );
    }
}

#[tokio::test]
async fn test_init_is_idempotent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("rayo.db");

    let pool = init_database(&db_path).await.expect("first init");
    drop(pool);

    // Re-opening the same file must not fail or duplicate schema rows
    let pool = init_database(&db_path).await.expect("second init");
    let versions: Vec<i32> = sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version")
        .fetch_all(&pool)
        .await
        .expect("versions");
    assert_eq!(versions, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_migrations_are_recorded_once() {
    let pool = init_memory_database().await.expect("init");

    // Running the migration pass again must be a no-op
    rayo_common::db::migrations::run_migrations(&pool)
        .await
        .expect("re-run migrations");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_version")
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(count, 3);
}

#[tokio::test]
async fn test_blogs_table_has_error_message_column() {
    let pool = init_memory_database().await.expect("init");

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info('blogs') WHERE name = 'error_message'",
    )
    .fetch_one(&pool)
    .await
    .expect("pragma");
    assert_eq!(count, 1);
}
