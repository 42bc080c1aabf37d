//! Database initialization
//!
//! Creates the database file and schema on first run so the service starts
//! with zero manual setup. All statements are idempotent; startup re-runs the
//! full pass every time.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    init_schema(&pool).await?;
    Ok(pool)
}

/// Connect to an in-memory database (test support)
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    init_schema(&pool).await?;
    Ok(pool)
}

/// Create schema and run migrations on an open pool
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    // WAL allows concurrent readers with one writer
    sqlx::query("PRAGMA journal_mode = WAL").execute(pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(pool)
        .await?;

    // Idempotent table creation
    create_schema_version_table(pool).await?;
    create_projects_table(pool).await?;
    create_keywords_table(pool).await?;
    create_wordpress_credentials_table(pool).await?;
    create_shopify_credentials_table(pool).await?;
    create_blogs_table(pool).await?;
    create_background_tasks_table(pool).await?;

    // Versioned migrations for schema changes after the baseline
    crate::db::migrations::run_migrations(pool).await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_projects_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            url TEXT NOT NULL,
            brand_name TEXT,
            business_type TEXT,
            industries TEXT NOT NULL DEFAULT '[]',
            services TEXT NOT NULL DEFAULT '[]',
            languages TEXT NOT NULL DEFAULT '[]',
            age_groups TEXT NOT NULL DEFAULT '[]',
            locations TEXT NOT NULL DEFAULT '[]',
            gender TEXT NOT NULL DEFAULT 'all',
            visitors INTEGER NOT NULL DEFAULT 0,
            cms_config TEXT,
            internal_linking_enabled INTEGER NOT NULL DEFAULT 1,
            pinned INTEGER NOT NULL DEFAULT 0,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_projects_user_id ON projects(user_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_projects_updated_at ON projects(updated_at)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_keywords_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS keywords (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            search_volume INTEGER NOT NULL DEFAULT 0,
            difficulty INTEGER NOT NULL DEFAULT 0,
            intent TEXT NOT NULL DEFAULT 'unknown',
            cpc REAL NOT NULL DEFAULT 0.0,
            competition REAL NOT NULL DEFAULT 0.0,
            country TEXT NOT NULL DEFAULT 'in',
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            last_updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_keywords_project_id ON keywords(project_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_wordpress_credentials_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS wordpress_credentials (
            project_id TEXT PRIMARY KEY REFERENCES projects(id) ON DELETE CASCADE,
            site_url TEXT NOT NULL,
            username TEXT NOT NULL,
            app_password TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_shopify_credentials_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS shopify_credentials (
            project_id TEXT PRIMARY KEY REFERENCES projects(id) ON DELETE CASCADE,
            shop_domain TEXT NOT NULL,
            access_token TEXT NOT NULL,
            api_version TEXT NOT NULL DEFAULT '2024-01',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_blogs_table(pool: &SqlitePool) -> Result<()> {
    // Envelope columns are typed; the semi-structured versioned fields
    // (title, content, primary_keyword, step_tracking, ...) live in the
    // `fields` JSON column.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS blogs (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'draft',
            source TEXT NOT NULL DEFAULT 'rayo',
            country TEXT,
            intent TEXT,
            words_count INTEGER NOT NULL DEFAULT 0,
            is_active INTEGER NOT NULL DEFAULT 1,
            fields TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_blogs_project_id ON blogs(project_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_blogs_user_id ON blogs(user_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_background_tasks_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS background_tasks (
            id TEXT PRIMARY KEY,
            kind TEXT NOT NULL,
            project_id TEXT,
            user_id TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            result TEXT,
            error TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
