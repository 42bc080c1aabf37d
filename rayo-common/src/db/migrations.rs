//! Database schema migrations
//!
//! Versioned migrations allow seamless upgrades of existing databases without
//! manual intervention. Migrations are idempotent (safe to run multiple times)
//! and tracked through the schema_version table.
//!
//! Guidelines:
//! 1. Never modify existing migrations - they must remain stable for upgrades
//! 2. Always add new migrations - one function per schema change
//! 3. Prefer ALTER TABLE over DROP/CREATE to preserve data

use crate::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Current schema version
///
/// IMPORTANT: increment this when adding new migrations
const CURRENT_SCHEMA_VERSION: i32 = 3;

/// Get current schema version from database
///
/// Returns 0 if the schema_version table has no rows
async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let version: Option<i32> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_optional(pool)
        .await?
        .flatten();

    Ok(version.unwrap_or(0))
}

async fn record_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current = get_schema_version(pool).await?;

    if current >= CURRENT_SCHEMA_VERSION {
        return Ok(());
    }

    if current < 1 {
        // v1 is the baseline schema created by init; nothing to transform
        record_version(pool, 1).await?;
    }

    if current < 2 {
        migrate_v2_add_pinned_to_projects(pool).await?;
        record_version(pool, 2).await?;
    }

    if current < 3 {
        migrate_v3_add_error_message_to_blogs(pool).await?;
        record_version(pool, 3).await?;
    }

    info!(
        "Database migrated from schema version {} to {}",
        current, CURRENT_SCHEMA_VERSION
    );
    Ok(())
}

/// v2: projects gained a `pinned` flag for list ordering
async fn migrate_v2_add_pinned_to_projects(pool: &SqlitePool) -> Result<()> {
    if !column_exists(pool, "projects", "pinned").await? {
        sqlx::query("ALTER TABLE projects ADD COLUMN pinned INTEGER NOT NULL DEFAULT 0")
            .execute(pool)
            .await?;
        info!("Migration v2: added pinned column to projects");
    }
    Ok(())
}

/// v3: blogs gained an `error_message` column for failed generation runs
async fn migrate_v3_add_error_message_to_blogs(pool: &SqlitePool) -> Result<()> {
    if !column_exists(pool, "blogs", "error_message").await? {
        sqlx::query("ALTER TABLE blogs ADD COLUMN error_message TEXT")
            .execute(pool)
            .await?;
        info!("Migration v3: added error_message column to blogs");
    }
    Ok(())
}

/// Check if a column already exists (idempotency guard)
async fn column_exists(pool: &SqlitePool, table: &str, column: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM pragma_table_info('{}') WHERE name = ?",
        table
    ))
    .bind(column)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}
