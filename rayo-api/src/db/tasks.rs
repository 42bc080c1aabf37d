//! Background task persistence
//!
//! Long-running jobs record their lifecycle here so clients can poll for
//! completion instead of holding a request open.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rayo_common::db::models::{BackgroundTask, TaskStatus};
use serde_json::Value;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// Insert a new task row in the pending state
pub async fn insert_task(pool: &SqlitePool, task: &BackgroundTask) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO background_tasks (
            id, kind, project_id, user_id, status, result, error, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(task.id.to_string())
    .bind(&task.kind)
    .bind(task.project_id.map(|id| id.to_string()))
    .bind(task.user_id.to_string())
    .bind(task.status.as_str())
    .bind(task.result.as_ref().map(serde_json::to_string).transpose()?)
    .bind(&task.error)
    .bind(task.created_at)
    .bind(task.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load one task by id
pub async fn load_task(pool: &SqlitePool, id: Uuid) -> Result<Option<BackgroundTask>> {
    let row = sqlx::query("SELECT * FROM background_tasks WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.map(row_to_task).transpose()
}

/// Advance a task's status, optionally recording a result or error
pub async fn update_task_status(
    pool: &SqlitePool,
    id: Uuid,
    status: TaskStatus,
    result: Option<&Value>,
    error: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE background_tasks
        SET status = ?, result = ?, error = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(status.as_str())
    .bind(result.map(serde_json::to_string).transpose()?)
    .bind(error)
    .bind(Utc::now())
    .bind(id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// True if a task of this kind is still pending or running for the project
pub async fn has_active_task(pool: &SqlitePool, project_id: Uuid, kind: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM background_tasks
        WHERE project_id = ? AND kind = ? AND status IN ('pending', 'running')
        "#,
    )
    .bind(project_id.to_string())
    .bind(kind)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

fn row_to_task(row: SqliteRow) -> Result<BackgroundTask> {
    let project_id: Option<String> = row.try_get("project_id")?;
    let result: Option<String> = row.try_get("result")?;

    Ok(BackgroundTask {
        id: Uuid::parse_str(&row.try_get::<String, _>("id")?)?,
        kind: row.try_get("kind")?,
        project_id: project_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()?,
        user_id: Uuid::parse_str(&row.try_get::<String, _>("user_id")?)?,
        status: TaskStatus::parse(&row.try_get::<String, _>("status")?),
        result: result.as_deref().and_then(|raw| serde_json::from_str(raw).ok()),
        error: row.try_get("error")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}
