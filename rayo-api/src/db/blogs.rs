//! Blog document persistence
//!
//! Each row carries a typed envelope plus a JSON `fields` column holding the
//! semi-structured document body (versioned content, step tracking, metadata).

use anyhow::Result;
use chrono::{DateTime, Utc};
use rayo_common::db::models::BlogRecord;
use serde_json::Value;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// Insert a new blog document row
pub async fn insert_blog(pool: &SqlitePool, blog: &BlogRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO blogs (
            id, project_id, user_id, status, source, country, intent,
            words_count, is_active, error_message, fields, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(blog.id.to_string())
    .bind(blog.project_id.to_string())
    .bind(blog.user_id.to_string())
    .bind(&blog.status)
    .bind(&blog.source)
    .bind(&blog.country)
    .bind(&blog.intent)
    .bind(blog.words_count)
    .bind(blog.is_active)
    .bind(&blog.error_message)
    .bind(serde_json::to_string(&blog.fields)?)
    .bind(blog.created_at)
    .bind(blog.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load one blog by id
pub async fn load_blog(pool: &SqlitePool, id: Uuid) -> Result<Option<BlogRecord>> {
    let row = sqlx::query("SELECT * FROM blogs WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.map(row_to_blog).transpose()
}

/// List active blogs for a project, newest first
pub async fn list_blogs(pool: &SqlitePool, project_id: Uuid) -> Result<Vec<BlogRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM blogs
        WHERE project_id = ? AND is_active = 1
        ORDER BY updated_at DESC
        "#,
    )
    .bind(project_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(row_to_blog).collect()
}

/// Latest active blogs across all of a user's projects
pub async fn latest_blogs_for_user(
    pool: &SqlitePool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<BlogRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM blogs
        WHERE user_id = ? AND is_active = 1
        ORDER BY updated_at DESC
        LIMIT ?
        "#,
    )
    .bind(user_id.to_string())
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(row_to_blog).collect()
}

/// Persist an updated fields blob plus the envelope columns derived from it
pub async fn update_blog_fields(
    pool: &SqlitePool,
    id: Uuid,
    fields: &Value,
    words_count: i64,
    updated_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query("UPDATE blogs SET fields = ?, words_count = ?, updated_at = ? WHERE id = ?")
        .bind(serde_json::to_string(fields)?)
        .bind(words_count)
        .bind(updated_at)
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

/// Update the envelope's country and intent columns
pub async fn update_blog_targeting(
    pool: &SqlitePool,
    id: Uuid,
    country: Option<&str>,
    intent: Option<&str>,
) -> Result<()> {
    sqlx::query("UPDATE blogs SET country = ?, intent = ?, updated_at = ? WHERE id = ?")
        .bind(country)
        .bind(intent)
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

/// Update lifecycle status, clearing or recording an error message
pub async fn update_blog_status(
    pool: &SqlitePool,
    id: Uuid,
    status: &str,
    error_message: Option<&str>,
) -> Result<()> {
    sqlx::query("UPDATE blogs SET status = ?, error_message = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(error_message)
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

/// Soft-delete a blog
pub async fn soft_delete_blog(pool: &SqlitePool, id: Uuid) -> Result<()> {
    sqlx::query("UPDATE blogs SET is_active = 0, updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

fn row_to_blog(row: SqliteRow) -> Result<BlogRecord> {
    let fields: String = row.try_get("fields")?;

    Ok(BlogRecord {
        id: Uuid::parse_str(&row.try_get::<String, _>("id")?)?,
        project_id: Uuid::parse_str(&row.try_get::<String, _>("project_id")?)?,
        user_id: Uuid::parse_str(&row.try_get::<String, _>("user_id")?)?,
        status: row.try_get("status")?,
        source: row.try_get("source")?,
        country: row.try_get("country")?,
        intent: row.try_get("intent")?,
        words_count: row.try_get("words_count")?,
        is_active: row.try_get("is_active")?,
        error_message: row.try_get("error_message")?,
        fields: serde_json::from_str(&fields).unwrap_or(Value::Object(Default::default())),
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}
