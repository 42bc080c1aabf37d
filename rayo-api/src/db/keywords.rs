//! Keyword persistence

use anyhow::Result;
use chrono::{DateTime, Utc};
use rayo_common::db::models::Keyword;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// Insert a keyword row
pub async fn insert_keyword(pool: &SqlitePool, keyword: &Keyword) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO keywords (
            id, project_id, name, search_volume, difficulty, intent,
            cpc, competition, country, active, created_at, last_updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(keyword.id.to_string())
    .bind(keyword.project_id.to_string())
    .bind(&keyword.name)
    .bind(keyword.search_volume)
    .bind(keyword.difficulty)
    .bind(&keyword.intent)
    .bind(keyword.cpc)
    .bind(keyword.competition)
    .bind(&keyword.country)
    .bind(keyword.active)
    .bind(keyword.created_at)
    .bind(keyword.last_updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load one keyword by id
pub async fn load_keyword(pool: &SqlitePool, id: Uuid) -> Result<Option<Keyword>> {
    let row = sqlx::query("SELECT * FROM keywords WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.map(row_to_keyword).transpose()
}

/// List active keywords for a project, highest search volume first
pub async fn list_keywords(pool: &SqlitePool, project_id: Uuid) -> Result<Vec<Keyword>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM keywords
        WHERE project_id = ? AND active = 1
        ORDER BY search_volume DESC, name ASC
        "#,
    )
    .bind(project_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(row_to_keyword).collect()
}

/// Case-insensitive lookup of an active keyword by name within a project
pub async fn find_keyword_by_name(
    pool: &SqlitePool,
    project_id: Uuid,
    name: &str,
) -> Result<Option<Keyword>> {
    let row = sqlx::query(
        r#"
        SELECT * FROM keywords
        WHERE project_id = ? AND active = 1 AND name = ? COLLATE NOCASE
        "#,
    )
    .bind(project_id.to_string())
    .bind(name)
    .fetch_optional(pool)
    .await?;

    row.map(row_to_keyword).transpose()
}

/// Refresh a keyword's SEMrush metrics
pub async fn update_keyword_metrics(pool: &SqlitePool, keyword: &Keyword) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE keywords SET
            search_volume = ?, difficulty = ?, intent = ?,
            cpc = ?, competition = ?, last_updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(keyword.search_volume)
    .bind(keyword.difficulty)
    .bind(&keyword.intent)
    .bind(keyword.cpc)
    .bind(keyword.competition)
    .bind(keyword.last_updated_at)
    .bind(keyword.id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Soft-delete a keyword
pub async fn deactivate_keyword(pool: &SqlitePool, id: Uuid) -> Result<()> {
    sqlx::query("UPDATE keywords SET active = 0, last_updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

fn row_to_keyword(row: SqliteRow) -> Result<Keyword> {
    Ok(Keyword {
        id: Uuid::parse_str(&row.try_get::<String, _>("id")?)?,
        project_id: Uuid::parse_str(&row.try_get::<String, _>("project_id")?)?,
        name: row.try_get("name")?,
        search_volume: row.try_get("search_volume")?,
        difficulty: row.try_get("difficulty")?,
        intent: row.try_get("intent")?,
        cpc: row.try_get("cpc")?,
        competition: row.try_get("competition")?,
        country: row.try_get("country")?,
        active: row.try_get("active")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        last_updated_at: row.try_get::<DateTime<Utc>, _>("last_updated_at")?,
    })
}
