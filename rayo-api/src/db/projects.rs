//! Project persistence

use anyhow::Result;
use chrono::{DateTime, Utc};
use rayo_common::db::models::{Gender, Project};
use serde_json::Value;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// Insert a new project row
pub async fn insert_project(pool: &SqlitePool, project: &Project) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO projects (
            id, user_id, name, url, brand_name, business_type,
            industries, services, languages, age_groups, locations,
            gender, visitors, cms_config, internal_linking_enabled,
            pinned, is_active, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(project.id.to_string())
    .bind(project.user_id.to_string())
    .bind(&project.name)
    .bind(&project.url)
    .bind(&project.brand_name)
    .bind(&project.business_type)
    .bind(serde_json::to_string(&project.industries)?)
    .bind(serde_json::to_string(&project.services)?)
    .bind(serde_json::to_string(&project.languages)?)
    .bind(serde_json::to_string(&project.age_groups)?)
    .bind(serde_json::to_string(&project.locations)?)
    .bind(project.gender.as_str())
    .bind(project.visitors)
    .bind(
        project
            .cms_config
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?,
    )
    .bind(project.internal_linking_enabled)
    .bind(project.pinned)
    .bind(project.is_active)
    .bind(project.created_at)
    .bind(project.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load one project by id
pub async fn load_project(pool: &SqlitePool, id: Uuid) -> Result<Option<Project>> {
    let row = sqlx::query("SELECT * FROM projects WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.map(row_to_project).transpose()
}

/// List active projects for a user, pinned first then newest first
pub async fn list_projects(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Project>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM projects
        WHERE user_id = ? AND is_active = 1
        ORDER BY pinned DESC, updated_at DESC
        "#,
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(row_to_project).collect()
}

/// Overwrite a project's mutable columns
pub async fn update_project(pool: &SqlitePool, project: &Project) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE projects SET
            name = ?, url = ?, brand_name = ?, business_type = ?,
            industries = ?, services = ?, languages = ?, age_groups = ?,
            locations = ?, gender = ?, visitors = ?, cms_config = ?,
            internal_linking_enabled = ?, pinned = ?, is_active = ?,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&project.name)
    .bind(&project.url)
    .bind(&project.brand_name)
    .bind(&project.business_type)
    .bind(serde_json::to_string(&project.industries)?)
    .bind(serde_json::to_string(&project.services)?)
    .bind(serde_json::to_string(&project.languages)?)
    .bind(serde_json::to_string(&project.age_groups)?)
    .bind(serde_json::to_string(&project.locations)?)
    .bind(project.gender.as_str())
    .bind(project.visitors)
    .bind(
        project
            .cms_config
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?,
    )
    .bind(project.internal_linking_enabled)
    .bind(project.pinned)
    .bind(project.is_active)
    .bind(project.updated_at)
    .bind(project.id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Soft-delete a project
pub async fn soft_delete_project(pool: &SqlitePool, id: Uuid) -> Result<()> {
    sqlx::query("UPDATE projects SET is_active = 0, updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

/// Replace a project's cms_config blob (None clears it)
pub async fn set_cms_config(pool: &SqlitePool, id: Uuid, config: Option<&Value>) -> Result<()> {
    sqlx::query("UPDATE projects SET cms_config = ?, updated_at = ? WHERE id = ?")
        .bind(config.map(serde_json::to_string).transpose()?)
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

fn row_to_project(row: SqliteRow) -> Result<Project> {
    let cms_config: Option<String> = row.try_get("cms_config")?;

    Ok(Project {
        id: Uuid::parse_str(&row.try_get::<String, _>("id")?)?,
        user_id: Uuid::parse_str(&row.try_get::<String, _>("user_id")?)?,
        name: row.try_get("name")?,
        url: row.try_get("url")?,
        brand_name: row.try_get("brand_name")?,
        business_type: row.try_get("business_type")?,
        industries: parse_string_array(&row.try_get::<String, _>("industries")?),
        services: parse_string_array(&row.try_get::<String, _>("services")?),
        languages: parse_string_array(&row.try_get::<String, _>("languages")?),
        age_groups: parse_string_array(&row.try_get::<String, _>("age_groups")?),
        locations: parse_string_array(&row.try_get::<String, _>("locations")?),
        gender: Gender::parse(&row.try_get::<String, _>("gender")?),
        visitors: row.try_get("visitors")?,
        cms_config: cms_config
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok()),
        internal_linking_enabled: row.try_get("internal_linking_enabled")?,
        pinned: row.try_get("pinned")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

fn parse_string_array(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}
