//! CMS credential persistence
//!
//! One row per project per CMS. Saving again replaces the stored connection.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rayo_common::db::models::{ShopifyCredentials, WordPressCredentials};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Insert or replace the WordPress connection for a project
pub async fn save_wordpress_credentials(
    pool: &SqlitePool,
    creds: &WordPressCredentials,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO wordpress_credentials (project_id, site_url, username, app_password, created_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(project_id) DO UPDATE SET
            site_url = excluded.site_url,
            username = excluded.username,
            app_password = excluded.app_password
        "#,
    )
    .bind(creds.project_id.to_string())
    .bind(&creds.site_url)
    .bind(&creds.username)
    .bind(&creds.app_password)
    .bind(creds.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_wordpress_credentials(
    pool: &SqlitePool,
    project_id: Uuid,
) -> Result<Option<WordPressCredentials>> {
    let row = sqlx::query("SELECT * FROM wordpress_credentials WHERE project_id = ?")
        .bind(project_id.to_string())
        .fetch_optional(pool)
        .await?;

    row.map(|row| {
        Ok(WordPressCredentials {
            project_id,
            site_url: row.try_get("site_url")?,
            username: row.try_get("username")?,
            app_password: row.try_get("app_password")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    })
    .transpose()
}

pub async fn delete_wordpress_credentials(pool: &SqlitePool, project_id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM wordpress_credentials WHERE project_id = ?")
        .bind(project_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

/// Insert or replace the Shopify connection for a project
pub async fn save_shopify_credentials(
    pool: &SqlitePool,
    creds: &ShopifyCredentials,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO shopify_credentials (project_id, shop_domain, access_token, api_version, created_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(project_id) DO UPDATE SET
            shop_domain = excluded.shop_domain,
            access_token = excluded.access_token,
            api_version = excluded.api_version
        "#,
    )
    .bind(creds.project_id.to_string())
    .bind(&creds.shop_domain)
    .bind(&creds.access_token)
    .bind(&creds.api_version)
    .bind(creds.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_shopify_credentials(
    pool: &SqlitePool,
    project_id: Uuid,
) -> Result<Option<ShopifyCredentials>> {
    let row = sqlx::query("SELECT * FROM shopify_credentials WHERE project_id = ?")
        .bind(project_id.to_string())
        .fetch_optional(pool)
        .await?;

    row.map(|row| {
        Ok(ShopifyCredentials {
            project_id,
            shop_domain: row.try_get("shop_domain")?,
            access_token: row.try_get("access_token")?,
            api_version: row.try_get("api_version")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    })
    .transpose()
}

pub async fn delete_shopify_credentials(pool: &SqlitePool, project_id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM shopify_credentials WHERE project_id = ?")
        .bind(project_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}
