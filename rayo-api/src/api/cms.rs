//! CMS connection and proxy handlers
//!
//! Credentials are stored only after a live connection test succeeds, and the
//! project's `cms_config` is updated to match. The proxy endpoints forward
//! taxonomy and article listings so the frontend never holds CMS credentials.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use rayo_common::db::models::{ShopifyCredentials, WordPressCredentials};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::{credentials, projects};
use crate::error::{ApiError, ApiResult};
use crate::services::shopify::ShopifyClient;
use crate::services::wordpress::{WordPressClient, POST_STATUSES};
use crate::AppState;

const DEFAULT_SHOPIFY_API_VERSION: &str = "2024-01";

#[derive(Debug, Deserialize)]
pub struct ConnectWordPressRequest {
    pub site_url: String,
    pub username: String,
    pub app_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ConnectShopifyRequest {
    pub shop_domain: String,
    pub access_token: String,
    #[serde(default)]
    pub api_version: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTermRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateShopifyBlogRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateArticleRequest {
    pub title: String,
    pub body_html: String,
    #[serde(default)]
    pub published: bool,
}

/// POST /api/projects/:project_id/cms/wordpress - connect a WordPress site
pub async fn connect_wordpress(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
    Json(request): Json<ConnectWordPressRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let project = super::load_owned_project(&state, project_id, user).await?;

    let client = WordPressClient::new(
        &request.site_url,
        request.username.clone(),
        request.app_password.clone(),
    )
    .map_err(|err| ApiError::Internal(err.to_string()))?;

    client.test_connection().await.map_err(|err| {
        ApiError::BadRequest(format!("WordPress connection test failed: {err}"))
    })?;

    let creds = WordPressCredentials {
        project_id: project.id,
        site_url: request.site_url.trim_end_matches('/').to_string(),
        username: request.username,
        app_password: request.app_password,
        created_at: Utc::now(),
    };
    credentials::save_wordpress_credentials(&state.db, &creds).await?;

    let cms_config = json!({"type": "wordpress", "site_url": creds.site_url});
    projects::set_cms_config(&state.db, project.id, Some(&cms_config)).await?;
    state.cache.invalidate_user(user.0);

    info!(project_id = %project.id, "Connected WordPress");
    Ok((
        StatusCode::CREATED,
        Json(json!({"connected": true, "cms": "wordpress"})),
    ))
}

/// POST /api/projects/:project_id/cms/shopify - connect a Shopify shop
pub async fn connect_shopify(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
    Json(request): Json<ConnectShopifyRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let project = super::load_owned_project(&state, project_id, user).await?;

    let api_version = request
        .api_version
        .unwrap_or_else(|| DEFAULT_SHOPIFY_API_VERSION.to_string());
    let client = ShopifyClient::new(
        &request.shop_domain,
        request.access_token.clone(),
        &api_version,
    )
    .map_err(|err| ApiError::Internal(err.to_string()))?;

    client.test_connection().await.map_err(|err| {
        ApiError::BadRequest(format!("Shopify connection test failed: {err}"))
    })?;

    let creds = ShopifyCredentials {
        project_id: project.id,
        shop_domain: request.shop_domain,
        access_token: request.access_token,
        api_version,
        created_at: Utc::now(),
    };
    credentials::save_shopify_credentials(&state.db, &creds).await?;

    let cms_config = json!({"type": "shopify", "shop_domain": creds.shop_domain});
    projects::set_cms_config(&state.db, project.id, Some(&cms_config)).await?;
    state.cache.invalidate_user(user.0);

    info!(project_id = %project.id, "Connected Shopify");
    Ok((
        StatusCode::CREATED,
        Json(json!({"connected": true, "cms": "shopify"})),
    ))
}

/// DELETE /api/projects/:project_id/cms - remove credentials, clear config
pub async fn disconnect_cms(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let project = super::load_owned_project(&state, project_id, user).await?;

    credentials::delete_wordpress_credentials(&state.db, project.id).await?;
    credentials::delete_shopify_credentials(&state.db, project.id).await?;
    projects::set_cms_config(&state.db, project.id, None).await?;
    state.cache.invalidate_user(user.0);

    info!(project_id = %project.id, "Disconnected CMS");
    Ok(Json(json!({"disconnected": true})))
}

// WordPress proxy

pub async fn wordpress_categories(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let project = super::load_owned_project(&state, project_id, user).await?;
    let client =
        super::blogs::wordpress_client(&state, project.id, project.cms_config.as_ref()).await?;
    let categories = client
        .list_categories()
        .await
        .map_err(|err| ApiError::Upstream(err.to_string()))?;
    Ok(Json(categories))
}

pub async fn wordpress_create_category(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
    Json(request): Json<CreateTermRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let project = super::load_owned_project(&state, project_id, user).await?;
    let client =
        super::blogs::wordpress_client(&state, project.id, project.cms_config.as_ref()).await?;
    let category = client
        .create_category(&request.name)
        .await
        .map_err(|err| ApiError::Upstream(err.to_string()))?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn wordpress_tags(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let project = super::load_owned_project(&state, project_id, user).await?;
    let client =
        super::blogs::wordpress_client(&state, project.id, project.cms_config.as_ref()).await?;
    let tags = client
        .list_tags()
        .await
        .map_err(|err| ApiError::Upstream(err.to_string()))?;
    Ok(Json(tags))
}

pub async fn wordpress_create_tag(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
    Json(request): Json<CreateTermRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let project = super::load_owned_project(&state, project_id, user).await?;
    let client =
        super::blogs::wordpress_client(&state, project.id, project.cms_config.as_ref()).await?;
    let tag = client
        .create_tag(&request.name)
        .await
        .map_err(|err| ApiError::Upstream(err.to_string()))?;
    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn wordpress_authors(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let project = super::load_owned_project(&state, project_id, user).await?;
    let client =
        super::blogs::wordpress_client(&state, project.id, project.cms_config.as_ref()).await?;
    let authors = client
        .list_authors()
        .await
        .map_err(|err| ApiError::Upstream(err.to_string()))?;
    Ok(Json(authors))
}

/// Fixed list; WordPress has no endpoint for these.
pub async fn wordpress_statuses() -> Json<Value> {
    Json(json!(POST_STATUSES))
}

// Shopify proxy

pub async fn shopify_blogs(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let project = super::load_owned_project(&state, project_id, user).await?;
    let client =
        super::blogs::shopify_client(&state, project.id, project.cms_config.as_ref()).await?;
    let blogs = client
        .list_blogs()
        .await
        .map_err(|err| ApiError::Upstream(err.to_string()))?;
    Ok(Json(to_value(blogs)?))
}

pub async fn shopify_create_blog(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
    Json(request): Json<CreateShopifyBlogRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let project = super::load_owned_project(&state, project_id, user).await?;
    let client =
        super::blogs::shopify_client(&state, project.id, project.cms_config.as_ref()).await?;
    let blog = client
        .create_blog(&request.title)
        .await
        .map_err(|err| ApiError::Upstream(err.to_string()))?;
    Ok((StatusCode::CREATED, Json(to_value(blog)?)))
}

pub async fn shopify_articles(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((project_id, shop_blog_id)): Path<(Uuid, i64)>,
) -> ApiResult<Json<Value>> {
    let project = super::load_owned_project(&state, project_id, user).await?;
    let client =
        super::blogs::shopify_client(&state, project.id, project.cms_config.as_ref()).await?;
    let articles = client
        .list_articles(shop_blog_id)
        .await
        .map_err(|err| ApiError::Upstream(err.to_string()))?;
    Ok(Json(to_value(articles)?))
}

pub async fn shopify_create_article(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((project_id, shop_blog_id)): Path<(Uuid, i64)>,
    Json(request): Json<CreateArticleRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let project = super::load_owned_project(&state, project_id, user).await?;
    let client =
        super::blogs::shopify_client(&state, project.id, project.cms_config.as_ref()).await?;
    let article = client
        .create_article(
            shop_blog_id,
            &request.title,
            &request.body_html,
            request.published,
        )
        .await
        .map_err(|err| ApiError::Upstream(err.to_string()))?;
    Ok((StatusCode::CREATED, Json(to_value(article)?)))
}

pub async fn shopify_get_article(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((project_id, shop_blog_id, article_id)): Path<(Uuid, i64, i64)>,
) -> ApiResult<Json<Value>> {
    let project = super::load_owned_project(&state, project_id, user).await?;
    let client =
        super::blogs::shopify_client(&state, project.id, project.cms_config.as_ref()).await?;
    let article = client
        .get_article(shop_blog_id, article_id)
        .await
        .map_err(|err| ApiError::Upstream(err.to_string()))?;
    Ok(Json(to_value(article)?))
}

pub async fn shopify_update_article(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((project_id, shop_blog_id, article_id)): Path<(Uuid, i64, i64)>,
    Json(fields): Json<Value>,
) -> ApiResult<Json<Value>> {
    let project = super::load_owned_project(&state, project_id, user).await?;
    let client =
        super::blogs::shopify_client(&state, project.id, project.cms_config.as_ref()).await?;
    let article = client
        .update_article(shop_blog_id, article_id, &fields)
        .await
        .map_err(|err| ApiError::Upstream(err.to_string()))?;
    Ok(Json(to_value(article)?))
}

pub async fn shopify_delete_article(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((project_id, shop_blog_id, article_id)): Path<(Uuid, i64, i64)>,
) -> ApiResult<Json<Value>> {
    let project = super::load_owned_project(&state, project_id, user).await?;
    let client =
        super::blogs::shopify_client(&state, project.id, project.cms_config.as_ref()).await?;
    client
        .delete_article(shop_blog_id, article_id)
        .await
        .map_err(|err| ApiError::Upstream(err.to_string()))?;
    Ok(Json(json!({"deleted": true})))
}

pub async fn shopify_authors(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let project = super::load_owned_project(&state, project_id, user).await?;
    let client =
        super::blogs::shopify_client(&state, project.id, project.cms_config.as_ref()).await?;
    let authors = client
        .list_authors()
        .await
        .map_err(|err| ApiError::Upstream(err.to_string()))?;
    Ok(Json(json!(authors)))
}

pub async fn shopify_tags(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let project = super::load_owned_project(&state, project_id, user).await?;
    let client =
        super::blogs::shopify_client(&state, project.id, project.cms_config.as_ref()).await?;
    let tags = client
        .list_tags()
        .await
        .map_err(|err| ApiError::Upstream(err.to_string()))?;
    Ok(Json(json!(tags)))
}

fn to_value<T: serde::Serialize>(value: T) -> ApiResult<Value> {
    serde_json::to_value(value).map_err(|err| ApiError::Internal(err.to_string()))
}
