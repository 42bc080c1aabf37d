//! Blog document handlers
//!
//! The `:blog_id` routes accept `?wordpress` / `?shopify` query flags. With a
//! flag present the id is a remote post or article id and the request is
//! proxied to the project's CMS; without one it is a local document id.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use rayo_common::db::models::BlogRecord;
use rayo_common::time::ist_string;
use rayo_common::versioning::{self, append_content_version, serialize_document, word_count};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::{blogs, credentials};
use crate::error::{ApiError, ApiResult};
use crate::services::cms::{detect_cms, CmsKind};
use crate::services::shopify::{ShopifyArticle, ShopifyClient};
use crate::services::wordpress::WordPressClient;
use crate::AppState;

const LATEST_BLOGS_LIMIT: i64 = 10;

/// Envelope columns and derived fields a PUT body may not overwrite
const PROTECTED_KEYS: [&str; 6] = [
    "id",
    "project_id",
    "user_id",
    "created_at",
    "updated_at",
    "words_count",
];

/// Which CMS a request's query flags point at
enum CmsTarget {
    Local,
    WordPress,
    Shopify,
}

fn cms_target(query: &HashMap<String, String>) -> ApiResult<CmsTarget> {
    let wordpress = query.contains_key("wordpress");
    let shopify = query.contains_key("shopify");
    match (wordpress, shopify) {
        (true, true) => Err(ApiError::BadRequest(
            "Specify at most one of ?wordpress or ?shopify".to_string(),
        )),
        (true, false) => Ok(CmsTarget::WordPress),
        (false, true) => Ok(CmsTarget::Shopify),
        (false, false) => Ok(CmsTarget::Local),
    }
}

fn parse_document_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|_| ApiError::BadRequest(format!("Invalid document id: {raw}")))
}

fn parse_remote_id(raw: &str) -> ApiResult<i64> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid CMS post id: {raw}")))
}

/// POST /api/projects/:project_id/blogs - create a draft
pub async fn create_blog(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let project = super::load_owned_project(&state, project_id, user).await?;

    let body = body
        .as_object()
        .ok_or_else(|| ApiError::BadRequest("Request body must be a JSON object".to_string()))?;

    let content = body.get("content").and_then(Value::as_str).unwrap_or("");
    let words_count = body
        .get("words_count")
        .and_then(Value::as_i64)
        .unwrap_or_else(|| word_count(content));

    let mut fields = Map::new();
    if let Some(title) = body.get("title").and_then(Value::as_str) {
        fields.insert("title".to_string(), json!([title]));
    }
    if !content.is_empty() {
        // Stored as a bare string; the first edit migrates it to version form
        fields.insert("content".to_string(), Value::String(content.to_string()));
    }
    for key in ["category", "subcategory", "meta_description", "tags", "metadata"] {
        if let Some(value) = body.get(key) {
            fields.insert(key.to_string(), value.clone());
        }
    }

    let now = Utc::now();
    let blog = BlogRecord {
        id: Uuid::new_v4(),
        project_id: project.id,
        user_id: user.0,
        status: body
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("draft")
            .to_string(),
        source: "rayo".to_string(),
        country: body
            .get("country")
            .and_then(Value::as_str)
            .map(str::to_string),
        intent: body
            .get("intent")
            .and_then(Value::as_str)
            .map(str::to_string),
        words_count,
        is_active: true,
        error_message: None,
        fields: Value::Object(fields),
        created_at: now,
        updated_at: now,
    };
    blogs::insert_blog(&state.db, &blog).await?;
    state.cache.invalidate_user(user.0);

    info!(blog_id = %blog.id, project_id = %project.id, "Created blog");
    Ok((
        StatusCode::CREATED,
        Json(serialize_document(&blog.to_document())),
    ))
}

/// GET /api/projects/:project_id/blogs - list serialized documents
pub async fn list_blogs(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let project = super::load_owned_project(&state, project_id, user).await?;

    let blogs = blogs::list_blogs(&state.db, project.id).await?;
    let payload: Vec<Value> = blogs
        .iter()
        .map(|blog| serialize_document(&blog.to_document()))
        .collect();

    Ok(Json(Value::Array(payload)))
}

/// GET /api/projects/:project_id/blogs/latest - recent documents across the
/// caller's projects, with the wizard's current step attached
pub async fn latest_blogs(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(_project_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    if let Some(cached) = state.cache.get_latest_blogs(user.0) {
        return Ok(Json(cached));
    }

    let blogs = blogs::latest_blogs_for_user(&state.db, user.0, LATEST_BLOGS_LIMIT).await?;
    let payload: Vec<Value> = blogs
        .iter()
        .map(|blog| {
            let mut doc = serialize_document(&blog.to_document());
            let current_step = blog.fields["step_tracking"]["current_step"]
                .as_str()
                .unwrap_or("")
                .to_string();
            if let Some(obj) = doc.as_object_mut() {
                obj.insert("current_step".to_string(), Value::String(current_step));
            }
            doc
        })
        .collect();

    let payload = Value::Array(payload);
    state.cache.put_latest_blogs(user.0, payload.clone());
    Ok(Json(payload))
}

/// GET /api/projects/:project_id/blogs/stats - word-count band counts
pub async fn blog_stats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let project = super::load_owned_project(&state, project_id, user).await?;

    let blogs = blogs::list_blogs(&state.db, project.id).await?;
    let mut short = 0;
    let mut medium = 0;
    let mut long = 0;
    for blog in &blogs {
        match blog.words_count {
            900..=1100 => short += 1,
            1400..=1600 => medium += 1,
            2400..=2600 => long += 1,
            _ => {}
        }
    }

    Ok(Json(json!({
        "total": blogs.len(),
        "short_form": short,
        "medium_form": medium,
        "long_form": long,
    })))
}

/// GET /api/projects/:project_id/blogs/:blog_id
pub async fn get_blog(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((project_id, blog_id)): Path<(Uuid, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    let project = super::load_owned_project(&state, project_id, user).await?;

    match cms_target(&query)? {
        CmsTarget::Local => {
            let blog =
                super::load_project_blog(&state, project.id, parse_document_id(&blog_id)?).await?;
            Ok(Json(serialize_document(&blog.to_document())))
        }
        CmsTarget::WordPress => {
            let client = wordpress_client(&state, project.id, project.cms_config.as_ref()).await?;
            let post = client
                .get_post(parse_remote_id(&blog_id)?)
                .await
                .map_err(|err| ApiError::Upstream(err.to_string()))?;
            Ok(Json(post))
        }
        CmsTarget::Shopify => {
            let client = shopify_client(&state, project.id, project.cms_config.as_ref()).await?;
            let article = locate_shopify_article(&client, parse_remote_id(&blog_id)?).await?;
            Ok(Json(serde_json::to_value(article).map_err(|err| {
                ApiError::Internal(err.to_string())
            })?))
        }
    }
}

/// PUT /api/projects/:project_id/blogs/:blog_id - partial update
pub async fn update_blog(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((project_id, blog_id)): Path<(Uuid, String)>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let project = super::load_owned_project(&state, project_id, user).await?;

    match cms_target(&query)? {
        CmsTarget::Local => {
            update_local_blog(&state, project.id, parse_document_id(&blog_id)?, body, user).await
        }
        CmsTarget::WordPress => {
            let client = wordpress_client(&state, project.id, project.cms_config.as_ref()).await?;
            let post = client
                .update_post(parse_remote_id(&blog_id)?, &body)
                .await
                .map_err(|err| ApiError::Upstream(err.to_string()))?;
            Ok(Json(post))
        }
        CmsTarget::Shopify => {
            let client = shopify_client(&state, project.id, project.cms_config.as_ref()).await?;
            let existing = locate_shopify_article(&client, parse_remote_id(&blog_id)?).await?;
            let article = client
                .update_article(existing.blog_id, existing.id, &body)
                .await
                .map_err(|err| ApiError::Upstream(err.to_string()))?;
            Ok(Json(serde_json::to_value(article).map_err(|err| {
                ApiError::Internal(err.to_string())
            })?))
        }
    }
}

async fn update_local_blog(
    state: &AppState,
    project_id: Uuid,
    blog_id: Uuid,
    body: Value,
    user: AuthUser,
) -> ApiResult<Json<Value>> {
    let mut blog = super::load_project_blog(state, project_id, blog_id).await?;

    let body = body
        .as_object()
        .ok_or_else(|| ApiError::BadRequest("Request body must be a JSON object".to_string()))?;

    let now = Utc::now();
    let mut words_count = blog.words_count;

    for (key, value) in body {
        if PROTECTED_KEYS.contains(&key.as_str()) {
            continue;
        }
        match key.as_str() {
            "content" => {
                let html = value.as_str().ok_or_else(|| {
                    ApiError::BadRequest("content must be a string".to_string())
                })?;
                let existing = blog.fields.get("content");
                let (versions, new_words) = append_content_version(
                    existing,
                    html,
                    &ist_string(blog.created_at),
                    &ist_string(now),
                );
                words_count = new_words;
                set_field(&mut blog.fields, "content", versions);
            }
            "status" => {
                let status = value.as_str().ok_or_else(|| {
                    ApiError::BadRequest("status must be a string".to_string())
                })?;
                blog.status = status.to_string();
                blogs::update_blog_status(&state.db, blog.id, status, None).await?;
            }
            "country" | "intent" => {
                let text = value.as_str().map(str::to_string);
                if key == "country" {
                    blog.country = text;
                } else {
                    blog.intent = text;
                }
                blogs::update_blog_targeting(
                    &state.db,
                    blog.id,
                    blog.country.as_deref(),
                    blog.intent.as_deref(),
                )
                .await?;
            }
            _ => set_field(&mut blog.fields, key, value.clone()),
        }
    }

    blogs::update_blog_fields(&state.db, blog.id, &blog.fields, words_count, now).await?;
    state.cache.invalidate_user(user.0);

    blog.words_count = words_count;
    blog.updated_at = now;
    Ok(Json(serialize_document(&blog.to_document())))
}

/// GET /api/projects/:project_id/blogs/:blog_id/content-versions
pub async fn content_versions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((project_id, blog_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Value>> {
    let project = super::load_owned_project(&state, project_id, user).await?;
    let blog = super::load_project_blog(&state, project.id, blog_id).await?;

    let versions = versioning::content_versions(
        blog.fields.get("content").unwrap_or(&Value::Null),
        &ist_string(blog.created_at),
    );

    Ok(Json(json!({
        "blog_id": blog.id,
        "versions": versions,
    })))
}

/// DELETE /api/projects/:project_id/blogs/:blog_id
pub async fn delete_blog(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((project_id, blog_id)): Path<(Uuid, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    let project = super::load_owned_project(&state, project_id, user).await?;

    match cms_target(&query)? {
        CmsTarget::Local => {
            let blog =
                super::load_project_blog(&state, project.id, parse_document_id(&blog_id)?).await?;
            blogs::soft_delete_blog(&state.db, blog.id).await?;
            state.cache.invalidate_user(user.0);
            info!(blog_id = %blog.id, "Deleted blog");
            Ok(Json(json!({"deleted": true})))
        }
        CmsTarget::WordPress => {
            let client = wordpress_client(&state, project.id, project.cms_config.as_ref()).await?;
            client
                .delete_post(parse_remote_id(&blog_id)?)
                .await
                .map_err(|err| ApiError::Upstream(err.to_string()))?;
            Ok(Json(json!({"deleted": true})))
        }
        CmsTarget::Shopify => {
            let client = shopify_client(&state, project.id, project.cms_config.as_ref()).await?;
            let article = locate_shopify_article(&client, parse_remote_id(&blog_id)?).await?;
            client
                .delete_article(article.blog_id, article.id)
                .await
                .map_err(|err| ApiError::Upstream(err.to_string()))?;
            Ok(Json(json!({"deleted": true})))
        }
    }
}

/// Resolve an article id to its article, scanning every blog in the shop.
/// Shopify articles are only addressable under their blog, and the article
/// may not live in the first one.
async fn locate_shopify_article(
    client: &ShopifyClient,
    article_id: i64,
) -> ApiResult<ShopifyArticle> {
    let shop_blogs = client
        .list_blogs()
        .await
        .map_err(|err| ApiError::Upstream(err.to_string()))?;

    for shop_blog in shop_blogs {
        match client.get_article(shop_blog.id, article_id).await {
            Ok(article) => return Ok(article),
            Err(err) if err.is_not_found() => continue,
            Err(err) => return Err(ApiError::Upstream(err.to_string())),
        }
    }

    Err(ApiError::NotFound(format!(
        "Shopify article {article_id} not found"
    )))
}

fn set_field(fields: &mut Value, key: &str, value: Value) {
    if !fields.is_object() {
        *fields = Value::Object(Default::default());
    }
    if let Some(obj) = fields.as_object_mut() {
        obj.insert(key.to_string(), value);
    }
}

/// Build a WordPress client from stored credentials, after checking that the
/// project's detected CMS actually is WordPress.
pub(crate) async fn wordpress_client(
    state: &AppState,
    project_id: Uuid,
    cms_config: Option<&Value>,
) -> ApiResult<WordPressClient> {
    if detect_cms(cms_config) != CmsKind::WordPress {
        return Err(ApiError::BadRequest(
            "Project is not configured for WordPress".to_string(),
        ));
    }

    let creds = credentials::load_wordpress_credentials(&state.db, project_id)
        .await?
        .ok_or_else(|| {
            ApiError::BadRequest("WordPress credentials not configured".to_string())
        })?;

    WordPressClient::new(&creds.site_url, creds.username, creds.app_password)
        .map_err(|err| ApiError::Internal(err.to_string()))
}

/// Build a Shopify client from stored credentials, after checking the
/// project's detected CMS.
pub(crate) async fn shopify_client(
    state: &AppState,
    project_id: Uuid,
    cms_config: Option<&Value>,
) -> ApiResult<ShopifyClient> {
    if detect_cms(cms_config) != CmsKind::Shopify {
        return Err(ApiError::BadRequest(
            "Project is not configured for Shopify".to_string(),
        ));
    }

    let creds = credentials::load_shopify_credentials(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Shopify credentials not configured".to_string()))?;

    ShopifyClient::new(&creds.shop_domain, creds.access_token, &creds.api_version)
        .map_err(|err| ApiError::Internal(err.to_string()))
}
