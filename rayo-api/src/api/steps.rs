//! SEO wizard step handlers
//!
//! Each step reads the blog document, generates a new value, appends it to
//! the matching versioned field and records the step in `step_tracking`.
//! Scalar fields (`title`, `category`) append plain values; the richer
//! per-step context (tag, timestamp) lives in the step-tracking entries.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use rayo_common::db::models::BlogRecord;
use rayo_common::time::ist_string;
use rayo_common::versioning::{
    self, latest_primary_keyword, latest_scalar, selected_secondary_keywords, TAG_GENERATED,
    TAG_UPDATED,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::blogs;
use crate::error::{ApiError, ApiResult};
use crate::prompts;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct KeywordSearchRequest {
    pub keyword: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub blog_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SecondaryKeywordsRequest {
    #[serde(default)]
    pub primary_keyword: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// POST /api/projects/:project_id/keywords/search - primary keyword step
///
/// Fetches metrics for one keyword; with `blog_id` the entry is appended to
/// an existing document, otherwise a fresh incomplete draft is created.
pub async fn keyword_search(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
    Json(request): Json<KeywordSearchRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let project = super::load_owned_project(&state, project_id, user).await?;

    let keyword = request.keyword.trim().to_string();
    if keyword.is_empty() {
        return Err(ApiError::BadRequest("Keyword is required".to_string()));
    }
    let country = request.country.unwrap_or_else(|| "in".to_string());

    let metrics = state
        .semrush()?
        .fetch_metrics(&[keyword.clone()], &country)
        .await
        .map_err(|err| ApiError::Upstream(err.to_string()))?;
    let metric = metrics.into_iter().next();

    let mut intent = metric
        .as_ref()
        .map(|m| m.intent.clone())
        .unwrap_or_else(|| "unknown".to_string());
    if intent == "unknown" || intent == "-" {
        if let Ok(openai) = state.openai() {
            let (system, user_msg) = prompts::intent_classification(&keyword);
            if let Ok(answer) = openai.complete(&system, &user_msg).await {
                intent = prompts::parse_intent(&answer);
            }
        }
    }

    let now = Utc::now();
    let tag = if request.blog_id.is_some() {
        TAG_UPDATED
    } else {
        TAG_GENERATED
    };
    let entry = json!({
        "keyword": keyword,
        "search_volume": metric.as_ref().map(|m| m.search_volume).unwrap_or(0),
        "difficulty": metric.as_ref().map(|m| m.difficulty).unwrap_or(0),
        "intent": intent,
        "cpc": metric.as_ref().map(|m| m.cpc).unwrap_or(0.0),
        "competition": metric.as_ref().map(|m| m.competition).unwrap_or(0.0),
        "country": country,
        "tag": tag,
        "generated_at": ist_string(now),
    });

    let blog_id = match request.blog_id {
        Some(blog_id) => {
            let mut blog = super::load_project_blog(&state, project.id, blog_id).await?;
            push_field_version(&mut blog.fields, "primary_keyword", entry.clone());
            record_step(&mut blog.fields, "primary_keyword", tag);
            blogs::update_blog_fields(&state.db, blog.id, &blog.fields, blog.words_count, now)
                .await?;
            blogs::update_blog_targeting(&state.db, blog.id, Some(&country), Some(&intent))
                .await?;
            blog.id
        }
        None => {
            let mut fields = json!({
                "title": ["Untitled Blog"],
                "primary_keyword": [entry.clone()],
            });
            record_step(&mut fields, "primary_keyword", tag);

            let blog = BlogRecord {
                id: Uuid::new_v4(),
                project_id: project.id,
                user_id: user.0,
                status: "incomplete".to_string(),
                source: "rayo".to_string(),
                country: Some(country.clone()),
                intent: Some(intent.clone()),
                words_count: 0,
                is_active: false,
                error_message: None,
                fields,
                created_at: now,
                updated_at: now,
            };
            blogs::insert_blog(&state.db, &blog).await?;
            blog.id
        }
    };

    state.cache.invalidate_user(user.0);
    info!(project_id = %project.id, blog_id = %blog_id, "Primary keyword step completed");

    Ok((
        StatusCode::CREATED,
        Json(json!({"blog_id": blog_id, "keyword": entry})),
    ))
}

/// POST .../blogs/:blog_id/secondary-keywords
pub async fn generate_secondary_keywords(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((project_id, blog_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<SecondaryKeywordsRequest>,
) -> ApiResult<Json<Value>> {
    let project = super::load_owned_project(&state, project_id, user).await?;
    let mut blog = super::load_project_blog(&state, project.id, blog_id).await?;

    let primary = request
        .primary_keyword
        .filter(|kw| !kw.trim().is_empty())
        .unwrap_or_else(|| latest_primary_keyword(&blog.fields["primary_keyword"]));
    if primary.is_empty() {
        return Err(ApiError::BadRequest(
            "No primary keyword on the document".to_string(),
        ));
    }
    let country = request
        .country
        .or_else(|| blog.country.clone())
        .unwrap_or_else(|| "in".to_string());

    let (system, user_msg) = prompts::secondary_keywords(&project, &primary);
    let answer = state
        .openai()?
        .complete(&system, &user_msg)
        .await
        .map_err(|err| ApiError::Upstream(err.to_string()))?;
    let candidates = prompts::parse_keyword_list(&answer);

    let metrics = state
        .semrush()?
        .fetch_metrics(&candidates, &country)
        .await
        .map_err(|err| ApiError::Upstream(err.to_string()))?;

    let keywords: Vec<Value> = candidates
        .iter()
        .map(|candidate| {
            let found = metrics
                .iter()
                .find(|m| m.phrase.eq_ignore_ascii_case(candidate));
            json!({
                "keyword": candidate,
                "search_volume": found.map(|m| m.search_volume).unwrap_or(0),
                "difficulty": found.map(|m| m.difficulty).unwrap_or(0),
                "intent": found.map(|m| m.intent.clone()).unwrap_or_else(|| "unknown".to_string()),
                "selected": "false",
            })
        })
        .collect();

    let now = Utc::now();
    let tag = version_tag(&blog.fields, "secondary_keywords");
    let version = json!({
        "keywords": keywords,
        "tag": tag,
        "generated_at": ist_string(now),
    });
    push_field_version(&mut blog.fields, "secondary_keywords", version);
    record_step(&mut blog.fields, "secondary_keywords", tag);
    blogs::update_blog_fields(&state.db, blog.id, &blog.fields, blog.words_count, now).await?;
    state.cache.invalidate_user(user.0);

    Ok(Json(json!({"blog_id": blog.id, "keywords": keywords})))
}

/// POST .../blogs/:blog_id/category
pub async fn generate_category(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((project_id, blog_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Value>> {
    let project = super::load_owned_project(&state, project_id, user).await?;
    let mut blog = super::load_project_blog(&state, project.id, blog_id).await?;

    let primary = latest_primary_keyword(&blog.fields["primary_keyword"]);
    let (system, user_msg) = prompts::category(&project, &primary);
    let answer = state
        .openai()?
        .complete(&system, &user_msg)
        .await
        .map_err(|err| ApiError::Upstream(err.to_string()))?;
    let category = prompts::parse_single_value(&answer);
    if category.is_empty() {
        return Err(ApiError::Upstream(
            "Model returned no category".to_string(),
        ));
    }

    let now = Utc::now();
    let tag = version_tag(&blog.fields, "category");
    push_field_version(&mut blog.fields, "category", Value::String(category.clone()));
    record_step(&mut blog.fields, "category", tag);
    blogs::update_blog_fields(&state.db, blog.id, &blog.fields, blog.words_count, now).await?;
    state.cache.invalidate_user(user.0);

    Ok(Json(json!({"blog_id": blog.id, "category": category})))
}

/// POST .../blogs/:blog_id/title
pub async fn generate_title(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((project_id, blog_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Value>> {
    let project = super::load_owned_project(&state, project_id, user).await?;
    let mut blog = super::load_project_blog(&state, project.id, blog_id).await?;

    let primary = latest_primary_keyword(&blog.fields["primary_keyword"]);
    if primary.is_empty() {
        return Err(ApiError::BadRequest(
            "No primary keyword on the document".to_string(),
        ));
    }
    let category = latest_scalar(&blog.fields["category"]);
    let intent = blog.intent.clone().unwrap_or_else(|| "unknown".to_string());

    let (system, user_msg) = prompts::title(&primary, &category, &intent);
    let answer = state
        .openai()?
        .complete(&system, &user_msg)
        .await
        .map_err(|err| ApiError::Upstream(err.to_string()))?;
    let title = prompts::parse_single_value(&answer);
    if title.is_empty() {
        return Err(ApiError::Upstream("Model returned no title".to_string()));
    }

    let now = Utc::now();
    let tag = version_tag(&blog.fields, "title");
    push_field_version(&mut blog.fields, "title", Value::String(title.clone()));
    record_step(&mut blog.fields, "title", tag);
    blogs::update_blog_fields(&state.db, blog.id, &blog.fields, blog.words_count, now).await?;
    state.cache.invalidate_user(user.0);

    Ok(Json(json!({"blog_id": blog.id, "title": title})))
}

/// POST .../blogs/:blog_id/outline
pub async fn generate_outline(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((project_id, blog_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Value>> {
    let project = super::load_owned_project(&state, project_id, user).await?;
    let mut blog = super::load_project_blog(&state, project.id, blog_id).await?;

    let title = latest_scalar(&blog.fields["title"]);
    let primary = latest_primary_keyword(&blog.fields["primary_keyword"]);
    let secondary = selected_secondary_keywords(&blog.fields["secondary_keywords"]);

    let (system, user_msg) = prompts::outline(&title, &primary, &secondary);
    let answer = state
        .openai()?
        .complete(&system, &user_msg)
        .await
        .map_err(|err| ApiError::Upstream(err.to_string()))?;
    let sections = prompts::parse_keyword_list(&answer);
    if sections.is_empty() {
        return Err(ApiError::Upstream("Model returned no outline".to_string()));
    }

    let now = Utc::now();
    let tag = version_tag(&blog.fields, "outline");
    let version = json!({
        "outline": sections,
        "tag": tag,
        "generated_at": ist_string(now),
    });
    push_field_version(&mut blog.fields, "outline", version);
    record_step(&mut blog.fields, "outline", tag);
    blogs::update_blog_fields(&state.db, blog.id, &blog.fields, blog.words_count, now).await?;
    state.cache.invalidate_user(user.0);

    Ok(Json(json!({"blog_id": blog.id, "outline": sections})))
}

/// Append an entry to a versioned field, migrating a legacy scalar to the
/// first array element.
fn push_field_version(fields: &mut Value, key: &str, entry: Value) {
    if !fields.is_object() {
        *fields = Value::Object(Default::default());
    }
    let obj = fields.as_object_mut().expect("fields is an object");

    if let Some(Value::Array(items)) = obj.get_mut(key) {
        items.push(entry);
        return;
    }

    let new_value = match obj.get(key) {
        Some(existing) if !existing.is_null() => json!([existing.clone(), entry]),
        _ => json!([entry]),
    };
    obj.insert(key.to_string(), new_value);
}

/// First write to a field is `generated`, later ones `updated`.
fn version_tag(fields: &Value, key: &str) -> &'static str {
    match fields.get(key) {
        Some(Value::Array(items)) if !items.is_empty() => TAG_UPDATED,
        Some(Value::String(_)) => TAG_UPDATED,
        _ => TAG_GENERATED,
    }
}

fn record_step(fields: &mut Value, step: &str, status: &str) {
    if !fields.is_object() {
        *fields = Value::Object(Default::default());
    }
    let obj = fields.as_object_mut().expect("fields is an object");
    let tracking = obj
        .entry("step_tracking".to_string())
        .or_insert_with(versioning::empty_step_tracking);
    versioning::record_step(tracking, step, status, &ist_string(Utc::now()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_field_version_migrates_scalar() {
        let mut fields = json!({"title": "Old Title"});
        push_field_version(&mut fields, "title", Value::String("New Title".into()));
        assert_eq!(fields["title"], json!(["Old Title", "New Title"]));
    }

    #[test]
    fn test_push_field_version_creates_missing() {
        let mut fields = json!({});
        push_field_version(&mut fields, "category", Value::String("Tech".into()));
        assert_eq!(fields["category"], json!(["Tech"]));
    }

    #[test]
    fn test_version_tag_first_write_is_generated() {
        let fields = json!({"category": []});
        assert_eq!(version_tag(&fields, "category"), TAG_GENERATED);
        assert_eq!(version_tag(&fields, "title"), TAG_GENERATED);

        let fields = json!({"category": ["Tech"], "title": "legacy"});
        assert_eq!(version_tag(&fields, "category"), TAG_UPDATED);
        assert_eq!(version_tag(&fields, "title"), TAG_UPDATED);
    }

    #[test]
    fn test_record_step_initializes_tracking() {
        let mut fields = json!({});
        record_step(&mut fields, "category", "generated");
        assert_eq!(fields["step_tracking"]["current_step"], "category");
        assert_eq!(
            fields["step_tracking"]["category"][0]["status"],
            "generated"
        );
    }
}
