//! Keyword row handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use rayo_common::db::models::Keyword;
use rayo_common::time::ist_string;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::keywords;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NewKeyword {
    pub name: String,
    #[serde(default)]
    pub search_volume: Option<i64>,
    #[serde(default)]
    pub difficulty: Option<i64>,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub cpc: Option<f64>,
    #[serde(default)]
    pub competition: Option<f64>,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddKeywordsRequest {
    pub keywords: Vec<NewKeyword>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveKeywordsRequest {
    pub ids: Vec<Uuid>,
}

/// POST /api/projects/:project_id/keywords - bulk insert
pub async fn add_keywords(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
    Json(request): Json<AddKeywordsRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let project = super::load_owned_project(&state, project_id, user).await?;

    if request.keywords.is_empty() {
        return Err(ApiError::BadRequest(
            "At least one keyword is required".to_string(),
        ));
    }

    let now = Utc::now();
    let mut created = Vec::with_capacity(request.keywords.len());

    for entry in request.keywords {
        let name = entry.name.trim().to_string();
        if name.is_empty() {
            continue;
        }

        // Re-adding an existing keyword refreshes metrics instead of duplicating
        if let Some(mut existing) =
            keywords::find_keyword_by_name(&state.db, project.id, &name).await?
        {
            existing.search_volume = entry.search_volume.unwrap_or(existing.search_volume);
            existing.difficulty = entry.difficulty.unwrap_or(existing.difficulty);
            existing.intent = entry.intent.unwrap_or(existing.intent);
            existing.cpc = entry.cpc.unwrap_or(existing.cpc);
            existing.competition = entry.competition.unwrap_or(existing.competition);
            existing.last_updated_at = now;
            keywords::update_keyword_metrics(&state.db, &existing).await?;
            created.push(existing);
            continue;
        }

        let keyword = Keyword {
            id: Uuid::new_v4(),
            project_id: project.id,
            name,
            search_volume: entry.search_volume.unwrap_or(0),
            difficulty: entry.difficulty.unwrap_or(0),
            intent: entry.intent.unwrap_or_else(|| "unknown".to_string()),
            cpc: entry.cpc.unwrap_or(0.0),
            competition: entry.competition.unwrap_or(0.0),
            country: entry.country.unwrap_or_else(|| "in".to_string()),
            active: true,
            created_at: now,
            last_updated_at: now,
        };
        keywords::insert_keyword(&state.db, &keyword).await?;
        created.push(keyword);
    }

    info!(project_id = %project.id, count = created.len(), "Added keywords");
    Ok((
        StatusCode::CREATED,
        Json(Value::Array(created.iter().map(keyword_payload).collect())),
    ))
}

/// GET /api/projects/:project_id/keywords
pub async fn list_keywords(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let project = super::load_owned_project(&state, project_id, user).await?;

    let keywords = keywords::list_keywords(&state.db, project.id).await?;
    Ok(Json(Value::Array(
        keywords.iter().map(keyword_payload).collect(),
    )))
}

/// DELETE /api/projects/:project_id/keywords - bulk soft-delete by id
pub async fn remove_keywords(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
    Json(request): Json<RemoveKeywordsRequest>,
) -> ApiResult<Json<Value>> {
    let project = super::load_owned_project(&state, project_id, user).await?;

    let mut removed = 0;
    for id in request.ids {
        let keyword = keywords::load_keyword(&state.db, id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Keyword {id} not found")))?;
        if keyword.project_id != project.id {
            return Err(ApiError::Forbidden(
                "Keyword belongs to another project".to_string(),
            ));
        }
        keywords::deactivate_keyword(&state.db, id).await?;
        removed += 1;
    }

    Ok(Json(json!({"removed": removed})))
}

fn keyword_payload(keyword: &Keyword) -> Value {
    json!({
        "id": keyword.id,
        "project_id": keyword.project_id,
        "name": keyword.name,
        "search_volume": keyword.search_volume,
        "difficulty": keyword.difficulty,
        "intent": keyword.intent,
        "cpc": keyword.cpc,
        "competition": keyword.competition,
        "country": keyword.country,
        "created_at": ist_string(keyword.created_at),
        "last_updated_at": ist_string(keyword.last_updated_at),
    })
}
