//! Keyword-suggestion job handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use rayo_common::db::models::{BackgroundTask, TaskStatus};
use rayo_common::time::ist_string;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::tasks;
use crate::error::{ApiError, ApiResult};
use crate::jobs;
use crate::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct SuggestionsRequest {
    /// SEMrush country database; project locations stay prompt-only
    #[serde(default)]
    pub country: Option<String>,
}

/// Country database for a suggestions run, defaulting to India.
fn requested_country(request: Option<&SuggestionsRequest>) -> String {
    request
        .and_then(|r| r.country.as_deref())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or("in")
        .to_lowercase()
}

/// POST /api/projects/:project_id/keyword-suggestions - start the job
pub async fn start_keyword_suggestions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
    body: Option<Json<SuggestionsRequest>>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let project = super::load_owned_project(&state, project_id, user).await?;

    // Generation is expensive; one run per project at a time
    if tasks::has_active_task(&state.db, project.id, jobs::KIND_KEYWORD_SUGGESTIONS).await? {
        return Err(ApiError::Conflict(
            "Keyword suggestions already running for this project".to_string(),
        ));
    }

    // Fail fast before spawning when a required client is missing
    state.openai()?;
    state.semrush()?;

    let now = Utc::now();
    let task = BackgroundTask {
        id: Uuid::new_v4(),
        kind: jobs::KIND_KEYWORD_SUGGESTIONS.to_string(),
        project_id: Some(project.id),
        user_id: user.0,
        status: TaskStatus::Pending,
        result: None,
        error: None,
        created_at: now,
        updated_at: now,
    };
    tasks::insert_task(&state.db, &task).await?;

    let country = requested_country(body.as_ref().map(|Json(r)| r));
    info!(
        task_id = %task.id,
        project_id = %project.id,
        country = %country,
        "Starting keyword suggestions"
    );
    jobs::spawn_keyword_suggestions(state.clone(), task.id, project, country);

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({"task_id": task.id, "status": "pending"})),
    ))
}

/// GET /api/tasks/:task_id - poll a background job
pub async fn get_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let task = tasks::load_task(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Task {task_id} not found")))?;

    if task.user_id != user.0 {
        return Err(ApiError::Forbidden(
            "Task belongs to another user".to_string(),
        ));
    }

    Ok(Json(json!({
        "id": task.id,
        "kind": task.kind,
        "project_id": task.project_id,
        "status": task.status,
        "result": task.result,
        "error": task.error,
        "created_at": ist_string(task.created_at),
        "updated_at": ist_string(task.updated_at),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requested_country_defaults_to_in() {
        assert_eq!(requested_country(None), "in");
        assert_eq!(requested_country(Some(&SuggestionsRequest::default())), "in");
        let request = SuggestionsRequest {
            country: Some("  ".to_string()),
        };
        assert_eq!(requested_country(Some(&request)), "in");
    }

    #[test]
    fn test_requested_country_lowercases_code() {
        let request = SuggestionsRequest {
            country: Some("US".to_string()),
        };
        assert_eq!(requested_country(Some(&request)), "us");
    }
}
