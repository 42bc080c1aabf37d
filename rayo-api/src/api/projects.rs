//! Project CRUD handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use rayo_common::db::models::{Gender, Project};
use rayo_common::time::ist_string;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::projects;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub business_type: Option<String>,
    #[serde(default)]
    pub industries: Vec<String>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub age_groups: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub visitors: Option<i64>,
    #[serde(default)]
    pub cms_config: Option<Value>,
    #[serde(default)]
    pub internal_linking_enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub business_type: Option<String>,
    #[serde(default)]
    pub industries: Option<Vec<String>>,
    #[serde(default)]
    pub services: Option<Vec<String>>,
    #[serde(default)]
    pub languages: Option<Vec<String>>,
    #[serde(default)]
    pub age_groups: Option<Vec<String>>,
    #[serde(default)]
    pub locations: Option<Vec<String>>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub visitors: Option<i64>,
    #[serde(default)]
    pub cms_config: Option<Value>,
    #[serde(default)]
    pub internal_linking_enabled: Option<bool>,
    #[serde(default)]
    pub pinned: Option<bool>,
}

/// POST /api/projects - register a website
pub async fn create_project(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Project name is required".to_string()));
    }
    validate_url(&request.url)?;

    let now = Utc::now();
    let project = Project {
        id: Uuid::new_v4(),
        user_id: user.0,
        name: request.name,
        url: request.url,
        brand_name: request.brand_name,
        business_type: request.business_type,
        industries: request.industries,
        services: request.services,
        languages: request.languages,
        age_groups: request.age_groups,
        locations: request.locations,
        gender: request.gender.unwrap_or(Gender::All),
        visitors: request.visitors.unwrap_or(0),
        cms_config: request.cms_config,
        internal_linking_enabled: request.internal_linking_enabled.unwrap_or(false),
        pinned: false,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    projects::insert_project(&state.db, &project).await?;
    state.cache.invalidate_user(user.0);

    info!(project_id = %project.id, user_id = %user.0, "Created project");
    Ok((StatusCode::CREATED, Json(project_payload(&project))))
}

/// GET /api/projects - list the caller's active projects
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Value>> {
    if let Some(cached) = state.cache.get_projects(user.0) {
        return Ok(Json(cached));
    }

    let projects = projects::list_projects(&state.db, user.0).await?;
    let payload = Value::Array(projects.iter().map(project_payload).collect());
    state.cache.put_projects(user.0, payload.clone());

    Ok(Json(payload))
}

/// GET /api/projects/:project_id
pub async fn get_project(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let project = super::load_owned_project(&state, project_id, user).await?;
    Ok(Json(project_payload(&project)))
}

/// PUT /api/projects/:project_id - partial update
pub async fn update_project(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
    Json(request): Json<UpdateProjectRequest>,
) -> ApiResult<Json<Value>> {
    let mut project = super::load_owned_project(&state, project_id, user).await?;

    if let Some(name) = request.name {
        if name.trim().is_empty() {
            return Err(ApiError::BadRequest("Project name is required".to_string()));
        }
        project.name = name;
    }
    if let Some(url) = request.url {
        validate_url(&url)?;
        project.url = url;
    }
    if let Some(brand_name) = request.brand_name {
        project.brand_name = Some(brand_name);
    }
    if let Some(business_type) = request.business_type {
        project.business_type = Some(business_type);
    }
    if let Some(industries) = request.industries {
        project.industries = industries;
    }
    if let Some(services) = request.services {
        project.services = services;
    }
    if let Some(languages) = request.languages {
        project.languages = languages;
    }
    if let Some(age_groups) = request.age_groups {
        project.age_groups = age_groups;
    }
    if let Some(locations) = request.locations {
        project.locations = locations;
    }
    if let Some(gender) = request.gender {
        project.gender = gender;
    }
    if let Some(visitors) = request.visitors {
        project.visitors = visitors;
    }
    if let Some(cms_config) = request.cms_config {
        project.cms_config = Some(cms_config);
    }
    if let Some(enabled) = request.internal_linking_enabled {
        project.internal_linking_enabled = enabled;
    }
    if let Some(pinned) = request.pinned {
        project.pinned = pinned;
    }

    project.updated_at = Utc::now();
    projects::update_project(&state.db, &project).await?;
    state.cache.invalidate_user(user.0);

    Ok(Json(project_payload(&project)))
}

/// DELETE /api/projects/:project_id - soft delete
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let project = super::load_owned_project(&state, project_id, user).await?;

    projects::soft_delete_project(&state.db, project.id).await?;
    state.cache.invalidate_user(user.0);

    info!(project_id = %project.id, "Deleted project");
    Ok(Json(json!({"deleted": true})))
}

fn validate_url(url: &str) -> ApiResult<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ApiError::BadRequest(
            "Project url must start with http:// or https://".to_string(),
        ))
    }
}

/// Project as the frontend sees it, timestamps in IST.
pub(crate) fn project_payload(project: &Project) -> Value {
    json!({
        "id": project.id,
        "user_id": project.user_id,
        "name": project.name,
        "url": project.url,
        "brand_name": project.brand_name,
        "business_type": project.business_type,
        "industries": project.industries,
        "services": project.services,
        "languages": project.languages,
        "age_groups": project.age_groups,
        "locations": project.locations,
        "gender": project.gender,
        "visitors": project.visitors,
        "cms_config": project.cms_config,
        "internal_linking_enabled": project.internal_linking_enabled,
        "pinned": project.pinned,
        "created_at": ist_string(project.created_at),
        "updated_at": ist_string(project.updated_at),
    })
}
