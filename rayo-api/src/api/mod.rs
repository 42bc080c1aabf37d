//! HTTP API handlers

pub mod blogs;
pub mod cms;
pub mod health;
pub mod keywords;
pub mod projects;
pub mod publish;
pub mod steps;
pub mod suggestions;

use rayo_common::db::models::{BlogRecord, Project};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Load a project and enforce that the caller owns it.
pub(crate) async fn load_owned_project(
    state: &AppState,
    project_id: Uuid,
    user: AuthUser,
) -> ApiResult<Project> {
    let project = crate::db::projects::load_project(&state.db, project_id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| ApiError::NotFound(format!("Project {project_id} not found")))?;

    if project.user_id != user.0 {
        return Err(ApiError::Forbidden(
            "Project belongs to another user".to_string(),
        ));
    }

    Ok(project)
}

/// Load a blog and enforce that it belongs to the project in the path.
pub(crate) async fn load_project_blog(
    state: &AppState,
    project_id: Uuid,
    blog_id: Uuid,
) -> ApiResult<BlogRecord> {
    let blog = crate::db::blogs::load_blog(&state.db, blog_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Blog {blog_id} not found")))?;

    if blog.project_id != project_id {
        return Err(ApiError::Forbidden(
            "Blog belongs to another project".to_string(),
        ));
    }

    Ok(blog)
}
