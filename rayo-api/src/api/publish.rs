//! Publishing handlers
//!
//! Push a document's current title and content to the project's CMS and
//! record the outcome on the document's metadata.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use rayo_common::db::models::BlogRecord;
use rayo_common::time::ist_string;
use rayo_common::versioning::{latest_content_html, latest_scalar, serialize_document};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::blogs;
use crate::error::{ApiError, ApiResult};
use crate::services::cms::{CmsPublisher, PublishOutcome};
use crate::services::wordpress::POST_STATUSES;
use crate::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct PublishRequest {
    /// Target post status ("publish", "future", "draft", "pending",
    /// "private"); omitted means "draft"
    #[serde(default)]
    pub status: Option<String>,
}

/// Status for a publish run; anything outside the accepted list is a 400.
fn requested_status(request: &PublishRequest) -> ApiResult<&str> {
    let status = request.status.as_deref().unwrap_or("draft");
    if !POST_STATUSES.contains(&status) {
        return Err(ApiError::BadRequest(format!(
            "Unknown post status: {status}"
        )));
    }
    Ok(status)
}

/// POST .../blogs/:blog_id/publish/wordpress
pub async fn publish_to_wordpress(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((project_id, blog_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<PublishRequest>,
) -> ApiResult<Json<Value>> {
    let project = super::load_owned_project(&state, project_id, user).await?;
    let blog = super::load_project_blog(&state, project.id, blog_id).await?;

    let client =
        super::blogs::wordpress_client(&state, project.id, project.cms_config.as_ref()).await?;
    publish(&state, blog, &client, request, user).await
}

/// POST .../blogs/:blog_id/publish/shopify
pub async fn publish_to_shopify(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((project_id, blog_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<PublishRequest>,
) -> ApiResult<Json<Value>> {
    let project = super::load_owned_project(&state, project_id, user).await?;
    let blog = super::load_project_blog(&state, project.id, blog_id).await?;

    let client =
        super::blogs::shopify_client(&state, project.id, project.cms_config.as_ref()).await?;
    publish(&state, blog, &client, request, user).await
}

async fn publish(
    state: &AppState,
    mut blog: BlogRecord,
    client: &dyn CmsPublisher,
    request: PublishRequest,
    user: AuthUser,
) -> ApiResult<Json<Value>> {
    let title = latest_scalar(blog.fields.get("title").unwrap_or(&Value::Null));
    let html = latest_content_html(blog.fields.get("content").unwrap_or(&Value::Null));

    if html.is_empty() {
        return Err(ApiError::BadRequest(
            "Document has no content to publish".to_string(),
        ));
    }

    let status = requested_status(&request)?;
    let outcome = client
        .publish(&title, &html, status)
        .await
        .map_err(|err| ApiError::Upstream(err.to_string()))?;

    record_outcome(&mut blog.fields, &outcome);
    let now = Utc::now();
    blogs::update_blog_fields(&state.db, blog.id, &blog.fields, blog.words_count, now).await?;
    blogs::update_blog_status(&state.db, blog.id, "published", None).await?;
    state.cache.invalidate_user(user.0);

    info!(
        blog_id = %blog.id,
        platform = outcome.platform,
        remote_id = outcome.remote_id,
        "Published blog"
    );

    blog.status = "published".to_string();
    blog.updated_at = now;
    Ok(Json(serialize_document(&blog.to_document())))
}

fn record_outcome(fields: &mut Value, outcome: &PublishOutcome) {
    if !fields.is_object() {
        *fields = Value::Object(Default::default());
    }
    let obj = fields.as_object_mut().expect("fields is an object");

    let metadata = obj
        .entry("metadata".to_string())
        .or_insert_with(|| Value::Object(Default::default()));
    if !metadata.is_object() {
        *metadata = Value::Object(Default::default());
    }
    if let Some(meta) = metadata.as_object_mut() {
        meta.insert(
            "published_to".to_string(),
            Value::String(outcome.platform.to_string()),
        );
        meta.insert(
            format!("{}_post_id", outcome.platform),
            Value::from(outcome.remote_id),
        );
        if let Some(link) = &outcome.link {
            meta.insert("link".to_string(), Value::String(link.clone()));
        }
        meta.insert(
            "published_at".to_string(),
            Value::String(ist_string(Utc::now())),
        );
    }
}

/// GET /api/projects/:project_id/blogs/unpublished - documents not yet pushed
/// to the project's CMS
pub async fn unpublished_blogs(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let project = super::load_owned_project(&state, project_id, user).await?;

    let blogs = blogs::list_blogs(&state.db, project.id).await?;
    let payload: Vec<Value> = blogs
        .iter()
        .filter(|blog| {
            blog.fields["metadata"]["published_to"]
                .as_str()
                .map(|s| s.is_empty())
                .unwrap_or(true)
        })
        .map(|blog| serialize_document(&blog.to_document()))
        .collect();

    Ok(Json(Value::Array(payload)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_requested_status_defaults_to_draft() {
        let request = PublishRequest::default();
        let status = requested_status(&request).unwrap();
        assert_eq!(status, "draft");
    }

    #[test]
    fn test_requested_status_passes_non_default_through() {
        for wanted in ["publish", "future", "pending", "private"] {
            let request = PublishRequest {
                status: Some(wanted.to_string()),
            };
            assert_eq!(requested_status(&request).unwrap(), wanted);
        }
    }

    #[test]
    fn test_requested_status_rejects_unknown() {
        let request = PublishRequest {
            status: Some("live".to_string()),
        };
        assert!(requested_status(&request).is_err());
    }

    #[test]
    fn test_record_outcome_sets_metadata() {
        let mut fields = json!({"title": ["T"]});
        let outcome = PublishOutcome {
            platform: "wordpress",
            remote_id: 77,
            link: Some("https://example.com/post".to_string()),
        };
        record_outcome(&mut fields, &outcome);

        assert_eq!(fields["metadata"]["published_to"], "wordpress");
        assert_eq!(fields["metadata"]["wordpress_post_id"], 77);
        assert_eq!(fields["metadata"]["link"], "https://example.com/post");
    }

    #[test]
    fn test_record_outcome_replaces_non_object_metadata() {
        let mut fields = json!({"metadata": "legacy"});
        let outcome = PublishOutcome {
            platform: "shopify",
            remote_id: 5,
            link: None,
        };
        record_outcome(&mut fields, &outcome);
        assert_eq!(fields["metadata"]["published_to"], "shopify");
        assert!(fields["metadata"].get("link").is_none());
    }
}
