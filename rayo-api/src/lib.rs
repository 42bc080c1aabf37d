//! Rayo content-operations API
//!
//! HTTP service for projects, SEO metadata generation, versioned blog
//! documents and CMS publishing.

pub mod api;
pub mod auth;
pub mod cache;
pub mod db;
pub mod error;
pub mod jobs;
pub mod prompts;
pub mod services;

use axum::{
    routing::{delete, get, post},
    Router,
};
use rayo_common::config::Settings;
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::AuthLayer;
use crate::cache::ListCache;
use crate::error::{ApiError, ApiResult};
use crate::services::{openai::OpenAiClient, semrush::SemrushClient};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub settings: Settings,
    pub cache: ListCache,
    pub openai: Option<OpenAiClient>,
    pub semrush: Option<SemrushClient>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        settings: Settings,
        openai: Option<OpenAiClient>,
        semrush: Option<SemrushClient>,
    ) -> Self {
        Self {
            db,
            settings,
            cache: ListCache::new(),
            openai,
            semrush,
        }
    }

    /// The OpenAI client, or 503 when no API key is configured.
    pub fn openai(&self) -> ApiResult<&OpenAiClient> {
        self.openai
            .as_ref()
            .ok_or_else(|| ApiError::Unavailable("OpenAI API key not configured".to_string()))
    }

    /// The SEMrush client, or 503 when no API key is configured.
    pub fn semrush(&self) -> ApiResult<&SemrushClient> {
        self.semrush
            .as_ref()
            .ok_or_else(|| ApiError::Unavailable("SEMrush API key not configured".to_string()))
    }
}

/// Build the service router with all routes and layers.
pub fn build_router(state: AppState) -> Router {
    let auth_layer = AuthLayer {
        jwt_secret: state.settings.jwt_secret.clone(),
    };

    Router::new()
        .route("/health", get(api::health::health_check))
        // Projects
        .route(
            "/api/projects",
            post(api::projects::create_project).get(api::projects::list_projects),
        )
        .route(
            "/api/projects/:project_id",
            get(api::projects::get_project)
                .put(api::projects::update_project)
                .delete(api::projects::delete_project),
        )
        // Keyword rows
        .route(
            "/api/projects/:project_id/keywords",
            post(api::keywords::add_keywords)
                .get(api::keywords::list_keywords)
                .delete(api::keywords::remove_keywords),
        )
        // Wizard: primary keyword search
        .route(
            "/api/projects/:project_id/keywords/search",
            post(api::steps::keyword_search),
        )
        // Keyword suggestions background job
        .route(
            "/api/projects/:project_id/keyword-suggestions",
            post(api::suggestions::start_keyword_suggestions),
        )
        .route("/api/tasks/:task_id", get(api::suggestions::get_task))
        // Blog documents
        .route(
            "/api/projects/:project_id/blogs",
            post(api::blogs::create_blog).get(api::blogs::list_blogs),
        )
        .route(
            "/api/projects/:project_id/blogs/latest",
            get(api::blogs::latest_blogs),
        )
        .route(
            "/api/projects/:project_id/blogs/stats",
            get(api::blogs::blog_stats),
        )
        .route(
            "/api/projects/:project_id/blogs/unpublished",
            get(api::publish::unpublished_blogs),
        )
        .route(
            "/api/projects/:project_id/blogs/:blog_id",
            get(api::blogs::get_blog)
                .put(api::blogs::update_blog)
                .delete(api::blogs::delete_blog),
        )
        .route(
            "/api/projects/:project_id/blogs/:blog_id/content-versions",
            get(api::blogs::content_versions),
        )
        // Wizard steps on a document
        .route(
            "/api/projects/:project_id/blogs/:blog_id/secondary-keywords",
            post(api::steps::generate_secondary_keywords),
        )
        .route(
            "/api/projects/:project_id/blogs/:blog_id/category",
            post(api::steps::generate_category),
        )
        .route(
            "/api/projects/:project_id/blogs/:blog_id/title",
            post(api::steps::generate_title),
        )
        .route(
            "/api/projects/:project_id/blogs/:blog_id/outline",
            post(api::steps::generate_outline),
        )
        // Publishing
        .route(
            "/api/projects/:project_id/blogs/:blog_id/publish/wordpress",
            post(api::publish::publish_to_wordpress),
        )
        .route(
            "/api/projects/:project_id/blogs/:blog_id/publish/shopify",
            post(api::publish::publish_to_shopify),
        )
        // CMS credentials
        .route(
            "/api/projects/:project_id/cms",
            delete(api::cms::disconnect_cms),
        )
        .route(
            "/api/projects/:project_id/cms/wordpress",
            post(api::cms::connect_wordpress),
        )
        .route(
            "/api/projects/:project_id/cms/shopify",
            post(api::cms::connect_shopify),
        )
        // WordPress proxy
        .route(
            "/api/projects/:project_id/cms/wordpress/categories",
            get(api::cms::wordpress_categories).post(api::cms::wordpress_create_category),
        )
        .route(
            "/api/projects/:project_id/cms/wordpress/tags",
            get(api::cms::wordpress_tags).post(api::cms::wordpress_create_tag),
        )
        .route(
            "/api/projects/:project_id/cms/wordpress/authors",
            get(api::cms::wordpress_authors),
        )
        .route(
            "/api/projects/:project_id/cms/wordpress/statuses",
            get(api::cms::wordpress_statuses),
        )
        // Shopify proxy
        .route(
            "/api/projects/:project_id/cms/shopify/blogs",
            get(api::cms::shopify_blogs).post(api::cms::shopify_create_blog),
        )
        .route(
            "/api/projects/:project_id/cms/shopify/blogs/:shop_blog_id/articles",
            get(api::cms::shopify_articles).post(api::cms::shopify_create_article),
        )
        .route(
            "/api/projects/:project_id/cms/shopify/blogs/:shop_blog_id/articles/:article_id",
            get(api::cms::shopify_get_article)
                .put(api::cms::shopify_update_article)
                .delete(api::cms::shopify_delete_article),
        )
        .route(
            "/api/projects/:project_id/cms/shopify/authors",
            get(api::cms::shopify_authors),
        )
        .route(
            "/api/projects/:project_id/cms/shopify/tags",
            get(api::cms::shopify_tags),
        )
        .layer(auth_layer)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
