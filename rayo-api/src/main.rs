//! rayo-api - Content operations backend
//!
//! Projects, SEO metadata generation, versioned blog documents and CMS
//! publishing behind one HTTP service.

use anyhow::Result;
use clap::Parser;
use rayo_common::config::{resolve_data_dir, Settings};
use rayo_common::db::init_database;
use tracing::{error, info};

use rayo_api::services::{openai::OpenAiClient, semrush::SemrushClient};
use rayo_api::{build_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "rayo-api", about = "Rayo content operations backend")]
struct Args {
    /// Data directory holding the database (overrides env and config file)
    #[arg(long)]
    data_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Build identification first, before any slow startup work
    info!(
        "Starting Rayo API (rayo-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let settings = Settings::from_env();

    let data_dir = resolve_data_dir(args.data_dir.as_deref())?;
    std::fs::create_dir_all(&data_dir)?;
    let db_path = rayo_common::config::database_path(&data_dir);
    info!("Database path: {}", db_path.display());

    let pool = match init_database(&db_path).await {
        Ok(pool) => {
            info!("✓ Connected to database");
            pool
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    if settings.jwt_secret.is_empty() {
        info!("API authentication disabled (empty RAYO_JWT_SECRET)");
    } else {
        info!("✓ Bearer-token authentication enabled");
    }

    let openai = match &settings.openai_api_key {
        Some(key) => Some(OpenAiClient::new(key.clone(), settings.openai_model.clone())?),
        None => {
            info!("OpenAI API key not set; generation endpoints disabled");
            None
        }
    };
    let semrush = match &settings.semrush_api_key {
        Some(key) => Some(SemrushClient::new(key.clone())?),
        None => {
            info!("SEMrush API key not set; keyword metrics disabled");
            None
        }
    };

    let bind_addr = settings.bind_addr.clone();
    let state = AppState::new(pool, settings, openai, semrush);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("rayo-api listening on http://{}", bind_addr);
    info!("Health check: http://{}/health", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
