mod analysis;
mod auth;
mod config;
mod db;
mod errors;
mod jobs;
mod learning_paths;
mod learning_resources;
mod llm_client;
mod models;
mod rate_limit;
mod resumes;
mod routes;
mod state;
mod storage;
mod validation;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::LlmGapAdvisor;
use crate::auth::client::SupabaseAuth;
use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::llm_client::LlmClient;
use crate::routes::{build_router, cors_layer};
use crate::state::AppState;
use crate::storage::Storage;

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration first: missing required env vars abort startup
    let config = Config::from_env()?;

    // Structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http=info",
                env!("CARGO_PKG_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Skill Gap Analyzer API v{} ({})",
        env!("CARGO_PKG_VERSION"),
        config.app_env
    );

    // PostgreSQL
    let db = create_pool(&config.database_url).await?;
    run_migrations(&db).await?;

    // Redis (rate limiting)
    let redis = redis::Client::open(config.redis_url.clone()).context("Invalid REDIS_URL")?;
    info!("Redis client initialized");

    // Object storage
    let storage = Storage::connect(&config.storage).await;
    info!("Storage client initialized (bucket: {})", storage.bucket());

    // LLM
    let llm = LlmClient::new(config.llm.clone()).context("Failed to build LLM client")?;
    info!("LLM client initialized ({})", config.llm.base_url);

    // Auth service
    let auth = SupabaseAuth::new(&config.supabase_url, &config.supabase_anon_key)
        .context("Failed to build auth client")?;

    let gap_advisor = Arc::new(LlmGapAdvisor::new(llm.clone()));

    let state = AppState {
        db,
        redis,
        storage,
        llm,
        auth,
        gap_advisor,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config));

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
