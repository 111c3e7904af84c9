use std::sync::Arc;

use server::config;
use server::routes;
use server::state::AnalysisState;

use annotator::StockfishEngine;
use axum::{routing::get, Extension, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env();

    // One long-lived engine shared by all requests
    tracing::info!(stockfish_path = %config.stockfish_path, "Starting Stockfish...");
    let engine = StockfishEngine::new(
        &config.stockfish_path,
        config.engine_threads,
        config.engine_hash_mb,
    )
    .await?;
    let state = Arc::new(AnalysisState::new(
        Box::new(engine),
        config.multipv,
        config.search_limit(),
    ));

    // CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/analyse", get(routes::analyse::analyse))
        // Shared state
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
