use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use codeheist::grader::Grader;
use codeheist::judge::{JudgeConfig, MockJudge};
use codeheist::store::Catalog;
use codeheist::{broadcast, state::AppState, ws};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "codeheist=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting codeheist...");

    // Build the execution backend from the environment
    let judge_config = JudgeConfig::from_env();
    let run_timeout = judge_config.run_timeout;
    let backend = match judge_config.build_backend() {
        Ok(backend) => {
            tracing::info!("judge backend '{}' initialized", backend.name());
            backend
        }
        Err(e) => {
            tracing::warn!(
                "failed to initialize judge backend: {}. Falling back to the mock judge.",
                e
            );
            Box::new(MockJudge)
        }
    };

    let grader = Grader::new(backend, run_timeout);
    let state = Arc::new(AppState::new(grader, Catalog::with_stock_content().await));

    // Spawn the background countdown for active sessions
    broadcast::spawn_session_ticker(state.clone());

    let app = Router::new()
        .route("/ws", get(ws::ws_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(4040);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
