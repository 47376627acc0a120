//! daylog - a chat bot for recording daily activities
//!
//! Users describe what they did in free text; a dialogue engine asks
//! follow-up questions until each activity is complete and stores it.

mod activity;
mod api;
mod config;
mod db;
mod nlp;
mod parse;
mod runtime;
mod state_machine;

use api::{create_router, AppState};
use config::Config;
use db::Database;
use nlp::{EntityExtractor, LoggingExtractor, NoopExtractor, WitClient};
use runtime::{DatabaseStorage, ProductionEngine, SessionStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "daylog=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = Config::from_env();

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open(&config.db_path)?;

    let extractor: Arc<dyn EntityExtractor> = match &config.wit_token {
        Some(token) => {
            let client = WitClient::new(token.clone(), Some(&config.wit_url))?;
            tracing::info!(url = %config.wit_url, "Entity extraction enabled");
            Arc::new(LoggingExtractor::new(Arc::new(client)))
        }
        None => {
            tracing::warn!("WIT_AI_TOKEN not set; only keyword activity matching is available");
            Arc::new(NoopExtractor)
        }
    };

    let sessions = SessionStore::new(config.idle_timeout);
    let engine: ProductionEngine =
        ProductionEngine::new(DatabaseStorage::new(db), extractor, sessions.clone());

    let cancel = CancellationToken::new();
    let sweeper = sessions.spawn_sweeper(cancel.clone());

    let state = AppState::new(Arc::new(engine), sessions);
    let app = create_router(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("daylog server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutting down");
        })
        .await?;

    cancel.cancel();
    sweeper.await?;

    Ok(())
}
