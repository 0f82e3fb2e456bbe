//! BCEAO assistant - simulated economic-analysis chat backend
//!
//! Serves conversation sessions whose replies come from a canned resolver.

mod api;
mod config;
mod resolver;
mod runtime;
mod state_machine;
mod store;

use api::{create_router, AppState};
use config::AppConfig;
use resolver::{CannedResolver, LoggingResolver};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bceao_assistant=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = AppConfig::from_env();
    tracing::info!(
        port = config.port,
        reply_delay_ms = u64::try_from(config.reply_delay.as_millis()).unwrap_or(u64::MAX),
        "Configuration loaded"
    );

    let resolver = Arc::new(LoggingResolver::new(CannedResolver::new(config.reply_delay)));
    let state = AppState::new(resolver);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Event streams are excluded by the default compression predicate
    let compression = CompressionLayer::new();

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("BCEAO assistant listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
