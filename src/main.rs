//! IoT Device Viewer
//!
//! Authenticates against the Arduino IoT Cloud with client credentials,
//! aggregates devices, things and properties, and serves them as JSON and
//! as a server-rendered page.

mod aggregate;
mod api;
mod arduino;
mod config;
mod error;
mod models;
mod pipeline;
mod view;

use std::net::SocketAddr;

use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::AppState;
use crate::pipeline::DevicePipeline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "iot_device_viewer=info,tower_http=debug".into()),
        )
        .init();

    tracing::info!("Starting IoT Device Viewer...");

    // Load configuration
    let config = config::Config::load()?;
    tracing::info!(
        "Configuration loaded (api: {}, strategy: {:?})",
        config.arduino.api_url,
        config.arduino.strategy
    );

    let pipeline = DevicePipeline::from_settings(&config.arduino)?;
    let state = AppState::new(pipeline);

    let app = api::routes().with_state(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
