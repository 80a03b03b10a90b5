//! API module - HTTP handlers and routes

pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{any, get},
    Router,
};

use crate::pipeline::DevicePipeline;

/// Shared handler state. The pipeline holds only immutable configuration.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<DevicePipeline>,
}

impl AppState {
    pub fn new(pipeline: DevicePipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .route("/api/health", get(handlers::health_check))
        // Server-rendered device page
        .route("/", get(handlers::index_page))
        // Aggregated JSON; method is checked in the handler
        .route("/api/devices", any(handlers::list_devices))
}
