//! Aggregated device JSON

use axum::{extract::State, http::Method, response::IntoResponse, Json};

use crate::api::AppState;
use crate::error::AppError;

/// GET /api/devices - Devices with their things and properties. Other methods get 405.
pub async fn list_devices(
    method: Method,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    if method != Method::GET {
        return Err(AppError::UnsupportedMethod(method));
    }

    let devices = state.pipeline.run().await?;
    Ok(Json(devices))
}
