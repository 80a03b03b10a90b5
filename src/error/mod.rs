//! Error handling module

use axum::{
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Token exchange rejected (or never attempted because credentials are missing)
    #[error("Authentication failed{}: {}", status_suffix(.status), .body)]
    Authentication { status: Option<u16>, body: String },

    /// Any device/thing/property fetch failed
    #[error("Error fetching {}{}: {}", .resource, status_suffix(.status), .message)]
    UpstreamFetch {
        resource: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Method not allowed")]
    UnsupportedMethod(Method),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

impl AppError {
    pub fn authentication(status: Option<u16>, body: impl Into<String>) -> Self {
        AppError::Authentication {
            status,
            body: body.into(),
        }
    }

    pub fn upstream(
        resource: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        AppError::UpstreamFetch {
            resource: resource.into(),
            status,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::UnsupportedMethod(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Authentication { .. }
            | AppError::UpstreamFetch { .. }
            | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(serde_json::json!({
            "message": self.to_string(),
            "status": status.as_u16()
        }));

        match &self {
            AppError::UnsupportedMethod(method) => {
                tracing::debug!("Rejected {} request", method);
                (status, [(header::ALLOW, "GET")], body).into_response()
            }
            _ => {
                tracing::error!("Request failed: {}", self);
                (status, body).into_response()
            }
        }
    }
}
