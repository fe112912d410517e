//! Error-to-HTTP response conversion.
//!
//! Route handlers return `Result<T, AppError>`; any [`tvp_core::Error`]
//! converts into an [`AppError`] with `?`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError(tvp_core::Error);

impl From<tvp_core::Error> for AppError {
    fn from(e: tvp_core::Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match &self.0 {
            tvp_core::Error::Upstream { url, message } => {
                tracing::warn!(url = %url, error = %message, "Upstream fetch failed");
            }
            e if status.is_server_error() => {
                tracing::error!(status = %status, error = %e, "Server error in handler");
            }
            e => {
                tracing::debug!(status = %status, error = %e, "Request rejected");
            }
        }

        let code = match &self.0 {
            tvp_core::Error::NotFound { .. } => "not_found",
            tvp_core::Error::Validation(_) => "validation_error",
            tvp_core::Error::Upstream { .. } => "upstream_error",
            tvp_core::Error::TriggerTargetMissing(_) => "no_scheduler",
            tvp_core::Error::Provider { .. } => "provider_error",
            tvp_core::Error::Config(_) => "config_error",
            tvp_core::Error::Io { .. } => "io_error",
            tvp_core::Error::Internal(_) => "internal_error",
        };

        let body = json!({
            "error": self.0.to_string(),
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
