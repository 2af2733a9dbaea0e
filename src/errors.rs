use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("No credits left")]
    QuotaExhausted,

    #[error("AI service overloaded")]
    VendorOverloaded,

    #[error("AI service error: {0}")]
    Vendor(String),

    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Database error" }),
                )
            }
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Unauthorized" }),
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                json!({ "error": format!("{} not found", resource) }),
            ),
            AppError::QuotaExhausted => (
                StatusCode::FORBIDDEN,
                json!({
                    "error": "No credits left",
                    "freeTrialsLeft": 0,
                    "isExpired": true
                }),
            ),
            AppError::VendorOverloaded => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({
                    "error": "Service is experiencing high demand",
                    "message": "Our AI service is currently experiencing high demand. Please try again later.",
                    "isOverloaded": true
                }),
            ),
            AppError::Vendor(ref msg) => {
                tracing::error!("AI vendor error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Failed to process image", "details": msg }),
                )
            }
            AppError::Gateway(ref msg) => {
                tracing::error!("Payment gateway error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Payment gateway request failed" }),
                )
            }
            AppError::Validation(ref msg) => {
                (StatusCode::BAD_REQUEST, json!({ "error": msg }))
            }
            AppError::Internal(ref e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_exhausted_maps_to_403() {
        let response = AppError::QuotaExhausted.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn vendor_overloaded_maps_to_503() {
        let response = AppError::VendorOverloaded.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn unauthorized_maps_to_401() {
        let response = AppError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn not_found_maps_to_404() {
        let response = AppError::NotFound("Screenshot").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    // Callers pass the bare resource name; the suffix is added exactly once.
    #[test]
    fn not_found_message_appends_suffix_once() {
        assert_eq!(
            AppError::NotFound("Screenshot").to_string(),
            "Screenshot not found"
        );
    }

    #[test]
    fn validation_maps_to_400() {
        let response = AppError::Validation("Question is required".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
