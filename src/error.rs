use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid credentials")]
    InvalidCredentials { remaining: Option<i64> },

    #[error("Account locked")]
    Locked,

    #[error("Unauthorized: {0}")]
    Unauthenticated(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Validation(messages) => (
                StatusCode::BAD_REQUEST,
                json!({ "message": messages.join(", ") }),
            ),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, json!({ "message": msg }))
            }
            AppError::InvalidCredentials { remaining } => {
                let body = match remaining {
                    Some(n) => json!({
                        "message": "Invalid credentials",
                        "remainingAttempts": n,
                    }),
                    None => json!({ "message": "Invalid credentials" }),
                };
                (StatusCode::BAD_REQUEST, body)
            }
            AppError::Locked => (
                StatusCode::LOCKED,
                json!({
                    "message": "Account locked due to too many failed login attempts",
                    "locked": true,
                }),
            ),
            AppError::Unauthenticated(msg) => {
                (StatusCode::UNAUTHORIZED, json!({ "message": msg }))
            }
            AppError::Forbidden => {
                (StatusCode::FORBIDDEN, json!({ "message": "Forbidden" }))
            }
            AppError::NotFound => {
                (StatusCode::NOT_FOUND, json!({ "message": "Not found" }))
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                internal_body(e.to_string())
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                internal_body(e.to_string())
            }
            AppError::Multipart(e) => (
                StatusCode::BAD_REQUEST,
                json!({ "message": format!("Invalid form data: {}", e) }),
            ),
            AppError::Storage(e) => {
                tracing::error!("Storage error: {:#}", e);
                internal_body(e.to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                internal_body(msg.clone())
            }
        };

        (status, Json(body)).into_response()
    }
}

// 500 bodies echo the underlying diagnostic in an `error` field.
fn internal_body(detail: String) -> (StatusCode, serde_json::Value) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "message": "Internal server error", "error": detail }),
    )
}

pub type AppResult<T> = Result<T, AppError>;
