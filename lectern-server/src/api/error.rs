//! API error responses
//!
//! Every handler failure is expressed as an [`ApiError`] and rendered as a
//! JSON body `{"error": "..."}`. Lesson/definition/run lookups surface as
//! 404, a rejected stage list as 422; engine and database failures keep
//! their detail in the logs and return an opaque 500.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

#[derive(Debug)]
pub enum ApiError {
    /// Lesson, definition or run does not exist
    NotFound(String),
    /// The submitted pipeline definition was rejected
    Validation(String),
    /// The pipeline engine refused or failed the operation
    Engine(String),
    DatabaseError(sqlx::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::Engine(msg) => {
                tracing::error!("Pipeline engine error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "pipeline engine error".to_string(),
                )
            }
            ApiError::DatabaseError(err) => {
                tracing::error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
