use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use navfolio_core::errors::{DatabaseError, Error as CoreError};
use serde_json::json;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
            ApiError::Core(err) => match err {
                CoreError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION"),
                CoreError::InsufficientUnits { .. } => (StatusCode::CONFLICT, "INSUFFICIENT_UNITS"),
                CoreError::InsufficientData(_) => (StatusCode::CONFLICT, "INSUFFICIENT_DATA"),
                CoreError::ConstraintViolation(_) => {
                    (StatusCode::CONFLICT, "CONSTRAINT_VIOLATION")
                }
                CoreError::AggregationIncomplete { .. } => {
                    (StatusCode::CONFLICT, "AGGREGATION_INCOMPLETE")
                }
                CoreError::NotFound(_) | CoreError::Database(DatabaseError::NotFound(_)) => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND")
                }
                CoreError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("{}", self);
        }
        let body = Json(json!({ "code": code, "message": self.to_string() }));
        (status, body).into_response()
    }
}
