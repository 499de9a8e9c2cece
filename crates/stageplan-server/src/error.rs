use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use stageplan_common::api::ErrorResponse;
use stageplan_common::{CommonError, ItemId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Item not found: {0}")]
    NotFound(ItemId),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CommonError> for ServerError {
    fn from(e: CommonError) -> Self {
        ServerError::Validation(e.to_string())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::Database(e) => {
                tracing::error!(error = %e, "database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database error".to_string())
            }
            ServerError::NotFound(id) => (StatusCode::NOT_FOUND, format!("item {id} not found")),
            ServerError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServerError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ServerError::NotFound(4).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServerError::Validation("bad".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::Internal("boom".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_invalid_interval_is_a_validation_error() {
        let t = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();
        let err = ServerError::from(CommonError::InvalidInterval {
            start: t,
            end: t - chrono::Duration::days(1),
        });
        assert!(matches!(err, ServerError::Validation(_)));
    }
}
