use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use companion_agents::AgentError;
use companion_core::{BookingError, MoodError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{message}")]
    MissingFields {
        message: String,
        fields: Vec<&'static str>,
    },
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Upstream(String),
    #[error("{0}")]
    Unavailable(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Self::MissingFields { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "missing_fields"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "invalid_state"),
            Self::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream_failed"),
            Self::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "bookings_full"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let body = match &self {
            Self::MissingFields { message, fields } => json!({
                "error": code,
                "message": message,
                "fields": fields,
            }),
            Self::Internal(err) => {
                tracing::error!(error = ?err, "request failed");
                json!({
                    "error": code,
                    "message": "internal server error",
                })
            }
            other => json!({
                "error": code,
                "message": other.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Validation(message) => Self::BadRequest(message),
            AgentError::External { context, cause } => {
                tracing::warn!(error = %cause, "upstream call failed");
                Self::Upstream(context.to_string())
            }
            AgentError::Internal(err) => Self::Internal(err),
        }
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::MissingFields(fields) => Self::MissingFields {
                message: BookingError::MissingFields(fields.clone()).to_string(),
                fields,
            },
            BookingError::InvalidPrice(price) => {
                Self::BadRequest(BookingError::InvalidPrice(price).to_string())
            }
            other => Self::Conflict(other.to_string()),
        }
    }
}

impl From<MoodError> for ApiError {
    fn from(err: MoodError) -> Self {
        Self::BadRequest(err.to_string())
    }
}
