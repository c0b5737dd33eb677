//! API error type shared by all route handlers.
//!
//! Every handler returns `Result<_, ApiError>`; the enum carries the HTTP
//! status and renders the `{"status": "error", "message": ...}` envelope
//! clients expect.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced to API clients.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request payload failed validation (missing or malformed fields).
    #[error("{0}")]
    Validation(String),

    /// OTP checks failed: no valid code, expired code, attempts exhausted.
    #[error("{0}")]
    Auth(String),

    /// The referenced entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A uniqueness rule was violated (e.g. duplicate registration).
    #[error("{0}")]
    Conflict(String),

    /// Anything unexpected: database failures, provider outages.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Raw sqlx errors (transaction begin/commit in actions) are internal.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Internal(err.into())
    }
}

/// JSON envelope returned for every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    status: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            ApiError::Internal(err) => {
                tracing::error!(error = ?err, "request failed");
                ErrorBody {
                    status: "error",
                    message: "Internal server error".to_string(),
                    // Internal detail is only exposed in debug builds
                    error: cfg!(debug_assertions).then(|| format!("{err:#}")),
                }
            }
            other => ErrorBody {
                status: "error",
                message: other.to_string(),
                error: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// True when the underlying database error is a unique constraint violation.
///
/// Models return `anyhow::Result`, so callers that need to turn a duplicate
/// key into a `Conflict` response downcast back to the sqlx error here.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .and_then(|db| db.code())
        .map(|code| code == "23505")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_status_codes_per_variant() {
        assert_eq!(
            ApiError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Auth("expired".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::NotFound("missing".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Conflict("duplicate".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Internal(anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_message_comes_from_variant_payload() {
        let err = ApiError::Auth("OTP has expired".into());
        assert_eq!(err.to_string(), "OTP has expired");
    }

    #[test]
    fn test_error_body_omits_detail_when_none() {
        let body = ErrorBody {
            status: "error",
            message: "Registration not found".into(),
            error: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Registration not found");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_is_unique_violation_false_for_plain_errors() {
        let err = anyhow!("not a database error");
        assert!(!is_unique_violation(&err));
    }
}
