use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

/// Error vocabulary surfaced by the API. Validation and policy messages are
/// returned verbatim; store failures are logged and collapsed into a generic
/// 500 so infrastructure detail never reaches the caller.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    PolicyViolation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Invalid token.")]
    InvalidToken,

    #[error("{0}")]
    NotFound(String),

    #[error("OTP expired or not found.")]
    OtpExpired,

    #[error("Invalid OTP.")]
    OtpInvalid,

    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::InvalidInput(msg) | Self::PolicyViolation(msg) | Self::Conflict(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token.".to_string()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::OtpExpired => (
                StatusCode::BAD_REQUEST,
                "OTP expired or not found.".to_string(),
            ),
            Self::OtpInvalid => (StatusCode::BAD_REQUEST, "Invalid OTP.".to_string()),
            Self::Database(e) => {
                error!(error = %e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong.".to_string(),
                )
            }
            Self::Internal(e) => {
                error!(error = %e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong.".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { message })).into_response()
    }
}

/// Postgres SQLSTATE 23505.
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// Postgres SQLSTATE 23P01, raised by the leaves exclusion constraint when
/// two overlapping bookings race past the application-level check.
pub fn is_exclusion_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23P01"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn policy_violation_maps_to_bad_request() {
        let resp = ApiError::PolicyViolation("Backdated leave applications older than 3 days are not allowed.".into())
            .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        let resp = ApiError::NotFound("Resource not found.".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_hides_detail() {
        let resp = ApiError::Internal(anyhow::anyhow!("pool exhausted")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn otp_errors_map_to_bad_request() {
        assert_eq!(
            ApiError::OtpExpired.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::OtpInvalid.into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }
}
