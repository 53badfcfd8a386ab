//! Application error types.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use cinerate_core::auth::AuthError;
use cinerate_core::store::StoreError;
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, message) = match &self {
            AppError::Validation(m) => ("validation_error", m.as_str()),
            AppError::NotFound(m) => ("not_found", m.as_str()),
            AppError::Unauthorized(m) => ("unauthorized", m.as_str()),
            AppError::Forbidden(m) => ("forbidden", m.as_str()),
            AppError::Internal(cause) => {
                error!(%cause, "internal error");
                ("internal_error", "Internal server error")
            }
        };
        let body = ErrorResponse {
            status: status.as_u16(),
            error: error.to_string(),
            message: message.to_string(),
            path: None,
        };
        // The request path is attached by `middleware::error_path`.
        let mut response = (status, Json(&body)).into_response();
        response.extensions_mut().insert(body);
        response
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(msg) => AppError::NotFound(msg),
            StoreError::Conflict(msg) => AppError::Validation(msg),
            StoreError::DbError(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MalformedToken => AppError::Unauthorized("Malformed token".into()),
            AuthError::BadSignature => AppError::Unauthorized("Invalid token signature".into()),
            AuthError::Expired => AppError::Unauthorized("Token expired".into()),
            AuthError::Revoked => AppError::Unauthorized("Token has been revoked".into()),
            AuthError::UnknownSubject => AppError::Unauthorized("User no longer exists".into()),
            AuthError::InvalidCredentials => AppError::Unauthorized("Invalid credentials".into()),
            AuthError::AccessDenied(msg) => AppError::Forbidden(msg),
            AuthError::Store(e) => AppError::from(e),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_failures_are_unauthorized() {
        for e in [
            AuthError::MalformedToken,
            AuthError::BadSignature,
            AuthError::Expired,
            AuthError::Revoked,
            AuthError::UnknownSubject,
            AuthError::InvalidCredentials,
        ] {
            assert_eq!(AppError::from(e).status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn access_denied_is_forbidden() {
        let e = AppError::from(AuthError::AccessDenied("nope".into()));
        assert_eq!(e.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn internal_cause_is_not_exposed() {
        let response = AppError::Internal("db exploded at 10.0.0.3".into()).into_response();
        let body = response.extensions().get::<ErrorResponse>().unwrap();
        assert_eq!(body.message, "Internal server error");
    }
}
