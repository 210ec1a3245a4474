use axum::response::{IntoResponse, Response};
use common_http_errors::ApiError;
use thiserror::Error;

use crate::roles::Role;

pub type AuthResult<T> = Result<T, AuthError>;

/// Why a request ended up unauthenticated. Logged, never sent to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticationReason {
    MissingToken,
    MalformedToken,
    UnknownSession,
    Expired,
    Revoked,
    InactiveUser,
    StoreTimeout,
    StoreUnavailable,
}

impl AuthenticationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthenticationReason::MissingToken => "missing_token",
            AuthenticationReason::MalformedToken => "malformed_token",
            AuthenticationReason::UnknownSession => "unknown_session",
            AuthenticationReason::Expired => "expired",
            AuthenticationReason::Revoked => "revoked",
            AuthenticationReason::InactiveUser => "inactive_user",
            AuthenticationReason::StoreTimeout => "store_timeout",
            AuthenticationReason::StoreUnavailable => "store_unavailable",
        }
    }
}

impl std::fmt::Display for AuthenticationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("authentication required ({0})")]
    AuthenticationRequired(AuthenticationReason),
    #[error("role {actual} does not satisfy required role {required}")]
    InsufficientRole { required: Role, actual: Role },
}

impl AuthError {
    pub fn reason(&self) -> Option<AuthenticationReason> {
        match self {
            AuthError::AuthenticationRequired(reason) => Some(*reason),
            AuthError::InsufficientRole { .. } => None,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::AuthenticationRequired(_) => ApiError::AuthenticationRequired,
            AuthError::InsufficientRole { required, .. } => ApiError::InsufficientRole {
                required: required.to_string(),
            },
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

/// Failure reported by a session store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
    #[error("corrupt session record: {0}")]
    Corrupt(String),
    #[error("conflicting record: {0}")]
    Conflict(String),
}
