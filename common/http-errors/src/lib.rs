use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub mod metrics;

pub use metrics::http_error_metrics_layer;

pub const ERROR_CODE_HEADER: &str = "X-Error-Code";

pub const AUTHENTICATION_REQUIRED: &str = "AUTHENTICATION_REQUIRED";
pub const INSUFFICIENT_ROLE: &str = "INSUFFICIENT_ROLE";
pub const INVALID_CREDENTIALS: &str = "INVALID_CREDENTIALS";
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
pub const INVALID_REQUEST: &str = "INVALID_REQUEST";

/// Wire shape shared by every error response: `{"error": "...", "code": "..."}`.
#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none", rename = "requiredRole")] pub required_role: Option<String>,
}

#[derive(Debug)]
pub enum ApiError {
    AuthenticationRequired,
    InsufficientRole { required: String },
    InvalidCredentials,
    BadRequest { code: &'static str, message: Option<String> },
    NotFound { code: &'static str },
    Forbidden { code: &'static str, message: Option<String> },
    Internal { message: Option<String> },
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(e: E) -> Self { Self::Internal { message: Some(e.to_string()) } }
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self { Self::BadRequest { code, message: Some(message.into()) } }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::AuthenticationRequired | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::InsufficientRole { .. } | ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::AuthenticationRequired => AUTHENTICATION_REQUIRED,
            ApiError::InsufficientRole { .. } => INSUFFICIENT_ROLE,
            ApiError::InvalidCredentials => INVALID_CREDENTIALS,
            ApiError::BadRequest { code, .. } | ApiError::NotFound { code } | ApiError::Forbidden { code, .. } => *code,
            ApiError::Internal { .. } => INTERNAL_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let (error, required_role) = match self {
            ApiError::AuthenticationRequired => ("Authentication required".to_string(), None),
            ApiError::InsufficientRole { required } => (
                format!("Insufficient role. Requires {required} or higher"),
                Some(required),
            ),
            ApiError::InvalidCredentials => ("Invalid email or password".to_string(), None),
            ApiError::BadRequest { message, .. } => (message.unwrap_or_else(|| "Bad request".into()), None),
            ApiError::NotFound { .. } => ("Not found".to_string(), None),
            ApiError::Forbidden { message, .. } => (message.unwrap_or_else(|| "Forbidden".into()), None),
            ApiError::Internal { message } => {
                if let Some(detail) = message.as_deref() {
                    tracing::error!(detail, "internal error");
                }
                // Internal details stay in the logs.
                ("Internal server error".to_string(), None)
            }
        };
        let body = ErrorBody { error, code: code.into(), required_role };
        let mut resp = (status, Json(body)).into_response();
        if let Ok(val) = HeaderValue::from_str(code) {
            resp.headers_mut().insert(ERROR_CODE_HEADER, val);
        }
        resp
    }
}

/// Malformed bodies share the JSON error shape instead of axum's plain-text rejection.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(INVALID_REQUEST, rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request(INVALID_REQUEST, rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
