use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::CACHE_CONTROL;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::CookieJar;
use chrono::{DateTime, SecondsFormat, Utc};
use common_http_errors::{ApiError, ApiResult, INVALID_REQUEST};
use common_session::{
    clear_session_cookie, generate_session_token, hash_session_token, session_cookie,
    CurrentSession, MaybeSession, UserSummary,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use crate::password::{burn_verification, verify_password};
use crate::store::NewSession;
use crate::AppState;

pub const ACCOUNT_DISABLED: &str = "ACCOUNT_DISABLED";

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub user: UserSummary,
    pub expires_at: String,
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn no_store(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

/// Verifies credentials and issues a fresh session cookie.
///
/// Unknown emails and wrong passwords produce the same 401 after the same
/// amount of hashing work.
pub async fn sign_in(
    State(state): State<AppState>,
    payload: Result<Json<SignInRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(SignInRequest { email, password }) = payload.map_err(|rejection| {
        state.metrics.sign_in_attempt("invalid_request");
        ApiError::from(rejection)
    })?;
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        state.metrics.sign_in_attempt("invalid_request");
        return Err(ApiError::bad_request(
            INVALID_REQUEST,
            "Email and password are required",
        ));
    }

    let credentials = state.accounts.find_credentials(email).await.map_err(|err| {
        state.metrics.sign_in_attempt("error");
        ApiError::internal(format!("credential lookup failed: {err}"))
    })?;

    let Some(credentials) = credentials else {
        burn_verification(&password);
        state.metrics.sign_in_attempt("invalid_credentials");
        info!("sign-in rejected for unknown email");
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password(&credentials.password_hash, &password) {
        state.metrics.sign_in_attempt("invalid_credentials");
        info!(user_id = %credentials.user.id, "sign-in rejected: wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    if !credentials.user.is_active {
        state.metrics.sign_in_attempt("disabled");
        warn!(user_id = %credentials.user.id, "sign-in rejected: account disabled");
        return Err(ApiError::Forbidden {
            code: ACCOUNT_DISABLED,
            message: Some("Account is disabled".to_string()),
        });
    }

    let now = Utc::now();
    let ttl = state.config.session_ttl();
    let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
        state.metrics.sign_in_attempt("error");
        ApiError::internal(format!("session expiry out of range (ttl {ttl})"))
    })?;
    let token = generate_session_token();
    let record = state
        .accounts
        .create_session(NewSession {
            user_id: credentials.user.id,
            token_hash: hash_session_token(&token),
            created_at: now,
            expires_at,
        })
        .await
        .map_err(|err| {
            state.metrics.sign_in_attempt("error");
            error!(user_id = %credentials.user.id, error = %err, "failed to persist session");
            ApiError::internal(format!("session create failed: {err}"))
        })?;

    state.metrics.sign_in_attempt("success");
    info!(
        user_id = %record.user.id,
        session_id = %record.session_id,
        role = %record.user.role,
        "session issued"
    );

    let jar = CookieJar::new().add(session_cookie(
        &state.config.cookie,
        &token,
        ttl.num_seconds(),
    ));
    let body = SignInResponse {
        user: UserSummary::from(&record.user),
        expires_at: rfc3339(record.expires_at),
    };
    Ok(no_store((jar, Json(body)).into_response()))
}

/// Revokes the presented session, if any. The cookie is cleared on every path.
pub async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let jar = CookieJar::new().add(clear_session_cookie(&state.config.cookie));

    let Some(token) = state.gate.token_from_headers(&headers) else {
        return (jar, StatusCode::NO_CONTENT).into_response();
    };

    match state.accounts.revoke_session(&token).await {
        Ok(revoked) => {
            info!(revoked, "session signed out");
            (jar, StatusCode::NO_CONTENT).into_response()
        }
        Err(err) => (
            jar,
            ApiError::internal(format!("session revoke failed: {err}")),
        )
            .into_response(),
    }
}

pub async fn session_status(session: MaybeSession) -> Response {
    no_store(Json(session.status()).into_response())
}

pub async fn current_user(CurrentSession(session): CurrentSession) -> Response {
    no_store(Json(UserSummary::from(&session)).into_response())
}

pub async fn technician_ping(CurrentSession(session): CurrentSession) -> Json<serde_json::Value> {
    Json(json!({
        "ok": true,
        "role": session.role,
    }))
}
