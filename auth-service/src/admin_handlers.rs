use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use common_http_errors::{ApiError, ApiResult};
use common_session::{CurrentSession, Role, SessionContext, SessionUser, UnknownRole, UserSummary};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RoleChangeRequest {
    pub role: String,
}

/// Reasons an administrator may not perform a role change.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoleChangeError {
    #[error("administrators cannot change their own role")]
    SelfChange,
    #[error("cannot assign {requested}, which is above own role {actor}")]
    Escalation { requested: Role, actor: Role },
    #[error("cannot modify a user holding {target}, which is above own role {actor}")]
    TargetOutranks { target: Role, actor: Role },
}

impl RoleChangeError {
    pub fn code(&self) -> &'static str {
        match self {
            RoleChangeError::SelfChange => "SELF_ROLE_CHANGE",
            RoleChangeError::Escalation { .. } => "ROLE_ESCALATION",
            RoleChangeError::TargetOutranks { .. } => "TARGET_OUTRANKS_ACTOR",
        }
    }
}

impl From<RoleChangeError> for ApiError {
    fn from(value: RoleChangeError) -> Self {
        ApiError::Forbidden {
            code: value.code(),
            message: Some(value.to_string()),
        }
    }
}

/// Checks an actor may move `target` to `requested`.
pub fn check_role_change(
    actor: &SessionContext,
    target: &SessionUser,
    requested: Role,
) -> Result<(), RoleChangeError> {
    if actor.user_id == target.id {
        return Err(RoleChangeError::SelfChange);
    }
    if !actor.has_role(target.role) {
        return Err(RoleChangeError::TargetOutranks {
            target: target.role,
            actor: actor.role,
        });
    }
    if !actor.has_role(requested) {
        return Err(RoleChangeError::Escalation {
            requested,
            actor: actor.role,
        });
    }
    Ok(())
}

pub async fn update_user_role(
    State(state): State<AppState>,
    CurrentSession(actor): CurrentSession,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<RoleChangeRequest>, JsonRejection>,
) -> ApiResult<Json<UserSummary>> {
    let Path(user_id) = path?;
    let Json(request) = payload?;
    let user_id = Uuid::parse_str(user_id.trim())
        .map_err(|_| ApiError::bad_request("INVALID_USER_ID", "User id must be a UUID"))?;
    let requested: Role = request
        .role
        .parse()
        .map_err(|err: UnknownRole| ApiError::bad_request("INVALID_ROLE", err.to_string()))?;

    let target = state
        .accounts
        .find_user(user_id)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound { code: "USER_NOT_FOUND" })?;

    if let Err(err) = check_role_change(&actor, &target, requested) {
        state.metrics.role_change(err.code());
        warn!(
            actor_id = %actor.user_id,
            target_id = %target.id,
            requested = %requested,
            reason = err.code(),
            "role change refused"
        );
        return Err(err.into());
    }

    let updated = state
        .accounts
        .set_role(user_id, requested)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound { code: "USER_NOT_FOUND" })?;

    state.metrics.role_change("applied");
    info!(
        actor_id = %actor.user_id,
        target_id = %updated.id,
        from = %target.role,
        to = %updated.role,
        "role changed"
    );
    Ok(Json(UserSummary::from(&updated)))
}
