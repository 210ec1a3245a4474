use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::roles::Role;

/// Identity row joined onto a session by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub email_verified: bool,
    #[serde(skip)]
    pub is_active: bool,
}

/// What a [`SessionStore`](crate::SessionStore) returns for a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub session_id: Uuid,
    pub user: SessionUser,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}

/// Resolved identity attached to a request once its session validates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub email_verified: bool,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

impl SessionContext {
    pub fn has_role(&self, required: Role) -> bool {
        self.role.satisfies(required)
    }
}

impl From<&SessionRecord> for SessionContext {
    fn from(record: &SessionRecord) -> Self {
        Self {
            session_id: record.session_id,
            user_id: record.user.id,
            email: record.user.email.clone(),
            email_verified: record.user.email_verified,
            role: record.user.role,
            expires_at: record.expires_at,
        }
    }
}

/// Public view of a user, as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub email_verified: bool,
}

impl From<&SessionUser> for UserSummary {
    fn from(user: &SessionUser) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
            email_verified: user.email_verified,
        }
    }
}

impl From<&SessionContext> for UserSummary {
    fn from(ctx: &SessionContext) -> Self {
        Self {
            id: ctx.user_id,
            email: ctx.email.clone(),
            role: ctx.role,
            email_verified: ctx.email_verified,
        }
    }
}

/// Authentication state handed to clients. `is_authenticated` is a plain value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub is_authenticated: bool,
    pub user: Option<UserSummary>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthStatus {
    pub fn anonymous() -> Self {
        Self {
            is_authenticated: false,
            user: None,
            expires_at: None,
        }
    }
}

impl From<Option<&SessionContext>> for AuthStatus {
    fn from(ctx: Option<&SessionContext>) -> Self {
        match ctx {
            Some(ctx) => Self {
                is_authenticated: true,
                user: Some(UserSummary::from(ctx)),
                expires_at: Some(ctx.expires_at),
            },
            None => Self::anonymous(),
        }
    }
}
