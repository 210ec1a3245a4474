use std::sync::Arc;

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::config::GateConfig;
use crate::cookies::session_token_from_headers;
use crate::error::{AuthError, AuthResult, AuthenticationReason};
use crate::metrics;
use crate::record::SessionContext;
use crate::roles::Role;
use crate::store::SessionStore;
use crate::token::is_well_formed;

/// Outcome of checking one request against one minimum role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationDecision {
    Authorized(SessionContext),
    Forbidden { context: SessionContext, required: Role },
    AuthenticationRequired(AuthenticationReason),
}

impl AuthorizationDecision {
    pub fn decide(validated: Result<SessionContext, AuthenticationReason>, required: Role) -> Self {
        match validated {
            Ok(context) if context.role.satisfies(required) => Self::Authorized(context),
            Ok(context) => Self::Forbidden { context, required },
            Err(reason) => Self::AuthenticationRequired(reason),
        }
    }

    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized(_))
    }

    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Authorized(_) => "authorized",
            Self::Forbidden { .. } => "forbidden",
            Self::AuthenticationRequired(_) => "authentication_required",
        }
    }

    pub fn into_result(self) -> AuthResult<SessionContext> {
        match self {
            Self::Authorized(context) => Ok(context),
            Self::Forbidden { context, required } => Err(AuthError::InsufficientRole {
                required,
                actual: context.role,
            }),
            Self::AuthenticationRequired(reason) => Err(AuthError::AuthenticationRequired(reason)),
        }
    }
}

/// Validates session tokens against the store and applies the role hierarchy.
pub struct SessionGate {
    store: Arc<dyn SessionStore>,
    config: GateConfig,
}

impl SessionGate {
    pub fn new(store: Arc<dyn SessionStore>, config: GateConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn token_from_headers(&self, headers: &HeaderMap) -> Option<String> {
        session_token_from_headers(headers, &self.config.cookie.name)
    }

    /// Read-only: the session is never renewed or touched.
    pub async fn validate_session(&self, token: Option<&str>) -> AuthResult<SessionContext> {
        self.resolve(token, Utc::now())
            .await
            .map_err(AuthError::AuthenticationRequired)
    }

    pub async fn validate_session_at(
        &self,
        token: Option<&str>,
        now: DateTime<Utc>,
    ) -> AuthResult<SessionContext> {
        self.resolve(token, now)
            .await
            .map_err(AuthError::AuthenticationRequired)
    }

    pub async fn authorize(&self, token: Option<&str>, required: Role) -> AuthorizationDecision {
        let validated = self.resolve(token, Utc::now()).await;
        self.conclude(validated, required)
    }

    /// Applies `required` to an already-resolved validation and records the decision.
    pub fn conclude(
        &self,
        validated: Result<SessionContext, AuthenticationReason>,
        required: Role,
    ) -> AuthorizationDecision {
        let decision = self.evaluate(validated, required);
        metrics::decision(decision.outcome());
        decision
    }

    /// Like [`conclude`](Self::conclude) but leaves the decision counter alone.
    pub(crate) fn evaluate(
        &self,
        validated: Result<SessionContext, AuthenticationReason>,
        required: Role,
    ) -> AuthorizationDecision {
        let decision = AuthorizationDecision::decide(validated, required);
        match &decision {
            AuthorizationDecision::Authorized(ctx) => {
                debug!(user_id = %ctx.user_id, role = %ctx.role, %required, "session authorized");
            }
            AuthorizationDecision::Forbidden { context, required } => {
                info!(user_id = %context.user_id, role = %context.role, %required, "insufficient role");
            }
            AuthorizationDecision::AuthenticationRequired(reason) => {
                info!(%reason, %required, "authentication required");
            }
        }
        decision
    }

    pub(crate) async fn resolve(
        &self,
        token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<SessionContext, AuthenticationReason> {
        let token = token.ok_or(AuthenticationReason::MissingToken)?;
        if !is_well_formed(token) {
            return Err(AuthenticationReason::MalformedToken);
        }

        let lookup = tokio::time::timeout(self.config.lookup_timeout, self.store.get(token)).await;
        let record = match lookup {
            Err(_) => {
                warn!(
                    timeout_ms = self.config.lookup_timeout.as_millis() as u64,
                    "session store lookup timed out"
                );
                metrics::store_failure("timeout");
                return Err(AuthenticationReason::StoreTimeout);
            }
            Ok(Err(err)) => {
                error!(error = %err, "session store lookup failed");
                metrics::store_failure("error");
                return Err(AuthenticationReason::StoreUnavailable);
            }
            Ok(Ok(None)) => return Err(AuthenticationReason::UnknownSession),
            Ok(Ok(Some(record))) => record,
        };

        if record.is_revoked() {
            debug!(session_id = %record.session_id, "session revoked");
            return Err(AuthenticationReason::Revoked);
        }
        if record.is_expired_at(now) {
            debug!(session_id = %record.session_id, expires_at = %record.expires_at, "session expired");
            return Err(AuthenticationReason::Expired);
        }
        if !record.user.is_active {
            debug!(session_id = %record.session_id, user_id = %record.user.id, "session user inactive");
            return Err(AuthenticationReason::InactiveUser);
        }

        Ok(SessionContext::from(&record))
    }
}
