use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use tracing::debug;

use crate::error::AuthenticationReason;
use crate::gate::SessionGate;
use crate::metrics;
use crate::record::SessionContext;
use crate::roles::Role;

/// Result of the one store lookup made for a request, shared by every gate layer on the route.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedSession(pub(crate) Result<SessionContext, AuthenticationReason>);

/// State for [`require_role`]: the gate plus the route's minimum role.
#[derive(Clone)]
pub struct RoleGuard {
    gate: Arc<SessionGate>,
    required: Role,
}

impl RoleGuard {
    pub fn new(gate: Arc<SessionGate>, required: Role) -> Self {
        Self { gate, required }
    }

    pub fn required(&self) -> Role {
        self.required
    }
}

impl SessionGate {
    /// `router.route_layer(from_fn_with_state(gate.require(Role::Admin), require_role))`
    pub fn require(self: &Arc<Self>, required: Role) -> RoleGuard {
        RoleGuard::new(self.clone(), required)
    }
}

/// Returns the session for this request and whether an outer layer already resolved it.
async fn resolve_once(
    gate: &SessionGate,
    request: &mut Request,
) -> (Result<SessionContext, AuthenticationReason>, bool) {
    if let Some(ResolvedSession(prior)) = request.extensions().get::<ResolvedSession>() {
        return (prior.clone(), true);
    }
    let token = gate.token_from_headers(request.headers());
    let resolved = gate.resolve(token.as_deref(), Utc::now()).await;
    request
        .extensions_mut()
        .insert(ResolvedSession(resolved.clone()));
    (resolved, false)
}

/// Rejects with 401/403 unless the session's role meets the guard's minimum.
/// On success the [`SessionContext`] is available to handlers via request extensions.
pub async fn require_role(State(guard): State<RoleGuard>, mut request: Request, next: Next) -> Response {
    let (resolved, reused) = resolve_once(&guard.gate, &mut request).await;
    // The outer layer that resolved the session has already counted this request.
    let decision = if reused {
        guard.gate.evaluate(resolved, guard.required)
    } else {
        guard.gate.conclude(resolved, guard.required)
    };
    match decision.into_result() {
        Ok(context) => {
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

/// Attaches the [`SessionContext`] when the session is valid; otherwise continues anonymously.
pub async fn optional_auth(State(gate): State<Arc<SessionGate>>, mut request: Request, next: Next) -> Response {
    let (resolved, reused) = resolve_once(&gate, &mut request).await;
    match resolved {
        Ok(context) => {
            debug!(user_id = %context.user_id, role = %context.role, "session attached");
            if !reused {
                metrics::decision("authorized");
            }
            request.extensions_mut().insert(context);
        }
        Err(reason) => {
            debug!(%reason, "continuing anonymously");
            if !reused {
                metrics::decision("anonymous");
            }
        }
    }
    next.run(request).await
}
