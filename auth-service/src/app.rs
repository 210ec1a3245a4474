use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::{self, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::Router;
use common_http_errors::http_error_metrics_layer;
use common_session::{optional_auth, require_role, Role, SessionGate, SessionStore};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::admin_handlers::update_user_role;
use crate::config::AppConfig;
use crate::metrics::AuthMetrics;
use crate::session_handlers::{current_user, session_status, sign_in, sign_out, technician_ping};
use crate::store::AccountStore;

pub const SERVICE_NAME: &str = "revivatech-auth";

#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<SessionGate>,
    pub accounts: Arc<dyn AccountStore>,
    pub config: Arc<AppConfig>,
    pub metrics: Arc<AuthMetrics>,
}

impl AppState {
    /// `sessions` and `accounts` are normally the same store viewed through both traits.
    pub fn new(
        config: AppConfig,
        sessions: Arc<dyn SessionStore>,
        accounts: Arc<dyn AccountStore>,
    ) -> Result<Self> {
        let gate = Arc::new(SessionGate::new(sessions, config.gate_config()));
        Ok(Self {
            gate,
            accounts,
            config: Arc::new(config),
            metrics: Arc::new(AuthMetrics::new()?),
        })
    }

    /// Builds state over a single store implementing both traits.
    pub fn with_store<T: AccountStore>(config: AppConfig, store: Arc<T>) -> Result<Self> {
        let sessions: Arc<dyn SessionStore> = store.clone();
        let accounts: Arc<dyn AccountStore> = store;
        Self::new(config, sessions, accounts)
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn metrics_endpoint(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(response) => response,
        Err(err) => {
            warn!(error = %err, "failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(
            config
                .cors_origins
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        ))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE])
}

/// Every protected route gets exactly one gate layer; handlers only read its decision.
pub fn build_router(state: AppState) -> Router {
    let gate = state.gate.clone();

    let public = Router::new()
        .route("/api/auth/sign-in", post(sign_in))
        .route("/api/auth/sign-out", post(sign_out));

    let session = Router::new()
        .route("/api/auth/session", get(session_status))
        .route_layer(from_fn_with_state(gate.clone(), optional_auth));

    let customer = Router::new()
        .route("/api/auth/me", get(current_user))
        .route_layer(from_fn_with_state(gate.require(Role::Customer), require_role));

    let technician = Router::new()
        .route("/api/technician/ping", get(technician_ping))
        .route_layer(from_fn_with_state(gate.require(Role::Technician), require_role));

    let admin = Router::new()
        .route("/api/admin/users/:user_id/role", put(update_user_role))
        .route_layer(from_fn_with_state(gate.require(Role::Admin), require_role));

    let cors = cors_layer(&state.config);

    Router::new()
        .route("/healthz", get(health))
        .route("/metrics", get(metrics_endpoint))
        .merge(public)
        .merge(session)
        .merge(customer)
        .merge(technician)
        .merge(admin)
        .with_state(state)
        .layer(middleware::from_fn(http_error_metrics_layer(SERVICE_NAME)))
        .layer(cors)
}
