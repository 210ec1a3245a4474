use std::sync::Arc;

use axum::body::Body;
use axum::http::{header::COOKIE, Request, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;
use chrono::{Duration, Utc};
use common_session::metrics::decision_count;
use common_session::{
    optional_auth, require_role, GateConfig, InMemorySessionStore, MaybeSession, Role,
    SessionGate, SessionRecord, SessionUser,
};
use tower::util::ServiceExt;
use uuid::Uuid;

// Kept in its own test binary: the counters are process-wide.

fn session(role: Role) -> SessionRecord {
    let now = Utc::now();
    SessionRecord {
        session_id: Uuid::new_v4(),
        user: SessionUser {
            id: Uuid::new_v4(),
            email: "staff@revivatech.test".into(),
            role,
            email_verified: true,
            is_active: true,
        },
        created_at: now,
        expires_at: now + Duration::hours(1),
        revoked_at: None,
    }
}

async fn signed_in(session: MaybeSession) -> &'static str {
    if session.is_authenticated() {
        "signed-in"
    } else {
        "anonymous"
    }
}

fn request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(COOKIE, format!("session_token={token}"));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn stacked_layers_count_one_decision_per_request() {
    let store = InMemorySessionStore::new();
    store.insert("T1", session(Role::Admin));
    let gate = Arc::new(SessionGate::new(Arc::new(store), GateConfig::new()));

    let guard = gate.require(Role::Admin);
    assert_eq!(guard.required(), Role::Admin);

    let app: Router = Router::new()
        .route("/admin", get(signed_in))
        .route_layer(from_fn_with_state(guard, require_role))
        .route_layer(from_fn_with_state(gate.clone(), optional_auth));

    let authorized = decision_count("authorized");
    let resp = app.clone().oneshot(request("/admin", Some("T1"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(decision_count("authorized"), authorized + 1);

    let anonymous = decision_count("anonymous");
    let required = decision_count("authentication_required");
    let resp = app.oneshot(request("/admin", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(decision_count("anonymous"), anonymous + 1);
    assert_eq!(decision_count("authentication_required"), required);
}

#[tokio::test]
async fn single_gate_counts_its_own_decision() {
    let store = InMemorySessionStore::new();
    store.insert("C1", session(Role::Customer));
    let gate = Arc::new(SessionGate::new(Arc::new(store), GateConfig::new()));

    let app: Router = Router::new()
        .route("/owner", get(signed_in))
        .route_layer(from_fn_with_state(gate.require(Role::SuperAdmin), require_role));

    let forbidden = decision_count("forbidden");
    let resp = app.oneshot(request("/owner", Some("C1"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(decision_count("forbidden"), forbidden + 1);
}
