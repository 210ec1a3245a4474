use anyhow::Result;
use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct AuthMetrics {
    registry: Registry,
    sign_in_attempts: IntCounterVec,
    role_changes: IntCounterVec,
}

impl AuthMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let sign_in_attempts = IntCounterVec::new(
            Opts::new(
                "auth_sign_in_attempts_total",
                "Count of sign-in attempts grouped by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(sign_in_attempts.clone()))?;

        let role_changes = IntCounterVec::new(
            Opts::new("auth_role_changes_total", "Role changes by administrators"),
            &["outcome"],
        )?;
        registry.register(Box::new(role_changes.clone()))?;

        Ok(Self {
            registry,
            sign_in_attempts,
            role_changes,
        })
    }

    pub fn sign_in_attempt(&self, outcome: &str) {
        self.sign_in_attempts.with_label_values(&[outcome]).inc();
    }

    pub fn role_change(&self, outcome: &str) {
        self.role_changes.with_label_values(&[outcome]).inc();
    }

    /// Service counters plus the process-wide registry (gate decisions, HTTP errors).
    pub fn render(&self) -> Result<Response> {
        let encoder = TextEncoder::new();
        let mut metric_families = self.registry.gather();
        metric_families.extend(prometheus::gather());
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        let response = Response::builder()
            .status(StatusCode::OK)
            .header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            )
            .body(Body::from(buffer))?;
        Ok(response)
    }
}
