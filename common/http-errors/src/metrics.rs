use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts};

use crate::ERROR_CODE_HEADER;

/// Distinct `code` label values tracked before further codes collapse into `overflow`.
pub const MAX_ERROR_CODES: usize = 40;

const OVERFLOW_LABEL: &str = "overflow";

static HTTP_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let c = IntCounterVec::new(
        Opts::new(
            "http_errors_total",
            "Count of HTTP error responses emitted (status >= 400)",
        ),
        &["service", "code", "status"],
    )
    .expect("http_errors_total");
    let _ = prometheus::default_registry().register(Box::new(c.clone()));
    c
});

static DISTINCT_CODES: Lazy<IntGauge> = Lazy::new(|| {
    let g = IntGauge::new(
        "http_error_codes_distinct",
        "Distinct error code label values currently tracked",
    )
    .expect("http_error_codes_distinct");
    let _ = prometheus::default_registry().register(Box::new(g.clone()));
    g
});

static OVERFLOW_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let c = IntCounter::new(
        "http_error_code_overflow_total",
        "Error responses whose code was folded into the overflow label",
    )
    .expect("http_error_code_overflow_total");
    let _ = prometheus::default_registry().register(Box::new(c.clone()));
    c
});

static SEEN_CODES: Lazy<Mutex<HashSet<String>>> = Lazy::new(|| Mutex::new(HashSet::new()));

/// Map an error code onto a bounded label set.
pub fn guarded_code_label(code: &str) -> String {
    let mut seen = match SEEN_CODES.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if seen.contains(code) {
        return code.to_string();
    }
    if seen.len() >= MAX_ERROR_CODES {
        OVERFLOW_TOTAL.inc();
        return OVERFLOW_LABEL.to_string();
    }
    seen.insert(code.to_string());
    DISTINCT_CODES.set(seen.len() as i64);
    code.to_string()
}

pub fn record_error(service: &str, code: &str, status: u16) {
    let label = guarded_code_label(code);
    HTTP_ERRORS_TOTAL
        .with_label_values(&[service, label.as_str(), &status.to_string()])
        .inc();
}

pub fn distinct_codes() -> i64 {
    DISTINCT_CODES.get()
}

pub fn overflow_count() -> u64 {
    OVERFLOW_TOTAL.get()
}

type LayerFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// Middleware for `axum::middleware::from_fn` counting every response with status >= 400.
pub fn http_error_metrics_layer(
    service: &'static str,
) -> impl Fn(Request, Next) -> LayerFuture + Clone + Send + Sync + 'static {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let resp = next.run(req).await;
            let status = resp.status();
            if status.as_u16() >= 400 {
                let code = resp
                    .headers()
                    .get(ERROR_CODE_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                record_error(service, code, status.as_u16());
            }
            resp
        }) as LayerFuture
    }
}
