use once_cell::sync::Lazy;
use prometheus::{IntCounterVec, Opts};

static GATE_DECISIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    let c = IntCounterVec::new(
        Opts::new(
            "session_gate_decisions_total",
            "Authorization decisions made by the session gate",
        ),
        &["outcome"],
    )
    .expect("session_gate_decisions_total");
    let _ = prometheus::default_registry().register(Box::new(c.clone()));
    c
});

static STORE_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    let c = IntCounterVec::new(
        Opts::new(
            "session_store_failures_total",
            "Session store lookups that timed out or errored",
        ),
        &["kind"],
    )
    .expect("session_store_failures_total");
    let _ = prometheus::default_registry().register(Box::new(c.clone()));
    c
});

pub(crate) fn decision(outcome: &str) {
    GATE_DECISIONS.with_label_values(&[outcome]).inc();
}

pub(crate) fn store_failure(kind: &str) {
    STORE_FAILURES.with_label_values(&[kind]).inc();
}

pub fn decision_count(outcome: &str) -> u64 {
    GATE_DECISIONS.with_label_values(&[outcome]).get()
}
