use once_cell::sync::Lazy;
use prometheus::{register_int_counter, Encoder, IntCounter, TextEncoder};

// Prometheus metrics (default registry)
pub static LOGIN_ATTEMPTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "taskhub_login_attempts_total",
        "Total login attempts, both transports"
    )
    .expect("register login_attempts_total")
});

pub static LOGIN_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "taskhub_login_failures_total",
        "Total failed login attempts"
    )
    .expect("register login_failures_total")
});

pub static REGISTRATIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "taskhub_registrations_total",
        "Total successful registrations"
    )
    .expect("register registrations_total")
});

pub static REGISTRATION_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "taskhub_registration_failures_total",
        "Total rejected registrations"
    )
    .expect("register registration_failures_total")
});

pub static BEARER_REJECTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "taskhub_bearer_rejected_total",
        "Total requests rejected for a missing or invalid bearer token"
    )
    .expect("register bearer_rejected_total")
});

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}

pub async fn metrics() -> (axum::http::StatusCode, String) {
    encode_metrics()
}
