use std::sync::OnceLock;

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the Prometheus recorder exactly once and describes every
/// series it exposes. Safe to call more than once — only the first
/// call takes effect.
pub fn init() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install prometheus recorder");
            describe();
            handle
        })
        .clone()
}

fn describe() {
    describe_counter!("payflow_transactions_posted_total", Unit::Count, "Transactions posted by type and terminal status");
    describe_counter!("payflow_webhooks_received_total", Unit::Count, "Inbound gateway webhooks received, by outcome");
    describe_counter!("payflow_webhooks_sent_total", Unit::Count, "Outbound partner webhooks attempted, by outcome");
    describe_counter!("payflow_rate_limited_total", Unit::Count, "Requests rejected by the per-key rate limiter");
    describe_histogram!("payflow_http_request_duration_ms", Unit::Milliseconds, "HTTP request latency in milliseconds");
    describe_histogram!("payflow_ledger_append_duration_ms", Unit::Milliseconds, "Ledger append latency in milliseconds");
}

pub fn record_transaction_posted(transaction_type: &str, status: &str) {
    counter!(
        "payflow_transactions_posted_total",
        "type" => transaction_type.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_webhook_received(outcome: &str) {
    counter!("payflow_webhooks_received_total", "outcome" => outcome.to_string()).increment(1);
}

pub fn record_webhook_sent(outcome: &str) {
    counter!("payflow_webhooks_sent_total", "outcome" => outcome.to_string()).increment(1);
}

pub fn record_rate_limited() {
    counter!("payflow_rate_limited_total").increment(1);
}

pub fn record_http_request(method: &str, path: &str, duration_ms: f64) {
    histogram!(
        "payflow_http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

pub fn record_ledger_append(duration_ms: f64) {
    histogram!("payflow_ledger_append_duration_ms").record(duration_ms);
}

/// Renders the current Prometheus text exposition, for `GET /metrics`.
/// Installs the recorder lazily if nothing has called `init()` yet
/// (e.g. in a test binary that never calls `main`).
pub fn render() -> String {
    init().render()
}
