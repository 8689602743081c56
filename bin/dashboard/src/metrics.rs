//! Prometheus metrics for the dashboard.
//!
//! All metrics are aggregated in the [`Metrics`] struct.

use metrics::{counter, describe_counter, describe_gauge, gauge};

/// Aggregated metrics for the dashboard.
///
/// Metrics are registered with the global metrics registry on creation. Without
/// an installed exporter every call is a no-op.
#[derive(Debug, Clone)]
pub struct Metrics {
    _private: (),
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self::register_descriptions();
        Self { _private: () }
    }

    fn register_descriptions() {
        // Price metrics
        describe_counter!(
            "dashboard_price_fetch_success_total",
            "Total successful price refreshes"
        );
        describe_counter!(
            "dashboard_price_fetch_failure_total",
            "Total failed price refreshes"
        );

        // Transaction metrics
        describe_counter!(
            "dashboard_tx_submitted_total",
            "Total transactions broadcast by flow"
        );
        describe_counter!(
            "dashboard_tx_confirmed_total",
            "Total transactions confirmed by flow"
        );
        describe_counter!(
            "dashboard_tx_failed_total",
            "Total transactions that reverted or could not be confirmed, by flow"
        );
        describe_counter!(
            "dashboard_wallet_rejections_total",
            "Total signature requests declined by the user, by flow"
        );

        describe_gauge!(
            "dashboard_token_balance",
            "Last observed token balance of the connected account, by symbol"
        );
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Price metrics
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn record_price_fetch(&self, success: bool) {
        if success {
            counter!("dashboard_price_fetch_success_total").increment(1);
        } else {
            counter!("dashboard_price_fetch_failure_total").increment(1);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Transaction metrics
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn record_tx_submitted(&self, flow: &str) {
        counter!("dashboard_tx_submitted_total", "flow" => flow.to_string()).increment(1);
    }

    /// Record the terminal outcome of a transaction.
    pub fn record_tx_outcome(&self, flow: &str, success: bool) {
        if success {
            counter!("dashboard_tx_confirmed_total", "flow" => flow.to_string()).increment(1);
        } else {
            counter!("dashboard_tx_failed_total", "flow" => flow.to_string()).increment(1);
        }
    }

    pub fn record_rejection(&self, flow: &str) {
        counter!("dashboard_wallet_rejections_total", "flow" => flow.to_string()).increment(1);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Balance metrics (gauges)
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn set_token_balance(&self, symbol: &str, balance: f64) {
        gauge!("dashboard_token_balance", "symbol" => symbol.to_string()).set(balance);
    }
}

/// Install the Prometheus metrics exporter and start the HTTP server.
///
/// Returns an error if the server fails to bind to the specified port.
pub fn install_prometheus_exporter(port: u16) -> eyre::Result<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::net::SocketAddr;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| eyre::eyre!("Failed to install Prometheus exporter: {}", e))?;

    Ok(())
}
