//! Prometheus metrics exposition
//!
//! Token metrics are recorded by the refreshers themselves
//! (`token_refresh_*`); this module installs the exporter and adds the
//! agent's own series:
//!
//! - `webhook_requests_total` (counter): label `outcome`

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")
}

/// Count one webhook request by how it was handled (`challenge`, `event`,
/// `other`, or the rejection status code).
pub fn record_webhook_request(outcome: &str) {
    metrics::counter!("webhook_requests_total", "outcome" => outcome.to_string()).increment(1);
}
