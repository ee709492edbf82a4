//! Prometheus metrics

use crate::api::table::Capability;
use anyhow::Result;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Setup Prometheus metrics exporter
/// Returns a handle that can be used to retrieve metrics
pub fn setup_metrics() -> Result<metrics_exporter_prometheus::PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

    tracing::info!("Prometheus metrics exporter installed");

    Ok(handle)
}

/// Record one dispatched capability call
pub fn record_request(capability: Capability, ok: bool) {
    metrics::counter!("libris_requests_total",
        "group" => capability.group().name(),
        "capability" => capability.name(),
        "outcome" => if ok { "ok" } else { "fail" }
    )
    .increment(1);
}

/// Record a request turned away by the token guard
///
/// `None` when the request path matches no declared route.
pub fn record_token_rejected(capability: Option<Capability>) {
    let (group, name) = match capability {
        Some(capability) => (capability.group().name(), capability.name()),
        None => ("unknown", "unknown"),
    };
    metrics::counter!("libris_token_rejections_total",
        "group" => group,
        "capability" => name
    )
    .increment(1);
}
