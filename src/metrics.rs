use std::sync::OnceLock;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
///
/// Only one global recorder can exist per process; later calls return the
/// handle of the first installation.
pub fn init_metrics() -> PrometheusHandle {
    HANDLE.get_or_init(install).clone()
}

fn install() -> PrometheusHandle {
    let handle = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => handle,
        Err(e) => {
            tracing::warn!(error = %e, "Prometheus recorder already installed — metrics will not be exported");
            PrometheusBuilder::new().build_recorder().handle()
        }
    };

    // Pre-register counters so they appear even before the first increment.
    counter!("trades_created_total").absolute(0);
    counter!("trades_deleted_total").absolute(0);
    counter!("auth_failures_total").absolute(0);
    counter!("store_fallback_writes_total").absolute(0);
    counter!("store_replayed_writes_total").absolute(0);
    counter!("store_rejected_writes_total").absolute(0);

    gauge!("store_degraded").set(0.0);

    handle
}
