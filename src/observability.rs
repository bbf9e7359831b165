use std::net::SocketAddr;

// ── Reservation traffic ─────────────────────────────────────────

/// Counter: reservation attempts. Labels: status (`ok` | `rejected`).
pub const RESERVATIONS_TOTAL: &str = "innkeeper_reservations_total";

/// Counter: reservations cancelled.
pub const CANCELLATIONS_TOTAL: &str = "innkeeper_cancellations_total";

// ── Persistence ─────────────────────────────────────────────────

/// Gauge: hotels held by the booking system.
pub const HOTELS_LOADED: &str = "innkeeper_hotels_loaded";

/// Histogram: time to write every hotel to disk, in seconds.
pub const SAVE_DURATION_SECONDS: &str = "innkeeper_save_duration_seconds";

/// Histogram: time to load the data directory, in seconds.
pub const LOAD_DURATION_SECONDS: &str = "innkeeper_load_duration_seconds";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}
