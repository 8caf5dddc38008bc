use std::net::SocketAddr;

// ── Resolution ──────────────────────────────────────────────────

/// Counter: cells resolved. Labels: kind.
pub const CELLS_RESOLVED_TOTAL: &str = "routecal_cells_resolved_total";

/// Histogram: snapshot load duration in seconds.
pub const SNAPSHOT_LOAD_DURATION_SECONDS: &str = "routecal_snapshot_load_duration_seconds";

// ── Coverage workflows ──────────────────────────────────────────

/// Counter: workflow proposals. Labels: workflow, outcome.
pub const WORKFLOW_PROPOSALS_TOTAL: &str = "routecal_workflow_proposals_total";

/// Counter: overlay commits. Labels: status.
pub const OVERLAY_COMMITS_TOTAL: &str = "routecal_overlay_commits_total";

/// Gauge: overlay entries held across all sessions.
pub const OVERLAY_ENTRIES: &str = "routecal_overlay_entries";

// ── Sessions ────────────────────────────────────────────────────

/// Gauge: open operator sessions.
pub const SESSIONS_ACTIVE: &str = "routecal_sessions_active";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), metrics_exporter_prometheus::BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}
