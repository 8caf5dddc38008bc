use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tracing::info;

use routecal::backend::{load_snapshot, StaticSource};
use routecal::calendar::WeekWindow;
use routecal::config::Settings;
use routecal::engine::{filter_roster, DomainStore, Engine, RosterView};
use routecal::session::SessionManager;

/// Resolve one week of the roster from a JSON snapshot and print the grid.
///
/// The snapshot comes from `ROUTECAL_SNAPSHOT`, or stdin when unset.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let settings = Settings::from_env();
    routecal::observability::init(settings.metrics_port)?;

    let raw = match &settings.snapshot_path {
        Some(path) => tokio::fs::read_to_string(path).await?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            buf
        }
    };
    let source = StaticSource::from_json(&raw)?;

    let anchor = settings
        .week_of
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let window = WeekWindow::containing(anchor, settings.week_starts_on);
    info!("routecal resolving week {}..{}", window.start, window.end());
    info!("  season: {:?}", settings.season);
    info!("  page_size: {}", settings.page_size);
    info!(
        "  metrics: {}",
        settings
            .metrics_port
            .map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics"))
    );

    let snapshot = load_snapshot(&source, window.range(), &settings.fetch).await?;
    let engine = Engine::new(Arc::new(DomainStore::from_snapshot(snapshot)), settings.season);

    let sessions = SessionManager::new();
    let session = sessions.get_or_create("cli")?;
    info!("session {} ready", session.name());

    let view = RosterView::new(settings.page_size, window);
    let page = view.current(engine.store());
    let grid = engine.resolve_week(&page.items, view.week(), session.overlays());
    // Header totals span the whole filtered roster, not just this page.
    let visible = filter_roster(engine.store(), view.filter());
    let stats = engine.week_stats(&visible, view.week());

    let out = serde_json::json!({
        "page": page.page,
        "totalPages": page.total_pages,
        "totalTechnicians": page.total_items,
        "stats": stats,
        "grid": grid,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    info!("resolved {} rows", grid.rows.len());

    // Keep the exporter up for scraping until interrupted.
    if settings.metrics_port.is_some() {
        info!("waiting for ctrl-c");
        tokio::signal::ctrl_c().await?;
    }

    sessions.end("cli");
    info!("routecal stopped");
    Ok(())
}
