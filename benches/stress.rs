use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{Duration as Days, NaiveDate};

use routecal::backend::{load_snapshot, CommitError, CoverageCommitter, RetryPolicy, StaticSource};
use routecal::calendar::{WeekStart, WeekWindow, WEEK_LEN};
use routecal::engine::{due_properties, CoverageDraft, DomainStore, Engine, RosterView};
use routecal::model::*;
use routecal::session::SessionManager;

const TECHNICIANS: usize = 2_000;
const PROPERTIES_PER_TECH: usize = 12;
const WEEKS: i64 = 8;
const DAYS: [&str; 7] = ["sun", "Mon", "TUE", "wednesday", "thu", "Friday", "sat"];

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    if latencies.is_empty() {
        return;
    }
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.2}ms, p50={:.2}ms, p95={:.2}ms, p99={:.2}ms, max={:.2}ms",
        latencies.len(),
        avg.as_secs_f64() * 1000.0,
        percentile(latencies, 50.0).as_secs_f64() * 1000.0,
        percentile(latencies, 95.0).as_secs_f64() * 1000.0,
        percentile(latencies, 99.0).as_secs_f64() * 1000.0,
        latencies[latencies.len() - 1].as_secs_f64() * 1000.0,
    );
}

/// Every tenth technician supervises the next nine; a rotating share of the
/// crew is on leave, covering, or scheduled in any given week.
fn synthetic_snapshot(first_day: NaiveDate) -> Snapshot {
    let mut snap = Snapshot::default();
    let regions = ["south", "mid", "north"];
    for i in 0..TECHNICIANS {
        let id = TechId::from(i as u64);
        let supervisor = i - i % 10;
        let role = match i % 10 {
            0 => Role::Supervisor,
            9 => Role::Repair,
            _ => Role::Service,
        };
        snap.technicians.push(Technician {
            id: id.clone(),
            name: format!("Tech {i:05}"),
            role,
            active: i % 97 != 0 || role == Role::Supervisor,
            region: (role == Role::Supervisor).then(|| regions[i / 10 % 3].to_string()),
            supervisor_id: (role != Role::Supervisor).then(|| TechId::from(supervisor as u64)),
        });
        for p in 0..PROPERTIES_PER_TECH {
            snap.assignments.push(PropertyAssignment {
                technician_id: id.clone(),
                property_id: format!("p{i}-{p}"),
                property_name: format!("{p} Route {i} Rd"),
                summer_visit_days: vec![DAYS[(i + p) % 7].to_string(), DAYS[(i + p + 3) % 7].to_string()],
                winter_visit_days: vec![DAYS[(i + p) % 7].to_string()],
                visit_days: vec![],
                active_season: Some(Season::Summer),
            });
        }
    }

    for week in 0..WEEKS {
        let start = first_day + Days::days(week * WEEK_LEN as i64);
        for i in (week as usize..TECHNICIANS).step_by(13) {
            snap.time_off.push(TimeOff {
                id: format!("t{week}-{i}"),
                technician_id: TechId::from(i as u64),
                start_date: start + Days::days(1),
                end_date: start + Days::days(3),
                reason: None,
                covered_by_tech_id: Some(TechId::from(((i + 1) % TECHNICIANS) as u64)),
            });
        }
        for i in (week as usize..TECHNICIANS).step_by(7) {
            snap.schedules.push(Schedule {
                id: format!("s{week}-{i}"),
                technician_id: TechId::from(i as u64),
                date: start + Days::days((i % 7) as i64),
                start_time: None,
                end_time: None,
                stop_count: 8,
                properties: vec![],
            });
        }
        for i in (week as usize..TECHNICIANS).step_by(11) {
            snap.coverages.push(Coverage {
                id: format!("c{week}-{i}"),
                original_tech_id: TechId::from(i as u64),
                covering_tech_id: TechId::from(((i + 2) % TECHNICIANS) as u64),
                start_date: start + Days::days(2),
                end_date: start + Days::days(5),
                status: CoverageStatus::Active,
                reason: None,
                property_id: None,
                property_name: None,
            });
        }
    }
    snap
}

struct NullCommitter;

#[async_trait]
impl CoverageCommitter for NullCommitter {
    async fn commit(&self, _drafts: &[CoverageDraft]) -> Result<(), CommitError> {
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let first_week = WeekWindow::containing(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(), WeekStart::Sunday);
    println!("routecal stress: {TECHNICIANS} technicians, {WEEKS} weeks");

    let started = Instant::now();
    let snapshot = synthetic_snapshot(first_week.start);
    println!("  build snapshot: {:.2}ms", started.elapsed().as_secs_f64() * 1000.0);

    let whole = DayRange::new(first_week.start, first_week.start + Days::days(WEEKS * WEEK_LEN as i64 - 1));
    let started = Instant::now();
    let snapshot = load_snapshot(&StaticSource::new(snapshot), whole, &RetryPolicy::default())
        .await
        .unwrap();
    println!("  load snapshot: {:.2}ms", started.elapsed().as_secs_f64() * 1000.0);

    let started = Instant::now();
    let engine = Engine::new(Arc::new(DomainStore::from_snapshot(snapshot)), Season::Summer);
    println!("  index store: {:.2}ms", started.elapsed().as_secs_f64() * 1000.0);

    let sessions = SessionManager::new();
    let session = sessions.get_or_create("bench").unwrap();

    // ── Paged week grids ─────────────────────────────────────
    let mut page_latencies = Vec::new();
    let mut view = RosterView::new(50, first_week);
    for _ in 0..WEEKS {
        let total_pages = view.current(engine.store()).total_pages;
        for page in 1..=total_pages {
            view.go_to_page(page);
            let t = Instant::now();
            let rows = view.current(engine.store());
            let grid = engine.resolve_week(&rows.items, view.week(), session.overlays());
            page_latencies.push(t.elapsed());
            assert_eq!(grid.rows.len(), rows.items.len());
        }
        view.next_week();
    }
    print_latency("resolve_week (page of 50)", &mut page_latencies);

    // ── Full roster, one grid per week ───────────────────────
    let mut full_latencies = Vec::new();
    let all: Vec<&Technician> = engine.store().technicians().collect();
    let mut window = first_week;
    for _ in 0..WEEKS {
        let t = Instant::now();
        let grid = engine.resolve_week(&all, &window, session.overlays());
        full_latencies.push(t.elapsed());
        let _ = engine.week_stats(&all, &window);
        assert!(!grid.rows.is_empty());
        window = window.next();
    }
    print_latency("resolve_week (full roster)", &mut full_latencies);

    // ── Full-cover proposals, apply, commit ──────────────────
    let mut propose_latencies = Vec::new();
    let service: Vec<&Technician> = all.iter().copied().filter(|t| t.role == Role::Service && t.active).collect();
    for pair in service.chunks_exact(2).take(500) {
        let (tech, covering) = (pair[0], pair[1]);
        let Some(date) = first_week
            .dates()
            .into_iter()
            .find(|date| !due_properties(engine.store().assignments_for(&tech.id), *date, Season::Summer).is_empty())
        else {
            continue;
        };
        let props = due_properties(engine.store().assignments_for(&tech.id), date, Season::Summer);
        let t = Instant::now();
        if let Ok(proposal) = engine.propose_full_cover(&first_week, &tech.id, &props, date, &covering.id) {
            let _ = session.apply(proposal);
        }
        propose_latencies.push(t.elapsed());
    }
    print_latency("propose_full_cover + apply", &mut propose_latencies);

    let t = Instant::now();
    let drafts = session.commit(&NullCommitter).await.unwrap();
    println!("  commit: {drafts} drafts in {:.2}ms", t.elapsed().as_secs_f64() * 1000.0);
}
