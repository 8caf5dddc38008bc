//! Interfaces to the services that own persisted data.
//!
//! The calendar core never talks to storage directly. It reads a snapshot
//! through [`DomainSource`] before a resolution pass and hands committed
//! overlays to a [`CoverageCommitter`].

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::engine::CoverageDraft;
use crate::model::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    Unavailable(String),
    Malformed(String),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Unavailable(msg) => write!(f, "source unavailable: {msg}"),
            SourceError::Malformed(msg) => write!(f, "malformed source data: {msg}"),
        }
    }
}

impl std::error::Error for SourceError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitError {
    Rejected(String),
    Unavailable(String),
}

impl std::fmt::Display for CommitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommitError::Rejected(msg) => write!(f, "coverage commit rejected: {msg}"),
            CommitError::Unavailable(msg) => write!(f, "coverage backend unavailable: {msg}"),
        }
    }
}

impl std::error::Error for CommitError {}

/// Range-addressed reads of the seven collections a resolution pass needs.
#[async_trait]
pub trait DomainSource: Send + Sync {
    async fn technicians(&self, range: DayRange) -> Result<Vec<Technician>, SourceError>;
    async fn assignments(&self, range: DayRange) -> Result<Vec<PropertyAssignment>, SourceError>;
    async fn schedules(&self, range: DayRange) -> Result<Vec<Schedule>, SourceError>;
    async fn coverages(&self, range: DayRange) -> Result<Vec<Coverage>, SourceError>;
    async fn time_off(&self, range: DayRange) -> Result<Vec<TimeOff>, SourceError>;
    async fn inspections(&self, range: DayRange) -> Result<Vec<QcInspection>, SourceError>;
    async fn repairs(&self, range: DayRange) -> Result<Vec<ScheduledRepair>, SourceError>;
}

/// Persists coverage drafts produced from session overlays.
#[async_trait]
pub trait CoverageCommitter: Send + Sync {
    async fn commit(&self, drafts: &[CoverageDraft]) -> Result<(), CommitError>;
}

/// Serves a fixed snapshot, filtering dated rows to the requested range.
#[derive(Debug)]
pub struct StaticSource {
    snapshot: Snapshot,
}

impl StaticSource {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    /// Parse a camelCase JSON snapshot.
    pub fn from_json(raw: &str) -> Result<Self, SourceError> {
        let snapshot = serde_json::from_str(raw).map_err(|e| SourceError::Malformed(e.to_string()))?;
        Ok(Self::new(snapshot))
    }
}

#[async_trait]
impl DomainSource for StaticSource {
    async fn technicians(&self, _range: DayRange) -> Result<Vec<Technician>, SourceError> {
        Ok(self.snapshot.technicians.clone())
    }

    async fn assignments(&self, _range: DayRange) -> Result<Vec<PropertyAssignment>, SourceError> {
        Ok(self.snapshot.assignments.clone())
    }

    async fn schedules(&self, range: DayRange) -> Result<Vec<Schedule>, SourceError> {
        Ok(self
            .snapshot
            .schedules
            .iter()
            .filter(|s| range.contains(s.date))
            .cloned()
            .collect())
    }

    async fn coverages(&self, range: DayRange) -> Result<Vec<Coverage>, SourceError> {
        Ok(self
            .snapshot
            .coverages
            .iter()
            .filter(|c| c.overlaps(&range))
            .cloned()
            .collect())
    }

    async fn time_off(&self, range: DayRange) -> Result<Vec<TimeOff>, SourceError> {
        Ok(self
            .snapshot
            .time_off
            .iter()
            .filter(|t| t.overlaps(&range))
            .cloned()
            .collect())
    }

    async fn inspections(&self, range: DayRange) -> Result<Vec<QcInspection>, SourceError> {
        Ok(self
            .snapshot
            .inspections
            .iter()
            .filter(|qc| range.contains(qc.due_date))
            .cloned()
            .collect())
    }

    async fn repairs(&self, range: DayRange) -> Result<Vec<ScheduledRepair>, SourceError> {
        Ok(self
            .snapshot
            .repairs
            .iter()
            .filter(|job| range.contains(job.scheduled_date))
            .cloned()
            .collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total tries per collection, including the first.
    pub attempts: u32,
    /// Sleep before retry `n` is `backoff * n`.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(200),
        }
    }
}

async fn fetch_with_retry<T, F, Fut>(what: &'static str, policy: &RetryPolicy, mut op: F) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(rows) => return Ok(rows),
            Err(e) if attempt < attempts => {
                warn!("fetch {what} failed (attempt {attempt}/{attempts}): {e}");
                tokio::time::sleep(policy.backoff * attempt).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Fetch everything a resolution pass over `range` reads.
///
/// All collections are fetched concurrently and retried per `policy`. The
/// role-scoped collections (inspections, repairs) degrade to empty when they
/// keep failing; the rest are required.
pub async fn load_snapshot(source: &dyn DomainSource, range: DayRange, policy: &RetryPolicy) -> Result<Snapshot, SourceError> {
    let started = Instant::now();
    let (technicians, assignments, schedules, coverages, time_off, inspections, repairs) = futures::join!(
        fetch_with_retry("technicians", policy, || source.technicians(range)),
        fetch_with_retry("assignments", policy, || source.assignments(range)),
        fetch_with_retry("schedules", policy, || source.schedules(range)),
        fetch_with_retry("coverages", policy, || source.coverages(range)),
        fetch_with_retry("time_off", policy, || source.time_off(range)),
        fetch_with_retry("inspections", policy, || source.inspections(range)),
        fetch_with_retry("repairs", policy, || source.repairs(range)),
    );

    let snapshot = Snapshot {
        technicians: technicians?,
        assignments: assignments?,
        schedules: schedules?,
        coverages: coverages?,
        time_off: time_off?,
        inspections: inspections.unwrap_or_else(|e| {
            warn!("inspections unavailable, resolving without them: {e}");
            Vec::new()
        }),
        repairs: repairs.unwrap_or_else(|e| {
            warn!("repairs unavailable, resolving without them: {e}");
            Vec::new()
        }),
    };

    metrics::histogram!(crate::observability::SNAPSHOT_LOAD_DURATION_SECONDS)
        .record(started.elapsed().as_secs_f64());
    info!(
        "loaded snapshot {}..{}: {} technicians, {} schedules, {} coverages, {} time off",
        range.start,
        range.end,
        snapshot.technicians.len(),
        snapshot.schedules.len(),
        snapshot.coverages.len(),
        snapshot.time_off.len()
    );
    Ok(snapshot)
}
