use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::calendar::visit_days_match;
use crate::model::*;

use super::store::DomainStore;

const DEFAULT_LEAVE_REASON: &str = "Time off";

// ── Cell content ─────────────────────────────────────────────────

/// What governs one (technician, day) cell. Exactly one case per cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellContent {
    OnLeave(LeaveCell),
    Scheduled(ScheduledCell),
    Covering(CoveringNote),
    RoleWorkItems(RoleWork),
    RecurringRoute(RouteCell),
    Empty,
}

impl CellContent {
    /// Short label for logs and metrics.
    pub fn kind_label(&self) -> &'static str {
        match self {
            CellContent::OnLeave(_) => "on_leave",
            CellContent::Scheduled(_) => "scheduled",
            CellContent::Covering(_) => "covering",
            CellContent::RoleWorkItems(_) => "role_work_items",
            CellContent::RecurringRoute(_) => "recurring_route",
            CellContent::Empty => "empty",
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellContent::Empty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveCell {
    pub time_off_id: String,
    pub reason: String,
    /// Name of the technician covering the absence, if one was named.
    pub covered_by: Option<String>,
    /// Shown under the leave badge; never replaces it.
    pub also_covering: Option<CoveringNote>,
}

/// "Covering for X": this technician stands in for another one today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoveringNote {
    pub coverage_id: String,
    pub original_tech_id: TechId,
    pub original_tech_name: String,
    pub property_name: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub property_id: String,
    pub property_name: String,
    pub status: StopStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledCell {
    pub schedule_id: String,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    /// Target stop count as planned, independent of linked stops.
    pub stop_count: u32,
    pub stops: Vec<Stop>,
    pub completed: usize,
    pub total: usize,
    pub covering: Option<CoveringNote>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkCard {
    pub id: String,
    pub title: String,
    pub property_name: Option<String>,
    pub status: WorkStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", content = "items", rename_all = "snake_case")]
pub enum RoleWork {
    Inspections(Vec<WorkCard>),
    Repairs(Vec<WorkCard>),
}

impl RoleWork {
    pub fn cards(&self) -> &[WorkCard] {
        match self {
            RoleWork::Inspections(cards) | RoleWork::Repairs(cards) => cards,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueProperty {
    pub property_id: String,
    pub property_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteCell {
    pub properties: Vec<DueProperty>,
}

// ── Resolution ───────────────────────────────────────────────────

/// Decide which fact governs `technician`'s cell on `date`.
///
/// Precedence, first match wins: time off, schedule, coverage, role work
/// items (supervisor/foreman/repair), recurring route (service), empty.
/// Never fails: missing rows degrade toward `Empty`.
pub fn resolve(technician: &Technician, date: NaiveDate, store: &DomainStore, season: Season) -> CellContent {
    if !technician.active {
        return CellContent::Empty;
    }
    let tech = &technician.id;

    let covering = store
        .coverage_covering(tech, date)
        .map(|c| covering_note(c, store));

    if let Some(leave) = store.time_off_for(tech, date) {
        return CellContent::OnLeave(LeaveCell {
            time_off_id: leave.id.clone(),
            reason: leave
                .reason
                .clone()
                .unwrap_or_else(|| DEFAULT_LEAVE_REASON.to_string()),
            covered_by: leave
                .covered_by_tech_id
                .as_ref()
                .map(|id| store.technician_name(id)),
            also_covering: covering,
        });
    }

    if let Some(schedule) = store.schedule_for(tech, date) {
        return CellContent::Scheduled(scheduled_cell(schedule, covering));
    }

    if let Some(note) = covering {
        return CellContent::Covering(note);
    }

    if let Some(work) = role_work(technician, date, store) {
        return CellContent::RoleWorkItems(work);
    }

    if technician.role == Role::Service {
        let properties = due_properties(store.assignments_for(tech), date, season);
        if !properties.is_empty() {
            return CellContent::RecurringRoute(RouteCell { properties });
        }
    }

    CellContent::Empty
}

/// Properties whose visit days for `season` include `date`'s weekday,
/// ordered by name then id.
pub fn due_properties(assignments: &[PropertyAssignment], date: NaiveDate, season: Season) -> Vec<DueProperty> {
    let mut due: Vec<DueProperty> = assignments
        .iter()
        .filter(|pa| visit_days_match(pa.visit_days_for(season), date))
        .map(|pa| DueProperty {
            property_id: pa.property_id.clone(),
            property_name: pa.property_name.clone(),
        })
        .collect();
    due.sort_by(|a, b| {
        a.property_name
            .cmp(&b.property_name)
            .then_with(|| a.property_id.cmp(&b.property_id))
    });
    due.dedup();
    due
}

fn covering_note(coverage: &Coverage, store: &DomainStore) -> CoveringNote {
    CoveringNote {
        coverage_id: coverage.id.clone(),
        original_tech_id: coverage.original_tech_id.clone(),
        original_tech_name: store.technician_name(&coverage.original_tech_id),
        property_name: coverage.property_name.clone(),
        reason: coverage.reason.clone(),
    }
}

fn scheduled_cell(schedule: &Schedule, covering: Option<CoveringNote>) -> ScheduledCell {
    let stops: Vec<Stop> = schedule
        .properties
        .iter()
        .map(|p| Stop {
            property_id: p.property_id.clone(),
            property_name: p.property_name.clone(),
            status: p.status,
        })
        .collect();
    let completed = stops
        .iter()
        .filter(|s| s.status == StopStatus::Completed)
        .count();
    ScheduledCell {
        schedule_id: schedule.id.clone(),
        start_time: schedule.start_time,
        end_time: schedule.end_time,
        stop_count: schedule.stop_count,
        total: stops.len(),
        completed,
        stops,
        covering,
    }
}

fn role_work(technician: &Technician, date: NaiveDate, store: &DomainStore) -> Option<RoleWork> {
    let tech = &technician.id;
    let work = match technician.role {
        Role::Supervisor | Role::Foreman => {
            let cards: Vec<WorkCard> = store
                .inspections_due(tech, date)
                .iter()
                .map(|qc| WorkCard {
                    id: qc.id.clone(),
                    title: qc.title.clone(),
                    property_name: qc.property_name.clone(),
                    status: qc.status,
                })
                .collect();
            RoleWork::Inspections(cards)
        }
        Role::Repair => {
            let cards: Vec<WorkCard> = store
                .repairs_scheduled(tech, date)
                .iter()
                .map(|job| WorkCard {
                    id: job.id.clone(),
                    title: job.title.clone(),
                    property_name: job.property_name.clone(),
                    status: job.status,
                })
                .collect();
            RoleWork::Repairs(cards)
        }
        Role::Service => return None,
    };
    (!work.cards().is_empty()).then_some(work)
}
