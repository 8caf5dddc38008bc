use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use crate::model::*;

/// Shown wherever a referenced technician has no row in the snapshot.
pub const UNKNOWN_TECHNICIAN: &str = "Unknown";

/// Read-only, time-indexed view over one snapshot.
///
/// Dated collections are kept sorted by start date so that range queries can
/// skip everything starting after the window with a binary search.
pub struct DomainStore {
    technicians: HashMap<TechId, Technician>,
    assignments: HashMap<TechId, Vec<PropertyAssignment>>,
    /// Sorted by `date`.
    schedules: Vec<Schedule>,
    /// (technician, date) → index into `schedules`; first row wins.
    schedule_index: HashMap<(TechId, NaiveDate), usize>,
    /// Active coverages only, sorted by `start_date`.
    coverages: Vec<Coverage>,
    /// Sorted by `start_date`.
    time_off: Vec<TimeOff>,
    inspections: HashMap<(TechId, NaiveDate), Vec<QcInspection>>,
    repairs: HashMap<(TechId, NaiveDate), Vec<ScheduledRepair>>,
}

impl Default for DomainStore {
    fn default() -> Self {
        Self::from_snapshot(Snapshot::default())
    }
}

impl DomainStore {
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let Snapshot {
            technicians,
            assignments,
            mut schedules,
            coverages,
            mut time_off,
            inspections,
            repairs,
        } = snapshot;

        let technicians = technicians
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect();

        let mut by_tech: HashMap<TechId, Vec<PropertyAssignment>> = HashMap::new();
        for pa in assignments {
            by_tech.entry(pa.technician_id.clone()).or_default().push(pa);
        }

        // Stable: duplicate (tech, date) rows keep their source order.
        schedules.sort_by_key(|s| s.date);
        let mut schedule_index = HashMap::new();
        for (i, s) in schedules.iter().enumerate() {
            schedule_index
                .entry((s.technician_id.clone(), s.date))
                .or_insert(i);
        }

        let mut coverages: Vec<Coverage> = coverages.into_iter().filter(|c| c.is_active()).collect();
        coverages.sort_by_key(|c| c.start_date);
        time_off.sort_by_key(|t| t.start_date);

        let mut inspections_by_day: HashMap<(TechId, NaiveDate), Vec<QcInspection>> = HashMap::new();
        for qc in inspections {
            inspections_by_day
                .entry((qc.assignee_id.clone(), qc.due_date))
                .or_default()
                .push(qc);
        }
        let mut repairs_by_day: HashMap<(TechId, NaiveDate), Vec<ScheduledRepair>> = HashMap::new();
        for job in repairs {
            repairs_by_day
                .entry((job.assignee_id.clone(), job.scheduled_date))
                .or_default()
                .push(job);
        }

        Self {
            technicians,
            assignments: by_tech,
            schedules,
            schedule_index,
            coverages,
            time_off,
            inspections: inspections_by_day,
            repairs: repairs_by_day,
        }
    }

    // ── Technicians ──────────────────────────────────────────

    pub fn technician(&self, id: &TechId) -> Option<&Technician> {
        self.technicians.get(id)
    }

    pub fn technicians(&self) -> impl Iterator<Item = &Technician> {
        self.technicians.values()
    }

    /// Display name, or `"Unknown"` when the id has no row.
    pub fn technician_name(&self, id: &TechId) -> String {
        match self.technicians.get(id) {
            Some(t) => t.name.clone(),
            None => {
                tracing::debug!("no technician row for {id}");
                UNKNOWN_TECHNICIAN.to_string()
            }
        }
    }

    // ── Range queries ────────────────────────────────────────

    pub fn schedules_overlapping(&self, range: &DayRange) -> impl Iterator<Item = &Schedule> {
        let lo = self.schedules.partition_point(|s| s.date < range.start);
        let hi = self.schedules.partition_point(|s| s.date <= range.end);
        self.schedules[lo..hi].iter()
    }

    pub fn active_coverages_overlapping(&self, range: &DayRange) -> impl Iterator<Item = &Coverage> {
        // Everything at index >= right_bound starts after the window.
        let right_bound = self.coverages.partition_point(|c| c.start_date <= range.end);
        self.coverages[..right_bound]
            .iter()
            .filter(move |c| c.overlaps(range))
    }

    pub fn time_off_overlapping(&self, range: &DayRange) -> impl Iterator<Item = &TimeOff> {
        let right_bound = self.time_off.partition_point(|t| t.start_date <= range.end);
        self.time_off[..right_bound]
            .iter()
            .filter(move |t| t.overlaps(range))
    }

    pub fn assignments_for(&self, tech: &TechId) -> &[PropertyAssignment] {
        self.assignments.get(tech).map(Vec::as_slice).unwrap_or_default()
    }

    // ── Point lookups ────────────────────────────────────────

    pub fn schedule_for(&self, tech: &TechId, date: NaiveDate) -> Option<&Schedule> {
        self.schedule_index
            .get(&(tech.clone(), date))
            .map(|&i| &self.schedules[i])
    }

    pub fn time_off_for(&self, tech: &TechId, date: NaiveDate) -> Option<&TimeOff> {
        self.time_off_overlapping(&DayRange::single(date))
            .find(|t| &t.technician_id == tech)
    }

    /// Active coverage in which `tech` is the covering technician on `date`.
    pub fn coverage_covering(&self, tech: &TechId, date: NaiveDate) -> Option<&Coverage> {
        self.active_coverages_overlapping(&DayRange::single(date))
            .find(|c| &c.covering_tech_id == tech)
    }

    pub fn inspections_due(&self, tech: &TechId, date: NaiveDate) -> &[QcInspection] {
        self.inspections
            .get(&(tech.clone(), date))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn repairs_scheduled(&self, tech: &TechId, date: NaiveDate) -> &[ScheduledRepair] {
        self.repairs
            .get(&(tech.clone(), date))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Technicians holding at least one assignment for `property_id`.
    pub fn technicians_with_property(&self, property_id: &str) -> HashSet<&TechId> {
        self.assignments
            .iter()
            .filter(|(_, pas)| pas.iter().any(|pa| pa.property_id == property_id))
            .map(|(tech, _)| tech)
            .collect()
    }
}
