use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{info, warn};
use ulid::Ulid;

use crate::calendar::WeekWindow;
use crate::limits::*;
use crate::model::*;

use super::overlay::{CoveringTech, OverlayEntry, OverlayKey, Proposal, RouteOverlay};
use super::resolve::DueProperty;
use super::{Engine, WorkflowError};

fn record(workflow: &'static str, result: Result<Proposal, WorkflowError>) -> Result<Proposal, WorkflowError> {
    let outcome = match &result {
        Ok(p) => {
            info!("{workflow} proposal accepted: {} overlay entries", p.entries.len());
            "accepted"
        }
        Err(e) => {
            warn!("{workflow} proposal rejected: {e}");
            "rejected"
        }
    };
    metrics::counter!(
        crate::observability::WORKFLOW_PROPOSALS_TOTAL,
        "workflow" => workflow,
        "outcome" => outcome
    )
    .increment(1);
    result
}

fn entry(tech_id: &TechId, day_index: usize, date: NaiveDate, overlay: RouteOverlay) -> OverlayEntry {
    OverlayEntry {
        id: Ulid::new(),
        key: OverlayKey::new(tech_id.clone(), day_index),
        date,
        overlay,
    }
}

impl Engine {
    fn known_technician(&self, id: &TechId) -> Result<&Technician, WorkflowError> {
        self.store
            .technician(id)
            .ok_or_else(|| WorkflowError::UnknownTechnician(id.clone()))
    }

    fn covering_tech(&self, id: &TechId) -> Result<CoveringTech, WorkflowError> {
        let t = self.known_technician(id)?;
        Ok(CoveringTech {
            id: t.id.clone(),
            name: t.name.clone(),
        })
    }

    /// Covering technician takes everything on `tech_id`'s route in `range`.
    ///
    /// Yields one entry per day of `range` inside the visible week.
    pub fn propose_extend(
        &self,
        window: &WeekWindow,
        tech_id: &TechId,
        properties: &[DueProperty],
        range: DayRange,
        covering_id: &TechId,
    ) -> Result<Proposal, WorkflowError> {
        record("extend", self.check_extend(window, tech_id, properties, range, covering_id))
    }

    fn check_extend(
        &self,
        window: &WeekWindow,
        tech_id: &TechId,
        properties: &[DueProperty],
        range: DayRange,
        covering_id: &TechId,
    ) -> Result<Proposal, WorkflowError> {
        if covering_id == tech_id {
            return Err(WorkflowError::SelfCoverage(covering_id.clone()));
        }
        self.known_technician(tech_id)?;
        let covering = self.known_technician(covering_id)?;
        if covering.role != Role::Service {
            return Err(WorkflowError::CoveringTechNotService(covering_id.clone()));
        }
        if range.start > range.end {
            return Err(WorkflowError::InvalidRange(range));
        }
        if range.len_days() > MAX_EXTEND_DAYS {
            return Err(WorkflowError::RangeTooLong {
                days: range.len_days(),
                max: MAX_EXTEND_DAYS,
            });
        }

        let covering = self.covering_tech(covering_id)?;
        let entries: Vec<OverlayEntry> = range
            .days()
            .filter_map(|date| window.index_of(date).map(|i| (i, date)))
            .map(|(i, date)| {
                entry(
                    tech_id,
                    i,
                    date,
                    RouteOverlay::Extended {
                        covering: covering.clone(),
                        range,
                    },
                )
            })
            .collect();
        if entries.is_empty() {
            return Err(WorkflowError::OutsideWeek(range.start));
        }
        info!(
            "extend {tech_id} -> {covering_id} {}..{} ({} stops on the selected day)",
            range.start,
            range.end,
            properties.len()
        );
        Ok(Proposal { entries })
    }

    /// Divide the day's route between two technicians.
    ///
    /// Partition entries are property ids or names; each must be on the route
    /// and on at most one side.
    #[allow(clippy::too_many_arguments)]
    pub fn propose_split(
        &self,
        window: &WeekWindow,
        tech_id: &TechId,
        properties: &[DueProperty],
        date: NaiveDate,
        tech_a_id: &TechId,
        tech_b_id: &TechId,
        partition_a: &[String],
        partition_b: &[String],
    ) -> Result<Proposal, WorkflowError> {
        record(
            "split",
            self.check_split(window, tech_id, properties, date, tech_a_id, tech_b_id, partition_a, partition_b),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn check_split(
        &self,
        window: &WeekWindow,
        tech_id: &TechId,
        properties: &[DueProperty],
        date: NaiveDate,
        tech_a_id: &TechId,
        tech_b_id: &TechId,
        partition_a: &[String],
        partition_b: &[String],
    ) -> Result<Proposal, WorkflowError> {
        if tech_a_id == tech_b_id {
            return Err(WorkflowError::DuplicateTechnician(tech_a_id.clone()));
        }
        for covering in [tech_a_id, tech_b_id] {
            if covering == tech_id {
                return Err(WorkflowError::SelfCoverage(covering.clone()));
            }
        }
        self.known_technician(tech_id)?;
        let tech_a = self.covering_tech(tech_a_id)?;
        let tech_b = self.covering_tech(tech_b_id)?;
        let day_index = window.index_of(date).ok_or(WorkflowError::OutsideWeek(date))?;
        if properties.is_empty() {
            return Err(WorkflowError::EmptyRoute);
        }

        if partition_a.len() + partition_b.len() > MAX_SPLIT_PROPERTIES {
            return Err(WorkflowError::LimitExceeded("too many properties in split"));
        }

        // Entries name a due property by id, or by name ignoring case.
        let pick = |entries: &[String]| -> Result<Vec<DueProperty>, WorkflowError> {
            let mut picked: Vec<DueProperty> = Vec::with_capacity(entries.len());
            for raw in entries {
                let wanted = raw.trim();
                let due = properties
                    .iter()
                    .find(|d| d.property_id == wanted)
                    .or_else(|| {
                        properties
                            .iter()
                            .find(|d| d.property_name.trim().eq_ignore_ascii_case(wanted))
                    })
                    .ok_or_else(|| WorkflowError::PropertyNotOnRoute(raw.clone()))?;
                if !picked.contains(due) {
                    picked.push(due.clone());
                }
            }
            Ok(picked)
        };
        let partition_a = pick(partition_a)?;
        let partition_b = pick(partition_b)?;

        let side_a: HashSet<&str> = partition_a.iter().map(|d| d.property_id.as_str()).collect();
        if let Some(shared) = partition_b.iter().find(|d| side_a.contains(d.property_id.as_str())) {
            return Err(WorkflowError::OverlappingPartition(shared.property_name.clone()));
        }

        Ok(Proposal {
            entries: vec![entry(
                tech_id,
                day_index,
                date,
                RouteOverlay::Split {
                    tech_a,
                    tech_b,
                    partition_a,
                    partition_b,
                },
            )],
        })
    }

    /// One technician takes every property due on `date`.
    pub fn propose_full_cover(
        &self,
        window: &WeekWindow,
        tech_id: &TechId,
        properties: &[DueProperty],
        date: NaiveDate,
        covering_id: &TechId,
    ) -> Result<Proposal, WorkflowError> {
        record("full_cover", self.check_full_cover(window, tech_id, properties, date, covering_id))
    }

    fn check_full_cover(
        &self,
        window: &WeekWindow,
        tech_id: &TechId,
        properties: &[DueProperty],
        date: NaiveDate,
        covering_id: &TechId,
    ) -> Result<Proposal, WorkflowError> {
        if covering_id == tech_id {
            return Err(WorkflowError::SelfCoverage(covering_id.clone()));
        }
        self.known_technician(tech_id)?;
        let covering = self.covering_tech(covering_id)?;
        let day_index = window.index_of(date).ok_or(WorkflowError::OutsideWeek(date))?;
        if properties.is_empty() {
            return Err(WorkflowError::EmptyRoute);
        }
        Ok(Proposal {
            entries: vec![entry(tech_id, day_index, date, RouteOverlay::Full { covering, date })],
        })
    }
}
