use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::calendar::WeekWindow;
use crate::model::*;

use super::overlay::{decorate, OverlayKey, OverlayStore, RouteDecoration};
use super::resolve::{resolve, CellContent};
use super::Engine;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedCell {
    pub date: NaiveDate,
    pub day_index: usize,
    pub content: CellContent,
    pub decoration: Option<RouteDecoration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterRow {
    pub tech_id: TechId,
    pub name: String,
    pub role: Role,
    pub on_leave_this_week: bool,
    pub covering_this_week: bool,
    pub cells: Vec<ResolvedCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekGrid {
    pub window: WeekWindow,
    pub rows: Vec<RosterRow>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekStats {
    pub active_techs: usize,
    pub total_stops: u32,
    pub active_coverages: usize,
}

impl Engine {
    /// Resolve a cell by technician id. Unknown ids resolve to `Empty`.
    pub fn resolve(&self, tech_id: &TechId, date: NaiveDate) -> CellContent {
        let content = match self.store.technician(tech_id) {
            Some(technician) => resolve(technician, date, &self.store, self.season),
            None => {
                debug!("resolve: no technician row for {tech_id}");
                CellContent::Empty
            }
        };
        metrics::counter!(crate::observability::CELLS_RESOLVED_TOTAL, "kind" => content.kind_label())
            .increment(1);
        content
    }

    /// Resolve one cell of the visible week and apply its route overlay.
    pub fn resolve_cell(
        &self,
        technician: &Technician,
        window: &WeekWindow,
        day_index: usize,
        overlays: &dyn OverlayStore,
    ) -> Option<ResolvedCell> {
        let date = window.date_at(day_index)?;
        let content = resolve(technician, date, &self.store, self.season);
        metrics::counter!(crate::observability::CELLS_RESOLVED_TOTAL, "kind" => content.kind_label())
            .increment(1);
        let entry = match &content {
            CellContent::RecurringRoute(_) => overlays.get(&OverlayKey::new(technician.id.clone(), day_index)),
            _ => None,
        };
        let decoration = decorate(&content, date, entry.as_ref());
        Some(ResolvedCell {
            date,
            day_index,
            content,
            decoration,
        })
    }

    /// Resolve seven cells for each technician. Inactive technicians are skipped.
    pub fn resolve_week(&self, technicians: &[&Technician], window: &WeekWindow, overlays: &dyn OverlayStore) -> WeekGrid {
        let range = window.range();
        let rows = technicians
            .iter()
            .filter(|t| t.active)
            .map(|t| RosterRow {
                tech_id: t.id.clone(),
                name: t.name.clone(),
                role: t.role,
                on_leave_this_week: self
                    .store
                    .time_off_overlapping(&range)
                    .any(|off| off.technician_id == t.id),
                covering_this_week: self
                    .store
                    .active_coverages_overlapping(&range)
                    .any(|c| c.covering_tech_id == t.id),
                cells: (0..crate::calendar::WEEK_LEN)
                    .filter_map(|i| self.resolve_cell(t, window, i, overlays))
                    .collect(),
            })
            .collect();
        WeekGrid { window: *window, rows }
    }

    /// Header numbers for the visible week.
    pub fn week_stats(&self, technicians: &[&Technician], window: &WeekWindow) -> WeekStats {
        let range = window.range();
        WeekStats {
            active_techs: technicians.iter().filter(|t| t.active).count(),
            total_stops: self
                .store
                .schedules_overlapping(&range)
                .map(|s| s.stop_count)
                .sum(),
            active_coverages: self.store.active_coverages_overlapping(&range).count(),
        }
    }
}
