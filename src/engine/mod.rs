mod error;
mod overlay;
mod queries;
mod resolve;
mod roster;
mod store;
mod workflows;

pub use error::WorkflowError;
pub use overlay::{
    commit_overlays, decorate, CoverageDraft, CoveringTech, InMemoryOverlayStore, OverlayEntry, OverlayKey,
    OverlayStore, Proposal, RouteDecoration, RouteOverlay, SplitSelection, SplitSide, TaggedStop,
};
pub use queries::{ResolvedCell, RosterRow, WeekGrid, WeekStats};
pub use resolve::{
    due_properties, resolve, CellContent, CoveringNote, DueProperty, LeaveCell, RoleWork, RouteCell, ScheduledCell,
    Stop, WorkCard,
};
pub use roster::{filter_roster, paginate, region_of, Page, RegionFilter, RoleFilter, RosterFilter, RosterView};
pub use store::{DomainStore, UNKNOWN_TECHNICIAN};

use std::sync::Arc;

use crate::model::Season;

/// One resolution pass: an immutable snapshot plus the global season toggle.
///
/// Cheap to clone; the store is shared.
#[derive(Clone)]
pub struct Engine {
    store: Arc<DomainStore>,
    season: Season,
}

impl Engine {
    pub fn new(store: Arc<DomainStore>, season: Season) -> Self {
        Self { store, season }
    }

    pub fn store(&self) -> &DomainStore {
        &self.store
    }

    pub fn season(&self) -> Season {
        self.season
    }

    /// Same snapshot, other season.
    pub fn with_season(&self, season: Season) -> Self {
        Self {
            store: self.store.clone(),
            season,
        }
    }
}
