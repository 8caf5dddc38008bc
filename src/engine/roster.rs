use serde::Serialize;

use crate::calendar::WeekWindow;
use crate::limits::*;
use crate::model::*;

use super::store::DomainStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoleFilter {
    #[default]
    All,
    Service,
    Repair,
    /// Supervisors and foremen.
    Supervisor,
}

impl RoleFilter {
    pub fn matches(&self, role: Role) -> bool {
        match self {
            RoleFilter::All => true,
            RoleFilter::Service => role == Role::Service,
            RoleFilter::Repair => role == Role::Repair,
            RoleFilter::Supervisor => role.is_supervisory(),
        }
    }
}

impl std::str::FromStr for RoleFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Ok(RoleFilter::All),
            "service" => Ok(RoleFilter::Service),
            "repair" => Ok(RoleFilter::Repair),
            "supervisor" | "foreman" => Ok(RoleFilter::Supervisor),
            other => Err(format!("unknown role filter: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RegionFilter {
    #[default]
    All,
    South,
    Middle,
    North,
}

impl RegionFilter {
    /// Region code as stored on supervisor rows.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            RegionFilter::All => None,
            RegionFilter::South => Some("south"),
            RegionFilter::Middle => Some("mid"),
            RegionFilter::North => Some("north"),
        }
    }
}

impl std::str::FromStr for RegionFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Ok(RegionFilter::All),
            "south" => Ok(RegionFilter::South),
            "middle" | "mid" => Ok(RegionFilter::Middle),
            "north" => Ok(RegionFilter::North),
            other => Err(format!("unknown region: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterFilter {
    pub role: RoleFilter,
    /// Case-insensitive substring of the technician name.
    pub search: String,
    pub region: RegionFilter,
    /// Only technicians with an assignment for this property.
    pub property_id: Option<String>,
}

/// Region a technician belongs to.
///
/// Supervisors and foremen carry their own; everyone else inherits it from
/// their supervisor.
pub fn region_of<'a>(store: &'a DomainStore, technician: &'a Technician) -> Option<&'a str> {
    if technician.role.is_supervisory() {
        return technician.region.as_deref();
    }
    let supervisor = store.technician(technician.supervisor_id.as_ref()?)?;
    supervisor.region.as_deref()
}

/// Active technicians passing every filter, ordered by name then id.
pub fn filter_roster<'a>(store: &'a DomainStore, filter: &RosterFilter) -> Vec<&'a Technician> {
    let needle = filter.search.trim().to_lowercase();
    let with_property = filter
        .property_id
        .as_deref()
        .map(|p| store.technicians_with_property(p));

    let mut visible: Vec<&Technician> = store
        .technicians()
        .filter(|t| t.active)
        .filter(|t| filter.role.matches(t.role))
        .filter(|t| needle.is_empty() || t.name.to_lowercase().contains(&needle))
        .filter(|t| match filter.region.code() {
            None => true,
            Some(code) => region_of(store, t).is_some_and(|r| r.trim().eq_ignore_ascii_case(code)),
        })
        .filter(|t| with_property.as_ref().is_none_or(|ids| ids.contains(&t.id)))
        .collect();
    visible.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    visible
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based.
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Slice `items` into fixed-size pages. Out-of-range pages clamp to the
/// nearest valid one; an empty list has a single empty page.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
    let total_pages = items.len().div_ceil(page_size).max(1);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * page_size;
    let end = (start + page_size).min(items.len());
    Page {
        items: items[start.min(end)..end].to_vec(),
        page,
        total_pages,
        total_items: items.len(),
    }
}

/// Operator-facing roster state. Every filter or week change goes back to
/// page 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterView {
    filter: RosterFilter,
    week: WeekWindow,
    page: usize,
    page_size: usize,
}

impl RosterView {
    pub fn new(page_size: usize, week: WeekWindow) -> Self {
        Self {
            filter: RosterFilter::default(),
            week,
            page: 1,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn filter(&self) -> &RosterFilter {
        &self.filter
    }

    pub fn week(&self) -> &WeekWindow {
        &self.week
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn set_role(&mut self, role: RoleFilter) {
        self.filter.role = role;
        self.page = 1;
    }

    pub fn set_search(&mut self, search: &str) {
        self.filter.search = search.chars().take(MAX_SEARCH_LEN).collect();
        self.page = 1;
    }

    pub fn set_region(&mut self, region: RegionFilter) {
        self.filter.region = region;
        self.page = 1;
    }

    pub fn set_property(&mut self, property_id: Option<String>) {
        self.filter.property_id = property_id;
        self.page = 1;
    }

    pub fn set_week(&mut self, week: WeekWindow) {
        self.week = week;
        self.page = 1;
    }

    pub fn next_week(&mut self) {
        self.set_week(self.week.next());
    }

    pub fn prev_week(&mut self) {
        self.set_week(self.week.prev());
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// Current page, clamped to the filtered roster.
    pub fn current<'a>(&self, store: &'a DomainStore) -> Page<&'a Technician> {
        let visible = filter_roster(store, &self.filter);
        paginate(&visible, self.page, self.page_size)
    }
}
