use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Technician identifier, normalized to its string form.
///
/// Upstream sources disagree on whether ids are numbers or strings, so every
/// id crosses this boundary before it is compared: `42` and `"42"` are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TechId(String);

impl TechId {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.len() == raw.len() {
            Self(raw)
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TechId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TechId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for TechId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<i64> for TechId {
    fn from(raw: i64) -> Self {
        Self(raw.to_string())
    }
}

impl From<u64> for TechId {
    fn from(raw: u64) -> Self {
        Self(raw.to_string())
    }
}

impl From<i32> for TechId {
    fn from(raw: i32) -> Self {
        Self(raw.to_string())
    }
}

impl<'de> Deserialize<'de> for TechId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Signed(i64),
            Unsigned(u64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Signed(n) => TechId::from(n),
            RawId::Unsigned(n) => TechId::from(n),
            RawId::Text(s) => TechId::new(s),
        })
    }
}

/// Inclusive calendar-day range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DayRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DayRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        debug_assert!(start <= end, "DayRange start must not be after end");
        Self { start, end }
    }

    pub fn single(date: NaiveDate) -> Self {
        Self { start: date, end: date }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn overlaps(&self, other: &DayRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Service,
    Repair,
    Supervisor,
    Foreman,
}

impl Role {
    /// Supervisors and foremen share the inspection calendar and own a region.
    pub fn is_supervisory(&self) -> bool {
        matches!(self, Role::Supervisor | Role::Foreman)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    #[default]
    Summer,
    Winter,
}

impl std::str::FromStr for Season {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "summer" => Ok(Season::Summer),
            "winter" => Ok(Season::Winter),
            other => Err(format!("unknown season: {other}")),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Technician {
    pub id: TechId,
    pub name: String,
    pub role: Role,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub supervisor_id: Option<TechId>,
}

/// Recurring visit-day route for one (technician, property) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyAssignment {
    pub technician_id: TechId,
    pub property_id: String,
    pub property_name: String,
    #[serde(default)]
    pub summer_visit_days: Vec<String>,
    #[serde(default)]
    pub winter_visit_days: Vec<String>,
    /// Pre-season single list; read as the summer list when that one is empty.
    #[serde(default)]
    pub visit_days: Vec<String>,
    #[serde(default)]
    pub active_season: Option<Season>,
}

impl PropertyAssignment {
    /// An empty summer list counts as unset and reads the legacy list, unlike
    /// sources that only fall back when the field is missing.
    pub fn visit_days_for(&self, season: Season) -> &[String] {
        match season {
            Season::Summer if self.summer_visit_days.is_empty() => &self.visit_days,
            Season::Summer => &self.summer_visit_days,
            Season::Winter => &self.winter_visit_days,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleProperty {
    pub property_id: String,
    pub property_name: String,
    #[serde(default)]
    pub status: StopStatus,
}

/// Explicit one-off plan for a (technician, date) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: String,
    pub technician_id: TechId,
    pub date: NaiveDate,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub stop_count: u32,
    #[serde(default)]
    pub properties: Vec<ScheduleProperty>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageStatus {
    #[default]
    Active,
    Completed,
    Cancelled,
}

/// `covering_tech_id` stands in for `original_tech_id` on every day of
/// `[start_date, end_date]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coverage {
    pub id: String,
    pub original_tech_id: TechId,
    pub covering_tech_id: TechId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub status: CoverageStatus,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub property_id: Option<String>,
    #[serde(default)]
    pub property_name: Option<String>,
}

impl Coverage {
    pub fn is_active(&self) -> bool {
        self.status == CoverageStatus::Active
    }

    /// Inverted ranges cover nothing.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn overlaps(&self, range: &DayRange) -> bool {
        self.start_date <= range.end && range.start <= self.end_date
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeOff {
    pub id: String,
    pub technician_id: TechId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub covered_by_tech_id: Option<TechId>,
}

impl TimeOff {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn overlaps(&self, range: &DayRange) -> bool {
        self.start_date <= range.end && range.start <= self.end_date
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    #[default]
    Assigned,
    InProgress,
    Completed,
}

/// Quality-control inspection owned by a supervisor or foreman.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QcInspection {
    pub id: String,
    pub assignee_id: TechId,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub property_name: Option<String>,
    #[serde(default)]
    pub status: WorkStatus,
}

/// Repair job booked onto a repair technician's day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledRepair {
    pub id: String,
    pub assignee_id: TechId,
    pub scheduled_date: NaiveDate,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub property_name: Option<String>,
    #[serde(default)]
    pub status: WorkStatus,
}

/// Everything one resolution pass reads, as fetched from the domain source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub technicians: Vec<Technician>,
    pub assignments: Vec<PropertyAssignment>,
    pub schedules: Vec<Schedule>,
    pub coverages: Vec<Coverage>,
    pub time_off: Vec<TimeOff>,
    pub inspections: Vec<QcInspection>,
    pub repairs: Vec<ScheduledRepair>,
}
