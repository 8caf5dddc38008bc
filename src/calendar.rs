use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::model::DayRange;

/// Days shown in one calendar view.
pub const WEEK_LEN: usize = 7;

/// Parse a visit-day entry.
///
/// Accepts the three-letter abbreviation or the full English name in any
/// case, ignoring surrounding whitespace. Anything else is `None`, which
/// callers treat as "not due".
pub fn parse_visit_day(raw: &str) -> Option<Weekday> {
    let lower = raw.trim().to_ascii_lowercase();
    let day = match lower.as_str() {
        "mon" | "monday" => Weekday::Mon,
        "tue" | "tuesday" => Weekday::Tue,
        "wed" | "wednesday" => Weekday::Wed,
        "thu" | "thursday" => Weekday::Thu,
        "fri" | "friday" => Weekday::Fri,
        "sat" | "saturday" => Weekday::Sat,
        "sun" | "sunday" => Weekday::Sun,
        _ => return None,
    };
    Some(day)
}

/// True if any entry names the weekday of `date`.
pub fn visit_days_match<S: AsRef<str>>(entries: &[S], date: NaiveDate) -> bool {
    let weekday = date.weekday();
    entries
        .iter()
        .filter_map(|e| parse_visit_day(e.as_ref()))
        .any(|d| d == weekday)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl std::str::FromStr for WeekStart {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_visit_day(s) {
            Some(Weekday::Sun) => Ok(WeekStart::Sunday),
            Some(Weekday::Mon) => Ok(WeekStart::Monday),
            _ => Err(format!("week must start on sunday or monday, got: {s}")),
        }
    }
}

/// Seven consecutive calendar days beginning at `start`.
///
/// Overlay keys address a cell by its index in this window (0..7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeekWindow {
    pub start: NaiveDate,
}

impl WeekWindow {
    pub fn new(start: NaiveDate) -> Self {
        Self { start }
    }

    /// The week that contains `date`, aligned to `week_start`.
    pub fn containing(date: NaiveDate, week_start: WeekStart) -> Self {
        let back = match week_start {
            WeekStart::Sunday => date.weekday().num_days_from_sunday(),
            WeekStart::Monday => date.weekday().num_days_from_monday(),
        };
        Self::new(date - Duration::days(back as i64))
    }

    pub fn end(&self) -> NaiveDate {
        self.start + Duration::days(WEEK_LEN as i64 - 1)
    }

    pub fn range(&self) -> DayRange {
        DayRange::new(self.start, self.end())
    }

    pub fn date_at(&self, index: usize) -> Option<NaiveDate> {
        (index < WEEK_LEN).then(|| self.start + Duration::days(index as i64))
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        let offset = (date - self.start).num_days();
        (0..WEEK_LEN as i64).contains(&offset).then_some(offset as usize)
    }

    pub fn dates(&self) -> [NaiveDate; WEEK_LEN] {
        std::array::from_fn(|i| self.start + Duration::days(i as i64))
    }

    pub fn next(&self) -> Self {
        Self::new(self.start + Duration::days(WEEK_LEN as i64))
    }

    pub fn prev(&self) -> Self {
        Self::new(self.start - Duration::days(WEEK_LEN as i64))
    }
}
