use std::collections::BTreeSet;

use chrono::NaiveDate;
use dashmap::DashMap;
use serde::Serialize;
use ulid::Ulid;

use crate::backend::{CommitError, CoverageCommitter};
use crate::model::{DayRange, TechId};

use super::resolve::{CellContent, DueProperty};

/// Addresses one route cell: technician and index in the visible week.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayKey {
    pub tech_id: TechId,
    pub day_index: usize,
}

impl OverlayKey {
    pub fn new(tech_id: TechId, day_index: usize) -> Self {
        Self { tech_id, day_index }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoveringTech {
    pub id: TechId,
    pub name: String,
}

/// Ephemeral reassignment shown on top of a recurring route cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteOverlay {
    /// Covering technician takes everything in `range`.
    Extended { covering: CoveringTech, range: DayRange },
    /// The day's properties divided between two technicians.
    Split {
        tech_a: CoveringTech,
        tech_b: CoveringTech,
        partition_a: Vec<DueProperty>,
        partition_b: Vec<DueProperty>,
    },
    /// One technician takes every property due on `date`.
    Full { covering: CoveringTech, date: NaiveDate },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayEntry {
    pub id: Ulid,
    pub key: OverlayKey,
    /// Concrete day the key pointed at when the entry was made.
    pub date: NaiveDate,
    pub overlay: RouteOverlay,
}

impl OverlayEntry {
    /// Coverage records this entry would become once persisted.
    pub fn drafts(&self) -> Vec<CoverageDraft> {
        let original = &self.key.tech_id;
        match &self.overlay {
            RouteOverlay::Extended { covering, range } => vec![CoverageDraft {
                original_tech_id: original.clone(),
                covering_tech_id: covering.id.clone(),
                start_date: range.start,
                end_date: range.end,
                property_id: None,
            }],
            RouteOverlay::Full { covering, date } => vec![CoverageDraft {
                original_tech_id: original.clone(),
                covering_tech_id: covering.id.clone(),
                start_date: *date,
                end_date: *date,
                property_id: None,
            }],
            RouteOverlay::Split {
                tech_a,
                tech_b,
                partition_a,
                partition_b,
            } => {
                let side = |owner: &CoveringTech, props: &[DueProperty]| {
                    props
                        .iter()
                        .map(|p| CoverageDraft {
                            original_tech_id: original.clone(),
                            covering_tech_id: owner.id.clone(),
                            start_date: self.date,
                            end_date: self.date,
                            property_id: Some(p.property_id.clone()),
                        })
                        .collect::<Vec<_>>()
                };
                let mut drafts = side(tech_a, partition_a);
                drafts.extend(side(tech_b, partition_b));
                drafts
            }
        }
    }
}

/// Result of a validated workflow, ready to be applied to an overlay store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Proposal {
    pub entries: Vec<OverlayEntry>,
}

/// A coverage record to be written by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageDraft {
    pub original_tech_id: TechId,
    pub covering_tech_id: TechId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub property_id: Option<String>,
}

// ── Overlay store ────────────────────────────────────────────────

/// Session-local map from cell key to overlay entry.
pub trait OverlayStore: Send + Sync {
    fn get(&self, key: &OverlayKey) -> Option<OverlayEntry>;
    /// Insert or replace; returns the replaced entry.
    fn put(&self, entry: OverlayEntry) -> Option<OverlayEntry>;
    fn remove(&self, key: &OverlayKey) -> Option<OverlayEntry>;
    fn entries(&self) -> Vec<OverlayEntry>;
    fn clear(&self);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Default)]
pub struct InMemoryOverlayStore {
    entries: DashMap<OverlayKey, OverlayEntry>,
}

impl InMemoryOverlayStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OverlayStore for InMemoryOverlayStore {
    fn get(&self, key: &OverlayKey) -> Option<OverlayEntry> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    fn put(&self, entry: OverlayEntry) -> Option<OverlayEntry> {
        self.entries.insert(entry.key.clone(), entry)
    }

    fn remove(&self, key: &OverlayKey) -> Option<OverlayEntry> {
        self.entries.remove(key).map(|(_, e)| e)
    }

    fn entries(&self) -> Vec<OverlayEntry> {
        let mut all: Vec<OverlayEntry> = self.entries.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.key.cmp(&b.key));
        all
    }

    fn clear(&self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

// ── Decoration ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaggedStop {
    pub property_id: String,
    pub property_name: String,
    /// Covering technician that owns this stop today, if any.
    pub owner: Option<String>,
}

/// Badge and ownership data layered over a recurring route cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteDecoration {
    Extended { covering_name: String, range: DayRange },
    Full { covering_name: String, stops: Vec<TaggedStop> },
    Split { tech_a_name: String, tech_b_name: String, stops: Vec<TaggedStop> },
}

impl RouteDecoration {
    pub fn owner_of(&self, property_name: &str) -> Option<&str> {
        let stops = match self {
            RouteDecoration::Extended { .. } => return None,
            RouteDecoration::Full { stops, .. } | RouteDecoration::Split { stops, .. } => stops,
        };
        stops
            .iter()
            .find(|s| s.property_name == property_name)
            .and_then(|s| s.owner.as_deref())
    }
}

/// Decorate a resolved cell with its overlay entry.
///
/// Only recurring route cells are decorated, and only by an entry made for
/// the same date; the resolved case itself is never changed.
pub fn decorate(content: &CellContent, date: NaiveDate, entry: Option<&OverlayEntry>) -> Option<RouteDecoration> {
    let CellContent::RecurringRoute(route) = content else {
        return None;
    };
    let entry = entry.filter(|e| e.date == date)?;
    let decoration = match &entry.overlay {
        RouteOverlay::Extended { covering, range } => RouteDecoration::Extended {
            covering_name: covering.name.clone(),
            range: *range,
        },
        RouteOverlay::Full { covering, .. } => RouteDecoration::Full {
            covering_name: covering.name.clone(),
            stops: route
                .properties
                .iter()
                .map(|p| tag(p, Some(&covering.name)))
                .collect(),
        },
        RouteOverlay::Split {
            tech_a,
            tech_b,
            partition_a,
            partition_b,
        } => RouteDecoration::Split {
            tech_a_name: tech_a.name.clone(),
            tech_b_name: tech_b.name.clone(),
            stops: route
                .properties
                .iter()
                .map(|p| {
                    let owner = if partition_a.iter().any(|q| q.property_id == p.property_id) {
                        Some(&tech_a.name)
                    } else if partition_b.iter().any(|q| q.property_id == p.property_id) {
                        Some(&tech_b.name)
                    } else {
                        None
                    };
                    tag(p, owner)
                })
                .collect(),
        },
    };
    Some(decoration)
}

fn tag(p: &DueProperty, owner: Option<&String>) -> TaggedStop {
    TaggedStop {
        property_id: p.property_id.clone(),
        property_name: p.property_name.clone(),
        owner: owner.cloned(),
    }
}

// ── Split input collection ───────────────────────────────────────

/// Which side of a split a property is on while the operator picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitSide {
    A,
    B,
}

/// Property picker for the split workflow.
///
/// A property lives on at most one side: selecting it for one technician
/// deselects it from the other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitSelection {
    a: BTreeSet<String>,
    b: BTreeSet<String>,
}

impl SplitSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, side: SplitSide, property_id: impl Into<String>) {
        let property_id = property_id.into();
        let (mine, other) = match side {
            SplitSide::A => (&mut self.a, &mut self.b),
            SplitSide::B => (&mut self.b, &mut self.a),
        };
        other.remove(&property_id);
        mine.insert(property_id);
    }

    pub fn deselect(&mut self, property_id: &str) {
        self.a.remove(property_id);
        self.b.remove(property_id);
    }

    /// Flip a property's membership on `side`.
    pub fn toggle(&mut self, side: SplitSide, property_id: &str) {
        let selected = match side {
            SplitSide::A => self.a.contains(property_id),
            SplitSide::B => self.b.contains(property_id),
        };
        if selected {
            self.deselect(property_id);
        } else {
            self.select(side, property_id);
        }
    }

    pub fn side_of(&self, property_id: &str) -> Option<SplitSide> {
        if self.a.contains(property_id) {
            Some(SplitSide::A)
        } else if self.b.contains(property_id) {
            Some(SplitSide::B)
        } else {
            None
        }
    }

    pub fn partitions(&self) -> (Vec<String>, Vec<String>) {
        (self.a.iter().cloned().collect(), self.b.iter().cloned().collect())
    }
}

// ── Commit ───────────────────────────────────────────────────────

/// Hand every overlay in `store` to `committer` as coverage drafts.
///
/// Committed entries are removed only when the committer accepts the batch;
/// on error the overlays stay so the operator can retry. Entries replaced
/// while the commit was in flight are kept.
pub async fn commit_overlays(store: &dyn OverlayStore, committer: &dyn CoverageCommitter) -> Result<usize, CommitError> {
    let entries = store.entries();
    let drafts: BTreeSet<CoverageDraft> = entries.iter().flat_map(OverlayEntry::drafts).collect();
    let drafts: Vec<CoverageDraft> = drafts.into_iter().collect();
    if !drafts.is_empty() {
        committer.commit(&drafts).await?;
    }
    for entry in &entries {
        if store.get(&entry.key).is_some_and(|current| current.id == entry.id) {
            store.remove(&entry.key);
        }
    }
    tracing::info!(
        "committed {} overlay entries as {} coverage drafts",
        entries.len(),
        drafts.len()
    );
    Ok(drafts.len())
}
