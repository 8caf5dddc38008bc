use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::info;

use crate::backend::{CommitError, CoverageCommitter};
use crate::engine::{commit_overlays, InMemoryOverlayStore, OverlayEntry, OverlayKey, OverlayStore, Proposal};
use crate::limits::*;
use crate::model::TechId;
use crate::notify::{NotifyHub, OverlayEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    EmptyName,
    NameTooLong,
    TooManySessions,
    OverlayLimit(usize),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::EmptyName => write!(f, "empty session name"),
            SessionError::NameTooLong => write!(f, "session name too long"),
            SessionError::TooManySessions => write!(f, "too many sessions"),
            SessionError::OverlayLimit(max) => {
                write!(f, "session already holds the maximum of {max} overlays; commit or discard first")
            }
        }
    }
}

impl std::error::Error for SessionError {}

/// One operator's working state: the overlays they have applied but not yet
/// committed, plus listeners for changes to them.
pub struct Session {
    name: String,
    overlays: Arc<dyn OverlayStore>,
    notify: NotifyHub,
}

impl Session {
    pub fn new(name: impl Into<String>, overlays: Arc<dyn OverlayStore>) -> Self {
        Self {
            name: name.into(),
            overlays,
            notify: NotifyHub::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn overlays(&self) -> &dyn OverlayStore {
        self.overlays.as_ref()
    }

    pub fn subscribe(&self, tech_id: &TechId) -> broadcast::Receiver<OverlayEvent> {
        self.notify.subscribe(tech_id)
    }

    /// Write a proposal's entries, replacing any on the same cells.
    pub fn apply(&self, proposal: Proposal) -> Result<usize, SessionError> {
        let new_keys = proposal
            .entries
            .iter()
            .filter(|e| self.overlays.get(&e.key).is_none())
            .count();
        if self.overlays.len() + new_keys > MAX_OVERLAY_ENTRIES_PER_SESSION {
            return Err(SessionError::OverlayLimit(MAX_OVERLAY_ENTRIES_PER_SESSION));
        }

        let mut added = 0usize;
        let applied = proposal.entries.len();
        for entry in proposal.entries {
            let tech_id = entry.key.tech_id.clone();
            let event = OverlayEvent::Applied(entry.clone());
            if self.overlays.put(entry).is_none() {
                added += 1;
            }
            self.notify.send(&tech_id, &event);
        }
        metrics::gauge!(crate::observability::OVERLAY_ENTRIES).increment(added as f64);
        Ok(applied)
    }

    pub fn remove(&self, key: &OverlayKey) -> Option<OverlayEntry> {
        let removed = self.overlays.remove(key)?;
        metrics::gauge!(crate::observability::OVERLAY_ENTRIES).decrement(1.0);
        self.notify.send(&key.tech_id, &OverlayEvent::Removed(key.clone()));
        Some(removed)
    }

    /// Drop every overlay without persisting anything.
    pub fn discard(&self) -> usize {
        let dropped = self.overlays.len();
        self.overlays.clear();
        metrics::gauge!(crate::observability::OVERLAY_ENTRIES).decrement(dropped as f64);
        self.notify.send_cleared();
        info!("session {}: discarded {dropped} overlays", self.name);
        dropped
    }

    /// Persist overlays as coverage drafts; overlays stay on failure.
    pub async fn commit(&self, committer: &dyn CoverageCommitter) -> Result<usize, CommitError> {
        let before = self.overlays.len();
        let result = commit_overlays(self.overlays.as_ref(), committer).await;
        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(crate::observability::OVERLAY_COMMITS_TOTAL, "status" => status).increment(1);
        let drafts = result?;
        let removed = before.saturating_sub(self.overlays.len());
        metrics::gauge!(crate::observability::OVERLAY_ENTRIES).decrement(removed as f64);
        self.notify.send_cleared();
        self.notify.prune();
        Ok(drafts)
    }
}

/// Open sessions by name. Sessions are created lazily and start empty.
#[derive(Default)]
pub struct SessionManager {
    sessions: DashMap<String, Arc<Session>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or lazily create a session backed by an in-memory overlay store.
    pub fn get_or_create(&self, name: &str) -> Result<Arc<Session>, SessionError> {
        self.get_or_create_with(name, || Arc::new(InMemoryOverlayStore::new()))
    }

    /// Get or lazily create a session, building its overlay store with `make_store`.
    pub fn get_or_create_with(
        &self,
        name: &str,
        make_store: impl FnOnce() -> Arc<dyn OverlayStore>,
    ) -> Result<Arc<Session>, SessionError> {
        if let Some(session) = self.sessions.get(name) {
            return Ok(session.value().clone());
        }
        if name.len() > MAX_SESSION_NAME_LEN {
            return Err(SessionError::NameTooLong);
        }
        if name.trim().is_empty() {
            return Err(SessionError::EmptyName);
        }
        if self.sessions.len() >= MAX_SESSIONS {
            return Err(SessionError::TooManySessions);
        }

        let session = self
            .sessions
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Session::new(name, make_store())))
            .value()
            .clone();
        metrics::gauge!(crate::observability::SESSIONS_ACTIVE).set(self.sessions.len() as f64);
        info!("session {name} opened");
        Ok(session)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Session>> {
        self.sessions.get(name).map(|e| e.value().clone())
    }

    /// Close a session, discarding whatever it still holds.
    pub fn end(&self, name: &str) -> Option<Arc<Session>> {
        let (_, session) = self.sessions.remove(name)?;
        session.discard();
        metrics::gauge!(crate::observability::SESSIONS_ACTIVE).set(self.sessions.len() as f64);
        Some(session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
