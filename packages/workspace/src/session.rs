//! # Edit Session
//!
//! The open page and its save status, shared between the controller and the
//! save orchestrator.
//!
//! The lock is a plain `std::sync::Mutex` and is never held across an
//! `.await`: every method takes it, does its synchronous work and drops it.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use folio_editor::{
    ConcurrentSaveRejected, DirtyStateTracker, Document, Mutation, MutationError, PathMutator,
    SaveStatus, StatusChange,
};
use tokio::sync::broadcast;

use crate::errors::WorkspaceError;

const STATUS_CHANNEL_CAPACITY: usize = 64;

/// A status transition, as broadcast to subscribers
#[derive(Debug, Clone, PartialEq)]
pub struct StatusEvent {
    pub change: StatusChange,
    pub at: DateTime<Utc>,
}

struct Session {
    document: Document,
    tracker: DirtyStateTracker,

    /// Section → newest version edited there and not yet saved
    unsaved: BTreeMap<String, u64>,
}

#[derive(Clone)]
pub(crate) struct SessionHandle {
    state: Arc<Mutex<Session>>,
    events: broadcast::Sender<StatusEvent>,
    status_display: Option<Duration>,
}

impl SessionHandle {
    pub(crate) fn new(document: Document, status_display: Option<Duration>) -> Self {
        let (events, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(Session {
                document,
                tracker: DirtyStateTracker::new(),
                unsaved: BTreeMap::new(),
            })),
            events,
            status_display,
        }
    }

    pub(crate) fn snapshot(&self) -> Document {
        self.lock().document.clone()
    }

    pub(crate) fn status(&self) -> SaveStatus {
        self.lock().tracker.status()
    }

    pub(crate) fn saved_version(&self) -> u64 {
        self.lock().tracker.saved_version()
    }

    pub(crate) fn last_error(&self) -> Option<String> {
        self.lock().tracker.last_error().map(str::to_string)
    }

    pub(crate) fn unsaved_sections(&self) -> Vec<String> {
        self.lock().unsaved.keys().cloned().collect()
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.events.subscribe()
    }

    /// Swap in a freshly loaded document
    pub(crate) fn replace(&self, document: Document) -> Result<(), WorkspaceError> {
        let mut session = self.lock();
        if session.tracker.status() == SaveStatus::Saving {
            return Err(WorkspaceError::SaveInFlight);
        }

        session.document = document;
        session.unsaved.clear();
        let change = session.tracker.reset();
        self.emit(change);
        Ok(())
    }

    /// Apply `mutation`; the new version, or `None` when it was dropped
    pub(crate) fn apply(
        &self,
        mutation: &Mutation,
        mutator: &PathMutator,
    ) -> Result<Option<u64>, MutationError> {
        let mut session = self.lock();

        let Some(next) = session.document.apply(mutation, mutator)? else {
            tracing::warn!(
                "[Session] {} into missing section {:?} dropped",
                mutation.name(),
                mutation.section()
            );
            return Ok(None);
        };

        let version = next.version;
        session.document = next;
        if let Some(section) = mutation.section() {
            session.unsaved.insert(section.to_string(), version);
        }

        let change = session.tracker.record_mutation(version);
        self.emit(change);
        Ok(Some(version))
    }

    pub(crate) fn begin_save(&self) -> Result<(), ConcurrentSaveRejected> {
        let change = self.lock().tracker.begin_save()?;
        self.emit(Some(change));
        Ok(())
    }

    /// Everything up to `persisted_version` is stored
    pub(crate) fn complete_save(&self, persisted_version: u64) {
        let (change, epoch) = {
            let mut session = self.lock();
            session
                .unsaved
                .retain(|_, version| *version > persisted_version);
            let change = session.tracker.complete_save(persisted_version);
            (change, session.tracker.epoch())
        };
        self.emit(change);
        self.schedule_settle(epoch);
    }

    /// The save ran no step; back to `dirty` or `clean` without a settle timer
    pub(crate) fn abandon_save(&self) {
        let change = self.lock().tracker.abandon_save();
        self.emit(change);
    }

    pub(crate) fn fail_save(&self, message: String) {
        let (change, epoch) = {
            let mut session = self.lock();
            let change = session.tracker.fail_save(message);
            (change, session.tracker.epoch())
        };
        self.emit(change);
        self.schedule_settle(epoch);
    }

    fn settle(&self, epoch: u64) {
        let change = self.lock().tracker.settle(epoch);
        self.emit(change);
    }

    fn schedule_settle(&self, epoch: u64) {
        let Some(delay) = self.status_display else {
            return;
        };
        let handle = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            handle.settle(epoch);
        });
    }

    fn emit(&self, change: Option<StatusChange>) {
        let Some(change) = change else {
            return;
        };
        tracing::debug!("[Session] status {} → {}", change.from, change.to);
        // no subscribers is fine
        let _ = self.events.send(StatusEvent {
            change,
            at: Utc::now(),
        });
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
