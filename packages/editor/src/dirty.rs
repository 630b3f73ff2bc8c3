//! # Dirty State Tracking
//!
//! Save status of the open page, as shown next to the save control.
//!
//! ```text
//!            mutation                 begin_save
//!  clean ─────────────▶ dirty ─────────────────▶ saving
//!    ▲                    ▲                     │    │
//!    │ settle             │ settle (unsaved)    │    │ fail_save
//!    │                    │                     ▼    ▼
//!    └──────────── saved ◀─┴──── complete_save ─┘  error
//! ```
//!
//! Versions rather than booleans decide what is unsaved: the tracker knows the
//! newest mutation version and the newest version a save actually covered, so
//! it never reports `clean` or `saved` while an edit is still only in memory.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    Clean,
    Dirty,
    Saving,
    Saved,
    Error,
}

impl SaveStatus {
    /// Whether the save control should be enabled
    pub fn can_trigger_save(self) -> bool {
        matches!(self, SaveStatus::Dirty | SaveStatus::Error)
    }

    /// `saved` and `error` are shown for a while, then settle
    pub fn is_transient(self) -> bool {
        matches!(self, SaveStatus::Saved | SaveStatus::Error)
    }
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SaveStatus::Clean => "clean",
            SaveStatus::Dirty => "dirty",
            SaveStatus::Saving => "saving",
            SaveStatus::Saved => "saved",
            SaveStatus::Error => "error",
        };
        f.write_str(label)
    }
}

/// A single status transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: SaveStatus,
    pub to: SaveStatus,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("A save is already in progress")]
pub struct ConcurrentSaveRejected;

#[derive(Debug, Clone)]
pub struct DirtyStateTracker {
    status: SaveStatus,

    /// Version of the newest applied mutation
    version: u64,

    /// Newest version covered by a successful save
    saved_version: u64,

    /// Bumped whenever a transient status is entered
    epoch: u64,

    last_error: Option<String>,
}

impl DirtyStateTracker {
    pub fn new() -> Self {
        Self {
            status: SaveStatus::Clean,
            version: 0,
            saved_version: 0,
            epoch: 0,
            last_error: None,
        }
    }

    pub fn status(&self) -> SaveStatus {
        self.status
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn saved_version(&self) -> u64 {
        self.saved_version
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.version > self.saved_version
    }

    /// A mutation producing `version` was applied
    pub fn record_mutation(&mut self, version: u64) -> Option<StatusChange> {
        self.version = self.version.max(version);

        // an in-flight save finishes first and then notices the newer version
        if self.status == SaveStatus::Saving {
            return None;
        }
        self.transition(SaveStatus::Dirty)
    }

    /// Enter `saving`, unless a save is already running
    pub fn begin_save(&mut self) -> Result<StatusChange, ConcurrentSaveRejected> {
        if self.status == SaveStatus::Saving {
            return Err(ConcurrentSaveRejected);
        }
        let from = self.status;
        self.status = SaveStatus::Saving;
        self.last_error = None;
        Ok(StatusChange {
            from,
            to: SaveStatus::Saving,
        })
    }

    /// The save covered everything up to `persisted_version`
    pub fn complete_save(&mut self, persisted_version: u64) -> Option<StatusChange> {
        self.saved_version = self.saved_version.max(persisted_version);
        self.epoch += 1;

        if self.has_unsaved_changes() {
            self.transition(SaveStatus::Dirty)
        } else {
            self.transition(SaveStatus::Saved)
        }
    }

    /// The save ended without persisting anything
    pub fn abandon_save(&mut self) -> Option<StatusChange> {
        if self.status != SaveStatus::Saving {
            return None;
        }
        if self.has_unsaved_changes() {
            self.transition(SaveStatus::Dirty)
        } else {
            self.transition(SaveStatus::Clean)
        }
    }

    pub fn fail_save(&mut self, message: impl Into<String>) -> Option<StatusChange> {
        self.last_error = Some(message.into());
        self.epoch += 1;
        self.transition(SaveStatus::Error)
    }

    /// Leave a transient status, if still in the one entered at `epoch`
    pub fn settle(&mut self, epoch: u64) -> Option<StatusChange> {
        if epoch != self.epoch || !self.status.is_transient() {
            return None;
        }
        if self.has_unsaved_changes() {
            self.transition(SaveStatus::Dirty)
        } else {
            self.transition(SaveStatus::Clean)
        }
    }

    /// A new document was loaded
    pub fn reset(&mut self) -> Option<StatusChange> {
        self.version = 0;
        self.saved_version = 0;
        self.last_error = None;
        self.epoch += 1;
        self.transition(SaveStatus::Clean)
    }

    fn transition(&mut self, to: SaveStatus) -> Option<StatusChange> {
        let from = self.status;
        if from == to {
            return None;
        }
        self.status = to;
        Some(StatusChange { from, to })
    }
}

impl Default for DirtyStateTracker {
    fn default() -> Self {
        Self::new()
    }
}
