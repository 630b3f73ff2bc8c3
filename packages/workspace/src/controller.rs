//! # Editor Controller
//!
//! Single owner of the open page. Editor panels never hold the document
//! mutably: they read snapshots and request edits through the controller,
//! which routes them to the path mutator or the style merger and keeps the
//! save status in step.
//!
//! The controller is a cheap handle; clones share one session.

use std::sync::Arc;
use std::time::Duration;

use folio_editor::{Document, Mutation, MutationError, PathMutator, SaveStatus};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::config::WorkspaceConfig;
use crate::errors::WorkspaceError;
use crate::orchestrator::{SaveOrchestrator, SaveOutcome};
use crate::registry::CallbackRegistry;
use crate::session::{SessionHandle, StatusEvent};
use crate::store::DocumentStore;

#[derive(Clone)]
pub struct EditorController {
    session: SessionHandle,
    orchestrator: Arc<SaveOrchestrator>,
    mutator: Arc<PathMutator>,
}

impl EditorController {
    /// Controller with an empty, unnamed page open
    pub fn new(
        orchestrator: SaveOrchestrator,
        mutator: PathMutator,
        status_display: Option<Duration>,
    ) -> Self {
        Self {
            session: SessionHandle::new(Document::empty(""), status_display),
            orchestrator: Arc::new(orchestrator),
            mutator: Arc::new(mutator),
        }
    }

    pub fn from_config(
        config: &WorkspaceConfig,
        registry: CallbackRegistry,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        let orchestrator = SaveOrchestrator::new(config.sections.clone(), registry, store);
        Self::new(
            orchestrator,
            PathMutator::new(config.legacy_policy()),
            config.status_display(),
        )
    }

    /// Load `page_id` from the store, replacing the open document
    pub async fn load(&self, page_id: &str) -> Result<(), WorkspaceError> {
        if self.session.status() == SaveStatus::Saving {
            return Err(WorkspaceError::SaveInFlight);
        }

        let document = self.orchestrator.store().load(page_id).await?;
        tracing::info!("[EditorController] loaded page {}", page_id);
        self.session.replace(document)
    }

    /// Open an already fetched document
    pub fn open(&self, document: Document) -> Result<(), WorkspaceError> {
        self.session.replace(document)
    }

    /// Write `value` at a dotted path; returns the new version
    pub fn set(&self, path: &str, value: impl Into<Value>) -> Result<Option<u64>, MutationError> {
        self.apply(&Mutation::set(path, value)?)
    }

    /// Write one style field for one appearance mode
    pub fn set_style(
        &self,
        section: &str,
        field: &str,
        mode: &str,
        value: impl Into<Value>,
    ) -> Result<Option<u64>, MutationError> {
        self.apply(&Mutation::set_style(section, field, mode, value))
    }

    /// Apply an edit. On error the open document is left as it was.
    pub fn apply(&self, mutation: &Mutation) -> Result<Option<u64>, MutationError> {
        self.session
            .apply(mutation, &self.mutator)
            .inspect_err(|e| tracing::warn!("[EditorController] {} rejected: {}", mutation.name(), e))
    }

    /// Persist according to the plan for `active_section`
    pub async fn save(&self, active_section: &str) -> SaveOutcome {
        self.orchestrator.save(active_section, &self.session).await
    }

    pub fn snapshot(&self) -> Document {
        self.session.snapshot()
    }

    pub fn status(&self) -> SaveStatus {
        self.session.status()
    }

    /// Whether the save control is enabled
    pub fn can_save(&self) -> bool {
        self.status().can_trigger_save()
    }

    pub fn last_error(&self) -> Option<String> {
        self.session.last_error()
    }

    /// Sections with edits no successful save has covered yet
    pub fn unsaved_sections(&self) -> Vec<String> {
        self.session.unsaved_sections()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.session.subscribe()
    }

    pub fn registry(&self) -> &CallbackRegistry {
        self.orchestrator.registry()
    }
}
