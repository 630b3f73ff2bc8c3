//! # Save Orchestration
//!
//! Decides what runs when the operator presses save, and in which order.
//!
//! ```text
//! save(section)
//!   │ begin_save ── already saving? ──▶ Rejected
//!   ▼
//! plan_for(section).callbacks, one at a time, each awaited:
//!   snapshot → registry.invoke(name, &snapshot)
//!   ▼
//! plan.persist_document?  snapshot → store.persist(&snapshot)
//!   ▼
//! complete_save(last persisted version)  ──or──  fail_save(error)
//!   (no step ran: abandon_save → NothingPersisted)
//! ```
//!
//! Each step reads a fresh snapshot right before it runs, so a handler sees
//! every edit made before it was called, including edits made by handlers
//! that ran earlier in the same save.
//!
//! A failure stops the run. Edits stay in memory so the operator can retry.

use std::sync::Arc;

use crate::config::{SavePlans, SectionPlan};
use crate::errors::{PersistenceError, SaveStage};
use crate::registry::CallbackRegistry;
use crate::session::SessionHandle;
use crate::store::DocumentStore;

/// Result of one save trigger
#[derive(Debug)]
pub enum SaveOutcome {
    /// Everything up to `version` is persisted
    Saved { version: u64 },

    /// Another save was already running; nothing was done
    Rejected,

    /// The plan ran no step: no handler was registered and the document
    /// is not persisted for this section
    NothingPersisted,

    /// A step failed; the document is unchanged in memory
    Failed {
        stage: SaveStage,
        error: PersistenceError,
    },
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, SaveOutcome::Rejected)
    }

    pub fn is_nothing_persisted(&self) -> bool {
        matches!(self, SaveOutcome::NothingPersisted)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SaveOutcome::Failed { .. })
    }
}

pub struct SaveOrchestrator {
    plans: SavePlans,
    registry: CallbackRegistry,
    store: Arc<dyn DocumentStore>,
}

impl SaveOrchestrator {
    pub fn new(plans: SavePlans, registry: CallbackRegistry, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            plans,
            registry,
            store,
        }
    }

    pub fn plans(&self) -> &SavePlans {
        &self.plans
    }

    pub fn registry(&self) -> &CallbackRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub(crate) async fn save(&self, active_section: &str, session: &SessionHandle) -> SaveOutcome {
        if let Err(rejected) = session.begin_save() {
            tracing::debug!("[SaveOrchestrator] save of {} ignored: {}", active_section, rejected);
            return SaveOutcome::Rejected;
        }

        let plan = self.plans.plan_for(active_section);
        tracing::info!(
            "[SaveOrchestrator] saving {} (handlers: {:?}, persist_document: {})",
            active_section,
            plan.callbacks,
            plan.persist_document
        );

        match self.run_plan(&plan, session).await {
            Ok(None) => {
                tracing::warn!(
                    "[SaveOrchestrator] nothing persisted for {}: none of {:?} registered, document persist off",
                    active_section,
                    plan.callbacks
                );
                session.abandon_save();
                SaveOutcome::NothingPersisted
            }
            Ok(Some(version)) => {
                session.complete_save(version);
                tracing::info!("[SaveOrchestrator] {} saved at version {}", active_section, version);
                SaveOutcome::Saved { version }
            }
            Err((stage, error)) => {
                tracing::error!("[SaveOrchestrator] {} failed at {}: {}", active_section, stage, error);
                session.fail_save(format!("{stage}: {error}"));
                SaveOutcome::Failed { stage, error }
            }
        }
    }

    /// Run the plan's steps; the newest version a step persisted, `None` if
    /// no step ran
    async fn run_plan(
        &self,
        plan: &SectionPlan,
        session: &SessionHandle,
    ) -> Result<Option<u64>, (SaveStage, PersistenceError)> {
        let mut persisted = session.saved_version();
        let mut ran_step = false;

        for name in &plan.callbacks {
            let snapshot = session.snapshot();
            tracing::debug!("[SaveOrchestrator] handler {} at version {}", name, snapshot.version);

            match self.registry.invoke(name, &snapshot).await {
                Some(Ok(())) => {
                    ran_step = true;
                    persisted = persisted.max(snapshot.version);
                }
                Some(Err(error)) => return Err((SaveStage::Callback(name.clone()), error)),
                None => {
                    tracing::warn!("[SaveOrchestrator] no handler registered for {}, skipping", name);
                }
            }
        }

        if plan.persist_document {
            let snapshot = session.snapshot();
            tracing::debug!("[SaveOrchestrator] persisting document at version {}", snapshot.version);

            self.store
                .persist(&snapshot)
                .await
                .map_err(|error| (SaveStage::Document, error))?;
            ran_step = true;
            persisted = persisted.max(snapshot.version);
        }

        Ok(ran_step.then_some(persisted))
    }
}
