//! # Folio Workspace
//!
//! Save coordination for the Folio site admin: the editor controller, the
//! save handler registry, the save orchestrator and the document stores.

pub mod config;
pub mod controller;
pub mod errors;
pub mod orchestrator;
pub mod registry;
pub mod store;

mod session;

#[cfg(test)]
mod tests_comprehensive;

pub use config::{SavePlans, SectionPlan, WorkspaceConfig, DEFAULT_CONFIG_NAME};
pub use controller::EditorController;
pub use errors::{PersistenceError, SaveStage, WorkspaceError};
pub use orchestrator::{SaveOrchestrator, SaveOutcome};
pub use registry::{handler_fn, CallbackRegistry, FnHandler, Registration, SaveHandler};
pub use session::StatusEvent;
pub use store::{DocumentStore, JsonFileStore, MemoryStore};

// Re-export editor types for convenience
pub use folio_editor::{
    DocPath, Document, LegacyPolicy, Mutation, MutationError, PathMutator, SaveStatus, StatusChange,
};
