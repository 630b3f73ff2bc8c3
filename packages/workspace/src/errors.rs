use std::fmt;
use std::path::PathBuf;

use folio_editor::MutationError;
use thiserror::Error;

/// Failure of a save handler or of the document store
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Invalid page id: {0:?}")]
    InvalidPageId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PersistenceError {
    pub fn backend(message: impl Into<String>) -> Self {
        PersistenceError::Backend(message.into())
    }
}

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Cannot load a page while a save is in progress")]
    SaveInFlight,

    #[error("Invalid config {path:?}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Step of a save that failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStage {
    /// A section-specific handler registered under this name
    Callback(String),

    /// The whole-document persist
    Document,
}

impl fmt::Display for SaveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveStage::Callback(name) => write!(f, "save handler {name:?}"),
            SaveStage::Document => f.write_str("document persist"),
        }
    }
}
