//! # Document Stores
//!
//! Where page documents come from and where whole-document saves go.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use folio_editor::Document;
use serde_json::Value;

use crate::errors::PersistenceError;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the document for `page_id`; unknown pages load empty
    async fn load(&self, page_id: &str) -> Result<Document, PersistenceError>;

    /// Persist the whole document
    async fn persist(&self, document: &Document) -> Result<(), PersistenceError>;
}

/// In-memory store that records every persist
#[derive(Debug, Default)]
pub struct MemoryStore {
    pages: Mutex<HashMap<String, Value>>,
    persisted: Mutex<Vec<Document>>,
    failures_left: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, page_id: impl Into<String>, root: Value) -> Self {
        lock(&self.pages).insert(page_id.into(), root);
        self
    }

    /// Make the next `count` persists fail
    pub fn fail_next_persists(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    /// Every document persisted so far, oldest first
    pub fn persisted(&self) -> Vec<Document> {
        lock(&self.persisted).clone()
    }

    pub fn persist_count(&self) -> usize {
        lock(&self.persisted).len()
    }

    pub fn page(&self, page_id: &str) -> Option<Value> {
        lock(&self.pages).get(page_id).cloned()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn load(&self, page_id: &str) -> Result<Document, PersistenceError> {
        Ok(match self.page(page_id) {
            Some(root) => Document::new(page_id, root),
            None => Document::empty(page_id),
        })
    }

    async fn persist(&self, document: &Document) -> Result<(), PersistenceError> {
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(PersistenceError::backend(format!(
                "persist of {} refused",
                document.page_id
            )));
        }

        lock(&self.pages).insert(document.page_id.clone(), document.root().clone());
        lock(&self.persisted).push(document.clone());
        Ok(())
    }
}

/// Stores each page as `<dir>/<page_id>.json`
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn page_path(&self, page_id: &str) -> Result<PathBuf, PersistenceError> {
        let valid = !page_id.is_empty()
            && page_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'));
        if !valid {
            return Err(PersistenceError::InvalidPageId(page_id.to_string()));
        }
        Ok(self.dir.join(format!("{page_id}.json")))
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn load(&self, page_id: &str) -> Result<Document, PersistenceError> {
        let path = self.page_path(page_id)?;

        match tokio::fs::read_to_string(&path).await {
            Ok(source) => {
                let root: Value = serde_json::from_str(&source)?;
                Ok(Document::new(page_id, root))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("[JsonFileStore] {:?} missing, starting empty", path);
                Ok(Document::empty(page_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn persist(&self, document: &Document) -> Result<(), PersistenceError> {
        let path = self.page_path(&document.page_id)?;
        let contents = serde_json::to_string_pretty(document.root())?;

        tokio::fs::create_dir_all(&self.dir).await?;

        // write beside the target, then swap it in
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, contents).await?;
        tokio::fs::rename(&staging, &path).await?;

        tracing::debug!(
            "[JsonFileStore] wrote {:?} at version {}",
            path,
            document.version
        );
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
