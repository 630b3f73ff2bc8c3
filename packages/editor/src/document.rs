//! # Page Document
//!
//! Immutable snapshot of one page's configuration tree.
//!
//! The tree is partitioned into sections (`hero`, `solutions`, `contact`,
//! `seo`, ...) with no fixed schema. Every edit produces a new `Document`;
//! the root is shared behind an `Arc`, so handing a snapshot to an editor
//! panel is a pointer copy and the panel can never observe a later edit.
//!
//! ## Lifecycle
//!
//! ```text
//! Load → Snapshot → Mutate → Snapshot' → ... → Persist
//!   ↓                  ↓
//! version 0       version + 1
//! ```

use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::path::parse_index;
use crate::{DocPath, EditorError, Mutation, MutationError, PathMutator};

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Page this document was loaded for
    pub page_id: String,

    /// Mutations applied since load
    pub version: u64,

    root: Arc<Value>,
}

impl Document {
    pub fn new(page_id: impl Into<String>, root: Value) -> Self {
        Self {
            page_id: page_id.into(),
            version: 0,
            root: Arc::new(root),
        }
    }

    /// Page with no sections yet
    pub fn empty(page_id: impl Into<String>) -> Self {
        Self::new(page_id, Value::Object(Map::new()))
    }

    pub fn from_json(page_id: impl Into<String>, source: &str) -> Result<Self, EditorError> {
        let root: Value = serde_json::from_str(source)?;
        Ok(Self::new(page_id, root))
    }

    /// Read a JSON file; the page id is the file stem
    pub fn load(path: &Path) -> Result<Self, EditorError> {
        let source = std::fs::read_to_string(path)?;
        let page_id = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string();
        Self::from_json(page_id, &source)
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn section(&self, name: &str) -> Option<&Value> {
        self.root.get(name)
    }

    /// Node at `path`, following sequence indices where the node is a sequence
    pub fn get(&self, path: &DocPath) -> Option<&Value> {
        path.segments()
            .iter()
            .try_fold(self.root.as_ref(), |node, segment| match node {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => parse_index(segment).and_then(|i| items.get(i)),
                _ => None,
            })
    }

    /// Apply a mutation, producing the next snapshot.
    ///
    /// `Ok(None)` when the mutation was dropped and nothing changed.
    pub fn apply(
        &self,
        mutation: &Mutation,
        mutator: &PathMutator,
    ) -> Result<Option<Document>, MutationError> {
        let next = mutation.apply(&self.root, mutator)?;
        Ok(next.map(|root| Document {
            page_id: self.page_id.clone(),
            version: self.version + 1,
            root: Arc::new(root),
        }))
    }

    pub fn to_json_pretty(&self) -> Result<String, EditorError> {
        Ok(serde_json::to_string_pretty(self.root.as_ref())?)
    }

    pub fn into_value(self) -> Value {
        Arc::unwrap_or_clone(self.root)
    }
}
