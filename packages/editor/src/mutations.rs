//! # Document Mutations
//!
//! Path-addressed writes into a page document.
//!
//! ## Semantics
//!
//! ### Set
//! - Works on a deep clone; the input document is never touched
//! - Missing, `null` or scalar intermediate nodes become empty mappings
//! - Sequences are indexed by decimal segments; writing past the end pads with `null`,
//!   at most [`MAX_SEQUENCE_PADDING`] slots at a time
//! - Legacy scalar fields are migrated before they are descended into
//! - Last write wins
//!
//! ### SetStyle
//! - Merges one field into `section.styles.<mode>`, keeping every sibling
//! - Dropped when the section does not exist yet
//!
//! A failed mutation leaves nothing behind: callers keep their previous
//! document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::legacy::LegacyPolicy;
use crate::path::{parse_index, DocPath};
use crate::styles::try_merge_style;

/// Edits an editor panel can request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Mutation {
    /// Write a value at a dotted path
    Set { path: DocPath, value: Value },

    /// Write one style field for one appearance mode
    SetStyle {
        section: String,
        field: String,
        mode: String,
        value: Value,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Path is empty")]
    EmptyPath,

    #[error("Path {path:?} contains an empty segment")]
    EmptySegment { path: String },

    #[error("Segment {segment:?} of {path} is not a sequence index")]
    InvalidIndex { segment: String, path: String },

    #[error("Segment {segment:?} of {path} is too far past the end of a sequence of {len}")]
    IndexOutOfRange {
        segment: String,
        path: String,
        len: usize,
    },
}

impl Mutation {
    /// Build a `Set` mutation from a dotted path
    pub fn set(path: &str, value: impl Into<Value>) -> Result<Self, MutationError> {
        Ok(Mutation::Set {
            path: DocPath::parse(path)?,
            value: value.into(),
        })
    }

    pub fn set_style(
        section: impl Into<String>,
        field: impl Into<String>,
        mode: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Mutation::SetStyle {
            section: section.into(),
            field: field.into(),
            mode: mode.into(),
            value: value.into(),
        }
    }

    /// Section this mutation lands in
    pub fn section(&self) -> Option<&str> {
        match self {
            Mutation::Set { path, .. } => path.section(),
            Mutation::SetStyle { section, .. } => Some(section),
        }
    }

    /// Apply to a document root, producing a new root.
    ///
    /// `Ok(None)` means the mutation was dropped (style write into a missing section).
    pub fn apply(
        &self,
        root: &Value,
        mutator: &PathMutator,
    ) -> Result<Option<Value>, MutationError> {
        match self {
            Mutation::Set { path, value } => mutator.mutate(root, path, value.clone()).map(Some),
            Mutation::SetStyle {
                section,
                field,
                mode,
                value,
            } => Ok(try_merge_style(root, section, field, mode, value.clone())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mutation::Set { .. } => "Set",
            Mutation::SetStyle { .. } => "SetStyle",
        }
    }
}

/// Writes values at dotted paths, returning a fresh document each time
#[derive(Debug, Clone, Default)]
pub struct PathMutator {
    legacy: LegacyPolicy,
}

impl PathMutator {
    pub fn new(legacy: LegacyPolicy) -> Self {
        Self { legacy }
    }

    pub fn legacy(&self) -> &LegacyPolicy {
        &self.legacy
    }

    /// Parse `path` and write `value` there
    pub fn mutate_str(&self, doc: &Value, path: &str, value: Value) -> Result<Value, MutationError> {
        self.mutate(doc, &DocPath::parse(path)?, value)
    }

    /// Write `value` at `path` in a deep clone of `doc`
    pub fn mutate(&self, doc: &Value, path: &DocPath, value: Value) -> Result<Value, MutationError> {
        let (parents, last) = path.split_last().ok_or(MutationError::EmptyPath)?;

        let mut root = doc.clone();
        let mut current = &mut root;

        for segment in parents {
            let child = child_slot(current, segment, path)?;
            self.legacy.migrate(segment, child);
            current = child;
        }

        *child_slot(current, last, path)? = value;
        Ok(root)
    }
}

/// Most `null` slots a single write may append to a sequence
pub const MAX_SEQUENCE_PADDING: usize = 1024;

/// Mutable slot for `segment` under `node`, created if missing
fn child_slot<'a>(
    node: &'a mut Value,
    segment: &str,
    path: &DocPath,
) -> Result<&'a mut Value, MutationError> {
    match node {
        Value::Object(map) => Ok(map.entry(segment.to_string()).or_insert(Value::Null)),
        Value::Array(items) => {
            let index = parse_index(segment).ok_or_else(|| MutationError::InvalidIndex {
                segment: segment.to_string(),
                path: path.to_string(),
            })?;
            if index >= items.len() {
                if index - items.len() >= MAX_SEQUENCE_PADDING {
                    return Err(MutationError::IndexOutOfRange {
                        segment: segment.to_string(),
                        path: path.to_string(),
                        len: items.len(),
                    });
                }
                items.resize(index + 1, Value::Null);
            }
            Ok(&mut items[index])
        }
        leaf => {
            if !leaf.is_null() {
                tracing::debug!(
                    "[PathMutator] replacing scalar {} to reach {:?} of {}",
                    leaf,
                    segment,
                    path
                );
            }
            *leaf = Value::Object(Map::new());
            // indexing a mapping by key inserts `null` for the missing key
            Ok(&mut leaf[segment])
        }
    }
}
