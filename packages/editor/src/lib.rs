//! # Folio Editor
//!
//! Document mutation core for the Folio site admin.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ editor panels: (path, value) edits          │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: Document snapshots + mutations      │
//! │  - Path-addressed writes (PathMutator)      │
//! │  - Legacy scalar → variant migration        │
//! │  - Per-mode style merges                    │
//! │  - Dirty/save status tracking               │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ workspace: save orchestration + persistence │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Snapshots are immutable**: every edit yields a new `Document`
//! 2. **Schema-free**: any path is writable; missing structure is created
//! 3. **Failed edits are local**: an error leaves the previous document in place
//!
//! ## Usage
//!
//! ```rust
//! use folio_editor::{Document, Mutation, PathMutator};
//!
//! let mutator = PathMutator::default();
//! let doc = Document::empty("home");
//!
//! let doc = doc
//!     .apply(&Mutation::set("hero.title", "Welcome").unwrap(), &mutator)
//!     .unwrap()
//!     .unwrap();
//!
//! assert_eq!(doc.root()["hero"]["title"], "Welcome");
//! ```

mod dirty;
mod document;
mod errors;
mod legacy;
mod mutations;
mod path;
mod styles;

pub use dirty::{ConcurrentSaveRejected, DirtyStateTracker, SaveStatus, StatusChange};
pub use document::Document;
pub use errors::EditorError;
pub use legacy::{LegacyPolicy, DEFAULT_LEGACY_FIELDS, DEFAULT_PRESERVED_SLOT};
pub use mutations::{Mutation, MutationError, PathMutator, MAX_SEQUENCE_PADDING};
pub use path::DocPath;
pub use styles::{merge_style, try_merge_style, STYLES_KEY};
