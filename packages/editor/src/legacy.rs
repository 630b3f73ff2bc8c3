//! # Legacy Scalar Fields
//!
//! Some fields (background images, mostly) were stored as a bare string
//! before they gained per-variant values. When a write descends through one
//! of them, the scalar is lifted into a mapping first:
//!
//! ```text
//! backgroundImage: "old.png"
//!     write backgroundImage.light = "new.png"
//! backgroundImage: { dark: "old.png", light: "new.png" }
//! ```
//!
//! The old value always lands in `preserved_slot`, whichever slot is being
//! written. Writing that same slot first therefore overwrites the migrated
//! value.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

pub const DEFAULT_LEGACY_FIELDS: &[&str] = &["backgroundImage"];
pub const DEFAULT_PRESERVED_SLOT: &str = "dark";

/// Which fields may hold a legacy scalar, and where the old value goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyPolicy {
    fields: BTreeSet<String>,
    preserved_slot: String,
}

impl LegacyPolicy {
    pub fn new<I, S>(fields: I, preserved_slot: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            preserved_slot: preserved_slot.into(),
        }
    }

    /// Policy that never migrates anything
    pub fn disabled() -> Self {
        Self::new(std::iter::empty::<String>(), DEFAULT_PRESERVED_SLOT)
    }

    pub fn is_legacy_field(&self, name: &str) -> bool {
        self.fields.contains(name)
    }

    pub fn preserved_slot(&self) -> &str {
        &self.preserved_slot
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    /// Lift `node` into a variant mapping if it is a legacy scalar under `name`.
    ///
    /// Returns true when a migration happened.
    pub fn migrate(&self, name: &str, node: &mut Value) -> bool {
        if !self.is_legacy_field(name) || !is_scalar(node) {
            return false;
        }

        let old = std::mem::take(node);
        let mut variants = Map::new();
        variants.insert(self.preserved_slot.clone(), old);
        *node = Value::Object(variants);

        tracing::debug!(
            "[LegacyPolicy] migrated scalar field {} into slot {}",
            name,
            self.preserved_slot
        );
        true
    }
}

impl Default for LegacyPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_LEGACY_FIELDS.iter().copied(), DEFAULT_PRESERVED_SLOT)
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}
