//! # Variant Style Overrides
//!
//! Sections carry per-appearance-mode style tables:
//!
//! ```text
//! hero.styles = {
//!     modeA: { titleColor: "#112233", ... },
//!     modeB: { titleColor: "#eeeeee", ... },
//! }
//! ```
//!
//! Writing one field in one mode keeps every other field of that mode and
//! every other mode. Unlike [`PathMutator`](crate::PathMutator), nothing is
//! created for a section that does not exist yet.

use serde_json::{Map, Value};

pub const STYLES_KEY: &str = "styles";

/// Set `section.styles.<mode>.<field>` in a copy of `doc`.
///
/// Returns an unchanged copy when the section is absent.
pub fn merge_style(doc: &Value, section: &str, field: &str, mode: &str, value: Value) -> Value {
    try_merge_style(doc, section, field, mode, value).unwrap_or_else(|| doc.clone())
}

/// Like [`merge_style`], but `None` when the write was dropped
pub fn try_merge_style(
    doc: &Value,
    section: &str,
    field: &str,
    mode: &str,
    value: Value,
) -> Option<Value> {
    match doc.get(section) {
        Some(Value::Object(_)) => {}
        Some(other) => {
            tracing::warn!(
                "[StyleMerger] section {} is not a mapping ({}), dropping {}.{}",
                section,
                kind(other),
                mode,
                field
            );
            return None;
        }
        None => {
            tracing::debug!(
                "[StyleMerger] section {} missing, dropping {}.{}",
                section,
                mode,
                field
            );
            return None;
        }
    }

    let mut root = doc.clone();
    let section_node = root.get_mut(section)?;

    let styles = mapping_slot(section_node, STYLES_KEY);
    let mode_node = mapping_slot(styles, mode);
    *mapping_slot(mode_node, field) = value;

    Some(root)
}

/// Slot under `key`, turning `node` into a mapping first if it is not one
fn mapping_slot<'a>(node: &'a mut Value, key: &str) -> &'a mut Value {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    // indexing a mapping by key inserts `null` for a missing key
    &mut node[key]
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}
