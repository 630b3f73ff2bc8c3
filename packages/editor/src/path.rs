//! # Document Paths
//!
//! Dot-separated addresses into a page document (`hero.styles.modeA.titleColor`).
//!
//! Segments are plain keys. Whether a segment indexes a sequence or names a
//! mapping entry is decided while walking, by looking at the node that is
//! actually there. Parsing only rejects shapes that can never address a node:
//! the empty path and empty segments.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::mutations::MutationError;

/// Parsed, non-empty list of path segments
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DocPath {
    segments: Vec<String>,
}

impl DocPath {
    /// Start an empty path for use with the builder methods
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a dotted path, rejecting empty paths and empty segments
    pub fn parse(path: &str) -> Result<Self, MutationError> {
        if path.is_empty() {
            return Err(MutationError::EmptyPath);
        }

        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(MutationError::EmptySegment {
                path: path.to_string(),
            });
        }

        Ok(Self { segments })
    }

    /// Append a mapping key
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(key.into());
        self
    }

    /// Append a sequence index
    pub fn index(mut self, index: usize) -> Self {
        self.segments.push(index.to_string());
        self
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// First segment, which names the document section
    pub fn section(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    /// Split into (parent segments, final segment)
    pub fn split_last(&self) -> Option<(&[String], &str)> {
        self.segments
            .split_last()
            .map(|(last, parents)| (parents, last.as_str()))
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl FromStr for DocPath {
    type Err = MutationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for DocPath {
    type Error = MutationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl Serialize for DocPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DocPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Parse a decimal sequence index. Signs, whitespace and empty strings are rejected.
pub(crate) fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}
