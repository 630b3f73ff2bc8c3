use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use folio_editor::{LegacyPolicy, DEFAULT_LEGACY_FIELDS, DEFAULT_PRESERVED_SLOT};
use serde::{Deserialize, Serialize};

use crate::errors::WorkspaceError;

pub const DEFAULT_CONFIG_NAME: &str = "folio.config.json";

/// Folio workspace configuration file format
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceConfig {
    /// Directory holding `<page>.json` documents
    #[serde(default = "default_pages_dir")]
    pub pages_dir: String,

    /// How long `saved`/`error` stay visible; 0 keeps them until the next edit
    #[serde(default = "default_status_display_ms")]
    pub status_display_ms: u64,

    /// Fields that may still hold a bare scalar instead of variants
    #[serde(default = "default_legacy_fields")]
    pub legacy_fields: Vec<String>,

    /// Variant slot receiving a migrated legacy scalar
    #[serde(default = "default_preserved_slot")]
    pub legacy_preserved_slot: String,

    /// Which save handlers run for each section
    #[serde(default)]
    pub sections: SavePlans,
}

fn default_pages_dir() -> String {
    "pages".to_string()
}

fn default_status_display_ms() -> u64 {
    3000
}

fn default_legacy_fields() -> Vec<String> {
    DEFAULT_LEGACY_FIELDS.iter().map(|f| f.to_string()).collect()
}

fn default_preserved_slot() -> String {
    DEFAULT_PRESERVED_SLOT.to_string()
}

fn default_true() -> bool {
    true
}

/// Save steps for one section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SectionPlan {
    /// Registered handler names, run in this order
    #[serde(default)]
    pub callbacks: Vec<String>,

    /// Run the whole-document persist after the handlers
    #[serde(default = "default_true")]
    pub persist_document: bool,
}

impl SectionPlan {
    pub fn new<I, S>(callbacks: I, persist_document: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            callbacks: callbacks.into_iter().map(Into::into).collect(),
            persist_document,
        }
    }
}

impl Default for SectionPlan {
    fn default() -> Self {
        Self {
            callbacks: Vec::new(),
            persist_document: true,
        }
    }
}

/// Section name → save plan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SavePlans(BTreeMap<String, SectionPlan>);

impl SavePlans {
    /// Table with no section-specific handlers
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with(mut self, section: impl Into<String>, plan: SectionPlan) -> Self {
        self.0.insert(section.into(), plan);
        self
    }

    /// Plan for `section`; unlisted sections only persist the document
    pub fn plan_for(&self, section: &str) -> SectionPlan {
        self.0.get(section).cloned().unwrap_or_default()
    }

    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl Default for SavePlans {
    fn default() -> Self {
        Self::empty()
            // card handlers write the full page themselves
            .with("cards", SectionPlan::new(["cardsList", "cardsDetail"], false))
            .with(
                "content",
                SectionPlan::new(["contentBlocks", "contentMedia"], true),
            )
    }
}

impl WorkspaceConfig {
    /// Load config from a directory, falling back to defaults
    pub fn load(cwd: &Path) -> Result<Self, WorkspaceError> {
        let config_path = cwd.join(DEFAULT_CONFIG_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        serde_json::from_str(&content).map_err(|source| WorkspaceError::Config {
            path: config_path,
            source,
        })
    }

    pub fn get_pages_dir(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.pages_dir)
    }

    pub fn status_display(&self) -> Option<Duration> {
        (self.status_display_ms > 0).then(|| Duration::from_millis(self.status_display_ms))
    }

    pub fn legacy_policy(&self) -> LegacyPolicy {
        LegacyPolicy::new(self.legacy_fields.iter().cloned(), &self.legacy_preserved_slot)
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            pages_dir: default_pages_dir(),
            status_display_ms: default_status_display_ms(),
            legacy_fields: default_legacy_fields(),
            legacy_preserved_slot: default_preserved_slot(),
            sections: SavePlans::default(),
        }
    }
}
