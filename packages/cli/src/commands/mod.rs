pub mod apply;
pub mod get;
pub mod set;
pub mod style;

pub use apply::{apply, ApplyArgs};
pub use get::{get, GetArgs};
pub use set::{set, SetArgs};
pub use style::{style, StyleArgs};

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use colored::Colorize;
use folio_workspace::{
    CallbackRegistry, EditorController, JsonFileStore, PathMutator, SaveOrchestrator,
    SaveOutcome, SavePlans, WorkspaceConfig,
};
use serde_json::Value;

/// A loaded page, ready for edits
pub(crate) struct OpenPage {
    pub config: WorkspaceConfig,
    pub controller: EditorController,
}

/// Load `page_id` from the configured pages directory
///
/// No save handlers run outside the admin, so every section is saved by
/// writing the page file.
pub(crate) async fn open_page(cwd: &Path, page_id: &str) -> Result<OpenPage> {
    let config = WorkspaceConfig::load(cwd)?;
    let pages_dir = config.get_pages_dir(cwd);
    tracing::debug!("[folio] pages directory {:?}", pages_dir);

    let orchestrator = SaveOrchestrator::new(
        SavePlans::empty(),
        CallbackRegistry::new(),
        Arc::new(JsonFileStore::new(pages_dir)),
    );
    let controller = EditorController::new(orchestrator, PathMutator::new(config.legacy_policy()), None);
    controller.load(page_id).await?;

    Ok(OpenPage { config, controller })
}

impl OpenPage {
    /// Save the page, reporting what the admin would have done differently
    pub async fn save(&self, section: &str) -> Result<()> {
        let plan = self.config.sections.plan_for(section);
        if !plan.callbacks.is_empty() {
            println!(
                "  {} {} handlers skipped: {}",
                "⚠️".yellow(),
                section.bright_white(),
                plan.callbacks.join(", ")
            );
        }
        if !plan.persist_document {
            println!(
                "  {} {} is normally written by its handlers; writing the page file instead",
                "⚠️".yellow(),
                section.bright_white()
            );
        }

        match self.controller.save(section).await {
            SaveOutcome::Saved { version } => {
                let page = self.controller.snapshot().page_id;
                println!(
                    "{} Saved {} {}",
                    "✓".green(),
                    page.bright_white(),
                    format!("(version {version})").dimmed()
                );
                Ok(())
            }
            SaveOutcome::Rejected => Err(anyhow!("Another save is already running")),
            SaveOutcome::NothingPersisted => Err(anyhow!("Nothing was persisted for {}", section)),
            SaveOutcome::Failed { stage, error } => Err(anyhow!("Save failed at {}: {}", stage, error)),
        }
    }
}

/// Parse a command-line value as JSON, falling back to a plain string
pub(crate) fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Short single-line rendering for status output
pub(crate) fn preview(value: &Value) -> String {
    const MAX: usize = 60;
    let text = value.to_string();
    if text.chars().count() <= MAX {
        return text;
    }
    let cut: String = text.chars().take(MAX).collect();
    format!("{cut}…")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_value() {
        let cases = [
            ("42", json!(42)),
            ("true", json!(true)),
            ("null", json!(null)),
            ("\"quoted\"", json!("quoted")),
            ("{\"a\": [1, 2]}", json!({ "a": [1, 2] })),
            ("Welcome home", json!("Welcome home")),
            ("#112233", json!("#112233")),
            ("", json!("")),
        ];

        for (raw, expected) in cases {
            assert_eq!(parse_value(raw), expected, "input {raw:?}");
        }
    }

    #[test]
    fn test_preview_truncates() {
        assert_eq!(preview(&json!("short")), "\"short\"");

        let long = json!("x".repeat(100));
        let shown = preview(&long);
        assert!(shown.ends_with('…'));
        assert_eq!(shown.chars().count(), 61);
    }

    #[tokio::test]
    async fn test_open_page_and_save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("folio.config.json"),
            r#"{ "pagesDir": "site" }"#,
        )
        .unwrap();

        let page = open_page(dir.path(), "about").await.unwrap();
        page.controller.set("hero.title", parse_value("About us")).unwrap();
        page.save("hero").await.unwrap();

        let written = std::fs::read_to_string(dir.path().join("site/about.json")).unwrap();
        let value: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value, json!({ "hero": { "title": "About us" } }));
    }

    #[tokio::test]
    async fn test_handler_only_section_still_writes_file() {
        let dir = tempfile::tempdir().unwrap();

        let page = open_page(dir.path(), "home").await.unwrap();
        page.controller.set("cards.0.title", "First").unwrap();
        page.save("cards").await.unwrap();

        assert!(dir.path().join("pages/home.json").exists());
    }

    #[tokio::test]
    async fn test_invalid_page_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(open_page(dir.path(), "../etc/passwd").await.is_err());
    }
}
