use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use folio_workspace::Mutation;

use super::open_page;

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Page id (file name without `.json`)
    pub page: String,

    /// JSON file holding a list of mutations
    pub mutations: PathBuf,

    /// Section whose save plan applies (defaults to the first mutation's section)
    #[arg(short, long)]
    pub section: Option<String>,
}

pub async fn apply(args: ApplyArgs, cwd: &Path) -> Result<()> {
    let source = cwd.join(&args.mutations);
    let content = fs::read_to_string(&source)
        .with_context(|| format!("Cannot read {}", source.display()))?;
    let mutations: Vec<Mutation> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid mutation list in {}", source.display()))?;

    if mutations.is_empty() {
        println!("{}", "⚠️  No mutations to apply".yellow());
        return Ok(());
    }

    let section = args
        .section
        .or_else(|| mutations.iter().find_map(|m| m.section().map(str::to_string)))
        .unwrap_or_default();

    println!(
        "{}",
        format!("✏️  Applying {} mutations to {}...", mutations.len(), args.page)
            .bright_blue()
            .bold()
    );

    let page = open_page(cwd, &args.page).await?;
    let mut dropped = 0;

    // all or nothing: a rejected mutation aborts before anything is saved
    for (index, mutation) in mutations.iter().enumerate() {
        match page.controller.apply(mutation) {
            Ok(Some(_)) => {}
            Ok(None) => {
                dropped += 1;
                println!(
                    "  {} #{} {} into missing section {}",
                    "⚠️".yellow(),
                    index,
                    mutation.name(),
                    mutation.section().unwrap_or_default()
                );
            }
            Err(e) => {
                return Err(anyhow!("Mutation #{} ({}) rejected: {}", index, mutation.name(), e));
            }
        }
    }

    println!(
        "  {} {} applied, {} dropped",
        "✓".green(),
        mutations.len() - dropped,
        dropped
    );

    page.save(&section).await
}
