use std::path::Path;

use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use folio_workspace::DocPath;

use super::open_page;

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Page id (file name without `.json`)
    pub page: String,

    /// Dotted path to print, e.g. `hero.styles.dark`
    pub path: Option<String>,
}

pub async fn get(args: GetArgs, cwd: &Path) -> Result<()> {
    let page = open_page(cwd, &args.page).await?;
    let document = page.controller.snapshot();

    let Some(raw) = args.path else {
        println!("{}", document.to_json_pretty()?);
        return Ok(());
    };

    let path: DocPath = raw.parse()?;
    let value = document
        .get(&path)
        .ok_or_else(|| anyhow!("No value at {} in {}", path.to_string().bright_white(), args.page))?;

    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
