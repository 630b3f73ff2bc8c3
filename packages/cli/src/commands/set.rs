use std::path::Path;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use folio_workspace::Mutation;

use super::{open_page, parse_value, preview};

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Page id (file name without `.json`)
    pub page: String,

    /// Dotted path to write, e.g. `hero.title` or `cards.0.title`
    pub path: String,

    /// JSON value; anything that is not valid JSON is written as a string
    pub value: String,

    /// Section whose save plan applies (defaults to the path's first segment)
    #[arg(short, long)]
    pub section: Option<String>,
}

pub async fn set(args: SetArgs, cwd: &Path) -> Result<()> {
    let value = parse_value(&args.value);
    let mutation = Mutation::set(&args.path, value.clone())?;
    let section = args
        .section
        .or_else(|| mutation.section().map(str::to_string))
        .unwrap_or_default();

    let page = open_page(cwd, &args.page).await?;
    page.controller.apply(&mutation)?;
    println!(
        "  {} {} = {}",
        "✓".green(),
        args.path.bright_white(),
        preview(&value)
    );

    page.save(&section).await
}
