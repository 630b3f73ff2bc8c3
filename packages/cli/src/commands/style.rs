use std::path::Path;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::{open_page, parse_value, preview};

#[derive(Debug, Args)]
pub struct StyleArgs {
    /// Page id (file name without `.json`)
    pub page: String,

    /// Section holding the `styles` mapping
    pub section: String,

    /// Style field, e.g. `titleColor`
    pub field: String,

    /// Appearance mode, e.g. `light` or `dark`
    pub mode: String,

    /// JSON value; anything that is not valid JSON is written as a string
    pub value: String,
}

pub async fn style(args: StyleArgs, cwd: &Path) -> Result<()> {
    let value = parse_value(&args.value);
    let page = open_page(cwd, &args.page).await?;

    let written = page
        .controller
        .set_style(&args.section, &args.field, &args.mode, value.clone())?;

    if written.is_none() {
        println!(
            "{} Section {} does not exist in {}; nothing written",
            "⚠️".yellow(),
            args.section.bright_white(),
            args.page
        );
        return Ok(());
    }

    println!(
        "  {} {}.styles.{}.{} = {}",
        "✓".green(),
        args.section.bright_white(),
        args.mode,
        args.field,
        preview(&value)
    );

    page.save(&args.section).await
}
