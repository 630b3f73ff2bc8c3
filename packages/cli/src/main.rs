mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{apply, get, set, style, ApplyArgs, GetArgs, SetArgs, StyleArgs};
use tracing_subscriber::EnvFilter;

/// Folio CLI - edit site pages from the terminal
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project directory (defaults to the current directory)
    #[arg(long, global = true)]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a page, or one node of it, as JSON
    Get(GetArgs),

    /// Write a value at a dotted path and save
    Set(SetArgs),

    /// Write one style field for one appearance mode and save
    Style(StyleArgs),

    /// Apply a JSON list of mutations and save once
    Apply(ApplyArgs),
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = match cli.cwd.map(Ok).unwrap_or_else(std::env::current_dir) {
        Ok(cwd) => cwd,
        Err(err) => {
            eprintln!("{} Cannot get current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Get(args) => get(args, &cwd).await,
        Command::Set(args) => set(args, &cwd).await,
        Command::Style(args) => style(args, &cwd).await,
        Command::Apply(args) => apply(args, &cwd).await,
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
