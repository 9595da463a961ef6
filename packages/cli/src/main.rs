mod commands;
mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{apply, drop, expand, inverse, validate, ApplyArgs, DropArgs, ExpandArgs, InverseArgs, ValidateArgs};
use config::Config;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Designer CLI - validate, apply, and inspect design documents
#[derive(Parser, Debug)]
#[command(name = "designer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ./designer.config.json if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a patch batch against a document without applying it
    Validate(ValidateArgs),

    /// Apply a patch batch and write the resulting document
    Apply(ApplyArgs),

    /// Print the expanded scene of one frame
    Expand(ExpandArgs),

    /// Print the batch that undoes a patch batch
    Inverse(InverseArgs),

    /// Resolve a drag released at a point and print the resulting patches
    Drop(DropArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("Cannot get current directory")?;
    let config = Config::load(&cwd, cli.config.as_deref())?;
    debug!(?config, "config loaded");

    match cli.command {
        Command::Validate(args) => validate(args),
        Command::Apply(args) => apply(args, &config),
        Command::Expand(args) => expand(args),
        Command::Inverse(args) => inverse(args),
        Command::Drop(args) => drop(args, &config.drop),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
