use super::{load_document, load_patches};
use crate::commands::validate::render_report;
use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use designer_common::write_json_file;
use designer_document::{DocumentError, DocumentStore};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Document JSON file
    pub document: PathBuf,

    /// Patch batch JSON file (an array of patches)
    pub patches: PathBuf,

    /// Where to write the updated document (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn apply(args: ApplyArgs, config: &Config) -> Result<()> {
    let document = load_document(&args.document)?;
    let patches = load_patches(&args.patches)?;

    let mut store = DocumentStore::with_config(document, config.store.clone());
    match store.apply_patches(&patches, None, Some("cli apply")) {
        Ok(()) => {}
        Err(DocumentError::InvalidBatch(report)) => {
            eprint!("{}", render_report(&report, patches.len()));
            return Err(anyhow!("{}", report));
        }
        Err(err) => return Err(err.into()),
    }

    let changes = store.take_changes();
    info!(
        geometry = changes.geometry.len(),
        recompile = changes.recompile.len(),
        frames = changes.frames.len(),
        "batch applied"
    );

    match &args.output {
        Some(path) => {
            write_json_file(path, store.document())?;
            eprintln!(
                "{} Applied {} patch(es) → {}",
                "✓".green(),
                patches.len(),
                path.display()
            );
        }
        None => println!("{}", serde_json::to_string_pretty(store.document())?),
    }

    Ok(())
}
