use super::{load_document, load_patches};
use anyhow::{anyhow, Result};
use clap::Args;
use designer_document::{invert_batch, validate_patches};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InverseArgs {
    /// Document JSON file, in its state before the batch
    pub document: PathBuf,

    /// Patch batch JSON file (an array of patches)
    pub patches: PathBuf,
}

pub fn inverse(args: InverseArgs) -> Result<()> {
    let document = load_document(&args.document)?;
    let patches = load_patches(&args.patches)?;

    // Inverses are only meaningful for a batch that would apply cleanly.
    let report = validate_patches(&document, &patches);
    if !report.is_valid() {
        return Err(anyhow!("cannot invert a rejected batch: {}", report));
    }

    let inverses = invert_batch(&document, &patches);
    println!("{}", serde_json::to_string_pretty(&inverses)?);
    Ok(())
}
