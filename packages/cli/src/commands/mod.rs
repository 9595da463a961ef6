pub mod apply;
pub mod drop;
pub mod expand;
pub mod inverse;
pub mod validate;

pub use apply::{apply, ApplyArgs};
pub use drop::{drop, DropArgs};
pub use expand::{expand, ExpandArgs};
pub use inverse::{inverse, InverseArgs};
pub use validate::{validate, ValidateArgs};

use anyhow::{Context, Result};
use clap::ValueEnum;
use designer_common::read_json_file;
use designer_document::{Document, Patch};
use std::path::Path;

/// Output format shared by the reporting commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    #[default]
    Text,
    Json,
}

pub(crate) fn load_document(path: &Path) -> Result<Document> {
    Document::load(path).with_context(|| format!("Cannot load document {}", path.display()))
}

pub(crate) fn load_patches(path: &Path) -> Result<Vec<Patch>> {
    read_json_file(path).with_context(|| format!("Cannot load patches {}", path.display()))
}
