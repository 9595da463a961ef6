use super::{load_document, load_patches, Format};
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use designer_document::{validate_patches, ValidationIssue, ValidationReport};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Document JSON file
    pub document: PathBuf,

    /// Patch batch JSON file (an array of patches)
    pub patches: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
}

pub fn validate(args: ValidateArgs) -> Result<()> {
    let document = load_document(&args.document)?;
    let patches = load_patches(&args.patches)?;

    info!(patches = patches.len(), "validating batch");
    let report = validate_patches(&document, &patches);

    match args.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        Format::Text => print!("{}", render_report(&report, patches.len())),
    }

    if report.is_valid() {
        Ok(())
    } else {
        Err(anyhow!("{}", report))
    }
}

fn render_issue(issue: &ValidationIssue) -> String {
    let marker = if issue.is_error() {
        "✗".red().to_string()
    } else {
        "!".yellow().to_string()
    };
    format!("  {} {}\n", marker, issue)
}

pub(crate) fn render_report(report: &ValidationReport, patch_count: usize) -> String {
    let mut out = String::new();

    if report.issues.is_empty() {
        out.push_str(&format!("{} {} patch(es) are valid\n", "✓".green(), patch_count));
        return out;
    }

    for issue in &report.issues {
        out.push_str(&render_issue(issue));
    }

    if report.is_valid() {
        out.push_str(&format!("{} valid with {}\n", "✓".green(), report));
    } else {
        out.push('\n');
        out.push_str(&report.repair_prompt());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use designer_common::NodeId;
    use designer_document::{Document, IssueCode, Node, Patch};

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_clean_batch_renders_one_line() {
        plain();
        let doc = Document::new();
        let patches = vec![Patch::InsertNode {
            node: Node::container("a"),
        }];
        let report = validate_patches(&doc, &patches);
        assert_eq!(render_report(&report, 1), "✓ 1 patch(es) are valid\n");
    }

    #[test]
    fn test_rejected_batch_includes_repair_prompt() {
        plain();
        let doc = Document::new();
        let patches = vec![Patch::DeleteNode {
            node_id: NodeId::new("ghost"),
        }];
        let report = validate_patches(&doc, &patches);
        assert!(!report.is_valid());

        let text = render_report(&report, 1);
        assert!(text.contains("✗"));
        assert!(text.contains("Fix these problems"));
        assert!(text.contains("1. "));
    }

    #[test]
    fn test_warning_only_report_is_valid() {
        plain();
        let mut report = ValidationReport::new();
        report.push(ValidationIssue::warning(IssueCode::MissingComponentReference, "dangling"));

        let text = render_report(&report, 2);
        assert!(text.starts_with("  ! "));
        assert!(text.contains("✓ valid with 0 error(s), 1 warning(s)"));
    }
}
