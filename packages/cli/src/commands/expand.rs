use super::{load_document, Format};
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use designer_common::FrameId;
use designer_scene::{expand_frame, ExpandedScene, OriginKind};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ExpandArgs {
    /// Document JSON file
    pub document: PathBuf,

    /// Frame to expand
    pub frame_id: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
}

pub fn expand(args: ExpandArgs) -> Result<()> {
    let document = load_document(&args.document)?;
    let frame_id = FrameId::new(args.frame_id);

    let scene = expand_frame(&document, &frame_id).ok_or_else(|| anyhow!("frame `{}` does not exist", frame_id))?;

    match args.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&scene)?),
        Format::Text => print!("{}", render_tree(&scene)),
    }
    Ok(())
}

fn origin_label(kind: OriginKind) -> &'static str {
    match kind {
        OriginKind::FrameNode => "frame",
        OriginKind::ComponentChild => "template",
        OriginKind::SlotContent => "slot",
        OriginKind::ErrorPlaceholder => "placeholder",
    }
}

/// One line per node, indented by depth
pub(crate) fn render_tree(scene: &ExpandedScene) -> String {
    let mut out = String::new();

    for (depth, node) in scene.walk() {
        let indent = "  ".repeat(depth);
        let kind = origin_label(node.origin.kind);
        let edit = match &node.patch_target {
            Some(target) => format!("→ {}", target).green().to_string(),
            None => "read-only".dimmed().to_string(),
        };

        out.push_str(&format!(
            "{}{} {} [{}] {}",
            indent,
            node.id.as_str().bold(),
            node.node.node_type().as_str(),
            kind,
            edit
        ));
        if let Some(placeholder) = &node.placeholder {
            out.push_str(&format!(" {}", format!("{:?}", placeholder).red()));
        }
        out.push('\n');
    }
    out
}
