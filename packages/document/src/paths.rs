//! Allow-list of writable property paths.

use crate::model::NodeType;
use designer_common::pointer_segments;

const NODE_ROOTS: &[&str] = &["name", "layout", "style", "props"];
const LAYOUT_FIELDS: &[&str] = &["position", "width", "height", "autoLayout"];
const STYLE_FIELDS: &[&str] = &["fill", "stroke", "cornerRadii", "shadow", "opacity", "visible"];
const FRAME_ROOTS: &[&str] = &["name", "position", "size", "rootNodeId"];

/// Property names accepted under `/props` for each node type
pub fn prop_names(node_type: NodeType) -> &'static [&'static str] {
    match node_type {
        NodeType::Container => &["clipContent"],
        NodeType::Text => &["text", "fontSize", "fontWeight", "textAlign"],
        NodeType::Image => &["src", "fit"],
        NodeType::Icon => &["name", "size"],
        NodeType::Spacer => &[],
        NodeType::Instance => &["componentId", "overrides", "slotAssignments"],
        NodeType::Slot => &["name"],
    }
}

/// Checks a node property path. The error is a human-readable reason.
pub fn check_node_path(node_type: NodeType, path: &str) -> Result<(), String> {
    let segments = pointer_segments(path).ok_or_else(|| format!("`{}` is not a pointer path", path))?;
    let root = segments[0].as_str();

    if !NODE_ROOTS.contains(&root) {
        return Err(format!(
            "`{}` is not writable; paths must start with one of {}",
            root,
            NODE_ROOTS.join(", ")
        ));
    }

    let Some(field) = segments.get(1).map(String::as_str) else {
        return match root {
            "name" => Ok(()),
            _ => Err(format!("`/{}` must name a field", root)),
        };
    };

    let allowed: &[&str] = match root {
        "layout" => LAYOUT_FIELDS,
        "style" => STYLE_FIELDS,
        "props" => prop_names(node_type),
        _ => return Err(format!("`/{}` has no sub-fields", root)),
    };

    if allowed.contains(&field) {
        Ok(())
    } else if root == "props" {
        Err(format!(
            "`{}` is not a property of {} nodes (expected one of: {})",
            field,
            node_type.as_str(),
            allowed.join(", ")
        ))
    } else {
        Err(format!("`{}` is not a {} field", field, root))
    }
}

/// Checks a frame property path.
pub fn check_frame_path(path: &str) -> Result<(), String> {
    let segments = pointer_segments(path).ok_or_else(|| format!("`{}` is not a pointer path", path))?;
    if FRAME_ROOTS.contains(&segments[0].as_str()) {
        Ok(())
    } else {
        Err(format!(
            "`{}` is not a frame field (expected one of: {})",
            segments[0],
            FRAME_ROOTS.join(", ")
        ))
    }
}
