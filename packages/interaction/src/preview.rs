//! Inputs and outputs of one drop resolution.

use designer_common::{Axis, ExpandedId, FrameId, NodeId, Point, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A node being dragged, with the parent it had when the gesture began
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraggedNode {
    pub node_id: NodeId,
    pub original_parent: Option<NodeId>,
}

impl DraggedNode {
    pub fn new(node_id: impl Into<NodeId>, original_parent: Option<NodeId>) -> Self {
        Self {
            node_id: node_id.into(),
            original_parent,
        }
    }
}

/// Everything that varies per pointer update
#[derive(Debug, Clone, PartialEq)]
pub struct DropQuery {
    /// Frame captured at gesture start
    pub frame_id: FrameId,

    /// Cursor in world coordinates
    pub cursor: Point,

    /// Dragged nodes in selection order
    pub dragged: Vec<DraggedNode>,

    /// Content box of the origin parent in world coordinates, if known
    pub origin_content_rect: Option<Rect>,

    pub zoom: f64,
}

impl DropQuery {
    pub fn new(frame_id: impl Into<FrameId>, cursor: Point, dragged: Vec<DraggedNode>) -> Self {
        Self {
            frame_id: frame_id.into(),
            cursor,
            dragged,
            origin_content_rect: None,
            zoom: 1.0,
        }
    }

    pub fn with_origin_content_rect(mut self, rect: Rect) -> Self {
        self.origin_content_rect = Some(rect);
        self
    }

    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = zoom;
        self
    }

    pub fn dragged_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.dragged.iter().map(|d| &d.node_id)
    }
}

/// What a drop would do to the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DropIntent {
    /// Dragged nodes had no parent
    None,
    /// Same parent, new position
    Reorder,
    /// Different parent
    Reparent,
}

/// Translation to apply to a sibling while previewing a reorder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReflowOffset {
    pub id: ExpandedId,
    pub dx: f64,
    pub dy: f64,
}

/// A resolved drop location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropPreview {
    pub frame_id: FrameId,

    /// Expanded container that would receive the nodes
    pub target: ExpandedId,

    /// Structural node behind `target`
    pub target_node: NodeId,

    /// Main layout axis of the target
    pub axis: Axis,

    /// Position in the target's children once the dragged nodes are removed;
    /// the base index for committing
    pub insertion_index: usize,

    /// Same position in the target's full expanded child list
    pub display_index: usize,

    /// Insertion indicator in world coordinates
    pub indicator: Rect,

    pub intent: DropIntent,

    /// Sibling displacement, only for reorders
    pub reflow: Vec<ReflowOffset>,
}

/// Why no drop is possible at the current cursor position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum InvalidDrop {
    /// Nothing is being dragged
    EmptySelection,
    /// Dragged nodes come from different parents
    MixedOrigins,
    /// No auto-layout container with a patch target under the cursor
    NoEligibleTarget,
    /// The target cannot be edited through any structural node
    NoPatchTarget { target: ExpandedId },
    /// The target's structural node is gone
    MissingTargetNode { node_id: NodeId },
    /// A dragged node contains the target
    CircularDrop { node_id: NodeId },
    /// The target's content box has no area
    DegenerateContentBox { target: ExpandedId },
}

impl fmt::Display for InvalidDrop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidDrop::EmptySelection => write!(f, "nothing is being dragged"),
            InvalidDrop::MixedOrigins => write!(f, "dragged nodes do not share a parent"),
            InvalidDrop::NoEligibleTarget => write!(f, "no container accepts the drop here"),
            InvalidDrop::NoPatchTarget { target } => write!(f, "`{}` is not editable", target),
            InvalidDrop::MissingTargetNode { node_id } => write!(f, "node `{}` no longer exists", node_id),
            InvalidDrop::CircularDrop { node_id } => write!(f, "`{}` cannot be dropped into itself", node_id),
            InvalidDrop::DegenerateContentBox { target } => write!(f, "`{}` has no room for content", target),
        }
    }
}

/// Outcome of one resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "camelCase")]
pub enum DropResolution {
    Valid(DropPreview),
    Invalid(InvalidDrop),
}

impl DropResolution {
    pub fn is_valid(&self) -> bool {
        matches!(self, DropResolution::Valid(_))
    }

    pub fn preview(&self) -> Option<&DropPreview> {
        match self {
            DropResolution::Valid(preview) => Some(preview),
            DropResolution::Invalid(_) => None,
        }
    }

    pub fn invalid_reason(&self) -> Option<&InvalidDrop> {
        match self {
            DropResolution::Valid(_) => None,
            DropResolution::Invalid(reason) => Some(reason),
        }
    }
}
