//! Expanded scene types.

use designer_common::{ComponentId, ExpandedId, FrameId, NodeId};
use designer_document::Node;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Why an expanded node exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OriginKind {
    /// A node stored in the frame's own tree
    FrameNode,
    /// A node materialized from a component template
    ComponentChild,
    /// Slot fill: assigned content, default content, or an empty slot
    SlotContent,
    /// Stand-in for something that could not be expanded
    ErrorPlaceholder,
}

/// Provenance of an expanded node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeOrigin {
    pub kind: OriginKind,

    /// Component whose template (or slot) produced this node
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_id: Option<ComponentId>,

    /// Enclosing instances, outermost first
    pub instance_path: Vec<NodeId>,

    /// True if instance overrides were merged into the props
    pub overridden: bool,
}

/// What a placeholder stands in for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Placeholder {
    /// A child or frame root id that does not resolve
    MissingNode { node_id: NodeId },
    /// An instance of a component that does not exist
    MissingComponent { component_id: ComponentId },
    /// An instance of a component that is already being expanded
    ComponentCycle {
        component_id: ComponentId,
        stack: Vec<ComponentId>,
    },
    /// A slot with neither an assignment nor default content
    EmptySlot { slot_name: String },
}

/// A fully materialized node in an expanded scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedNode {
    pub id: ExpandedId,

    /// Node data with overrides applied. `node.children` is empty; the
    /// expanded child list is `children`.
    pub node: Node,

    pub children: Vec<ExpandedId>,

    /// Structural id this node may be edited through, if any
    pub patch_target: Option<NodeId>,

    pub origin: NodeOrigin,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<Placeholder>,
}

impl ExpandedNode {
    pub fn is_placeholder(&self) -> bool {
        self.placeholder.is_some()
    }
}

/// Result of expanding one frame. Derived and disposable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedScene {
    pub frame_id: FrameId,
    pub root: ExpandedId,
    pub nodes: BTreeMap<ExpandedId, ExpandedNode>,

    /// Expanded id → structural patch target
    pub patch_targets: BTreeMap<ExpandedId, Option<NodeId>>,
}

impl ExpandedScene {
    pub fn root(&self) -> &ExpandedId {
        &self.root
    }

    pub fn get(&self, id: &ExpandedId) -> Option<&ExpandedNode> {
        self.nodes.get(id)
    }

    /// Expanded children of `id`; empty if `id` is unknown
    pub fn children(&self, id: &ExpandedId) -> &[ExpandedId] {
        self.nodes.get(id).map(|node| node.children.as_slice()).unwrap_or_default()
    }

    pub fn patch_target(&self, id: &ExpandedId) -> Option<&NodeId> {
        self.patch_targets.get(id).and_then(Option::as_ref)
    }

    pub fn is_editable(&self, id: &ExpandedId) -> bool {
        self.patch_target(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Pre-order walk from the root, with depth
    pub fn walk(&self) -> Vec<(usize, &ExpandedNode)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(0usize, &self.root)];
        while let Some((depth, id)) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            out.push((depth, node));
            for child in node.children.iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }
}
