//! Turning a final preview into a patch batch.

use crate::preview::{DraggedNode, DropIntent, DropPreview};
use designer_common::NodeId;
use designer_document::Patch;
use serde::{Deserialize, Serialize};

/// Snapshot of a drop at release time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropCommitPlan {
    /// Shared pre-drag parent, if the nodes had one
    pub origin_parent: Option<NodeId>,

    pub target_parent: NodeId,

    /// Index into the target's children once the dragged nodes are detached
    pub insertion_index: usize,

    /// Dragged nodes in selection order
    pub dragged: Vec<NodeId>,

    pub is_reparent: bool,
}

impl DropCommitPlan {
    pub fn from_preview(preview: &DropPreview, dragged: &[DraggedNode]) -> Self {
        Self {
            origin_parent: dragged.first().and_then(|d| d.original_parent.clone()),
            target_parent: preview.target_node.clone(),
            insertion_index: preview.insertion_index,
            dragged: dragged.iter().map(|d| d.node_id.clone()).collect(),
            is_reparent: preview.intent == DropIntent::Reparent,
        }
    }

    /// Detaches every dragged node, then attaches them in order at
    /// consecutive indices from the base index. Detaching first leaves the
    /// target's children exactly as the insertion index was computed against.
    pub fn to_patches(&self) -> Vec<Patch> {
        let mut patches = Vec::with_capacity(self.dragged.len() * 2);

        if let Some(origin) = &self.origin_parent {
            for node in &self.dragged {
                patches.push(Patch::DetachChild {
                    parent_id: origin.clone(),
                    child_id: node.clone(),
                });
            }
        }

        for (offset, node) in self.dragged.iter().enumerate() {
            patches.push(Patch::AttachChild {
                parent_id: self.target_parent.clone(),
                child_id: node.clone(),
                index: (self.insertion_index + offset) as i64,
            });
        }

        patches
    }
}
