//! # Cascade Planner
//!
//! Deleting a node or a component has knock-on effects the patch protocol
//! deliberately does not perform on its own: descendants, slot content owned
//! by deleted instances, frames rooted in the deleted region, and instances
//! of a removed component. The planner expands one intent into a complete,
//! validator-clean batch.
//!
//! Ordering rules:
//! - Frames are removed before their roots disappear
//! - Each deleted region's root is detached from its parent first
//! - Nodes are deleted parents-before-children, so every `DeleteNode`
//!   targets a node that is no longer listed as anyone's child

use crate::model::Document;
use crate::parent_index::ParentIndex;
use crate::patch::Patch;
use designer_common::{ComponentId, FrameId, NodeId};
use std::collections::{BTreeSet, HashSet, VecDeque};
use tracing::debug;

/// Batch that deletes `node_id`, its descendants, and any slot content owned
/// by deleted instances. Empty when the node does not exist.
pub fn plan_delete_subtree(doc: &Document, node_id: &NodeId) -> Vec<Patch> {
    if !doc.nodes.contains_key(node_id) {
        return vec![];
    }
    plan_delete_many(doc, vec![node_id.clone()])
}

/// Batch that removes a component: frames editing it, every instance of it
/// (with their owned content), its template nodes, and the definition itself.
pub fn plan_remove_component(doc: &Document, component_id: &ComponentId) -> Vec<Patch> {
    let Some(component) = doc.component(component_id) else {
        return vec![];
    };

    let mut patches: Vec<Patch> = doc
        .frames
        .values()
        .filter(|frame| frame.component_id.as_ref() == Some(component_id))
        .map(|frame| Patch::RemoveFrame {
            frame_id: frame.id.clone(),
        })
        .collect();
    let already_removed: BTreeSet<FrameId> = doc
        .frames
        .values()
        .filter(|frame| frame.component_id.as_ref() == Some(component_id))
        .map(|frame| frame.id.clone())
        .collect();

    let mut roots: Vec<NodeId> = doc
        .nodes
        .values()
        .filter(|node| node.as_instance().is_some_and(|props| &props.component_id == component_id))
        .map(|node| node.id.clone())
        .collect();
    if doc.nodes.contains_key(&component.root_node_id) {
        roots.push(component.root_node_id.clone());
    }

    patches.extend(
        plan_delete_many(doc, roots)
            .into_iter()
            .filter(|patch| !matches!(patch, Patch::RemoveFrame { frame_id } if already_removed.contains(frame_id))),
    );
    patches.push(Patch::RemoveComponent {
        component_id: component_id.clone(),
    });

    debug!(%component_id, patches = patches.len(), "planned component removal");
    patches
}

fn plan_delete_many(doc: &Document, roots: Vec<NodeId>) -> Vec<Patch> {
    let parents = ParentIndex::build(doc);
    let mut queue: VecDeque<NodeId> = roots.into();
    let mut seen: HashSet<NodeId> = HashSet::new();
    let mut region_roots: Vec<NodeId> = Vec::new();
    let mut doomed: Vec<NodeId> = Vec::new();

    while let Some(root) = queue.pop_front() {
        if seen.contains(&root) || !doc.nodes.contains_key(&root) {
            continue;
        }
        region_roots.push(root.clone());

        // Pre-order walk of the region
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !seen.insert(id.clone()) {
                continue;
            }
            let Some(node) = doc.node(&id) else {
                continue;
            };
            if node.as_instance().is_some() {
                queue.extend(owned_content(doc, &id));
            }
            stack.extend(node.children.iter().rev().cloned());
            doomed.push(id);
        }
    }

    let mut patches: Vec<Patch> = doc
        .frames
        .values()
        .filter(|frame| seen.contains(&frame.root_node_id))
        .map(|frame| Patch::RemoveFrame {
            frame_id: frame.id.clone(),
        })
        .collect();

    for root in &region_roots {
        if let Some(parent) = parents.parent_of(root) {
            patches.push(Patch::DetachChild {
                parent_id: parent.clone(),
                child_id: root.clone(),
            });
        }
    }

    patches.extend(doomed.into_iter().map(|node_id| Patch::DeleteNode { node_id }));
    patches
}

/// Roots of slot content owned by `instance_id`
fn owned_content(doc: &Document, instance_id: &NodeId) -> Vec<NodeId> {
    let mut roots: Vec<NodeId> = doc
        .node(instance_id)
        .and_then(|node| node.as_instance())
        .map(|props| props.slot_assignments.values().cloned().collect())
        .unwrap_or_default();

    roots.extend(
        doc.nodes
            .values()
            .filter(|node| node.owner_instance_id.as_ref() == Some(instance_id))
            .map(|node| node.id.clone()),
    );

    roots
        .into_iter()
        .filter(|id| {
            doc.node(id)
                .is_some_and(|node| node.owner_instance_id.as_ref() == Some(instance_id))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComponentDef, Frame, Node};
    use crate::patch::apply_all;
    use crate::validator::validate_patches;

    fn doc() -> Document {
        let mut card = Node::instance("card", "button");
        if let crate::model::NodeKind::Instance(props) = &mut card.kind {
            props.slot_assignments.insert("icon".to_string(), NodeId::new("star"));
        }

        Document::new()
            .with_node(Node::container("root").with_children(["row", "card"]))
            .with_node(Node::container("row").with_children(["a", "b"]))
            .with_node(Node::text("a", "A"))
            .with_node(Node::text("b", "B"))
            .with_node(card)
            .with_node(Node::container("star").with_owner("card").with_children(["star-label"]))
            .with_node(Node::text("star-label", "*"))
            .with_node(
                Node::container("button::root")
                    .with_source("button", "root")
                    .with_children(["button::icon"]),
            )
            .with_node(Node::slot("button::icon", "icon").with_source("button", "icon"))
            .with_component(ComponentDef::new("button", "button::root"))
            .with_frame(Frame::new("f1", "root"))
            .with_frame(Frame {
                component_id: Some(ComponentId::new("button")),
                ..Frame::new("button-editor", "button::root")
            })
    }

    #[test]
    fn test_delete_subtree_is_valid_and_complete() {
        let d = doc();
        let batch = plan_delete_subtree(&d, &NodeId::new("row"));
        assert_eq!(
            batch[0],
            Patch::DetachChild {
                parent_id: NodeId::new("root"),
                child_id: NodeId::new("row"),
            }
        );

        let report = validate_patches(&d, &batch);
        assert!(report.is_valid(), "{:?}", report.issues);

        let after = apply_all(&d, &batch);
        for id in ["row", "a", "b"] {
            assert!(!after.nodes.contains_key(&NodeId::new(id)));
        }
        assert_eq!(after.nodes[&NodeId::new("root")].children, vec![NodeId::new("card")]);
    }

    #[test]
    fn test_delete_instance_takes_owned_content() {
        let d = doc();
        let batch = plan_delete_subtree(&d, &NodeId::new("card"));
        assert!(validate_patches(&d, &batch).is_valid());

        let after = apply_all(&d, &batch);
        for id in ["card", "star", "star-label"] {
            assert!(!after.nodes.contains_key(&NodeId::new(id)), "{} should be gone", id);
        }
    }

    #[test]
    fn test_delete_frame_root_removes_frame() {
        let d = doc();
        let batch = plan_delete_subtree(&d, &NodeId::new("root"));
        assert!(batch.contains(&Patch::RemoveFrame {
            frame_id: FrameId::new("f1"),
        }));
        assert!(validate_patches(&d, &batch).is_valid());
    }

    #[test]
    fn test_remove_component_cascades() {
        let d = doc();
        let batch = plan_remove_component(&d, &ComponentId::new("button"));
        let report = validate_patches(&d, &batch);
        assert!(report.is_valid(), "{:?}", report.issues);

        let after = apply_all(&d, &batch);
        assert!(after.components.is_empty());
        assert!(!after.frames.contains_key(&FrameId::new("button-editor")));
        for id in ["card", "star", "button::root", "button::icon"] {
            assert!(!after.nodes.contains_key(&NodeId::new(id)), "{} should be gone", id);
        }
        assert_eq!(after.nodes[&NodeId::new("root")].children, vec![NodeId::new("row")]);
    }

    #[test]
    fn test_missing_targets_plan_nothing() {
        let d = doc();
        assert!(plan_delete_subtree(&d, &NodeId::new("ghost")).is_empty());
        assert!(plan_remove_component(&d, &ComponentId::new("ghost")).is_empty());
    }
}
