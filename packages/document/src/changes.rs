//! Pending change set: which ids downstream consumers must revisit.
//!
//! Three disjoint buckets. A node that is recompile-dirty is never also
//! reported as geometry-dirty, since a recompile subsumes a geometry pass.

use crate::model::Document;
use crate::parent_index::ParentIndex;
use crate::patch::Patch;
use designer_common::{pointer_segments, ComponentId, FrameId, NodeId};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingChangeSet {
    /// Nodes whose position changed and nothing else
    pub geometry: BTreeSet<NodeId>,

    /// Nodes whose content, size, or structure changed
    pub recompile: BTreeSet<NodeId>,

    /// Frames whose own properties changed, or whose root's child list did
    pub frames: BTreeSet<FrameId>,
}

impl PendingChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.geometry.is_empty() && self.recompile.is_empty() && self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.geometry.clear();
        self.recompile.clear();
        self.frames.clear();
    }

    pub fn mark_geometry(&mut self, id: &NodeId) {
        if !self.recompile.contains(id) {
            self.geometry.insert(id.clone());
        }
    }

    pub fn mark_recompile(&mut self, id: &NodeId) {
        self.geometry.remove(id);
        self.recompile.insert(id.clone());
    }

    pub fn mark_frame(&mut self, id: &FrameId) {
        self.frames.insert(id.clone());
    }

    fn mark_with_ancestors(&mut self, id: &NodeId, parents: &ParentIndex) {
        self.mark_recompile(id);
        for ancestor in parents.ancestors(id) {
            self.mark_recompile(&ancestor);
        }
    }

    fn mark_subtree(&mut self, doc: &Document, root: &NodeId) {
        let mut stack = vec![root.clone()];
        let mut seen = BTreeSet::new();
        while let Some(id) = stack.pop() {
            if !seen.insert(id.clone()) {
                continue;
            }
            self.mark_recompile(&id);
            if let Some(node) = doc.node(&id) {
                stack.extend(node.children.iter().cloned());
            }
        }
    }

    fn mark_instances_of(&mut self, doc: &Document, parents: &ParentIndex, component_id: &ComponentId) {
        let instances: Vec<NodeId> = doc
            .nodes
            .values()
            .filter(|node| node.as_instance().is_some_and(|props| &props.component_id == component_id))
            .map(|node| node.id.clone())
            .collect();
        for id in instances {
            self.mark_with_ancestors(&id, parents);
        }
    }

    fn mark_frames_rooted_at(&mut self, doc: &Document, parents: &ParentIndex, id: &NodeId) {
        let mut roots = parents.ancestors(id);
        roots.push(id.clone());
        for frame in doc.frames.values() {
            if roots.contains(&frame.root_node_id) {
                self.frames.insert(frame.id.clone());
            }
        }
    }

    /// Records the effects of `patch` that must be read from the state it is
    /// about to be applied to: what it detaches, deletes, or disowns.
    pub fn record_before(&mut self, patch: &Patch, doc: &Document, parents: &ParentIndex) {
        match patch {
            Patch::DeleteNode { node_id } if doc.nodes.contains_key(node_id) => {
                self.mark_with_ancestors(node_id, parents);
            }

            Patch::DetachChild { parent_id, child_id } => {
                self.mark_with_ancestors(parent_id, parents);
                self.mark_subtree(doc, child_id);
                self.mark_frames_rooted_at(doc, parents, parent_id);
            }

            Patch::MoveNode { node_id, .. } => {
                if let Some(old_parent) = parents.parent_of(node_id) {
                    self.mark_with_ancestors(old_parent, parents);
                    self.mark_frames_rooted_at(doc, parents, old_parent);
                }
            }

            Patch::ReplaceNode { node } if doc.nodes.contains_key(&node.id) => {
                self.mark_subtree(doc, &node.id);
            }

            Patch::RemoveComponent { component_id } => {
                self.mark_instances_of(doc, parents, component_id);
            }

            _ => {}
        }

        // Template edits ripple into every instance of the owning component.
        if let Some(component_id) = touched_template_component(patch, doc) {
            self.mark_instances_of(doc, parents, &component_id);
        }
    }

    /// Records the effects of `patch` visible in the state it produced.
    pub fn record_after(&mut self, patch: &Patch, doc: &Document, parents: &ParentIndex) {
        match patch {
            Patch::SetProp { node_id, path, .. } => {
                if !doc.nodes.contains_key(node_id) {
                    return;
                }
                let segments = pointer_segments(path).unwrap_or_default();
                let root = segments.first().map(String::as_str);
                let second = segments.get(1).map(String::as_str);

                match (root, second) {
                    (Some("layout"), Some("position")) => self.mark_geometry(node_id),
                    (Some("layout"), _) | (Some("props"), _) => self.mark_with_ancestors(node_id, parents),
                    _ => self.mark_recompile(node_id),
                }
            }

            Patch::SetFrameProp { frame_id, .. } | Patch::RemoveFrame { frame_id } => self.mark_frame(frame_id),

            Patch::InsertFrame { frame } => self.mark_frame(&frame.id),

            Patch::InsertNode { node } => self.mark_recompile(&node.id),

            Patch::DeleteNode { .. } | Patch::DetachChild { .. } | Patch::RemoveComponent { .. } => {}

            Patch::AttachChild { parent_id, child_id, .. } => {
                self.mark_with_ancestors(parent_id, parents);
                self.mark_subtree(doc, child_id);
                self.mark_frames_rooted_at(doc, parents, parent_id);
            }

            Patch::MoveNode { node_id, new_parent_id, .. } => {
                self.mark_with_ancestors(new_parent_id, parents);
                self.mark_subtree(doc, node_id);
                self.mark_frames_rooted_at(doc, parents, new_parent_id);
            }

            Patch::ReplaceNode { node } => {
                self.mark_with_ancestors(&node.id, parents);
                self.mark_subtree(doc, &node.id);
            }

            Patch::InsertComponent { component } => {
                self.mark_instances_of(doc, parents, &component.id);
            }
        }
    }

    /// Folds another change set into this one, keeping the buckets disjoint.
    pub fn merge(&mut self, other: PendingChangeSet) {
        for id in other.recompile {
            self.mark_recompile(&id);
        }
        for id in other.geometry {
            self.mark_geometry(&id);
        }
        self.frames.extend(other.frames);
    }
}

fn touched_template_component(patch: &Patch, doc: &Document) -> Option<ComponentId> {
    let id = match patch {
        Patch::SetProp { node_id, .. } | Patch::DeleteNode { node_id } => node_id.clone(),
        Patch::AttachChild { parent_id, .. } | Patch::DetachChild { parent_id, .. } => parent_id.clone(),
        Patch::MoveNode { new_parent_id, .. } => new_parent_id.clone(),
        Patch::ReplaceNode { node } => node.id.clone(),
        _ => return None,
    };
    doc.node(&id)
        .and_then(|node| node.source.as_ref())
        .map(|source| source.component_id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComponentDef, Frame, Node};
    use serde_json::json;

    fn doc() -> Document {
        Document::new()
            .with_node(Node::container("root").with_children(["row", "card"]))
            .with_node(Node::container("row").with_children(["a"]))
            .with_node(Node::text("a", "A"))
            .with_node(Node::instance("card", "button"))
            .with_node(Node::text("button::label", "OK").with_source("button", "label"))
            .with_component(ComponentDef::new("button", "button::label"))
            .with_frame(Frame::new("f1", "root"))
    }

    fn record(patch: Patch) -> PendingChangeSet {
        let mut d = doc();
        let mut changes = PendingChangeSet::new();

        changes.record_before(&patch, &d, &ParentIndex::build(&d));
        patch.apply(&mut d);
        changes.record_after(&patch, &d, &ParentIndex::build(&d));
        changes
    }

    #[test]
    fn test_position_write_is_geometry_only() {
        let changes = record(Patch::SetProp {
            node_id: NodeId::new("a"),
            path: "/layout/position/x".to_string(),
            value: json!(10.0),
        });
        assert!(changes.geometry.contains(&NodeId::new("a")));
        assert!(changes.recompile.is_empty());
    }

    #[test]
    fn test_prop_write_dirties_ancestors() {
        let changes = record(Patch::SetProp {
            node_id: NodeId::new("a"),
            path: "/props/text".to_string(),
            value: json!("B"),
        });
        let expected: BTreeSet<NodeId> = ["a", "row", "root"].into_iter().map(NodeId::new).collect();
        assert_eq!(changes.recompile, expected);
        assert!(changes.geometry.is_empty());
    }

    #[test]
    fn test_detach_dirties_parent_chain_and_subtree() {
        let changes = record(Patch::DetachChild {
            parent_id: NodeId::new("root"),
            child_id: NodeId::new("row"),
        });
        for id in ["root", "row", "a"] {
            assert!(changes.recompile.contains(&NodeId::new(id)), "{} should be dirty", id);
        }
        assert!(changes.frames.contains(&FrameId::new("f1")));
    }

    #[test]
    fn test_template_edit_dirties_instances() {
        let changes = record(Patch::SetProp {
            node_id: NodeId::new("button::label"),
            path: "/props/text".to_string(),
            value: json!("Go"),
        });
        assert!(changes.recompile.contains(&NodeId::new("card")));
        assert!(changes.recompile.contains(&NodeId::new("root")));
    }

    #[test]
    fn test_buckets_stay_disjoint() {
        let mut changes = PendingChangeSet::new();
        changes.mark_recompile(&NodeId::new("a"));
        changes.mark_geometry(&NodeId::new("a"));
        assert!(changes.geometry.is_empty());

        let mut other = PendingChangeSet::new();
        other.mark_geometry(&NodeId::new("b"));
        changes.merge(other);
        changes.mark_recompile(&NodeId::new("b"));
        assert!(changes.geometry.is_empty());
        assert_eq!(changes.recompile.len(), 2);
    }
}
