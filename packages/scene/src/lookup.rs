//! # Lookup Index
//!
//! Bidirectional map between the two id domains of one expanded scene, plus
//! the expanded parent relation. Built once per scene recompute and never
//! mutated afterwards.
//!
//! A structural node maps to several expanded ids when it is reached through
//! more than one path; the reverse direction is at most one structural id.

use crate::scene::ExpandedScene;
use designer_common::{ExpandedId, NodeId};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default)]
pub struct LookupIndex {
    root: Option<ExpandedId>,
    expanded_to_doc: BTreeMap<ExpandedId, Option<NodeId>>,
    doc_to_expanded: BTreeMap<NodeId, Vec<ExpandedId>>,
    expanded_parent: HashMap<ExpandedId, ExpandedId>,
}

impl LookupIndex {
    pub fn build(scene: &ExpandedScene) -> Self {
        let expanded_to_doc = scene.patch_targets.clone();

        let mut doc_to_expanded: BTreeMap<NodeId, Vec<ExpandedId>> = BTreeMap::new();
        let mut expanded_parent = HashMap::with_capacity(scene.len());

        // Second walk, in scene order, so reverse lists are in tree order.
        for (_, node) in scene.walk() {
            if let Some(target) = &node.patch_target {
                doc_to_expanded
                    .entry(target.clone())
                    .or_default()
                    .push(node.id.clone());
            }
            for child in &node.children {
                expanded_parent.insert(child.clone(), node.id.clone());
            }
        }

        Self {
            root: Some(scene.root.clone()),
            expanded_to_doc,
            doc_to_expanded,
            expanded_parent,
        }
    }

    pub fn root(&self) -> Option<&ExpandedId> {
        self.root.as_ref()
    }

    /// Structural id `id` may be edited through, if any
    pub fn patch_target(&self, id: &ExpandedId) -> Option<&NodeId> {
        self.expanded_to_doc.get(id).and_then(Option::as_ref)
    }

    /// True if `id` is part of the scene at all
    pub fn contains(&self, id: &ExpandedId) -> bool {
        self.expanded_to_doc.contains_key(id)
    }

    /// Every expanded occurrence of a structural node, in tree order
    pub fn expanded_ids_for(&self, id: &NodeId) -> &[ExpandedId] {
        self.doc_to_expanded.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn parent_of(&self, id: &ExpandedId) -> Option<&ExpandedId> {
        self.expanded_parent.get(id)
    }

    /// Ancestors of `id`, nearest first
    pub fn ancestors(&self, id: &ExpandedId) -> Vec<ExpandedId> {
        let mut out = Vec::new();
        let mut current = self.expanded_parent.get(id);
        while let Some(parent) = current {
            if out.contains(parent) || parent == id {
                break;
            }
            out.push(parent.clone());
            current = self.expanded_parent.get(parent);
        }
        out
    }

    /// Climbs from `id` itself towards the root and returns the first node
    /// satisfying `predicate`.
    pub fn find_ancestor(&self, id: &ExpandedId, predicate: impl Fn(&ExpandedId) -> bool) -> Option<ExpandedId> {
        if predicate(id) {
            return Some(id.clone());
        }
        self.ancestors(id).into_iter().find(|ancestor| predicate(ancestor))
    }

    /// True if `ancestor` is `id` or one of its ancestors
    pub fn is_ancestor_or_self(&self, ancestor: &ExpandedId, id: &ExpandedId) -> bool {
        ancestor == id || self.ancestors(id).iter().any(|a| a == ancestor)
    }
}
