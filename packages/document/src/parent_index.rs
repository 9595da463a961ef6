//! Derived child → parent map.

use crate::model::Document;
use designer_common::NodeId;
use std::collections::HashMap;

/// Child → parent index, rebuilt from the document's child lists.
///
/// When the document is malformed and a node appears in more than one child
/// list, the first parent in id order wins; the validator is what reports
/// the violation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParentIndex {
    parents: HashMap<NodeId, NodeId>,
}

impl ParentIndex {
    pub fn build(document: &Document) -> Self {
        let mut parents = HashMap::new();
        for node in document.nodes.values() {
            for child in &node.children {
                parents.entry(child.clone()).or_insert_with(|| node.id.clone());
            }
        }
        Self { parents }
    }

    pub fn parent_of(&self, id: &NodeId) -> Option<&NodeId> {
        self.parents.get(id)
    }

    /// Ancestors of `id`, nearest first. Stops if a cycle is encountered.
    pub fn ancestors(&self, id: &NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = self.parents.get(id);
        while let Some(parent) = current {
            if parent == id || result.contains(parent) {
                break;
            }
            result.push(parent.clone());
            current = self.parents.get(parent);
        }
        result
    }

    /// True if `ancestor` is `id` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: &NodeId, id: &NodeId) -> bool {
        ancestor == id || self.ancestors(id).iter().any(|a| a == ancestor)
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}
