//! # Patch Protocol
//!
//! A closed set of atomic, serializable, invertible document mutations.
//!
//! ## Semantics
//!
//! - **Apply is total**: a patch whose references do not resolve is a no-op.
//!   Structural validity is checked separately, before a batch reaches the
//!   store (see [`crate::validator`]).
//! - **Inverses are computed before application**, against the document the
//!   patch is about to mutate. A batch's inverse list is stored in reverse
//!   order, so replaying it front to back undoes the batch.
//! - **Child indices**: a negative index appends; an index past the end is
//!   clamped to the end.
//! - **Property writes** address the node's (or frame's) JSON shape with a
//!   slash-delimited pointer. Writing `null` clears the addressed key. `id`
//!   and `children` cannot be written through a pointer.
//!
//! ## Wire format
//!
//! Each patch is a tagged object: `{"type":"AttachChild","parentId":"r",...}`.

use crate::model::{ComponentDef, Document, Frame, Node};
use crate::parent_index::ParentIndex;
use designer_common::{first_missing_pointer, pointer_segments, set_pointer, ComponentId, FrameId, NodeId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Pointer roots that a property write may never touch
const IMMUTABLE_ROOTS: &[&str] = &["id", "children"];

/// Atomic document mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum Patch {
    /// Write a node property through a pointer path
    SetProp {
        node_id: NodeId,
        path: String,
        value: Value,
    },

    /// Write a frame property through a pointer path
    SetFrameProp {
        frame_id: FrameId,
        path: String,
        value: Value,
    },

    /// Add a detached node
    InsertNode { node: Node },

    /// Remove a node; it must already be detached from any parent
    DeleteNode { node_id: NodeId },

    /// Insert `child_id` into `parent_id`'s children at `index` (negative appends)
    AttachChild {
        parent_id: NodeId,
        child_id: NodeId,
        index: i64,
    },

    /// Remove `child_id` from `parent_id`'s children
    DetachChild { parent_id: NodeId, child_id: NodeId },

    /// Detach from the current parent, then attach to `new_parent_id` at `index`
    MoveNode {
        node_id: NodeId,
        new_parent_id: NodeId,
        index: i64,
    },

    /// Substitute a whole node, keeping its id
    ReplaceNode { node: Node },

    InsertFrame { frame: Frame },

    RemoveFrame { frame_id: FrameId },

    InsertComponent { component: ComponentDef },

    RemoveComponent { component_id: ComponentId },
}

impl Patch {
    /// Variant name, as it appears in the `type` tag
    pub fn kind(&self) -> &'static str {
        match self {
            Patch::SetProp { .. } => "SetProp",
            Patch::SetFrameProp { .. } => "SetFrameProp",
            Patch::InsertNode { .. } => "InsertNode",
            Patch::DeleteNode { .. } => "DeleteNode",
            Patch::AttachChild { .. } => "AttachChild",
            Patch::DetachChild { .. } => "DetachChild",
            Patch::MoveNode { .. } => "MoveNode",
            Patch::ReplaceNode { .. } => "ReplaceNode",
            Patch::InsertFrame { .. } => "InsertFrame",
            Patch::RemoveFrame { .. } => "RemoveFrame",
            Patch::InsertComponent { .. } => "InsertComponent",
            Patch::RemoveComponent { .. } => "RemoveComponent",
        }
    }

    /// The id this patch primarily addresses, for diagnostics
    pub fn target_id(&self) -> String {
        match self {
            Patch::SetProp { node_id, .. }
            | Patch::DeleteNode { node_id }
            | Patch::MoveNode { node_id, .. } => node_id.to_string(),
            Patch::InsertNode { node } | Patch::ReplaceNode { node } => node.id.to_string(),
            Patch::AttachChild { child_id, .. } | Patch::DetachChild { child_id, .. } => child_id.to_string(),
            Patch::SetFrameProp { frame_id, .. } | Patch::RemoveFrame { frame_id } => frame_id.to_string(),
            Patch::InsertFrame { frame } => frame.id.to_string(),
            Patch::InsertComponent { component } => component.id.to_string(),
            Patch::RemoveComponent { component_id } => component_id.to_string(),
        }
    }

    /// True if this patch can change parent/child edges or the node set
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Patch::InsertNode { .. }
                | Patch::DeleteNode { .. }
                | Patch::AttachChild { .. }
                | Patch::DetachChild { .. }
                | Patch::MoveNode { .. }
                | Patch::ReplaceNode { .. }
        )
    }

    /// Apply this patch in place. Unresolvable references are no-ops.
    pub fn apply(&self, doc: &mut Document) {
        match self {
            Patch::SetProp { node_id, path, value } => apply_set_prop(doc, node_id, path, value),

            Patch::SetFrameProp { frame_id, path, value } => apply_set_frame_prop(doc, frame_id, path, value),

            Patch::InsertNode { node } => {
                if doc.nodes.contains_key(&node.id) {
                    debug!(node_id = %node.id, "InsertNode: id already present, skipping");
                    return;
                }
                doc.nodes.insert(node.id.clone(), node.clone());
            }

            Patch::DeleteNode { node_id } => {
                if doc.nodes.remove(node_id).is_none() {
                    debug!(%node_id, "DeleteNode: node not found, skipping");
                }
            }

            Patch::AttachChild { parent_id, child_id, index } => {
                apply_attach(doc, parent_id, child_id, *index);
            }

            Patch::DetachChild { parent_id, child_id } => {
                apply_detach(doc, parent_id, child_id);
            }

            Patch::MoveNode { node_id, new_parent_id, index } => {
                if !doc.nodes.contains_key(node_id) || !doc.nodes.contains_key(new_parent_id) {
                    debug!(%node_id, %new_parent_id, "MoveNode: unresolved reference, skipping");
                    return;
                }
                if let Some(old_parent) = doc.find_parent(node_id).cloned() {
                    apply_detach(doc, &old_parent, node_id);
                }
                apply_attach(doc, new_parent_id, node_id, *index);
            }

            Patch::ReplaceNode { node } => match doc.nodes.get_mut(&node.id) {
                Some(existing) => *existing = node.clone(),
                None => debug!(node_id = %node.id, "ReplaceNode: node not found, skipping"),
            },

            Patch::InsertFrame { frame } => {
                if doc.frames.contains_key(&frame.id) {
                    debug!(frame_id = %frame.id, "InsertFrame: id already present, skipping");
                    return;
                }
                doc.frames.insert(frame.id.clone(), frame.clone());
            }

            Patch::RemoveFrame { frame_id } => {
                doc.frames.remove(frame_id);
            }

            Patch::InsertComponent { component } => {
                if doc.components.contains_key(&component.id) {
                    debug!(component_id = %component.id, "InsertComponent: id already present, skipping");
                    return;
                }
                doc.components.insert(component.id.clone(), component.clone());
            }

            Patch::RemoveComponent { component_id } => {
                doc.components.remove(component_id);
            }
        }
    }

    /// Patches that undo this one, computed against the document it is about
    /// to be applied to. Empty when this patch would be a no-op.
    pub fn inverse(&self, doc: &Document, parents: &ParentIndex) -> Vec<Patch> {
        match self {
            Patch::SetProp { node_id, path, .. } => {
                let Some(node) = doc.node(node_id) else {
                    return vec![];
                };
                if !is_writable_path(path) {
                    return vec![];
                }
                match serde_json::to_value(node) {
                    Ok(json) => vec![restore_prop(&json, path, |path, value| Patch::SetProp {
                        node_id: node_id.clone(),
                        path,
                        value,
                    })],
                    Err(_) => vec![],
                }
            }

            Patch::SetFrameProp { frame_id, path, .. } => {
                let Some(frame) = doc.frame(frame_id) else {
                    return vec![];
                };
                if !is_writable_path(path) {
                    return vec![];
                }
                match serde_json::to_value(frame) {
                    Ok(json) => vec![restore_prop(&json, path, |path, value| Patch::SetFrameProp {
                        frame_id: frame_id.clone(),
                        path,
                        value,
                    })],
                    Err(_) => vec![],
                }
            }

            Patch::InsertNode { node } => {
                if doc.nodes.contains_key(&node.id) {
                    vec![]
                } else {
                    vec![Patch::DeleteNode {
                        node_id: node.id.clone(),
                    }]
                }
            }

            Patch::DeleteNode { node_id } => match doc.node(node_id) {
                Some(node) => vec![Patch::InsertNode { node: node.clone() }],
                None => vec![],
            },

            Patch::AttachChild { parent_id, child_id, .. } => {
                if attach_is_effective(doc, parent_id, child_id) {
                    vec![Patch::DetachChild {
                        parent_id: parent_id.clone(),
                        child_id: child_id.clone(),
                    }]
                } else {
                    vec![]
                }
            }

            Patch::DetachChild { parent_id, child_id } => {
                match child_position(doc, parent_id, child_id) {
                    Some(position) => vec![Patch::AttachChild {
                        parent_id: parent_id.clone(),
                        child_id: child_id.clone(),
                        index: position as i64,
                    }],
                    None => vec![],
                }
            }

            Patch::MoveNode { node_id, new_parent_id, .. } => {
                if !doc.nodes.contains_key(node_id) || !doc.nodes.contains_key(new_parent_id) {
                    return vec![];
                }
                let old_position = parents
                    .parent_of(node_id)
                    .and_then(|parent| child_position(doc, parent, node_id).map(|pos| (parent, pos)));

                match old_position {
                    Some((old_parent, position)) => vec![Patch::MoveNode {
                        node_id: node_id.clone(),
                        new_parent_id: old_parent.clone(),
                        index: position as i64,
                    }],
                    None => vec![Patch::DetachChild {
                        parent_id: new_parent_id.clone(),
                        child_id: node_id.clone(),
                    }],
                }
            }

            Patch::ReplaceNode { node } => match doc.node(&node.id) {
                Some(existing) => vec![Patch::ReplaceNode { node: existing.clone() }],
                None => vec![],
            },

            Patch::InsertFrame { frame } => {
                if doc.frames.contains_key(&frame.id) {
                    vec![]
                } else {
                    vec![Patch::RemoveFrame {
                        frame_id: frame.id.clone(),
                    }]
                }
            }

            Patch::RemoveFrame { frame_id } => match doc.frame(frame_id) {
                Some(frame) => vec![Patch::InsertFrame { frame: frame.clone() }],
                None => vec![],
            },

            Patch::InsertComponent { component } => {
                if doc.components.contains_key(&component.id) {
                    vec![]
                } else {
                    vec![Patch::RemoveComponent {
                        component_id: component.id.clone(),
                    }]
                }
            }

            Patch::RemoveComponent { component_id } => match doc.component(component_id) {
                Some(component) => vec![Patch::InsertComponent {
                    component: component.clone(),
                }],
                None => vec![],
            },
        }
    }
}

/// Pure batch application: returns a new document, leaving `doc` untouched.
pub fn apply_all(doc: &Document, patches: &[Patch]) -> Document {
    let mut next = doc.clone();
    apply_in_place(&mut next, patches);
    next
}

/// Applies every patch in order.
pub fn apply_in_place(doc: &mut Document, patches: &[Patch]) {
    for patch in patches {
        patch.apply(doc);
    }
}

/// Computes the inverse of a whole batch against `doc`.
///
/// Each patch is inverted against the state the preceding patches leave
/// behind, and the result is reversed so it can be replayed in order.
pub fn invert_batch(doc: &Document, patches: &[Patch]) -> Vec<Patch> {
    let mut scratch = doc.clone();
    let mut parents = ParentIndex::build(&scratch);
    let mut inverses: Vec<Vec<Patch>> = Vec::with_capacity(patches.len());

    for patch in patches {
        inverses.push(patch.inverse(&scratch, &parents));
        patch.apply(&mut scratch);
        if patch.is_structural() {
            parents = ParentIndex::build(&scratch);
        }
    }

    inverses.into_iter().rev().flatten().collect()
}

fn is_writable_path(path: &str) -> bool {
    match pointer_segments(path) {
        Some(segments) => !IMMUTABLE_ROOTS.contains(&segments[0].as_str()),
        None => false,
    }
}

/// Builds the write that restores `path` in `json`: the old value when it
/// existed, otherwise a clear of the first key the forward write will create.
fn restore_prop(json: &Value, path: &str, make: impl FnOnce(String, Value) -> Patch) -> Patch {
    match first_missing_pointer(json, path) {
        None => make(path.to_string(), json.pointer(path).cloned().unwrap_or(Value::Null)),
        Some(missing) => make(missing, Value::Null),
    }
}

fn apply_set_prop(doc: &mut Document, node_id: &NodeId, path: &str, value: &Value) {
    if !is_writable_path(path) {
        warn!(%node_id, path, "SetProp: path is not writable, skipping");
        return;
    }
    let Some(node) = doc.nodes.get_mut(node_id) else {
        debug!(%node_id, "SetProp: node not found, skipping");
        return;
    };
    let Ok(mut json) = serde_json::to_value(&*node) else {
        return;
    };
    if !set_pointer(&mut json, path, value.clone()) {
        debug!(%node_id, path, "SetProp: path does not resolve, skipping");
        return;
    }
    match serde_json::from_value::<Node>(json) {
        Ok(updated) => *node = updated,
        Err(err) => warn!(%node_id, path, error = %err, "SetProp: value does not fit node shape, skipping"),
    }
}

fn apply_set_frame_prop(doc: &mut Document, frame_id: &FrameId, path: &str, value: &Value) {
    if !is_writable_path(path) {
        warn!(%frame_id, path, "SetFrameProp: path is not writable, skipping");
        return;
    }
    let Some(frame) = doc.frames.get_mut(frame_id) else {
        debug!(%frame_id, "SetFrameProp: frame not found, skipping");
        return;
    };
    let Ok(mut json) = serde_json::to_value(&*frame) else {
        return;
    };
    if !set_pointer(&mut json, path, value.clone()) {
        return;
    }
    match serde_json::from_value::<Frame>(json) {
        Ok(updated) => *frame = updated,
        Err(err) => warn!(%frame_id, path, error = %err, "SetFrameProp: value does not fit frame shape, skipping"),
    }
}

fn attach_is_effective(doc: &Document, parent_id: &NodeId, child_id: &NodeId) -> bool {
    match doc.node(parent_id) {
        Some(parent) => doc.nodes.contains_key(child_id) && !parent.children.contains(child_id),
        None => false,
    }
}

fn apply_attach(doc: &mut Document, parent_id: &NodeId, child_id: &NodeId, index: i64) {
    if !attach_is_effective(doc, parent_id, child_id) {
        debug!(%parent_id, %child_id, "AttachChild: unresolved or already attached, skipping");
        return;
    }
    if let Some(parent) = doc.nodes.get_mut(parent_id) {
        let position = resolve_index(index, parent.children.len());
        parent.children.insert(position, child_id.clone());
    }
}

fn apply_detach(doc: &mut Document, parent_id: &NodeId, child_id: &NodeId) {
    match doc.nodes.get_mut(parent_id) {
        Some(parent) => match parent.children.iter().position(|c| c == child_id) {
            Some(position) => {
                parent.children.remove(position);
            }
            None => debug!(%parent_id, %child_id, "DetachChild: not a child, skipping"),
        },
        None => debug!(%parent_id, "DetachChild: parent not found, skipping"),
    }
}

fn child_position(doc: &Document, parent_id: &NodeId, child_id: &NodeId) -> Option<usize> {
    doc.node(parent_id)?.children.iter().position(|c| c == child_id)
}

/// Negative appends; anything past the end clamps to the end
pub fn resolve_index(index: i64, len: usize) -> usize {
    if index < 0 {
        len
    } else {
        (index as usize).min(len)
    }
}
