//! # Patch Validator
//!
//! Dry-runs a candidate batch against a disposable copy of the document and
//! reports structural violations before anything reaches the store.
//!
//! Two passes:
//!
//! 1. **Per-operation**: each patch is checked against the scratch document
//!    as the preceding patches left it. A patch that fails is reported with
//!    its index and kind, and is not applied to the scratch copy, so one bad
//!    operation does not cascade into a pile of follow-on findings.
//! 2. **Whole-document**: the resulting scratch document is checked for
//!    dangling children, multi-parent nodes, cycles (three-color DFS),
//!    dangling frame/component roots, and instances of missing components
//!    (a warning only).

use crate::diagnostic::{IssueCode, ValidationIssue, ValidationReport};
use crate::model::Document;
use crate::parent_index::ParentIndex;
use crate::paths::{check_frame_path, check_node_path};
use crate::patch::Patch;
use designer_common::NodeId;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument};

/// Validates `patches` as a batch applied to `doc`. `doc` is not modified.
#[instrument(skip_all, fields(batch_len = patches.len()))]
pub fn validate_patches(doc: &Document, patches: &[Patch]) -> ValidationReport {
    let mut report = ValidationReport::new();
    let mut scratch = doc.clone();
    let mut parents = ParentIndex::build(&scratch);

    for (index, patch) in patches.iter().enumerate() {
        let before = report.issues.len();
        check_patch(&scratch, &parents, index, patch, &mut report);

        if report.issues[before..].iter().any(ValidationIssue::is_error) {
            debug!(index, kind = patch.kind(), "patch rejected, not applied to scratch copy");
            continue;
        }

        patch.apply(&mut scratch);
        if patch.is_structural() {
            parents = ParentIndex::build(&scratch);
        }
    }

    check_document_into(&scratch, &mut report);
    debug!(errors = report.error_count(), warnings = report.warning_count(), "validation finished");
    report
}

/// Whole-document invariant check, without any patches.
pub fn check_document(doc: &Document) -> ValidationReport {
    let mut report = ValidationReport::new();
    check_document_into(doc, &mut report);
    report
}

fn check_patch(doc: &Document, parents: &ParentIndex, index: usize, patch: &Patch, report: &mut ValidationReport) {
    let mut fail = |issue: ValidationIssue| report.push(issue.at_op(index, patch));

    match patch {
        Patch::SetProp { node_id, path, .. } => match doc.node(node_id) {
            Some(node) => {
                if let Err(reason) = check_node_path(node.node_type(), path) {
                    fail(ValidationIssue::error(IssueCode::InvalidPath, reason).with_target(node_id));
                }
            }
            None => fail(missing_node(node_id)),
        },

        Patch::SetFrameProp { frame_id, path, .. } => {
            if doc.frame(frame_id).is_none() {
                fail(
                    ValidationIssue::error(IssueCode::MissingFrame, format!("frame `{}` does not exist", frame_id))
                        .with_target(frame_id),
                );
            } else if let Err(reason) = check_frame_path(path) {
                fail(ValidationIssue::error(IssueCode::InvalidPath, reason).with_target(frame_id));
            }
        }

        Patch::InsertNode { node } => {
            if doc.nodes.contains_key(&node.id) {
                fail(
                    ValidationIssue::error(IssueCode::DuplicateId, format!("node `{}` already exists", node.id))
                        .with_target(&node.id)
                        .with_suggestion("Use a fresh id, or ReplaceNode to change the existing node"),
                );
            }
        }

        Patch::DeleteNode { node_id } => {
            if !doc.nodes.contains_key(node_id) {
                fail(missing_node(node_id));
            } else if let Some(parent) = parents.parent_of(node_id) {
                fail(
                    ValidationIssue::error(
                        IssueCode::DeleteAttached,
                        format!("node `{}` is still a child of `{}`", node_id, parent),
                    )
                    .with_target(node_id)
                    .with_suggestion(format!(
                        "Emit DetachChild {{ parentId: \"{}\", childId: \"{}\" }} before deleting",
                        parent, node_id
                    )),
                );
            }
        }

        Patch::AttachChild { parent_id, child_id, .. } => {
            let Some(parent) = doc.node(parent_id) else {
                fail(missing_parent(parent_id));
                return;
            };
            if !doc.nodes.contains_key(child_id) {
                fail(
                    ValidationIssue::error(IssueCode::MissingChild, format!("child `{}` does not exist", child_id))
                        .with_target(child_id)
                        .with_suggestion("Insert the node before attaching it"),
                );
            } else if parent.children.contains(child_id) {
                fail(
                    ValidationIssue::error(
                        IssueCode::DuplicateAttach,
                        format!("`{}` is already a child of `{}`", child_id, parent_id),
                    )
                    .with_target(child_id)
                    .with_suggestion("Drop this AttachChild, or use MoveNode to reorder"),
                );
            } else if let Some(current) = parents.parent_of(child_id) {
                fail(
                    ValidationIssue::error(
                        IssueCode::MultiParent,
                        format!("`{}` already has parent `{}`", child_id, current),
                    )
                    .with_target(child_id)
                    .with_suggestion(format!("Detach `{}` from `{}` first, or use MoveNode", child_id, current)),
                );
            } else if parents.is_ancestor_or_self(child_id, parent_id) {
                fail(cycle(child_id, parent_id));
            }
        }

        Patch::DetachChild { parent_id, child_id } => match doc.node(parent_id) {
            Some(parent) if !parent.children.contains(child_id) => fail(
                ValidationIssue::error(
                    IssueCode::NotAttached,
                    format!("`{}` is not a child of `{}`", child_id, parent_id),
                )
                .with_target(child_id),
            ),
            Some(_) => {}
            None => fail(missing_parent(parent_id)),
        },

        Patch::MoveNode { node_id, new_parent_id, .. } => {
            if !doc.nodes.contains_key(node_id) {
                fail(missing_node(node_id));
            } else if !doc.nodes.contains_key(new_parent_id) {
                fail(missing_parent(new_parent_id));
            } else if parents.is_ancestor_or_self(node_id, new_parent_id) {
                fail(cycle(node_id, new_parent_id));
            }
        }

        Patch::ReplaceNode { node } => {
            if !doc.nodes.contains_key(&node.id) {
                fail(missing_node(&node.id).with_suggestion("Use InsertNode for new nodes"));
            }
        }

        Patch::InsertFrame { frame } => {
            if doc.frames.contains_key(&frame.id) {
                fail(
                    ValidationIssue::error(IssueCode::DuplicateId, format!("frame `{}` already exists", frame.id))
                        .with_target(&frame.id),
                );
            }
        }

        Patch::RemoveFrame { frame_id } => {
            if doc.frame(frame_id).is_none() {
                fail(
                    ValidationIssue::error(IssueCode::MissingFrame, format!("frame `{}` does not exist", frame_id))
                        .with_target(frame_id),
                );
            }
        }

        Patch::InsertComponent { component } => {
            if doc.components.contains_key(&component.id) {
                fail(
                    ValidationIssue::error(
                        IssueCode::DuplicateId,
                        format!("component `{}` already exists", component.id),
                    )
                    .with_target(&component.id),
                );
            }
        }

        Patch::RemoveComponent { component_id } => {
            if doc.component(component_id).is_none() {
                fail(
                    ValidationIssue::error(
                        IssueCode::MissingComponent,
                        format!("component `{}` does not exist", component_id),
                    )
                    .with_target(component_id),
                );
            }
        }
    }
}

fn missing_node(id: &NodeId) -> ValidationIssue {
    ValidationIssue::error(IssueCode::MissingNode, format!("node `{}` does not exist", id)).with_target(id)
}

fn missing_parent(id: &NodeId) -> ValidationIssue {
    ValidationIssue::error(IssueCode::MissingParent, format!("parent `{}` does not exist", id)).with_target(id)
}

fn cycle(node_id: &NodeId, parent_id: &NodeId) -> ValidationIssue {
    ValidationIssue::error(
        IssueCode::Cycle,
        format!("placing `{}` under `{}` would make it its own ancestor", node_id, parent_id),
    )
    .with_target(node_id)
    .with_suggestion("Choose a parent outside the moved subtree")
}

fn check_document_into(doc: &Document, report: &mut ValidationReport) {
    // Dangling children, duplicate entries, and multiple parents
    let mut owners: BTreeMap<&NodeId, Vec<&NodeId>> = BTreeMap::new();
    for node in doc.nodes.values() {
        for (position, child) in node.children.iter().enumerate() {
            if !doc.nodes.contains_key(child) {
                report.push(
                    ValidationIssue::error(
                        IssueCode::MissingChild,
                        format!("`{}` lists missing child `{}`", node.id, child),
                    )
                    .with_target(child),
                );
            }
            if node.children[..position].contains(child) {
                report.push(
                    ValidationIssue::error(
                        IssueCode::DuplicateAttach,
                        format!("`{}` lists child `{}` more than once", node.id, child),
                    )
                    .with_target(child),
                );
                continue;
            }
            owners.entry(child).or_default().push(&node.id);
        }
    }
    for (child, parents) in &owners {
        if parents.len() > 1 {
            let names: Vec<String> = parents.iter().map(|p| format!("`{}`", p)).collect();
            report.push(
                ValidationIssue::error(
                    IssueCode::MultiParent,
                    format!("`{}` has {} parents: {}", child, parents.len(), names.join(", ")),
                )
                .with_target(*child)
                .with_suggestion("Detach the node from all but one parent"),
            );
        }
    }

    for id in find_cycles(doc) {
        report.push(
            ValidationIssue::error(IssueCode::Cycle, format!("`{}` is reachable from itself", id)).with_target(&id),
        );
    }

    for frame in doc.frames.values() {
        if !doc.nodes.contains_key(&frame.root_node_id) {
            report.push(
                ValidationIssue::error(
                    IssueCode::DanglingFrameRoot,
                    format!("frame `{}` points at missing root `{}`", frame.id, frame.root_node_id),
                )
                .with_target(&frame.id),
            );
        }
    }

    for component in doc.components.values() {
        if !doc.nodes.contains_key(&component.root_node_id) {
            report.push(
                ValidationIssue::error(
                    IssueCode::DanglingComponentRoot,
                    format!("component `{}` points at missing root `{}`", component.id, component.root_node_id),
                )
                .with_target(&component.id),
            );
        }
    }

    for node in doc.nodes.values() {
        if let Some(props) = node.as_instance() {
            if doc.component(&props.component_id).is_none() {
                report.push(
                    ValidationIssue::warning(
                        IssueCode::MissingComponentReference,
                        format!("instance `{}` references missing component `{}`", node.id, props.component_id),
                    )
                    .with_target(&node.id),
                );
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Three-color DFS over child edges. Returns the node closing each back edge.
fn find_cycles(doc: &Document) -> Vec<NodeId> {
    let mut color: HashMap<&NodeId, Color> = doc.nodes.keys().map(|id| (id, Color::White)).collect();
    let mut closing = Vec::new();

    for start in doc.nodes.keys() {
        if color.get(start) != Some(&Color::White) {
            continue;
        }

        // (node, index of the next child to visit)
        let mut stack: Vec<(&NodeId, usize)> = vec![(start, 0)];
        color.insert(start, Color::Gray);

        while let Some((id, next)) = stack.pop() {
            let children = doc.node(id).map(|node| node.children.as_slice()).unwrap_or_default();

            match children.get(next) {
                Some(child) => {
                    stack.push((id, next + 1));
                    match color.get(child) {
                        Some(Color::White) => {
                            color.insert(child, Color::Gray);
                            stack.push((child, 0));
                        }
                        Some(Color::Gray) => closing.push(child.clone()),
                        // Finished, or dangling (reported separately)
                        _ => {}
                    }
                }
                None => {
                    color.insert(id, Color::Black);
                }
            }
        }
    }

    closing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComponentDef, Frame, Node};
    use designer_common::FrameId;
    use serde_json::json;

    fn doc() -> Document {
        Document::new()
            .with_node(Node::container("root").with_children(["row"]))
            .with_node(Node::container("row").with_children(["a", "b"]))
            .with_node(Node::text("a", "A"))
            .with_node(Node::text("b", "B"))
            .with_frame(Frame::new("f1", "root"))
    }

    fn codes(report: &ValidationReport) -> Vec<IssueCode> {
        report.issues.iter().map(|issue| issue.code).collect()
    }

    #[test]
    fn test_clean_document_and_batch() {
        assert!(check_document(&doc()).issues.is_empty());

        let report = validate_patches(
            &doc(),
            &[
                Patch::InsertNode {
                    node: Node::text("c", "C"),
                },
                Patch::AttachChild {
                    parent_id: NodeId::new("row"),
                    child_id: NodeId::new("c"),
                    index: -1,
                },
                Patch::SetProp {
                    node_id: NodeId::new("c"),
                    path: "/props/text".to_string(),
                    value: json!("Hello"),
                },
            ],
        );
        assert!(report.issues.is_empty(), "{:?}", report.issues);
    }

    #[test]
    fn test_reattach_without_detach_is_multi_parent() {
        let report = validate_patches(
            &doc(),
            &[Patch::AttachChild {
                parent_id: NodeId::new("root"),
                child_id: NodeId::new("a"),
                index: 0,
            }],
        );
        assert_eq!(codes(&report), vec![IssueCode::MultiParent]);
        assert_eq!(report.issues[0].op_index, Some(0));
        assert_eq!(report.issues[0].op_kind.as_deref(), Some("AttachChild"));
    }

    #[test]
    fn test_duplicate_attach() {
        let report = validate_patches(
            &doc(),
            &[Patch::AttachChild {
                parent_id: NodeId::new("row"),
                child_id: NodeId::new("a"),
                index: 0,
            }],
        );
        assert_eq!(codes(&report), vec![IssueCode::DuplicateAttach]);
    }

    #[test]
    fn test_move_into_own_subtree_is_cycle() {
        let report = validate_patches(
            &doc(),
            &[Patch::MoveNode {
                node_id: NodeId::new("root"),
                new_parent_id: NodeId::new("a"),
                index: 0,
            }],
        );
        assert_eq!(codes(&report), vec![IssueCode::Cycle]);
    }

    #[test]
    fn test_delete_attached_node() {
        let report = validate_patches(
            &doc(),
            &[Patch::DeleteNode {
                node_id: NodeId::new("a"),
            }],
        );
        assert_eq!(codes(&report), vec![IssueCode::DeleteAttached]);
        assert!(report.issues[0].suggestion.as_deref().unwrap().contains("DetachChild"));
    }

    #[test]
    fn test_later_ops_see_earlier_ops() {
        let report = validate_patches(
            &doc(),
            &[
                Patch::DetachChild {
                    parent_id: NodeId::new("row"),
                    child_id: NodeId::new("a"),
                },
                Patch::DeleteNode {
                    node_id: NodeId::new("a"),
                },
                Patch::SetProp {
                    node_id: NodeId::new("a"),
                    path: "/props/text".to_string(),
                    value: json!("gone"),
                },
            ],
        );
        assert_eq!(codes(&report), vec![IssueCode::MissingNode]);
        assert_eq!(report.issues[0].op_index, Some(2));
    }

    #[test]
    fn test_invalid_paths() {
        let report = validate_patches(
            &doc(),
            &[
                Patch::SetProp {
                    node_id: NodeId::new("row"),
                    path: "/props/text".to_string(),
                    value: json!("x"),
                },
                Patch::SetFrameProp {
                    frame_id: FrameId::new("f1"),
                    path: "/bogus".to_string(),
                    value: json!(1),
                },
            ],
        );
        assert_eq!(codes(&report), vec![IssueCode::InvalidPath, IssueCode::InvalidPath]);
    }

    #[test]
    fn test_document_level_findings() {
        let broken = Document::new()
            .with_node(Node::container("x").with_children(["y", "ghost"]))
            .with_node(Node::container("y").with_children(["x"]))
            .with_node(Node::instance("i", "missing"))
            .with_frame(Frame::new("f", "nowhere"))
            .with_component(ComponentDef::new("c", "c::root"));

        let report = check_document(&broken);
        for code in [
            IssueCode::MissingChild,
            IssueCode::Cycle,
            IssueCode::DanglingFrameRoot,
            IssueCode::DanglingComponentRoot,
            IssueCode::MissingComponentReference,
        ] {
            assert!(report.has_code(code), "expected {}", code);
        }
        assert_eq!(report.warning_count(), 1);
    }
}
