/// Tests for instance expansion: identity, overrides, recursion, and anomalies
use crate::*;
use designer_common::{ExpandedId, FrameId, NodeId};
use designer_document::{ComponentDef, Document, Frame, Node, NodeKind};
use serde_json::json;

fn eid(id: &str) -> ExpandedId {
    ExpandedId::new(id)
}

fn text_of(scene: &ExpandedScene, id: &str) -> String {
    match &scene.get(&eid(id)).expect("node expanded").node.kind {
        NodeKind::Text(props) => props.text.clone(),
        other => panic!("Expected text node at {}, got {:?}", id, other),
    }
}

/// Component `button` (root container + label) and a page with two instances.
fn button_doc() -> Document {
    Document::new()
        .with_node(Node::container("button::root").with_source("button", "root").with_children(["button::label"]))
        .with_node(Node::text("button::label", "Click").with_source("button", "label"))
        .with_component(ComponentDef::new("button", "button::root"))
        .with_node(Node::container("page").with_children(["b1", "b2"]))
        .with_node(Node::instance("b1", "button"))
        .with_node(Node::instance("b2", "button"))
        .with_frame(Frame::new("f1", "page"))
}

fn with_overrides(mut node: Node, overrides: serde_json::Value) -> Node {
    if let NodeKind::Instance(props) = &mut node.kind {
        props.overrides = serde_json::from_value(overrides).unwrap();
    }
    node
}

#[test]
fn test_missing_frame_yields_none() {
    assert!(expand_frame(&button_doc(), &FrameId::new("nope")).is_none());
}

#[test]
fn test_frame_nodes_keep_structural_ids() {
    let scene = expand_frame(&button_doc(), &FrameId::new("f1")).unwrap();

    assert_eq!(scene.root(), &eid("page"));
    assert_eq!(scene.children(&eid("page")), &[eid("b1"), eid("b2")]);
    assert_eq!(scene.patch_target(&eid("page")), Some(&NodeId::new("page")));
    assert_eq!(scene.patch_target(&eid("b1")), Some(&NodeId::new("b1")));
    assert_eq!(scene.get(&eid("b1")).unwrap().origin.kind, OriginKind::FrameNode);
}

#[test]
fn test_sibling_instances_expand_to_distinct_subtrees() {
    let scene = expand_frame(&button_doc(), &FrameId::new("f1")).unwrap();

    assert_eq!(scene.children(&eid("b1")), &[eid("b1/root")]);
    assert_eq!(scene.children(&eid("b2")), &[eid("b2/root")]);
    assert_eq!(scene.children(&eid("b1/root")), &[eid("b1/label")]);
    assert_eq!(scene.children(&eid("b2/root")), &[eid("b2/label")]);
    assert_eq!(scene.len(), 7);

    // Reusing a component as siblings is not a cycle
    assert!(scene.nodes.values().all(|node| !node.is_placeholder()));
}

#[test]
fn test_template_nodes_are_not_editable() {
    let scene = expand_frame(&button_doc(), &FrameId::new("f1")).unwrap();
    let label = scene.get(&eid("b1/label")).unwrap();

    assert!(!scene.is_editable(&eid("b1/label")));
    assert_eq!(label.origin.kind, OriginKind::ComponentChild);
    assert_eq!(label.origin.component_id.as_ref().map(|c| c.as_str()), Some("button"));
    assert_eq!(label.origin.instance_path, vec![NodeId::new("b1")]);
    assert!(!label.origin.overridden);
}

#[test]
fn test_local_override_applies_to_one_instance() {
    let doc = button_doc().with_node(with_overrides(
        Node::instance("b1", "button"),
        json!({ "label": { "text": "Buy now" } }),
    ));
    let scene = expand_frame(&doc, &FrameId::new("f1")).unwrap();

    assert_eq!(text_of(&scene, "b1/label"), "Buy now");
    assert_eq!(text_of(&scene, "b2/label"), "Click");
    assert!(scene.get(&eid("b1/label")).unwrap().origin.overridden);
    assert!(!scene.get(&eid("b2/label")).unwrap().origin.overridden);
}

#[test]
fn test_namespaced_override_wins_over_local_key() {
    let doc = button_doc().with_node(with_overrides(
        Node::instance("b1", "button"),
        json!({
            "button::label": { "text": "Namespaced" },
            "label": { "text": "Local" }
        }),
    ));
    let scene = expand_frame(&doc, &FrameId::new("f1")).unwrap();

    assert_eq!(text_of(&scene, "b1/label"), "Namespaced");
}

#[test]
fn test_override_deep_merges_into_props() {
    let doc = button_doc().with_node(with_overrides(
        Node::instance("b1", "button"),
        json!({ "label": { "fontSize": 20.0 } }),
    ));
    let scene = expand_frame(&doc, &FrameId::new("f1")).unwrap();

    let NodeKind::Text(props) = &scene.get(&eid("b1/label")).unwrap().node.kind else {
        panic!("Expected text node");
    };
    assert_eq!(props.text, "Click");
    assert_eq!(props.font_size, 20.0);
}

#[test]
fn test_ill_typed_override_is_ignored() {
    let doc = button_doc().with_node(with_overrides(
        Node::instance("b1", "button"),
        json!({ "label": { "fontSize": "huge" } }),
    ));
    let scene = expand_frame(&doc, &FrameId::new("f1")).unwrap();

    assert_eq!(text_of(&scene, "b1/label"), "Click");
    assert!(!scene.get(&eid("b1/label")).unwrap().origin.overridden);
}

#[test]
fn test_nested_instances_chain_ids_and_outer_override_wins() {
    let doc = button_doc()
        .with_node(Node::container("card::root").with_source("card", "root").with_children(["card::cta"]))
        .with_node(
            with_overrides(
                Node::instance("card::cta", "button"),
                json!({ "label": { "text": "Inner" } }),
            )
            .with_source("card", "cta"),
        )
        .with_component(ComponentDef::new("card", "card::root"))
        .with_node(Node::container("page").with_children(["c1"]))
        .with_node(with_overrides(
            Node::instance("c1", "card"),
            json!({ "button::label": { "text": "Outer" } }),
        ));
    let scene = expand_frame(&doc, &FrameId::new("f1")).unwrap();

    assert_eq!(scene.children(&eid("c1/root")), &[eid("c1/cta")]);
    assert_eq!(scene.children(&eid("c1/cta")), &[eid("c1/cta/root")]);
    assert_eq!(text_of(&scene, "c1/cta/label"), "Outer");

    let label = scene.get(&eid("c1/cta/label")).unwrap();
    assert_eq!(label.origin.instance_path, vec![NodeId::new("c1"), NodeId::new("cta")]);
}

#[test]
fn test_missing_component_becomes_placeholder() {
    let doc = button_doc().with_node(Node::instance("b2", "ghost"));
    let scene = expand_frame(&doc, &FrameId::new("f1")).unwrap();

    let b2 = scene.get(&eid("b2")).unwrap();
    assert_eq!(b2.origin.kind, OriginKind::ErrorPlaceholder);
    assert!(matches!(
        &b2.placeholder,
        Some(Placeholder::MissingComponent { component_id }) if component_id.as_str() == "ghost"
    ));
    assert!(b2.children.is_empty());

    // Still in the tree and still selectable as a frame node
    assert_eq!(scene.children(&eid("page")), &[eid("b1"), eid("b2")]);
    assert!(scene.is_editable(&eid("b2")));

    // The healthy sibling is untouched
    assert_eq!(text_of(&scene, "b1/label"), "Click");
}

#[test]
fn test_direct_recursion_terminates_with_placeholder() {
    let doc = Document::new()
        .with_node(Node::container("loop::root").with_source("loop", "root").with_children(["loop::again"]))
        .with_node(Node::instance("loop::again", "loop").with_source("loop", "again"))
        .with_component(ComponentDef::new("loop", "loop::root"))
        .with_node(Node::container("page").with_children(["l1"]))
        .with_node(Node::instance("l1", "loop"))
        .with_frame(Frame::new("f1", "page"));
    let scene = expand_frame(&doc, &FrameId::new("f1")).unwrap();

    let again = scene.get(&eid("l1/again")).unwrap();
    assert_eq!(again.origin.kind, OriginKind::ErrorPlaceholder);
    match &again.placeholder {
        Some(Placeholder::ComponentCycle { component_id, stack }) => {
            assert_eq!(component_id.as_str(), "loop");
            let names: Vec<&str> = stack.iter().map(|c| c.as_str()).collect();
            assert_eq!(names, vec!["loop", "loop"]);
        }
        other => panic!("Expected ComponentCycle, got {:?}", other),
    }
    assert_eq!(scene.len(), 4);
}

#[test]
fn test_indirect_recursion_terminates_with_placeholder() {
    let doc = Document::new()
        .with_node(Node::container("a::root").with_source("a", "root").with_children(["a::b"]))
        .with_node(Node::instance("a::b", "b").with_source("a", "b"))
        .with_component(ComponentDef::new("a", "a::root"))
        .with_node(Node::container("b::root").with_source("b", "root").with_children(["b::a"]))
        .with_node(Node::instance("b::a", "a").with_source("b", "a"))
        .with_component(ComponentDef::new("b", "b::root"))
        .with_node(Node::container("page").with_children(["x"]))
        .with_node(Node::instance("x", "a"))
        .with_frame(Frame::new("f1", "page"));
    let scene = expand_frame(&doc, &FrameId::new("f1")).unwrap();

    let inner = scene.get(&eid("x/b/a")).unwrap();
    match &inner.placeholder {
        Some(Placeholder::ComponentCycle { stack, .. }) => {
            let names: Vec<&str> = stack.iter().map(|c| c.as_str()).collect();
            assert_eq!(names, vec!["a", "b", "a"]);
        }
        other => panic!("Expected ComponentCycle, got {:?}", other),
    }
}

#[test]
fn test_component_frame_treats_self_instance_as_cycle() {
    let doc = Document::new()
        .with_node(Node::container("loop::root").with_source("loop", "root").with_children(["loop::again"]))
        .with_node(Node::instance("loop::again", "loop").with_source("loop", "again"))
        .with_component(ComponentDef::new("loop", "loop::root"))
        .with_frame(Frame::new("loop-frame", "loop::root").editing("loop"));
    let scene = expand_frame(&doc, &FrameId::new("loop-frame")).unwrap();

    // Editing the component itself: its nodes are frame nodes, hence editable
    assert_eq!(scene.patch_target(&eid("loop::root")), Some(&NodeId::new("loop::root")));
    assert!(matches!(
        scene.get(&eid("loop::again")).unwrap().placeholder,
        Some(Placeholder::ComponentCycle { .. })
    ));
}

#[test]
fn test_missing_child_is_skipped() {
    let doc = button_doc().with_node(Node::container("page").with_children(["b1", "gone", "b2"]));
    let scene = expand_frame(&doc, &FrameId::new("f1")).unwrap();

    assert_eq!(scene.children(&eid("page")), &[eid("b1"), eid("b2")]);
}

#[test]
fn test_missing_frame_root_becomes_placeholder() {
    let doc = Document::new().with_frame(Frame::new("f1", "gone"));
    let scene = expand_frame(&doc, &FrameId::new("f1")).unwrap();

    let root = scene.get(scene.root()).unwrap();
    assert!(matches!(&root.placeholder, Some(Placeholder::MissingNode { node_id }) if node_id.as_str() == "gone"));
    assert!(!scene.is_editable(scene.root()));
    assert_eq!(scene.len(), 1);
}

#[test]
fn test_walk_is_preorder_with_depth() {
    let scene = expand_frame(&button_doc(), &FrameId::new("f1")).unwrap();
    let order: Vec<(usize, &str)> = scene.walk().into_iter().map(|(depth, node)| (depth, node.id.as_str())).collect();

    assert_eq!(
        order,
        vec![
            (0, "page"),
            (1, "b1"),
            (2, "b1/root"),
            (3, "b1/label"),
            (1, "b2"),
            (2, "b2/root"),
            (3, "b2/label"),
        ]
    );
}

#[test]
fn test_lookup_index_maps_both_directions() {
    let scene = expand_frame(&button_doc(), &FrameId::new("f1")).unwrap();
    let index = LookupIndex::build(&scene);

    assert_eq!(index.root(), Some(&eid("page")));
    assert_eq!(index.patch_target(&eid("b1")), Some(&NodeId::new("b1")));
    assert_eq!(index.patch_target(&eid("b1/label")), None);
    assert!(index.contains(&eid("b1/label")));
    assert_eq!(index.expanded_ids_for(&NodeId::new("b2")), &[eid("b2")]);
    assert!(index.expanded_ids_for(&NodeId::new("button::label")).is_empty());

    assert_eq!(index.parent_of(&eid("b1/label")), Some(&eid("b1/root")));
    assert_eq!(index.ancestors(&eid("b1/label")), vec![eid("b1/root"), eid("b1"), eid("page")]);
    assert!(index.is_ancestor_or_self(&eid("b1"), &eid("b1/label")));
    assert!(!index.is_ancestor_or_self(&eid("b2"), &eid("b1/label")));

    // Nearest editable node at or above a template node
    let editable = index.find_ancestor(&eid("b1/label"), |id| index.patch_target(id).is_some());
    assert_eq!(editable, Some(eid("b1")));
}

#[test]
fn test_component_frame_makes_template_nodes_editable() {
    let doc = button_doc().with_frame(Frame::new("button-frame", "button::root").editing("button"));
    let scene = expand_frame(&doc, &FrameId::new("button-frame")).unwrap();
    let index = LookupIndex::build(&scene);

    assert_eq!(index.expanded_ids_for(&NodeId::new("button::label")), &[eid("button::label")]);
    assert_eq!(scene.get(&eid("button::label")).unwrap().origin.kind, OriginKind::FrameNode);
}
