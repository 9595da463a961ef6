/// Tests for slot filling: assignments, default content, and empty slots
use crate::*;
use designer_common::{ExpandedId, FrameId, NodeId};
use designer_document::{ComponentDef, Document, DocumentStore, Frame, Node, NodeKind, Patch};
use serde_json::json;

fn eid(id: &str) -> ExpandedId {
    ExpandedId::new(id)
}

/// Component `card` with a header and a `body` slot; a page with one instance.
fn card_doc(slot: Node) -> Document {
    Document::new()
        .with_node(
            Node::container("card::root")
                .with_source("card", "root")
                .with_children(["card::header", "card::body", "card::footer"]),
        )
        .with_node(Node::text("card::header", "Title").with_source("card", "header"))
        .with_node(slot.with_source("card", "body"))
        .with_node(Node::text("card::footer", "Footer").with_source("card", "footer"))
        .with_component(ComponentDef::new("card", "card::root"))
        .with_node(Node::container("page").with_children(["c1"]))
        .with_node(Node::instance("c1", "card"))
        .with_frame(Frame::new("f1", "page"))
}

fn assign(doc: Document, instance: &str, slot: &str, content: &str) -> Document {
    let mut node = doc.node(&NodeId::new(instance)).cloned().unwrap();
    if let NodeKind::Instance(props) = &mut node.kind {
        props.slot_assignments.insert(slot.to_string(), NodeId::new(content));
    }
    doc.with_node(node)
}

#[test]
fn test_empty_slot_renders_non_editable_placeholder() {
    let doc = card_doc(Node::slot("card::body", "body"));
    let scene = expand_frame(&doc, &FrameId::new("f1")).unwrap();

    assert_eq!(
        scene.children(&eid("c1/root")),
        &[eid("c1/header"), eid("c1/body"), eid("c1/footer")]
    );

    let slot = scene.get(&eid("c1/body")).unwrap();
    assert!(matches!(&slot.placeholder, Some(Placeholder::EmptySlot { slot_name }) if slot_name == "body"));
    assert_eq!(slot.patch_target, None);
    assert_eq!(slot.origin.kind, OriginKind::SlotContent);
    assert!(!scene.is_editable(&eid("c1/body")));
}

#[test]
fn test_default_content_is_present_but_not_editable() {
    let doc = card_doc(Node::slot("card::body", "body").with_children(["card::hint"]))
        .with_node(Node::text("card::hint", "Drop content here").with_source("card", "hint"));
    let scene = expand_frame(&doc, &FrameId::new("f1")).unwrap();

    // Default children replace the slot node itself
    assert_eq!(
        scene.children(&eid("c1/root")),
        &[eid("c1/header"), eid("c1/hint"), eid("c1/footer")]
    );
    assert!(scene.get(&eid("c1/body")).is_none());

    let hint = scene.get(&eid("c1/hint")).unwrap();
    assert_eq!(hint.origin.kind, OriginKind::SlotContent);
    assert_eq!(hint.patch_target, None);
    assert!(!hint.is_placeholder());
}

#[test]
fn test_default_content_takes_overrides() {
    let doc = card_doc(Node::slot("card::body", "body").with_children(["card::hint"]))
        .with_node(Node::text("card::hint", "Drop content here").with_source("card", "hint"));
    let mut instance = doc.node(&NodeId::new("c1")).cloned().unwrap();
    if let NodeKind::Instance(props) = &mut instance.kind {
        props.overrides.insert("hint".to_string(), json!({ "text": "Nothing yet" }));
    }
    let scene = expand_frame(&doc.with_node(instance), &FrameId::new("f1")).unwrap();

    let NodeKind::Text(props) = &scene.get(&eid("c1/hint")).unwrap().node.kind else {
        panic!("Expected text node");
    };
    assert_eq!(props.text, "Nothing yet");
}

#[test]
fn test_assigned_content_is_editable() {
    let doc = card_doc(Node::slot("card::body", "body").with_children(["card::hint"]))
        .with_node(Node::text("card::hint", "Drop content here").with_source("card", "hint"))
        .with_node(Node::container("body-content").with_owner("c1").with_children(["body-text"]))
        .with_node(Node::text("body-text", "Hello").with_owner("c1"));
    let doc = assign(doc, "c1", "body", "body-content");
    let scene = expand_frame(&doc, &FrameId::new("f1")).unwrap();

    // Assignment wins over default content
    assert_eq!(
        scene.children(&eid("c1/root")),
        &[eid("c1/header"), eid("c1/body-content"), eid("c1/footer")]
    );
    assert!(scene.get(&eid("c1/hint")).is_none());

    let content = scene.get(&eid("c1/body-content")).unwrap();
    assert_eq!(content.patch_target, Some(NodeId::new("body-content")));
    assert_eq!(content.origin.kind, OriginKind::SlotContent);
    assert_eq!(content.origin.component_id.as_ref().map(|c| c.as_str()), Some("card"));
    assert_eq!(scene.children(&eid("c1/body-content")), &[eid("c1/body-text")]);
    assert_eq!(scene.patch_target(&eid("c1/body-text")), Some(&NodeId::new("body-text")));
}

#[test]
fn test_dangling_assignment_falls_back_to_placeholder() {
    let doc = assign(card_doc(Node::slot("card::body", "body")), "c1", "body", "gone");
    let scene = expand_frame(&doc, &FrameId::new("f1")).unwrap();

    assert!(matches!(
        scene.get(&eid("c1/body")).unwrap().placeholder,
        Some(Placeholder::EmptySlot { .. })
    ));
}

#[test]
fn test_assigning_content_replaces_placeholder_in_place() {
    let mut store = DocumentStore::new(card_doc(Node::slot("card::body", "body")));
    let frame = FrameId::new("f1");

    let before = expand_frame(store.document(), &frame).unwrap();
    let position = before
        .children(&eid("c1/root"))
        .iter()
        .position(|id| id == &eid("c1/body"))
        .unwrap();
    assert!(before.get(&eid("c1/body")).unwrap().is_placeholder());

    store
        .apply_patches(
            &[
                Patch::InsertNode {
                    node: Node::text("greeting", "Hi").with_owner("c1"),
                },
                Patch::SetProp {
                    node_id: NodeId::new("c1"),
                    path: "/props/slotAssignments/body".to_string(),
                    value: json!("greeting"),
                },
            ],
            None,
            Some("Fill slot"),
        )
        .unwrap();

    let after = expand_frame(store.document(), &frame).unwrap();
    let children = after.children(&eid("c1/root"));
    assert_eq!(children[position], eid("c1/greeting"));
    assert_eq!(children.len(), before.children(&eid("c1/root")).len());
    assert!(after.get(&eid("c1/body")).is_none());
    assert!(after.is_editable(&eid("c1/greeting")));

    // Undo brings the placeholder back
    assert!(store.undo());
    let undone = expand_frame(store.document(), &frame).unwrap();
    assert_eq!(undone, before);
}

#[test]
fn test_slot_content_containing_outer_component_is_not_a_cycle() {
    // Content assigned into a card may itself contain a card: it belongs to
    // the page, not to the card's template.
    let doc = card_doc(Node::slot("card::body", "body"))
        .with_node(Node::instance("inner-card", "card").with_owner("c1"));
    let doc = assign(doc, "c1", "body", "inner-card");
    let scene = expand_frame(&doc, &FrameId::new("f1")).unwrap();

    let inner = scene.get(&eid("c1/inner-card")).unwrap();
    assert!(!inner.is_placeholder());
    assert_eq!(scene.children(&eid("c1/inner-card")), &[eid("c1/inner-card/root")]);
    assert!(matches!(
        scene.get(&eid("c1/inner-card/body")).unwrap().placeholder,
        Some(Placeholder::EmptySlot { .. })
    ));
}

#[test]
fn test_shared_slot_content_maps_to_several_expanded_ids() {
    let doc = card_doc(Node::slot("card::body", "body"))
        .with_node(Node::container("page").with_children(["c1", "c2"]))
        .with_node(Node::instance("c2", "card"))
        .with_node(Node::text("shared", "Shared"));
    let doc = assign(assign(doc, "c1", "body", "shared"), "c2", "body", "shared");
    let scene = expand_frame(&doc, &FrameId::new("f1")).unwrap();
    let index = LookupIndex::build(&scene);

    assert_eq!(
        index.expanded_ids_for(&NodeId::new("shared")),
        &[eid("c1/shared"), eid("c2/shared")]
    );
    assert_eq!(index.patch_target(&eid("c2/shared")), Some(&NodeId::new("shared")));
    assert_eq!(index.parent_of(&eid("c2/shared")), Some(&eid("c2/root")));
}

/// `card` wraps a `button` whose `icon` slot the card template fills itself.
fn nested_slot_doc() -> Document {
    let doc = Document::new()
        .with_node(
            Node::container("button::root")
                .with_source("button", "root")
                .with_children(["button::icon"]),
        )
        .with_node(Node::slot("button::icon", "icon").with_source("button", "icon"))
        .with_component(ComponentDef::new("button", "button::root"))
        .with_node(
            Node::container("card::root")
                .with_source("card", "root")
                .with_children(["card::btn"]),
        )
        .with_node(Node::instance("card::btn", "button").with_source("card", "btn"))
        .with_node(Node::text("card::star", "*").with_source("card", "star"))
        .with_component(ComponentDef::new("card", "card::root"))
        .with_node(Node::container("page").with_children(["c1", "c2"]))
        .with_node(Node::instance("c1", "card"))
        .with_node(Node::instance("c2", "card"))
        .with_frame(Frame::new("f1", "page"));
    assign(doc, "card::btn", "icon", "card::star")
}

#[test]
fn test_slot_filled_inside_template_stays_read_only() {
    let mut c1 = Node::instance("c1", "card");
    if let NodeKind::Instance(props) = &mut c1.kind {
        props.overrides.insert("star".to_string(), json!({ "text": "+" }));
    }
    let doc = nested_slot_doc().with_node(c1);
    let scene = expand_frame(&doc, &FrameId::new("f1")).unwrap();

    assert_eq!(scene.children(&eid("c1/btn/root")), &[eid("c1/btn/star")]);
    assert_eq!(scene.children(&eid("c2/btn/root")), &[eid("c2/btn/star")]);
    assert!(scene.get(&eid("c1/btn/card::star")).is_none());

    for id in ["c1/btn/star", "c2/btn/star"] {
        let star = scene.get(&eid(id)).unwrap();
        assert_eq!(star.patch_target, None);
        assert_eq!(star.origin.kind, OriginKind::ComponentChild);
        assert_eq!(star.origin.component_id.as_ref().map(|c| c.as_str()), Some("card"));
    }

    // The outer instance's overrides still reach the content
    let text = |id: &str| match &scene.get(&eid(id)).unwrap().node.kind {
        NodeKind::Text(props) => props.text.clone(),
        other => panic!("Expected text node, got {:?}", other),
    };
    assert_eq!(text("c1/btn/star"), "+");
    assert_eq!(text("c2/btn/star"), "*");

    let index = LookupIndex::build(&scene);
    assert!(index.expanded_ids_for(&NodeId::new("card::star")).is_empty());
}

#[test]
fn test_assigned_content_is_tagged_with_owning_instance() {
    let doc = card_doc(Node::slot("card::body", "body"))
        .with_node(Node::container("page").with_children(["c1", "c2"]))
        .with_node(Node::instance("c2", "card"))
        .with_node(Node::text("shared", "Shared"));
    let doc = assign(assign(doc, "c1", "body", "shared"), "c2", "body", "shared");
    let scene = expand_frame(&doc, &FrameId::new("f1")).unwrap();

    assert_eq!(
        scene.get(&eid("c1/shared")).unwrap().node.owner_instance_id,
        Some(NodeId::new("c1"))
    );
    assert_eq!(
        scene.get(&eid("c2/shared")).unwrap().node.owner_instance_id,
        Some(NodeId::new("c2"))
    );
    // The document node itself is untouched
    assert_eq!(doc.node(&NodeId::new("shared")).unwrap().owner_instance_id, None);
}

#[test]
fn test_template_slot_content_tagged_with_template_instance() {
    let scene = expand_frame(&nested_slot_doc(), &FrameId::new("f1")).unwrap();
    assert_eq!(
        scene.get(&eid("c1/btn/star")).unwrap().node.owner_instance_id,
        Some(NodeId::new("card::btn"))
    );
}
