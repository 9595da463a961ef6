//! # Scene Expander
//!
//! Turns one frame of the canonical document into an [`ExpandedScene`]: a
//! flat map of materialized nodes keyed by expanded id, with component
//! instances inlined.
//!
//! ## Identity
//!
//! A node reached directly from the frame keeps its structural id. A node
//! reached through instances is prefixed by the chain of enclosing instance
//! ids (`card/button/label`), so one template used twice yields two distinct
//! subtrees.
//!
//! ## Editability
//!
//! | Reached as                 | `patch_target` | origin            |
//! |----------------------------|----------------|-------------------|
//! | frame node                 | itself         | `FrameNode`       |
//! | template node              | none           | `ComponentChild`  |
//! | assigned slot content      | itself         | `SlotContent`     |
//! | slot content of a template | none           | `ComponentChild`  |
//! | slot default content       | none           | `SlotContent`     |
//! | empty slot                 | none           | `SlotContent`     |
//! | missing component / cycle  | kept           | `ErrorPlaceholder`|
//!
//! ## Recursion Protection
//!
//! The ids of components currently being expanded are kept on a stack. An
//! instance whose component is already on the stack becomes a placeholder.
//! Only the active stack counts, so the same component used twice as
//! siblings is fine. Slot content is expanded against the stack as it was
//! outside the owning instance, since it belongs to the outer context.
//!
//! ## Overrides
//!
//! For a template node, the innermost instance is consulted by namespaced id
//! (`componentId::localId`) and then by template-local id; enclosing
//! instances are consulted by namespaced id only. Matches are deep-merged
//! into `props`, innermost first, so outer instances win.
//!
//! ## Determinism
//!
//! Expansion is a pure function of the document: every map is ordered and
//! nothing depends on time or hashing.

use crate::scene::{ExpandedNode, ExpandedScene, NodeOrigin, OriginKind, Placeholder};
use designer_common::{deep_merge, ComponentId, ExpandedId, FrameId, NodeId};
use designer_document::{Document, InstanceProps, Node, SlotProps};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

/// Expands `frame_id`. `None` only when the frame does not exist.
#[instrument(skip_all, fields(frame_id = %frame_id))]
pub fn expand_frame(doc: &Document, frame_id: &FrameId) -> Option<ExpandedScene> {
    let frame = doc.frame(frame_id)?;
    let mut expander = Expander::new(doc);

    // Editing a component: its own instances inside it are cycles.
    if let Some(component_id) = &frame.component_id {
        expander.component_stack.push(component_id.clone());
    }

    let root = match expander.expand(&frame.root_node_id, &Scope::frame()).into_iter().next() {
        Some(root) => root,
        None => {
            warn!(root = %frame.root_node_id, "frame root does not resolve");
            expander.insert_missing_root(&frame.root_node_id)
        }
    };

    info!(nodes = expander.nodes.len(), "expanded frame");
    Some(ExpandedScene {
        frame_id: frame_id.clone(),
        root,
        nodes: expander.nodes,
        patch_targets: expander.patch_targets,
    })
}

/// Template expansion context for the innermost instance
#[derive(Clone)]
struct TemplateCtx<'a> {
    component_id: ComponentId,

    /// Enclosing instances' props, outermost first
    instances: Vec<&'a InstanceProps>,

    /// Component-stack depth outside the innermost instance
    outer_depth: usize,

    /// Structural id of the innermost instance
    instance_id: NodeId,

    /// Template the innermost instance itself belongs to; `None` when the
    /// instance is reached from the frame or from assigned slot content
    enclosing: Option<Box<TemplateCtx<'a>>>,
}

#[derive(Clone)]
enum Mode<'a> {
    Frame,
    Template(TemplateCtx<'a>),
    SlotDefault(TemplateCtx<'a>),
    SlotContent { component_id: ComponentId },
}

#[derive(Clone)]
struct Scope<'a> {
    chain: Vec<NodeId>,
    mode: Mode<'a>,
}

impl<'a> Scope<'a> {
    fn frame() -> Self {
        Self {
            chain: Vec::new(),
            mode: Mode::Frame,
        }
    }

    fn template(&self) -> Option<&TemplateCtx<'a>> {
        match &self.mode {
            Mode::Template(ctx) | Mode::SlotDefault(ctx) => Some(ctx),
            _ => None,
        }
    }

    /// The id segment this node contributes to expanded ids
    fn local_id(&self, node: &Node) -> String {
        match self.mode {
            Mode::Template(_) | Mode::SlotDefault(_) => template_local_id(node),
            Mode::Frame | Mode::SlotContent { .. } => node.id.to_string(),
        }
    }

    fn origin(&self, node: &Node, overridden: bool) -> (Option<NodeId>, NodeOrigin) {
        let (patch_target, kind, component_id) = match &self.mode {
            Mode::Frame => (
                Some(node.id.clone()),
                OriginKind::FrameNode,
                node.source.as_ref().map(|s| s.component_id.clone()),
            ),
            Mode::Template(ctx) => (None, OriginKind::ComponentChild, Some(ctx.component_id.clone())),
            Mode::SlotDefault(ctx) => (None, OriginKind::SlotContent, Some(ctx.component_id.clone())),
            Mode::SlotContent { component_id } => {
                (Some(node.id.clone()), OriginKind::SlotContent, Some(component_id.clone()))
            }
        };

        (
            patch_target,
            NodeOrigin {
                kind,
                component_id,
                instance_path: self.chain.clone(),
                overridden,
            },
        )
    }
}

fn template_local_id(node: &Node) -> String {
    if let Some(source) = &node.source {
        return source.template_local_id.clone();
    }
    match node.id.split_namespace() {
        Some((_, local)) => local.to_string(),
        None => node.id.to_string(),
    }
}

struct Expander<'a> {
    doc: &'a Document,
    nodes: BTreeMap<ExpandedId, ExpandedNode>,
    patch_targets: BTreeMap<ExpandedId, Option<NodeId>>,
    component_stack: Vec<ComponentId>,
}

impl<'a> Expander<'a> {
    fn new(doc: &'a Document) -> Self {
        Self {
            doc,
            nodes: BTreeMap::new(),
            patch_targets: BTreeMap::new(),
            component_stack: Vec::new(),
        }
    }

    fn insert(&mut self, node: ExpandedNode) {
        self.patch_targets.insert(node.id.clone(), node.patch_target.clone());
        self.nodes.insert(node.id.clone(), node);
    }

    /// Expands `id` in `scope`. Returns the expanded ids that take its place
    /// in the parent's child list: usually one, several for a slot's default
    /// content, none for an unresolved child.
    fn expand(&mut self, id: &NodeId, scope: &Scope<'a>) -> Vec<ExpandedId> {
        let doc = self.doc;
        let Some(node) = doc.node(id) else {
            warn!(node_id = %id, "child does not resolve, skipping");
            return vec![];
        };

        if let (Some(slot), Some(ctx)) = (node.as_slot(), scope.template()) {
            return self.expand_slot(node, slot, ctx, scope);
        }

        let local_id = scope.local_id(node);
        let expanded_id = ExpandedId::from_chain(&scope.chain, &local_id);
        if self.nodes.contains_key(&expanded_id) {
            warn!(%expanded_id, "node reached twice (cycle or shared child), skipping");
            return vec![];
        }

        let (materialized, overridden) = self.materialize(node, scope);
        let (patch_target, origin) = scope.origin(node, overridden);
        self.insert(ExpandedNode {
            id: expanded_id.clone(),
            node: materialized,
            children: Vec::new(),
            patch_target,
            origin,
            placeholder: None,
        });

        let children = match node.as_instance() {
            Some(props) => match self.expand_instance(node, props, &local_id, scope) {
                Ok(children) => children,
                Err(placeholder) => {
                    if let Some(entry) = self.nodes.get_mut(&expanded_id) {
                        entry.origin.kind = OriginKind::ErrorPlaceholder;
                        entry.placeholder = Some(placeholder);
                    }
                    Vec::new()
                }
            },
            None => {
                let mut children = Vec::with_capacity(node.children.len());
                for child in &node.children {
                    children.extend(self.expand(child, scope));
                }
                children
            }
        };

        if let Some(entry) = self.nodes.get_mut(&expanded_id) {
            entry.children = children;
        }
        vec![expanded_id]
    }

    fn expand_instance(
        &mut self,
        instance: &'a Node,
        props: &'a InstanceProps,
        local_id: &str,
        scope: &Scope<'a>,
    ) -> Result<Vec<ExpandedId>, Placeholder> {
        let doc = self.doc;
        let Some(component) = doc.component(&props.component_id) else {
            warn!(instance = %instance.id, component = %props.component_id, "component not found");
            return Err(Placeholder::MissingComponent {
                component_id: props.component_id.clone(),
            });
        };

        if self.component_stack.contains(&component.id) {
            let mut stack = self.component_stack.clone();
            stack.push(component.id.clone());
            warn!(instance = %instance.id, stack = ?stack, "circular component instantiation");
            return Err(Placeholder::ComponentCycle {
                component_id: component.id.clone(),
                stack,
            });
        }

        let mut chain = scope.chain.clone();
        chain.push(NodeId::new(local_id));

        let mut instances = scope.template().map(|ctx| ctx.instances.clone()).unwrap_or_default();
        instances.push(props);

        let ctx = TemplateCtx {
            component_id: component.id.clone(),
            instances,
            outer_depth: self.component_stack.len(),
            instance_id: instance.id.clone(),
            enclosing: scope.template().cloned().map(Box::new),
        };

        debug!(instance = %instance.id, component = %component.id, depth = chain.len(), "expanding instance");
        self.component_stack.push(component.id.clone());
        let children = self.expand(
            &component.root_node_id,
            &Scope {
                chain,
                mode: Mode::Template(ctx),
            },
        );
        self.component_stack.pop();

        Ok(children)
    }

    fn expand_slot(&mut self, slot_node: &'a Node, slot: &SlotProps, ctx: &TemplateCtx<'a>, scope: &Scope<'a>) -> Vec<ExpandedId> {
        let doc = self.doc;
        let assignment = ctx
            .instances
            .last()
            .and_then(|props| props.slot_assignments.get(&slot.name))
            .filter(|root| doc.nodes.contains_key(*root));

        if let Some(root) = assignment {
            debug!(slot = %slot.name, content = %root, "slot filled by assignment");
            // Content assigned by a template instance is part of that
            // template and only editable through the component itself.
            let mode = match &ctx.enclosing {
                Some(enclosing) => Mode::Template((**enclosing).clone()),
                None => Mode::SlotContent {
                    component_id: ctx.component_id.clone(),
                },
            };
            let content_scope = Scope {
                chain: scope.chain.clone(),
                mode,
            };
            let inner = self.component_stack.split_off(ctx.outer_depth.min(self.component_stack.len()));
            let expanded = self.expand(root, &content_scope);
            self.component_stack.extend(inner);

            for id in &expanded {
                if let Some(entry) = self.nodes.get_mut(id) {
                    entry.node.owner_instance_id = Some(ctx.instance_id.clone());
                }
            }
            return expanded;
        }

        if !slot_node.children.is_empty() {
            debug!(slot = %slot.name, "slot uses default content");
            let default_scope = Scope {
                chain: scope.chain.clone(),
                mode: Mode::SlotDefault(ctx.clone()),
            };
            let mut expanded = Vec::new();
            for child in &slot_node.children {
                expanded.extend(self.expand(child, &default_scope));
            }
            return expanded;
        }

        let expanded_id = ExpandedId::from_chain(&scope.chain, &template_local_id(slot_node));
        if self.nodes.contains_key(&expanded_id) {
            return vec![];
        }

        let mut node = slot_node.clone();
        node.children.clear();
        self.insert(ExpandedNode {
            id: expanded_id.clone(),
            node,
            children: Vec::new(),
            patch_target: None,
            origin: NodeOrigin {
                kind: OriginKind::SlotContent,
                component_id: Some(ctx.component_id.clone()),
                instance_path: scope.chain.clone(),
                overridden: false,
            },
            placeholder: Some(Placeholder::EmptySlot {
                slot_name: slot.name.clone(),
            }),
        });
        vec![expanded_id]
    }

    /// Copies `node` without its children, merging any overrides that
    /// target it. Returns whether an override was applied.
    fn materialize(&self, node: &Node, scope: &Scope<'a>) -> (Node, bool) {
        let mut copy = node.clone();
        copy.children.clear();

        let Some(ctx) = scope.template() else {
            return (copy, false);
        };
        let overrides = overrides_for(node, ctx);
        if overrides.is_empty() {
            return (copy, false);
        }

        let Ok(mut json) = serde_json::to_value(&copy) else {
            return (copy, false);
        };
        if let Value::Object(fields) = &mut json {
            let props = fields
                .entry("props")
                .or_insert_with(|| Value::Object(Map::new()));
            for overlay in &overrides {
                deep_merge(props, overlay);
            }
        }

        match serde_json::from_value::<Node>(json) {
            Ok(merged) => (merged, true),
            Err(err) => {
                warn!(node_id = %node.id, error = %err, "override does not fit node props, ignoring");
                (copy, false)
            }
        }
    }

    fn insert_missing_root(&mut self, root_id: &NodeId) -> ExpandedId {
        let expanded_id = ExpandedId::from_structural(root_id);
        let mut node = Node::container(root_id.clone());
        node.name = format!("Missing node {}", root_id);
        self.insert(ExpandedNode {
            id: expanded_id.clone(),
            node,
            children: Vec::new(),
            patch_target: None,
            origin: NodeOrigin {
                kind: OriginKind::ErrorPlaceholder,
                component_id: None,
                instance_path: Vec::new(),
                overridden: false,
            },
            placeholder: Some(Placeholder::MissingNode {
                node_id: root_id.clone(),
            }),
        });
        expanded_id
    }
}

/// Override values targeting `node`, in merge order (innermost first)
fn overrides_for<'v>(node: &Node, ctx: &TemplateCtx<'v>) -> Vec<&'v Value> {
    let namespaced = node.id.as_str();
    let local = template_local_id(node);
    let innermost = ctx.instances.len().saturating_sub(1);

    let mut found = Vec::new();
    for (depth, props) in ctx.instances.iter().copied().enumerate().rev() {
        if let Some(value) = props.overrides.get(namespaced) {
            found.push(value);
        } else if depth == innermost {
            if let Some(value) = props.overrides.get(&local) {
                found.push(value);
            }
        }
    }
    found
}
