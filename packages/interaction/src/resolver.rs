//! # Drop Resolver
//!
//! Turns a cursor position during a drag into a [`DropPreview`]: which
//! container would receive the dragged nodes, at which index, where the
//! insertion indicator goes, and how siblings shift to make room.
//!
//! ## Pipeline
//!
//! ```text
//! common origin ─▶ stickiness ─▶ hit test + climb ─▶ target checks
//!       │              └───────────────┬──────────────────┘
//!       ▼                              ▼
//!  MixedOrigins            filtered children (one list)
//!                                      │
//!              raw index ─▶ hysteresis ─▶ indicator ─▶ intent ─▶ reflow
//! ```
//!
//! Every step may short-circuit to an [`InvalidDrop`]. Nothing here mutates
//! anything; the only state is the [`HysteresisState`] value threaded
//! through by the caller.
//!
//! ## Coordinates
//!
//! The cursor, the origin content rect, and the indicator are world
//! coordinates. Bounds from the geometry provider are frame-local; the
//! cursor is shifted by the frame's world position before it is compared
//! with them.
//!
//! ## The filtered list
//!
//! The target's expanded children minus dragged nodes and children without a
//! patch target. The insertion index, the indicator, and the reflow are all
//! computed against this one list, and committing detaches the dragged nodes
//! first so the document matches it exactly.

use crate::config::DropConfig;
use crate::hysteresis::HysteresisState;
use crate::preview::{DraggedNode, DropIntent, DropPreview, DropQuery, DropResolution, InvalidDrop, ReflowOffset};
use crate::providers::{FramePositionProvider, GeometryProvider, HitTestProvider};
use designer_common::{Axis, ExpandedId, FrameId, NodeId, Point, Rect};
use designer_document::{AutoLayout, Document};
use designer_scene::{ExpandedScene, LookupIndex};
use std::collections::HashSet;
use tracing::trace;

/// Read-only collaborators for one resolution
#[derive(Clone, Copy)]
pub struct DropContext<'a> {
    pub document: &'a Document,
    pub scene: &'a ExpandedScene,
    pub lookup: &'a LookupIndex,
    pub geometry: &'a dyn GeometryProvider,
    pub frames: &'a dyn FramePositionProvider,
    pub hits: &'a dyn HitTestProvider,
}

/// Resolves one pointer update. On an invalid result the hysteresis state is
/// returned unchanged.
pub fn compute(
    query: &DropQuery,
    state: &HysteresisState,
    ctx: &DropContext<'_>,
    config: &DropConfig,
) -> (DropResolution, HysteresisState) {
    match resolve(query, state, ctx, config) {
        Ok((preview, next)) => {
            trace!(
                target = %preview.target,
                index = preview.insertion_index,
                intent = ?preview.intent,
                "drop resolved"
            );
            (DropResolution::Valid(preview), next)
        }
        Err(reason) => {
            trace!(%reason, "drop invalid");
            (DropResolution::Invalid(reason), state.clone())
        }
    }
}

/// World-space content box of the dragged nodes' common parent, for
/// stickiness. `None` when there is no common parent or it has no bounds.
pub fn origin_content_rect(ctx: &DropContext<'_>, frame_id: &FrameId, dragged: &[DraggedNode]) -> Option<Rect> {
    let parent = common_origin(dragged).ok()??;
    let selection = Selection::new(dragged, ctx.lookup);
    let expanded = origin_expanded(ctx.lookup, &selection, &parent)?;

    let bounds = ctx.geometry.bounds(frame_id, &expanded)?;
    let content = match layout_of(ctx.scene, &expanded) {
        Some(layout) => content_box(bounds, &layout),
        None => bounds,
    };
    let origin = ctx.frames.world_position(frame_id);
    Some(content.translate(origin.x, origin.y))
}

fn resolve(
    query: &DropQuery,
    state: &HysteresisState,
    ctx: &DropContext<'_>,
    config: &DropConfig,
) -> Result<(DropPreview, HysteresisState), InvalidDrop> {
    if query.dragged.is_empty() {
        return Err(InvalidDrop::EmptySelection);
    }
    let origin_parent = common_origin(&query.dragged)?;
    let selection = Selection::new(&query.dragged, ctx.lookup);
    let slack = config.to_canvas(config.hysteresis_px, query.zoom);

    let frame_origin = ctx.frames.world_position(&query.frame_id);
    let local_cursor = Point::new(query.cursor.x - frame_origin.x, query.cursor.y - frame_origin.y);

    let sticky = origin_parent
        .as_ref()
        .and_then(|parent| sticky_target(query, ctx, &selection, parent, slack));
    let target = match sticky {
        Some(target) => {
            trace!(%target, "origin parent is sticky");
            target
        }
        None => {
            let hit = ctx
                .hits
                .hit_test(&query.frame_id, query.cursor, &selection.expanded)
                .ok_or(InvalidDrop::NoEligibleTarget)?;
            ctx.lookup
                .find_ancestor(&hit, |id| is_eligible(ctx, &selection, id))
                .ok_or(InvalidDrop::NoEligibleTarget)?
        }
    };

    let target_node = ctx
        .lookup
        .patch_target(&target)
        .cloned()
        .ok_or_else(|| InvalidDrop::NoPatchTarget { target: target.clone() })?;
    if ctx.document.node(&target_node).is_none() {
        return Err(InvalidDrop::MissingTargetNode { node_id: target_node });
    }
    if let Some(node_id) = selection.contains_or_is(ctx.lookup, &target, &target_node) {
        return Err(InvalidDrop::CircularDrop { node_id });
    }

    let layout = layout_of(ctx.scene, &target).ok_or(InvalidDrop::NoEligibleTarget)?;
    let axis = layout.direction.axis();

    let full = ctx.scene.children(&target);
    let siblings = filtered_children(ctx, &query.frame_id, &selection, full);

    let main = local_cursor.along(axis);
    let raw = siblings
        .iter()
        .position(|sibling| sibling.bounds.is_some_and(|bounds| main < bounds.mid(axis)))
        .unwrap_or(siblings.len());
    let (index, next) = state.settle(&target, raw, siblings.len(), query.cursor, axis, slack);
    let display_index = siblings.get(index).map_or(full.len(), |sibling| sibling.display);

    let bounds = ctx
        .geometry
        .bounds(&query.frame_id, &target)
        .ok_or_else(|| InvalidDrop::DegenerateContentBox { target: target.clone() })?;
    let content = content_box(bounds, &layout);
    if content.is_empty() {
        return Err(InvalidDrop::DegenerateContentBox { target });
    }
    let indicator = indicator_rect(&siblings, index, axis, layout.gap, content, config)
        .translate(frame_origin.x, frame_origin.y);

    let intent = match &origin_parent {
        None => DropIntent::None,
        Some(parent) if parent == &target_node => DropIntent::Reorder,
        Some(_) => DropIntent::Reparent,
    };

    let reflow = if intent == DropIntent::Reorder {
        let shift = bundle_extent(ctx, &query.frame_id, &query.dragged, &target, axis) + layout.gap * query.dragged.len() as f64;
        let (dx, dy) = match axis {
            Axis::Horizontal => (shift, 0.0),
            Axis::Vertical => (0.0, shift),
        };
        siblings[index..]
            .iter()
            .map(|sibling| ReflowOffset {
                id: sibling.id.clone(),
                dx,
                dy,
            })
            .collect()
    } else {
        Vec::new()
    };

    Ok((
        DropPreview {
            frame_id: query.frame_id.clone(),
            target,
            target_node,
            axis,
            insertion_index: index,
            display_index,
            indicator,
            intent,
            reflow,
        },
        next,
    ))
}

/// The shared original parent, `None` if no dragged node had one
fn common_origin(dragged: &[DraggedNode]) -> Result<Option<NodeId>, InvalidDrop> {
    let mut parents = dragged.iter().map(|d| &d.original_parent);
    let Some(first) = parents.next() else {
        return Ok(None);
    };
    if parents.any(|parent| parent != first) {
        return Err(InvalidDrop::MixedOrigins);
    }
    Ok(first.clone())
}

/// Dragged nodes in both id domains
struct Selection {
    nodes: HashSet<NodeId>,
    /// Every expanded occurrence, paired with its structural node
    occurrences: Vec<(ExpandedId, NodeId)>,
    expanded: Vec<ExpandedId>,
}

impl Selection {
    fn new(dragged: &[DraggedNode], lookup: &LookupIndex) -> Self {
        let mut occurrences = Vec::new();
        for node in dragged {
            for id in lookup.expanded_ids_for(&node.node_id) {
                occurrences.push((id.clone(), node.node_id.clone()));
            }
        }
        Self {
            nodes: dragged.iter().map(|d| d.node_id.clone()).collect(),
            expanded: occurrences.iter().map(|(id, _)| id.clone()).collect(),
            occurrences,
        }
    }

    fn is_dragged(&self, id: &ExpandedId, node: Option<&NodeId>) -> bool {
        self.expanded.contains(id) || node.is_some_and(|node| self.nodes.contains(node))
    }

    /// A dragged node that is, or contains, the target
    fn contains_or_is(&self, lookup: &LookupIndex, target: &ExpandedId, target_node: &NodeId) -> Option<NodeId> {
        if self.nodes.contains(target_node) {
            return Some(target_node.clone());
        }
        self.occurrences
            .iter()
            .find(|(id, _)| lookup.is_ancestor_or_self(id, target))
            .map(|(_, node)| node.clone())
    }
}

/// Editable, auto-layout, and not being dragged. Instances and placeholders
/// never accept children: their rendered children do not come from their
/// own child list.
fn is_eligible(ctx: &DropContext<'_>, selection: &Selection, id: &ExpandedId) -> bool {
    let Some(node) = ctx.lookup.patch_target(id) else {
        return false;
    };
    if selection.is_dragged(id, Some(node)) {
        return false;
    }
    ctx.scene.get(id).is_some_and(|expanded| {
        expanded.node.has_auto_layout() && expanded.node.as_instance().is_none() && !expanded.is_placeholder()
    })
}

/// The expanded occurrence of the origin parent that actually holds a dragged
/// node, falling back to its first occurrence
fn origin_expanded(lookup: &LookupIndex, selection: &Selection, parent: &NodeId) -> Option<ExpandedId> {
    let candidates = lookup.expanded_ids_for(parent);
    candidates
        .iter()
        .find(|candidate| selection.expanded.iter().any(|id| lookup.parent_of(id) == Some(*candidate)))
        .or_else(|| candidates.first())
        .cloned()
}

fn sticky_target(
    query: &DropQuery,
    ctx: &DropContext<'_>,
    selection: &Selection,
    parent: &NodeId,
    slack: f64,
) -> Option<ExpandedId> {
    let rect = query.origin_content_rect?;
    if !rect.inflate(slack).contains(query.cursor) {
        return None;
    }
    let expanded = origin_expanded(ctx.lookup, selection, parent)?;
    is_eligible(ctx, selection, &expanded).then_some(expanded)
}

fn layout_of(scene: &ExpandedScene, id: &ExpandedId) -> Option<AutoLayout> {
    scene.get(id).and_then(|node| node.node.layout.auto_layout.clone())
}

fn content_box(bounds: Rect, layout: &AutoLayout) -> Rect {
    let p = &layout.padding;
    bounds.inset(p.top, p.right, p.bottom, p.left)
}

struct Sibling {
    id: ExpandedId,
    /// Position in the full expanded child list
    display: usize,
    bounds: Option<Rect>,
}

fn filtered_children(ctx: &DropContext<'_>, frame_id: &FrameId, selection: &Selection, full: &[ExpandedId]) -> Vec<Sibling> {
    full.iter()
        .enumerate()
        .filter_map(|(display, id)| {
            let node = ctx.lookup.patch_target(id)?;
            if selection.is_dragged(id, Some(node)) {
                return None;
            }
            Some(Sibling {
                id: id.clone(),
                display,
                bounds: ctx.geometry.bounds(frame_id, id),
            })
        })
        .collect()
}

/// Frame-local indicator: a bar across the content box at the gap before
/// `index`, clipped to the box and grown back to the minimum visible size.
fn indicator_rect(siblings: &[Sibling], index: usize, axis: Axis, gap: f64, content: Rect, config: &DropConfig) -> Rect {
    let before = siblings[..index].iter().rev().find_map(|s| s.bounds);
    let after = siblings[index..].iter().find_map(|s| s.bounds);
    let position = match (before, after) {
        (Some(before), Some(after)) => (before.end(axis) + after.start(axis)) / 2.0,
        (Some(before), None) => before.end(axis) + gap / 2.0,
        (None, Some(after)) => after.start(axis) - gap / 2.0,
        (None, None) => content.start(axis),
    };

    let half = config.indicator_thickness / 2.0;
    let cross = axis.cross();
    let bar = Rect::from_spans(
        axis,
        (position - half, position + half),
        (content.start(cross), content.end(cross)),
    );
    let clipped = bar.intersect(&content);

    Rect::from_spans(
        axis,
        at_least((clipped.start(axis), clipped.end(axis)), config.indicator_thickness),
        at_least((clipped.start(cross), clipped.end(cross)), config.min_indicator_length),
    )
}

/// Grows a span symmetrically about its center to `min`
fn at_least(span: (f64, f64), min: f64) -> (f64, f64) {
    if span.1 - span.0 >= min {
        return span;
    }
    let center = (span.0 + span.1) / 2.0;
    (center - min / 2.0, center + min / 2.0)
}

/// Summed main-axis extent of the dragged nodes
fn bundle_extent(ctx: &DropContext<'_>, frame_id: &FrameId, dragged: &[DraggedNode], target: &ExpandedId, axis: Axis) -> f64 {
    dragged
        .iter()
        .filter_map(|node| {
            let ids = ctx.lookup.expanded_ids_for(&node.node_id);
            let in_target = ids.iter().find(|id| ctx.lookup.parent_of(id) == Some(target));
            in_target
                .into_iter()
                .chain(ids.iter())
                .find_map(|id| ctx.geometry.bounds(frame_id, id))
        })
        .map(|bounds| bounds.extent(axis))
        .sum()
}
