//! # Drag Session
//!
//! Lifecycle of one drag gesture:
//!
//! ```text
//! Idle ──begin──▶ Active ──update*──▶ Active ──commit──▶ Committed
//!                    │                                 └─(no valid preview)─▶ Cancelled
//!                    └──cancel──▶ Cancelled
//! ```
//!
//! The frame is captured at `begin` and never re-resolved, so the gesture
//! cannot drift into a neighbouring frame. Nothing touches the document until
//! the caller applies the patches of the committed plan.

use crate::commit::DropCommitPlan;
use crate::config::DropConfig;
use crate::hysteresis::HysteresisState;
use crate::preview::{DraggedNode, DropQuery, DropResolution};
use crate::resolver::{compute, origin_content_rect, DropContext};
use designer_common::{FrameId, NodeId, Point, Rect};
use designer_document::ParentIndex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Misuse of the gesture lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DragError {
    #[error("a drag needs at least one node")]
    EmptySelection,

    #[error("node `{0}` does not exist")]
    UnknownNode(NodeId),

    #[error("a drag is already in progress")]
    AlreadyActive,

    #[error("no drag is in progress")]
    NotActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DragPhase {
    Idle,
    Active,
    Committed,
    Cancelled,
}

/// State owned by the active gesture controller
#[derive(Debug, Clone)]
pub struct DragSession {
    phase: DragPhase,
    config: DropConfig,
    frame_id: Option<FrameId>,
    dragged: Vec<DraggedNode>,
    origin_content_rect: Option<Rect>,
    hysteresis: HysteresisState,
    resolution: Option<DropResolution>,
}

impl Default for DragSession {
    fn default() -> Self {
        Self::new(DropConfig::default())
    }
}

impl DragSession {
    pub fn new(config: DropConfig) -> Self {
        Self {
            phase: DragPhase::Idle,
            config,
            frame_id: None,
            dragged: Vec::new(),
            origin_content_rect: None,
            hysteresis: HysteresisState::new(),
            resolution: None,
        }
    }

    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    pub fn frame_id(&self) -> Option<&FrameId> {
        self.frame_id.as_ref()
    }

    pub fn dragged(&self) -> &[DraggedNode] {
        &self.dragged
    }

    /// Latest resolution, if `update` has run
    pub fn resolution(&self) -> Option<&DropResolution> {
        self.resolution.as_ref()
    }

    /// Starts a gesture over `nodes` in `frame_id`, recording each node's
    /// current parent. A finished session may be reused.
    pub fn begin(
        &mut self,
        frame_id: FrameId,
        nodes: &[NodeId],
        parents: &ParentIndex,
        ctx: &DropContext<'_>,
    ) -> Result<(), DragError> {
        if self.phase == DragPhase::Active {
            return Err(DragError::AlreadyActive);
        }
        if nodes.is_empty() {
            return Err(DragError::EmptySelection);
        }
        if let Some(missing) = nodes.iter().find(|id| ctx.document.node(id).is_none()) {
            return Err(DragError::UnknownNode(missing.clone()));
        }

        let dragged: Vec<DraggedNode> = nodes
            .iter()
            .map(|id| DraggedNode::new(id.clone(), parents.parent_of(id).cloned()))
            .collect();

        self.origin_content_rect = origin_content_rect(ctx, &frame_id, &dragged);
        self.dragged = dragged;
        self.frame_id = Some(frame_id);
        self.hysteresis = HysteresisState::new();
        self.resolution = None;
        self.phase = DragPhase::Active;

        debug!(frame = ?self.frame_id, nodes = self.dragged.len(), "drag started");
        Ok(())
    }

    /// Recomputes the preview for a new cursor position
    pub fn update(&mut self, cursor: Point, zoom: f64, ctx: &DropContext<'_>) -> Result<&DropResolution, DragError> {
        if self.phase != DragPhase::Active {
            return Err(DragError::NotActive);
        }
        let Some(frame_id) = self.frame_id.clone() else {
            return Err(DragError::NotActive);
        };

        let mut query = DropQuery::new(frame_id, cursor, self.dragged.clone()).with_zoom(zoom);
        query.origin_content_rect = self.origin_content_rect;

        let (resolution, hysteresis) = compute(&query, &self.hysteresis, ctx, &self.config);
        self.hysteresis = hysteresis;
        let stored = self.resolution.insert(resolution);
        Ok(&*stored)
    }

    /// Ends the gesture. Returns the plan for the final preview, or `None`
    /// (and cancels) if the cursor was released over nothing valid.
    pub fn commit(&mut self) -> Result<Option<DropCommitPlan>, DragError> {
        if self.phase != DragPhase::Active {
            return Err(DragError::NotActive);
        }

        let plan = self
            .resolution
            .as_ref()
            .and_then(DropResolution::preview)
            .map(|preview| DropCommitPlan::from_preview(preview, &self.dragged));

        self.phase = if plan.is_some() {
            DragPhase::Committed
        } else {
            DragPhase::Cancelled
        };
        debug!(phase = ?self.phase, "drag released");
        Ok(plan)
    }

    /// Abandons the gesture without producing any patches
    pub fn cancel(&mut self) {
        if self.phase == DragPhase::Active {
            debug!("drag cancelled");
            self.phase = DragPhase::Cancelled;
            self.resolution = None;
        }
    }
}
