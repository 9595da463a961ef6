//! Collaborators supplied by the rendering layer.
//!
//! The resolver treats all three as opaque oracles. Bounds are frame-local;
//! points handed to the hit tester are world coordinates.

use designer_common::{ExpandedId, FrameId, Point, Rect};

/// Laid-out bounds of expanded nodes
pub trait GeometryProvider {
    /// Frame-local bounds of `id`, if it has been laid out
    fn bounds(&self, frame_id: &FrameId, id: &ExpandedId) -> Option<Rect>;
}

/// Placement of frames on the canvas
pub trait FramePositionProvider {
    /// World position of the frame's top-left corner
    fn world_position(&self, frame_id: &FrameId) -> Point;
}

/// Point queries against rendered geometry
pub trait HitTestProvider {
    /// Topmost container under `point`, ignoring `exclude` and their subtrees
    fn hit_test(&self, frame_id: &FrameId, point: Point, exclude: &[ExpandedId]) -> Option<ExpandedId>;
}
