//! Index stabilization near slot boundaries.

use designer_common::{Axis, ExpandedId, Point};
use serde::{Deserialize, Serialize};

/// Per-gesture memory of the last reported insertion index. Passed into and
/// returned from each resolution; never shared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HysteresisState {
    /// Target the index below refers to
    pub target: Option<ExpandedId>,

    /// Last reported insertion index
    pub last_index: Option<usize>,

    /// Cursor position when `last_index` last changed
    pub anchor: Option<Point>,
}

impl HysteresisState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decides the reported index for `raw` and returns it with the next
    /// state. A new target resets the memory. On the same target a differing
    /// raw index moves the reported index one step towards it, and only once
    /// the cursor has travelled `threshold` along `axis` since the last change.
    pub fn settle(&self, target: &ExpandedId, raw: usize, len: usize, cursor: Point, axis: Axis, threshold: f64) -> (usize, Self) {
        let previous = match (&self.target, self.last_index, self.anchor) {
            (Some(current), Some(index), Some(anchor)) if current == target => Some((index.min(len), anchor)),
            _ => None,
        };

        let Some((last, anchor)) = previous else {
            return (raw, self.changed(target, raw, cursor));
        };

        if raw == last {
            return (last, self.changed(target, last, anchor));
        }

        let travelled = (cursor.along(axis) - anchor.along(axis)).abs();
        if travelled < threshold {
            return (last, self.changed(target, last, anchor));
        }

        let stepped = if raw > last { last + 1 } else { last - 1 };
        (stepped, self.changed(target, stepped, cursor))
    }

    fn changed(&self, target: &ExpandedId, index: usize, anchor: Point) -> Self {
        Self {
            target: Some(target.clone()),
            last_index: Some(index),
            anchor: Some(anchor),
        }
    }
}
