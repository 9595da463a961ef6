//! # Designer Scene
//!
//! Expands frames of the canonical document into concrete scenes and indexes
//! them for interaction.
//!
//! ```text
//! Document ──expand_frame──▶ ExpandedScene ──LookupIndex::build──▶ LookupIndex
//!  (structural ids)           (expanded ids)                       (both, plus parents)
//! ```
//!
//! Both outputs are derived and disposable: rebuild them after every store
//! update that touches the frame.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use designer_scene::{expand_frame, LookupIndex};
//!
//! let scene = expand_frame(store.document(), &frame_id).expect("frame exists");
//! let index = LookupIndex::build(&scene);
//! let editable = index.patch_target(&hit);
//! ```

pub mod expander;
pub mod lookup;
pub mod scene;

#[cfg(test)]
mod tests_expansion;

#[cfg(test)]
mod tests_slots;

pub use expander::expand_frame;
pub use lookup::LookupIndex;
pub use scene::{ExpandedNode, ExpandedScene, NodeOrigin, OriginKind, Placeholder};
