//! Shared primitives for the designer workspace.
//!
//! Two identifier domains live here side by side: *structural* ids
//! ([`NodeId`], [`FrameId`], [`ComponentId`]) name things stored in the
//! document and are the only ids a patch may target, while [`ExpandedId`]
//! names a node as it appears in a resolved scene after component instances
//! have been inlined. They are distinct types so one cannot be passed where
//! the other is expected.

pub mod error;
pub mod geometry;
pub mod ids;
pub mod json;
pub mod result;

pub use error::*;
pub use geometry::*;
pub use ids::*;
pub use json::*;
pub use result::*;
