//! # Designer Interaction
//!
//! Drag-and-drop over an expanded scene. A gesture is a [`DragSession`];
//! every pointer update runs the pure [`compute`] resolver, and release turns
//! the last valid [`DropPreview`] into a [`DropCommitPlan`] whose patches go
//! through the document store like any other edit.
//!
//! Resolution failures are values ([`InvalidDrop`]), never errors: they
//! happen on ordinary pointer frames and the gesture simply continues.

pub mod commit;
pub mod config;
pub mod hysteresis;
pub mod preview;
pub mod providers;
pub mod resolver;
pub mod session;

pub use commit::DropCommitPlan;
pub use config::DropConfig;
pub use hysteresis::HysteresisState;
pub use preview::{DraggedNode, DropIntent, DropPreview, DropQuery, DropResolution, InvalidDrop, ReflowOffset};
pub use providers::{FramePositionProvider, GeometryProvider, HitTestProvider};
pub use resolver::{compute, origin_content_rect, DropContext};
pub use session::{DragError, DragPhase, DragSession};
