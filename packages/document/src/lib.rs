//! # Designer Document
//!
//! Canonical document model and the machinery that edits it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ producers: drag commit, inspector, AI edits │
//! └─────────────────────────────────────────────┘
//!                     ↓ Vec<Patch>
//! ┌─────────────────────────────────────────────┐
//! │ validator: dry-run on a scratch copy        │
//! │  - per-op reference checks                  │
//! │  - multi-parent / cycle / dangling roots    │
//! └─────────────────────────────────────────────┘
//!                     ↓ accepted batch
//! ┌─────────────────────────────────────────────┐
//! │ store: apply + invert + undo/redo           │
//! │  - parent index                             │
//! │  - pending change set                       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ scene: expand frames for layout/rendering   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Structural ids are the only patch targets**
//! 2. **Apply never fails**: unresolved references are no-ops
//! 3. **Validation is explicit** and happens before the store sees a batch
//! 4. **Every patch is invertible** against the state it was applied to
//!
//! ## Usage
//!
//! ```rust,ignore
//! use designer_document::{DocumentStore, Patch};
//!
//! let mut store = DocumentStore::new(document);
//! store.apply_patches(&patches, Some("drag-42"), Some("Move layer"))?;
//!
//! let dirty = store.take_changes();
//! store.undo();
//! ```

mod cascade;
mod changes;
mod diagnostic;
mod errors;
pub mod model;
mod parent_index;
mod patch;
pub mod paths;
mod store;
mod undo_stack;
mod validator;

pub use cascade::{plan_delete_subtree, plan_remove_component};
pub use changes::PendingChangeSet;
pub use diagnostic::{IssueCode, Severity, ValidationIssue, ValidationReport};
pub use errors::{DocumentError, DocumentResult};
pub use model::*;
pub use parent_index::ParentIndex;
pub use patch::{apply_all, apply_in_place, invert_batch, resolve_index, Patch};
pub use store::{DocumentStore, StoreConfig};
pub use undo_stack::{UndoEntry, UndoStack};
pub use validator::{check_document, validate_patches};
