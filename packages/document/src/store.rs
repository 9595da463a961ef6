//! # Document Store
//!
//! Owns the canonical document and everything derived from it.
//!
//! ## Lifecycle of a batch
//!
//! ```text
//! validate → invert (against pre-state) → apply in order → rebuild parents
//!          → record pending changes → push/coalesce undo entry
//! ```
//!
//! Undo and redo replay stored patch lists directly; they never validate
//! and never coalesce.

use crate::changes::PendingChangeSet;
use crate::errors::{DocumentError, DocumentResult};
use crate::model::Document;
use crate::parent_index::ParentIndex;
use crate::patch::Patch;
use crate::undo_stack::{UndoEntry, UndoStack};
use crate::validator::validate_patches;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Store tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    /// Same-group batches closer together than this merge into one undo step
    pub coalesce_window_ms: u64,

    /// Maximum undo (and redo) entries; 0 means unbounded
    pub undo_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            coalesce_window_ms: 2000,
            undo_capacity: 100,
        }
    }
}

/// Canonical document plus parent index, history, and dirty tracking
#[derive(Debug, Clone)]
pub struct DocumentStore {
    document: Document,
    parents: ParentIndex,
    history: UndoStack,
    changes: PendingChangeSet,

    /// Bumped on every mutation, including undo/redo
    version: u64,

    /// Reference point for batch timestamps
    epoch: Instant,
}

impl DocumentStore {
    pub fn new(document: Document) -> Self {
        Self::with_config(document, StoreConfig::default())
    }

    pub fn with_config(document: Document, config: StoreConfig) -> Self {
        let parents = ParentIndex::build(&document);
        Self {
            document,
            parents,
            history: UndoStack::with_limits(
                config.undo_capacity,
                Duration::from_millis(config.coalesce_window_ms),
            ),
            changes: PendingChangeSet::new(),
            version: 0,
            epoch: Instant::now(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn parents(&self) -> &ParentIndex {
        &self.parents
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Validates and applies a batch as one undo step.
    ///
    /// Warnings are logged and do not block; any error rejects the whole
    /// batch and leaves the store untouched.
    pub fn apply_patches(&mut self, patches: &[Patch], group: Option<&str>, label: Option<&str>) -> DocumentResult<()> {
        let now = self.epoch.elapsed();
        self.apply_patches_at(patches, group, label, now)
    }

    /// [`Self::apply_patches`] with an explicit timestamp, measured from any
    /// fixed reference point. Coalescing compares these timestamps.
    #[instrument(skip(self, patches, label), fields(batch_len = patches.len()))]
    pub fn apply_patches_at(
        &mut self,
        patches: &[Patch],
        group: Option<&str>,
        label: Option<&str>,
        now: Duration,
    ) -> DocumentResult<()> {
        let report = validate_patches(&self.document, patches);
        for issue in report.warnings() {
            warn!(code = %issue.code, "{}", issue.message);
        }
        if !report.is_valid() {
            info!(errors = report.error_count(), "batch rejected");
            return Err(DocumentError::InvalidBatch(report));
        }

        self.commit(patches, group, label, now);
        Ok(())
    }

    /// Applies a batch without validating it first. The batch is still
    /// recorded for undo.
    pub fn apply_unchecked(&mut self, patches: &[Patch], group: Option<&str>, label: Option<&str>) {
        let now = self.epoch.elapsed();
        self.commit(patches, group, label, now);
    }

    fn commit(&mut self, patches: &[Patch], group: Option<&str>, label: Option<&str>, now: Duration) {
        if patches.is_empty() {
            return;
        }

        let mut inverses: Vec<Vec<Patch>> = Vec::with_capacity(patches.len());
        for patch in patches {
            inverses.push(patch.inverse(&self.document, &self.parents));
            self.apply_one(patch);
        }
        let inverses: Vec<Patch> = inverses.into_iter().rev().flatten().collect();

        let entry = UndoEntry::new(patches.to_vec(), inverses, now)
            .with_group(group.map(String::from))
            .with_label(label.map(String::from));
        let merged = self.history.record(entry);

        self.version += 1;
        debug!(version = self.version, merged, "batch committed");
    }

    /// Applies one patch, keeping the parent index and change set current.
    fn apply_one(&mut self, patch: &Patch) {
        self.changes.record_before(patch, &self.document, &self.parents);
        patch.apply(&mut self.document);
        if patch.is_structural() {
            self.parents = ParentIndex::build(&self.document);
        }
        self.changes.record_after(patch, &self.document, &self.parents);
    }

    /// Reverts the most recent undo step. Returns `false` if there was none.
    pub fn undo(&mut self) -> bool {
        let Some(entry) = self.history.undo() else {
            return false;
        };
        let inverses = entry.inverses.clone();
        for patch in &inverses {
            self.apply_one(patch);
        }
        self.version += 1;
        debug!(version = self.version, patches = inverses.len(), "undo");
        true
    }

    /// Re-applies the most recently undone step. Returns `false` if there was none.
    pub fn redo(&mut self) -> bool {
        let Some(entry) = self.history.redo() else {
            return false;
        };
        let patches = entry.patches.clone();
        for patch in &patches {
            self.apply_one(patch);
        }
        self.version += 1;
        debug!(version = self.version, patches = patches.len(), "redo");
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_levels(&self) -> usize {
        self.history.undo_levels()
    }

    pub fn redo_levels(&self) -> usize {
        self.history.redo_levels()
    }

    pub fn undo_label(&self) -> Option<&str> {
        self.history.undo_label()
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.history.redo_label()
    }

    /// Ids touched since the last call, as one summary
    pub fn take_changes(&mut self) -> PendingChangeSet {
        std::mem::take(&mut self.changes)
    }

    /// Peeks at pending changes without draining them
    pub fn pending_changes(&self) -> &PendingChangeSet {
        &self.changes
    }
}
