//! # Undo/Redo Stack
//!
//! Tracks patch history and enables undo/redo.
//!
//! ## Design
//!
//! - Each batch records its inverse before being applied
//! - Undo replays the inverse list and moves the entry to the redo stack
//! - Redo replays the forward list
//! - New entries clear the redo stack
//! - An entry coalesces into the top of the stack when both carry the same
//!   group id and the top entry was touched less than the coalesce window ago
//! - Both stacks are bounded; the oldest entry is dropped past capacity
//!
//! The stack only stores patches. Applying them is the store's job, so
//! undo/redo never re-enter the coalescing logic.

use crate::patch::Patch;
use std::time::Duration;

/// One undoable step
#[derive(Debug, Clone, PartialEq)]
pub struct UndoEntry {
    /// Forward patches in application order
    pub patches: Vec<Patch>,

    /// Inverse patches, already in replay order
    pub inverses: Vec<Patch>,

    /// Coalescing key
    pub group_id: Option<String>,

    pub label: Option<String>,

    /// Time of the last batch merged into this entry
    pub timestamp: Duration,
}

impl UndoEntry {
    pub fn new(patches: Vec<Patch>, inverses: Vec<Patch>, timestamp: Duration) -> Self {
        Self {
            patches,
            inverses,
            group_id: None,
            label: None,
            timestamp,
        }
    }

    pub fn with_group(mut self, group_id: Option<String>) -> Self {
        self.group_id = group_id;
        self
    }

    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.label = label;
        self
    }

    /// Folds a later batch into this entry. Forward patches append; the
    /// later batch's inverses must run first on undo, so they prepend.
    fn absorb(&mut self, later: UndoEntry) {
        self.patches.extend(later.patches);
        let mut inverses = later.inverses;
        inverses.append(&mut self.inverses);
        self.inverses = inverses;
        self.timestamp = later.timestamp;
        if later.label.is_some() {
            self.label = later.label;
        }
    }
}

/// Bounded undo/redo history with group coalescing
#[derive(Debug, Clone)]
pub struct UndoStack {
    undo_stack: Vec<UndoEntry>,
    redo_stack: Vec<UndoEntry>,

    /// Maximum entries per stack (0 = unlimited)
    capacity: usize,

    coalesce_window: Duration,
}

impl UndoStack {
    pub const DEFAULT_CAPACITY: usize = 100;
    pub const DEFAULT_COALESCE_WINDOW: Duration = Duration::from_millis(2000);

    pub fn new() -> Self {
        Self::with_limits(Self::DEFAULT_CAPACITY, Self::DEFAULT_COALESCE_WINDOW)
    }

    pub fn with_limits(capacity: usize, coalesce_window: Duration) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            capacity,
            coalesce_window,
        }
    }

    /// Records an applied batch. Returns `true` when it was merged into the
    /// previous entry rather than pushed as a new one.
    pub fn record(&mut self, entry: UndoEntry) -> bool {
        self.redo_stack.clear();

        if let Some(top) = self.undo_stack.last_mut() {
            if Self::coalesces(top, &entry, self.coalesce_window) {
                top.absorb(entry);
                return true;
            }
        }

        self.undo_stack.push(entry);
        Self::trim(&mut self.undo_stack, self.capacity);
        false
    }

    fn coalesces(top: &UndoEntry, next: &UndoEntry, window: Duration) -> bool {
        match (&top.group_id, &next.group_id) {
            (Some(a), Some(b)) if a == b => next.timestamp.saturating_sub(top.timestamp) < window,
            _ => false,
        }
    }

    fn trim(stack: &mut Vec<UndoEntry>, capacity: usize) {
        if capacity > 0 && stack.len() > capacity {
            let excess = stack.len() - capacity;
            stack.drain(..excess);
        }
    }

    /// Pops the most recent entry onto the redo stack and returns the
    /// patches that undo it.
    pub fn undo(&mut self) -> Option<&UndoEntry> {
        let entry = self.undo_stack.pop()?;
        self.redo_stack.push(entry);
        Self::trim(&mut self.redo_stack, self.capacity);
        self.redo_stack.last()
    }

    /// Moves the most recently undone entry back onto the undo stack and
    /// returns it for replay.
    pub fn redo(&mut self) -> Option<&UndoEntry> {
        let entry = self.redo_stack.pop()?;
        self.undo_stack.push(entry);
        Self::trim(&mut self.undo_stack, self.capacity);
        self.undo_stack.last()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn undo_label(&self) -> Option<&str> {
        self.undo_stack.last().and_then(|entry| entry.label.as_deref())
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.redo_stack.last().and_then(|entry| entry.label.as_deref())
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}
