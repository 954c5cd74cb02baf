use std::collections::VecDeque;

use crate::shield::{ShieldData, ShieldSnapshot};

pub const DEFAULT_MAX_HISTORY_SIZE: usize = 50;

/// Bounded undo/redo stacks of worksheet snapshots.
///
/// The manager never owns the worksheet; every call takes the live
/// instance by reference. Each stack holds at most `max_history_size`
/// entries and drops its oldest entry when a push would exceed that.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    undo_stack: VecDeque<ShieldSnapshot>,
    redo_stack: VecDeque<ShieldSnapshot>,
    max_history_size: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY_SIZE)
    }
}

impl HistoryManager {
    pub fn new(max_history_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_history_size,
        }
    }

    /// Records `current` before an undoable edit. Invalidates redo.
    pub fn push_state(&mut self, current: &ShieldData) {
        self.redo_stack.clear();
        push_bounded(
            &mut self.undo_stack,
            current.snapshot(),
            self.max_history_size,
        );
        tracing::debug!(undo = self.undo_stack.len(), "history push");
    }

    /// Steps back one edit. Returns false (and changes nothing) when
    /// there is nothing to undo.
    pub fn undo(&mut self, current: &mut ShieldData) -> bool {
        let Some(previous) = self.undo_stack.pop_back() else {
            return false;
        };
        push_bounded(
            &mut self.redo_stack,
            current.snapshot(),
            self.max_history_size,
        );
        current.restore_from(&previous);
        tracing::debug!(
            undo = self.undo_stack.len(),
            redo = self.redo_stack.len(),
            "history undo"
        );
        true
    }

    /// Re-applies the last undone edit. Returns false when there is
    /// nothing to redo.
    pub fn redo(&mut self, current: &mut ShieldData) -> bool {
        let Some(next) = self.redo_stack.pop_back() else {
            return false;
        };
        push_bounded(
            &mut self.undo_stack,
            current.snapshot(),
            self.max_history_size,
        );
        current.restore_from(&next);
        tracing::debug!(
            undo = self.undo_stack.len(),
            redo = self.redo_stack.len(),
            "history redo"
        );
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_history_size(&self) -> usize {
        self.max_history_size
    }

    /// Oldest-first view of the undo stack.
    pub fn undo_entries(&self) -> impl Iterator<Item = &ShieldSnapshot> {
        self.undo_stack.iter()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

fn push_bounded(
    stack: &mut VecDeque<ShieldSnapshot>,
    snapshot: ShieldSnapshot,
    max: usize,
) {
    stack.push_back(snapshot);
    while stack.len() > max {
        stack.pop_front();
        tracing::debug!(max, "history evicted oldest snapshot");
    }
}
