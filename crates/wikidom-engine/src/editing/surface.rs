use crate::editing::document::DocumentModel;
use crate::editing::error::ModelError;
use crate::editing::patch::Patch;
use crate::editing::range::Range;
use crate::editing::transaction::Transaction;

/// One undo/redo unit: the transactions committed between two breakpoints
/// and the selection as it stood when the breakpoint was taken.
#[derive(Debug, Clone)]
pub(crate) struct HistoryState {
    stack: Vec<Transaction>,
    selection: Option<Range>,
}

/// An editing surface: one document, the current selection, and two-tier
/// undo/redo history.
///
/// Transactions accumulate on a small stack until [`breakpoint`]
/// (host-driven, typically on a short timer and around logically grouped
/// edits) flushes them onto the big stack as one atomic undo unit.
/// `undo_index` counts how many breakpoints back of the tip the surface
/// currently sits; new work discards everything beyond it.
///
/// [`breakpoint`]: Surface::breakpoint
#[derive(Debug)]
pub struct Surface {
    doc: DocumentModel,
    selection: Option<Range>,
    small_stack: Vec<Transaction>,
    big_stack: Vec<HistoryState>,
    undo_index: usize,
}

impl Surface {
    pub fn new(doc: DocumentModel) -> Self {
        Self {
            doc,
            selection: None,
            small_stack: Vec::new(),
            big_stack: Vec::new(),
            undo_index: 0,
        }
    }

    pub fn document(&self) -> &DocumentModel {
        &self.doc
    }

    pub fn selection(&self) -> Option<Range> {
        self.selection
    }

    /// Sets the selection. A manual selection (mouse, keyboard) forces a
    /// breakpoint first so the edits before it undo as one unit.
    pub fn select(&mut self, range: Range, is_manual: bool) {
        if is_manual {
            self.breakpoint();
        }
        self.selection = Some(range.normalized());
    }

    /// Commits a transaction. Any redo-able future is discarded.
    pub fn transact(&mut self, tx: Transaction) -> Result<Patch, ModelError> {
        if self.undo_index > 0 {
            let keep = self.big_stack.len() - self.undo_index;
            self.big_stack.truncate(keep);
            self.undo_index = 0;
        }
        let patch = self.doc.commit(&tx)?;
        self.small_stack.push(tx);
        Ok(patch)
    }

    /// Flushes pending transactions into one undo unit. Returns whether
    /// anything was flushed.
    pub fn breakpoint(&mut self) -> bool {
        if self.small_stack.is_empty() {
            return false;
        }
        let stack = std::mem::take(&mut self.small_stack);
        self.big_stack.push(HistoryState {
            stack,
            selection: self.selection,
        });
        true
    }

    /// Rolls back one breakpoint's worth of transactions, restoring the
    /// selection saved with it. Returns `Ok(false)` when there is nothing
    /// left to undo.
    pub fn undo(&mut self) -> Result<bool, ModelError> {
        self.breakpoint();
        if self.undo_index >= self.big_stack.len() {
            return Ok(false);
        }
        self.undo_index += 1;
        let state = self.big_stack[self.big_stack.len() - self.undo_index].clone();
        let mut diff: isize = 0;
        for tx in state.stack.iter().rev() {
            self.doc.rollback(tx)?;
            diff += tx.length_difference();
        }
        self.selection = state.selection.map(|range| range.translated(-diff));
        Ok(true)
    }

    /// Re-commits the most recently undone breakpoint. Returns `Ok(false)`
    /// when there is nothing to redo.
    pub fn redo(&mut self) -> Result<bool, ModelError> {
        self.breakpoint();
        if self.undo_index == 0 {
            return Ok(false);
        }
        let state = self.big_stack[self.big_stack.len() - self.undo_index].clone();
        let mut diff: isize = 0;
        for tx in &state.stack {
            self.doc.commit(tx)?;
            diff += tx.length_difference();
        }
        self.selection = state.selection.map(|range| range.translated(diff));
        self.undo_index -= 1;
        Ok(true)
    }

    /// Drops the selection and the whole history. Used when swapping in an
    /// entirely new document.
    pub fn purge_history(&mut self) {
        self.selection = None;
        self.small_stack.clear();
        self.big_stack.clear();
        self.undo_index = 0;
    }

    pub fn can_undo(&self) -> bool {
        !self.small_stack.is_empty() || self.big_stack.len() > self.undo_index
    }

    pub fn can_redo(&self) -> bool {
        self.undo_index > 0
    }

    /// Number of breakpoints currently on the big stack.
    pub fn history_depth(&self) -> usize {
        self.big_stack.len()
    }
}
