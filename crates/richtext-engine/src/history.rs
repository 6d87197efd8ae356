//! Undo/redo over whole editor states.
//!
//! Pushes that arrive within `batch_delay` of the previous one join the
//! same batch, so a burst of typing undoes as one step. Snapshots are
//! cheap to keep because states share unchanged nodes.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::state::EditorState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryOptions {
    pub batch_delay: Duration,
    pub max_depth: usize,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            batch_delay: Duration::from_millis(500),
            max_depth: 100,
        }
    }
}

#[derive(Debug, Clone)]
struct Pending {
    before: EditorState,
    last_push: Instant,
}

#[derive(Debug, Clone, Default)]
pub struct History {
    options: HistoryOptions,
    undo_stack: VecDeque<EditorState>,
    redo_stack: Vec<EditorState>,
    pending: Option<Pending>,
}

impl History {
    pub fn new(options: HistoryOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> HistoryOptions {
        self.options
    }

    /// Record the state an edit started from.
    pub fn push_state(&mut self, before: EditorState) {
        self.push_state_at(before, Instant::now());
    }

    pub fn push_state_at(&mut self, before: EditorState, now: Instant) {
        self.redo_stack.clear();
        let delay = self.options.batch_delay;
        if let Some(pending) = self
            .pending
            .as_mut()
            .filter(|pending| now.saturating_duration_since(pending.last_push) <= delay)
        {
            log::debug!("history: extending batch");
            pending.last_push = now;
            return;
        }
        self.finalize();
        log::debug!("history: starting batch");
        self.pending = Some(Pending {
            before,
            last_push: now,
        });
    }

    fn finalize(&mut self) {
        if let Some(pending) = self.pending.take() {
            self.undo_stack.push_back(pending.before);
            self.trim();
        }
    }

    fn trim(&mut self) {
        while self.undo_stack.len() > self.options.max_depth {
            self.undo_stack.pop_front();
        }
    }

    /// Step back from `current`. Returns the state to restore, or `None`
    /// when there is nothing to undo.
    pub fn undo(&mut self, current: EditorState) -> Option<EditorState> {
        self.finalize();
        let previous = self.undo_stack.pop_back()?;
        self.redo_stack.push(current);
        Some(previous)
    }

    pub fn redo(&mut self, current: EditorState) -> Option<EditorState> {
        self.finalize();
        let next = self.redo_stack.pop()?;
        self.undo_stack.push_back(current);
        self.trim();
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        self.pending.is_some() || !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of undoable steps, counting a pending batch.
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len() + usize::from(self.pending.is_some())
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::basic_schema;
    use crate::{doc, p};
    use pretty_assertions::assert_eq;

    fn state(text: &str) -> EditorState {
        EditorState::create(basic_schema(), Some(doc![p!(text)]))
    }

    fn text_of(state: &EditorState) -> String {
        state.doc().text_content()
    }

    const MS: Duration = Duration::from_millis(1);

    // ============ batching ============

    #[test]
    fn test_burst_undoes_as_one() {
        let mut history = History::default();
        let t0 = Instant::now();
        history.push_state_at(state(""), t0);
        history.push_state_at(state("a"), t0 + 100 * MS);
        history.push_state_at(state("ab"), t0 + 200 * MS);
        assert_eq!(history.undo_depth(), 1);

        let restored = history.undo(state("abc")).unwrap();
        assert_eq!(text_of(&restored), "");
        assert!(history.undo(restored).is_none());
    }

    #[test]
    fn test_window_is_measured_from_last_push() {
        let mut history = History::default();
        let t0 = Instant::now();
        history.push_state_at(state(""), t0);
        history.push_state_at(state("a"), t0 + 400 * MS);
        history.push_state_at(state("ab"), t0 + 800 * MS);
        assert_eq!(history.undo_depth(), 1);
    }

    #[test]
    fn test_separate_batches_undo_in_reverse() {
        let mut history = History::default();
        let t0 = Instant::now();
        history.push_state_at(state("one"), t0);
        history.push_state_at(state("two"), t0 + 600 * MS);

        let first = history.undo(state("three")).unwrap();
        assert_eq!(text_of(&first), "two");
        let second = history.undo(first).unwrap();
        assert_eq!(text_of(&second), "one");
    }

    // ============ redo ============

    #[test]
    fn test_redo_mirrors_undo() {
        let mut history = History::default();
        history.push_state(state("a"));
        let undone = history.undo(state("ab")).unwrap();
        assert!(history.can_redo());
        let redone = history.redo(undone).unwrap();
        assert_eq!(text_of(&redone), "ab");
        assert!(!history.can_redo());
        let again = history.undo(redone).unwrap();
        assert_eq!(text_of(&again), "a");
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut history = History::default();
        history.push_state(state("a"));
        let undone = history.undo(state("ab")).unwrap();
        history.push_state(undone);
        assert!(!history.can_redo());
        assert!(history.redo(state("x")).is_none());
    }

    #[test]
    fn test_depth_is_bounded() {
        let mut history = History::new(HistoryOptions {
            batch_delay: Duration::ZERO,
            max_depth: 2,
        });
        let t0 = Instant::now();
        for (i, text) in ["a", "b", "c", "d"].into_iter().enumerate() {
            history.push_state_at(state(text), t0 + (i as u32 + 1) * 10 * MS);
        }
        let mut current = state("e");
        let mut seen = Vec::new();
        while let Some(previous) = history.undo(current.clone()) {
            seen.push(text_of(&previous));
            current = previous;
        }
        assert_eq!(seen, vec!["d", "c"]);
    }

    #[test]
    fn test_empty_history() {
        let mut history = History::default();
        assert!(!history.can_undo());
        assert!(history.undo(state("a")).is_none());
        assert_eq!(history.redo_depth(), 0);
    }
}
