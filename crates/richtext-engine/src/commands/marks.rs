use std::collections::BTreeSet;

use crate::error::ModelError;
use crate::model::{Attrs, MarkSet};
use crate::state::EditorState;
use crate::transform::Transaction;

use super::{Command, Dispatch, finish};

/// Add a mark over the selection unless every markable character already
/// carries it, in which case remove it. At a collapsed cursor the stored
/// marks are toggled instead.
#[derive(Debug, Clone, PartialEq)]
pub struct ToggleMark {
    mark_type: String,
    attrs: Attrs,
}

impl ToggleMark {
    pub fn new(mark_type: impl Into<String>) -> Self {
        Self {
            mark_type: mark_type.into(),
            attrs: Attrs::new(),
        }
    }

    pub fn with_attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    fn plan(&self, state: &EditorState) -> Result<Option<Transaction>, ModelError> {
        let schema = state.schema();
        let selection = state.selection();
        let mark = schema.mark(&self.mark_type, self.attrs.clone())?;
        let mut tr = state.tr();

        if selection.empty() {
            let rp = state.doc().resolve(selection.head)?;
            if !schema.allows_mark(rp.parent().node_type(), &self.mark_type) {
                return Ok(None);
            }
            let current = state
                .stored_marks()
                .cloned()
                .unwrap_or_else(|| rp.marks(schema));
            let next = if current.has_type(&self.mark_type) {
                current.without_type(&self.mark_type)
            } else {
                schema.add_mark_to_set(&current, mark)
            };
            tr.set_stored_marks(Some(next));
            return Ok(Some(tr));
        }

        let mut applicable = false;
        let mut uniform = true;
        state
            .doc()
            .nodes_between(selection.from(), selection.to(), |node, _, parent, _| {
                if node.is_text() && schema.allows_mark(parent.node_type(), &self.mark_type) {
                    applicable = true;
                    uniform &= node.marks().has_type(&self.mark_type);
                }
                true
            });
        if !applicable {
            return Ok(None);
        }
        if uniform {
            tr.remove_mark(selection.from(), selection.to(), &self.mark_type)?;
        } else {
            tr.add_mark(selection.from(), selection.to(), mark)?;
        }
        Ok(Some(tr))
    }
}

impl Command for ToggleMark {
    fn execute(&self, state: &EditorState, dispatch: Option<Dispatch<'_>>) -> bool {
        finish("toggle_mark", self.plan(state), dispatch)
    }
}

/// Remove every mark in the selection. At a collapsed cursor, drop the
/// stored marks. Refuses when there is nothing to clear.
pub fn clear_formatting(state: &EditorState, dispatch: Option<Dispatch<'_>>) -> bool {
    finish("clear_formatting", plan_clear_formatting(state), dispatch)
}

fn plan_clear_formatting(state: &EditorState) -> Result<Option<Transaction>, ModelError> {
    let selection = state.selection();
    let mut tr = state.tr();
    if selection.empty() {
        if state.stored_marks().is_none_or(MarkSet::is_empty) {
            return Ok(None);
        }
        tr.set_stored_marks(Some(MarkSet::empty()));
        return Ok(Some(tr));
    }

    let mut present = BTreeSet::new();
    state
        .doc()
        .nodes_between(selection.from(), selection.to(), |node, _, _, _| {
            present.extend(node.marks().iter().map(|m| m.mark_type().to_string()));
            true
        });
    if present.is_empty() {
        return Ok(None);
    }
    for mark_type in &present {
        tr.remove_mark(selection.from(), selection.to(), mark_type)?;
    }
    Ok(Some(tr))
}

/// Whether `mark_type` applies at the cursor (stored marks first) or
/// anywhere in the selected text.
pub fn mark_active(state: &EditorState, mark_type: &str) -> bool {
    let selection = state.selection();
    if selection.empty() {
        if let Some(stored) = state.stored_marks() {
            return stored.has_type(mark_type);
        }
        return state
            .doc()
            .resolve(selection.head)
            .is_ok_and(|rp| rp.marks(state.schema()).has_type(mark_type));
    }
    let mut found = false;
    state
        .doc()
        .nodes_between(selection.from(), selection.to(), |node, _, _, _| {
            found |= node.marks().has_type(mark_type);
            !found
        });
    found
}
