//! Typing, deleting and splitting.

use crate::error::ModelError;
use crate::model::{Attrs, Node};
use crate::schema::Schema;
use crate::state::{EditorState, Selection};
use crate::transform::Transaction;

use super::blocks::lift_out;
use super::lists::{is_list_item, plan_lift_list_item};
use super::{Command, Dispatch, delete_range_normalized, finish, restore_selection};

pub const HARD_BREAK: &str = "hard_break";

/// Replace the selection with text, using the stored marks when there are
/// any and the marks around the selection otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertText {
    text: String,
}

impl InsertText {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    fn plan(&self, state: &EditorState) -> Result<Option<Transaction>, ModelError> {
        if self.text.is_empty() {
            return Ok(None);
        }
        let schema = state.schema();
        let selection = state.selection();
        let mut tr = state.tr();
        if !selection.empty() {
            delete_range_normalized(&mut tr, selection.from(), selection.to())?;
        }
        let pos = tr.selection().head;
        let rp = tr.doc().resolve(pos)?;
        if !schema.is_textblock(rp.parent().node_type()) {
            return Ok(None);
        }
        let marks = match state.stored_marks() {
            Some(marks) => marks.clone(),
            None => {
                // the text before a deleted range decides, as it does at a cursor
                let original = state.doc().resolve(selection.from())?;
                if schema.is_textblock(original.parent().node_type()) {
                    original.marks(schema)
                } else {
                    rp.marks(schema)
                }
            }
        };
        tr.insert_text_with_marks(pos, &self.text, marks)?;
        tr.set_selection(Selection::cursor(pos + self.text.chars().count()))?;
        Ok(Some(tr))
    }
}

impl Command for InsertText {
    fn execute(&self, state: &EditorState, dispatch: Option<Dispatch<'_>>) -> bool {
        finish("insert_text", self.plan(state), dispatch)
    }
}

pub fn insert_text(text: impl Into<String>) -> InsertText {
    InsertText::new(text)
}

pub fn delete_selection(state: &EditorState, dispatch: Option<Dispatch<'_>>) -> bool {
    finish("delete_selection", plan_delete_selection(state), dispatch)
}

fn plan_delete_selection(state: &EditorState) -> Result<Option<Transaction>, ModelError> {
    let selection = state.selection();
    if selection.empty() {
        return Ok(None);
    }
    let mut tr = state.tr();
    delete_range_normalized(&mut tr, selection.from(), selection.to())?;
    Ok(Some(tr))
}

/// Depth of the innermost ancestor (the textblock included) that has a
/// sibling before it.
fn cut_before(rp: &crate::model::ResolvedPos) -> Option<usize> {
    (1..=rp.depth()).rev().find(|&d| rp.index(d - 1) > 0)
}

/// Depth of the innermost ancestor that has a sibling after it.
fn cut_after(rp: &crate::model::ResolvedPos) -> Option<usize> {
    (1..=rp.depth())
        .rev()
        .find(|&d| rp.index(d - 1) + 1 < rp.node(d - 1).child_count())
}

/// End of the content of the last textblock inside `node`, which ends at
/// `end`.
fn last_textblock_end(schema: &Schema, node: &Node, end: usize) -> Option<usize> {
    if schema.is_textblock(node.node_type()) {
        return Some(end - 1);
    }
    last_textblock_end(schema, node.last_child()?, end - 1)
}

/// Start of the content of the first textblock inside `node`, which starts
/// at `start`.
pub(crate) fn first_textblock_start(schema: &Schema, node: &Node, start: usize) -> Option<usize> {
    if schema.is_textblock(node.node_type()) {
        return Some(start + 1);
    }
    first_textblock_start(schema, node.first_child()?, start + 1)
}

/// Move the textblock at the cursor out of its parent container.
fn plan_lift_block(state: &EditorState) -> Result<Option<Transaction>, ModelError> {
    let rp = state.doc().resolve(state.selection().head)?;
    let depth = rp.depth();
    if depth < 2 {
        return Ok(None);
    }
    if is_list_item(rp.node(depth - 1)) {
        return plan_lift_list_item(state);
    }
    let coords = state.selection().text_coords(state.doc(), state.schema());
    let index = rp.index(depth - 1);
    let mut tr = state.tr();
    lift_out(&mut tr, rp.before(depth - 1), index, index + 1, false)?;
    restore_selection(&mut tr, coords)?;
    Ok(Some(tr))
}

pub fn delete_backward(state: &EditorState, dispatch: Option<Dispatch<'_>>) -> bool {
    finish("delete_backward", plan_delete_backward(state), dispatch)
}

fn plan_delete_backward(state: &EditorState) -> Result<Option<Transaction>, ModelError> {
    let selection = state.selection();
    if !selection.empty() {
        return plan_delete_selection(state);
    }
    let schema = state.schema();
    let head = selection.head;
    let rp = state.doc().resolve(head)?;
    if !schema.is_textblock(rp.parent().node_type()) {
        return Ok(None);
    }
    let mut tr = state.tr();
    if rp.parent_offset() > 0 {
        tr.delete_range(head - 1, head)?;
        tr.set_selection(Selection::cursor(head - 1))?;
        return Ok(Some(tr));
    }
    let Some(depth) = cut_before(&rp) else {
        return plan_lift_block(state);
    };
    let cut = rp.before(depth);
    let before = rp.node(depth - 1).child(rp.index(depth - 1) - 1);
    if before.is_leaf() {
        let size = before.node_size();
        tr.delete_range(cut - size, cut)?;
        tr.set_selection(Selection::cursor(head - size))?;
        return Ok(Some(tr));
    }
    let Some(end) = last_textblock_end(schema, before, cut) else {
        return Ok(None);
    };
    let joined = tr.delete_range(end, head).map(|_| ());
    match joined {
        Ok(()) => {
            tr.set_selection(Selection::cursor(end))?;
            Ok(Some(tr))
        }
        Err(err) if rp.depth() > 1 => {
            log::debug!("join backward failed ({err}), lifting instead");
            plan_lift_block(state)
        }
        Err(err) => Err(err),
    }
}

pub fn delete_forward(state: &EditorState, dispatch: Option<Dispatch<'_>>) -> bool {
    finish("delete_forward", plan_delete_forward(state), dispatch)
}

fn plan_delete_forward(state: &EditorState) -> Result<Option<Transaction>, ModelError> {
    let selection = state.selection();
    if !selection.empty() {
        return plan_delete_selection(state);
    }
    let schema = state.schema();
    let head = selection.head;
    let rp = state.doc().resolve(head)?;
    let parent = rp.parent();
    if !schema.is_textblock(parent.node_type()) {
        return Ok(None);
    }
    let mut tr = state.tr();
    if rp.parent_offset() < parent.content_size() {
        tr.delete_range(head, head + 1)?;
        tr.set_selection(Selection::cursor(head))?;
        return Ok(Some(tr));
    }
    let Some(depth) = cut_after(&rp) else {
        return Ok(None);
    };
    let cut = rp.after(depth);
    let after = rp.node(depth - 1).child(rp.index(depth - 1) + 1);
    if after.is_leaf() {
        tr.delete_range(cut, cut + after.node_size())?;
    } else {
        let Some(start) = first_textblock_start(schema, after, cut) else {
            return Ok(None);
        };
        tr.delete_range(head, start)?;
    }
    tr.set_selection(Selection::cursor(head))?;
    Ok(Some(tr))
}

/// Split the textblock at the cursor. An empty textblock inside a wrapper
/// is moved out of the wrapper instead.
pub fn split_block(state: &EditorState, dispatch: Option<Dispatch<'_>>) -> bool {
    finish("split_block", plan_split_block(state), dispatch)
}

fn plan_split_block(state: &EditorState) -> Result<Option<Transaction>, ModelError> {
    let schema = state.schema();
    let selection = state.selection();
    let mut tr = state.tr();
    if !selection.empty() {
        delete_range_normalized(&mut tr, selection.from(), selection.to())?;
    }
    let pos = tr.selection().head;
    let rp = tr.doc().resolve(pos)?;
    let depth = rp.depth();
    let parent = rp.parent();
    if !schema.is_textblock(parent.node_type()) {
        return Ok(None);
    }

    if parent.content_size() == 0 && depth > 1 && !is_list_item(rp.node(depth - 1)) {
        let coords = Selection::cursor(pos).text_coords(tr.doc(), schema);
        let index = rp.index(depth - 1);
        let mut lifted = tr.clone();
        if lift_out(&mut lifted, rp.before(depth - 1), index, index + 1, false).is_ok() {
            restore_selection(&mut lifted, coords)?;
            return Ok(Some(lifted));
        }
    }

    let at_end = rp.parent_offset() == parent.content_size();
    let types_after: Vec<Option<(String, Attrs)>> = match schema.default_textblock() {
        Some(default) if at_end => vec![Some((default.to_string(), Attrs::new()))],
        _ => Vec::new(),
    };
    tr.split(pos, 1, &types_after)?;
    let block_pos = tr.doc().resolve(pos)?.after(depth);
    let cursor = tr
        .doc()
        .node_at(block_pos)
        .and_then(|block| first_textblock_start(schema, &block, block_pos))
        .ok_or_else(|| ModelError::precondition("split left no block to move into"))?;
    tr.set_selection(Selection::cursor(cursor))?;
    Ok(Some(tr))
}

/// Insert a literal newline when the cursor is in a code block.
pub fn newline_in_code(state: &EditorState, dispatch: Option<Dispatch<'_>>) -> bool {
    finish("newline_in_code", plan_newline_in_code(state), dispatch)
}

fn plan_newline_in_code(state: &EditorState) -> Result<Option<Transaction>, ModelError> {
    let selection = state.selection();
    let rfrom = state.doc().resolve(selection.from())?;
    let rto = state.doc().resolve(selection.to())?;
    let in_code = state.schema().is_code(rfrom.parent().node_type());
    if !in_code || rfrom.start(rfrom.depth()) != rto.start(rto.depth()) {
        return Ok(None);
    }
    let mut tr = state.tr();
    if !selection.empty() {
        tr.delete_range(selection.from(), selection.to())?;
    }
    tr.insert_text_with_marks(selection.from(), "\n", Default::default())?;
    tr.set_selection(Selection::cursor(selection.from() + 1))?;
    Ok(Some(tr))
}

pub fn insert_hard_break(state: &EditorState, dispatch: Option<Dispatch<'_>>) -> bool {
    finish("insert_hard_break", plan_insert_hard_break(state), dispatch)
}

fn plan_insert_hard_break(state: &EditorState) -> Result<Option<Transaction>, ModelError> {
    let schema = state.schema();
    let selection = state.selection();
    let mut tr = state.tr();
    if !selection.empty() {
        delete_range_normalized(&mut tr, selection.from(), selection.to())?;
    }
    let pos = tr.selection().head;
    let accepts = schema
        .node_type(tr.doc().resolve(pos)?.parent().node_type())
        .is_some_and(|t| t.accepts(HARD_BREAK));
    if !accepts {
        return Ok(None);
    }
    tr.insert_nodes(pos, [schema.leaf(HARD_BREAK, Attrs::new())?])?;
    tr.set_selection(Selection::cursor(pos + 1))?;
    Ok(Some(tr))
}

/// Insert a tab character, the fallback for Tab outside lists.
pub fn insert_tab(state: &EditorState, dispatch: Option<Dispatch<'_>>) -> bool {
    InsertText::new("\t").execute(state, dispatch)
}

pub fn select_all(state: &EditorState, dispatch: Option<Dispatch<'_>>) -> bool {
    finish("select_all", plan_select_all(state), dispatch)
}

fn plan_select_all(state: &EditorState) -> Result<Option<Transaction>, ModelError> {
    let mut tr = state.tr();
    tr.set_selection(Selection::all(state.doc()))?;
    Ok(Some(tr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::*;
    use crate::commands::test_support::{run, state_at};
    use crate::{blockquote, code_block, doc, h, p};
    use pretty_assertions::assert_eq;

    // ============ typing ============

    #[test]
    fn test_insert_into_empty_paragraph() {
        let next = run(&insert_text("hello"), &state_at(doc![p!()], 1, 1)).unwrap();
        assert_eq!(next.doc(), &doc![p!("hello")]);
        assert_eq!(next.selection(), Selection::cursor(6));
    }

    #[test]
    fn test_insert_replaces_selection() {
        let next = run(&insert_text("x"), &state_at(doc![p!("abcd")], 2, 4)).unwrap();
        assert_eq!(next.doc(), &doc![p!("axd")]);
        assert_eq!(next.selection(), Selection::cursor(3));
    }

    #[test]
    fn test_insert_continues_surrounding_marks() {
        let next = run(&insert_text("c"), &state_at(doc![p!(em("ab"))], 3, 3)).unwrap();
        assert_eq!(next.doc(), &doc![p!(em("abc"))]);
    }

    #[test]
    fn test_insert_outside_textblock_fails() {
        assert!(run(&insert_text("x"), &state_at(doc![p!("a"), hr()], 3, 3)).is_none());
    }

    #[test]
    fn test_insert_tab() {
        let next = run(&insert_tab, &state_at(doc![p!("ab")], 1, 1)).unwrap();
        assert_eq!(next.doc(), &doc![p!("\tab")]);
    }

    // ============ delete backward ============

    #[test]
    fn test_delete_backward_char() {
        let next = run(&delete_backward, &state_at(doc![p!("abc")], 3, 3)).unwrap();
        assert_eq!(next.doc(), &doc![p!("ac")]);
        assert_eq!(next.selection(), Selection::cursor(2));
    }

    #[test]
    fn test_delete_backward_joins_paragraphs() {
        let next = run(&delete_backward, &state_at(doc![p!("ab"), p!("cd")], 5, 5)).unwrap();
        assert_eq!(next.doc(), &doc![p!("abcd")]);
        assert_eq!(next.selection(), Selection::cursor(3));
    }

    #[test]
    fn test_delete_backward_at_doc_start() {
        assert!(run(&delete_backward, &state_at(doc![p!("ab")], 1, 1)).is_none());
    }

    #[test]
    fn test_delete_backward_removes_leaf_block() {
        let next = run(&delete_backward, &state_at(doc![p!("a"), hr(), p!("b")], 5, 5)).unwrap();
        assert_eq!(next.doc(), &doc![p!("a"), p!("b")]);
        assert_eq!(next.selection(), Selection::cursor(4));
    }

    #[test]
    fn test_delete_backward_joins_into_blockquote() {
        let d = doc![blockquote!(p!("a")), p!("b")];
        let next = run(&delete_backward, &state_at(d, 6, 6)).unwrap();
        assert_eq!(next.doc(), &doc![blockquote!(p!("ab"))]);
        assert_eq!(next.selection(), Selection::cursor(3));
    }

    #[test]
    fn test_delete_backward_lifts_first_quoted_block() {
        let d = doc![blockquote!(p!("a"), p!("b"))];
        let next = run(&delete_backward, &state_at(d, 2, 2)).unwrap();
        assert_eq!(next.doc(), &doc![p!("a"), blockquote!(p!("b"))]);
        assert_eq!(next.selection(), Selection::cursor(1));
    }

    // ============ delete forward ============

    #[test]
    fn test_delete_forward_joins_paragraphs() {
        let next = run(&delete_forward, &state_at(doc![p!("ab"), p!("cd")], 3, 3)).unwrap();
        assert_eq!(next.doc(), &doc![p!("abcd")]);
        assert_eq!(next.selection(), Selection::cursor(3));
    }

    #[test]
    fn test_delete_forward_pulls_text_out_of_blockquote() {
        let d = doc![p!("ab"), blockquote!(p!("cd"))];
        let next = run(&delete_forward, &state_at(d, 3, 3)).unwrap();
        assert_eq!(next.doc(), &doc![p!("abcd")]);
    }

    #[test]
    fn test_delete_forward_at_doc_end() {
        assert!(run(&delete_forward, &state_at(doc![p!("ab")], 3, 3)).is_none());
    }

    // ============ splitting ============

    #[test]
    fn test_split_block_middle() {
        let next = run(&split_block, &state_at(doc![p!("abcd")], 3, 3)).unwrap();
        assert_eq!(next.doc(), &doc![p!("ab"), p!("cd")]);
        assert_eq!(next.selection(), Selection::cursor(5));
    }

    #[test]
    fn test_split_heading_at_end_makes_paragraph() {
        let next = run(&split_block, &state_at(doc![h!(1; "ab")], 3, 3)).unwrap();
        assert_eq!(next.doc(), &doc![h!(1; "ab"), p!()]);
        assert_eq!(next.selection(), Selection::cursor(5));
    }

    #[test]
    fn test_split_empty_quoted_block_leaves_quote() {
        let d = doc![blockquote!(p!("a"), p!())];
        let next = run(&split_block, &state_at(d, 5, 5)).unwrap();
        assert_eq!(next.doc(), &doc![blockquote!(p!("a")), p!()]);
        assert_eq!(next.selection(), Selection::cursor(6));
    }

    #[test]
    fn test_newline_in_code() {
        let next = run(&newline_in_code, &state_at(doc![code_block!("ab")], 2, 2)).unwrap();
        assert_eq!(next.doc(), &doc![code_block!("a\nb")]);
        assert_eq!(next.selection(), Selection::cursor(3));
        assert!(run(&newline_in_code, &state_at(doc![p!("ab")], 2, 2)).is_none());
    }

    #[test]
    fn test_insert_hard_break() {
        let next = run(&insert_hard_break, &state_at(doc![p!("ab")], 2, 2)).unwrap();
        assert_eq!(next.doc(), &doc![p!("a", hard_break(), "b")]);
        assert_eq!(next.selection(), Selection::cursor(3));
        assert!(run(&insert_hard_break, &state_at(doc![code_block!("ab")], 2, 2)).is_none());
    }

    // ============ selection ============

    #[test]
    fn test_select_all_then_delete() {
        let state = state_at(doc![p!("ab"), p!("c")], 1, 1);
        let all = run(&select_all, &state).unwrap();
        assert_eq!(all.selection(), Selection::new(0, 7));
        let cleared = run(&delete_selection, &all).unwrap();
        assert_eq!(cleared.doc(), &doc![p!()]);
        assert_eq!(cleared.selection(), Selection::cursor(1));
    }

    #[test]
    fn test_typing_replaces_everything_selected() {
        let all = run(&select_all, &state_at(doc![p!("ab"), p!("cd")], 2, 2)).unwrap();
        let typed = run(&insert_text("x"), &all).unwrap();
        assert_eq!(typed.doc(), &doc![p!("x")]);
        assert_eq!(typed.selection(), Selection::cursor(2));
    }

    #[test]
    fn test_split_and_break_replace_everything_selected() {
        let all = run(&select_all, &state_at(doc![p!("ab"), p!("cd")], 2, 2)).unwrap();
        let split = run(&split_block, &all).unwrap();
        assert_eq!(split.doc(), &doc![p!(), p!()]);
        assert_eq!(split.selection(), Selection::cursor(3));

        let broken = run(&insert_hard_break, &all).unwrap();
        assert_eq!(broken.doc(), &doc![p!(hard_break())]);
    }

    #[test]
    fn test_typing_over_blocks_from_a_boundary() {
        // the selection starts between the blocks, not inside text
        let state = state_at(doc![p!("ab"), hr(), p!("cd")], 4, 7);
        let typed = run(&insert_text("x"), &state).unwrap();
        assert_eq!(typed.doc(), &doc![p!("ab"), p!("xd")]);
        assert_eq!(typed.selection(), Selection::cursor(6));
    }

    #[test]
    fn test_delete_selection_needs_range() {
        assert!(run(&delete_selection, &state_at(doc![p!("ab")], 2, 2)).is_none());
    }
}
