//! Bullet and ordered lists.

use crate::error::ModelError;
use crate::model::{Attrs, Fragment, Node, ResolvedPos};
use crate::schema::Schema;
use crate::state::{EditorState, Selection};
use crate::transform::Transaction;

use super::blocks::lift_out;
use super::text::first_textblock_start;
use super::{Command, Dispatch, finish, restore_selection};

pub const LIST_ITEM: &str = "list_item";
pub const BULLET_LIST: &str = "bullet_list";
pub const ORDERED_LIST: &str = "ordered_list";

pub(crate) fn is_list_item(node: &Node) -> bool {
    node.node_type() == LIST_ITEM
}

fn is_list(schema: &Schema, node: &Node) -> bool {
    schema
        .node_type(node.node_type())
        .is_some_and(|t| t.accepts(LIST_ITEM))
}

/// Depth of the innermost list item around `rp`.
fn item_depth(rp: &ResolvedPos) -> Option<usize> {
    (2..=rp.depth()).rev().find(|&d| is_list_item(rp.node(d)))
}

/// Turn the selected blocks into a list of `list_type`, switch the
/// surrounding list to it, or take the items out of a list that already is.
#[derive(Debug, Clone, PartialEq)]
pub struct ToggleList {
    list_type: String,
}

impl ToggleList {
    pub fn new(list_type: impl Into<String>) -> Self {
        Self {
            list_type: list_type.into(),
        }
    }

    fn plan(&self, state: &EditorState) -> Result<Option<Transaction>, ModelError> {
        let schema = state.schema();
        let selection = state.selection();
        let rfrom = state.doc().resolve(selection.from())?;
        let rto = state.doc().resolve(selection.to())?;
        let coords = selection.text_coords(state.doc(), schema);
        let mut tr = state.tr();

        if let Some(d) = item_depth(&rfrom) {
            let list = rfrom.node(d - 1);
            let same_list = rto.depth() >= d && rto.start(d - 1) == rfrom.start(d - 1);
            if !same_list || !is_list(schema, list) {
                return Ok(None);
            }
            let list_pos = rfrom.before(d - 1);
            if list.node_type() == self.list_type {
                lift_out(
                    &mut tr,
                    list_pos,
                    rfrom.index(d - 1),
                    rto.index(d - 1) + 1,
                    true,
                )?;
            } else {
                tr.set_block_type(list_pos, &self.list_type, Attrs::new())?;
            }
        } else {
            let Some(range) = rfrom.block_range(&rto, schema) else {
                return Ok(None);
            };
            let items = range.parent().children()[range.start_index()..range.end_index()]
                .iter()
                .map(|block| schema.node(LIST_ITEM, Attrs::new(), [block.clone()]))
                .collect::<Result<Vec<_>, _>>()?;
            let list = schema.node(&self.list_type, Attrs::new(), items)?;
            tr.replace_range(range.start(), range.end(), [list])?;
        }
        restore_selection(&mut tr, coords)?;
        Ok(Some(tr))
    }
}

impl Command for ToggleList {
    fn execute(&self, state: &EditorState, dispatch: Option<Dispatch<'_>>) -> bool {
        finish("toggle_list", self.plan(state), dispatch)
    }
}

pub fn toggle_bullet_list() -> ToggleList {
    ToggleList::new(BULLET_LIST)
}

pub fn toggle_ordered_list() -> ToggleList {
    ToggleList::new(ORDERED_LIST)
}

/// Split the list item at the cursor. An empty last block leaves the list
/// instead.
pub fn split_list_item(state: &EditorState, dispatch: Option<Dispatch<'_>>) -> bool {
    finish("split_list_item", plan_split_list_item(state), dispatch)
}

fn plan_split_list_item(state: &EditorState) -> Result<Option<Transaction>, ModelError> {
    let schema = state.schema();
    let selection = state.selection();
    let rfrom = state.doc().resolve(selection.from())?;
    let depth = rfrom.depth();
    if depth < 2 || !is_list_item(rfrom.node(depth - 1)) {
        return Ok(None);
    }
    let parent_type = rfrom.parent().node_type();
    if !schema.is_textblock(parent_type) || schema.is_code(parent_type) {
        return Ok(None);
    }
    let rto = state.doc().resolve(selection.to())?;
    if rto.depth() != depth || rto.start(depth) != rfrom.start(depth) {
        return Ok(None);
    }

    let item = rfrom.node(depth - 1);
    if selection.empty()
        && rfrom.parent().content_size() == 0
        && rfrom.index(depth - 1) + 1 == item.child_count()
    {
        return plan_lift_list_item(state);
    }

    let mut tr = state.tr();
    let pos = selection.from();
    if !selection.empty() {
        tr.delete_range(selection.from(), selection.to())?;
    }
    let types_after = if selection.to() == rto.end(depth) {
        let paragraph = schema
            .default_textblock()
            .ok_or_else(|| ModelError::precondition("schema has no default textblock"))?;
        vec![None, Some((paragraph.to_string(), Attrs::new()))]
    } else {
        Vec::new()
    };
    tr.split(pos, 2, &types_after)?;
    let item_pos = tr.doc().resolve(pos)?.after(depth - 1);
    let cursor = tr
        .doc()
        .node_at(item_pos)
        .and_then(|item| first_textblock_start(schema, &item, item_pos))
        .ok_or_else(|| ModelError::precondition("split left no item to move into"))?;
    tr.set_selection(Selection::cursor(cursor))?;
    Ok(Some(tr))
}

/// Move the item at the cursor into a nested list under its previous
/// sibling.
pub fn sink_list_item(state: &EditorState, dispatch: Option<Dispatch<'_>>) -> bool {
    finish("sink_list_item", plan_sink_list_item(state), dispatch)
}

fn plan_sink_list_item(state: &EditorState) -> Result<Option<Transaction>, ModelError> {
    let schema = state.schema();
    let rp = state.doc().resolve(state.selection().from())?;
    let Some(d) = item_depth(&rp) else {
        return Ok(None);
    };
    let index = rp.index(d - 1);
    if index == 0 {
        return Ok(None);
    }
    let list = rp.node(d - 1);
    let item = rp.node(d);
    let prev = list.child(index - 1);

    let nested = match prev.last_child() {
        Some(last) if last.node_type() == list.node_type() => {
            last.copy(last.content().append(&Fragment::from_node(item.clone())))
        }
        _ => schema.node(list.node_type(), Attrs::new(), [item.clone()])?,
    };
    let keeps_last = prev
        .last_child()
        .is_some_and(|last| last.node_type() == list.node_type());
    let mut children = prev.children().to_vec();
    if keeps_last {
        children.pop();
    }
    children.push(nested);
    schema.check_content(prev.node_type(), &children)?;
    let new_prev = prev.copy(Fragment::from_nodes(children));

    let coords = state.selection().text_coords(state.doc(), schema);
    let mut tr = state.tr();
    let prev_pos = rp.before(d) - prev.node_size();
    tr.replace_range(prev_pos, rp.after(d), [new_prev])?;
    restore_selection(&mut tr, coords)?;
    Ok(Some(tr))
}

/// Move the item at the cursor one level up: out of a nested list into the
/// parent list, or out of a top-level list entirely.
pub fn lift_list_item(state: &EditorState, dispatch: Option<Dispatch<'_>>) -> bool {
    finish("lift_list_item", plan_lift_list_item(state), dispatch)
}

pub(crate) fn plan_lift_list_item(state: &EditorState) -> Result<Option<Transaction>, ModelError> {
    let schema = state.schema();
    let rp = state.doc().resolve(state.selection().from())?;
    let Some(d) = item_depth(&rp) else {
        return Ok(None);
    };
    let index = rp.index(d - 1);
    let coords = state.selection().text_coords(state.doc(), schema);
    let mut tr = state.tr();

    if d >= 4 && is_list_item(rp.node(d - 2)) {
        let outer = rp.node(d - 2);
        let list = rp.node(d - 1);
        let item = rp.node(d);
        let list_index = rp.index(d - 2);

        let mut outer_children = outer.children()[..list_index].to_vec();
        if index > 0 {
            outer_children.push(list.copy(Fragment::from_nodes(list.children()[..index].to_vec())));
        }
        let mut lifted_children = item.children().to_vec();
        if index + 1 < list.child_count() {
            lifted_children.push(
                list.copy(Fragment::from_nodes(list.children()[index + 1..].to_vec())),
            );
        }
        lifted_children.extend(outer.children()[list_index + 1..].iter().cloned());

        schema.check_content(outer.node_type(), &outer_children)?;
        schema.check_content(item.node_type(), &lifted_children)?;
        let new_outer = outer.copy(Fragment::from_nodes(outer_children));
        let lifted = item.copy(Fragment::from_nodes(lifted_children));
        tr.replace_range(rp.before(d - 2), rp.after(d - 2), [new_outer, lifted])?;
    } else {
        lift_out(&mut tr, rp.before(d - 1), index, index + 1, true)?;
    }
    restore_selection(&mut tr, coords)?;
    Ok(Some(tr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{run, state_at};
    use crate::{doc, li, ol, p, ul};
    use pretty_assertions::assert_eq;

    // ============ toggling ============

    #[test]
    fn test_toggle_bullet_list_round_trip() {
        let state = state_at(doc![p!("ab")], 2, 2);
        let listed = run(&toggle_bullet_list(), &state).unwrap();
        assert_eq!(listed.doc(), &doc![ul!(li!(p!("ab")))]);
        assert_eq!(listed.selection(), Selection::cursor(4));
        let back = run(&toggle_bullet_list(), &listed).unwrap();
        assert_eq!(back.doc(), &doc![p!("ab")]);
        assert_eq!(back.selection(), Selection::cursor(2));
    }

    #[test]
    fn test_toggle_list_over_several_blocks() {
        let next = run(&toggle_bullet_list(), &state_at(doc![p!("ab"), p!("cd")], 1, 5)).unwrap();
        assert_eq!(next.doc(), &doc![ul!(li!(p!("ab")), li!(p!("cd")))]);
    }

    #[test]
    fn test_toggle_switches_list_type() {
        let state = state_at(doc![ul!(li!(p!("a")), li!(p!("b")))], 3, 3);
        let next = run(&toggle_ordered_list(), &state).unwrap();
        assert_eq!(next.doc(), &doc![ol!(li!(p!("a")), li!(p!("b")))]);
        assert_eq!(next.doc().child(0).attr("order").and_then(|v| v.as_int()), Some(1));
    }

    #[test]
    fn test_toggle_off_middle_item_splits_list() {
        let d = doc![ul!(li!(p!("a")), li!(p!("b")), li!(p!("c")))];
        let next = run(&toggle_bullet_list(), &state_at(d, 8, 8)).unwrap();
        assert_eq!(
            next.doc(),
            &doc![ul!(li!(p!("a"))), p!("b"), ul!(li!(p!("c")))]
        );
        assert_eq!(next.selection(), Selection::cursor(8));
    }

    // ============ splitting ============

    #[test]
    fn test_split_list_item_in_middle() {
        let next = run(&split_list_item, &state_at(doc![ul!(li!(p!("abcd")))], 5, 5)).unwrap();
        assert_eq!(next.doc(), &doc![ul!(li!(p!("ab")), li!(p!("cd")))]);
        assert_eq!(next.selection(), Selection::cursor(9));
    }

    #[test]
    fn test_split_list_item_at_end() {
        let next = run(&split_list_item, &state_at(doc![ul!(li!(p!("ab")))], 5, 5)).unwrap();
        assert_eq!(next.doc(), &doc![ul!(li!(p!("ab")), li!(p!()))]);
        assert_eq!(next.selection(), Selection::cursor(9));
    }

    #[test]
    fn test_split_empty_item_leaves_list() {
        let d = doc![ul!(li!(p!("a")), li!(p!()))];
        let next = run(&split_list_item, &state_at(d, 8, 8)).unwrap();
        assert_eq!(next.doc(), &doc![ul!(li!(p!("a"))), p!()]);
        assert_eq!(next.selection(), Selection::cursor(8));
    }

    #[test]
    fn test_split_outside_list() {
        assert!(run(&split_list_item, &state_at(doc![p!("ab")], 2, 2)).is_none());
    }

    // ============ nesting ============

    #[test]
    fn test_sink_and_lift() {
        let d = doc![ul!(li!(p!("a")), li!(p!("b")))];
        let sunk = run(&sink_list_item, &state_at(d.clone(), 8, 8)).unwrap();
        assert_eq!(sunk.doc(), &doc![ul!(li!(p!("a"), ul!(li!(p!("b")))))]);
        assert_eq!(sunk.selection(), Selection::cursor(8));

        let lifted = run(&lift_list_item, &sunk).unwrap();
        assert_eq!(lifted.doc(), &d);
        assert_eq!(lifted.selection(), Selection::cursor(8));
    }

    #[test]
    fn test_sink_appends_to_existing_nested_list() {
        let d = doc![ul!(li!(p!("a"), ul!(li!(p!("b")))), li!(p!("c")))];
        let next = run(&sink_list_item, &state_at(d, 15, 15)).unwrap();
        assert_eq!(
            next.doc(),
            &doc![ul!(li!(p!("a"), ul!(li!(p!("b")), li!(p!("c")))))]
        );
    }

    #[test]
    fn test_sink_first_item_refused() {
        assert!(run(&sink_list_item, &state_at(doc![ul!(li!(p!("a")))], 3, 3)).is_none());
    }

    #[test]
    fn test_lift_nested_item_takes_following_siblings() {
        let d = doc![ul!(li!(p!("a"), ul!(li!(p!("b")), li!(p!("c")))))];
        let next = run(&lift_list_item, &state_at(d, 8, 8)).unwrap();
        assert_eq!(
            next.doc(),
            &doc![ul!(li!(p!("a")), li!(p!("b"), ul!(li!(p!("c")))))]
        );
    }

    #[test]
    fn test_lift_top_level_item() {
        let next = run(&lift_list_item, &state_at(doc![ul!(li!(p!("a")))], 3, 3)).unwrap();
        assert_eq!(next.doc(), &doc![p!("a")]);
        assert_eq!(next.selection(), Selection::cursor(1));
    }
}
