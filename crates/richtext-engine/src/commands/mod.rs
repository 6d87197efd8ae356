//! Editing commands.
//!
//! A command looks at a state and, when it applies, builds a transaction
//! and hands it to `dispatch`. Called without a dispatch function it only
//! answers whether it would apply, without side effects, and that answer
//! always matches what a dispatching call does.

pub mod blocks;
pub mod lists;
pub mod marks;
pub mod movement;
pub mod text;

use std::fmt;
use std::sync::Arc;

use crate::error::ModelError;
use crate::state::{EditorState, Selection, TextCoords};
use crate::transform::Transaction;

pub use blocks::{
    SetBlockType, ToggleBlockType, WrapIn, insert_horizontal_rule, toggle_code_block,
    toggle_heading, wrap_in_blockquote,
};
pub use lists::{ToggleList, lift_list_item, sink_list_item, split_list_item, toggle_bullet_list, toggle_ordered_list};
pub use marks::{ToggleMark, clear_formatting, mark_active};
pub use movement::{Motion, MoveCursor, target_position};
pub use text::{
    InsertText, delete_backward, delete_forward, delete_selection, insert_hard_break, insert_tab,
    newline_in_code, select_all, split_block,
};

/// Receives the transaction a command built.
pub type Dispatch<'a> = &'a mut dyn FnMut(Transaction);

pub trait Command {
    fn execute(&self, state: &EditorState, dispatch: Option<Dispatch<'_>>) -> bool;
}

impl<F> Command for F
where
    F: Fn(&EditorState, Option<Dispatch<'_>>) -> bool,
{
    fn execute(&self, state: &EditorState, dispatch: Option<Dispatch<'_>>) -> bool {
        self(state, dispatch)
    }
}

pub type BoxedCommand = Arc<dyn Command + Send + Sync>;

/// Tries commands in order until one applies.
#[derive(Clone, Default)]
pub struct Chain {
    commands: Vec<BoxedCommand>,
}

impl Chain {
    pub fn new(commands: Vec<BoxedCommand>) -> Self {
        Self { commands }
    }

    pub fn push(&mut self, command: BoxedCommand) {
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Chain({} commands)", self.commands.len())
    }
}

impl Command for Chain {
    fn execute(&self, state: &EditorState, mut dispatch: Option<Dispatch<'_>>) -> bool {
        self.commands
            .iter()
            .any(|command| command.execute(state, reborrow(&mut dispatch)))
    }
}

fn reborrow<'s>(dispatch: &'s mut Option<Dispatch<'_>>) -> Option<Dispatch<'s>> {
    match dispatch {
        Some(d) => Some(&mut **d),
        None => None,
    }
}

pub fn chain_commands(commands: Vec<BoxedCommand>) -> Chain {
    Chain::new(commands)
}

/// Common tail of every command: a planned transaction is dispatched, a
/// plan that does not apply (or fails) reports `false`.
pub(crate) fn finish(
    name: &str,
    planned: Result<Option<Transaction>, ModelError>,
    dispatch: Option<Dispatch<'_>>,
) -> bool {
    match planned {
        Ok(Some(tr)) => {
            if let Some(dispatch) = dispatch {
                dispatch(tr);
            }
            true
        }
        Ok(None) => false,
        Err(err) => {
            log::debug!("{name} refused: {err}");
            false
        }
    }
}

/// Delete `from..to` and put the cursor at the text position nearest to
/// `from`. When the whole document goes, one empty default textblock is
/// left behind with the cursor in it.
pub(crate) fn delete_range_normalized(
    tr: &mut Transaction,
    from: usize,
    to: usize,
) -> Result<(), ModelError> {
    let size = tr.doc().content_size();
    if from == 0 && to == size {
        let schema = tr.schema().clone();
        let node_type = schema
            .default_textblock()
            .ok_or_else(|| ModelError::precondition("schema has no default textblock"))?;
        let empty = schema.node(node_type, Default::default(), [])?;
        tr.replace_range(0, size, [empty])?;
        tr.set_selection(Selection::cursor(1))?;
    } else {
        tr.delete_range(from, to)?;
        let cursor = Selection::near(tr.doc(), tr.schema(), from);
        tr.set_selection(cursor)?;
    }
    Ok(())
}

/// Put the selection back on the same text after a structural edit.
pub(crate) fn restore_selection(
    tr: &mut Transaction,
    coords: Option<TextCoords>,
) -> Result<(), ModelError> {
    let schema = tr.schema().clone();
    let selection = coords
        .and_then(|coords| coords.resolve(tr.doc(), &schema))
        .unwrap_or_else(|| Selection::near(tr.doc(), &schema, tr.selection().head));
    tr.set_selection(selection)?;
    Ok(())
}

/// Look a command up by the name used in key binding configuration.
pub fn named(name: &str) -> Option<BoxedCommand> {
    let command: BoxedCommand = match name {
        "delete_selection" => Arc::new(delete_selection),
        "delete_backward" => Arc::new(delete_backward),
        "delete_forward" => Arc::new(delete_forward),
        "split_block" => Arc::new(split_block),
        "newline_in_code" => Arc::new(newline_in_code),
        "insert_hard_break" => Arc::new(insert_hard_break),
        "insert_tab" => Arc::new(insert_tab),
        "select_all" => Arc::new(select_all),
        "toggle_strong" => Arc::new(ToggleMark::new("strong")),
        "toggle_em" => Arc::new(ToggleMark::new("em")),
        "toggle_underline" => Arc::new(ToggleMark::new("underline")),
        "toggle_strike" => Arc::new(ToggleMark::new("strike")),
        "toggle_code" => Arc::new(ToggleMark::new("code")),
        "clear_formatting" => Arc::new(clear_formatting),
        "set_paragraph" => Arc::new(SetBlockType::new("paragraph")),
        "toggle_code_block" => Arc::new(toggle_code_block()),
        "wrap_in_blockquote" => Arc::new(wrap_in_blockquote()),
        "insert_horizontal_rule" => Arc::new(insert_horizontal_rule),
        "toggle_bullet_list" => Arc::new(toggle_bullet_list()),
        "toggle_ordered_list" => Arc::new(toggle_ordered_list()),
        "split_list_item" => Arc::new(split_list_item),
        "sink_list_item" => Arc::new(sink_list_item),
        "lift_list_item" => Arc::new(lift_list_item),
        "move_char_backward" => Arc::new(MoveCursor::new(Motion::CharBackward)),
        "move_char_forward" => Arc::new(MoveCursor::new(Motion::CharForward)),
        "move_block_start" => Arc::new(MoveCursor::new(Motion::BlockStart)),
        "move_block_end" => Arc::new(MoveCursor::new(Motion::BlockEnd)),
        "move_doc_start" => Arc::new(MoveCursor::new(Motion::DocStart)),
        "move_doc_end" => Arc::new(MoveCursor::new(Motion::DocEnd)),
        "extend_char_backward" => Arc::new(MoveCursor::extend(Motion::CharBackward)),
        "extend_char_forward" => Arc::new(MoveCursor::extend(Motion::CharForward)),
        other => {
            let level = other
                .strip_prefix("toggle_heading_")
                .and_then(|level| level.parse::<u8>().ok())
                .filter(|level| (1..=6).contains(level))?;
            Arc::new(toggle_heading(level))
        }
    };
    Some(command)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::model::Node;
    use crate::schema::basic_schema;
    use pretty_assertions::assert_eq;

    pub(crate) fn state_at(doc: Node, anchor: usize, head: usize) -> EditorState {
        EditorState::create_with_selection(basic_schema(), doc, Selection::new(anchor, head)).unwrap()
    }

    /// Dry-run, then execute, checking both calls agree. Returns the state
    /// after the dispatched transaction.
    pub(crate) fn run(command: &dyn Command, state: &EditorState) -> Option<EditorState> {
        let dry_run = command.execute(state, None);
        let mut next = None;
        let executed = command.execute(
            state,
            Some(&mut |tr: Transaction| next = Some(state.apply(&tr).unwrap())),
        );
        assert_eq!(dry_run, executed, "dry run and execution disagree");
        assert_eq!(executed, next.is_some());
        next
    }
}
