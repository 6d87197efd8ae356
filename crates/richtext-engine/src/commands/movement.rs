//! Cursor motion.
//!
//! Where a motion lands is a pure function of the document
//! ([`target_position`]); [`MoveCursor`] wraps it as a command.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::model::Node;
use crate::schema::Schema;
use crate::state::{EditorState, Selection, textblock_ranges};
use crate::transform::Transaction;

use super::{Command, Dispatch, finish};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Motion {
    CharBackward,
    CharForward,
    BlockStart,
    BlockEnd,
    DocStart,
    DocEnd,
}

/// The position `motion` moves to from `pos`. Positions outside any
/// textblock are first snapped to the nearest one; crossing a block
/// boundary counts as one step.
pub fn target_position(doc: &Node, schema: &Schema, pos: usize, motion: Motion) -> usize {
    let ranges = textblock_ranges(doc, schema);
    let (Some(&(first, _)), Some(&(_, last))) = (ranges.first(), ranges.last()) else {
        return pos;
    };
    let pos = Selection::near(doc, schema, pos).head;
    let Some(index) = ranges.iter().position(|&(s, e)| s <= pos && pos <= e) else {
        return pos;
    };
    let (start, end) = ranges[index];
    match motion {
        Motion::CharBackward if pos > start => pos - 1,
        Motion::CharBackward => index.checked_sub(1).map_or(pos, |i| ranges[i].1),
        Motion::CharForward if pos < end => pos + 1,
        Motion::CharForward => ranges.get(index + 1).map_or(pos, |&(s, _)| s),
        Motion::BlockStart => start,
        Motion::BlockEnd => end,
        Motion::DocStart => first,
        Motion::DocEnd => last,
    }
}

/// Move the cursor, or with `extend` only the selection head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveCursor {
    motion: Motion,
    extend: bool,
}

impl MoveCursor {
    pub fn new(motion: Motion) -> Self {
        Self {
            motion,
            extend: false,
        }
    }

    pub fn extend(motion: Motion) -> Self {
        Self {
            motion,
            extend: true,
        }
    }

    fn plan(&self, state: &EditorState) -> Result<Option<Transaction>, ModelError> {
        let selection = state.selection();
        let target = || target_position(state.doc(), state.schema(), selection.head, self.motion);
        let next = match (self.extend, self.motion) {
            (true, _) => Selection::new(selection.anchor, target()),
            (false, Motion::CharBackward) if !selection.empty() => {
                Selection::cursor(selection.from())
            }
            (false, Motion::CharForward) if !selection.empty() => Selection::cursor(selection.to()),
            (false, _) => Selection::cursor(target()),
        };
        if next == selection {
            return Ok(None);
        }
        let mut tr = state.tr();
        tr.set_selection(next)?;
        Ok(Some(tr))
    }
}

impl Command for MoveCursor {
    fn execute(&self, state: &EditorState, dispatch: Option<Dispatch<'_>>) -> bool {
        finish("move_cursor", self.plan(state), dispatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{run, state_at};
    use crate::schema::basic_schema;
    use crate::{blockquote, doc, p};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn sample() -> Node {
        doc![p!("ab"), blockquote!(p!("c"))]
    }

    #[rstest]
    #[case(2, Motion::CharBackward, 1)]
    #[case(1, Motion::CharBackward, 1)]
    #[case(6, Motion::CharBackward, 3)]
    #[case(3, Motion::CharForward, 6)]
    #[case(7, Motion::CharForward, 7)]
    #[case(2, Motion::BlockStart, 1)]
    #[case(2, Motion::BlockEnd, 3)]
    #[case(6, Motion::DocStart, 1)]
    #[case(1, Motion::DocEnd, 7)]
    #[case(4, Motion::CharForward, 6)]
    fn test_target_position(#[case] pos: usize, #[case] motion: Motion, #[case] expected: usize) {
        assert_eq!(target_position(&sample(), &basic_schema(), pos, motion), expected);
    }

    #[test]
    fn test_move_refuses_when_nothing_changes() {
        assert!(run(&MoveCursor::new(Motion::CharBackward), &state_at(sample(), 1, 1)).is_none());
    }

    #[test]
    fn test_move_collapses_range() {
        let back = run(&MoveCursor::new(Motion::CharBackward), &state_at(sample(), 3, 1)).unwrap();
        assert_eq!(back.selection(), Selection::cursor(1));
        let forward = run(&MoveCursor::new(Motion::CharForward), &state_at(sample(), 1, 3)).unwrap();
        assert_eq!(forward.selection(), Selection::cursor(3));
    }

    #[test]
    fn test_extend_moves_head_only() {
        let next = run(&MoveCursor::extend(Motion::CharForward), &state_at(sample(), 2, 3)).unwrap();
        assert_eq!(next.selection(), Selection::new(2, 6));
        let whole = run(&MoveCursor::extend(Motion::DocEnd), &next).unwrap();
        assert_eq!(whole.selection(), Selection::new(2, 7));
    }
}
