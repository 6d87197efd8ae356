//! Changing block types and wrapping blocks.

use crate::error::ModelError;
use crate::model::{Attrs, Node};
use crate::state::{EditorState, Selection};
use crate::transform::{Assoc, Transaction};

use super::{Command, Dispatch, finish, restore_selection};

pub const HEADING: &str = "heading";
pub const CODE_BLOCK: &str = "code_block";
pub const BLOCKQUOTE: &str = "blockquote";
pub const HORIZONTAL_RULE: &str = "horizontal_rule";

/// Move the children `start..end` of the container at `wrapper_pos` out of
/// it, splitting the container around them. With `unwrap_lifted` the
/// lifted children are replaced by their own children.
pub(crate) fn lift_out(
    tr: &mut Transaction,
    wrapper_pos: usize,
    start: usize,
    end: usize,
    unwrap_lifted: bool,
) -> Result<(), ModelError> {
    let wrapper = tr
        .doc()
        .node_at(wrapper_pos)
        .filter(Node::is_container)
        .ok_or_else(|| ModelError::precondition(format!("no container at {wrapper_pos}")))?;
    let count = wrapper.child_count();
    if start >= end || end > count {
        return Err(ModelError::precondition(format!(
            "cannot lift children {start}..{end} of {count}"
        )));
    }
    if start == 0 && end == count && !unwrap_lifted {
        tr.unwrap(wrapper_pos)?;
        return Ok(());
    }
    let schema = tr.schema().clone();
    let children = wrapper.children();
    let mut nodes = Vec::new();
    if start > 0 {
        nodes.push(schema.node(
            wrapper.node_type(),
            wrapper.attrs().clone(),
            children[..start].to_vec(),
        )?);
    }
    for child in &children[start..end] {
        if unwrap_lifted {
            nodes.extend(child.children().iter().cloned());
        } else {
            nodes.push(child.clone());
        }
    }
    if end < count {
        nodes.push(schema.node(
            wrapper.node_type(),
            wrapper.attrs().clone(),
            children[end..].to_vec(),
        )?);
    }
    tr.replace_range(wrapper_pos, wrapper_pos + wrapper.node_size(), nodes)?;
    Ok(())
}

/// Positions and nodes of the textblocks the selection touches.
pub(crate) fn selected_textblocks(state: &EditorState) -> Vec<(usize, Node)> {
    let schema = state.schema();
    let selection = state.selection();
    let mut blocks = Vec::new();
    state
        .doc()
        .nodes_between(selection.from(), selection.to(), |node, pos, _, _| {
            if schema.is_textblock(node.node_type()) {
                blocks.push((pos, node.clone()));
                return false;
            }
            true
        });
    blocks
}

fn has_attrs(node: &Node, attrs: &Attrs) -> bool {
    attrs.iter().all(|(key, value)| node.attr(key) == Some(value))
}

/// Turn every selected textblock into `node_type`.
#[derive(Debug, Clone, PartialEq)]
pub struct SetBlockType {
    node_type: String,
    attrs: Attrs,
}

impl SetBlockType {
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            attrs: Attrs::new(),
        }
    }

    pub fn with_attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    fn plan(&self, state: &EditorState) -> Result<Option<Transaction>, ModelError> {
        let targets: Vec<usize> = selected_textblocks(state)
            .into_iter()
            .filter(|(_, node)| node.node_type() != self.node_type || !has_attrs(node, &self.attrs))
            .map(|(pos, _)| pos)
            .collect();
        if targets.is_empty() {
            return Ok(None);
        }
        let coords = state.selection().text_coords(state.doc(), state.schema());
        let mut tr = state.tr();
        for pos in targets {
            let pos = tr.mapping().map(pos, Assoc::Before);
            tr.set_block_type(pos, &self.node_type, self.attrs.clone())?;
        }
        restore_selection(&mut tr, coords)?;
        Ok(Some(tr))
    }
}

impl Command for SetBlockType {
    fn execute(&self, state: &EditorState, dispatch: Option<Dispatch<'_>>) -> bool {
        finish("set_block_type", self.plan(state), dispatch)
    }
}

/// Set the selected textblocks to `node_type`, or back to the default
/// textblock when they all already are.
#[derive(Debug, Clone, PartialEq)]
pub struct ToggleBlockType {
    node_type: String,
    attrs: Attrs,
}

impl ToggleBlockType {
    pub fn new(node_type: impl Into<String>, attrs: Attrs) -> Self {
        Self {
            node_type: node_type.into(),
            attrs,
        }
    }
}

impl Command for ToggleBlockType {
    fn execute(&self, state: &EditorState, dispatch: Option<Dispatch<'_>>) -> bool {
        let blocks = selected_textblocks(state);
        let active = !blocks.is_empty()
            && blocks
                .iter()
                .all(|(_, node)| node.node_type() == self.node_type && has_attrs(node, &self.attrs));
        if active {
            let Some(default) = state.schema().default_textblock() else {
                return false;
            };
            SetBlockType::new(default).execute(state, dispatch)
        } else {
            SetBlockType::new(self.node_type.clone())
                .with_attrs(self.attrs.clone())
                .execute(state, dispatch)
        }
    }
}

pub fn toggle_heading(level: u8) -> ToggleBlockType {
    ToggleBlockType::new(HEADING, crate::model::attrs([("level", level)]))
}

pub fn toggle_code_block() -> ToggleBlockType {
    ToggleBlockType::new(CODE_BLOCK, Attrs::new())
}

/// Wrap the selected blocks in `node_type`, or lift them out when they are
/// already directly inside one.
#[derive(Debug, Clone, PartialEq)]
pub struct WrapIn {
    node_type: String,
    attrs: Attrs,
}

impl WrapIn {
    pub fn new(node_type: impl Into<String>, attrs: Attrs) -> Self {
        Self {
            node_type: node_type.into(),
            attrs,
        }
    }

    fn plan(&self, state: &EditorState) -> Result<Option<Transaction>, ModelError> {
        let selection = state.selection();
        let rfrom = state.doc().resolve(selection.from())?;
        let rto = state.doc().resolve(selection.to())?;
        let Some(range) = rfrom.block_range(&rto, state.schema()) else {
            return Ok(None);
        };
        let coords = selection.text_coords(state.doc(), state.schema());
        let mut tr = state.tr();
        if range.depth() > 0 && range.parent().node_type() == self.node_type {
            let wrapper_pos = range.from().before(range.depth());
            lift_out(
                &mut tr,
                wrapper_pos,
                range.start_index(),
                range.end_index(),
                false,
            )?;
        } else {
            tr.wrap_in(range.start(), range.end(), &self.node_type, self.attrs.clone())?;
        }
        restore_selection(&mut tr, coords)?;
        Ok(Some(tr))
    }
}

impl Command for WrapIn {
    fn execute(&self, state: &EditorState, dispatch: Option<Dispatch<'_>>) -> bool {
        finish("wrap_in", self.plan(state), dispatch)
    }
}

pub fn wrap_in_blockquote() -> WrapIn {
    WrapIn::new(BLOCKQUOTE, Attrs::new())
}

/// Insert a horizontal rule after the textblock holding the cursor and put
/// the cursor in the block that follows it, creating one if needed.
pub fn insert_horizontal_rule(state: &EditorState, dispatch: Option<Dispatch<'_>>) -> bool {
    finish(
        "insert_horizontal_rule",
        plan_insert_horizontal_rule(state),
        dispatch,
    )
}

fn plan_insert_horizontal_rule(state: &EditorState) -> Result<Option<Transaction>, ModelError> {
    let schema = state.schema();
    let rp = state.doc().resolve(state.selection().head)?;
    let depth = rp.depth();
    if depth == 0 || !schema.is_textblock(rp.parent().node_type()) {
        return Ok(None);
    }
    let container = rp.node(depth - 1);
    let accepts = schema
        .node_type(container.node_type())
        .is_some_and(|t| t.accepts(HORIZONTAL_RULE));
    if !accepts {
        return Ok(None);
    }
    let pos = rp.after(depth);
    let mut nodes = vec![schema.leaf(HORIZONTAL_RULE, Attrs::new())?];
    if rp.index(depth - 1) + 1 == container.child_count()
        && let Some(default) = schema.default_textblock()
    {
        nodes.push(schema.node(default, Attrs::new(), [])?);
    }
    let mut tr = state.tr();
    tr.insert_nodes(pos, nodes)?;
    let selection = Selection::near(tr.doc(), schema, pos + 1);
    tr.set_selection(selection)?;
    Ok(Some(tr))
}
