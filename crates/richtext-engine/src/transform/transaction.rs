use std::sync::Arc;

use crate::error::ModelError;
use crate::model::{Attrs, Fragment, Mark, MarkSet, Node, Slice};
use crate::schema::Schema;
use crate::state::{Selection, StateId};

use super::map::Mapping;
use super::step::Step;

/// A batch of steps built against one [`EditorState`](crate::state::EditorState).
///
/// Every step is applied as soon as it is added, so `doc()` is always the
/// document the next step will see. A step that fails leaves the
/// transaction exactly as it was and returns the error; commands use that
/// to bail out before dispatching anything.
#[derive(Debug, Clone)]
pub struct Transaction {
    base: StateId,
    schema: Arc<Schema>,
    before: Node,
    doc: Node,
    base_selection: Selection,
    base_stored_marks: Option<MarkSet>,
    steps: Vec<Step>,
    mapping: Mapping,
    selection: Option<Selection>,
    stored_marks: Option<Option<MarkSet>>,
    add_to_history: bool,
}

impl Transaction {
    pub(crate) fn new(
        base: StateId,
        schema: Arc<Schema>,
        doc: Node,
        selection: Selection,
        stored_marks: Option<MarkSet>,
    ) -> Self {
        Self {
            base,
            schema,
            before: doc.clone(),
            doc,
            base_selection: selection,
            base_stored_marks: stored_marks,
            steps: Vec::new(),
            mapping: Mapping::new(),
            selection: None,
            stored_marks: None,
            add_to_history: true,
        }
    }

    /// Id of the state this transaction was started from.
    pub fn base(&self) -> StateId {
        self.base
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// The document the transaction started from.
    pub fn before(&self) -> &Node {
        &self.before
    }

    /// The document with every step so far applied.
    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty()
    }

    /// Apply a step to the running document.
    pub fn step(&mut self, step: Step) -> Result<&mut Self, ModelError> {
        match step.apply(&self.doc, &self.schema) {
            Ok(result) => {
                log::trace!("step {step}");
                self.doc = result.doc;
                self.mapping.push(result.map);
                self.steps.push(step);
                // typing after a structural change starts from the marks
                // around the cursor again
                self.stored_marks = Some(None);
                Ok(self)
            }
            Err(err) => {
                log::trace!("step {step} failed: {err}");
                Err(err)
            }
        }
    }

    /// Insert text at `pos` with the stored marks, or the marks of the
    /// surrounding text when none are stored.
    pub fn insert_text(&mut self, pos: usize, text: &str) -> Result<&mut Self, ModelError> {
        let marks = match self.stored_marks() {
            Some(marks) => marks.clone(),
            None => self.doc.resolve(pos)?.marks(&self.schema),
        };
        self.insert_text_with_marks(pos, text, marks)
    }

    pub fn insert_text_with_marks(
        &mut self,
        pos: usize,
        text: &str,
        marks: MarkSet,
    ) -> Result<&mut Self, ModelError> {
        self.step(Step::InsertText {
            pos,
            text: text.to_string(),
            marks,
        })
    }

    pub fn delete_range(&mut self, from: usize, to: usize) -> Result<&mut Self, ModelError> {
        self.step(Step::DeleteRange { from, to })
    }

    pub fn add_mark(&mut self, from: usize, to: usize, mark: Mark) -> Result<&mut Self, ModelError> {
        self.step(Step::AddMark { from, to, mark })
    }

    pub fn remove_mark(
        &mut self,
        from: usize,
        to: usize,
        mark_type: &str,
    ) -> Result<&mut Self, ModelError> {
        self.step(Step::RemoveMark {
            from,
            to,
            mark_type: mark_type.to_string(),
        })
    }

    pub fn set_node_attrs(&mut self, pos: usize, attrs: Attrs) -> Result<&mut Self, ModelError> {
        self.step(Step::SetNodeAttrs { pos, attrs })
    }

    pub fn set_block_type(
        &mut self,
        pos: usize,
        node_type: &str,
        attrs: Attrs,
    ) -> Result<&mut Self, ModelError> {
        self.step(Step::SetBlockType {
            pos,
            node_type: node_type.to_string(),
            attrs,
        })
    }

    pub fn wrap_in(
        &mut self,
        from: usize,
        to: usize,
        node_type: &str,
        attrs: Attrs,
    ) -> Result<&mut Self, ModelError> {
        self.step(Step::Wrap {
            from,
            to,
            node_type: node_type.to_string(),
            attrs,
        })
    }

    pub fn unwrap(&mut self, pos: usize) -> Result<&mut Self, ModelError> {
        self.step(Step::Unwrap { pos })
    }

    pub fn replace(&mut self, from: usize, to: usize, slice: Slice) -> Result<&mut Self, ModelError> {
        self.step(Step::Replace { from, to, slice })
    }

    /// Replace `from..to` with whole nodes.
    pub fn replace_range(
        &mut self,
        from: usize,
        to: usize,
        nodes: impl IntoIterator<Item = Node>,
    ) -> Result<&mut Self, ModelError> {
        self.replace(from, to, Slice::new(Fragment::from_nodes(nodes), 0, 0))
    }

    pub fn insert_nodes(
        &mut self,
        pos: usize,
        nodes: impl IntoIterator<Item = Node>,
    ) -> Result<&mut Self, ModelError> {
        self.replace_range(pos, pos, nodes)
    }

    /// Split the `depth` innermost ancestors of `pos` in two. Each entry of
    /// `types_after` (outermost level first) may give the type and attrs of
    /// the node created after the split; missing entries copy the split
    /// node.
    pub fn split(
        &mut self,
        pos: usize,
        depth: usize,
        types_after: &[Option<(String, Attrs)>],
    ) -> Result<&mut Self, ModelError> {
        let rp = self.doc.resolve(pos)?;
        if depth == 0 || depth > rp.depth() {
            return Err(ModelError::precondition(format!(
                "cannot split {depth} levels at {pos}"
            )));
        }
        let mut before = Fragment::empty();
        let mut after = Fragment::empty();
        for (i, d) in (rp.depth() + 1 - depth..=rp.depth()).rev().enumerate() {
            let level = depth - 1 - i;
            let node = rp.node(d);
            before = Fragment::from_node(node.copy(before));
            let next = match types_after.get(level) {
                Some(Some((node_type, attrs))) => {
                    let declared = &self
                        .schema
                        .node_type(node_type)
                        .ok_or_else(|| ModelError::construction(node_type, "unknown node type"))?
                        .spec()
                        .attrs;
                    let attrs = self.schema.compute_attrs(node_type, declared, attrs.clone())?;
                    Node::container(node_type.as_str(), attrs, after)
                }
                _ => node.copy(after),
            };
            after = Fragment::from_node(next);
        }
        let slice = Slice::new(before.append(&after), depth, depth);
        self.replace(pos, pos, slice)
    }

    /// Set the selection the resulting state will have.
    pub fn set_selection(&mut self, selection: Selection) -> Result<&mut Self, ModelError> {
        let size = self.doc.content_size();
        if selection.anchor > size || selection.head > size {
            return Err(ModelError::PositionOutOfRange {
                pos: selection.anchor.max(selection.head),
                size,
            });
        }
        self.selection = Some(selection);
        self.stored_marks = Some(None);
        Ok(self)
    }

    /// Marks applied to the next typed text. `None` clears them.
    pub fn set_stored_marks(&mut self, marks: Option<MarkSet>) -> &mut Self {
        self.stored_marks = Some(marks);
        self
    }

    pub fn set_add_to_history(&mut self, add: bool) -> &mut Self {
        self.add_to_history = add;
        self
    }

    pub fn add_to_history(&self) -> bool {
        self.add_to_history
    }

    /// The selection the resulting state will have: the explicit one, or the
    /// starting selection clamped into the running document.
    pub fn selection(&self) -> Selection {
        self.selection
            .unwrap_or_else(|| self.base_selection.clamp(self.doc.content_size()))
    }

    pub fn explicit_selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Whether this transaction sets (or clears) the stored marks.
    pub fn stored_marks_set(&self) -> bool {
        self.stored_marks.is_some()
    }

    /// The stored marks the resulting state will have.
    pub fn stored_marks(&self) -> Option<&MarkSet> {
        match &self.stored_marks {
            Some(marks) => marks.as_ref(),
            None => self.base_stored_marks.as_ref(),
        }
    }
}
