use std::fmt;

use crate::error::ModelError;
use crate::model::replace::{replace, replace_in_ancestors};
use crate::model::{Attrs, Fragment, Mark, MarkSet, Node, Slice};
use crate::schema::Schema;

use super::map::{MapRange, StepMap};
use super::structure;

/// An atomic edit of a document. Applying a step either produces a new,
/// schema-valid document together with a map of how positions moved, or
/// fails without producing anything.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    InsertText {
        pos: usize,
        text: String,
        marks: MarkSet,
    },
    DeleteRange {
        from: usize,
        to: usize,
    },
    AddMark {
        from: usize,
        to: usize,
        mark: Mark,
    },
    RemoveMark {
        from: usize,
        to: usize,
        mark_type: String,
    },
    SetNodeAttrs {
        pos: usize,
        attrs: Attrs,
    },
    SetBlockType {
        pos: usize,
        node_type: String,
        attrs: Attrs,
    },
    Wrap {
        from: usize,
        to: usize,
        node_type: String,
        attrs: Attrs,
    },
    Unwrap {
        pos: usize,
    },
    Replace {
        from: usize,
        to: usize,
        slice: Slice,
    },
}

/// The outcome of a successful step.
#[derive(Debug, Clone)]
pub struct StepResult {
    pub doc: Node,
    pub map: StepMap,
}

impl StepResult {
    fn unchanged(doc: &Node) -> Self {
        Self {
            doc: doc.clone(),
            map: StepMap::identity(),
        }
    }
}

impl Step {
    pub fn apply(&self, doc: &Node, schema: &Schema) -> Result<StepResult, ModelError> {
        match self {
            Step::InsertText { pos, text, marks } => insert_text(doc, schema, *pos, text, marks),
            Step::DeleteRange { from, to } => delete_range(doc, schema, *from, *to),
            Step::AddMark { from, to, mark } => {
                if schema.mark_type(mark.mark_type()).is_none() {
                    return Err(ModelError::construction(mark.mark_type(), "unknown mark type"));
                }
                map_marks(doc, *from, *to, &mut |marks, parent| {
                    if schema.allows_mark(parent, mark.mark_type()) {
                        schema.add_mark_to_set(marks, mark.clone())
                    } else {
                        marks.clone()
                    }
                })
            }
            Step::RemoveMark {
                from,
                to,
                mark_type,
            } => map_marks(doc, *from, *to, &mut |marks, _| marks.without_type(mark_type)),
            Step::SetNodeAttrs { pos, attrs } => set_node_attrs(doc, schema, *pos, attrs),
            Step::SetBlockType {
                pos,
                node_type,
                attrs,
            } => structure::set_block_type(doc, schema, *pos, node_type, attrs),
            Step::Wrap {
                from,
                to,
                node_type,
                attrs,
            } => structure::wrap(doc, schema, *from, *to, node_type, attrs),
            Step::Unwrap { pos } => structure::unwrap(doc, schema, *pos),
            Step::Replace { from, to, slice } => {
                check_range(doc, *from, *to)?;
                let new_doc = replace(schema, &doc.resolve(*from)?, &doc.resolve(*to)?, slice)?;
                Ok(StepResult {
                    doc: new_doc,
                    map: StepMap::single(*from, to - from, slice.size()),
                })
            }
        }
    }

    /// The step that takes the document this step produces from `before`
    /// back to `before`: the region that changed is replaced by the slice
    /// of `before` it came from.
    pub fn invert(&self, before: &Node, schema: &Schema) -> Result<Step, ModelError> {
        let after = self.apply(before, schema)?.doc;
        Ok(match structure::changed_region(before, &after) {
            Some((start, end_before, end_after)) => Step::Replace {
                from: start,
                to: end_after,
                slice: before.slice(start, end_before)?,
            },
            None => Step::Replace {
                from: 0,
                to: 0,
                slice: Slice::empty(),
            },
        })
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::InsertText { pos, text, .. } => write!(f, "insert {text:?} at {pos}"),
            Step::DeleteRange { from, to } => write!(f, "delete {from}..{to}"),
            Step::AddMark { from, to, mark } => write!(f, "add {mark} to {from}..{to}"),
            Step::RemoveMark {
                from,
                to,
                mark_type,
            } => write!(f, "remove {mark_type} from {from}..{to}"),
            Step::SetNodeAttrs { pos, .. } => write!(f, "set attrs at {pos}"),
            Step::SetBlockType { pos, node_type, .. } => write!(f, "set type {node_type} at {pos}"),
            Step::Wrap {
                from,
                to,
                node_type,
                ..
            } => write!(f, "wrap {from}..{to} in {node_type}"),
            Step::Unwrap { pos } => write!(f, "unwrap at {pos}"),
            Step::Replace { from, to, slice } => {
                write!(f, "replace {from}..{to} with {:?}", slice.content())
            }
        }
    }
}

pub(crate) fn check_range(doc: &Node, from: usize, to: usize) -> Result<(), ModelError> {
    let size = doc.content_size();
    if to > size {
        return Err(ModelError::PositionOutOfRange { pos: to, size });
    }
    if from > to {
        return Err(ModelError::precondition(format!(
            "range {from}..{to} is inverted"
        )));
    }
    Ok(())
}

fn insert_text(
    doc: &Node,
    schema: &Schema,
    pos: usize,
    text: &str,
    marks: &MarkSet,
) -> Result<StepResult, ModelError> {
    let rp = doc.resolve(pos)?;
    if text.is_empty() {
        return Ok(StepResult::unchanged(doc));
    }
    let parent = rp.parent();
    let accepts_text = schema
        .node_type(parent.node_type())
        .is_some_and(|t| t.accepts(crate::model::TEXT_TYPE));
    if !accepts_text {
        return Err(ModelError::precondition(format!(
            "position {pos} is inside `{}`, which does not hold text",
            parent.node_type()
        )));
    }
    // marks the parent does not allow are dropped rather than rejected
    let allowed: MarkSet = marks
        .iter()
        .filter(|m| schema.allows_mark(parent.node_type(), m.mark_type()))
        .cloned()
        .collect();
    let node = Node::new_text(text, allowed);
    let len = node.text_len();
    let slice = Slice::new(Fragment::from_node(node), 0, 0);
    let new_doc = replace(schema, &rp, &rp, &slice)?;
    Ok(StepResult {
        doc: new_doc,
        map: StepMap::single(pos, 0, len),
    })
}

/// Delete `from..to`. Ends at the same depth are stitched together the way
/// a replace with an empty slice does it; when that is not possible (or
/// the depths differ) the cut nodes are closed on both sides instead,
/// joining two textblocks when their content fits together.
fn delete_range(
    doc: &Node,
    schema: &Schema,
    from: usize,
    to: usize,
) -> Result<StepResult, ModelError> {
    check_range(doc, from, to)?;
    if from == to {
        return Ok(StepResult::unchanged(doc));
    }
    let rfrom = doc.resolve(from)?;
    let rto = doc.resolve(to)?;
    let same_textblock = rfrom.depth() == rto.depth()
        && rfrom.start(rfrom.depth()) == rto.start(rto.depth())
        && schema.is_textblock(rfrom.parent().node_type());
    if rfrom.depth() == rto.depth() {
        match replace(schema, &rfrom, &rto, &Slice::empty()) {
            Ok(new_doc) => {
                return Ok(StepResult {
                    doc: new_doc,
                    map: StepMap::single(from, to - from, 0),
                });
            }
            Err(err) if same_textblock => return Err(err),
            Err(err) => log::trace!("delete {from}..{to} cannot stitch ({err}), closing instead"),
        }
    }
    let textblocks = schema.is_textblock(rfrom.parent().node_type())
        && schema.is_textblock(rto.parent().node_type());
    if textblocks {
        match structure::delete_across(doc, schema, &rfrom, &rto, true) {
            Ok(result) => return Ok(result),
            Err(err) => log::trace!("delete {from}..{to} cannot join ({err})"),
        }
    }
    structure::delete_across(doc, schema, &rfrom, &rto, false)
}

/// Rebuild every text node overlapping `from..to`, splitting text at the
/// range boundaries and replacing the marks of the covered part.
fn map_marks(
    doc: &Node,
    from: usize,
    to: usize,
    f: &mut dyn FnMut(&MarkSet, &str) -> MarkSet,
) -> Result<StepResult, ModelError> {
    check_range(doc, from, to)?;
    if from == to {
        return Ok(StepResult::unchanged(doc));
    }
    Ok(StepResult {
        doc: map_marks_in(doc, 0, from, to, f),
        map: StepMap::identity(),
    })
}

fn map_marks_in(
    node: &Node,
    content_start: usize,
    from: usize,
    to: usize,
    f: &mut dyn FnMut(&MarkSet, &str) -> MarkSet,
) -> Node {
    let mut children = Vec::with_capacity(node.child_count());
    let mut pos = content_start;
    for child in node.children() {
        let end = pos + child.node_size();
        if end <= from || pos >= to {
            children.push(child.clone());
        } else if child.is_text() {
            let len = child.text_len();
            let cut_from = from.saturating_sub(pos);
            let cut_to = (to - pos).min(len);
            if cut_from > 0 {
                children.push(child.cut_text(0, cut_from));
            }
            let middle = child.cut_text(cut_from, cut_to);
            let marks = f(middle.marks(), node.node_type());
            children.push(middle.with_marks(marks));
            if cut_to < len {
                children.push(child.cut_text(cut_to, len));
            }
        } else if child.is_container() {
            children.push(map_marks_in(child, pos + 1, from, to, f));
        } else {
            children.push(child.clone());
        }
        pos = end;
    }
    node.copy(Fragment::from_nodes(children))
}

fn set_node_attrs(
    doc: &Node,
    schema: &Schema,
    pos: usize,
    patch: &Attrs,
) -> Result<StepResult, ModelError> {
    let rp = doc.resolve(pos)?;
    let node = match rp.node_after() {
        Some(node) if rp.text_offset() == 0 && !node.is_text() => node,
        _ => {
            return Err(ModelError::precondition(format!(
                "no node starts at position {pos}"
            )));
        }
    };
    let declared = &schema
        .node_type(node.node_type())
        .ok_or_else(|| ModelError::construction(node.node_type(), "unknown node type"))?
        .spec()
        .attrs;
    let mut attrs = node.attrs().clone();
    for (key, value) in patch {
        if !declared.contains_key(key) {
            return Err(ModelError::construction(
                node.node_type(),
                format!("unknown attribute `{key}`"),
            ));
        }
        attrs.insert(key.clone(), value.clone());
    }
    let depth = rp.depth();
    let parent = rp.parent();
    let updated = parent.copy(
        parent
            .content()
            .replace_child(rp.index(depth), node.with_attrs(attrs)),
    );
    Ok(StepResult {
        doc: replace_in_ancestors(&rp, depth, updated),
        map: StepMap::identity(),
    })
}

/// Map for a step that swaps the content of the node at `pos`.
pub(crate) fn content_swap_map(pos: usize, old_size: usize, new_size: usize) -> StepMap {
    if old_size == new_size {
        StepMap::identity()
    } else {
        StepMap::new([MapRange {
            start: pos + 1,
            old_size,
            new_size,
        }])
    }
}
