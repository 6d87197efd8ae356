//! Steps that change the block structure: joining textblocks across
//! container boundaries, retyping a node, and adding or removing a
//! wrapping container.

use crate::error::ModelError;
use crate::model::replace::{close, replace_in_ancestors};
use crate::model::{Attrs, Fragment, Node, ResolvedPos, TEXT_TYPE};
use crate::schema::Schema;

use super::map::{MapRange, StepMap};
use super::step::{StepResult, check_range, content_swap_map};

/// Delete `from..to` when the two ends sit in different nodes, keeping the
/// part of every cut node outside the range. With `join` the rest of the
/// textblock at `to` moves into the textblock at `from`. Cut containers
/// left without content are dropped, and a container that must not be
/// empty is filled again.
pub(crate) fn delete_across(
    doc: &Node,
    schema: &Schema,
    from: &ResolvedPos,
    to: &ResolvedPos,
    join: bool,
) -> Result<StepResult, ModelError> {
    let shared = from.shared_depth(to.pos());
    let tail = join.then(|| {
        let block = to.parent();
        block.content().cut(to.parent_offset(), block.content_size())
    });

    let shared_node = from.node(shared);
    let mut children: Vec<Node> = shared_node.children()[..from.index(shared)].to_vec();
    let mut after = to.index(shared);
    if from.depth() > shared {
        children.extend(cut_left(schema, from, shared + 1, tail.as_ref())?);
    }
    if to.depth() > shared {
        children.extend(cut_right(schema, to, shared + 1, join)?);
        after += 1;
    }
    children.extend_from_slice(&shared_node.children()[after..]);
    let rebuilt = match close_or_drop(schema, shared_node, children)? {
        Some(node) => node,
        None => schema
            .create_and_fill(shared_node.node_type())
            .ok_or_else(|| ModelError::precondition("deleted content cannot be refilled"))?,
    };
    let new_doc = replace_in_ancestors(from, shared, rebuilt);
    Ok(StepResult {
        map: changed_region_map(doc, &new_doc),
        doc: new_doc,
    })
}

/// The part of the node at `depth` on the path to `from` that lies before
/// `from`, with `tail` appended to the innermost textblock.
fn cut_left(
    schema: &Schema,
    from: &ResolvedPos,
    depth: usize,
    tail: Option<&Fragment>,
) -> Result<Option<Node>, ModelError> {
    let node = from.node(depth);
    if depth == from.depth() {
        let mut content = node.content().cut(0, from.parent_offset());
        if let Some(tail) = tail {
            content = content.append(tail);
        }
        return close_or_drop(schema, node, content.children().to_vec());
    }
    let mut children = node.children()[..from.index(depth)].to_vec();
    children.extend(cut_left(schema, from, depth + 1, tail)?);
    close_or_drop(schema, node, children)
}

/// The part of the node at `depth` on the path to `to` that lies after
/// `to`. A joined textblock is gone entirely.
fn cut_right(
    schema: &Schema,
    to: &ResolvedPos,
    depth: usize,
    joined: bool,
) -> Result<Option<Node>, ModelError> {
    let node = to.node(depth);
    if depth == to.depth() {
        if joined {
            return Ok(None);
        }
        let content = node.content().cut(to.parent_offset(), node.content_size());
        return close_or_drop(schema, node, content.children().to_vec());
    }
    let mut children = Vec::new();
    children.extend(cut_right(schema, to, depth + 1, joined)?);
    children.extend_from_slice(&node.children()[to.index(depth) + 1..]);
    close_or_drop(schema, node, children)
}

/// Rebuild `node` around `children`. Textblocks are kept even when empty,
/// other containers with nothing left are dropped (`None`), and content
/// missing its required first block gets an empty default textblock.
fn close_or_drop(
    schema: &Schema,
    node: &Node,
    children: Vec<Node>,
) -> Result<Option<Node>, ModelError> {
    if schema.valid_content(node.node_type(), &children) {
        return Ok(Some(node.copy(Fragment::from_nodes(children))));
    }
    if children.is_empty() {
        return Ok(None);
    }
    let filler = schema
        .default_textblock()
        .and_then(|name| schema.create_and_fill(name));
    if let Some(filler) = filler {
        let mut filled = vec![filler];
        filled.extend_from_slice(&children);
        if schema.valid_content(node.node_type(), &filled) {
            return Ok(Some(node.copy(Fragment::from_nodes(filled))));
        }
    }
    close(schema, node, Fragment::from_nodes(children)).map(Some)
}

/// Map for a step that turned `before` into `after`, covering the region
/// between the first and last positions where they differ.
pub(crate) fn changed_region_map(before: &Node, after: &Node) -> StepMap {
    match changed_region(before, after) {
        Some((start, end_before, end_after)) => {
            StepMap::single(start, end_before - start, end_after - start)
        }
        None => StepMap::identity(),
    }
}

/// `(start, end_before, end_after)`: everything before `start` and after
/// the two ends is the same in both documents.
pub(crate) fn changed_region(before: &Node, after: &Node) -> Option<(usize, usize, usize)> {
    let start = before.content().find_diff_start(after.content(), 0)?;
    let (mut end_before, mut end_after) = before.content().find_diff_end(
        after.content(),
        before.content_size(),
        after.content_size(),
    )?;
    // repeated content can make the two scans overlap
    let overlap = start.saturating_sub(end_before.min(end_after));
    end_before += overlap;
    end_after += overlap;
    Some((start, end_before, end_after))
}

fn node_starting_at(rp: &ResolvedPos) -> Result<Node, ModelError> {
    match rp.node_after() {
        Some(node) if rp.text_offset() == 0 && !node.is_text() => Ok(node),
        _ => Err(ModelError::precondition(format!(
            "no node starts at position {}",
            rp.pos()
        ))),
    }
}

/// Keep the children a node of `node_type` accepts: marks it does not allow
/// are stripped, hard breaks become newlines where only text is allowed,
/// and anything else it cannot hold is dropped.
fn coerce_children(schema: &Schema, node_type: &str, content: &Fragment) -> Vec<Node> {
    let Some(target) = schema.node_type(node_type) else {
        return Vec::new();
    };
    let mut children = Vec::with_capacity(content.child_count());
    for child in content {
        if target.accepts(child.node_type()) {
            if child.is_text() {
                let marks = child
                    .marks()
                    .iter()
                    .filter(|m| target.allows_mark(m.mark_type()))
                    .cloned()
                    .collect();
                children.push(child.with_marks(marks));
            } else {
                children.push(child.clone());
            }
        } else if child.is_leaf() && schema.is_inline(child.node_type()) && target.accepts(TEXT_TYPE) {
            children.push(Node::from("\n"));
        }
    }
    children
}

/// Replace the node starting at `pos` with a node of another type holding
/// the same (coerced) children.
pub(crate) fn set_block_type(
    doc: &Node,
    schema: &Schema,
    pos: usize,
    node_type: &str,
    attrs: &Attrs,
) -> Result<StepResult, ModelError> {
    let rp = doc.resolve(pos)?;
    let node = node_starting_at(&rp)?;
    let target = schema
        .node_type(node_type)
        .ok_or_else(|| ModelError::construction(node_type, "unknown node type"))?;
    if !node.is_container() || target.content_expr().is_none() {
        return Err(ModelError::precondition(format!(
            "cannot change {} into {node_type}",
            node.node_type()
        )));
    }
    let attrs = schema.compute_attrs(node_type, &target.spec().attrs, attrs.clone())?;
    let children = coerce_children(schema, node_type, node.content());
    let content = Fragment::from_nodes(children);
    schema.check_content(node_type, content.children())?;
    let replacement = if content == *node.content() {
        node.with_type(node_type, attrs)
    } else {
        Node::container(node_type, attrs, content)
    };

    let depth = rp.depth();
    let parent = rp.parent();
    let siblings = parent.content().replace_child(rp.index(depth), replacement.clone());
    let parent = close(schema, parent, siblings)?;
    Ok(StepResult {
        doc: replace_in_ancestors(&rp, depth, parent),
        map: content_swap_map(pos, node.content_size(), replacement.content_size()),
    })
}

/// Wrap the sibling nodes between `from` and `to` in a new container.
pub(crate) fn wrap(
    doc: &Node,
    schema: &Schema,
    from: usize,
    to: usize,
    node_type: &str,
    attrs: &Attrs,
) -> Result<StepResult, ModelError> {
    check_range(doc, from, to)?;
    let rfrom = doc.resolve(from)?;
    let rto = doc.resolve(to)?;
    let depth = rfrom.depth();
    let same_parent = rto.depth() == depth && rfrom.start(depth) == rto.start(depth);
    if !same_parent || rfrom.text_offset() != 0 || rto.text_offset() != 0 {
        return Err(ModelError::precondition(format!(
            "{from}..{to} is not a range of sibling nodes"
        )));
    }
    let parent = rfrom.parent();
    if schema.is_textblock(parent.node_type()) {
        return Err(ModelError::precondition("cannot wrap inline content"));
    }
    let (start, end) = (rfrom.index(depth), rto.index(depth));
    if start >= end {
        return Err(ModelError::precondition("nothing to wrap"));
    }
    let wrapper = schema.node(node_type, attrs.clone(), parent.children()[start..end].to_vec())?;
    let mut children = parent.children()[..start].to_vec();
    children.push(wrapper);
    children.extend_from_slice(&parent.children()[end..]);
    let parent = close(schema, parent, Fragment::from_nodes(children))?;
    Ok(StepResult {
        doc: replace_in_ancestors(&rfrom, depth, parent),
        map: StepMap::new([
            MapRange {
                start: from,
                old_size: 0,
                new_size: 1,
            },
            MapRange {
                start: to,
                old_size: 0,
                new_size: 1,
            },
        ]),
    })
}

/// Replace the container starting at `pos` with its children.
pub(crate) fn unwrap(doc: &Node, schema: &Schema, pos: usize) -> Result<StepResult, ModelError> {
    let rp = doc.resolve(pos)?;
    let node = node_starting_at(&rp)?;
    if !node.is_container() || schema.is_textblock(node.node_type()) {
        return Err(ModelError::precondition(format!(
            "{} at {pos} is not a wrapping container",
            node.node_type()
        )));
    }
    let depth = rp.depth();
    let parent = rp.parent();
    let index = rp.index(depth);
    let mut children = parent.children()[..index].to_vec();
    children.extend_from_slice(node.children());
    children.extend_from_slice(&parent.children()[index + 1..]);
    let parent = close(schema, parent, Fragment::from_nodes(children))?;
    let closing = pos + node.node_size() - 1;
    Ok(StepResult {
        doc: replace_in_ancestors(&rp, depth, parent),
        map: StepMap::new([
            MapRange {
                start: pos,
                old_size: 1,
                new_size: 0,
            },
            MapRange {
                start: closing,
                old_size: 1,
                new_size: 0,
            },
        ]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::*;
    use crate::schema::basic_schema;
    use crate::transform::Assoc;
    use crate::{blockquote, code_block, doc, h, li, ol, p, ul};
    use pretty_assertions::assert_eq;

    fn schema() -> std::sync::Arc<Schema> {
        basic_schema()
    }

    // ============ set block type ============

    #[test]
    fn test_paragraph_to_heading_keeps_children() {
        let d = doc![p!("ab", strong("c"))];
        let result = set_block_type(&d, &schema(), 0, "heading", &crate::model::attrs([("level", 2)]))
            .unwrap();
        assert_eq!(result.doc, doc![h!(2; "ab", strong("c"))]);
        assert!(result.doc.child(0).child(1).ptr_eq(d.child(0).child(1)));
        assert!(result.map.is_identity());
    }

    #[test]
    fn test_to_code_block_coerces_content() {
        let d = doc![p!("a", strong("b"), hard_break(), "c")];
        let result = set_block_type(&d, &schema(), 0, "code_block", &Attrs::new()).unwrap();
        assert_eq!(result.doc, doc![code_block!("ab\nc")]);
    }

    #[test]
    fn test_inline_leaves_become_newlines_in_code() {
        let d = doc![p!("a", image("x.png"), "b")];
        let result = set_block_type(&d, &schema(), 0, "code_block", &Attrs::new()).unwrap();
        assert_eq!(result.doc, doc![code_block!("a\nb")]);
    }

    #[test]
    fn test_list_type_swap() {
        let d = doc![ul!(li!(p!("a")), li!(p!("b")))];
        let result = set_block_type(&d, &schema(), 0, "ordered_list", &Attrs::new()).unwrap();
        assert_eq!(result.doc, doc![ol!(li!(p!("a")), li!(p!("b")))]);
    }

    #[test]
    fn test_invalid_target_in_parent() {
        // a list item must start with a paragraph
        let d = doc![ul!(li!(p!("a")))];
        let err = set_block_type(&d, &schema(), 2, "heading", &Attrs::new()).unwrap_err();
        assert!(matches!(err, ModelError::SchemaViolation { .. }));
    }

    // ============ wrap / unwrap ============

    #[test]
    fn test_wrap_and_unwrap_round_trip() {
        let d = doc![p!("a"), p!("b"), p!("c")];
        let wrapped = wrap(&d, &schema(), 3, 9, "blockquote", &Attrs::new()).unwrap();
        assert_eq!(wrapped.doc, doc![p!("a"), blockquote!(p!("b"), p!("c"))]);
        assert_eq!(wrapped.map.map(4, Assoc::After), 5);
        let unwrapped = unwrap(&wrapped.doc, &schema(), 3).unwrap();
        assert_eq!(unwrapped.doc, d);
        assert_eq!(unwrapped.map.map(5, Assoc::After), 4);
    }

    #[test]
    fn test_wrap_requires_sibling_range() {
        let d = doc![p!("ab"), p!("c")];
        assert!(wrap(&d, &schema(), 1, 4, "blockquote", &Attrs::new()).is_err());
    }

    #[test]
    fn test_unwrap_textblock_fails() {
        let d = doc![p!("ab")];
        assert!(unwrap(&d, &schema(), 0).is_err());
    }
}
