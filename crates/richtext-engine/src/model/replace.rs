//! Replacing a range of a document with a slice.
//!
//! The range `from..to` is removed and the slice's content is stitched in
//! its place. Open nodes on either side of the slice are joined with the
//! nodes the range was cut through, and every container that gets rebuilt
//! is checked against its content expression.

use crate::error::ModelError;
use crate::schema::Schema;

use super::fragment::{Fragment, push_merging};
use super::node::Node;
use super::resolve::ResolvedPos;
use super::slice::Slice;

pub(crate) fn replace(
    schema: &Schema,
    from: &ResolvedPos,
    to: &ResolvedPos,
    slice: &Slice,
) -> Result<Node, ModelError> {
    if slice.open_start() > from.depth() || slice.open_end() > to.depth() {
        return Err(ModelError::precondition(
            "inserted content is deeper than the insertion point",
        ));
    }
    if from.depth() - slice.open_start() != to.depth() - slice.open_end() {
        return Err(ModelError::precondition("inconsistent open depths"));
    }
    replace_outer(schema, from, to, slice, 0)
}

fn replace_outer(
    schema: &Schema,
    from: &ResolvedPos,
    to: &ResolvedPos,
    slice: &Slice,
    depth: usize,
) -> Result<Node, ModelError> {
    let index = from.index(depth);
    let node = from.node(depth);
    if index == to.index(depth) && depth < from.depth() - slice.open_start() {
        let inner = replace_outer(schema, from, to, slice, depth + 1)?;
        Ok(node.copy(node.content().replace_child(index, inner)))
    } else if slice.content().size() == 0 {
        close(schema, node, replace_two_way(schema, from, to, depth)?)
    } else if slice.open_start() == 0
        && slice.open_end() == 0
        && from.depth() == depth
        && to.depth() == depth
    {
        let content = node.content();
        let joined = content
            .cut(0, from.parent_offset())
            .append(slice.content())
            .append(&content.cut(to.parent_offset(), content.size()));
        close(schema, node, joined)
    } else {
        let (start, end) = prepare_slice_for_replace(slice, from)?;
        close(
            schema,
            node,
            replace_three_way(schema, from, &start, &end, to, depth)?,
        )
    }
}

/// Rebuild `node` around `content`, validating it first.
pub(crate) fn close(schema: &Schema, node: &Node, content: Fragment) -> Result<Node, ModelError> {
    schema.check_content(node.node_type(), content.children())?;
    Ok(node.copy(content))
}

fn check_join(schema: &Schema, main: &Node, sub: &Node) -> Result<(), ModelError> {
    if schema.compatible_content(main.node_type(), sub.node_type()) {
        Ok(())
    } else {
        Err(ModelError::precondition(format!(
            "cannot join {} onto {}",
            sub.node_type(),
            main.node_type()
        )))
    }
}

fn joinable(
    schema: &Schema,
    before: &ResolvedPos,
    after: &ResolvedPos,
    depth: usize,
) -> Result<Node, ModelError> {
    let node = before.node(depth);
    check_join(schema, node, after.node(depth))?;
    Ok(node.clone())
}

/// Copy the children of the node at `depth` that lie between `start` and
/// `end` (either may be absent, meaning the node's start or end).
fn add_range(
    start: Option<&ResolvedPos>,
    end: Option<&ResolvedPos>,
    depth: usize,
    target: &mut Vec<Node>,
) {
    let node = match (start, end) {
        (_, Some(end)) => end.node(depth),
        (Some(start), None) => start.node(depth),
        (None, None) => return,
    };
    let mut start_index = 0;
    let end_index = end.map_or(node.child_count(), |e| e.index(depth));
    if let Some(start) = start {
        start_index = start.index(depth);
        if start.depth() > depth {
            start_index += 1;
        } else if start.text_offset() > 0 {
            if let Some(after) = start.node_after() {
                push_merging(target, after);
            }
            start_index += 1;
        }
    }
    for i in start_index..end_index {
        push_merging(target, node.child(i).clone());
    }
    if let Some(end) = end
        && end.depth() == depth
        && end.text_offset() > 0
        && let Some(before) = end.node_before()
    {
        push_merging(target, before);
    }
}

fn replace_three_way(
    schema: &Schema,
    from: &ResolvedPos,
    start: &ResolvedPos,
    end: &ResolvedPos,
    to: &ResolvedPos,
    depth: usize,
) -> Result<Fragment, ModelError> {
    let open_start = if from.depth() > depth {
        Some(joinable(schema, from, start, depth + 1)?)
    } else {
        None
    };
    let open_end = if to.depth() > depth {
        Some(joinable(schema, end, to, depth + 1)?)
    } else {
        None
    };

    let mut content = Vec::new();
    add_range(None, Some(from), depth, &mut content);
    match (&open_start, &open_end) {
        (Some(open_start), Some(open_end)) if start.index(depth) == end.index(depth) => {
            check_join(schema, open_start, open_end)?;
            let inner = replace_three_way(schema, from, start, end, to, depth + 1)?;
            push_merging(&mut content, close(schema, open_start, inner)?);
        }
        _ => {
            if let Some(open_start) = &open_start {
                let inner = replace_two_way(schema, from, start, depth + 1)?;
                push_merging(&mut content, close(schema, open_start, inner)?);
            }
            add_range(Some(start), Some(end), depth, &mut content);
            if let Some(open_end) = &open_end {
                let inner = replace_two_way(schema, end, to, depth + 1)?;
                push_merging(&mut content, close(schema, open_end, inner)?);
            }
        }
    }
    add_range(Some(to), None, depth, &mut content);
    Ok(Fragment::from_nodes(content))
}

fn replace_two_way(
    schema: &Schema,
    from: &ResolvedPos,
    to: &ResolvedPos,
    depth: usize,
) -> Result<Fragment, ModelError> {
    let mut content = Vec::new();
    add_range(None, Some(from), depth, &mut content);
    if from.depth() > depth {
        let node = joinable(schema, from, to, depth + 1)?;
        let inner = replace_two_way(schema, from, to, depth + 1)?;
        push_merging(&mut content, close(schema, &node, inner)?);
    }
    add_range(Some(to), None, depth, &mut content);
    Ok(Fragment::from_nodes(content))
}

/// Wrap the slice's content in copies of the ancestors of `along` so it can
/// be resolved at the same depths as the insertion point.
fn prepare_slice_for_replace(
    slice: &Slice,
    along: &ResolvedPos,
) -> Result<(ResolvedPos, ResolvedPos), ModelError> {
    let extra = along.depth() - slice.open_start();
    let mut node = along.node(extra).copy(slice.content().clone());
    for depth in (0..extra).rev() {
        node = along.node(depth).copy(Fragment::from_node(node));
    }
    let start = node.resolve(slice.open_start() + extra)?;
    let end = node.resolve(node.content_size() - slice.open_end() - extra)?;
    Ok((start, end))
}

/// Replace the node at `depth` on `rp`'s path with `replacement`, copying
/// every ancestor above it.
pub(crate) fn replace_in_ancestors(rp: &ResolvedPos, depth: usize, replacement: Node) -> Node {
    let mut node = replacement;
    for d in (0..depth).rev() {
        let parent = rp.node(d);
        node = parent.copy(parent.content().replace_child(rp.index(d), node));
    }
    node
}
