use std::fmt;

use crate::error::ModelError;
use crate::schema::Schema;

use super::mark::MarkSet;
use super::node::Node;

/// A position resolved against a document: the chain of ancestors that
/// contain it and the offset into the innermost one.
///
/// Depth 0 is the document itself. A position on the boundary between two
/// children belongs to their parent; the child starting there is
/// [`ResolvedPos::node_after`].
#[derive(Clone)]
pub struct ResolvedPos {
    pos: usize,
    path: Vec<PathEntry>,
    parent_offset: usize,
}

#[derive(Clone)]
struct PathEntry {
    node: Node,
    index: usize,
    // absolute position where the child at `index` starts
    offset: usize,
}

impl ResolvedPos {
    pub(crate) fn resolve(doc: &Node, pos: usize) -> Result<Self, ModelError> {
        if pos > doc.content_size() {
            return Err(ModelError::PositionOutOfRange {
                pos,
                size: doc.content_size(),
            });
        }
        let mut path = Vec::new();
        let mut start = 0;
        let mut parent_offset = pos;
        let mut node = doc.clone();
        loop {
            let (index, offset) = node.content().find_index(parent_offset, -1)?;
            let rem = parent_offset - offset;
            path.push(PathEntry {
                node: node.clone(),
                index,
                offset: start + offset,
            });
            if rem == 0 {
                break;
            }
            let child = node.child(index).clone();
            if child.is_text() {
                break;
            }
            parent_offset = rem - 1;
            start += offset + 1;
            node = child;
        }
        Ok(Self {
            pos,
            path,
            parent_offset,
        })
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn depth(&self) -> usize {
        self.path.len() - 1
    }

    pub fn parent_offset(&self) -> usize {
        self.parent_offset
    }

    pub fn node(&self, depth: usize) -> &Node {
        &self.path[depth].node
    }

    pub fn parent(&self) -> &Node {
        self.node(self.depth())
    }

    pub fn doc(&self) -> &Node {
        self.node(0)
    }

    /// Index into the ancestor at `depth` of the child on the path.
    pub fn index(&self, depth: usize) -> usize {
        self.path[depth].index
    }

    /// Like [`index`](Self::index), but pointing past the child when the
    /// position is inside it rather than before it.
    pub fn index_after(&self, depth: usize) -> usize {
        let inside = depth < self.depth() || self.text_offset() > 0;
        self.index(depth) + usize::from(inside)
    }

    /// Position where the content of the ancestor at `depth` starts.
    pub fn start(&self, depth: usize) -> usize {
        if depth == 0 {
            0
        } else {
            self.path[depth - 1].offset + 1
        }
    }

    pub fn end(&self, depth: usize) -> usize {
        self.start(depth) + self.node(depth).content_size()
    }

    /// Position directly before the ancestor at `depth` (which must be >= 1).
    pub fn before(&self, depth: usize) -> usize {
        debug_assert!(depth >= 1, "the document has no position before it");
        if depth == self.depth() + 1 {
            self.pos
        } else {
            self.path[depth - 1].offset
        }
    }

    /// Position directly after the ancestor at `depth` (which must be >= 1).
    pub fn after(&self, depth: usize) -> usize {
        debug_assert!(depth >= 1, "the document has no position after it");
        if depth == self.depth() + 1 {
            self.pos
        } else {
            self.path[depth - 1].offset + self.node(depth).node_size()
        }
    }

    /// Offset into the text node the position points into, 0 on a boundary.
    pub fn text_offset(&self) -> usize {
        self.pos - self.path[self.depth()].offset
    }

    pub fn node_after(&self) -> Option<Node> {
        let parent = self.parent();
        let index = self.index(self.depth());
        let child = parent.maybe_child(index)?;
        let offset = self.text_offset();
        if offset > 0 {
            Some(child.cut_text(offset, child.text_len()))
        } else {
            Some(child.clone())
        }
    }

    pub fn node_before(&self) -> Option<Node> {
        let index = self.index(self.depth());
        let offset = self.text_offset();
        if offset > 0 {
            return Some(self.parent().child(index).cut_text(0, offset));
        }
        if index == 0 {
            None
        } else {
            Some(self.parent().child(index - 1).clone())
        }
    }

    /// The deepest depth whose content contains both this position and `pos`.
    pub fn shared_depth(&self, pos: usize) -> usize {
        (1..=self.depth())
            .rev()
            .find(|&d| self.start(d) <= pos && self.end(d) >= pos)
            .unwrap_or(0)
    }

    /// Marks that text inserted here would get: those of the text before
    /// the position (after, at the start of a block), minus non-inclusive
    /// marks that do not continue on the other side.
    pub fn marks(&self, schema: &Schema) -> MarkSet {
        let parent = self.parent();
        let index = self.index(self.depth());
        if parent.content_size() == 0 {
            return MarkSet::empty();
        }
        if self.text_offset() > 0 {
            return parent.child(index).marks().clone();
        }
        let before = index.checked_sub(1).and_then(|i| parent.maybe_child(i));
        let after = parent.maybe_child(index);
        let (main, other) = match before {
            Some(before) => (Some(before), after),
            None => (after, None),
        };
        let Some(main) = main else {
            return MarkSet::empty();
        };
        let mut marks = main.marks().clone();
        for mark in main.marks() {
            let inclusive = schema
                .mark_type(mark.mark_type())
                .is_none_or(|t| t.spec().inclusive);
            if !inclusive && other.is_none_or(|o| !o.marks().contains(mark)) {
                marks = marks.without_type(mark.mark_type());
            }
        }
        marks
    }

    /// The range of sibling blocks around this position and `other`: the
    /// deepest ancestor whose content covers both, skipping inline parents.
    pub fn block_range(&self, other: &ResolvedPos, schema: &Schema) -> Option<NodeRange> {
        if other.pos < self.pos {
            return other.block_range(self, schema);
        }
        let skip_parent =
            schema.is_textblock(self.parent().node_type()) || self.pos == other.pos;
        let top = if skip_parent {
            self.depth().checked_sub(1)?
        } else {
            self.depth()
        };
        (0..=top)
            .rev()
            .find(|&d| other.pos <= self.end(d))
            .map(|depth| NodeRange {
                from: self.clone(),
                to: other.clone(),
                depth,
            })
    }
}

impl fmt::Debug for ResolvedPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pos)?;
        for entry in &self.path[1..] {
            write!(f, "/{}", entry.node.node_type())?;
        }
        write!(f, ":{}", self.parent_offset)
    }
}

/// A flat range of siblings inside the node at `depth`.
#[derive(Debug, Clone)]
pub struct NodeRange {
    from: ResolvedPos,
    to: ResolvedPos,
    depth: usize,
}

impl NodeRange {
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn parent(&self) -> &Node {
        self.from.node(self.depth)
    }

    pub fn start(&self) -> usize {
        self.from.before(self.depth + 1)
    }

    pub fn end(&self) -> usize {
        self.to.after(self.depth + 1)
    }

    pub fn start_index(&self) -> usize {
        self.from.index(self.depth)
    }

    pub fn end_index(&self) -> usize {
        self.to.index_after(self.depth)
    }

    pub fn from(&self) -> &ResolvedPos {
        &self.from
    }

    pub fn to(&self) -> &ResolvedPos {
        &self.to
    }
}
