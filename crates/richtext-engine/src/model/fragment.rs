use std::fmt;

use crate::error::ModelError;

use super::node::Node;

/// An ordered list of sibling nodes with its total size cached.
///
/// Fragments are kept in canonical form: no empty text nodes, and no two
/// adjacent text nodes carrying the same marks.
#[derive(Clone, PartialEq, Default)]
pub struct Fragment {
    nodes: Vec<Node>,
    size: usize,
}

pub(crate) static EMPTY_FRAGMENT: Fragment = Fragment {
    nodes: Vec::new(),
    size: 0,
};

impl Fragment {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_node(node: Node) -> Self {
        Self::from_nodes([node])
    }

    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        let mut merged = Vec::new();
        for node in nodes {
            push_merging(&mut merged, node);
        }
        Self::from_canonical(merged)
    }

    fn from_canonical(nodes: Vec<Node>) -> Self {
        let size = nodes.iter().map(Node::node_size).sum();
        Self { nodes, size }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn child_count(&self) -> usize {
        self.nodes.len()
    }

    /// The child at `index`. Panics when out of bounds, like slice indexing.
    pub fn child(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    pub fn maybe_child(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.nodes.last()
    }

    pub fn children(&self) -> &[Node] {
        &self.nodes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.nodes.iter()
    }

    /// Concatenate two fragments, merging text across the seam.
    pub fn append(&self, other: &Fragment) -> Fragment {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut nodes = self.nodes.clone();
        for node in other.iter() {
            push_merging(&mut nodes, node.clone());
        }
        Self::from_canonical(nodes)
    }

    /// The part of this fragment between two offsets, cutting through
    /// children that straddle either offset.
    pub fn cut(&self, from: usize, to: usize) -> Fragment {
        if from == 0 && to == self.size {
            return self.clone();
        }
        let mut result = Vec::new();
        if to > from {
            let mut pos = 0;
            for child in &self.nodes {
                if pos >= to {
                    break;
                }
                let end = pos + child.node_size();
                if end > from {
                    let piece = if pos < from || end > to {
                        if child.is_text() {
                            child.cut_text(from.saturating_sub(pos), (to - pos).min(child.text_len()))
                        } else {
                            child.cut(
                                from.saturating_sub(pos + 1),
                                (to - pos - 1).min(child.content_size()),
                            )
                        }
                    } else {
                        child.clone()
                    };
                    result.push(piece);
                }
                pos = end;
            }
        }
        Self::from_canonical(result)
    }

    /// A copy with the child at `index` replaced. Every other child is shared.
    pub fn replace_child(&self, index: usize, node: Node) -> Fragment {
        let mut nodes = self.nodes.clone();
        let old = std::mem::replace(&mut nodes[index], node);
        let size = self.size - old.node_size() + nodes[index].node_size();
        Self { nodes, size }
    }

    /// Find the child index containing `pos` and the offset where that child
    /// starts. `round > 0` rounds a position inside a child up to the next
    /// boundary.
    pub fn find_index(&self, pos: usize, round: i8) -> Result<(usize, usize), ModelError> {
        if pos == 0 {
            return Ok((0, 0));
        }
        if pos == self.size {
            return Ok((self.nodes.len(), pos));
        }
        if pos > self.size {
            return Err(ModelError::PositionOutOfRange {
                pos,
                size: self.size,
            });
        }
        let mut cur = 0;
        for (i, child) in self.nodes.iter().enumerate() {
            let end = cur + child.node_size();
            if end >= pos {
                if end == pos || round > 0 {
                    return Ok((i + 1, end));
                }
                return Ok((i, cur));
            }
            cur = end;
        }
        Err(ModelError::PositionOutOfRange {
            pos,
            size: self.size,
        })
    }

    /// Visit every node overlapping `from..to`, descending into a node's
    /// children only when the callback returns `true`. The callback receives
    /// the node, its absolute start position, its parent and its index.
    pub(crate) fn nodes_between<F>(
        &self,
        from: usize,
        to: usize,
        f: &mut F,
        node_start: usize,
        parent: &Node,
    ) where
        F: FnMut(&Node, usize, &Node, usize) -> bool,
    {
        let mut pos = 0;
        for (i, child) in self.nodes.iter().enumerate() {
            if pos >= to {
                break;
            }
            let end = pos + child.node_size();
            if end > from && f(child, node_start + pos, parent, i) && child.content_size() > 0 {
                let start = pos + 1;
                child.content().nodes_between(
                    from.saturating_sub(start),
                    child.content_size().min(to - start),
                    f,
                    node_start + start,
                    child,
                );
            }
            pos = end;
        }
    }

    pub(crate) fn text_between(&self, from: usize, to: usize, out: &mut String) {
        let mut pos = 0;
        for child in &self.nodes {
            if pos >= to {
                break;
            }
            let end = pos + child.node_size();
            if end > from {
                if let Some(text) = child.text() {
                    let start = from.saturating_sub(pos);
                    let stop = (to - pos).min(child.text_len());
                    out.extend(text.chars().skip(start).take(stop - start));
                } else if child.content_size() > 0 {
                    let start = pos + 1;
                    child.content().text_between(
                        from.saturating_sub(start),
                        child.content_size().min(to.saturating_sub(start)),
                        out,
                    );
                }
            }
            pos = end;
        }
    }

    /// First position, counting from `pos`, at which `self` and `other`
    /// differ. `None` when they are equal.
    pub fn find_diff_start(&self, other: &Fragment, mut pos: usize) -> Option<usize> {
        for i in 0.. {
            let (Some(a), Some(b)) = (self.maybe_child(i), other.maybe_child(i)) else {
                return (self.child_count() != other.child_count()).then_some(pos);
            };
            if a.ptr_eq(b) || a == b {
                pos += a.node_size();
                continue;
            }
            if !a.same_markup(b) {
                return Some(pos);
            }
            if let (Some(ta), Some(tb)) = (a.text(), b.text()) {
                let same = ta.chars().zip(tb.chars()).take_while(|(x, y)| x == y).count();
                return Some(pos + same);
            }
            if let Some(inner) = a.content().find_diff_start(b.content(), pos + 1) {
                return Some(inner);
            }
            pos += a.node_size();
        }
        None
    }

    /// Last positions in `self` and `other` (ending at `pos_a` and `pos_b`)
    /// after which both are equal. `None` when they are equal.
    pub fn find_diff_end(
        &self,
        other: &Fragment,
        mut pos_a: usize,
        mut pos_b: usize,
    ) -> Option<(usize, usize)> {
        let (mut ia, mut ib) = (self.child_count(), other.child_count());
        loop {
            if ia == 0 || ib == 0 {
                return (ia != ib).then_some((pos_a, pos_b));
            }
            ia -= 1;
            ib -= 1;
            let (a, b) = (self.child(ia), other.child(ib));
            let size = a.node_size();
            if a.ptr_eq(b) || a == b {
                pos_a -= size;
                pos_b -= size;
                continue;
            }
            if !a.same_markup(b) {
                return Some((pos_a, pos_b));
            }
            if let (Some(ta), Some(tb)) = (a.text(), b.text()) {
                let same = ta
                    .chars()
                    .rev()
                    .zip(tb.chars().rev())
                    .take_while(|(x, y)| x == y)
                    .count();
                return Some((pos_a - same, pos_b - same));
            }
            if let Some(inner) = a.content().find_diff_end(b.content(), pos_a - 1, pos_b - 1) {
                return Some(inner);
            }
            pos_a -= size;
            pos_b -= b.node_size();
        }
    }
}

/// Push `node` onto a child list, dropping empty text and merging it into a
/// preceding text node with identical marks.
pub(crate) fn push_merging(nodes: &mut Vec<Node>, node: Node) {
    if node.is_text() && node.text_len() == 0 {
        return;
    }
    if let Some(last) = nodes.last_mut()
        && last.is_text()
        && node.is_text()
        && last.marks() == node.marks()
    {
        let mut text = last.text().unwrap_or_default().to_string();
        text.push_str(node.text().unwrap_or_default());
        *last = last.with_text(text);
        return;
    }
    nodes.push(node);
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<")?;
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{node}")?;
        }
        f.write_str(">")
    }
}

impl<'a> IntoIterator for &'a Fragment {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
