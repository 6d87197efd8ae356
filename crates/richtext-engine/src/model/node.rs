use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::schema::Schema;

use super::attrs::{AttrValue, Attrs, fmt_attrs};
use super::fragment::{EMPTY_FRAGMENT, Fragment};
use super::mark::MarkSet;
use super::resolve::ResolvedPos;
use super::slice::Slice;

/// Name of the node type every text node carries.
pub const TEXT_TYPE: &str = "text";

static EMPTY_MARKS: MarkSet = MarkSet::empty();

/// The three shapes a node can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Holds an ordered list of children (document, block containers, textblocks).
    Container,
    /// Has no children and occupies a single position (hard break, rule, image).
    Leaf,
    /// A run of characters sharing one set of marks.
    Text,
}

/// An immutable, reference-counted document node.
///
/// Cloning is cheap and shares the whole subtree. Editing produces new
/// nodes via [`Node::copy`] and friends, reusing untouched children.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "NodeRepr", try_from = "NodeRepr")]
pub struct Node(Arc<NodeData>);

#[derive(Debug, PartialEq)]
struct NodeData {
    node_type: String,
    attrs: Attrs,
    body: Body,
}

#[derive(Debug, PartialEq)]
enum Body {
    Container(Fragment),
    Leaf,
    Text { text: String, len: usize, marks: MarkSet },
}

impl Node {
    /// A container node. Content is not validated; see [`crate::Schema::node`].
    pub fn container(node_type: impl Into<String>, attrs: Attrs, content: Fragment) -> Node {
        Node(Arc::new(NodeData {
            node_type: node_type.into(),
            attrs,
            body: Body::Container(content),
        }))
    }

    pub fn leaf(node_type: impl Into<String>, attrs: Attrs) -> Node {
        Node(Arc::new(NodeData {
            node_type: node_type.into(),
            attrs,
            body: Body::Leaf,
        }))
    }

    /// A text node. Empty text is representable here but never survives
    /// into a fragment.
    pub fn new_text(text: impl Into<String>, marks: MarkSet) -> Node {
        let text = text.into();
        let len = text.chars().count();
        Node(Arc::new(NodeData {
            node_type: TEXT_TYPE.to_string(),
            attrs: Attrs::new(),
            body: Body::Text { text, len, marks },
        }))
    }

    pub fn node_type(&self) -> &str {
        &self.0.node_type
    }

    pub fn attrs(&self) -> &Attrs {
        &self.0.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.0.attrs.get(name)
    }

    pub fn kind(&self) -> NodeKind {
        match self.0.body {
            Body::Container(_) => NodeKind::Container,
            Body::Leaf => NodeKind::Leaf,
            Body::Text { .. } => NodeKind::Text,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.0.body, Body::Text { .. })
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.0.body, Body::Leaf)
    }

    pub fn is_container(&self) -> bool {
        matches!(self.0.body, Body::Container(_))
    }

    pub fn content(&self) -> &Fragment {
        match &self.0.body {
            Body::Container(content) => content,
            _ => &EMPTY_FRAGMENT,
        }
    }

    pub fn children(&self) -> &[Node] {
        self.content().children()
    }

    pub fn child_count(&self) -> usize {
        self.content().child_count()
    }

    pub fn child(&self, index: usize) -> &Node {
        self.content().child(index)
    }

    pub fn maybe_child(&self, index: usize) -> Option<&Node> {
        self.content().maybe_child(index)
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.content().first_child()
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.content().last_child()
    }

    pub fn text(&self) -> Option<&str> {
        match &self.0.body {
            Body::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Length of a text node in characters, 0 for anything else.
    pub fn text_len(&self) -> usize {
        match &self.0.body {
            Body::Text { len, .. } => *len,
            _ => 0,
        }
    }

    pub fn marks(&self) -> &MarkSet {
        match &self.0.body {
            Body::Text { marks, .. } => marks,
            _ => &EMPTY_MARKS,
        }
    }

    /// Size of the node in the flat position space.
    pub fn node_size(&self) -> usize {
        match &self.0.body {
            Body::Container(content) => content.size() + 2,
            Body::Leaf => 1,
            Body::Text { len, .. } => *len,
        }
    }

    /// Size of the content between the node's opening and closing tokens.
    pub fn content_size(&self) -> usize {
        match &self.0.body {
            Body::Container(content) => content.size(),
            _ => 0,
        }
    }

    /// True when both nodes have the same type, attributes and marks.
    pub fn same_markup(&self, other: &Node) -> bool {
        self.node_type() == other.node_type()
            && self.attrs() == other.attrs()
            && self.marks() == other.marks()
    }

    /// True when both handles point at the same shared subtree.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// A node of the same type and attributes holding `content`. Text and
    /// leaves have no content, so they are returned unchanged.
    pub fn copy(&self, content: Fragment) -> Node {
        match self.0.body {
            Body::Container(_) => Node::container(self.node_type(), self.attrs().clone(), content),
            _ => self.clone(),
        }
    }

    pub fn with_attrs(&self, attrs: Attrs) -> Node {
        Node(Arc::new(NodeData {
            node_type: self.0.node_type.clone(),
            attrs,
            body: self.clone_body(),
        }))
    }

    /// Same body under another type; used by type replacement.
    pub(crate) fn with_type(&self, node_type: impl Into<String>, attrs: Attrs) -> Node {
        Node(Arc::new(NodeData {
            node_type: node_type.into(),
            attrs,
            body: self.clone_body(),
        }))
    }

    pub fn with_marks(&self, marks: MarkSet) -> Node {
        match &self.0.body {
            Body::Text { text, .. } => Node::new_text(text.clone(), marks),
            _ => self.clone(),
        }
    }

    pub(crate) fn with_text(&self, text: String) -> Node {
        Node::new_text(text, self.marks().clone())
    }

    fn clone_body(&self) -> Body {
        match &self.0.body {
            Body::Container(content) => Body::Container(content.clone()),
            Body::Leaf => Body::Leaf,
            Body::Text { text, len, marks } => Body::Text {
                text: text.clone(),
                len: *len,
                marks: marks.clone(),
            },
        }
    }

    /// The characters `from..to` of a text node, keeping its marks.
    pub(crate) fn cut_text(&self, from: usize, to: usize) -> Node {
        match &self.0.body {
            Body::Text { text, len, marks } => {
                if from == 0 && to == *len {
                    return self.clone();
                }
                Node::new_text(char_range(text, from, to), marks.clone())
            }
            _ => self.clone(),
        }
    }

    /// The node restricted to `from..to` of its own content (or text).
    pub fn cut(&self, from: usize, to: usize) -> Node {
        match &self.0.body {
            Body::Text { .. } => self.cut_text(from, to),
            Body::Container(content) => {
                if from == 0 && to == content.size() {
                    return self.clone();
                }
                self.copy(content.cut(from, to))
            }
            Body::Leaf => self.clone(),
        }
    }

    /// Concatenated text of every descendant text node.
    pub fn text_content(&self) -> String {
        match &self.0.body {
            Body::Text { text, .. } => text.clone(),
            Body::Leaf => String::new(),
            Body::Container(content) => {
                let mut out = String::new();
                content.text_between(0, content.size(), &mut out);
                out
            }
        }
    }

    /// Text of the content between two positions of this node.
    pub fn text_between(&self, from: usize, to: usize) -> String {
        let mut out = String::new();
        self.content().text_between(from, to, &mut out);
        out
    }

    /// Call `f` for every descendant overlapping `from..to` of this node's
    /// content, with the descendant, its position, its parent and its index.
    /// Returning `false` skips that node's children.
    pub fn nodes_between<F>(&self, from: usize, to: usize, mut f: F)
    where
        F: FnMut(&Node, usize, &Node, usize) -> bool,
    {
        self.content().nodes_between(from, to, &mut f, 0, self);
    }

    /// Call `f` for every descendant of this node.
    pub fn descendants<F>(&self, f: F)
    where
        F: FnMut(&Node, usize, &Node, usize) -> bool,
    {
        self.nodes_between(0, self.content_size(), f);
    }

    /// The node starting at `pos`, or the text node containing it.
    pub fn node_at(&self, pos: usize) -> Option<Node> {
        let mut node = self;
        let mut pos = pos;
        loop {
            let (index, offset) = node.content().find_index(pos, -1).ok()?;
            let child = node.maybe_child(index)?;
            if offset == pos || child.is_text() {
                return Some(child.clone());
            }
            pos -= offset + 1;
            node = child;
        }
    }

    pub fn resolve(&self, pos: usize) -> Result<ResolvedPos, ModelError> {
        ResolvedPos::resolve(self, pos)
    }

    /// A copy of this document with `from..to` replaced by `slice`, every
    /// rebuilt container checked against `schema`.
    pub fn replace(
        &self,
        schema: &Schema,
        from: usize,
        to: usize,
        slice: &Slice,
    ) -> Result<Node, ModelError> {
        if from > to {
            return Err(ModelError::precondition(format!(
                "cannot replace inverted range {from}..{to}"
            )));
        }
        let rfrom = self.resolve(from)?;
        let rto = self.resolve(to)?;
        super::replace::replace(schema, &rfrom, &rto, slice)
    }

    /// The content between `from` and `to`, with open sides recording how
    /// deep each end was cut.
    pub fn slice(&self, from: usize, to: usize) -> Result<Slice, ModelError> {
        if from > to {
            return Err(ModelError::precondition(format!(
                "cannot slice inverted range {from}..{to}"
            )));
        }
        if from == to {
            return Ok(Slice::empty());
        }
        let rfrom = self.resolve(from)?;
        let rto = self.resolve(to)?;
        let depth = rfrom.shared_depth(to);
        let start = rfrom.start(depth);
        let node = rfrom.node(depth);
        let content = node.content().cut(from - start, to - start);
        Ok(Slice::new(
            content,
            rfrom.depth() - depth,
            rto.depth() - depth,
        ))
    }
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices().nth(chars).map_or(text.len(), |(i, _)| i)
}

pub(crate) fn char_range(text: &str, from: usize, to: usize) -> &str {
    &text[byte_offset(text, from)..byte_offset(text, to)]
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.body {
            Body::Text { text, marks, .. } => {
                for mark in marks {
                    write!(f, "{mark}(")?;
                }
                write!(f, "{text:?}")?;
                for _ in marks {
                    f.write_str(")")?;
                }
                Ok(())
            }
            Body::Leaf => {
                f.write_str(self.node_type())?;
                fmt_attrs(self.attrs(), f)
            }
            Body::Container(content) => {
                f.write_str(self.node_type())?;
                fmt_attrs(self.attrs(), f)?;
                f.write_str("(")?;
                for (i, child) in content.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{child}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::new_text(text, MarkSet::empty())
    }
}

/// Wire shape: `{type, attrs?, content?, text?, marks?}`.
#[derive(Serialize, Deserialize)]
struct NodeRepr {
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    attrs: Attrs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<Vec<Node>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "MarkSet::is_empty")]
    marks: MarkSet,
}

impl From<Node> for NodeRepr {
    fn from(node: Node) -> Self {
        match &node.0.body {
            Body::Text { text, marks, .. } => NodeRepr {
                node_type: TEXT_TYPE.to_string(),
                attrs: Attrs::new(),
                content: None,
                text: Some(text.clone()),
                marks: marks.clone(),
            },
            Body::Leaf => NodeRepr {
                node_type: node.node_type().to_string(),
                attrs: node.attrs().clone(),
                content: None,
                text: None,
                marks: MarkSet::empty(),
            },
            Body::Container(content) => NodeRepr {
                node_type: node.node_type().to_string(),
                attrs: node.attrs().clone(),
                content: Some(content.children().to_vec()),
                text: None,
                marks: MarkSet::empty(),
            },
        }
    }
}

impl TryFrom<NodeRepr> for Node {
    type Error = ModelError;

    fn try_from(repr: NodeRepr) -> Result<Self, Self::Error> {
        match (repr.text, repr.content) {
            (Some(_), Some(_)) => Err(ModelError::construction(
                repr.node_type,
                "a node cannot carry both text and content",
            )),
            (Some(text), None) => {
                if text.is_empty() {
                    return Err(ModelError::construction(TEXT_TYPE, "empty text node"));
                }
                Ok(Node::new_text(text, repr.marks))
            }
            (None, Some(children)) => Ok(Node::container(
                repr.node_type,
                repr.attrs,
                Fragment::from_nodes(children),
            )),
            (None, None) => Ok(Node::leaf(repr.node_type, repr.attrs)),
        }
    }
}
