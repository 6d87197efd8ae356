//! Node and mark type registry.
//!
//! A [`Schema`] is assembled from the node and mark specs contributed by
//! plugins (see [`SchemaBuilder`]). It compiles every content expression
//! once, and then answers the questions the rest of the engine asks while
//! editing: may these children live in that parent, may this mark be used
//! here, which block should a fresh line become.

pub mod content;

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use thiserror::Error;

use crate::error::ModelError;
use crate::model::{AttrValue, Attrs, Fragment, Mark, MarkSet, Node, NodeKind, TEXT_TYPE};
use crate::plugin::{Plugin, default_plugins};

pub use content::ContentExpr;

/// Errors raised while assembling a schema. These are configuration
/// mistakes, so they are fatal for the editor being built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("node type `{name}` is registered by both `{first}` and `{second}`")]
    DuplicateNodeType {
        name: String,
        first: String,
        second: String,
    },

    #[error("mark type `{name}` is registered by both `{first}` and `{second}`")]
    DuplicateMarkType {
        name: String,
        first: String,
        second: String,
    },

    #[error("invalid content expression `{expr}` for `{node_type}`: {reason}")]
    InvalidContentExpression {
        node_type: String,
        expr: String,
        reason: String,
    },

    #[error("content expression of `{node_type}` names unknown type or group `{name}`")]
    UnknownContentName { node_type: String, name: String },

    #[error("`{owner}` refers to unknown mark `{name}`")]
    UnknownMarkName { owner: String, name: String },

    #[error("top node type `{0}` is not registered")]
    MissingTopNode(String),

    #[error("no `text` node type is registered")]
    MissingTextType,
}

/// Description of a node type as contributed by a plugin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeSpec {
    /// Content expression; `None` makes the type a leaf.
    pub content: Option<String>,
    /// Space separated group names this type belongs to.
    pub group: Option<String>,
    pub inline: bool,
    /// Declared attributes with their defaults.
    pub attrs: Attrs,
    /// Allowed marks: `"_"` for all, space separated names, or `""` for
    /// none. Defaults to all for nodes with inline content.
    pub marks: Option<String>,
    /// Content is code: newlines are literal and formatting is not applied.
    pub code: bool,
    pub render_hint: Option<String>,
}

impl NodeSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, expr: impl Into<String>) -> Self {
        self.content = Some(expr.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn inline(mut self) -> Self {
        self.inline = true;
        self
    }

    pub fn attr(mut self, name: impl Into<String>, default: impl Into<AttrValue>) -> Self {
        self.attrs.insert(name.into(), default.into());
        self
    }

    pub fn marks(mut self, marks: impl Into<String>) -> Self {
        self.marks = Some(marks.into());
        self
    }

    pub fn code(mut self) -> Self {
        self.code = true;
        self
    }

    pub fn render_hint(mut self, hint: impl Into<String>) -> Self {
        self.render_hint = Some(hint.into());
        self
    }
}

/// Description of a mark type as contributed by a plugin.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkSpec {
    pub attrs: Attrs,
    /// Marks this one cannot coexist with: `"_"` for all, or space
    /// separated names. A mark always excludes its own type.
    pub excludes: Option<String>,
    /// Whether text typed at the mark's end continues the mark.
    pub inclusive: bool,
    pub render_hint: Option<String>,
}

impl Default for MarkSpec {
    fn default() -> Self {
        Self {
            attrs: Attrs::new(),
            excludes: None,
            inclusive: true,
            render_hint: None,
        }
    }
}

impl MarkSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attr(mut self, name: impl Into<String>, default: impl Into<AttrValue>) -> Self {
        self.attrs.insert(name.into(), default.into());
        self
    }

    pub fn excludes(mut self, excludes: impl Into<String>) -> Self {
        self.excludes = Some(excludes.into());
        self
    }

    pub fn inclusive(mut self, inclusive: bool) -> Self {
        self.inclusive = inclusive;
        self
    }

    pub fn render_hint(mut self, hint: impl Into<String>) -> Self {
        self.render_hint = Some(hint.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
enum NameSet {
    All,
    Only(Vec<String>),
}

impl NameSet {
    fn contains(&self, name: &str) -> bool {
        match self {
            NameSet::All => true,
            NameSet::Only(names) => names.iter().any(|n| n == name),
        }
    }
}

/// A compiled node type.
#[derive(Debug)]
pub struct NodeType {
    name: String,
    spec: NodeSpec,
    content: Option<ContentExpr>,
    inline_content: bool,
    marks: NameSet,
}

impl NodeType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &NodeSpec {
        &self.spec
    }

    pub fn content_expr(&self) -> Option<&ContentExpr> {
        self.content.as_ref()
    }

    pub fn is_text(&self) -> bool {
        self.name == TEXT_TYPE
    }

    pub fn is_leaf(&self) -> bool {
        self.content.is_none() && !self.is_text()
    }

    pub fn is_inline(&self) -> bool {
        self.spec.inline || self.is_text()
    }

    /// A container whose children are inline content.
    pub fn is_textblock(&self) -> bool {
        self.inline_content
    }

    pub fn is_code(&self) -> bool {
        self.spec.code
    }

    pub fn allows_mark(&self, mark_type: &str) -> bool {
        self.marks.contains(mark_type)
    }

    /// Whether a child of type `node_type` may appear somewhere in this
    /// node's content.
    pub fn accepts(&self, node_type: &str) -> bool {
        self.content.as_ref().is_some_and(|expr| expr.mentions(node_type))
    }
}

/// A compiled mark type.
#[derive(Debug)]
pub struct MarkType {
    name: String,
    spec: MarkSpec,
    excludes: NameSet,
}

impl MarkType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &MarkSpec {
        &self.spec
    }

    /// Whether this mark removes a mark of type `other` when added.
    pub fn excludes(&self, other: &str) -> bool {
        self.excludes.contains(other)
    }
}

/// Collects node and mark specs, remembering which plugin contributed each
/// one so that collisions can be reported.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    nodes: Vec<(String, String, NodeSpec)>,
    marks: Vec<(String, String, MarkSpec)>,
    top_node: Option<String>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the root node type (defaults to `doc`).
    pub fn top_node(&mut self, name: impl Into<String>) -> &mut Self {
        self.top_node = Some(name.into());
        self
    }

    pub fn add_node(
        &mut self,
        source: &str,
        name: &str,
        spec: NodeSpec,
    ) -> Result<&mut Self, SchemaError> {
        if let Some((_, first, _)) = self.nodes.iter().find(|(n, _, _)| n == name) {
            return Err(SchemaError::DuplicateNodeType {
                name: name.to_string(),
                first: first.clone(),
                second: source.to_string(),
            });
        }
        self.nodes
            .push((name.to_string(), source.to_string(), spec));
        Ok(self)
    }

    pub fn add_mark(
        &mut self,
        source: &str,
        name: &str,
        spec: MarkSpec,
    ) -> Result<&mut Self, SchemaError> {
        if let Some((_, first, _)) = self.marks.iter().find(|(n, _, _)| n == name) {
            return Err(SchemaError::DuplicateMarkType {
                name: name.to_string(),
                first: first.clone(),
                second: source.to_string(),
            });
        }
        self.marks
            .push((name.to_string(), source.to_string(), spec));
        Ok(self)
    }

    /// Register everything a plugin contributes.
    pub fn add_plugin(&mut self, plugin: &dyn Plugin) -> Result<&mut Self, SchemaError> {
        for (name, spec) in plugin.nodes() {
            self.add_node(plugin.name(), &name, spec)?;
        }
        for (name, spec) in plugin.marks() {
            self.add_mark(plugin.name(), &name, spec)?;
        }
        Ok(self)
    }

    pub fn build(&self) -> Result<Schema, SchemaError> {
        let top_node = self.top_node.clone().unwrap_or_else(|| "doc".to_string());
        if !self.nodes.iter().any(|(n, _, _)| n == TEXT_TYPE) {
            return Err(SchemaError::MissingTextType);
        }
        if !self.nodes.iter().any(|(n, _, _)| *n == top_node) {
            return Err(SchemaError::MissingTopNode(top_node));
        }

        let resolve = |name: &str| -> Option<Vec<String>> {
            if self.nodes.iter().any(|(n, _, _)| n == name) {
                return Some(vec![name.to_string()]);
            }
            let members: Vec<String> = self
                .nodes
                .iter()
                .filter(|(_, _, spec)| {
                    spec.group
                        .as_deref()
                        .is_some_and(|groups| groups.split_whitespace().any(|g| g == name))
                })
                .map(|(n, _, _)| n.clone())
                .collect();
            (!members.is_empty()).then_some(members)
        };
        let is_inline = |name: &str| {
            name == TEXT_TYPE
                || self
                    .nodes
                    .iter()
                    .any(|(n, _, spec)| n == name && spec.inline)
        };

        let mut nodes = Vec::with_capacity(self.nodes.len());
        for (name, _, spec) in &self.nodes {
            let content = match spec.content.as_deref() {
                None => None,
                Some(expr) => {
                    let raw = content::parse(expr).map_err(|reason| {
                        SchemaError::InvalidContentExpression {
                            node_type: name.clone(),
                            expr: expr.to_string(),
                            reason,
                        }
                    })?;
                    let compiled = ContentExpr::compile(expr, raw, resolve).map_err(|unknown| {
                        SchemaError::UnknownContentName {
                            node_type: name.clone(),
                            name: unknown,
                        }
                    })?;
                    Some(compiled)
                }
            };
            let inline_content = content
                .as_ref()
                .is_some_and(|expr| expr.types().any(is_inline));
            let marks = match spec.marks.as_deref() {
                None if inline_content => NameSet::All,
                None => NameSet::Only(Vec::new()),
                Some(list) => self.mark_names(name, list)?,
            };
            nodes.push(NodeType {
                name: name.clone(),
                spec: spec.clone(),
                content,
                inline_content,
                marks,
            });
        }

        let mut marks = Vec::with_capacity(self.marks.len());
        for (name, _, spec) in &self.marks {
            let excludes = match spec.excludes.as_deref() {
                None => NameSet::Only(vec![name.clone()]),
                Some(list) => match self.mark_names(name, list)? {
                    NameSet::All => NameSet::All,
                    NameSet::Only(mut names) => {
                        if !names.contains(name) {
                            names.push(name.clone());
                        }
                        NameSet::Only(names)
                    }
                },
            };
            marks.push(MarkType {
                name: name.clone(),
                spec: spec.clone(),
                excludes,
            });
        }

        let node_index = nodes
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.clone(), i))
            .collect();
        let mark_index = marks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.clone(), i))
            .collect();
        let mut schema = Schema {
            nodes,
            node_index,
            marks,
            mark_index,
            top_node,
            default_textblock: None,
        };
        schema.default_textblock = schema.find_default_textblock();
        log::debug!(
            "built schema with {} node types and {} mark types",
            schema.nodes.len(),
            schema.marks.len()
        );
        Ok(schema)
    }

    fn mark_names(&self, owner: &str, list: &str) -> Result<NameSet, SchemaError> {
        if list.trim() == "_" {
            return Ok(NameSet::All);
        }
        let mut names = Vec::new();
        for name in list.split_whitespace() {
            if !self.marks.iter().any(|(n, _, _)| n == name) {
                return Err(SchemaError::UnknownMarkName {
                    owner: owner.to_string(),
                    name: name.to_string(),
                });
            }
            names.push(name.to_string());
        }
        Ok(NameSet::Only(names))
    }
}

/// The compiled set of node and mark types a document must conform to.
#[derive(Debug)]
pub struct Schema {
    nodes: Vec<NodeType>,
    node_index: HashMap<String, usize>,
    marks: Vec<MarkType>,
    mark_index: HashMap<String, usize>,
    top_node: String,
    default_textblock: Option<String>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    pub fn from_plugins(plugins: &[Box<dyn Plugin>]) -> Result<Schema, SchemaError> {
        let mut builder = SchemaBuilder::new();
        for plugin in plugins {
            builder.add_plugin(plugin.as_ref())?;
        }
        builder.build()
    }

    pub fn top_node_type(&self) -> &str {
        &self.top_node
    }

    pub fn node_type(&self, name: &str) -> Option<&NodeType> {
        self.node_index.get(name).map(|&i| &self.nodes[i])
    }

    pub fn mark_type(&self, name: &str) -> Option<&MarkType> {
        self.mark_index.get(name).map(|&i| &self.marks[i])
    }

    pub fn node_types(&self) -> impl Iterator<Item = &NodeType> {
        self.nodes.iter()
    }

    pub fn mark_types(&self) -> impl Iterator<Item = &MarkType> {
        self.marks.iter()
    }

    pub fn is_textblock(&self, name: &str) -> bool {
        self.node_type(name).is_some_and(NodeType::is_textblock)
    }

    pub fn is_inline(&self, name: &str) -> bool {
        self.node_type(name).is_some_and(NodeType::is_inline)
    }

    pub fn is_code(&self, name: &str) -> bool {
        self.node_type(name).is_some_and(NodeType::is_code)
    }

    pub fn allows_mark(&self, parent: &str, mark_type: &str) -> bool {
        self.node_type(parent)
            .is_some_and(|t| t.allows_mark(mark_type))
    }

    /// The textblock type new lines default to: the first textblock the
    /// top node's content mentions.
    pub fn default_textblock(&self) -> Option<&str> {
        self.default_textblock.as_deref()
    }

    fn find_default_textblock(&self) -> Option<String> {
        let expr = self.node_type(&self.top_node)?.content_expr()?;
        expr.types()
            .find(|t| self.is_textblock(t))
            .map(str::to_string)
    }

    /// Whether `children` is valid content for a node of type `parent`.
    pub fn valid_content(&self, parent: &str, children: &[Node]) -> bool {
        self.check_content(parent, children).is_ok()
    }

    /// Like [`valid_content`](Self::valid_content), reporting the violation.
    pub fn check_content(&self, parent: &str, children: &[Node]) -> Result<(), ModelError> {
        let violation = || ModelError::SchemaViolation {
            parent: parent.to_string(),
            children: children
                .iter()
                .map(Node::node_type)
                .collect::<Vec<_>>()
                .join(" "),
        };
        let ty = self.node_type(parent).ok_or_else(violation)?;
        let Some(expr) = ty.content_expr() else {
            return if children.is_empty() {
                Ok(())
            } else {
                Err(violation())
            };
        };
        if !expr.matches(children.iter().map(Node::node_type)) {
            return Err(violation());
        }
        let marks_ok = children
            .iter()
            .flat_map(|child| child.marks())
            .all(|mark| ty.allows_mark(mark.mark_type()));
        if !marks_ok {
            return Err(violation());
        }
        Ok(())
    }

    /// Whether content of `a` and `b` can be joined: the types are equal or
    /// accept a common first child.
    pub fn compatible_content(&self, a: &str, b: &str) -> bool {
        if a == b {
            return true;
        }
        let (Some(a), Some(b)) = (
            self.node_type(a).and_then(NodeType::content_expr),
            self.node_type(b).and_then(NodeType::content_expr),
        ) else {
            return false;
        };
        let first = a.first_types();
        b.first_types().iter().any(|t| first.contains(t))
    }

    /// Overlay `given` on the type's declared defaults, rejecting unknown keys.
    pub fn compute_attrs(
        &self,
        owner: &str,
        defaults: &Attrs,
        given: Attrs,
    ) -> Result<Attrs, ModelError> {
        let mut attrs = defaults.clone();
        for (key, value) in given {
            if !defaults.contains_key(&key) {
                return Err(ModelError::construction(
                    owner,
                    format!("unknown attribute `{key}`"),
                ));
            }
            attrs.insert(key, value);
        }
        Ok(attrs)
    }

    /// Build a validated node of type `node_type`.
    pub fn node(
        &self,
        node_type: &str,
        attrs: Attrs,
        children: impl IntoIterator<Item = Node>,
    ) -> Result<Node, ModelError> {
        let ty = self
            .node_type(node_type)
            .ok_or_else(|| ModelError::construction(node_type, "unknown node type"))?;
        if ty.is_text() {
            return Err(ModelError::construction(
                node_type,
                "text nodes are built with Schema::text",
            ));
        }
        let attrs = self.compute_attrs(node_type, &ty.spec.attrs, attrs)?;
        if ty.is_leaf() {
            if children.into_iter().next().is_some() {
                return Err(ModelError::construction(node_type, "leaf nodes have no children"));
            }
            return Ok(Node::leaf(node_type, attrs));
        }
        let content = Fragment::from_nodes(children);
        self.check_content(node_type, content.children())?;
        Ok(Node::container(node_type, attrs, content))
    }

    pub fn leaf(&self, node_type: &str, attrs: Attrs) -> Result<Node, ModelError> {
        self.node(node_type, attrs, [])
    }

    /// Build a text node. Text must be non-empty and every mark known.
    pub fn text(
        &self,
        text: impl Into<String>,
        marks: impl IntoIterator<Item = Mark>,
    ) -> Result<Node, ModelError> {
        let text = text.into();
        if text.is_empty() {
            return Err(ModelError::construction(TEXT_TYPE, "empty text"));
        }
        let mut set = MarkSet::empty();
        for mark in marks {
            if self.mark_type(mark.mark_type()).is_none() {
                return Err(ModelError::construction(
                    TEXT_TYPE,
                    format!("unknown mark `{}`", mark.mark_type()),
                ));
            }
            set = self.add_mark_to_set(&set, mark);
        }
        Ok(Node::new_text(text, set))
    }

    /// Build a mark with its declared attribute defaults filled in.
    pub fn mark(&self, mark_type: &str, attrs: Attrs) -> Result<Mark, ModelError> {
        let ty = self
            .mark_type(mark_type)
            .ok_or_else(|| ModelError::construction(mark_type, "unknown mark type"))?;
        let attrs = self.compute_attrs(mark_type, &ty.spec.attrs, attrs)?;
        Ok(Mark::new(mark_type, attrs))
    }

    /// Add `mark` to `set`, dropping marks it excludes. When a mark already in
    /// the set excludes the new one, the set is returned unchanged.
    pub fn add_mark_to_set(&self, set: &MarkSet, mark: Mark) -> MarkSet {
        let excludes = |a: &str, b: &str| self.mark_type(a).is_some_and(|t| t.excludes(b));
        let mut kept = Vec::with_capacity(set.len());
        for other in set {
            if *other == mark {
                return set.clone();
            }
            if excludes(mark.mark_type(), other.mark_type()) {
                continue;
            }
            if excludes(other.mark_type(), mark.mark_type()) {
                return set.clone();
            }
            kept.push(other.clone());
        }
        MarkSet::from(kept).with(mark)
    }

    /// The smallest valid node of `node_type`, filling required children
    /// with their first fillable candidates.
    pub fn create_and_fill(&self, node_type: &str) -> Option<Node> {
        self.fill(node_type, 0)
    }

    fn fill(&self, node_type: &str, depth: usize) -> Option<Node> {
        const MAX_FILL_DEPTH: usize = 8;
        if depth > MAX_FILL_DEPTH {
            return None;
        }
        let ty = self.node_type(node_type)?;
        if ty.is_text() {
            return None;
        }
        let attrs = ty.spec.attrs.clone();
        let Some(expr) = ty.content_expr() else {
            return Some(Node::leaf(node_type, attrs));
        };
        let mut children = Vec::new();
        for candidates in expr.required_terms() {
            let child = candidates
                .iter()
                .find_map(|candidate| self.fill(candidate, depth + 1))?;
            children.push(child);
        }
        Some(Node::container(node_type, attrs, Fragment::from_nodes(children)))
    }

    /// Validate a whole tree: known types, declared attributes, the right
    /// node shapes and valid content everywhere.
    pub fn check(&self, node: &Node) -> Result<(), ModelError> {
        let ty = self
            .node_type(node.node_type())
            .ok_or_else(|| ModelError::construction(node.node_type(), "unknown node type"))?;
        if let Some(key) = node.attrs().keys().find(|k| !ty.spec.attrs.contains_key(*k)) {
            return Err(ModelError::construction(
                node.node_type(),
                format!("unknown attribute `{key}`"),
            ));
        }
        match node.kind() {
            NodeKind::Text => {
                if let Some(mark) = node.marks().iter().find(|m| self.mark_type(m.mark_type()).is_none()) {
                    return Err(ModelError::construction(
                        TEXT_TYPE,
                        format!("unknown mark `{}`", mark.mark_type()),
                    ));
                }
                Ok(())
            }
            NodeKind::Leaf if ty.is_leaf() => Ok(()),
            NodeKind::Container if ty.content_expr().is_some() => {
                self.check_content(node.node_type(), node.children())?;
                node.children().iter().try_for_each(|child| self.check(child))
            }
            _ => Err(ModelError::construction(
                node.node_type(),
                "node shape does not match its type",
            )),
        }
    }
}

/// The schema built from the built-in plugins, shared across callers.
pub fn basic_schema() -> Arc<Schema> {
    static BASIC: OnceLock<Arc<Schema>> = OnceLock::new();
    BASIC
        .get_or_init(|| {
            Arc::new(
                Schema::from_plugins(&default_plugins())
                    .expect("built-in plugins form a valid schema"),
            )
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::*;
    use crate::model::attrs;
    use crate::{blockquote, doc, li, p, ul};
    use pretty_assertions::assert_eq;

    fn minimal() -> SchemaBuilder {
        let mut builder = SchemaBuilder::new();
        builder
            .add_node("test", "doc", NodeSpec::new().content("block+"))
            .unwrap()
            .add_node("test", "paragraph", NodeSpec::new().content("inline*").group("block"))
            .unwrap()
            .add_node("test", "text", NodeSpec::new().group("inline").inline())
            .unwrap();
        builder
    }

    // ============ building ============

    #[test]
    fn test_duplicate_node_type_is_fatal() {
        let mut builder = minimal();
        let err = builder
            .add_node("other", "paragraph", NodeSpec::new().content("inline*"))
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateNodeType {
                name: "paragraph".into(),
                first: "test".into(),
                second: "other".into(),
            }
        );
    }

    #[test]
    fn test_duplicate_mark_type_is_fatal() {
        let mut builder = minimal();
        builder.add_mark("a", "strong", MarkSpec::new()).unwrap();
        let err = builder.add_mark("b", "strong", MarkSpec::new()).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateMarkType { .. }));
    }

    #[test]
    fn test_unknown_content_name() {
        let mut builder = minimal();
        builder
            .add_node("test", "quote", NodeSpec::new().content("blocks+"))
            .unwrap();
        assert_eq!(
            builder.build().unwrap_err(),
            SchemaError::UnknownContentName {
                node_type: "quote".into(),
                name: "blocks".into(),
            }
        );
    }

    #[test]
    fn test_invalid_content_expression() {
        let mut builder = minimal();
        builder
            .add_node("test", "quote", NodeSpec::new().content("(block"))
            .unwrap();
        assert!(matches!(
            builder.build().unwrap_err(),
            SchemaError::InvalidContentExpression { .. }
        ));
    }

    #[test]
    fn test_missing_text_and_top() {
        let mut builder = SchemaBuilder::new();
        builder.add_node("t", "doc", NodeSpec::new().content("")).unwrap();
        assert_eq!(builder.build().unwrap_err(), SchemaError::MissingTextType);
        let mut builder = minimal();
        builder.top_node("root");
        assert_eq!(
            builder.build().unwrap_err(),
            SchemaError::MissingTopNode("root".into())
        );
    }

    // ============ validation ============

    #[test]
    fn test_basic_schema_textblocks() {
        let schema = basic_schema();
        assert!(schema.is_textblock("paragraph"));
        assert!(schema.is_textblock("heading"));
        assert!(schema.is_textblock("code_block"));
        assert!(!schema.is_textblock("blockquote"));
        assert!(!schema.is_textblock("doc"));
        assert_eq!(schema.default_textblock(), Some("paragraph"));
    }

    #[test]
    fn test_valid_content() {
        let schema = basic_schema();
        assert!(schema.valid_content("doc", &[p!("a")]));
        assert!(!schema.valid_content("doc", &[]));
        assert!(!schema.valid_content("doc", &[text("a")]));
        assert!(schema.valid_content("list_item", &[p!("a"), ul!(li!(p!("b")))]));
        assert!(!schema.valid_content("list_item", &[ul!(li!(p!("b")))]));
    }

    #[test]
    fn test_code_block_rejects_marks() {
        let schema = basic_schema();
        assert!(schema.valid_content("code_block", &[text("x = 1")]));
        assert!(!schema.valid_content("code_block", &[strong("x")]));
        assert!(!schema.valid_content("code_block", &[hard_break()]));
    }

    #[test]
    fn test_check_content_reports_violation() {
        let schema = basic_schema();
        let err = schema.check_content("blockquote", &[]).unwrap_err();
        assert_eq!(
            err,
            ModelError::SchemaViolation {
                parent: "blockquote".into(),
                children: String::new(),
            }
        );
    }

    #[test]
    fn test_check_whole_tree() {
        let schema = basic_schema();
        assert!(schema.check(&doc![p!("a"), blockquote!(p!("b"))]).is_ok());
        let bad = Node::container("doc", Attrs::new(), Fragment::from_node(text("loose")));
        assert!(schema.check(&bad).is_err());
    }

    // ============ construction ============

    #[test]
    fn test_node_fills_default_attrs() {
        let schema = basic_schema();
        let heading = schema.node("heading", Attrs::new(), [text("x")]).unwrap();
        assert_eq!(heading.attr("level"), Some(&AttrValue::Int(1)));
    }

    #[test]
    fn test_node_rejects_unknown_attr() {
        let schema = basic_schema();
        let err = schema
            .node("paragraph", attrs([("align", "left")]), [])
            .unwrap_err();
        assert!(matches!(err, ModelError::Construction { .. }));
    }

    #[test]
    fn test_node_rejects_unknown_type() {
        let schema = basic_schema();
        assert!(schema.node("table", Attrs::new(), []).is_err());
        assert!(schema.mark("blink", Attrs::new()).is_err());
        assert!(schema.text("", []).is_err());
    }

    #[test]
    fn test_create_and_fill() {
        let schema = basic_schema();
        assert_eq!(schema.create_and_fill("doc").unwrap(), doc![p!()]);
        assert_eq!(
            schema.create_and_fill("bullet_list").unwrap(),
            ul!(li!(p!()))
        );
    }

    // ============ marks ============

    #[test]
    fn test_code_mark_excludes_others() {
        let schema = basic_schema();
        let set = MarkSet::from(vec![Mark::of("strong"), Mark::of("em")]);
        let with_code = schema.add_mark_to_set(&set, Mark::of("code"));
        assert_eq!(with_code, MarkSet::from(vec![Mark::of("code")]));
        // and nothing can be added on top of code
        assert_eq!(schema.add_mark_to_set(&with_code, Mark::of("strong")), with_code);
    }

    #[test]
    fn test_compatible_content() {
        let schema = basic_schema();
        assert!(schema.compatible_content("paragraph", "heading"));
        assert!(schema.compatible_content("blockquote", "doc"));
        assert!(!schema.compatible_content("paragraph", "blockquote"));
        assert!(!schema.compatible_content("bullet_list", "blockquote"));
    }
}
