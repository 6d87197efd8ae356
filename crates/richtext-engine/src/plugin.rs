//! Plugins bundle node and mark types, key bindings and transaction hooks.
//!
//! The editor is assembled from a list of plugins: their specs are merged
//! into one [`Schema`](crate::schema::Schema), their key bindings into one
//! [`Keymap`](crate::keymap::Keymap), and their hooks run on every
//! dispatched transaction.

use crate::commands::{self, BoxedCommand};
use crate::model::Attrs;
use crate::schema::{MarkSpec, NodeSpec};
use crate::state::EditorState;
use crate::transform::Transaction;

pub trait Plugin: Send + Sync {
    /// Unique name, used in error messages.
    fn name(&self) -> &str;

    fn nodes(&self) -> Vec<(String, NodeSpec)> {
        Vec::new()
    }

    fn marks(&self) -> Vec<(String, MarkSpec)> {
        Vec::new()
    }

    /// Key bindings as (key, command) pairs, keys in any order of modifiers.
    fn keymap(&self) -> Vec<(String, BoxedCommand)> {
        Vec::new()
    }

    /// Inspect or extend a transaction before it is applied. Returning
    /// `None` drops it.
    fn filter_transaction(&self, tr: Transaction, _state: &EditorState) -> Option<Transaction> {
        Some(tr)
    }

    /// Called after a new state has been installed.
    fn state_did_update(&self, _new_state: &EditorState, _old_state: &EditorState) {}
}

/// Bindings to commands from the named registry.
fn named_bindings(pairs: &[(&str, &str)]) -> Vec<(String, BoxedCommand)> {
    pairs
        .iter()
        .filter_map(|&(key, name)| {
            let command = commands::named(name);
            if command.is_none() {
                log::warn!("no command named `{name}` for key `{key}`");
            }
            command.map(|command| (key.to_string(), command))
        })
        .collect()
}

fn node(name: &str, spec: NodeSpec) -> (String, NodeSpec) {
    (name.to_string(), spec)
}

fn mark(name: &str, spec: MarkSpec) -> (String, MarkSpec) {
    (name.to_string(), spec)
}

/// Document, paragraph, text, inline leaves, the basic marks and the
/// editing keys every document needs.
#[derive(Debug, Default)]
pub struct CorePlugin;

impl Plugin for CorePlugin {
    fn name(&self) -> &str {
        "core"
    }

    fn nodes(&self) -> Vec<(String, NodeSpec)> {
        vec![
            node("doc", NodeSpec::new().content("block+")),
            node(
                "paragraph",
                NodeSpec::new()
                    .content("inline*")
                    .group("block")
                    .render_hint("p"),
            ),
            node("text", NodeSpec::new().group("inline").inline()),
            node(
                "hard_break",
                NodeSpec::new().group("inline").inline().render_hint("br"),
            ),
            node(
                "image",
                NodeSpec::new()
                    .group("inline")
                    .inline()
                    .attr("src", "")
                    .attr("alt", "")
                    .render_hint("img"),
            ),
        ]
    }

    fn marks(&self) -> Vec<(String, MarkSpec)> {
        vec![
            mark("strong", MarkSpec::new().render_hint("strong")),
            mark("em", MarkSpec::new().render_hint("em")),
            mark("underline", MarkSpec::new().render_hint("u")),
            mark("strike", MarkSpec::new().render_hint("s")),
            mark("code", MarkSpec::new().excludes("_").render_hint("code")),
            mark(
                "link",
                MarkSpec::new()
                    .attr("href", "")
                    .inclusive(false)
                    .render_hint("a"),
            ),
        ]
    }

    fn keymap(&self) -> Vec<(String, BoxedCommand)> {
        named_bindings(&[
            ("Enter", "split_block"),
            ("Shift-Enter", "insert_hard_break"),
            ("Backspace", "delete_backward"),
            ("Delete", "delete_forward"),
            ("Tab", "insert_tab"),
            ("Mod-a", "select_all"),
            ("Mod-b", "toggle_strong"),
            ("Mod-i", "toggle_em"),
            ("Mod-u", "toggle_underline"),
            ("Mod-Shift-s", "toggle_strike"),
            ("Mod-e", "toggle_code"),
            ("Mod-\\", "clear_formatting"),
            ("ArrowLeft", "move_char_backward"),
            ("ArrowRight", "move_char_forward"),
            ("Shift-ArrowLeft", "extend_char_backward"),
            ("Shift-ArrowRight", "extend_char_forward"),
            ("Home", "move_block_start"),
            ("End", "move_block_end"),
            ("Mod-Home", "move_doc_start"),
            ("Mod-End", "move_doc_end"),
        ])
    }
}

#[derive(Debug, Default)]
pub struct HeadingPlugin;

impl Plugin for HeadingPlugin {
    fn name(&self) -> &str {
        "heading"
    }

    fn nodes(&self) -> Vec<(String, NodeSpec)> {
        vec![node(
            "heading",
            NodeSpec::new()
                .content("inline*")
                .group("block")
                .attr("level", 1)
                .render_hint("h"),
        )]
    }

    fn keymap(&self) -> Vec<(String, BoxedCommand)> {
        let mut bindings = named_bindings(&[("Mod-Alt-0", "set_paragraph")]);
        for level in 1..=6u8 {
            bindings.push((
                format!("Mod-Alt-{level}"),
                std::sync::Arc::new(commands::toggle_heading(level)),
            ));
        }
        bindings
    }
}

#[derive(Debug, Default)]
pub struct BlockquotePlugin;

impl Plugin for BlockquotePlugin {
    fn name(&self) -> &str {
        "blockquote"
    }

    fn nodes(&self) -> Vec<(String, NodeSpec)> {
        vec![node(
            "blockquote",
            NodeSpec::new()
                .content("block+")
                .group("block")
                .render_hint("blockquote"),
        )]
    }

    fn keymap(&self) -> Vec<(String, BoxedCommand)> {
        named_bindings(&[("Mod-Shift-b", "wrap_in_blockquote")])
    }
}

#[derive(Debug, Default)]
pub struct CodeBlockPlugin;

impl Plugin for CodeBlockPlugin {
    fn name(&self) -> &str {
        "code_block"
    }

    fn nodes(&self) -> Vec<(String, NodeSpec)> {
        vec![node(
            "code_block",
            NodeSpec::new()
                .content("text*")
                .group("block")
                .marks("")
                .code()
                .render_hint("pre"),
        )]
    }

    fn keymap(&self) -> Vec<(String, BoxedCommand)> {
        named_bindings(&[
            ("Enter", "newline_in_code"),
            ("Mod-Alt-c", "toggle_code_block"),
        ])
    }
}

#[derive(Debug, Default)]
pub struct HorizontalRulePlugin;

impl Plugin for HorizontalRulePlugin {
    fn name(&self) -> &str {
        "horizontal_rule"
    }

    fn nodes(&self) -> Vec<(String, NodeSpec)> {
        vec![node(
            "horizontal_rule",
            NodeSpec::new().group("block").render_hint("hr"),
        )]
    }

    fn keymap(&self) -> Vec<(String, BoxedCommand)> {
        named_bindings(&[("Mod-_", "insert_horizontal_rule")])
    }
}

#[derive(Debug, Default)]
pub struct ListsPlugin;

impl Plugin for ListsPlugin {
    fn name(&self) -> &str {
        "lists"
    }

    fn nodes(&self) -> Vec<(String, NodeSpec)> {
        vec![
            node(
                "bullet_list",
                NodeSpec::new()
                    .content("list_item+")
                    .group("block")
                    .render_hint("ul"),
            ),
            node(
                "ordered_list",
                NodeSpec::new()
                    .content("list_item+")
                    .group("block")
                    .attr("order", 1)
                    .render_hint("ol"),
            ),
            node(
                "list_item",
                NodeSpec::new()
                    .content("paragraph block*")
                    .render_hint("li"),
            ),
        ]
    }

    fn keymap(&self) -> Vec<(String, BoxedCommand)> {
        named_bindings(&[
            ("Enter", "split_list_item"),
            ("Tab", "sink_list_item"),
            ("Shift-Tab", "lift_list_item"),
            ("Mod-Shift-8", "toggle_bullet_list"),
            ("Mod-Shift-7", "toggle_ordered_list"),
        ])
    }
}

/// Keeps a default textblock at the end of the document so there is always
/// somewhere to type after a list, quote or rule.
#[derive(Debug, Default)]
pub struct TrailingParagraphPlugin;

impl Plugin for TrailingParagraphPlugin {
    fn name(&self) -> &str {
        "trailing_paragraph"
    }

    fn filter_transaction(&self, mut tr: Transaction, _state: &EditorState) -> Option<Transaction> {
        if !tr.doc_changed() {
            return Some(tr);
        }
        let schema = tr.schema().clone();
        let Some(default) = schema.default_textblock() else {
            return Some(tr);
        };
        let ends_with_default = tr
            .doc()
            .last_child()
            .is_some_and(|last| last.node_type() == default);
        if ends_with_default {
            return Some(tr);
        }
        let end = tr.doc().content_size();
        let appended = schema
            .node(default, Attrs::new(), [])
            .and_then(|paragraph| tr.insert_nodes(end, [paragraph]).map(|_| ()));
        if let Err(err) = appended {
            log::debug!("trailing_paragraph: cannot append: {err}");
        }
        Some(tr)
    }
}

/// The plugins every editor starts with, in binding precedence order
/// (later plugins win).
pub fn default_plugins() -> Vec<Box<dyn Plugin>> {
    vec![
        Box::new(CorePlugin),
        Box::new(HeadingPlugin),
        Box::new(BlockquotePlugin),
        Box::new(CodeBlockPlugin),
        Box::new(HorizontalRulePlugin),
        Box::new(ListsPlugin),
        Box::new(TrailingParagraphPlugin),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Schema, SchemaError, basic_schema};
    use crate::{blockquote, doc, li, p, ul};
    use pretty_assertions::assert_eq;

    fn state(doc: crate::model::Node) -> EditorState {
        EditorState::create(basic_schema(), Some(doc))
    }

    #[test]
    fn test_default_plugins_build_a_schema() {
        let schema = Schema::from_plugins(&default_plugins()).unwrap();
        for name in ["doc", "paragraph", "heading", "blockquote", "code_block", "bullet_list", "list_item"] {
            assert!(schema.node_type(name).is_some(), "missing {name}");
        }
        assert!(schema.mark_type("link").is_some());
    }

    #[test]
    fn test_duplicate_plugin_is_fatal() {
        let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(CorePlugin), Box::new(CorePlugin)];
        assert!(matches!(
            Schema::from_plugins(&plugins).unwrap_err(),
            SchemaError::DuplicateNodeType { .. }
        ));
    }

    #[test]
    fn test_keymaps_resolve_every_name() {
        for plugin in default_plugins() {
            let pairs = plugin.keymap();
            assert!(
                pairs.iter().all(|(key, _)| !key.is_empty()),
                "{} has an empty key",
                plugin.name()
            );
        }
        assert_eq!(CorePlugin.keymap().len(), 20);
        assert_eq!(HeadingPlugin.keymap().len(), 7);
    }

    // ============ trailing paragraph ============

    #[test]
    fn test_trailing_paragraph_appended_after_structure() {
        let s = state(doc![p!("a")]);
        let mut tr = s.tr();
        tr.wrap_in(0, 3, "blockquote", Attrs::new()).unwrap();
        let tr = TrailingParagraphPlugin.filter_transaction(tr, &s).unwrap();
        assert_eq!(tr.doc(), &doc![blockquote!(p!("a")), p!()]);
    }

    #[test]
    fn test_trailing_paragraph_leaves_plain_documents() {
        let s = state(doc![ul!(li!(p!("a")))]);
        let untouched = TrailingParagraphPlugin.filter_transaction(s.tr(), &s).unwrap();
        assert!(!untouched.doc_changed());

        let s = state(doc![p!("a")]);
        let mut tr = s.tr();
        tr.insert_text(2, "b").unwrap();
        let tr = TrailingParagraphPlugin.filter_transaction(tr, &s).unwrap();
        assert_eq!(tr.doc(), &doc![p!("ab")]);
    }
}
