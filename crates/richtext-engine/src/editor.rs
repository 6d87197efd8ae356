//! The editor host: owns the current state, the history and the plugins,
//! and runs every transaction through the dispatch pipeline.

use std::sync::Arc;

use thiserror::Error;

use crate::commands::{self, Command, InsertText};
use crate::history::{History, HistoryOptions};
use crate::keymap::{Keymap, KeymapError, Platform, normalize_key};
use crate::model::Node;
use crate::plugin::{Plugin, TrailingParagraphPlugin, default_plugins};
use crate::schema::{Schema, SchemaError};
use crate::state::{EditorState, Selection, StateError};
use crate::transform::Transaction;

#[derive(Debug, Clone)]
pub struct EditorOptions {
    pub history: HistoryOptions,
    pub platform: Platform,
    /// Keep an empty paragraph at the end of the document.
    pub trailing_paragraph: bool,
    /// Extra key bindings as (key, command name), tried before any plugin
    /// binding for the same key.
    pub bindings: Vec<(String, String)>,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            history: HistoryOptions::default(),
            platform: Platform::current(),
            trailing_paragraph: true,
            bindings: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("invalid schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("invalid key binding: {0}")]
    Keymap(#[from] KeymapError),

    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error(transparent)]
    State(#[from] StateError),
}

pub struct Editor {
    plugins: Vec<Box<dyn Plugin>>,
    schema: Arc<Schema>,
    keymap: Keymap,
    history: History,
    state: EditorState,
}

impl Editor {
    /// An editor with the built-in plugins and an empty document.
    pub fn new(options: EditorOptions) -> Result<Self, EditorError> {
        let plugins = default_plugins()
            .into_iter()
            .filter(|plugin| {
                options.trailing_paragraph || plugin.name() != TrailingParagraphPlugin.name()
            })
            .collect();
        Self::with_plugins(plugins, options)
    }

    pub fn with_plugins(
        plugins: Vec<Box<dyn Plugin>>,
        options: EditorOptions,
    ) -> Result<Self, EditorError> {
        let schema = Arc::new(Schema::from_plugins(&plugins)?);
        let overrides = options
            .bindings
            .iter()
            .map(|(key, name)| {
                commands::named(name)
                    .map(|command| (key.clone(), command))
                    .ok_or_else(|| EditorError::UnknownCommand(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let keymap = Keymap::from_plugins(&plugins, overrides, options.platform)?;
        let state = EditorState::create(schema.clone(), None);
        log::info!(
            "editor ready with plugins: {}",
            plugins
                .iter()
                .map(|plugin| plugin.name())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(Self {
            plugins,
            schema,
            keymap,
            history: History::new(options.history),
            state,
        })
    }

    /// Replace the document. The history is cleared.
    pub fn load(&mut self, doc: Node) -> Result<(), EditorError> {
        let selection = Selection::near(&doc, &self.schema, 0);
        let state = EditorState::create_with_selection(self.schema.clone(), doc, selection)?;
        self.history.clear();
        self.install(state);
        Ok(())
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Run `tr` through the plugin filters, apply it, record history and
    /// notify plugins.
    pub fn dispatch(&mut self, tr: Transaction) -> Result<(), EditorError> {
        let mut tr = tr;
        for plugin in &self.plugins {
            match plugin.filter_transaction(tr, &self.state) {
                Some(next) => tr = next,
                None => {
                    log::warn!("transaction dropped by plugin `{}`", plugin.name());
                    return Err(StateError::Rejected(plugin.name().to_string()).into());
                }
            }
        }
        let next = self.state.apply(&tr)?;
        if tr.doc_changed() && tr.add_to_history() {
            self.history.push_state(self.state.clone());
        }
        log::debug!(
            "applied {} steps, selection {}..{}",
            tr.steps().len(),
            next.selection().anchor,
            next.selection().head
        );
        self.install(next);
        Ok(())
    }

    fn install(&mut self, next: EditorState) {
        let old = std::mem::replace(&mut self.state, next);
        for plugin in &self.plugins {
            plugin.state_did_update(&self.state, &old);
        }
    }

    /// Run `command` against the current state, dispatching what it builds.
    pub fn execute(&mut self, command: &dyn Command) -> Result<bool, EditorError> {
        let mut planned = None;
        let applied = command.execute(&self.state, Some(&mut |tr: Transaction| {
            planned.get_or_insert(tr);
        }));
        if let Some(tr) = planned {
            self.dispatch(tr)?;
        }
        Ok(applied)
    }

    pub fn can_execute(&self, command: &dyn Command) -> bool {
        command.execute(&self.state, None)
    }

    /// Run a command from the named registry.
    pub fn run_named(&mut self, name: &str) -> Result<bool, EditorError> {
        let command =
            commands::named(name).ok_or_else(|| EditorError::UnknownCommand(name.to_string()))?;
        self.execute(command.as_ref())
    }

    /// Handle a key press. Returns whether anything handled it.
    pub fn handle_key(&mut self, key: &str) -> Result<bool, EditorError> {
        let platform = self.keymap.platform();
        let normalized = normalize_key(key, platform)?;
        let is = |binding: &str| normalize_key(binding, platform).is_ok_and(|k| k == normalized);
        if is("Mod-z") {
            return Ok(self.undo());
        }
        if is("Mod-y") || is("Mod-Shift-z") {
            return Ok(self.redo());
        }
        match self.keymap.lookup(&normalized) {
            Some(chain) => self.execute(&chain),
            None => Ok(false),
        }
    }

    pub fn type_text(&mut self, text: &str) -> Result<bool, EditorError> {
        self.execute(&InsertText::new(text))
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo(self.state.clone()) {
            Some(previous) => {
                self.install(previous);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(self.state.clone()) {
            Some(next) => {
                self.install(next);
                true
            }
            None => false,
        }
    }

    pub fn set_selection(&mut self, selection: Selection) -> Result<(), EditorError> {
        let mut tr = self.state.tr();
        tr.set_selection(selection).map_err(StateError::from)?;
        self.dispatch(tr)
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("doc", self.state.doc())
            .field("selection", &self.state.selection())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::*;
    use crate::{blockquote, doc, p};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn editor() -> Editor {
        Editor::new(EditorOptions {
            platform: Platform::Other,
            ..EditorOptions::default()
        })
        .unwrap()
    }

    #[test]
    fn test_typing_into_empty_document() {
        let mut editor = editor();
        let before = editor.state().doc().content_size();
        assert!(editor.type_text("hi").unwrap());
        assert_eq!(editor.state().doc(), &doc![p!("hi")]);
        assert_eq!(editor.state().doc().content_size(), before + 2);
        assert_eq!(editor.state().selection(), Selection::cursor(3));
    }

    #[test]
    fn test_keys_run_bound_commands() {
        let mut editor = editor();
        editor.type_text("ab").unwrap();
        assert!(editor.handle_key("Mod-a").unwrap());
        assert!(editor.handle_key("Ctrl-b").unwrap());
        assert_eq!(editor.state().doc(), &doc![p!(strong("ab"))]);
        assert!(!editor.handle_key("F13").unwrap());
    }

    #[test]
    fn test_select_all_then_type_and_enter() {
        let mut editor = editor();
        editor.load(doc![p!("ab"), p!("cd")]).unwrap();
        assert!(editor.handle_key("Mod-a").unwrap());
        assert!(editor.type_text("x").unwrap());
        assert_eq!(editor.state().doc(), &doc![p!("x")]);

        assert!(editor.handle_key("Mod-a").unwrap());
        assert!(editor.handle_key("Enter").unwrap());
        assert_eq!(editor.state().doc(), &doc![p!(), p!()]);
        assert_eq!(editor.state().selection(), Selection::cursor(3));
    }

    #[test]
    fn test_undo_and_redo_keys() {
        let mut editor = editor();
        editor.type_text("a").unwrap();
        editor.type_text("b").unwrap();
        assert!(editor.handle_key("Mod-z").unwrap());
        assert_eq!(editor.state().doc(), &doc![p!()]);
        assert!(editor.handle_key("Shift-Mod-z").unwrap());
        assert_eq!(editor.state().doc(), &doc![p!("ab")]);
        assert!(!editor.handle_key("Mod-y").unwrap());
    }

    #[test]
    fn test_selection_changes_skip_history() {
        let mut editor = editor();
        editor.load(doc![p!("abc")]).unwrap();
        editor.set_selection(Selection::new(1, 3)).unwrap();
        assert!(!editor.history().can_undo());
    }

    #[test]
    fn test_trailing_paragraph_after_quote() {
        let mut editor = editor();
        editor.load(doc![p!("a")]).unwrap();
        assert!(editor.handle_key("Mod-Shift-b").unwrap());
        assert_eq!(editor.state().doc(), &doc![blockquote!(p!("a")), p!()]);
    }

    #[test]
    fn test_trailing_paragraph_can_be_disabled() {
        let mut editor = Editor::new(EditorOptions {
            trailing_paragraph: false,
            platform: Platform::Other,
            ..EditorOptions::default()
        })
        .unwrap();
        editor.load(doc![p!("a")]).unwrap();
        editor.run_named("wrap_in_blockquote").unwrap();
        assert_eq!(editor.state().doc(), &doc![blockquote!(p!("a"))]);
    }

    #[test]
    fn test_configured_binding() {
        let mut editor = Editor::new(EditorOptions {
            platform: Platform::Other,
            bindings: vec![("Ctrl-q".into(), "wrap_in_blockquote".into())],
            ..EditorOptions::default()
        })
        .unwrap();
        editor.load(doc![p!("a")]).unwrap();
        assert!(editor.handle_key("Ctrl-q").unwrap());

        let err = Editor::new(EditorOptions {
            bindings: vec![("Ctrl-q".into(), "explode".into())],
            ..EditorOptions::default()
        })
        .unwrap_err();
        assert!(matches!(err, EditorError::UnknownCommand(name) if name == "explode"));
    }

    #[test]
    fn test_load_rejects_invalid_document() {
        let mut editor = editor();
        let bad = Node::container("doc", Default::default(), Default::default());
        assert!(matches!(
            editor.load(bad),
            Err(EditorError::State(StateError::InvalidDocument(_)))
        ));
    }

    // ============ plugin hooks ============

    struct Veto;

    impl Plugin for Veto {
        fn name(&self) -> &str {
            "veto"
        }

        fn filter_transaction(&self, tr: Transaction, _: &EditorState) -> Option<Transaction> {
            (!tr.doc_changed()).then_some(tr)
        }
    }

    struct Counter(Arc<AtomicUsize>);

    impl Plugin for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        fn state_did_update(&self, _: &EditorState, _: &EditorState) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_filter_can_reject() {
        let mut plugins = default_plugins();
        plugins.push(Box::new(Veto));
        let mut editor = Editor::with_plugins(plugins, EditorOptions::default()).unwrap();
        let err = editor.type_text("x").unwrap_err();
        assert!(matches!(err, EditorError::State(StateError::Rejected(name)) if name == "veto"));
        assert_eq!(editor.state().doc(), &doc![p!()]);
        editor.set_selection(Selection::cursor(1)).unwrap();
    }

    #[test]
    fn test_plugins_are_notified() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut plugins = default_plugins();
        plugins.push(Box::new(Counter(count.clone())));
        let mut editor = Editor::with_plugins(plugins, EditorOptions::default()).unwrap();
        editor.type_text("a").unwrap();
        editor.undo();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
