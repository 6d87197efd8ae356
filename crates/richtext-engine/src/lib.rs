//! A structured rich text editing engine.
//!
//! Documents are immutable trees validated against a [`Schema`]. Every
//! edit is a [`Transaction`] of invertible steps, built by [`commands`]
//! and applied to an [`EditorState`] to produce the next one. The
//! [`Editor`] ties states to undo history, plugins and key bindings.

pub mod builders;
pub mod commands;
pub mod editor;
pub mod error;
pub mod history;
pub mod keymap;
pub mod model;
pub mod plugin;
pub mod schema;
pub mod state;
pub mod transform;

pub use commands::{BoxedCommand, Chain, Command, Dispatch};
pub use editor::{Editor, EditorError, EditorOptions};
pub use error::ModelError;
pub use history::{History, HistoryOptions};
pub use keymap::{Keymap, KeymapError, Platform};
pub use model::{Attrs, Fragment, Mark, MarkSet, Node, ResolvedPos, Slice};
pub use plugin::{Plugin, default_plugins};
pub use schema::{Schema, SchemaError, basic_schema};
pub use state::{EditorState, Selection, StateError};
pub use transform::{Mapping, Step, Transaction};
