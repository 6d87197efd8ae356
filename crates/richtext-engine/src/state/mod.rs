//! Immutable editor state snapshots.

pub mod selection;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::error::ModelError;
use crate::model::{MarkSet, Node};
use crate::schema::Schema;
use crate::transform::Transaction;

pub use selection::{Selection, TextCoords, textblock_ranges};

/// Identifies one state. Transactions remember the id of the state they
/// were started from so that applying them to another one is caught.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(Uuid);

impl StateId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("transaction was built from state {found}, not {expected}")]
    StaleTransaction { expected: StateId, found: StateId },

    #[error("invalid document: {0}")]
    InvalidDocument(#[from] ModelError),

    #[error("transaction rejected by plugin `{0}`")]
    Rejected(String),
}

/// A document together with its selection and stored marks.
///
/// States are never modified. [`EditorState::apply`] builds a new state
/// from a transaction; the old one stays valid and shares every node the
/// transaction did not touch.
#[derive(Debug, Clone)]
pub struct EditorState {
    id: StateId,
    schema: Arc<Schema>,
    doc: Node,
    selection: Selection,
    stored_marks: Option<MarkSet>,
}

impl EditorState {
    /// A state holding `doc`, or the smallest valid document when `doc` is
    /// `None`, with the cursor at the first text position.
    pub fn create(schema: Arc<Schema>, doc: Option<Node>) -> Self {
        let doc = doc
            .or_else(|| schema.create_and_fill(schema.top_node_type()))
            .unwrap_or_else(|| Node::container(schema.top_node_type(), Default::default(), Default::default()));
        let selection = Selection::near(&doc, &schema, 0);
        Self {
            id: StateId::new(),
            schema,
            doc,
            selection,
            stored_marks: None,
        }
    }

    /// A state with an explicit selection; the document is validated.
    pub fn create_with_selection(
        schema: Arc<Schema>,
        doc: Node,
        selection: Selection,
    ) -> Result<Self, StateError> {
        schema.check(&doc)?;
        let size = doc.content_size();
        if selection.anchor > size || selection.head > size {
            return Err(ModelError::PositionOutOfRange {
                pos: selection.anchor.max(selection.head),
                size,
            }
            .into());
        }
        Ok(Self {
            id: StateId::new(),
            schema,
            doc,
            selection,
            stored_marks: None,
        })
    }

    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn stored_marks(&self) -> Option<&MarkSet> {
        self.stored_marks.as_ref()
    }

    /// Start a transaction against this state.
    pub fn tr(&self) -> Transaction {
        Transaction::new(
            self.id,
            self.schema.clone(),
            self.doc.clone(),
            self.selection,
            self.stored_marks.clone(),
        )
    }

    /// The state after `tr`.
    pub fn apply(&self, tr: &Transaction) -> Result<EditorState, StateError> {
        if tr.base() != self.id {
            log::warn!("stale transaction from {} applied to {}", tr.base(), self.id);
            return Err(StateError::StaleTransaction {
                expected: self.id,
                found: tr.base(),
            });
        }
        let doc = tr.doc().clone();
        debug_assert!(
            self.schema.check(&doc).is_ok(),
            "transaction produced an invalid document: {doc}"
        );
        Ok(EditorState {
            id: StateId::new(),
            schema: self.schema.clone(),
            selection: tr.selection(),
            stored_marks: tr.stored_marks().cloned(),
            doc,
        })
    }
}
