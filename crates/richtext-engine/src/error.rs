use thiserror::Error;

/// Errors raised while constructing nodes or applying steps to a document.
///
/// Commands never surface these to the host: a command whose plan fails
/// reports `false` and logs the error at debug level.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("cannot construct `{node_type}`: {reason}")]
    Construction { node_type: String, reason: String },

    #[error("invalid content for `{parent}`: [{children}]")]
    SchemaViolation { parent: String, children: String },

    #[error("position {pos} is outside the document (0..={size})")]
    PositionOutOfRange { pos: usize, size: usize },

    #[error("step precondition failed: {0}")]
    StepPrecondition(String),
}

impl ModelError {
    pub(crate) fn construction(node_type: impl Into<String>, reason: impl Into<String>) -> Self {
        ModelError::Construction {
            node_type: node_type.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn precondition(reason: impl Into<String>) -> Self {
        ModelError::StepPrecondition(reason.into())
    }
}
