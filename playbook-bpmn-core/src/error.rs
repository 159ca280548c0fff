//! Error types for the playbook → BPMN pipeline.

use thiserror::Error;

/// Errors raised while converting one playbook.
///
/// `ModuleResolution` and `StructuralPolicy` are recovered locally and surface
/// as diagnostics. Everything else aborts the run.
#[derive(Debug, Error)]
pub enum PlaybookError {
    /// The source document does not have the expected shape.
    #[error("malformed playbook document: {0}")]
    Document(#[from] serde_yaml::Error),

    /// A module was found but could not be read or parsed.
    #[error("module '{module}' at {location}: {reason}")]
    ModuleResolution {
        module: String,
        location: String,
        reason: String,
    },

    /// A goto or branch target is not a sibling of its source activity.
    #[error("activity '{source_id}' references unknown sibling '{target}'")]
    Reference { source_id: String, target: String },

    /// Two flow elements of one container share an id.
    #[error("duplicate element id '{id}'")]
    DuplicateElement { id: String },

    /// A construct the lowering refuses to translate.
    #[error("structural policy violation at '{activity}': {reason}")]
    StructuralPolicy { activity: String, reason: String },

    /// XML writer failure.
    #[error("xml serialization failed: {0}")]
    Xml(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PlaybookError>;
