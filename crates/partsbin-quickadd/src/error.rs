use thiserror::Error;

use crate::form::FormField;
use crate::wizard::Step;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: FormField,
    pub message: String,
}

impl FieldError {
    pub(crate) fn new(field: FormField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field.label(), self.message)
    }
}

#[derive(Debug, Error)]
pub enum QuickAddError {
    /// The part search call failed. The query is kept so the user can retry.
    #[error("search failed: {0}")]
    SearchFailed(String),

    /// Local form checks failed; nothing was sent.
    #[error("{} field(s) need attention: {}", .0.len(), join_fields(.0))]
    ValidationFailed(Vec<FieldError>),

    /// Creating the part and stock entry failed; no images were transferred.
    #[error("{0}")]
    CreateFailed(String),

    #[error("search query must not be empty")]
    EmptyQuery,

    #[error("a search is already in progress")]
    SearchInProgress,

    #[error("the part is already being saved")]
    SubmitInProgress,

    #[error("part {part_id} was already created from this form")]
    AlreadyCommitted { part_id: i64 },

    #[error("this action needs the {expected} step, but the wizard is on {actual}")]
    WrongStep { expected: Step, actual: Step },

    #[error("no search result at position {0}")]
    NoSuchCandidate(usize),

    #[error("at most {max} images can be attached to a part")]
    ImageLimitReached { max: usize },

    #[error("image {0} is not among the current suggestions")]
    UnknownImage(String),

    #[error("no specification field named \"{0}\"")]
    UnknownSpecField(String),

    #[error("specification fields are still loading")]
    NotReady,

    #[error("preference store at {path}: {reason}")]
    Preferences { path: String, reason: String },
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
