//! Error taxonomy for form loading, validation, rendering and submission

use crate::notify::TemplateError;
use crate::state::SpecError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A single per-field validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub key: String,
    pub message: String,
}

impl FieldError {
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.message)
    }
}

/// Errors surfaced by the form runtime
#[derive(Debug, Error)]
pub enum FormError {
    /// The form specification is malformed; fatal at load time
    #[error(transparent)]
    SpecInvalid(#[from] SpecError),

    /// Advancing was attempted with one or more field errors present
    #[error("step blocked by {} field error(s)", .0.len())]
    StepBlocked(Vec<FieldError>),

    /// The notification template has malformed placeholder syntax
    #[error(transparent)]
    TemplateInvalid(#[from] TemplateError),

    /// The submission sink reported failure (message is operator-facing only)
    #[error("submission failed: {0}")]
    SubmissionFailed(String),
}

impl FormError {
    /// Field errors carried by a blocked step, empty for every other variant
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            FormError::StepBlocked(errors) => errors,
            _ => &[],
        }
    }
}
