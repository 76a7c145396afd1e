//! Trait abstractions for the form spec provider and submission sink to enable mocking in tests

use crate::notify::RenderedNotification;
use crate::state::{FormSpec, FormValues, SpecError};
use async_trait::async_trait;
use serde::Serialize;

/// A completed, validated submission handed to the sink
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub form_id: String,
    pub values: FormValues,
    pub notification: RenderedNotification,
}

/// Outcome reported by the sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub success: bool,
    /// Operator-facing detail; never shown to the user on failure
    pub message: String,
}

impl SubmissionReceipt {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Source of form specifications keyed by form id
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpecProvider: Send + Sync {
    /// Load and validate a spec; a missing form is `SpecError::NotFound`
    async fn load_spec(&self, form_id: &str) -> Result<FormSpec, SpecError>;
}

/// Destination for finished submissions
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn submit(&self, submission: &Submission) -> SubmissionReceipt;
}
