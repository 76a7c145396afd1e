//! Collaborators that supply form specs and accept finished submissions

mod outbox;
mod traits;

pub use outbox::{FileSpecProvider, OutboxSink};
pub use traits::{SpecProvider, Submission, SubmissionSink};

#[cfg(test)]
pub use traits::{MockSpecProvider, MockSubmissionSink, SubmissionReceipt};
