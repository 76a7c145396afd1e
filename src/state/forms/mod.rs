//! Form domain layer
//!
//! Declarative form specifications, the step engine driving them and the
//! submission state a session mutates.

mod field;
mod form_state;
mod spec;
mod steps;

pub use field::{FieldKind, FieldValue, FormValues};
pub use form_state::{SubmissionState, WizardPhase};
pub use spec::{FormSpec, NotificationTemplate, SpecError, TemplateLine, TemplateSection};
pub use steps::{
    build_step_list, step_title, validate_submission, visible_fields, StepField,
    COMPLIANCE_STEP_TITLE,
};

#[cfg(test)]
pub use field::FieldSpec;
#[cfg(test)]
pub use spec::{ComplianceField, ComplianceKind};
#[cfg(test)]
pub use steps::default_values;
