//! Submission state and the step transition state machine

use super::field::{FieldValue, FormValues};
use super::spec::FormSpec;
use super::steps::{default_values, step_count, step_of_key, touched_key, validate_step};
use crate::error::{FieldError, FormError};
use std::collections::HashSet;

/// Where the user is in the wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardPhase {
    Editing(usize),
    ReadyToSubmit,
    Submitted,
}

/// Values and progress of one in-flight form session
#[derive(Debug, Clone)]
pub struct SubmissionState {
    pub values: FormValues,
    pub touched_keys: HashSet<String>,
    phase: WizardPhase,
    step_count: usize,
}

impl SubmissionState {
    /// Fresh state: default values, first step, nothing touched
    pub fn reset(spec: &FormSpec) -> Self {
        Self {
            values: default_values(spec),
            touched_keys: HashSet::new(),
            phase: WizardPhase::Editing(0),
            step_count: step_count(spec),
        }
    }

    pub fn phase(&self) -> WizardPhase {
        self.phase
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Index of the current step; equals `step_count` once editing is done
    pub fn current_step_index(&self) -> usize {
        match self.phase {
            WizardPhase::Editing(index) => index,
            WizardPhase::ReadyToSubmit | WizardPhase::Submitted => self.step_count,
        }
    }

    pub fn is_last_step(&self) -> bool {
        self.phase == WizardPhase::Editing(self.step_count.saturating_sub(1))
    }

    pub fn value(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    /// Record user input for a field and mark it touched
    pub fn set_value(&mut self, spec: &FormSpec, key: &str, value: FieldValue) {
        if spec.compliance_field(key).is_some() {
            self.values
                .insert(touched_key(key), FieldValue::Bool(true));
        }
        self.values.insert(key.to_string(), value);
        self.touched_keys.insert(key.to_string());
    }

    /// Validate the current step and move forward on success
    pub fn advance(&mut self, spec: &FormSpec) -> Result<WizardPhase, FormError> {
        let WizardPhase::Editing(index) = self.phase else {
            return Ok(self.phase);
        };

        if let Err(errors) = validate_step(spec, index, &self.values) {
            self.touched_keys
                .extend(errors.iter().map(|e| e.key.clone()));
            tracing::warn!(
                "Step {} blocked by {} field error(s)",
                index,
                errors.len()
            );
            return Err(FormError::StepBlocked(errors));
        }

        self.phase = if index + 1 < self.step_count {
            WizardPhase::Editing(index + 1)
        } else {
            WizardPhase::ReadyToSubmit
        };
        tracing::debug!("Advanced from step {index} to {:?}", self.phase);
        Ok(self.phase)
    }

    /// Step back without validating; never fails
    pub fn retreat(&mut self) {
        self.phase = match self.phase {
            WizardPhase::Editing(index) => WizardPhase::Editing(index.saturating_sub(1)),
            WizardPhase::ReadyToSubmit => {
                WizardPhase::Editing(self.step_count.saturating_sub(1))
            }
            WizardPhase::Submitted => WizardPhase::Submitted,
        };
    }

    /// Return to the step holding the first error of a rejected submission.
    /// The error keys are marked touched so they show inline.
    pub fn reopen_for_errors(&mut self, spec: &FormSpec, errors: &[FieldError]) -> WizardPhase {
        if self.phase == WizardPhase::Submitted {
            return self.phase;
        }
        self.touched_keys
            .extend(errors.iter().map(|e| e.key.clone()));
        let step = errors
            .first()
            .and_then(|e| step_of_key(spec, &e.key))
            .unwrap_or(self.step_count.saturating_sub(1));
        self.phase = WizardPhase::Editing(step);
        self.phase
    }

    /// Record a successful handoff; only valid from `ReadyToSubmit`
    pub fn mark_submitted(&mut self) -> bool {
        if self.phase == WizardPhase::ReadyToSubmit {
            self.phase = WizardPhase::Submitted;
            true
        } else {
            false
        }
    }

    /// Current-step errors for fields the user has already interacted with
    pub fn visible_errors(&self, spec: &FormSpec) -> Vec<FieldError> {
        let WizardPhase::Editing(index) = self.phase else {
            return Vec::new();
        };
        validate_step(spec, index, &self.values)
            .err()
            .unwrap_or_default()
            .into_iter()
            .filter(|e| self.touched_keys.contains(&e.key))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::forms::field::{FieldKind, FieldSpec};
    use crate::state::forms::spec::{ComplianceField, ComplianceKind};

    fn two_group_spec() -> FormSpec {
        FormSpec::new("quote", "Quote")
            .with_group(
                "Contact",
                vec![FieldSpec::new("contactEmail", "Email", FieldKind::Email).required(true)],
            )
            .with_group(
                "Load Info",
                vec![
                    FieldSpec::new("isHazmat", "Hazmat?", FieldKind::YesNo)
                        .with_options(&["Yes", "No"]),
                    FieldSpec::new("unNumber", "UN Number", FieldKind::Text)
                        .visible_when("isHazmat", "Yes"),
                ],
            )
            .with_compliance(ComplianceField::new(
                ComplianceKind::Consent,
                "I accept the terms",
                true,
            ))
    }

    fn blocked_keys(result: Result<WizardPhase, FormError>) -> Vec<String> {
        match result {
            Err(FormError::StepBlocked(errors)) => errors.into_iter().map(|e| e.key).collect(),
            other => panic!("expected StepBlocked, got {other:?}"),
        }
    }

    #[test]
    fn test_reset_state() {
        let spec = two_group_spec();
        let state = SubmissionState::reset(&spec);
        assert_eq!(state.phase(), WizardPhase::Editing(0));
        assert_eq!(state.step_count(), 3);
        assert!(state.touched_keys.is_empty());
        assert_eq!(state.value("isHazmat"), Some(&FieldValue::YesNo(false)));
    }

    #[test]
    fn test_end_to_end_walkthrough() {
        let spec = two_group_spec();
        let mut state = SubmissionState::reset(&spec);

        assert_eq!(blocked_keys(state.advance(&spec)), vec!["contactEmail"]);
        assert_eq!(state.phase(), WizardPhase::Editing(0));
        assert!(state.touched_keys.contains("contactEmail"));

        state.set_value(&spec, "contactEmail", FieldValue::Text("a@b.com".to_string()));
        assert_eq!(state.advance(&spec).unwrap(), WizardPhase::Editing(1));

        state.set_value(&spec, "isHazmat", FieldValue::YesNo(true));
        assert_eq!(blocked_keys(state.advance(&spec)), vec!["unNumber"]);
        assert_eq!(state.current_step_index(), 1);

        state.set_value(&spec, "unNumber", FieldValue::Text("UN1230".to_string()));
        assert_eq!(state.advance(&spec).unwrap(), WizardPhase::Editing(2));
        assert!(state.is_last_step());

        assert_eq!(blocked_keys(state.advance(&spec)), vec!["termsAccepted"]);

        state.set_value(&spec, "termsAccepted", FieldValue::Bool(true));
        assert_eq!(state.advance(&spec).unwrap(), WizardPhase::ReadyToSubmit);
        assert_eq!(state.current_step_index(), 3);
        assert_eq!(state.value("termsAcceptedTouched"), Some(&FieldValue::Bool(true)));
    }

    #[test]
    fn test_retreat_then_advance_is_idempotent() {
        let spec = two_group_spec();
        let mut state = SubmissionState::reset(&spec);
        state.set_value(&spec, "contactEmail", FieldValue::Text("a@b.com".to_string()));
        state.advance(&spec).unwrap();

        state.retreat();
        assert_eq!(state.phase(), WizardPhase::Editing(0));
        assert_eq!(state.advance(&spec).unwrap(), WizardPhase::Editing(1));
        assert!(state.visible_errors(&spec).is_empty());
    }

    #[test]
    fn test_retreat_floors_at_zero_and_skips_validation() {
        let spec = two_group_spec();
        let mut state = SubmissionState::reset(&spec);
        state.retreat();
        assert_eq!(state.phase(), WizardPhase::Editing(0));

        state.set_value(&spec, "contactEmail", FieldValue::Text("a@b.com".to_string()));
        state.advance(&spec).unwrap();
        state.set_value(&spec, "isHazmat", FieldValue::YesNo(true));
        state.retreat();
        assert_eq!(state.phase(), WizardPhase::Editing(0));
    }

    #[test]
    fn test_retreat_from_ready_returns_to_last_step() {
        let spec = FormSpec::new("x", "X");
        let mut state = SubmissionState::reset(&spec);
        assert_eq!(state.advance(&spec).unwrap(), WizardPhase::ReadyToSubmit);
        state.retreat();
        assert_eq!(state.phase(), WizardPhase::Editing(0));
    }

    #[test]
    fn test_mark_submitted_only_from_ready() {
        let spec = FormSpec::new("x", "X");
        let mut state = SubmissionState::reset(&spec);
        assert!(!state.mark_submitted());
        state.advance(&spec).unwrap();
        assert!(state.mark_submitted());
        assert_eq!(state.phase(), WizardPhase::Submitted);

        // terminal until reset
        assert_eq!(state.advance(&spec).unwrap(), WizardPhase::Submitted);
        state.retreat();
        assert_eq!(state.phase(), WizardPhase::Submitted);
    }

    #[test]
    fn test_reopen_for_errors_jumps_to_declaring_step() {
        let spec = two_group_spec();
        let mut state = SubmissionState::reset(&spec);
        state.set_value(&spec, "contactEmail", FieldValue::Text("a@b.com".to_string()));
        state.advance(&spec).unwrap();
        state.advance(&spec).unwrap();
        state.set_value(&spec, "termsAccepted", FieldValue::Bool(true));
        assert_eq!(state.advance(&spec).unwrap(), WizardPhase::ReadyToSubmit);

        let errors = vec![FieldError::new("isHazmat", "Hazmat? is required")];
        assert_eq!(
            state.reopen_for_errors(&spec, &errors),
            WizardPhase::Editing(1)
        );
        assert!(state.touched_keys.contains("isHazmat"));
    }

    #[test]
    fn test_hidden_values_are_retained() {
        let spec = two_group_spec();
        let mut state = SubmissionState::reset(&spec);
        state.set_value(&spec, "isHazmat", FieldValue::YesNo(true));
        state.set_value(&spec, "unNumber", FieldValue::Text("UN1230".to_string()));
        state.set_value(&spec, "isHazmat", FieldValue::YesNo(false));
        assert_eq!(
            state.value("unNumber"),
            Some(&FieldValue::Text("UN1230".to_string()))
        );
    }

    #[test]
    fn test_visible_errors_only_for_touched_fields() {
        let spec = two_group_spec();
        let mut state = SubmissionState::reset(&spec);
        assert!(state.visible_errors(&spec).is_empty());

        state.set_value(&spec, "contactEmail", FieldValue::Text("nope".to_string()));
        let errors = state.visible_errors(&spec);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].key, "contactEmail");
    }
}
