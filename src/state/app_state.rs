//! Application state definitions

use super::forms::{
    visible_fields, FieldKind, FieldValue, FormSpec, StepField, SubmissionState, WizardPhase,
};
use crate::error::FieldError;
use crate::notify::RenderedNotification;

/// Current view in the application
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum View {
    /// Waiting for the form spec provider
    #[default]
    Loading,
    Form,
    Submitted,
    /// The form could not be loaded; shown instead of an empty form
    Unavailable,
}

/// What the cursor is on, extracted so the session can be mutated afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
enum ActiveTarget {
    Input { key: String, kind: FieldKind },
    Compliance { key: String },
}

/// Main application state
#[derive(Debug, Default)]
pub struct AppState {
    pub current_view: View,
    pub form_id: String,
    pub spec: Option<FormSpec>,
    pub session: Option<SubmissionState>,

    // Cursor within the visible fields of the current step
    pub active_form_field: usize,

    /// A submission is in flight; further submits are ignored
    pub submitting: bool,

    pub status_message: Option<String>,
    pub error_message: Option<String>,
    pub unavailable_reason: Option<String>,
    pub last_notification: Option<RenderedNotification>,
}

impl AppState {
    /// Start a new session for a freshly loaded spec
    pub fn begin(&mut self, spec: FormSpec) {
        self.form_id = spec.id.clone();
        self.session = Some(SubmissionState::reset(&spec));
        self.spec = Some(spec);
        self.current_view = View::Form;
        self.active_form_field = 0;
        self.submitting = false;
        self.unavailable_reason = None;
    }

    /// Discard entered values and return to the first step
    pub fn reset_session(&mut self) {
        if let Some(spec) = &self.spec {
            self.session = Some(SubmissionState::reset(spec));
            self.current_view = View::Form;
        }
        self.active_form_field = 0;
        self.last_notification = None;
    }

    pub fn mark_unavailable(&mut self, reason: impl Into<String>) {
        self.current_view = View::Unavailable;
        self.unavailable_reason = Some(reason.into());
        self.spec = None;
        self.session = None;
    }

    pub fn phase(&self) -> Option<WizardPhase> {
        self.session.as_ref().map(SubmissionState::phase)
    }

    /// Fields shown on the current step, recomputed from the current values
    pub fn visible_fields(&self) -> Vec<StepField<'_>> {
        match (&self.spec, &self.session) {
            (Some(spec), Some(session)) => {
                visible_fields(spec, session.current_step_index(), &session.values)
            }
            _ => Vec::new(),
        }
    }

    pub fn active_field(&self) -> Option<StepField<'_>> {
        self.visible_fields().get(self.active_form_field).copied()
    }

    /// Errors to display inline on the current step
    pub fn field_errors(&self) -> Vec<FieldError> {
        match (&self.spec, &self.session) {
            (Some(spec), Some(session)) => session.visible_errors(spec),
            _ => Vec::new(),
        }
    }

    /// Move to next form field
    pub fn next_form_field(&mut self) {
        let count = self.visible_fields().len();
        if count > 0 {
            self.active_form_field = (self.active_form_field + 1) % count;
        }
    }

    /// Move to previous form field
    pub fn prev_form_field(&mut self) {
        let count = self.visible_fields().len();
        if count == 0 {
            return;
        }
        if self.active_form_field == 0 {
            self.active_form_field = count - 1;
        } else {
            self.active_form_field -= 1;
        }
    }

    /// Put the cursor on the field with the given key, if it is visible
    pub fn focus_field(&mut self, key: &str) {
        if let Some(index) = self.visible_fields().iter().position(|f| f.key() == key) {
            self.active_form_field = index;
        }
    }

    pub fn has_errors(&self) -> bool {
        self.error_message.is_some()
    }

    pub fn dismiss_error(&mut self) {
        self.error_message = None;
    }

    /// Keep the cursor on a visible field after visibility changed
    pub fn clamp_active_field(&mut self) {
        let count = self.visible_fields().len();
        if self.active_form_field >= count {
            self.active_form_field = count.saturating_sub(1);
        }
    }

    fn active_target(&self) -> Option<ActiveTarget> {
        self.active_field().map(|field| match field {
            StepField::Input(spec) => ActiveTarget::Input {
                key: spec.key.clone(),
                kind: spec.kind,
            },
            StepField::Compliance(spec) => ActiveTarget::Compliance {
                key: spec.key().to_string(),
            },
        })
    }

    fn set_value(&mut self, key: &str, value: FieldValue) {
        if let (Some(spec), Some(session)) = (&self.spec, &mut self.session) {
            session.set_value(spec, key, value);
        }
        self.clamp_active_field();
    }

    fn current_text(&self, key: &str) -> String {
        self.session
            .as_ref()
            .and_then(|s| s.value(key))
            .map(FieldValue::display_value)
            .unwrap_or_default()
    }

    /// Handle character input on a text-like field
    pub fn form_input_char(&mut self, c: char) {
        let Some(ActiveTarget::Input { key, kind }) = self.active_target() else {
            return;
        };
        if kind.is_toggle() || kind.has_options() {
            return;
        }
        let mut text = self.current_text(&key);
        text.push(c);
        self.set_value(&key, FieldValue::from_input(kind, &text));
    }

    /// Handle newline input; only multiline fields accept it
    pub fn form_newline(&mut self) -> bool {
        match self.active_target() {
            Some(ActiveTarget::Input { kind, .. }) if kind.is_multiline() => {
                self.form_input_char('\n');
                true
            }
            _ => false,
        }
    }

    /// Handle backspace in form
    pub fn form_backspace(&mut self) {
        let Some(ActiveTarget::Input { key, kind }) = self.active_target() else {
            return;
        };
        if kind.is_toggle() || kind.has_options() {
            return;
        }
        let mut text = self.current_text(&key);
        text.pop();
        self.set_value(&key, FieldValue::from_input(kind, &text));
    }

    /// Flip a yes/no, checkbox or compliance field; false when the cursor is elsewhere
    pub fn toggle_active_field(&mut self) -> bool {
        match self.active_target() {
            Some(ActiveTarget::Input { key, kind }) if kind.is_toggle() => {
                let current = self
                    .session
                    .as_ref()
                    .and_then(|s| s.value(&key))
                    .and_then(FieldValue::as_bool)
                    .unwrap_or(false);
                self.set_value(&key, FieldValue::YesNo(!current));
                true
            }
            Some(ActiveTarget::Compliance { key }) => {
                let current = self
                    .session
                    .as_ref()
                    .and_then(|s| s.value(&key))
                    .and_then(FieldValue::as_bool)
                    .unwrap_or(false);
                self.set_value(&key, FieldValue::Bool(!current));
                true
            }
            _ => false,
        }
    }

    /// Step through the options of a select, radio or yes/no field
    pub fn cycle_option(&mut self, forward: bool) {
        let Some(ActiveTarget::Input { key, kind }) = self.active_target() else {
            return;
        };
        if !kind.has_options() {
            return;
        }
        let Some(options) = self
            .spec
            .as_ref()
            .and_then(|spec| spec.field(&key))
            .map(|f| f.options.clone())
        else {
            return;
        };
        if options.is_empty() {
            return;
        }

        let current = self.current_text(&key);
        let next = match options.iter().position(|o| *o == current) {
            None => 0,
            Some(i) if forward => (i + 1) % options.len(),
            Some(0) => options.len() - 1,
            Some(i) => i - 1,
        };
        self.set_value(&key, FieldValue::from_input(kind, &options[next]));
    }
}
