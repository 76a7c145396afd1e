//! Application state and core logic

use crate::error::FormError;
use crate::notify::render_for_spec;
use crate::sink::{SpecProvider, Submission, SubmissionSink};
use crate::state::{
    build_step_list, validate_submission, AppState, FormSpec, SpecError, View, WizardPhase,
};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// User-facing text for a form that failed to load
pub const UNAVAILABLE_MESSAGE: &str = "This form is currently unavailable.";

/// Main application struct
pub struct App {
    /// Current application state
    pub state: AppState,
    /// Where form specs come from
    provider: Box<dyn SpecProvider>,
    /// Where finished submissions go
    sink: Box<dyn SubmissionSink>,
    /// Whether the app should quit
    quit: bool,
}

impl App {
    /// Create a new App instance
    pub fn new(provider: Box<dyn SpecProvider>, sink: Box<dyn SubmissionSink>) -> Self {
        Self {
            state: AppState::default(),
            provider,
            sink,
            quit: false,
        }
    }

    /// Check if app should quit
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Load a form by id; a missing or malformed spec leaves the app unavailable
    pub async fn load_form(&mut self, form_id: &str) {
        self.state.form_id = form_id.to_string();
        self.state.current_view = View::Loading;

        let loaded = self
            .provider
            .load_spec(form_id)
            .await
            .and_then(|spec| log_steps(&spec).map(|_| spec));

        match loaded {
            Ok(spec) => self.state.begin(spec),
            Err(err) => {
                // Details stay in the log
                let err = FormError::from(err);
                tracing::error!("Form {form_id} unavailable: {err}");
                self.state.mark_unavailable(UNAVAILABLE_MESSAGE);
            }
        }
    }

    /// Handle a key event
    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Handle error dialog dismissal first (modal)
        if self.state.has_errors() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.state.dismiss_error();
            }
            return Ok(());
        }

        // Clear any status messages on key press
        self.state.status_message = None;

        match self.state.current_view {
            View::Loading => {}
            View::Form => self.handle_form_key(key).await,
            View::Submitted => self.handle_submitted_key(key),
            View::Unavailable => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('q')) {
                    self.quit = true;
                }
            }
        }
        Ok(())
    }

    async fn handle_form_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('r') if ctrl => {
                self.state.reset_session();
                self.state.status_message = Some("Form cleared".to_string());
            }
            KeyCode::Char('s') if ctrl => self.advance_or_submit().await,
            KeyCode::Tab | KeyCode::Down => self.state.next_form_field(),
            KeyCode::BackTab | KeyCode::Up => self.state.prev_form_field(),
            KeyCode::Left => self.state.cycle_option(false),
            KeyCode::Right => self.state.cycle_option(true),
            KeyCode::Char(' ') => {
                if !self.state.toggle_active_field() {
                    self.state.form_input_char(' ');
                }
            }
            KeyCode::Char(c) if !ctrl => self.state.form_input_char(c),
            KeyCode::Backspace => self.state.form_backspace(),
            KeyCode::Enter => {
                // Enter in a multiline field adds a newline
                if !self.state.form_newline() {
                    self.advance_or_submit().await;
                }
            }
            KeyCode::Esc => self.go_back(),
            _ => {}
        }
    }

    fn handle_submitted_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.state.reset_session(),
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.state.reset_session()
            }
            KeyCode::Esc | KeyCode::Char('q') => self.quit = true,
            _ => {}
        }
    }

    /// Validate the current step and move on; submits once the last step passes
    pub async fn advance_or_submit(&mut self) {
        let (Some(spec), Some(session)) = (&self.state.spec, &mut self.state.session) else {
            return;
        };

        match session.advance(spec) {
            Ok(WizardPhase::Editing(step)) => {
                tracing::info!("Form {} moved to step {}", spec.id, step);
                self.state.active_form_field = 0;
            }
            Ok(WizardPhase::ReadyToSubmit) => self.submit().await,
            Ok(WizardPhase::Submitted) => {}
            Err(err) => {
                let first = err.field_errors().first().map(|e| e.key.clone());
                self.state.status_message = Some(format!(
                    "Please fix {} field(s) before continuing",
                    err.field_errors().len()
                ));
                if let Some(key) = first {
                    self.state.focus_field(&key);
                }
            }
        }
    }

    /// Step back one step without validating
    pub fn go_back(&mut self) {
        if let Some(session) = &mut self.state.session {
            session.retreat();
            self.state.active_form_field = 0;
        }
    }

    /// Hand the session to the sink; ignored while a submission is in flight
    pub async fn submit(&mut self) {
        if self.state.submitting {
            tracing::debug!("Submit ignored, submission already in flight");
            return;
        }
        let (Some(spec), Some(session)) = (&self.state.spec, &self.state.session) else {
            return;
        };
        if session.phase() != WizardPhase::ReadyToSubmit {
            return;
        }

        if let Err(errors) = validate_submission(spec, &session.values) {
            tracing::warn!(
                "Submission for {} rejected with {} field error(s)",
                spec.id,
                errors.len()
            );
            let (Some(spec), Some(session)) = (&self.state.spec, &mut self.state.session) else {
                return;
            };
            let phase = session.reopen_for_errors(spec, &errors);
            tracing::info!("Form {} reopened at {:?}", spec.id, phase);
            self.state.status_message = Some(format!(
                "Please fix {} field(s) before submitting",
                errors.len()
            ));
            self.state.active_form_field = 0;
            if let Some(first) = errors.first() {
                self.state.focus_field(&first.key);
            }
            return;
        }

        let submission = Submission {
            form_id: spec.id.clone(),
            values: session.values.clone(),
            notification: render_for_spec(spec, &session.values),
        };
        let success_message = spec.success_message.clone();
        let error_message = spec.error_message.clone();

        self.state.submitting = true;
        self.state.status_message = Some(spec.loading_label.clone());
        let receipt = self.sink.submit(&submission).await;
        self.state.submitting = false;

        if receipt.success {
            if let Some(session) = &mut self.state.session {
                session.mark_submitted();
            }
            tracing::info!("Form {} submitted", submission.form_id);
            self.state.current_view = View::Submitted;
            self.state.status_message = Some(success_message);
            self.state.last_notification = Some(submission.notification);
        } else {
            let err = FormError::SubmissionFailed(receipt.message);
            tracing::error!("Form {}: {err}", submission.form_id);
            self.state.status_message = None;
            self.state.error_message = Some(error_message);
            // Back onto the final step so the user can retry
            self.go_back();
        }
    }
}

/// Derive the step list once up front so a malformed spec never reaches the UI
fn log_steps(spec: &FormSpec) -> Result<(), SpecError> {
    let steps = build_step_list(spec)?;
    tracing::info!("Loaded form {spec} with {} step(s)", steps.len());
    for (index, step) in steps.iter().enumerate() {
        tracing::debug!(
            "Step {}: {} [{}]",
            index + 1,
            step.title,
            step.keys().collect::<Vec<_>>().join(", ")
        );
    }
    Ok(())
}
