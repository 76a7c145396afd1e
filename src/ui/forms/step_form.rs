//! Current step of the wizard

use super::field_renderer::{draw_field, field_height};
use crate::app::App;
use crate::state::{StepField, WizardPhase};
use crate::ui::components::{render_button, BUTTON_HEIGHT};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Paragraph, Wrap},
    Frame,
};
use std::collections::HashMap;

/// Draw the visible fields of the current step and the Back/Next row
pub fn draw_step(frame: &mut Frame, area: Rect, app: &App) {
    let (Some(spec), Some(session)) = (&app.state.spec, &app.state.session) else {
        return;
    };
    let step = session.current_step_index();

    let description = spec.description.as_deref().filter(|_| step == 0);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(if description.is_some() { 2 } else { 0 }),
            Constraint::Min(0),
            Constraint::Length(BUTTON_HEIGHT),
        ])
        .split(area);

    if let Some(text) = description {
        frame.render_widget(
            Paragraph::new(text)
                .style(Style::default().fg(Color::Gray))
                .wrap(Wrap { trim: true }),
            chunks[0],
        );
    }

    let fields = app.state.visible_fields();
    let errors: HashMap<String, String> = app
        .state
        .field_errors()
        .into_iter()
        .map(|e| (e.key, e.message))
        .collect();

    let active = app.state.active_form_field;
    let first = first_shown(&fields, active, chunks[1].height);
    let mut y = chunks[1].y;
    let bottom = chunks[1].y + chunks[1].height;

    for (index, field) in fields.iter().enumerate().skip(first) {
        let height = field_height(field);
        if y + height > bottom {
            break;
        }
        let field_area = Rect {
            x: chunks[1].x,
            y,
            width: chunks[1].width,
            height,
        };
        draw_field(
            frame,
            field_area,
            field,
            session.value(field.key()),
            errors.get(field.key()).map(String::as_str),
            index == active,
        );
        y += height;
    }

    draw_buttons(frame, chunks[2], app, step);
}

/// Index of the first field to draw so the active one stays on screen
fn first_shown(fields: &[StepField], active: usize, height: u16) -> usize {
    let Some(upto) = fields.get(..=active.min(fields.len().saturating_sub(1))) else {
        return 0;
    };
    let mut used: u16 = 0;
    for (index, field) in upto.iter().enumerate().rev() {
        used += field_height(field);
        if used > height {
            return index + 1;
        }
    }
    0
}

fn draw_buttons(frame: &mut Frame, area: Rect, app: &App, step: usize) {
    let (Some(spec), Some(session)) = (&app.state.spec, &app.state.session) else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(12),
            Constraint::Min(0),
            Constraint::Length(20),
        ])
        .split(area);

    render_button(frame, chunks[0], "Back", false, step > 0);

    let forward = if app.state.submitting {
        spec.loading_label.as_str()
    } else if session.is_last_step() || session.phase() == WizardPhase::ReadyToSubmit {
        spec.submit_label.as_str()
    } else {
        "Next"
    };
    render_button(frame, chunks[2], forward, true, !app.state.submitting);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{FieldKind, FieldSpec};

    #[test]
    fn test_first_shown_scrolls_to_active() {
        let specs: Vec<FieldSpec> = (0..5)
            .map(|i| FieldSpec::new(&format!("f{i}"), "Field", FieldKind::Text))
            .collect();
        let fields: Vec<StepField> = specs.iter().map(StepField::Input).collect();

        // Three rows per field, room for two
        assert_eq!(first_shown(&fields, 0, 6), 0);
        assert_eq!(first_shown(&fields, 1, 6), 0);
        assert_eq!(first_shown(&fields, 4, 6), 3);
    }

    #[test]
    fn test_first_shown_with_no_fields() {
        assert_eq!(first_shown(&[], 0, 10), 0);
    }
}
