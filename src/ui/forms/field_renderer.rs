//! Field rendering utilities for forms

use crate::state::{FieldKind, FieldValue, StepField};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

const TEXTAREA_HEIGHT: u16 = 6;
const COMPLIANCE_HEIGHT: u16 = 4;
const FIELD_HEIGHT: u16 = 3;

/// Rows a field occupies, borders included
pub fn field_height(field: &StepField) -> u16 {
    match field {
        StepField::Input(spec) if spec.kind.is_multiline() => TEXTAREA_HEIGHT,
        StepField::Input(_) => FIELD_HEIGHT,
        StepField::Compliance(_) => COMPLIANCE_HEIGHT,
    }
}

fn checkbox(checked: bool) -> &'static str {
    if checked {
        "[x]"
    } else {
        "[ ]"
    }
}

/// Draw one field of the current step with its inline error, if any
pub fn draw_field(
    frame: &mut Frame,
    area: Rect,
    field: &StepField,
    value: Option<&FieldValue>,
    error: Option<&str>,
    is_active: bool,
) {
    let accent = Style::default().fg(Color::Cyan);
    let text_style = if is_active {
        accent
    } else {
        Style::default().fg(Color::Gray)
    };
    let border_style = match (error.is_some(), is_active) {
        (true, _) => Style::default().fg(Color::Red),
        (false, true) => accent,
        (false, false) => Style::default().fg(Color::DarkGray),
    };

    let cursor = if is_active { "▌" } else { "" };
    let checked = value.and_then(FieldValue::as_bool).unwrap_or(false);

    let lines: Vec<Line> = match field {
        StepField::Compliance(spec) => vec![Line::from(vec![
            Span::styled(checkbox(checked), text_style.add_modifier(Modifier::BOLD)),
            Span::raw(" "),
            Span::styled(spec.text.as_str(), text_style),
        ])],
        StepField::Input(spec) if spec.kind == FieldKind::Checkbox => {
            vec![Line::from(Span::styled(checkbox(checked), text_style))]
        }
        StepField::Input(spec) if spec.kind.has_options() => {
            let current = value.map(FieldValue::display_value).unwrap_or_default();
            let shown = if current.is_empty() {
                spec.placeholder.clone().unwrap_or_else(|| "(choose)".to_string())
            } else {
                current
            };
            let arrow_style = if is_active {
                accent
            } else {
                Style::default().fg(Color::DarkGray)
            };
            vec![Line::from(vec![
                Span::styled("◀ ", arrow_style),
                Span::styled(shown, text_style),
                Span::styled(" ▶", arrow_style),
                Span::styled(
                    format!("  ({})", spec.options.join(" / ")),
                    Style::default().fg(Color::DarkGray),
                ),
            ])]
        }
        StepField::Input(spec) => {
            let current = value.map(FieldValue::display_value).unwrap_or_default();
            if current.is_empty() && !is_active {
                let placeholder = spec.placeholder.as_deref().unwrap_or("");
                vec![Line::from(Span::styled(
                    placeholder.to_string(),
                    Style::default().fg(Color::DarkGray),
                ))]
            } else {
                let mut lines: Vec<Line> = current
                    .split('\n')
                    .map(|l| Line::from(Span::styled(l.to_string(), text_style)))
                    .collect();
                if let Some(last) = lines.last_mut() {
                    last.spans.push(Span::styled(cursor, accent));
                }
                lines
            }
        }
    };

    let title = if field.is_required() {
        format!(" {} * ", field.label())
    } else {
        format!(" {} ", field.label())
    };

    let mut block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);
    if let Some(message) = error {
        block = block.title_bottom(Span::styled(
            format!(" {message} "),
            Style::default().fg(Color::Red),
        ));
    }

    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).block(block),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ComplianceField, ComplianceKind, FieldSpec};

    #[test]
    fn test_field_heights() {
        let text = FieldSpec::new("fullName", "Full Name", FieldKind::Text);
        let notes = FieldSpec::new("notes", "Notes", FieldKind::Textarea);
        let consent = ComplianceField::new(ComplianceKind::Consent, "I agree", true);

        assert_eq!(field_height(&StepField::Input(&text)), FIELD_HEIGHT);
        assert_eq!(field_height(&StepField::Input(&notes)), TEXTAREA_HEIGHT);
        assert_eq!(field_height(&StepField::Compliance(&consent)), COMPLIANCE_HEIGHT);
    }
}
