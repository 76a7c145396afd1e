//! Error and notice dialogs

use super::base::{render_dialog, DialogConfig};
use ratatui::{
    style::{Color, Modifier, Style},
    text::Span,
    Frame,
};

fn key_span(key: &str) -> Span<'_> {
    Span::styled(
        key,
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )
}

/// Submission failure overlay; the entered values stay behind it
pub fn render_error_dialog(frame: &mut Frame, error_message: &str) {
    let hint = vec![
        Span::raw("Press "),
        key_span("Enter"),
        Span::raw(" or "),
        key_span("Esc"),
        Span::raw(" to return to the form"),
    ];

    render_dialog(
        frame,
        DialogConfig {
            title: "Submission failed",
            color: Color::Red,
            message: error_message,
            hint: Some(hint),
            max_width: 60,
        },
    );
}

/// Informational overlay for loading and unavailable forms
pub fn render_notice_dialog(frame: &mut Frame, title: &str, message: &str, can_quit: bool) {
    let hint = can_quit.then(|| vec![Span::raw("Press "), key_span("q"), Span::raw(" to quit")]);

    render_dialog(
        frame,
        DialogConfig {
            title,
            color: Color::Yellow,
            message,
            hint,
            max_width: 60,
        },
    );
}
