//! Layout components (header, status bar)

use crate::app::App;
use crate::state::{step_title, View, WizardPhase};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Split the screen into header, content and status bar
pub fn create_layout(area: Rect) -> (Rect, Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    (chunks[0], chunks[1], chunks[2])
}

/// "Step 2 of 4: Shipment Details", or None outside of editing
pub fn step_indicator(app: &App) -> Option<String> {
    let (Some(spec), Some(session)) = (&app.state.spec, &app.state.session) else {
        return None;
    };
    let Some(WizardPhase::Editing(index)) = app.state.phase() else {
        return None;
    };
    let title = step_title(spec, index)?;
    Some(format!(
        "Step {} of {}: {}",
        index + 1,
        session.step_count(),
        title
    ))
}

/// Draw the header with the form title and step indicator
pub fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let title = app
        .state
        .spec
        .as_ref()
        .map(|s| s.title.as_str())
        .unwrap_or("Form");

    let mut spans = vec![Span::styled(
        title,
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    )];
    if let Some(indicator) = step_indicator(app) {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(indicator, Style::default().fg(Color::Cyan)));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(header, area);
}

/// Draw the status bar
pub fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled(
        format!(" {} ", get_view_hints(&app.state.current_view)),
        Style::default().fg(Color::Gray),
    )];

    if let Some(msg) = &app.state.status_message {
        spans.push(Span::raw("| "));
        spans.push(Span::styled(msg, Style::default().fg(Color::Yellow)));
    }

    let status = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status, area);

    // Quit hint on the right
    let quit_hint = " ^C:quit ";
    let quit_area = Rect {
        x: area.x + area.width.saturating_sub(quit_hint.len() as u16),
        y: area.y,
        width: (quit_hint.len() as u16).min(area.width),
        height: 1,
    };
    let quit_widget =
        Paragraph::new(quit_hint).style(Style::default().bg(Color::DarkGray).fg(Color::Gray));
    frame.render_widget(quit_widget, quit_area);
}

/// Get keyboard hints for the current view
fn get_view_hints(view: &View) -> &'static str {
    match view {
        View::Loading => "Loading form...",
        View::Form => "Tab:next  Space:toggle  ←/→:choose  Enter:continue  Esc:back  ^R:reset",
        View::Submitted => "Enter:new submission  q:quit",
        View::Unavailable => "q:quit",
    }
}
