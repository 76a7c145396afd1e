//! Confirmation screen shown after a successful submission

use crate::app::App;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub fn draw(frame: &mut Frame, area: Rect, app: &App) {
    let message = app
        .state
        .spec
        .as_ref()
        .map(|s| s.success_message.as_str())
        .unwrap_or_default();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)])
        .split(area);

    frame.render_widget(
        Paragraph::new(Span::styled(
            message,
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ))
        .wrap(Wrap { trim: true }),
        chunks[0],
    );

    let Some(notification) = &app.state.last_notification else {
        return;
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Subject: ", Style::default().fg(Color::DarkGray)),
            Span::raw(notification.subject.as_str()),
        ]),
        Line::from(""),
    ];
    lines.extend(notification.body.lines().map(Line::from));

    let summary = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(" Notification ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
    frame.render_widget(summary, chunks[1]);
}
