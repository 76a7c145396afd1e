//! UI module for rendering the TUI

mod components;
mod forms;
mod layout;
mod submitted;

use crate::app::App;
use crate::state::View;
use components::{render_error_dialog, render_notice_dialog};
use ratatui::Frame;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
    let (header_area, main_area, status_area) = layout::create_layout(frame.area());

    layout::draw_header(frame, header_area, app);

    match &app.state.current_view {
        View::Loading => {
            let message = format!("Loading {}...", app.state.form_id);
            render_notice_dialog(frame, "Please wait", &message, false);
        }
        View::Form => forms::draw_step(frame, main_area, app),
        View::Submitted => submitted::draw(frame, main_area, app),
        View::Unavailable => {
            let reason = app.state.unavailable_reason.as_deref().unwrap_or_default();
            render_notice_dialog(frame, "Form unavailable", reason, true);
        }
    }

    layout::draw_status_bar(frame, status_area, app);

    // Modal error dialog goes on top of everything
    if let Some(message) = &app.state.error_message {
        render_error_dialog(frame, message);
    }
}
