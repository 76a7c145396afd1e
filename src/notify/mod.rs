//! Notification rendering
//!
//! Turns a form's notification template and the submitted values into the
//! subject and body handed to the delivery sink.

mod render;
mod template;

pub use render::{render_for_spec, RenderedNotification};
pub use template::TemplateError;
