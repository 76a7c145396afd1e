//! Form rendering module
//!
//! - `field_renderer`: a single field with its inline error
//! - `step_form`: the current step with its navigation buttons

mod field_renderer;
mod step_form;

pub use step_form::draw_step;
