//! Notification rendering

use super::template::{Piece, Segment, Template, TemplateError, Test};
use crate::state::{FieldValue, FormSpec, FormValues, NotificationTemplate, TemplateLine};
use crate::state::{TemplateSection, COMPLIANCE_STEP_TITLE};
use serde::Serialize;

/// First line of every notification body
pub const SALUTATION: &str = "You have received a new form submission.";

/// Rendered for missing or empty values
pub const MISSING_VALUE: &str = "N/A";

/// US locale date, matching what the website shows
const DISPLAY_DATE_FORMAT: &str = "%-m/%-d/%Y";

/// Subject and body handed to the delivery collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedNotification {
    pub subject: String,
    pub body: String,
}

/// Parse and evaluate a single template string against the values
pub fn render_str(source: &str, values: &FormValues) -> Result<String, TemplateError> {
    Ok(evaluate(&Template::parse(source)?, values))
}

/// Evaluate a parsed template; never fails for missing data
pub fn evaluate(template: &Template, values: &FormValues) -> String {
    let mut out = String::new();
    for segment in &template.segments {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Field(key) => out.push_str(&display(values.get(key))),
            Segment::Conditional {
                field,
                test,
                then,
                otherwise,
            } => {
                let value = values.get(field);
                let matched = match test {
                    Test::Equals(literal) => value.is_some_and(|v| v.matches_literal(literal)),
                    Test::Truthy => value.is_some_and(FieldValue::is_truthy),
                };
                let branch = if matched { then } else { otherwise };
                for piece in branch {
                    match piece {
                        Piece::Text(text) => out.push_str(text),
                        Piece::Field(key) => out.push_str(&display(values.get(key))),
                    }
                }
            }
        }
    }
    out
}

fn display(value: Option<&FieldValue>) -> String {
    match value {
        None => MISSING_VALUE.to_string(),
        Some(FieldValue::Text(text)) if text.is_empty() => MISSING_VALUE.to_string(),
        Some(FieldValue::Text(text)) => text.clone(),
        Some(FieldValue::YesNo(true)) | Some(FieldValue::Bool(true)) => "Yes".to_string(),
        Some(FieldValue::YesNo(false)) | Some(FieldValue::Bool(false)) => "No".to_string(),
        Some(FieldValue::Date(date)) => date.format(DISPLAY_DATE_FORMAT).to_string(),
    }
}

/// Render subject and body for a notification template
pub fn render_notification(
    template: &NotificationTemplate,
    values: &FormValues,
) -> Result<RenderedNotification, TemplateError> {
    let subject = render_str(&template.subject_template, values)?;

    let mut body = String::new();
    body.push_str(SALUTATION);
    body.push('\n');

    for section in &template.sections {
        body.push('\n');
        body.push_str(&section.title);
        body.push('\n');
        body.push_str(&"-".repeat(section.title.chars().count()));
        body.push('\n');
        for line in &section.fields {
            let value = render_str(&line.value_template, values)?;
            if value.is_empty() {
                continue;
            }
            body.push_str(&line.label);
            body.push_str(": ");
            body.push_str(&value);
            body.push('\n');
        }
    }

    if let Some(footer) = &template.footer_template {
        body.push('\n');
        body.push_str(&render_str(footer, values)?);
    }

    let body = body.trim_end().to_string();
    Ok(RenderedNotification { subject, body })
}

/// Minimal template listing every field; used when the configured one is malformed
pub fn fallback_template(spec: &FormSpec) -> NotificationTemplate {
    let mut fields: Vec<TemplateLine> = spec
        .fields()
        .map(|field| TemplateLine {
            label: field.label.clone(),
            value_template: format!("{{{}}}", field.key),
        })
        .collect();
    fields.extend(spec.compliance_fields.iter().map(|c| TemplateLine {
        label: c.text.clone(),
        value_template: format!("{{{}}}", c.key()),
    }));

    NotificationTemplate {
        subject_template: format!("New submission: {}", escape(&spec.title)),
        sections: vec![TemplateSection {
            title: "Submission".to_string(),
            fields,
        }],
        footer_template: (!spec.compliance_fields.is_empty())
            .then(|| format!("Includes {COMPLIANCE_STEP_TITLE} answers.")),
    }
}

/// Render with the form's own template, falling back to the minimal one if it is malformed
pub fn render_for_spec(spec: &FormSpec, values: &FormValues) -> RenderedNotification {
    match render_notification(&spec.notification, values) {
        Ok(rendered) => rendered,
        Err(err) => {
            tracing::warn!(
                "Notification template for {} is invalid ({err}); using fallback",
                spec.id
            );
            render_notification(&fallback_template(spec), values).unwrap_or_else(|_| {
                RenderedNotification {
                    subject: spec.title.clone(),
                    body: SALUTATION.to_string(),
                }
            })
        }
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '{' | '}' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
