//! Form specification model
//!
//! A `FormSpec` is parsed from a camelCase JSON document (`FormSpecDocument`)
//! and validated on construction. Everything downstream assumes a spec that
//! passed `FormSpec::validate`.

use super::field::{FieldKind, FieldSpec, VisibleWhen};
use regex::Regex;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Characters that would collide with the placeholder grammar
const RESERVED_KEY_CHARS: &[char] = &['{', '}', '=', '?', ':', '\\'];

/// Errors raised while loading or validating a form specification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("invalid form spec: `{key}` {rule}")]
    Invalid { key: String, rule: String },
    #[error("form spec could not be parsed: {0}")]
    Parse(String),
    #[error("form `{0}` was not found")]
    NotFound(String),
}

impl SpecError {
    fn invalid(key: &str, rule: impl Into<String>) -> Self {
        SpecError::Invalid {
            key: key.to_string(),
            rule: rule.into(),
        }
    }
}

/// Kinds of compliance checkbox shown on the final step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplianceKind {
    Consent,
    OptIn,
    OptOut,
}

impl ComplianceKind {
    /// Boolean submission key the checkbox is stored under
    pub fn submission_key(&self) -> &'static str {
        match self {
            Self::Consent => "termsAccepted",
            Self::OptIn => "smsOptIn",
            Self::OptOut => "opt-out",
        }
    }
}

impl FromStr for ComplianceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "consent" => Ok(Self::Consent),
            "opt-in" => Ok(Self::OptIn),
            "opt-out" => Ok(Self::OptOut),
            other => Err(format!("unknown compliance kind `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplianceField {
    pub kind: ComplianceKind,
    pub text: String,
    pub required: bool,
}

impl ComplianceField {
    pub fn new(kind: ComplianceKind, text: &str, required: bool) -> Self {
        Self {
            kind,
            text: text.to_string(),
            required,
        }
    }

    pub fn key(&self) -> &'static str {
        self.kind.submission_key()
    }
}

/// Fields shown together on one wizard step
#[derive(Debug, Clone)]
pub struct FieldGroup {
    pub group_name: String,
    pub fields: Vec<FieldSpec>,
}

/// One line of a notification section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateLine {
    pub label: String,
    pub value_template: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TemplateSection {
    pub title: String,
    #[serde(default)]
    pub fields: Vec<TemplateLine>,
}

/// Structured description of the message sent after a successful submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationTemplate {
    pub subject_template: String,
    #[serde(default)]
    pub sections: Vec<TemplateSection>,
    #[serde(default)]
    pub footer_template: Option<String>,
}

/// Validated, immutable form specification
#[derive(Debug, Clone)]
pub struct FormSpec {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub groups: Vec<FieldGroup>,
    pub compliance_fields: Vec<ComplianceField>,
    pub submit_label: String,
    pub loading_label: String,
    pub success_message: String,
    pub error_message: String,
    pub notification: NotificationTemplate,
}

impl FormSpec {
    /// Create an empty spec with default labels and messages
    pub fn new(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            groups: Vec::new(),
            compliance_fields: Vec::new(),
            submit_label: default_submit_label(),
            loading_label: default_loading_label(),
            success_message: default_success_message(),
            error_message: default_error_message(),
            notification: NotificationTemplate::default(),
        }
    }

    pub fn with_group(mut self, group_name: &str, fields: Vec<FieldSpec>) -> Self {
        self.groups.push(FieldGroup {
            group_name: group_name.to_string(),
            fields,
        });
        self
    }

    pub fn with_compliance(mut self, field: ComplianceField) -> Self {
        self.compliance_fields.push(field);
        self
    }

    pub fn with_notification(mut self, notification: NotificationTemplate) -> Self {
        self.notification = notification;
        self
    }

    /// Parse and validate a JSON form specification
    pub fn from_json(json: &str) -> Result<Self, SpecError> {
        let document: FormSpecDocument =
            serde_json::from_str(json).map_err(|e| SpecError::Parse(e.to_string()))?;
        FormSpec::try_from(document)
    }

    /// Iterate every field across all groups in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.groups.iter().flat_map(|g| g.fields.iter())
    }

    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields().find(|f| f.key == key)
    }

    pub fn compliance_field(&self, key: &str) -> Option<&ComplianceField> {
        self.compliance_fields.iter().find(|c| c.key() == key)
    }

    /// Check structural invariants; later stages rely on these holding
    pub fn validate(&self) -> Result<(), SpecError> {
        let mut group_of: HashMap<&str, usize> = HashMap::new();

        for (group_index, group) in self.groups.iter().enumerate() {
            for field in &group.fields {
                validate_key(&field.key)?;
                if group_of.insert(field.key.as_str(), group_index).is_some() {
                    return Err(SpecError::invalid(&field.key, "is declared more than once"));
                }
                if matches!(field.kind, FieldKind::Select | FieldKind::Radio)
                    && field.options.is_empty()
                {
                    return Err(SpecError::invalid(
                        &field.key,
                        format!("is a {} field without options", field.kind),
                    ));
                }
                if field.kind == FieldKind::YesNo
                    && field.options.iter().any(|o| o != "Yes" && o != "No")
                {
                    return Err(SpecError::invalid(
                        &field.key,
                        "is a yes-no field with options other than Yes and No",
                    ));
                }
            }
        }

        for (group_index, group) in self.groups.iter().enumerate() {
            for field in &group.fields {
                if let Some(rule) = &field.visible_when {
                    check_dependency(field, rule, group_index, &group_of)?;
                }
            }
        }

        let mut compliance_keys = HashSet::new();
        for compliance in &self.compliance_fields {
            let key = compliance.key();
            if group_of.contains_key(key) {
                return Err(SpecError::invalid(
                    key,
                    "collides with a compliance submission key",
                ));
            }
            if !compliance_keys.insert(key) {
                return Err(SpecError::invalid(key, "compliance field is declared twice"));
            }
        }

        Ok(())
    }
}

fn validate_key(key: &str) -> Result<(), SpecError> {
    if key.is_empty() {
        return Err(SpecError::invalid(key, "has an empty key"));
    }
    if key
        .chars()
        .any(|c| c.is_whitespace() || RESERVED_KEY_CHARS.contains(&c))
    {
        return Err(SpecError::invalid(key, "contains reserved characters"));
    }
    Ok(())
}

fn check_dependency(
    field: &FieldSpec,
    rule: &VisibleWhen,
    group_index: usize,
    group_of: &HashMap<&str, usize>,
) -> Result<(), SpecError> {
    if rule.depends_on_key == field.key {
        return Err(SpecError::invalid(&field.key, "visibleWhen depends on itself"));
    }
    match group_of.get(rule.depends_on_key.as_str()) {
        None => Err(SpecError::invalid(
            &field.key,
            format!(
                "visibleWhen references unknown field `{}`",
                rule.depends_on_key
            ),
        )),
        Some(&dep_group) if dep_group > group_index => Err(SpecError::invalid(
            &field.key,
            format!(
                "visibleWhen references `{}` from a later step",
                rule.depends_on_key
            ),
        )),
        Some(_) => Ok(()),
    }
}

impl fmt::Display for FormSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.id)
    }
}

fn default_submit_label() -> String {
    "Submit".to_string()
}

fn default_loading_label() -> String {
    "Submitting...".to_string()
}

fn default_success_message() -> String {
    "Thank you! Your submission has been received.".to_string()
}

fn default_error_message() -> String {
    "Something went wrong. Please try again.".to_string()
}

// Wire document

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSpecDocument {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub groups: Vec<FieldGroupDocument>,
    #[serde(default)]
    pub compliance_fields: Vec<ComplianceFieldDocument>,
    #[serde(default = "default_submit_label")]
    pub submit_label: String,
    #[serde(default = "default_loading_label")]
    pub loading_label: String,
    #[serde(default = "default_success_message")]
    pub success_message: String,
    #[serde(default = "default_error_message")]
    pub error_message: String,
    #[serde(default)]
    pub notification: NotificationTemplate,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldGroupDocument {
    pub group_name: String,
    #[serde(default)]
    pub fields: Vec<FieldSpecDocument>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpecDocument {
    pub key: String,
    pub label: String,
    #[serde(alias = "type")]
    pub kind: String,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<FieldOptionDocument>,
    #[serde(default)]
    pub validation_pattern: Option<String>,
    #[serde(default)]
    pub validation_message: Option<String>,
    #[serde(default)]
    pub visible_when: Option<VisibleWhenDocument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldOptionDocument {
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleWhenDocument {
    pub depends_on_key: String,
    pub equals_value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComplianceFieldDocument {
    pub kind: String,
    pub text: String,
    #[serde(default)]
    pub required: bool,
}

impl TryFrom<FieldSpecDocument> for FieldSpec {
    type Error = SpecError;

    fn try_from(doc: FieldSpecDocument) -> Result<Self, Self::Error> {
        let kind: FieldKind = doc
            .kind
            .parse()
            .map_err(|rule| SpecError::invalid(&doc.key, rule))?;

        let mut options: Vec<String> = doc.options.into_iter().map(|o| o.value).collect();
        if kind == FieldKind::YesNo && options.is_empty() {
            options = vec!["Yes".to_string(), "No".to_string()];
        }

        let mut field = FieldSpec::new(&doc.key, &doc.label, kind)
            .required(doc.required)
            .with_options(&options);
        field.placeholder = doc.placeholder;

        if let Some(pattern) = doc.validation_pattern {
            let regex = Regex::new(&pattern).map_err(|e| {
                SpecError::invalid(&doc.key, format!("has an invalid validationPattern: {e}"))
            })?;
            field = field.with_pattern(regex, doc.validation_message);
        } else {
            field.validation_message = doc.validation_message;
        }

        if let Some(rule) = doc.visible_when {
            field = field.visible_when(&rule.depends_on_key, &rule.equals_value);
        }

        Ok(field)
    }
}

impl TryFrom<FormSpecDocument> for FormSpec {
    type Error = SpecError;

    fn try_from(doc: FormSpecDocument) -> Result<Self, Self::Error> {
        let mut spec = FormSpec::new(&doc.id, &doc.title);
        spec.description = doc.description;
        spec.submit_label = doc.submit_label;
        spec.loading_label = doc.loading_label;
        spec.success_message = doc.success_message;
        spec.error_message = doc.error_message;
        spec = spec.with_notification(doc.notification);

        for group in doc.groups {
            let fields = group
                .fields
                .into_iter()
                .map(FieldSpec::try_from)
                .collect::<Result<Vec<_>, _>>()?;
            spec = spec.with_group(&group.group_name, fields);
        }

        for compliance in doc.compliance_fields {
            let kind: ComplianceKind = compliance
                .kind
                .parse()
                .map_err(|rule| SpecError::invalid(&compliance.kind, rule))?;
            spec = spec.with_compliance(ComplianceField::new(
                kind,
                &compliance.text,
                compliance.required,
            ));
        }

        spec.validate()?;
        Ok(spec)
    }
}
