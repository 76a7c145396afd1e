//! Form field declarations and value objects

use chrono::NaiveDate;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Submitted values keyed by field key
pub type FormValues = HashMap<String, FieldValue>;

/// Wire date format for date fields
pub const DATE_INPUT_FORMAT: &str = "%Y-%m-%d";

/// Closed set of field kinds a form may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Tel,
    Textarea,
    Select,
    Checkbox,
    Radio,
    Date,
    YesNo,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Tel => "tel",
            Self::Textarea => "textarea",
            Self::Select => "select",
            Self::Checkbox => "checkbox",
            Self::Radio => "radio",
            Self::Date => "date",
            Self::YesNo => "yes-no",
        }
    }

    /// Kinds whose value comes from an ordered option list
    pub fn has_options(&self) -> bool {
        matches!(self, Self::Select | Self::Radio | Self::YesNo)
    }

    /// Kinds backed by a typed boolean (serialized as "Yes"/"No")
    pub fn is_toggle(&self) -> bool {
        matches!(self, Self::Checkbox | Self::YesNo)
    }

    pub fn is_multiline(&self) -> bool {
        matches!(self, Self::Textarea)
    }
}

impl FromStr for FieldKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "email" => Ok(Self::Email),
            "tel" => Ok(Self::Tel),
            "textarea" => Ok(Self::Textarea),
            "select" => Ok(Self::Select),
            "checkbox" => Ok(Self::Checkbox),
            "radio" => Ok(Self::Radio),
            "date" => Ok(Self::Date),
            "yes-no" => Ok(Self::YesNo),
            other => Err(format!("unknown field kind `{other}`")),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Show a field only while another field holds an exact value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleWhen {
    pub depends_on_key: String,
    pub equals_value: String,
}

/// Declaration of a single form field
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    pub placeholder: Option<String>,
    pub required: bool,
    pub options: Vec<String>,
    pub validation_pattern: Option<Regex>,
    pub validation_message: Option<String>,
    pub visible_when: Option<VisibleWhen>,
}

impl FieldSpec {
    /// Create an optional field with no rules attached
    pub fn new(key: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind,
            placeholder: None,
            required: false,
            options: Vec::new(),
            validation_pattern: None,
            validation_message: None,
            visible_when: None,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_options<S: AsRef<str>>(mut self, options: &[S]) -> Self {
        self.options = options.iter().map(|o| o.as_ref().to_string()).collect();
        self
    }

    pub fn visible_when(mut self, depends_on_key: &str, equals_value: &str) -> Self {
        self.visible_when = Some(VisibleWhen {
            depends_on_key: depends_on_key.to_string(),
            equals_value: equals_value.to_string(),
        });
        self
    }

    pub fn with_pattern(mut self, pattern: Regex, message: Option<String>) -> Self {
        self.validation_pattern = Some(pattern);
        self.validation_message = message;
        self
    }
}

/// Type-safe field values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    /// Yes/no and checkbox answers; "Yes"/"No" on the wire
    YesNo(bool),
    /// Compliance flags; real booleans on the wire
    Bool(bool),
    Date(NaiveDate),
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Text(String::new())
    }
}

impl FieldValue {
    /// Build a value from raw text input for a field of the given kind
    pub fn from_input(kind: FieldKind, input: &str) -> Self {
        match kind {
            FieldKind::Date => NaiveDate::parse_from_str(input.trim(), DATE_INPUT_FORMAT)
                .map(FieldValue::Date)
                .unwrap_or_else(|_| FieldValue::Text(input.to_string())),
            FieldKind::Checkbox | FieldKind::YesNo => FieldValue::YesNo(input == "Yes"),
            _ => FieldValue::Text(input.to_string()),
        }
    }

    /// Exact, case-sensitive comparison against a literal from a rule or template.
    /// Compliance booleans never equal a string literal.
    pub fn matches_literal(&self, literal: &str) -> bool {
        match self {
            FieldValue::Text(s) => s == literal,
            FieldValue::YesNo(b) => literal == yes_no(*b),
            FieldValue::Bool(_) => false,
            FieldValue::Date(d) => d.format(DATE_INPUT_FORMAT).to_string() == literal,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Text(s) => !s.is_empty(),
            FieldValue::YesNo(b) | FieldValue::Bool(b) => *b,
            FieldValue::Date(_) => true,
        }
    }

    /// Whether the value counts as missing for required-field checks
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::YesNo(_) | FieldValue::Date(_) => false,
            FieldValue::Bool(b) => !*b,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::YesNo(b) | FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Text shown in an input box while editing
    pub fn display_value(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::YesNo(b) | FieldValue::Bool(b) => yes_no(*b).to_string(),
            FieldValue::Date(d) => d.format(DATE_INPUT_FORMAT).to_string(),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::YesNo(b) => serializer.serialize_str(yes_no(*b)),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Date(d) => serializer.collect_str(&d.format(DATE_INPUT_FORMAT)),
        }
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}
