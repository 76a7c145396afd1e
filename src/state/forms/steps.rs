//! Step derivation, field visibility and step-scoped validation
//!
//! Everything here is a pure function of the form spec and the current values;
//! nothing is cached between calls.

use super::field::{FieldKind, FieldSpec, FieldValue, FormValues};
use super::spec::{ComplianceField, ComplianceKind, FormSpec, SpecError};
use crate::error::FieldError;
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

const TEL_PUNCTUATION: &[char] = &[' ', '+', '-', '(', ')', '.'];

/// Title of the synthetic trailing step holding the compliance checkboxes
pub const COMPLIANCE_STEP_TITLE: &str = "Review & Consent";

/// Suffix of the derived flag recording whether a compliance box was touched
pub const TOUCHED_SUFFIX: &str = "Touched";

/// Cross-field rule: when `trigger` is "Yes", `required_key` must be filled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionalRequirement {
    pub trigger: &'static str,
    pub required_key: &'static str,
    pub message: &'static str,
}

/// Fixed business rules; not configurable through the form spec
pub const CONDITIONAL_REQUIREMENTS: &[ConditionalRequirement] = &[
    ConditionalRequirement {
        trigger: "isPalletized",
        required_key: "palletCount",
        message: "Number of pallets is required for palletized freight",
    },
    ConditionalRequirement {
        trigger: "isHazmat",
        required_key: "unNumber",
        message: "UN number is required for hazardous materials",
    },
    ConditionalRequirement {
        trigger: "isHazmat",
        required_key: "hazmatClass",
        message: "Hazmat class is required for hazardous materials",
    },
    ConditionalRequirement {
        trigger: "isTemperatureControlled",
        required_key: "temperature",
        message: "Temperature is required for temperature-controlled loads",
    },
    ConditionalRequirement {
        trigger: "isHighValue",
        required_key: "insuranceInfo",
        message: "Insurance details are required for high-value loads",
    },
    ConditionalRequirement {
        trigger: "isHeavyLoad",
        required_key: "heavyLoadWeight",
        message: "Weight is required for heavy loads",
    },
    ConditionalRequirement {
        trigger: "isOversizedLoad",
        required_key: "oversizedDimensions",
        message: "Dimensions are required for oversized loads",
    },
];

/// A field as it appears on a step
#[derive(Debug, Clone, Copy)]
pub enum StepField<'a> {
    Input(&'a FieldSpec),
    Compliance(&'a ComplianceField),
}

impl<'a> StepField<'a> {
    pub fn key(&self) -> &'a str {
        match self {
            StepField::Input(field) => &field.key,
            StepField::Compliance(field) => field.key(),
        }
    }

    pub fn label(&self) -> &'a str {
        match self {
            StepField::Input(field) => &field.label,
            StepField::Compliance(field) => &field.text,
        }
    }

    pub fn is_required(&self) -> bool {
        match self {
            StepField::Input(field) => field.required,
            StepField::Compliance(field) => field.required,
        }
    }
}

/// One wizard screen
#[derive(Debug, Clone)]
pub struct Step<'a> {
    pub title: &'a str,
    pub fields: Vec<StepField<'a>>,
}

impl Step<'_> {
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.key())
    }
}

/// Number of steps for a spec: one per group plus the compliance step
pub fn step_count(spec: &FormSpec) -> usize {
    spec.groups.len() + 1
}

/// Derive the ordered step list, rejecting malformed specs
pub fn build_step_list(spec: &FormSpec) -> Result<Vec<Step<'_>>, SpecError> {
    spec.validate()?;
    Ok((0..step_count(spec))
        .map(|index| Step {
            title: step_title(spec, index).unwrap_or(COMPLIANCE_STEP_TITLE),
            fields: step_fields(spec, index),
        })
        .collect())
}

pub fn step_title(spec: &FormSpec, step_index: usize) -> Option<&str> {
    if step_index < spec.groups.len() {
        Some(&spec.groups[step_index].group_name)
    } else if step_index == spec.groups.len() {
        Some(COMPLIANCE_STEP_TITLE)
    } else {
        None
    }
}

/// Fields declared on a step, visible or not
pub fn step_fields(spec: &FormSpec, step_index: usize) -> Vec<StepField<'_>> {
    if let Some(group) = spec.groups.get(step_index) {
        group.fields.iter().map(StepField::Input).collect()
    } else if step_index == spec.groups.len() {
        spec.compliance_fields
            .iter()
            .map(StepField::Compliance)
            .collect()
    } else {
        Vec::new()
    }
}

/// Fields of a step that are currently shown
pub fn visible_fields<'a>(
    spec: &'a FormSpec,
    step_index: usize,
    values: &FormValues,
) -> Vec<StepField<'a>> {
    step_fields(spec, step_index)
        .into_iter()
        .filter(|f| is_field_visible(spec, step_index, f.key(), values))
        .collect()
}

/// Whether `key` is on the given step and its visibility rule currently holds
pub fn is_field_visible(
    spec: &FormSpec,
    step_index: usize,
    key: &str,
    values: &FormValues,
) -> bool {
    let Some(field) = step_fields(spec, step_index)
        .into_iter()
        .find(|f| f.key() == key)
    else {
        return false;
    };

    match field {
        StepField::Compliance(_) => true,
        StepField::Input(field) => match &field.visible_when {
            None => true,
            Some(rule) => values
                .get(&rule.depends_on_key)
                .is_some_and(|v| v.matches_literal(&rule.equals_value)),
        },
    }
}

/// Initial values for every field of every step
pub fn default_values(spec: &FormSpec) -> FormValues {
    let mut values = FormValues::new();
    for field in spec.fields() {
        let value = if field.kind.is_toggle() {
            FieldValue::YesNo(false)
        } else {
            FieldValue::Text(String::new())
        };
        values.insert(field.key.clone(), value);
    }
    for compliance in &spec.compliance_fields {
        values.insert(compliance.key().to_string(), FieldValue::Bool(false));
        values.insert(touched_key(compliance.key()), FieldValue::Bool(false));
    }
    values
}

pub fn touched_key(key: &str) -> String {
    format!("{key}{TOUCHED_SUFFIX}")
}

/// Validate the visible fields of one step, collecting every violation
pub fn validate_step(
    spec: &FormSpec,
    step_index: usize,
    values: &FormValues,
) -> Result<(), Vec<FieldError>> {
    let visible = visible_fields(spec, step_index, values);
    let mut errors: Vec<FieldError> = Vec::new();

    for entry in &visible {
        let error = match entry {
            StepField::Input(field) => check_field(field, values.get(&field.key)),
            StepField::Compliance(field) => check_compliance(field, values.get(field.key())),
        };
        errors.extend(error);
    }

    for rule in CONDITIONAL_REQUIREMENTS {
        let triggered = values
            .get(rule.trigger)
            .is_some_and(|v| v.matches_literal("Yes"));
        if !triggered
            || !visible.iter().any(|f| f.key() == rule.required_key)
            || errors.iter().any(|e| e.key == rule.required_key)
        {
            continue;
        }
        if values
            .get(rule.required_key)
            .is_none_or(FieldValue::is_blank)
        {
            errors.push(FieldError::new(rule.required_key, rule.message));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Index of the step declaring `key`
pub fn step_of_key(spec: &FormSpec, key: &str) -> Option<usize> {
    (0..step_count(spec)).find(|&index| step_fields(spec, index).iter().any(|f| f.key() == key))
}

/// Validate every step; used to re-check a submission before handoff
pub fn validate_submission(spec: &FormSpec, values: &FormValues) -> Result<(), Vec<FieldError>> {
    let errors: Vec<FieldError> = (0..step_count(spec))
        .filter_map(|index| validate_step(spec, index, values).err())
        .flatten()
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_field(field: &FieldSpec, value: Option<&FieldValue>) -> Option<FieldError> {
    let missing = match (field.kind, value) {
        (_, None) => true,
        (FieldKind::Checkbox, Some(v)) => !v.is_truthy(),
        (_, Some(v)) => v.is_blank(),
    };
    if missing {
        return field
            .required
            .then(|| FieldError::new(&field.key, format!("{} is required", field.label)));
    }

    let text = match value {
        Some(FieldValue::Text(text)) => text.trim(),
        _ => return None,
    };

    let kind_error = match field.kind {
        FieldKind::Email if !EMAIL_PATTERN.is_match(text) => {
            Some("Please enter a valid email address".to_string())
        }
        FieldKind::Tel if !is_valid_phone(text) => {
            Some("Please enter a valid phone number".to_string())
        }
        FieldKind::Date => Some("Please enter a valid date (YYYY-MM-DD)".to_string()),
        FieldKind::Select | FieldKind::Radio if !field.options.iter().any(|o| o == text) => {
            Some("Please choose one of the listed options".to_string())
        }
        _ => None,
    };
    if let Some(message) = kind_error {
        return Some(FieldError::new(&field.key, message));
    }

    match &field.validation_pattern {
        Some(pattern) if !pattern.is_match(text) => Some(FieldError::new(
            &field.key,
            field
                .validation_message
                .clone()
                .unwrap_or_else(|| format!("{} is invalid", field.label)),
        )),
        _ => None,
    }
}

fn check_compliance(field: &ComplianceField, value: Option<&FieldValue>) -> Option<FieldError> {
    let accepted = value.and_then(FieldValue::as_bool).unwrap_or(false);
    if !field.required || accepted {
        return None;
    }
    let message = match field.kind {
        ComplianceKind::Consent => "You must accept the terms to continue",
        ComplianceKind::OptIn | ComplianceKind::OptOut => "This box must be checked to continue",
    };
    Some(FieldError::new(field.key(), message))
}

fn is_valid_phone(text: &str) -> bool {
    let digits = text.chars().filter(char::is_ascii_digit).count();
    (7..=15).contains(&digits)
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || TEL_PUNCTUATION.contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::forms::spec::ComplianceField;
    use std::collections::HashSet;

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    fn load_info_spec() -> FormSpec {
        FormSpec::new("quote", "Quote")
            .with_group(
                "Contact",
                vec![FieldSpec::new("contactEmail", "Email", FieldKind::Email).required(true)],
            )
            .with_group(
                "Load Info",
                vec![
                    FieldSpec::new("isHazmat", "Hazmat?", FieldKind::YesNo)
                        .with_options(&["Yes", "No"]),
                    FieldSpec::new("unNumber", "UN Number", FieldKind::Text)
                        .visible_when("isHazmat", "Yes"),
                    FieldSpec::new("hazmatClass", "Hazmat Class", FieldKind::Text)
                        .visible_when("isHazmat", "Yes"),
                ],
            )
            .with_compliance(ComplianceField::new(
                ComplianceKind::Consent,
                "I accept the terms",
                true,
            ))
            .with_compliance(ComplianceField::new(
                ComplianceKind::OptIn,
                "Text me updates",
                false,
            ))
    }

    mod step_list {
        use super::*;

        #[test]
        fn test_one_step_per_group_plus_compliance() {
            let spec = load_info_spec();
            let steps = build_step_list(&spec).unwrap();
            assert_eq!(steps.len(), spec.groups.len() + 1);
            assert_eq!(steps[0].title, "Contact");
            assert_eq!(steps[2].title, COMPLIANCE_STEP_TITLE);
        }

        #[test]
        fn test_keys_cover_fields_and_compliance_once() {
            let spec = load_info_spec();
            let steps = build_step_list(&spec).unwrap();
            let keys: Vec<&str> = steps.iter().flat_map(|s| s.keys()).collect();
            let unique: HashSet<&str> = keys.iter().copied().collect();
            assert_eq!(keys.len(), unique.len());

            let mut expected: HashSet<&str> = spec.fields().map(|f| f.key.as_str()).collect();
            expected.insert("termsAccepted");
            expected.insert("smsOptIn");
            assert_eq!(unique, expected);
        }

        #[test]
        fn test_step_of_key() {
            let spec = load_info_spec();
            assert_eq!(step_of_key(&spec, "contactEmail"), Some(0));
            assert_eq!(step_of_key(&spec, "unNumber"), Some(1));
            assert_eq!(step_of_key(&spec, "smsOptIn"), Some(2));
            assert_eq!(step_of_key(&spec, "missing"), None);
        }

        #[test]
        fn test_empty_compliance_still_has_trailing_step() {
            let spec = FormSpec::new("x", "X")
                .with_group("A", vec![FieldSpec::new("a", "A", FieldKind::Text)]);
            let steps = build_step_list(&spec).unwrap();
            assert_eq!(steps.len(), 2);
            assert!(steps[1].fields.is_empty());
        }

        #[test]
        fn test_malformed_spec_rejected() {
            let spec = FormSpec::new("x", "X").with_group(
                "A",
                vec![FieldSpec::new("b", "B", FieldKind::Text).visible_when("missing", "x")],
            );
            assert!(matches!(
                build_step_list(&spec),
                Err(SpecError::Invalid { .. })
            ));
        }
    }

    mod visibility {
        use super::*;

        #[test]
        fn test_field_not_on_step_is_hidden() {
            let spec = load_info_spec();
            let values = default_values(&spec);
            assert!(!is_field_visible(&spec, 0, "isHazmat", &values));
            assert!(is_field_visible(&spec, 1, "isHazmat", &values));
            assert!(!is_field_visible(&spec, 7, "isHazmat", &values));
        }

        #[test]
        fn test_undefined_dependency_is_hidden() {
            let spec = load_info_spec();
            let values = FormValues::new();
            assert!(!is_field_visible(&spec, 1, "unNumber", &values));
        }

        #[test]
        fn test_dependency_match_is_exact() {
            let spec = load_info_spec();
            let mut values = FormValues::new();

            values.insert("isHazmat".to_string(), FieldValue::YesNo(true));
            assert!(is_field_visible(&spec, 1, "unNumber", &values));

            values.insert("isHazmat".to_string(), text("yes"));
            assert!(!is_field_visible(&spec, 1, "unNumber", &values));

            values.insert("isHazmat".to_string(), FieldValue::Bool(true));
            assert!(!is_field_visible(&spec, 1, "unNumber", &values));
        }

        #[test]
        fn test_compliance_fields_visible_on_last_step() {
            let spec = load_info_spec();
            let values = default_values(&spec);
            assert!(is_field_visible(&spec, 2, "termsAccepted", &values));
            assert!(!is_field_visible(&spec, 1, "termsAccepted", &values));
        }
    }

    mod defaults {
        use super::*;

        #[test]
        fn test_type_appropriate_defaults() {
            let spec = load_info_spec();
            let values = default_values(&spec);
            assert_eq!(values["contactEmail"], text(""));
            assert_eq!(values["isHazmat"], FieldValue::YesNo(false));
            assert!(values["isHazmat"].matches_literal("No"));
            assert_eq!(values["termsAccepted"], FieldValue::Bool(false));
            assert_eq!(values["termsAcceptedTouched"], FieldValue::Bool(false));
            assert_eq!(values["smsOptInTouched"], FieldValue::Bool(false));
        }
    }

    mod step_validation {
        use super::*;

        #[test]
        fn test_hazmat_requires_only_missing_fields() {
            let spec = load_info_spec();
            let mut values = default_values(&spec);
            values.insert("isHazmat".to_string(), FieldValue::YesNo(true));
            values.insert("unNumber".to_string(), text(""));
            values.insert("hazmatClass".to_string(), text("X"));

            let errors = validate_step(&spec, 1, &values).unwrap_err();
            assert_eq!(
                errors,
                vec![FieldError::new(
                    "unNumber",
                    "UN number is required for hazardous materials"
                )]
            );
        }

        #[test]
        fn test_collects_all_violations() {
            let spec = load_info_spec();
            let mut values = default_values(&spec);
            values.insert("isHazmat".to_string(), FieldValue::YesNo(true));

            let errors = validate_step(&spec, 1, &values).unwrap_err();
            let keys: Vec<&str> = errors.iter().map(|e| e.key.as_str()).collect();
            assert_eq!(keys, vec!["unNumber", "hazmatClass"]);
        }

        #[test]
        fn test_hidden_fields_skipped() {
            let spec = load_info_spec();
            let values = default_values(&spec);
            assert!(validate_step(&spec, 1, &values).is_ok());
        }

        #[test]
        fn test_hidden_required_field_skipped() {
            let spec = FormSpec::new("x", "X").with_group(
                "A",
                vec![
                    FieldSpec::new("isHeavyLoad", "Heavy?", FieldKind::YesNo),
                    FieldSpec::new("heavyLoadWeight", "Weight", FieldKind::Text)
                        .required(true)
                        .visible_when("isHeavyLoad", "Yes"),
                ],
            );
            let mut values = default_values(&spec);
            assert!(validate_step(&spec, 0, &values).is_ok());

            values.insert("isHeavyLoad".to_string(), FieldValue::YesNo(true));
            let errors = validate_step(&spec, 0, &values).unwrap_err();
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].message, "Weight is required");
        }

        #[test]
        fn test_required_and_email_format() {
            let spec = load_info_spec();
            let mut values = default_values(&spec);
            let errors = validate_step(&spec, 0, &values).unwrap_err();
            assert_eq!(errors[0].message, "Email is required");

            values.insert("contactEmail".to_string(), text("not-an-email"));
            let errors = validate_step(&spec, 0, &values).unwrap_err();
            assert_eq!(errors[0].message, "Please enter a valid email address");

            values.insert("contactEmail".to_string(), text("a@b.com"));
            assert!(validate_step(&spec, 0, &values).is_ok());
        }

        #[test]
        fn test_validation_pattern_with_message() {
            let spec = FormSpec::new("x", "X").with_group(
                "A",
                vec![FieldSpec::new("zip", "ZIP", FieldKind::Text).with_pattern(
                    Regex::new("^[0-9]{5}$").unwrap(),
                    Some("Enter a 5-digit ZIP code".to_string()),
                )],
            );
            let mut values = default_values(&spec);
            assert!(validate_step(&spec, 0, &values).is_ok());

            values.insert("zip".to_string(), text("12ab"));
            let errors = validate_step(&spec, 0, &values).unwrap_err();
            assert_eq!(errors[0].message, "Enter a 5-digit ZIP code");
        }

        #[test]
        fn test_kind_checks() {
            let spec = FormSpec::new("x", "X").with_group(
                "A",
                vec![
                    FieldSpec::new("phone", "Phone", FieldKind::Tel),
                    FieldSpec::new("pickup", "Pickup", FieldKind::Date),
                    FieldSpec::new("mode", "Mode", FieldKind::Select)
                        .with_options(&["Dry Van", "Reefer"]),
                    FieldSpec::new("agree", "Agree", FieldKind::Checkbox).required(true),
                ],
            );
            let mut values = default_values(&spec);
            values.insert("phone".to_string(), text("call me"));
            values.insert("pickup".to_string(), text("tomorrow"));
            values.insert("mode".to_string(), text("Tanker"));

            let errors = validate_step(&spec, 0, &values).unwrap_err();
            let keys: Vec<&str> = errors.iter().map(|e| e.key.as_str()).collect();
            assert_eq!(keys, vec!["phone", "pickup", "mode", "agree"]);

            values.insert("phone".to_string(), text("(555) 123-4567"));
            values.insert(
                "pickup".to_string(),
                FieldValue::from_input(FieldKind::Date, "2024-05-01"),
            );
            values.insert("mode".to_string(), text("Reefer"));
            values.insert("agree".to_string(), FieldValue::YesNo(true));
            assert!(validate_step(&spec, 0, &values).is_ok());
        }

        #[test]
        fn test_required_compliance() {
            let spec = load_info_spec();
            let mut values = default_values(&spec);
            let errors = validate_step(&spec, 2, &values).unwrap_err();
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].key, "termsAccepted");

            values.insert("termsAccepted".to_string(), FieldValue::Bool(true));
            assert!(validate_step(&spec, 2, &values).is_ok());
        }

        #[test]
        fn test_rule_ignored_when_target_not_on_step() {
            let spec = FormSpec::new("x", "X").with_group(
                "A",
                vec![FieldSpec::new("isHazmat", "Hazmat?", FieldKind::YesNo)],
            );
            let mut values = default_values(&spec);
            values.insert("isHazmat".to_string(), FieldValue::YesNo(true));
            assert!(validate_step(&spec, 0, &values).is_ok());
        }

        #[test]
        fn test_validate_submission_spans_steps() {
            let spec = load_info_spec();
            let values = default_values(&spec);
            let errors = validate_submission(&spec, &values).unwrap_err();
            let keys: Vec<&str> = errors.iter().map(|e| e.key.as_str()).collect();
            assert_eq!(keys, vec!["contactEmail", "termsAccepted"]);
        }
    }
}
