//! Configuration handling for the wizard

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const DEFAULT_SPEC_DIR: &str = "forms";
const DEFAULT_OUTBOX_DIR: &str = "outbox";
const DEFAULT_FORM_ID: &str = "quote-request";

pub const SPEC_DIR_ENV: &str = "FORMWIZARD_SPEC_DIR";
pub const OUTBOX_DIR_ENV: &str = "FORMWIZARD_OUTBOX_DIR";

/// User configuration for the wizard
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WizardConfig {
    /// Directory holding `<form_id>.json` spec documents
    pub spec_dir: Option<PathBuf>,
    /// Directory submissions are written to
    pub outbox_dir: Option<PathBuf>,
    /// Form opened when none is given on the command line
    pub default_form_id: Option<String>,
}

impl WizardConfig {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("io", "formwizard", "formwizard")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if let Some(path) = path {
            if path.exists() {
                let content = fs::read_to_string(&path)?;
                let config: WizardConfig = serde_json::from_str(&content)?;
                return Ok(config);
            }
        }

        Ok(Self::default())
    }

    /// Apply environment overrides on top of the file values
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(SPEC_DIR_ENV).filter(|v| !v.is_empty()) {
            self.spec_dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = lookup(OUTBOX_DIR_ENV).filter(|v| !v.is_empty()) {
            self.outbox_dir = Some(PathBuf::from(dir));
        }
        self
    }

    pub fn spec_dir(&self) -> PathBuf {
        self.spec_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SPEC_DIR))
    }

    pub fn outbox_dir(&self) -> PathBuf {
        self.outbox_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTBOX_DIR))
    }

    /// Form to open: the command-line argument wins over the configured default
    pub fn form_id(&self, arg: Option<String>) -> String {
        arg.filter(|id| !id.is_empty())
            .or_else(|| self.default_form_id.clone())
            .unwrap_or_else(|| DEFAULT_FORM_ID.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WizardConfig::default();
        assert!(config.spec_dir.is_none());
        assert!(config.outbox_dir.is_none());
        assert!(config.default_form_id.is_none());
        assert_eq!(config.spec_dir(), PathBuf::from("forms"));
        assert_eq!(config.outbox_dir(), PathBuf::from("outbox"));
        assert_eq!(config.form_id(None), "quote-request");
    }

    #[test]
    fn test_serialization() {
        let config = WizardConfig {
            spec_dir: Some(PathBuf::from("/srv/forms")),
            outbox_dir: Some(PathBuf::from("/var/spool/forms")),
            default_form_id: Some("contact".to_string()),
        };

        let json = serde_json::to_string(&config).unwrap();
        let parsed: WizardConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.spec_dir, Some(PathBuf::from("/srv/forms")));
        assert_eq!(parsed.outbox_dir, Some(PathBuf::from("/var/spool/forms")));
        assert_eq!(parsed.default_form_id, Some("contact".to_string()));
    }

    #[test]
    fn test_deserialize_with_extra_fields() {
        // Should ignore unknown fields
        let json = r#"{"default_form_id": "contact", "unknown_field": "value"}"#;
        let parsed: WizardConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.form_id(None), "contact");
    }

    #[test]
    fn test_cli_argument_wins() {
        let config = WizardConfig {
            default_form_id: Some("contact".to_string()),
            ..Default::default()
        };
        assert_eq!(config.form_id(Some("quote".to_string())), "quote");
        assert_eq!(config.form_id(Some(String::new())), "contact");
    }

    #[test]
    fn test_env_overrides() {
        let config = WizardConfig {
            spec_dir: Some(PathBuf::from("from-file")),
            ..Default::default()
        }
        .with_env_overrides(|name| match name {
            OUTBOX_DIR_ENV => Some("/tmp/outbox".to_string()),
            SPEC_DIR_ENV => Some(String::new()),
            _ => None,
        });

        assert_eq!(config.spec_dir(), PathBuf::from("from-file"));
        assert_eq!(config.outbox_dir(), PathBuf::from("/tmp/outbox"));
    }

    #[test]
    fn test_load_returns_default_when_no_file() {
        // Load should return default config when file doesn't exist
        let result = WizardConfig::load();
        assert!(result.is_ok());
    }
}
