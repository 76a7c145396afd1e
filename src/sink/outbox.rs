//! File-backed spec provider and submission sink
//!
//! Specs are read from `<spec_dir>/<form_id>.json`. Each accepted submission is
//! written as one pretty-printed JSON record under the outbox directory, where a
//! delivery process can pick it up.

use super::traits::{SpecProvider, Submission, SubmissionReceipt, SubmissionSink};
use crate::notify::RenderedNotification;
use crate::state::{FieldValue, FormSpec, SpecError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Loads form specs from a directory of JSON documents
pub struct FileSpecProvider {
    dir: PathBuf,
}

impl FileSpecProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn spec_path(&self, form_id: &str) -> PathBuf {
        self.dir.join(format!("{form_id}.json"))
    }
}

#[async_trait]
impl SpecProvider for FileSpecProvider {
    async fn load_spec(&self, form_id: &str) -> Result<FormSpec, SpecError> {
        // Ids become file names; anything path-like is simply not a form
        if form_id.is_empty() || form_id.contains(['/', '\\']) || form_id.starts_with('.') {
            return Err(SpecError::NotFound(form_id.to_string()));
        }

        let path = self.spec_path(form_id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SpecError::NotFound(form_id.to_string()))
            }
            Err(e) => {
                return Err(SpecError::Parse(format!(
                    "failed to read {}: {e}",
                    path.display()
                )))
            }
        };

        let spec = FormSpec::from_json(&content)?;
        tracing::debug!(form_id, path = %path.display(), "loaded form spec");
        Ok(spec)
    }
}

/// Record persisted for every submission
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutboxRecord<'a> {
    id: Uuid,
    form_id: &'a str,
    submitted_at: DateTime<Utc>,
    values: BTreeMap<&'a str, &'a FieldValue>,
    notification: &'a RenderedNotification,
}

/// Writes submissions into an outbox directory
pub struct OutboxSink {
    dir: PathBuf,
}

impl OutboxSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn write_record(&self, submission: &Submission) -> Result<PathBuf> {
        let record = OutboxRecord {
            id: Uuid::new_v4(),
            form_id: &submission.form_id,
            submitted_at: Utc::now(),
            values: submission
                .values
                .iter()
                .map(|(key, value)| (key.as_str(), value))
                .collect(),
            notification: &submission.notification,
        };

        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create outbox {}", self.dir.display()))?;

        let path = self
            .dir
            .join(format!("{}-{}.json", submission.form_id, record.id));
        let content = serde_json::to_string_pretty(&record)?;
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }
}

#[async_trait]
impl SubmissionSink for OutboxSink {
    async fn submit(&self, submission: &Submission) -> SubmissionReceipt {
        match self.write_record(submission).await {
            Ok(path) => {
                tracing::info!(form_id = %submission.form_id, path = %path.display(), "submission queued");
                SubmissionReceipt::ok(format!("queued as {}", path.display()))
            }
            Err(e) => {
                let detail = format!("{e:#}");
                tracing::error!(form_id = %submission.form_id, error = %detail, "outbox write failed");
                SubmissionReceipt::failed(detail)
            }
        }
    }
}
