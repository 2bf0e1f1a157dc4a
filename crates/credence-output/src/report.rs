//! Report envelope for rendered views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A required field was not set.
    #[error("Missing report field: {0}")]
    MissingField(&'static str),
}

/// A rendered view with its provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// View that produced the report.
    pub view: String,

    /// Selected client, when the view has one.
    pub client_id: Option<i64>,

    /// Artifact revision the data came from.
    pub revision: Option<String>,

    /// Report generation timestamp.
    pub timestamp: DateTime<Utc>,

    /// Report contents.
    pub contents: serde_json::Value,
}

impl Report {
    /// Create a new report stamped with the current time.
    pub fn new(view: String, client_id: Option<i64>, contents: serde_json::Value) -> Self {
        Self {
            view,
            client_id,
            revision: None,
            timestamp: Utc::now(),
            contents,
        }
    }

    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builder for creating reports.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    view: Option<String>,
    client_id: Option<i64>,
    revision: Option<String>,
    contents: Option<serde_json::Value>,
}

impl ReportBuilder {
    /// Create a new report builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the view name.
    pub fn view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }

    /// Set the selected client.
    pub const fn client_id(mut self, client_id: Option<i64>) -> Self {
        self.client_id = client_id;
        self
    }

    /// Set the artifact revision.
    pub fn revision(mut self, revision: Option<String>) -> Self {
        self.revision = revision;
        self
    }

    /// Set the report contents.
    pub fn contents(mut self, contents: serde_json::Value) -> Self {
        self.contents = Some(contents);
        self
    }

    /// Build the report.
    pub fn build(self) -> Result<Report, ReportError> {
        let view = self.view.ok_or(ReportError::MissingField("view"))?;
        let mut report = Report::new(
            view,
            self.client_id,
            self.contents.unwrap_or(serde_json::Value::Null),
        );
        report.revision = self.revision;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_creation() {
        let report = Report::new("score".to_string(), Some(101), serde_json::json!({"p": 0.2}));
        assert_eq!(report.view, "score");
        assert_eq!(report.client_id, Some(101));
        assert!(report.to_json().unwrap().contains("\"timestamp\""));
    }

    #[test]
    fn test_report_builder() {
        let report = ReportBuilder::new()
            .view("compare")
            .client_id(Some(102))
            .revision(Some("abc123".into()))
            .contents(serde_json::json!({"cohort": [0, 1]}))
            .build()
            .unwrap();
        assert_eq!(report.view, "compare");
        assert_eq!(report.revision.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_builder_requires_view() {
        assert!(matches!(
            ReportBuilder::new().build(),
            Err(ReportError::MissingField("view"))
        ));
    }
}
