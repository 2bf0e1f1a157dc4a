//! CSV and JSON export of client listings and score explanations.

use credence_model::{Decision, FeatureContribution, Score};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Table conversion error.
    #[error("Table error: {0}")]
    Polars(#[from] PolarsError),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }

    /// Infer the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("csv") => Ok(Self::Csv),
            Some("json") => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(format!(
                "unsupported export extension {}",
                other.unwrap_or("(none)")
            ))),
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn finish_csv(wtr: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

/// One cell of a client listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Missing value
    Null,
    /// Integer column
    Int(i64),
    /// Floating-point column
    Float(f64),
    /// Anything else, rendered as text
    Text(String),
}

impl Cell {
    fn render(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Int(v) => v.to_string(),
            Self::Float(v) => v.to_string(),
            Self::Text(v) => v.clone(),
        }
    }
}

/// A table of client rows detached from the dataframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientListing {
    /// Column names
    pub columns: Vec<String>,
    /// Rows, one cell per column
    pub rows: Vec<Vec<Cell>>,
}

impl ClientListing {
    /// Copy a frame into a listing.
    pub fn from_frame(frame: &DataFrame) -> Result<Self, ExportError> {
        let columns: Vec<String> = frame
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect();
        let mut rows = vec![Vec::with_capacity(columns.len()); frame.height()];

        for column in frame.get_columns() {
            let dtype = column.dtype();
            let cells: Vec<Cell> = if dtype.is_integer() {
                column
                    .cast(&DataType::Int64)?
                    .as_materialized_series()
                    .i64()?
                    .into_iter()
                    .map(|v| v.map_or(Cell::Null, Cell::Int))
                    .collect()
            } else if dtype.is_float() {
                column
                    .cast(&DataType::Float64)?
                    .as_materialized_series()
                    .f64()?
                    .into_iter()
                    .map(|v| v.map_or(Cell::Null, Cell::Float))
                    .collect()
            } else {
                column
                    .cast(&DataType::String)?
                    .as_materialized_series()
                    .str()?
                    .into_iter()
                    .map(|v| v.map_or(Cell::Null, |s| Cell::Text(s.to_string())))
                    .collect()
            };
            for (row, cell) in rows.iter_mut().zip(cells) {
                row.push(cell);
            }
        }

        Ok(Self { columns, rows })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows as JSON objects keyed by column.
    fn records(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(name, cell)| {
                        let value = serde_json::to_value(cell).unwrap_or(serde_json::Value::Null);
                        (name.clone(), value)
                    })
                    .collect()
            })
            .collect()
    }
}

impl Exporter for ClientListing {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                wtr.write_record(&self.columns)?;
                for row in &self.rows {
                    wtr.write_record(row.iter().map(Cell::render))?;
                }
                finish_csv(wtr)
            }
            ExportFormat::Json => Ok(serde_json::to_string(&self.records())?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(&self.records())?),
        }
    }
}

/// Score of one client with its explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreExport {
    /// Client identifier
    pub client_id: i64,
    /// Probability of default
    pub probability: f64,
    /// Decision at the fixed threshold
    pub decision: Decision,
    /// Expected margin
    pub baseline: f64,
    /// Client's raw margin
    pub margin: f64,
    /// Feature contributions, largest magnitude first
    pub contributions: Vec<FeatureContribution>,
}

impl ScoreExport {
    /// Create a new score export.
    pub fn new(
        client_id: i64,
        score: Score,
        baseline: f64,
        margin: f64,
        contributions: Vec<FeatureContribution>,
    ) -> Self {
        Self {
            client_id,
            probability: score.probability,
            decision: score.decision,
            baseline,
            margin,
            contributions,
        }
    }

    /// Convert to a flat structure suitable for CSV export.
    fn to_flat_records(&self) -> Vec<ContributionFlat> {
        self.contributions
            .iter()
            .map(|c| ContributionFlat {
                client_id: self.client_id,
                feature: c.feature.clone(),
                value: c.value,
                contribution: c.contribution,
            })
            .collect()
    }
}

/// Flattened contribution row for CSV export.
#[derive(Debug, Serialize, Deserialize)]
struct ContributionFlat {
    client_id: i64,
    feature: String,
    value: f64,
    contribution: f64,
}

impl Exporter for ScoreExport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut output = String::new();

                // Header information as comments
                output.push_str(&format!("# Client: {}\n", self.client_id));
                output.push_str(&format!("# Probability: {}\n", self.probability));
                output.push_str(&format!("# Decision: {}\n", self.decision));
                output.push_str(&format!("# Baseline: {}\n", self.baseline));
                output.push_str(&format!("# Margin: {}\n", self.margin));

                let mut wtr = csv::Writer::from_writer(vec![]);
                for record in self.to_flat_records() {
                    wtr.serialize(&record)?;
                }
                output.push_str(&finish_csv(wtr)?);
                Ok(output)
            }
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}
