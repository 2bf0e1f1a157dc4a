//! Model input table.
//!
//! One row per client, positionally aligned with [`ClientTable`](crate::ClientTable).
//! Cells are stored as `f64`; missing values become `NaN`, which the tree
//! model routes along each split's default branch.

use crate::error::{DataError, Result};
use crate::io::read_csv;
use ndarray::{Array2, ArrayView1, ArrayView2};
use polars::prelude::*;

/// Numeric feature matrix with its column names.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    names: Vec<String>,
    values: Array2<f64>,
}

impl FeatureTable {
    /// Wrap an existing matrix.
    pub fn new(names: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if names.len() != values.ncols() {
            return Err(DataError::Parse(format!(
                "{} feature names for {} columns",
                names.len(),
                values.ncols()
            )));
        }
        Ok(Self { names, values })
    }

    /// Build the matrix from a frame.
    ///
    /// When `columns` is given, exactly those columns are taken in that
    /// order (this is how the model's own feature order is enforced);
    /// otherwise every column of the frame is used.
    pub fn from_frame(frame: &DataFrame, columns: Option<&[String]>) -> Result<Self> {
        let names: Vec<String> = match columns {
            Some(columns) => columns.to_vec(),
            None => frame
                .get_column_names()
                .into_iter()
                .map(|name| name.to_string())
                .collect(),
        };

        let mut values = Array2::<f64>::from_elem((frame.height(), names.len()), f64::NAN);
        for (j, name) in names.iter().enumerate() {
            let column = frame
                .column(name)
                .map_err(|_| DataError::MissingColumn {
                    table: "features",
                    column: name.clone(),
                })?
                .cast(&DataType::Float64)?;
            for (i, value) in column.as_materialized_series().f64()?.into_iter().enumerate() {
                if let Some(value) = value {
                    values[[i, j]] = value;
                }
            }
        }

        Self::new(names, values)
    }

    /// Parse the matrix from CSV bytes.
    pub fn from_csv(bytes: &[u8], columns: Option<&[String]>) -> Result<Self> {
        Self::from_frame(&read_csv(bytes)?, columns)
    }

    /// Feature names in column order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The full matrix, rows are clients.
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Feature vector of one client.
    pub fn row(&self, index: usize) -> Result<ArrayView1<'_, f64>> {
        if index >= self.nrows() {
            return Err(DataError::RowOutOfRange {
                index,
                len: self.nrows(),
            });
        }
        Ok(self.values.row(index))
    }

    /// Number of clients.
    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    /// Number of features.
    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }
}
