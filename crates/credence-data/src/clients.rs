//! Client attribute table.
//!
//! The client table is the operator-facing view of the test population. Row
//! order is the order of the source file and is the positional index shared
//! with the feature table.

use crate::error::{DataError, Result};
use crate::io::read_csv;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Column names of the client table.
pub mod columns {
    /// Unique client identifier.
    pub const CLIENT_ID: &str = "SK_ID_CURR";
    /// Gender code.
    pub const GENDER: &str = "CODE_GENDER";
    /// Age as a negative day count relative to the application date.
    pub const DAYS_BIRTH: &str = "DAYS_BIRTH";
    /// Derived age in whole years.
    pub const YEARS_BIRTH: &str = "YEARS_BIRTH";
    /// Family status.
    pub const FAMILY_STATUS: &str = "NAME_FAMILY_STATUS";
    /// Number of children.
    pub const CHILDREN: &str = "CNT_CHILDREN";
    /// Education level.
    pub const EDUCATION: &str = "NAME_EDUCATION_TYPE";
    /// Car ownership flag.
    pub const OWN_CAR: &str = "FLAG_OWN_CAR";
    /// Real estate ownership flag.
    pub const OWN_REALTY: &str = "FLAG_OWN_REALTY";
    /// Housing type.
    pub const HOUSING: &str = "NAME_HOUSING_TYPE";
    /// Income type.
    pub const INCOME_TYPE: &str = "NAME_INCOME_TYPE";
    /// Total yearly income.
    pub const INCOME_TOTAL: &str = "AMT_INCOME_TOTAL";
    /// Credit amount.
    pub const CREDIT: &str = "AMT_CREDIT";
    /// Loan annuity.
    pub const ANNUITY: &str = "AMT_ANNUITY";
}

use columns::*;

/// Columns that must be present in the source file.
pub const REQUIRED_COLUMNS: [&str; 13] = [
    CLIENT_ID,
    GENDER,
    DAYS_BIRTH,
    FAMILY_STATUS,
    CHILDREN,
    EDUCATION,
    OWN_CAR,
    OWN_REALTY,
    HOUSING,
    INCOME_TYPE,
    INCOME_TOTAL,
    CREDIT,
    ANNUITY,
];

/// Columns shown in client listings, in display order.
pub const DISPLAY_COLUMNS: [&str; 13] = [
    CLIENT_ID,
    GENDER,
    YEARS_BIRTH,
    FAMILY_STATUS,
    CHILDREN,
    EDUCATION,
    OWN_CAR,
    OWN_REALTY,
    HOUSING,
    INCOME_TYPE,
    INCOME_TOTAL,
    CREDIT,
    ANNUITY,
];

const AMOUNT_COLUMNS: [&str; 3] = [INCOME_TOTAL, CREDIT, ANNUITY];

/// Convert a (negative) day count into whole years of age.
///
/// ```
/// use credence_data::clients::years_from_days;
///
/// assert_eq!(years_from_days(-7300.0), 20);
/// assert_eq!(years_from_days(-12000.0), 32);
/// ```
pub fn years_from_days(days_birth: f64) -> i64 {
    (days_birth / -365.0).floor() as i64
}

/// Summary of one client, as shown next to every per-client view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    /// Client identifier.
    pub id: i64,
    /// Gender code.
    pub gender: String,
    /// Age in years.
    pub age_years: i64,
    /// Family status.
    pub family_status: String,
    /// Number of children.
    pub children: i64,
    /// Income type.
    pub income_type: String,
    /// Education level.
    pub education: String,
    /// Housing type.
    pub housing: String,
    /// Total yearly income.
    pub income_total: Option<f64>,
    /// Credit amount.
    pub credit: Option<f64>,
    /// Loan annuity.
    pub annuity: Option<f64>,
}

/// The client table with its derived age column and identifier index.
#[derive(Debug, Clone)]
pub struct ClientTable {
    frame: DataFrame,
    ids: Vec<i64>,
    positions: HashMap<i64, usize>,
}

impl ClientTable {
    /// Build the table from a raw frame.
    ///
    /// Validates the required columns, rejects missing or duplicate
    /// identifiers and appends `YEARS_BIRTH`.
    pub fn new(frame: DataFrame) -> Result<Self> {
        for column in REQUIRED_COLUMNS {
            if frame.column(column).is_err() {
                return Err(DataError::MissingColumn {
                    table: "clients",
                    column: column.to_string(),
                });
            }
        }

        let ids = frame
            .column(CLIENT_ID)?
            .cast(&DataType::Int64)?
            .as_materialized_series()
            .i64()?
            .into_iter()
            .enumerate()
            .map(|(row, id)| {
                id.ok_or_else(|| DataError::Parse(format!("missing {CLIENT_ID} at row {row}")))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut positions = HashMap::with_capacity(ids.len());
        for (row, &id) in ids.iter().enumerate() {
            if positions.insert(id, row).is_some() {
                return Err(DataError::DuplicateClient(id));
            }
        }

        let frame = with_years_birth(frame)?;

        Ok(Self {
            frame,
            ids,
            positions,
        })
    }

    /// Parse the table from CSV bytes.
    pub fn from_csv(bytes: &[u8]) -> Result<Self> {
        Self::new(read_csv(bytes)?)
    }

    /// Underlying frame, including the derived age column.
    pub const fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Number of clients.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Client identifiers in row order.
    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    /// Row index of a client identifier.
    pub fn position(&self, id: i64) -> Result<usize> {
        self.positions
            .get(&id)
            .copied()
            .ok_or(DataError::UnknownClient(id))
    }

    /// Typed summary of the client at `index`.
    pub fn record(&self, index: usize) -> Result<ClientRecord> {
        self.check_row(index)?;
        Ok(ClientRecord {
            id: self.ids[index],
            gender: self.text(GENDER, index)?,
            age_years: self.integer(YEARS_BIRTH, index)?.unwrap_or_default(),
            family_status: self.text(FAMILY_STATUS, index)?,
            children: self.integer(CHILDREN, index)?.unwrap_or_default(),
            income_type: self.text(INCOME_TYPE, index)?,
            education: self.text(EDUCATION, index)?,
            housing: self.text(HOUSING, index)?,
            income_total: self.number(INCOME_TOTAL, index)?,
            credit: self.number(CREDIT, index)?,
            annuity: self.number(ANNUITY, index)?,
        })
    }

    /// Listing of every client restricted to [`DISPLAY_COLUMNS`].
    ///
    /// Amounts are truncated to whole units; a missing annuity stays null.
    pub fn display_frame(&self) -> Result<DataFrame> {
        display_projection(self.frame.clone().lazy())
    }

    /// Listing of the given rows, in the order given.
    pub fn display_rows(&self, rows: &[usize]) -> Result<DataFrame> {
        for &row in rows {
            self.check_row(row)?;
        }
        let idx = IdxCa::from_vec(
            "row".into(),
            rows.iter().map(|&r| r as IdxSize).collect(),
        );
        display_projection(self.frame.take(&idx)?.lazy())
    }

    fn check_row(&self, index: usize) -> Result<()> {
        if index >= self.len() {
            return Err(DataError::RowOutOfRange {
                index,
                len: self.len(),
            });
        }
        Ok(())
    }

    fn text(&self, column: &str, index: usize) -> Result<String> {
        Ok(match self.frame.column(column)?.get(index)? {
            AnyValue::Null => String::new(),
            AnyValue::String(s) => s.to_string(),
            AnyValue::StringOwned(s) => s.to_string(),
            other => other.to_string(),
        })
    }

    fn number(&self, column: &str, index: usize) -> Result<Option<f64>> {
        Ok(self.frame.column(column)?.get(index)?.extract::<f64>())
    }

    fn integer(&self, column: &str, index: usize) -> Result<Option<i64>> {
        Ok(self.frame.column(column)?.get(index)?.extract::<i64>())
    }
}

fn with_years_birth(mut frame: DataFrame) -> Result<DataFrame> {
    let days = frame.column(DAYS_BIRTH)?.cast(&DataType::Float64)?;
    let years: Int64Chunked = days
        .as_materialized_series()
        .f64()?
        .into_iter()
        .map(|d| d.map(years_from_days))
        .collect();
    frame.with_column(years.with_name(YEARS_BIRTH.into()).into_series())?;
    Ok(frame)
}

fn display_projection(frame: LazyFrame) -> Result<DataFrame> {
    let exprs: Vec<Expr> = DISPLAY_COLUMNS
        .iter()
        .map(|&name| {
            if AMOUNT_COLUMNS.contains(&name) {
                col(name).cast(DataType::Int64)
            } else {
                col(name)
            }
        })
        .collect();
    Ok(frame.select(exprs).collect()?)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rstest::rstest;

    pub(crate) fn sample_frame() -> DataFrame {
        df![
            CLIENT_ID => [101i64, 102, 103],
            GENDER => ["F", "M", "F"],
            DAYS_BIRTH => [-7300i64, -10950, -14600],
            FAMILY_STATUS => ["Married", "Single / not married", "Married"],
            CHILDREN => [0i64, 2, 1],
            EDUCATION => ["Higher education", "Secondary / secondary special", "Higher education"],
            OWN_CAR => ["Y", "N", "N"],
            OWN_REALTY => ["Y", "Y", "N"],
            HOUSING => ["House / apartment", "With parents", "House / apartment"],
            INCOME_TYPE => ["Working", "Pensioner", "Working"],
            INCOME_TOTAL => [135000.5f64, 99000.0, 202500.9],
            CREDIT => [568800.0f64, 222768.0, 663264.0],
            ANNUITY => [Some(20560.5f64), None, Some(69777.0)],
        ]
        .unwrap()
    }

    #[test]
    fn test_derived_age() {
        let table = ClientTable::new(sample_frame()).unwrap();
        let years: Vec<Option<i64>> = table
            .frame()
            .column(YEARS_BIRTH)
            .unwrap()
            .as_materialized_series()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(years, vec![Some(20), Some(30), Some(40)]);
    }

    #[rstest]
    #[case(-7300.0, 20)]
    #[case(-7299.0, 19)]
    #[case(-25000.0, 68)]
    fn test_years_from_days(#[case] days: f64, #[case] years: i64) {
        assert_eq!(years_from_days(days), years);
    }

    #[test]
    fn test_position_and_record() {
        let table = ClientTable::new(sample_frame()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.position(102).unwrap(), 1);
        assert!(matches!(
            table.position(999),
            Err(DataError::UnknownClient(999))
        ));

        let record = table.record(1).unwrap();
        assert_eq!(record.id, 102);
        assert_eq!(record.gender, "M");
        assert_eq!(record.age_years, 30);
        assert_eq!(record.children, 2);
        assert_eq!(record.annuity, None);
    }

    #[test]
    fn test_record_out_of_range() {
        let table = ClientTable::new(sample_frame()).unwrap();
        assert!(matches!(
            table.record(3),
            Err(DataError::RowOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut frame = sample_frame();
        frame
            .with_column(Series::new(CLIENT_ID.into(), [101i64, 101, 103]))
            .unwrap();
        assert!(matches!(
            ClientTable::new(frame),
            Err(DataError::DuplicateClient(101))
        ));
    }

    #[test]
    fn test_missing_column_rejected() {
        let frame = sample_frame().drop(GENDER).unwrap();
        assert!(matches!(
            ClientTable::new(frame),
            Err(DataError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_display_frame_truncates_amounts() {
        let table = ClientTable::new(sample_frame()).unwrap();
        let display = table.display_frame().unwrap();
        assert_eq!(display.width(), DISPLAY_COLUMNS.len());

        let income: Vec<Option<i64>> = display
            .column(INCOME_TOTAL)
            .unwrap()
            .as_materialized_series()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(income, vec![Some(135000), Some(99000), Some(202500)]);
        assert_eq!(display.column(ANNUITY).unwrap().null_count(), 1);
    }

    #[test]
    fn test_display_rows_keeps_requested_order() {
        let table = ClientTable::new(sample_frame()).unwrap();
        let rows = table.display_rows(&[2, 0]).unwrap();
        let ids: Vec<Option<i64>> = rows
            .column(CLIENT_ID)
            .unwrap()
            .as_materialized_series()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(ids, vec![Some(103), Some(101)]);
    }
}
