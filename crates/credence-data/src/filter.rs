//! Equality filters over the client listing.
//!
//! Each predicate compares a column's string rendering with the selected
//! value. The wildcard [`FilterValue::All`] leaves the table untouched.
//! Predicates are combined with AND in the order of [`FilterColumn::ALL`].

use crate::clients::columns;
use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Label of the wildcard choice.
pub const WILDCARD: &str = "All";

/// Selected value of one filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterValue {
    /// No constraint.
    #[default]
    All,
    /// Keep rows whose value renders exactly as this string.
    Equals(String),
}

impl FilterValue {
    /// Shorthand for an equality constraint.
    pub fn equals(value: impl Into<String>) -> Self {
        Self::Equals(value.into())
    }

    /// Whether this is the wildcard.
    pub const fn is_wildcard(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl FromStr for FilterValue {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(if s == WILDCARD {
            Self::All
        } else {
            Self::Equals(s.to_string())
        })
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(WILDCARD),
            Self::Equals(value) => f.write_str(value),
        }
    }
}

/// The six filterable columns of the client listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterColumn {
    /// Gender code
    Gender,
    /// Age in years
    Age,
    /// Family status
    FamilyStatus,
    /// Number of children
    Children,
    /// Income type
    IncomeType,
    /// Education level
    Education,
}

impl FilterColumn {
    /// Every filter, in application order.
    pub const ALL: [Self; 6] = [
        Self::Gender,
        Self::Age,
        Self::FamilyStatus,
        Self::Children,
        Self::IncomeType,
        Self::Education,
    ];

    /// Column the filter reads.
    pub const fn column(&self) -> &'static str {
        match self {
            Self::Gender => columns::GENDER,
            Self::Age => columns::YEARS_BIRTH,
            Self::FamilyStatus => columns::FAMILY_STATUS,
            Self::Children => columns::CHILDREN,
            Self::IncomeType => columns::INCOME_TYPE,
            Self::Education => columns::EDUCATION,
        }
    }

    /// Operator-facing label.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Gender => "Gender",
            Self::Age => "Age",
            Self::FamilyStatus => "Family status",
            Self::Children => "Children",
            Self::IncomeType => "Income type",
            Self::Education => "Education",
        }
    }

    /// Numeric filters list their choices in ascending order.
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Age | Self::Children)
    }
}

impl fmt::Display for FilterColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Filter selection of the client table view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableFilters {
    /// Gender filter
    pub gender: FilterValue,
    /// Age filter
    pub age: FilterValue,
    /// Family status filter
    pub family_status: FilterValue,
    /// Children filter
    pub children: FilterValue,
    /// Income type filter
    pub income_type: FilterValue,
    /// Education filter
    pub education: FilterValue,
}

impl TableFilters {
    /// Selected value of one filter.
    pub const fn get(&self, column: FilterColumn) -> &FilterValue {
        match column {
            FilterColumn::Gender => &self.gender,
            FilterColumn::Age => &self.age,
            FilterColumn::FamilyStatus => &self.family_status,
            FilterColumn::Children => &self.children,
            FilterColumn::IncomeType => &self.income_type,
            FilterColumn::Education => &self.education,
        }
    }

    /// Replace the value of one filter.
    pub fn set(&mut self, column: FilterColumn, value: FilterValue) {
        match column {
            FilterColumn::Gender => self.gender = value,
            FilterColumn::Age => self.age = value,
            FilterColumn::FamilyStatus => self.family_status = value,
            FilterColumn::Children => self.children = value,
            FilterColumn::IncomeType => self.income_type = value,
            FilterColumn::Education => self.education = value,
        }
    }

    /// Ordered (column, value) predicates.
    pub fn predicates(&self) -> Vec<(&'static str, &FilterValue)> {
        FilterColumn::ALL
            .iter()
            .map(|column| (column.column(), self.get(*column)))
            .collect()
    }

    /// Apply every filter to `frame`.
    pub fn apply(&self, frame: &DataFrame) -> Result<FilteredTable> {
        apply_filters(frame, &self.predicates())
    }
}

/// Result of filtering: the narrowed table and its row count.
#[derive(Debug, Clone)]
pub struct FilteredTable {
    /// Matching rows, in their original order.
    pub frame: DataFrame,
    /// Number of matching rows.
    pub count: usize,
}

/// Keep the rows of `frame` whose `column` renders as `value`.
pub fn filter_equal(frame: &DataFrame, column: &str, value: &FilterValue) -> Result<DataFrame> {
    match value {
        FilterValue::All => Ok(frame.clone()),
        FilterValue::Equals(value) => Ok(frame
            .clone()
            .lazy()
            .filter(equals(column, value))
            .collect()?),
    }
}

/// Apply an ordered list of predicates conjunctively.
pub fn apply_filters(frame: &DataFrame, predicates: &[(&str, &FilterValue)]) -> Result<FilteredTable> {
    let active: Vec<Expr> = predicates
        .iter()
        .filter_map(|(column, value)| match value {
            FilterValue::All => None,
            FilterValue::Equals(value) => Some(equals(column, value)),
        })
        .collect();

    let frame = if active.is_empty() {
        frame.clone()
    } else {
        active
            .into_iter()
            .fold(frame.clone().lazy(), |lf, predicate| lf.filter(predicate))
            .collect()?
    };

    tracing::debug!(rows = frame.height(), "applied table filters");
    Ok(FilteredTable {
        count: frame.height(),
        frame,
    })
}

fn equals(column: &str, value: &str) -> Expr {
    col(column).cast(DataType::String).eq(lit(value))
}

/// Choices offered for a filter: the wildcard, then the column's values.
///
/// Text columns keep first-appearance order; numeric columns are sorted.
pub fn filter_choices(frame: &DataFrame, filter: FilterColumn) -> Result<Vec<String>> {
    let column = frame.column(filter.column())?;
    let mut choices = vec![WILDCARD.to_string()];

    if filter.is_numeric() {
        let mut values: Vec<i64> = column
            .cast(&DataType::Int64)?
            .as_materialized_series()
            .i64()?
            .into_iter()
            .flatten()
            .collect();
        values.sort_unstable();
        values.dedup();
        choices.extend(values.into_iter().map(|v| v.to_string()));
    } else {
        let rendered = column.cast(&DataType::String)?;
        let mut seen = HashSet::new();
        for value in rendered.as_materialized_series().str()?.into_iter().flatten() {
            if seen.insert(value) {
                choices.push(value.to_string());
            }
        }
    }

    Ok(choices)
}
