use std::fmt::{Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::Date;

use crate::ValidationError;

const PERIOD_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// End date of a reporting period; serialized as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeriodEnd(Date);

impl PeriodEnd {
    pub const fn new(date: Date) -> Self {
        Self(date)
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        Date::parse(input.trim(), PERIOD_FORMAT)
            .map(Self)
            .map_err(|_| ValidationError::InvalidPeriodEnd {
                value: input.to_owned(),
            })
    }

    pub const fn date(self) -> Date {
        self.0
    }
}

impl Display for PeriodEnd {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let date = self.0;
        write!(
            f,
            "{:04}-{:02}-{:02}",
            date.year(),
            u8::from(date.month()),
            date.day()
        )
    }
}

impl Serialize for PeriodEnd {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PeriodEnd {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// One labelled statement row; `values[i]` belongs to the statement's `periods[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementRow {
    pub label: String,
    pub values: Vec<Option<f64>>,
}

impl StatementRow {
    pub fn new(label: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            label: label.into(),
            values,
        }
    }

    /// Cell at `index`; missing and non-finite cells are both `None`.
    pub fn value(&self, index: usize) -> Option<f64> {
        self.values
            .get(index)
            .copied()
            .flatten()
            .filter(|value| value.is_finite())
    }
}

/// A provider statement: period columns × labelled rows.
///
/// Column order is whatever the source produced; consumers sort by
/// [`PeriodEnd`] themselves. Every row carries exactly one cell per period.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawStatementRepr")]
pub struct RawStatement {
    periods: Vec<PeriodEnd>,
    rows: Vec<StatementRow>,
}

#[derive(Deserialize)]
struct RawStatementRepr {
    #[serde(default)]
    periods: Vec<PeriodEnd>,
    #[serde(default)]
    rows: Vec<StatementRow>,
}

impl TryFrom<RawStatementRepr> for RawStatement {
    type Error = ValidationError;

    fn try_from(repr: RawStatementRepr) -> Result<Self, Self::Error> {
        let mut statement = Self::new(repr.periods);
        for row in repr.rows {
            statement.push_row(row)?;
        }
        Ok(statement)
    }
}

impl RawStatement {
    pub fn new(periods: Vec<PeriodEnd>) -> Self {
        Self {
            periods,
            rows: Vec::new(),
        }
    }

    /// Builder form of [`RawStatement::push_row`].
    pub fn with_row(
        mut self,
        label: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<Self, ValidationError> {
        self.push_row(StatementRow::new(label, values))?;
        Ok(self)
    }

    /// Adds a row in which every cell is present.
    pub fn with_values(
        self,
        label: impl Into<String>,
        values: &[f64],
    ) -> Result<Self, ValidationError> {
        self.with_row(label, values.iter().copied().map(Some).collect())
    }

    pub fn push_row(&mut self, row: StatementRow) -> Result<(), ValidationError> {
        if row.values.len() != self.periods.len() {
            return Err(ValidationError::RowLengthMismatch {
                label: row.label,
                expected: self.periods.len(),
                actual: row.values.len(),
            });
        }
        if self.row(&row.label).is_some() {
            return Err(ValidationError::DuplicateRow { label: row.label });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn periods(&self) -> &[PeriodEnd] {
        &self.periods
    }

    pub fn rows(&self) -> &[StatementRow] {
        &self.rows
    }

    pub fn row(&self, label: &str) -> Option<&StatementRow> {
        self.rows.iter().find(|row| row.label == label)
    }

    pub fn column_index(&self, period: PeriodEnd) -> Option<usize> {
        self.periods.iter().position(|candidate| *candidate == period)
    }

    pub fn value(&self, label: &str, period: PeriodEnd) -> Option<f64> {
        let index = self.column_index(period)?;
        self.row(label)?.value(index)
    }

    /// True when the statement has no period columns or no rows.
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty() || self.rows.is_empty()
    }
}
