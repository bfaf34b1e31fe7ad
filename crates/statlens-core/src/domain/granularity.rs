use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::Month;

use crate::domain::PeriodEnd;
use crate::ValidationError;

/// Reporting period granularity of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    #[default]
    Annual,
    Quarterly,
}

impl Granularity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Annual => "annual",
            Self::Quarterly => "quarterly",
        }
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input.trim().to_ascii_lowercase().as_str() {
            "annual" | "yearly" | "a" | "y" => Ok(Self::Annual),
            "quarterly" | "quarter" | "q" => Ok(Self::Quarterly),
            _ => Err(ValidationError::InvalidGranularity {
                value: input.to_owned(),
            }),
        }
    }

    /// Key prefix the provider uses for timeseries of this granularity.
    pub const fn timeseries_prefix(self) -> &'static str {
        self.as_str()
    }

    /// Display label for a period: `2024` for annual, `Mar-2024` for quarterly.
    pub fn period_label(self, period_end: PeriodEnd) -> String {
        let date = period_end.date();
        match self {
            Self::Annual => date.year().to_string(),
            Self::Quarterly => format!("{}-{}", month_abbrev(date.month()), date.year()),
        }
    }
}

impl Display for Granularity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

const fn month_abbrev(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}
