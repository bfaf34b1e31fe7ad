use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_BASE_LEN: usize = 20;

/// Market suffix accepted by the data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketSuffix {
    /// National Stock Exchange of India.
    #[default]
    Nse,
    /// Bombay Stock Exchange.
    Bse,
}

impl MarketSuffix {
    pub const ALL: [Self; 2] = [Self::Nse, Self::Bse];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nse => ".NS",
            Self::Bse => ".BO",
        }
    }

    /// Parse a user-supplied suffix such as `ns`, `.NS` or `bse`.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let normalized = input.trim().trim_start_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "ns" | "nse" => Ok(Self::Nse),
            "bo" | "bse" => Ok(Self::Bse),
            _ => Err(ValidationError::InvalidSuffix {
                value: input.to_owned(),
            }),
        }
    }

    /// Returns the suffix an (uppercase) symbol already carries, if any.
    pub fn detect(symbol: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|suffix| symbol.ends_with(suffix.as_str()))
    }
}

impl Display for MarketSuffix {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exchange-qualified ticker symbol, e.g. `RELIANCE.NS`.
///
/// The base symbol is 1–20 characters drawn from `A–Z`, `0–9`, `.` and `-`,
/// followed by a recognized [`MarketSuffix`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    /// Parse and normalize a fully qualified symbol to uppercase.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }

        let normalized = trimmed.to_ascii_uppercase();
        let suffix =
            MarketSuffix::detect(&normalized).ok_or_else(|| ValidationError::MissingSuffix {
                value: normalized.clone(),
            })?;

        let base = &normalized[..normalized.len() - suffix.as_str().len()];
        let len = base.chars().count();
        if len == 0 || len > MAX_BASE_LEN {
            return Err(ValidationError::SymbolBaseLength {
                len,
                max: MAX_BASE_LEN,
            });
        }

        for (index, ch) in base.chars().enumerate() {
            let valid = ch.is_ascii_uppercase() || ch.is_ascii_digit() || ch == '.' || ch == '-';
            if !valid {
                return Err(ValidationError::SymbolInvalidChar { ch, index });
            }
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn suffix(&self) -> MarketSuffix {
        MarketSuffix::detect(&self.0).unwrap_or_default()
    }

    /// Symbol without its market suffix.
    pub fn base(&self) -> &str {
        let suffix_len = self.suffix().as_str().len();
        &self.0[..self.0.len() - suffix_len]
    }
}

impl Display for Ticker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Ticker {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Ticker {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Ticker> for String {
    fn from(value: Ticker) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_normalizes_ticker() {
        let parsed = Ticker::parse(" infy.ns ").expect("ticker should parse");
        assert_eq!(parsed.as_str(), "INFY.NS");
        assert_eq!(parsed.base(), "INFY");
        assert_eq!(parsed.suffix(), MarketSuffix::Nse);
    }

    #[test]
    fn accepts_bse_suffix_and_inner_punctuation() {
        let parsed = Ticker::parse("BAJAJ-AUTO.BO").expect("ticker should parse");
        assert_eq!(parsed.suffix(), MarketSuffix::Bse);
        assert_eq!(parsed.base(), "BAJAJ-AUTO");
    }

    #[test]
    fn rejects_missing_suffix() {
        let err = Ticker::parse("RELIANCE").expect_err("must fail");
        assert!(matches!(err, ValidationError::MissingSuffix { .. }));
    }

    #[test]
    fn rejects_bare_suffix_and_overlong_base() {
        let err = Ticker::parse(".NS").expect_err("must fail");
        assert!(matches!(err, ValidationError::SymbolBaseLength { len: 0, .. }));

        let long = format!("{}.NS", "A".repeat(21));
        let err = Ticker::parse(&long).expect_err("must fail");
        assert!(matches!(err, ValidationError::SymbolBaseLength { len: 21, .. }));
    }

    #[test]
    fn rejects_invalid_chars() {
        let err = Ticker::parse("TATA MOTORS.NS").expect_err("must fail");
        assert!(matches!(
            err,
            ValidationError::SymbolInvalidChar { ch: ' ', index: 4 }
        ));
    }

    #[test]
    fn parses_suffix_selectors() {
        assert_eq!(MarketSuffix::parse("ns").expect("ns"), MarketSuffix::Nse);
        assert_eq!(MarketSuffix::parse(".BO").expect("bo"), MarketSuffix::Bse);
        assert!(MarketSuffix::parse("nyse").is_err());
    }
}
