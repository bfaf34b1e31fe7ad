//! Free-text query to validated ticker.

use std::collections::HashMap;

use tracing::debug;

use crate::{MarketSuffix, PipelineError, Ticker, ValidationError};

/// Well-known NSE company names and their ticker symbols.
const NSE_COMPANIES: &[(&str, &str)] = &[
    ("RELIANCE INDUSTRIES", "RELIANCE.NS"),
    ("TATA CONSULTANCY SERVICES", "TCS.NS"),
    ("INFOSYS", "INFY.NS"),
    ("HDFC BANK", "HDFCBANK.NS"),
    ("ICICI BANK", "ICICIBANK.NS"),
    ("STATE BANK OF INDIA", "SBIN.NS"),
    ("BHARTI AIRTEL", "BHARTIARTL.NS"),
    ("HINDUSTAN UNILEVER", "HINDUNILVR.NS"),
    ("LARSEN & TOUBRO", "LT.NS"),
    ("TATA MOTORS", "TATAMOTORS.NS"),
    ("ASIAN PAINTS", "ASIANPAINT.NS"),
    ("MARUTI SUZUKI", "MARUTI.NS"),
    ("BAJAJ FINANCE", "BAJFINANCE.NS"),
    ("KOTAK MAHINDRA BANK", "KOTAKBANK.NS"),
    ("SUN PHARMA", "SUNPHARMA.NS"),
    ("AXIS BANK", "AXISBANK.NS"),
];

/// Maps user input (company name or symbol) onto a validated [`Ticker`].
///
/// Resolution never performs I/O.
#[derive(Debug, Clone)]
pub struct SymbolResolver {
    default_suffix: MarketSuffix,
    companies: HashMap<String, String>,
}

impl Default for SymbolResolver {
    fn default() -> Self {
        Self::new(MarketSuffix::default())
    }
}

impl SymbolResolver {
    pub fn new(default_suffix: MarketSuffix) -> Self {
        let companies = NSE_COMPANIES
            .iter()
            .map(|(name, symbol)| ((*name).to_owned(), (*symbol).to_owned()))
            .collect();
        Self {
            default_suffix,
            companies,
        }
    }

    /// Adds or replaces a company-name mapping. The name is normalized first.
    pub fn with_company(mut self, name: &str, symbol: &str) -> Self {
        self.companies
            .insert(Self::normalize(name), symbol.trim().to_ascii_uppercase());
        self
    }

    pub const fn default_suffix(&self) -> MarketSuffix {
        self.default_suffix
    }

    /// Trims, collapses internal whitespace runs to one space and uppercases.
    pub fn normalize(input: &str) -> String {
        input
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase()
    }

    pub fn resolve(&self, input: &str) -> Result<Ticker, PipelineError> {
        let normalized = Self::normalize(input);
        if normalized.is_empty() {
            return Err(PipelineError::InvalidSymbolFormat {
                input: input.to_owned(),
                reason: ValidationError::EmptySymbol,
            });
        }

        let candidate = if let Some(symbol) = self.companies.get(&normalized) {
            debug!(target: "statlens::resolver", query = %normalized, %symbol, "matched company name");
            symbol.clone()
        } else if MarketSuffix::detect(&normalized).is_some() {
            normalized
        } else {
            format!("{normalized}{}", self.default_suffix)
        };

        Ticker::parse(&candidate).map_err(|reason| PipelineError::InvalidSymbolFormat {
            input: input.to_owned(),
            reason,
        })
    }
}
