use thiserror::Error;

use crate::data_source::{SourceError, SourceErrorKind};
use crate::domain::Concept;

/// Validation errors raised while constructing domain values or reading configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol '{value}' must end with a recognized market suffix (.NS, .BO)")]
    MissingSuffix { value: String },
    #[error("symbol base length {len} must be between 1 and {max} characters")]
    SymbolBaseLength { len: usize, max: usize },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid market suffix '{value}', expected one of ns, bo")]
    InvalidSuffix { value: String },
    #[error("invalid granularity '{value}', expected annual or quarterly")]
    InvalidGranularity { value: String },
    #[error("period end must be a YYYY-MM-DD date: '{value}'")]
    InvalidPeriodEnd { value: String },

    #[error("row '{label}' has {actual} values but the statement has {expected} periods")]
    RowLengthMismatch {
        label: String,
        expected: usize,
        actual: usize,
    },
    #[error("row '{label}' appears more than once in the statement")]
    DuplicateRow { label: String },

    #[error("configuration '{key}' has invalid value '{value}'")]
    InvalidConfig { key: &'static str, value: String },
}

/// The single user-visible failure of a pipeline run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("invalid stock symbol format '{input}': {reason}")]
    InvalidSymbolFormat {
        input: String,
        reason: ValidationError,
    },

    #[error("symbol '{ticker}' was not found by the data provider")]
    SymbolNotFound { ticker: String },

    #[error("provider error: {0}")]
    ProviderError(String),

    #[error("{0} data not available")]
    MissingConcept(Concept),

    #[error("shares outstanding data not available")]
    SharesOutstandingUnavailable,

    #[error("the provider returned an empty statement")]
    EmptyStatement,
}

impl PipelineError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidSymbolFormat { .. } => "pipeline.invalid_symbol_format",
            Self::SymbolNotFound { .. } => "pipeline.symbol_not_found",
            Self::ProviderError(_) => "pipeline.provider_error",
            Self::MissingConcept(_) => "pipeline.missing_concept",
            Self::SharesOutstandingUnavailable => "pipeline.shares_outstanding_unavailable",
            Self::EmptyStatement => "pipeline.empty_statement",
        }
    }

    /// Maps a fetch-boundary failure onto the pipeline's error kinds.
    pub fn from_source(error: SourceError, ticker: &str) -> Self {
        match error.kind() {
            SourceErrorKind::SymbolNotFound => Self::SymbolNotFound {
                ticker: ticker.to_owned(),
            },
            SourceErrorKind::EmptyStatement => Self::EmptyStatement,
            _ => Self::ProviderError(error.to_string()),
        }
    }
}
