//! Statement source trait and request/response types.
//!
//! This module defines the fetch contract (`StatementSource`) every provider
//! adapter implements, along with the request and bundle types it exchanges
//! with the pipeline.
//!
//! # Contract
//!
//! | Operation | Request | Response | Description |
//! |-----------|---------|----------|-------------|
//! | Fetch | [`StatementRequest`] | [`StatementBundle`] | Income statement, balance sheet and listing signal |
//!
//! # Example
//!
//! ```rust,ignore
//! use statlens_core::{Granularity, StatementRequest, StatementSource, Ticker, YahooAdapter};
//!
//! async fn fetch(adapter: &YahooAdapter) -> Result<(), statlens_core::SourceError> {
//!     let ticker = Ticker::parse("INFY.NS").expect("valid");
//!     let bundle = adapter
//!         .fetch(StatementRequest::new(ticker, Granularity::Annual))
//!         .await?;
//!     println!("{} income rows", bundle.income_statement.rows().len());
//!     Ok(())
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::{Granularity, RawStatement, Ticker};

/// Request payload for a statement fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatementRequest {
    pub ticker: Ticker,
    pub granularity: Granularity,
}

impl StatementRequest {
    pub fn new(ticker: Ticker, granularity: Granularity) -> Self {
        Self {
            ticker,
            granularity,
        }
    }
}

/// Everything the pipeline needs from one provider round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementBundle {
    pub ticker: Ticker,
    pub granularity: Granularity,
    pub income_statement: RawStatement,
    #[serde(default)]
    pub balance_sheet: RawStatement,
    /// Whether the provider reports a live market price for the symbol.
    #[serde(default = "listed_by_default")]
    pub listed: bool,
    /// Scalar share count from the company profile, used when the balance
    /// sheet has no usable share rows.
    #[serde(default)]
    pub shares_outstanding: Option<f64>,
}

const fn listed_by_default() -> bool {
    true
}

impl StatementBundle {
    pub fn new(
        ticker: Ticker,
        granularity: Granularity,
        income_statement: RawStatement,
        balance_sheet: RawStatement,
    ) -> Self {
        Self {
            ticker,
            granularity,
            income_statement,
            balance_sheet,
            listed: true,
            shares_outstanding: None,
        }
    }

    pub fn with_shares_outstanding(mut self, shares: f64) -> Self {
        self.shares_outstanding = Some(shares);
        self
    }

    /// Bundle for a symbol the provider has no live market data for.
    pub fn unlisted(ticker: Ticker, granularity: Granularity) -> Self {
        Self {
            listed: false,
            ..Self::new(
                ticker,
                granularity,
                RawStatement::default(),
                RawStatement::default(),
            )
        }
    }
}

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    SymbolNotFound,
    Unavailable,
    RateLimited,
    Timeout,
    EmptyStatement,
    InvalidResponse,
    Internal,
}

/// Structured error returned across the fetch boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn symbol_not_found(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::SymbolNotFound,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Timeout,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn empty_statement(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::EmptyStatement,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidResponse,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::SymbolNotFound => "source.symbol_not_found",
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::Timeout => "source.timeout",
            SourceErrorKind::EmptyStatement => "source.empty_statement",
            SourceErrorKind::InvalidResponse => "source.invalid_response",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Boxed future returned by [`StatementSource::fetch`].
pub type FetchFuture<'a> =
    Pin<Box<dyn Future<Output = Result<StatementBundle, SourceError>> + Send + 'a>>;

/// Statement fetch contract.
///
/// The core tolerates any column order in the returned statements and sorts
/// by period end date itself.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` as they are shared behind an `Arc`.
pub trait StatementSource: Send + Sync {
    /// Short provider name used in logs.
    fn name(&self) -> &'static str;

    /// Fetches the income statement and balance sheet for one ticker.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if:
    /// - The provider does not know the symbol
    /// - The provider is unavailable, rate limited or slow
    /// - The payload cannot be decoded
    fn fetch<'a>(&'a self, req: StatementRequest) -> FetchFuture<'a>;
}
