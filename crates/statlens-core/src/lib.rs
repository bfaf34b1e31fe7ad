//! # Statlens Core
//!
//! Financial statement reconciliation and derived metrics for listed Indian
//! companies.
//!
//! ## Overview
//!
//! This crate turns a free-text company query into a presentation-ready
//! analysis:
//!
//! - **Symbol resolution** from company names or bare symbols to exchange tickers
//! - **Statement source trait** with a Yahoo Finance adapter and a fixture source
//! - **Field reconciliation** of provider row labels into canonical concepts
//! - **Derived metrics** (EPS, OPM%, EPS growth, endpoint growth)
//! - **Presentation formatting** in crore/lakh/thousand units
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Statement sources (Yahoo, static fixtures) |
//! | [`cache`] | Injectable bundle cache keyed by ticker and granularity |
//! | [`commentary`] | Threshold-based observations |
//! | [`config`] | Analyzer configuration and environment overrides |
//! | [`data_source`] | Statement source trait and request/response types |
//! | [`domain`] | Domain models (Ticker, Granularity, RawStatement, Concept) |
//! | [`error`] | Validation and pipeline error types |
//! | [`format`] | Currency, percent and EPS display strings |
//! | [`http_client`] | HTTP client abstraction |
//! | [`metrics`] | EPS, OPM% and growth derivation |
//! | [`pipeline`] | The [`Analyzer`] tying every stage together |
//! | [`reconcile`] | Alias resolution and period selection |
//! | [`report`] | Serializable analysis output |
//! | [`resolver`] | Query to ticker resolution |
//! | [`retry`] | Bounded retry with exponential backoff |
//! | [`throttling`] | Provider request budget |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use statlens_core::{Analyzer, AnalyzerConfig, Granularity, YahooAdapter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let analyzer = Analyzer::new(Arc::new(YahooAdapter::real()), AnalyzerConfig::from_env()?);
//!     let report = analyzer.analyze("infosys", Granularity::Annual).await?;
//!     for row in &report.rows {
//!         println!("{}: {}", row.metric, row.values.join(" | "));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / User     │
//! └────────┬────────┘
//!          │ query + granularity
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Symbol Resolver │     │ Statement Cache  │
//! └────────┬────────┘     └────────▲─────────┘
//!          │                       │
//!          ▼                       │
//! ┌─────────────────┐     ┌────────┴─────────┐
//! │ Analyzer        │────▶│ Statement Source │──▶ HTTP Client
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//!   Reconciler → Metrics → Commentary → Report
//! ```
//!
//! ## Error Handling
//!
//! Every analysis ends in an [`AnalysisReport`] or exactly one [`PipelineError`]:
//!
//! ```rust
//! use statlens_core::{Concept, PipelineError};
//!
//! fn describe(error: &PipelineError) -> &'static str {
//!     match error {
//!         PipelineError::InvalidSymbolFormat { .. } => "check the symbol",
//!         PipelineError::MissingConcept(Concept::Revenue) => "no revenue reported",
//!         PipelineError::ProviderError(_) => "provider trouble, try again",
//!         _ => "analysis failed",
//!     }
//! }
//!
//! assert_eq!(describe(&PipelineError::EmptyStatement), "analysis failed");
//! ```

pub mod adapters;
pub mod cache;
pub mod commentary;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod format;
pub mod http_client;
pub mod metrics;
pub mod pipeline;
pub mod reconcile;
pub mod report;
pub mod resolver;
pub mod retry;
pub mod throttling;

// Re-export commonly used types at crate root for convenience

// Adapter implementations
pub use adapters::{StaticSource, YahooAdapter, YahooAuthManager};

// Caching
pub use cache::{CacheKey, CacheMode, MemoryCache, NoCache, StatementCache};

// Commentary
pub use commentary::{Observation, Tone, Topic};

// Configuration
pub use config::AnalyzerConfig;

// Statement source trait and types
pub use data_source::{
    FetchFuture, SourceError, SourceErrorKind, StatementBundle, StatementRequest, StatementSource,
};

// Domain models
pub use domain::{
    Concept, ConceptAlias, Granularity, MarketSuffix, PeriodEnd, RawStatement, StatementKind,
    StatementRow, Ticker,
};

// Error types
pub use error::{PipelineError, ValidationError};

// HTTP client types
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpFuture, HttpRequest, HttpResponse, NoopHttpClient,
    ReqwestHttpClient,
};

// Metrics and reconciliation
pub use metrics::{DerivedMetrics, GrowthSummary, PeriodMetrics};
pub use reconcile::{
    FieldReconciler, ReconciledPeriodRecord, Reconciliation, ResolvedLabels, SharesSource,
    PERIOD_WINDOW,
};

// Pipeline and output
pub use pipeline::Analyzer;
pub use report::{AnalysisReport, ChartSeries, ReportRow, SummaryView};
pub use resolver::SymbolResolver;

// Retry logic
pub use retry::{Backoff, RetryConfig};

// Throttling
pub use throttling::RequestThrottle;
