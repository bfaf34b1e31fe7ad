//! # Domain Models
//!
//! Canonical domain types for statlens statement analysis.
//!
//! ## Overview
//!
//! All models validate their invariants at construction time, so the rest of
//! the pipeline never has to re-check them:
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Ticker`] | Validated exchange-qualified symbol |
//! | [`MarketSuffix`] | Recognized market suffix (`.NS`, `.BO`) |
//! | [`Granularity`] | Annual or quarterly reporting periods |
//! | [`PeriodEnd`] | Reporting period end date |
//! | [`RawStatement`] | Provider statement: labelled rows × period columns |
//! | [`Concept`] | Canonical line item with its ordered alias list |
//!
//! ## Validation
//!
//! ```rust
//! use statlens_core::{Ticker, ValidationError};
//!
//! let ticker = Ticker::parse("reliance.ns").expect("valid ticker");
//! assert_eq!(ticker.as_str(), "RELIANCE.NS");
//!
//! let missing = Ticker::parse("RELIANCE");
//! assert!(matches!(missing, Err(ValidationError::MissingSuffix { .. })));
//! ```

mod concept;
mod granularity;
mod statement;
mod ticker;

pub use concept::{Concept, ConceptAlias, StatementKind};
pub use granularity::Granularity;
pub use statement::{PeriodEnd, RawStatement, StatementRow};
pub use ticker::{MarketSuffix, Ticker};
