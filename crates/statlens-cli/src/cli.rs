//! CLI argument definitions for statlens.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `analyze` | Reconcile statements and derive metrics for one company |
//! | `resolve` | Show the exchange ticker a query resolves to |
//! | `session` | Answer one query per stdin line |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `table` | Output format (table, json) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--mock` | `false` | Use deterministic built-in statements |
//! | `--fixture` | none | Read statements from a JSON fixture file |
//! | `--timeout-ms` | `10000` | Per-fetch timeout in ms |
//! | `--retries` | `2` | Retries for transient provider failures |
//! | `--suffix` | `ns` | Exchange suffix for bare symbols |
//! | `--no-cache` | `false` | Fetch on every request |
//!
//! # Examples
//!
//! ```bash
//! # Annual analysis by company name
//! statlens analyze tata consultancy services
//!
//! # Quarterly analysis as JSON
//! statlens analyze INFY --quarterly --format json --pretty
//!
//! # Offline session over the built-in catalog
//! printf 'reliance\nquarterly tcs\n' | statlens --mock session
//! ```

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use statlens_core::{Granularity, MarketSuffix};

/// Statement reconciliation and derived metrics for NSE/BSE companies.
#[derive(Debug, Parser)]
#[command(
    name = "statlens",
    author,
    version,
    about = "Financial statement metrics for listed Indian companies",
    long_about = "statlens resolves a company name or symbol to an NSE/BSE ticker, fetches its \
income statement and balance sheet, reconciles provider row labels into canonical concepts and \
derives EPS, operating margin and growth figures over the most recent four periods.\n\
\n\
Use 'statlens <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Serve deterministic built-in statements instead of calling the provider.
    #[arg(long, global = true, default_value_t = false, conflicts_with = "fixture")]
    pub mock: bool,

    /// Serve statements from a JSON fixture file (an array of bundles).
    #[arg(long, global = true, value_name = "PATH")]
    pub fixture: Option<PathBuf>,

    /// Per-fetch timeout in milliseconds.
    #[arg(long, global = true, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Retries for transient provider failures (0 disables retrying).
    #[arg(long, global = true, value_name = "N")]
    pub retries: Option<u32>,

    /// Exchange suffix appended to bare symbols.
    #[arg(long, global = true, value_enum)]
    pub suffix: Option<SuffixSelector>,

    /// Disable the statement cache.
    #[arg(long, global = true, default_value_t = false)]
    pub no_cache: bool,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned text table with summary and commentary.
    Table,
    /// Single JSON document.
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SuffixSelector {
    /// National Stock Exchange (.NS)
    Ns,
    /// Bombay Stock Exchange (.BO)
    Bo,
}

impl From<SuffixSelector> for MarketSuffix {
    fn from(value: SuffixSelector) -> Self {
        match value {
            SuffixSelector::Ns => MarketSuffix::Nse,
            SuffixSelector::Bo => MarketSuffix::Bse,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze one company.
    ///
    /// Examples:
    ///   statlens analyze reliance
    ///   statlens analyze HDFCBANK.NS --quarterly
    Analyze(AnalyzeArgs),

    /// Resolve a query to an exchange ticker without fetching.
    Resolve(ResolveArgs),

    /// Read queries from stdin, one per line.
    ///
    /// A line may start with `annual` or `quarterly` to override the
    /// session granularity. Blank lines are skipped.
    Session(SessionArgs),
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Company name or symbol (multiple words are joined).
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Use quarterly statements instead of annual.
    #[arg(long, default_value_t = false)]
    pub quarterly: bool,

    /// Skip cached statements and store the fresh fetch.
    #[arg(long, default_value_t = false)]
    pub refresh: bool,
}

impl AnalyzeArgs {
    pub fn query(&self) -> String {
        self.query.join(" ")
    }

    pub fn granularity(&self) -> Granularity {
        granularity(self.quarterly)
    }
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Company name or symbol (multiple words are joined).
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,
}

impl ResolveArgs {
    pub fn query(&self) -> String {
        self.query.join(" ")
    }
}

#[derive(Debug, Args)]
pub struct SessionArgs {
    /// Default to quarterly statements.
    #[arg(long, default_value_t = false)]
    pub quarterly: bool,
}

impl SessionArgs {
    pub fn granularity(&self) -> Granularity {
        granularity(self.quarterly)
    }
}

fn granularity(quarterly: bool) -> Granularity {
    if quarterly {
        Granularity::Quarterly
    } else {
        Granularity::Annual
    }
}
