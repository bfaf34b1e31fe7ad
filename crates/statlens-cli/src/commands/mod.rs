mod analyze;
mod resolve;
mod session;

use std::sync::Arc;
use std::time::Duration;

use statlens_core::{
    Analyzer, AnalyzerConfig, MarketSuffix, NoCache, StatementSource, StaticSource, YahooAdapter,
};
use tracing::debug;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<(), CliError> {
    match &cli.command {
        Command::Analyze(args) => analyze::run(cli, args).await,
        Command::Resolve(args) => resolve::run(cli, args),
        Command::Session(args) => session::run(cli, args).await,
    }
}

/// Environment defaults with command-line flags layered on top.
fn build_config(cli: &Cli) -> Result<AnalyzerConfig, CliError> {
    let mut config = AnalyzerConfig::from_env()?;
    if let Some(suffix) = cli.suffix {
        config = config.with_default_suffix(MarketSuffix::from(suffix));
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        if timeout_ms == 0 {
            return Err(CliError::Validation(
                statlens_core::ValidationError::InvalidConfig {
                    key: "--timeout-ms",
                    value: timeout_ms.to_string(),
                },
            ));
        }
        config = config.with_fetch_timeout(Duration::from_millis(timeout_ms));
    }
    if let Some(retries) = cli.retries {
        config = config.with_max_retries(retries);
    }
    Ok(config)
}

fn build_source(cli: &Cli, config: &AnalyzerConfig) -> Result<Arc<dyn StatementSource>, CliError> {
    if let Some(path) = &cli.fixture {
        let raw = std::fs::read_to_string(path)?;
        let source = StaticSource::from_json_str(&raw).map_err(CliError::Fixture)?;
        debug!(path = %path.display(), bundles = source.len(), "loaded fixture source");
        return Ok(Arc::new(source));
    }
    if cli.mock {
        return Ok(Arc::new(YahooAdapter::default()));
    }

    let timeout_ms = u64::try_from(config.fetch_timeout.as_millis()).unwrap_or(u64::MAX);
    Ok(Arc::new(YahooAdapter::real().with_timeout_ms(timeout_ms)))
}

fn build_analyzer(cli: &Cli) -> Result<Analyzer, CliError> {
    let config = build_config(cli)?;
    let source = build_source(cli, &config)?;
    let analyzer = Analyzer::new(source, config);
    Ok(if cli.no_cache {
        analyzer.with_cache(Arc::new(NoCache))
    } else {
        analyzer
    })
}
