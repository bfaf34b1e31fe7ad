//! End-to-end analysis: resolve, fetch, reconcile, derive, format.

use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::{CacheKey, CacheMode, MemoryCache, StatementCache};
use crate::commentary::observe;
use crate::data_source::{SourceError, StatementBundle, StatementRequest, StatementSource};
use crate::metrics::derive;
use crate::reconcile::FieldReconciler;
use crate::report::AnalysisReport;
use crate::retry::with_retry;
use crate::{AnalyzerConfig, Granularity, PipelineError, SymbolResolver, Ticker};

/// Runs analyses against one statement source and cache.
///
/// Every failure surfaces as a single [`PipelineError`]; the analyzer holds no
/// per-request state and stays usable after an error.
#[derive(Clone)]
pub struct Analyzer {
    resolver: SymbolResolver,
    source: Arc<dyn StatementSource>,
    cache: Arc<dyn StatementCache>,
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn new(source: Arc<dyn StatementSource>, config: AnalyzerConfig) -> Self {
        Self {
            resolver: SymbolResolver::new(config.default_suffix),
            source,
            cache: Arc::new(MemoryCache::new(config.cache_ttl)),
            config,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn StatementCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_resolver(mut self, resolver: SymbolResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn resolver(&self) -> &SymbolResolver {
        &self.resolver
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub async fn analyze(
        &self,
        query: &str,
        granularity: Granularity,
    ) -> Result<AnalysisReport, PipelineError> {
        self.analyze_with_mode(query, granularity, CacheMode::Use)
            .await
    }

    pub async fn analyze_with_mode(
        &self,
        query: &str,
        granularity: Granularity,
        mode: CacheMode,
    ) -> Result<AnalysisReport, PipelineError> {
        let ticker = self.resolver.resolve(query)?;
        let bundle = self.statements(&ticker, granularity, mode).await?;

        let reconciliation = FieldReconciler::new(granularity).reconcile(
            &bundle.income_statement,
            &bundle.balance_sheet,
            bundle.shares_outstanding,
        )?;
        let metrics = derive(&reconciliation);
        let commentary = observe(&reconciliation, &metrics);
        let report = AnalysisReport::build(query, ticker, &reconciliation, &metrics, commentary);

        info!(
            target: "statlens::pipeline",
            ticker = %report.ticker,
            %granularity,
            periods = report.periods.len(),
            "analysis complete"
        );
        Ok(report)
    }

    /// Provider bundle for `ticker`, read through the cache according to `mode`.
    pub async fn statements(
        &self,
        ticker: &Ticker,
        granularity: Granularity,
        mode: CacheMode,
    ) -> Result<StatementBundle, PipelineError> {
        let key = CacheKey::new(ticker.clone(), granularity);
        if mode.reads() {
            if let Some(bundle) = self.cache.get(&key) {
                debug!(target: "statlens::pipeline", %ticker, %granularity, "cache hit");
                return Ok(bundle);
            }
            debug!(target: "statlens::pipeline", %ticker, %granularity, "cache miss");
        }

        let bundle = self
            .fetch(StatementRequest::new(ticker.clone(), granularity))
            .await
            .map_err(|error| PipelineError::from_source(error, ticker.as_str()))?;

        if !bundle.listed {
            return Err(PipelineError::SymbolNotFound {
                ticker: ticker.to_string(),
            });
        }
        if mode.writes() {
            self.cache.put(key, bundle.clone());
        }
        Ok(bundle)
    }

    pub fn invalidate(&self, ticker: &Ticker, granularity: Granularity) {
        self.cache
            .invalidate(&CacheKey::new(ticker.clone(), granularity));
    }

    /// One fetch per call, each attempt bounded by the configured timeout.
    async fn fetch(&self, request: StatementRequest) -> Result<StatementBundle, SourceError> {
        let timeout = self.config.fetch_timeout;
        let source = self.source.as_ref();
        let label = format!("{} {}", source.name(), request.ticker);

        with_retry(&self.config.retry, &label, |_attempt| {
            let request = request.clone();
            async move {
                let ticker = request.ticker.clone();
                match tokio::time::timeout(timeout, source.fetch(request)).await {
                    Ok(result) => result,
                    Err(_) => Err(SourceError::timeout(format!(
                        "fetch for '{ticker}' exceeded {} ms",
                        timeout.as_millis()
                    ))),
                }
            }
        })
        .await
    }
}
