use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::data_source::{FetchFuture, SourceError, StatementBundle, StatementRequest, StatementSource};
use crate::{Granularity, Ticker};

/// In-memory statement source keyed by ticker and granularity.
///
/// Fixture files hold a JSON array of [`StatementBundle`] values.
#[derive(Debug, Default)]
pub struct StaticSource {
    bundles: HashMap<(Ticker, Granularity), StatementBundle>,
    fetches: AtomicUsize,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bundle(mut self, bundle: StatementBundle) -> Self {
        self.insert(bundle);
        self
    }

    pub fn insert(&mut self, bundle: StatementBundle) {
        self.bundles
            .insert((bundle.ticker.clone(), bundle.granularity), bundle);
    }

    pub fn from_json_str(raw: &str) -> Result<Self, SourceError> {
        let bundles: Vec<StatementBundle> = serde_json::from_str(raw)
            .map_err(|e| SourceError::invalid_response(format!("invalid fixture: {e}")))?;
        Ok(bundles
            .into_iter()
            .fold(Self::new(), |source, bundle| source.with_bundle(bundle)))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SourceError::internal(format!("failed to read fixture '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    /// Number of fetches served so far, hits and misses alike.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}

impl StatementSource for StaticSource {
    fn name(&self) -> &'static str {
        "static"
    }

    fn fetch<'a>(&'a self, req: StatementRequest) -> FetchFuture<'a> {
        Box::pin(async move {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.bundles
                .get(&(req.ticker.clone(), req.granularity))
                .cloned()
                .ok_or_else(|| {
                    SourceError::symbol_not_found(format!(
                        "no {} statements for '{}'",
                        req.granularity, req.ticker
                    ))
                })
        })
    }
}
