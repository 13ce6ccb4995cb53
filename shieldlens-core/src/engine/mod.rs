//! Engine: one refresh = load → filter → aggregate.
//!
//! An [`Engine`] owns its enrichment cache and dataset loader. Refreshes are
//! serialized by the loader lock, so two callers never scan the log or feed
//! the cache at the same time. The most recent result is published through
//! [`Engine::latest`] for readers that must not wait on a refresh.

mod error;

#[cfg(test)]
mod tests;

pub use error::EngineError;

use crate::aggregate::{Aggregator, DEFAULT_TOP_N, Views};
use crate::conf::ShieldlensConfig;
use crate::enrichment::{CacheStats, EnrichmentCache, EnrichmentError, build_enrichment};
use crate::filter::{self, FilterConfig};
use crate::loader::{DatasetLoader, build_loader, load_error_records};
use crate::record::ErrorRecord;
use arc_swap::ArcSwapOption;
use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

const DEFAULT_BUCKET_MINUTES: u32 = 1;

/// What the views describe, so a UI can tell "nothing logged" from
/// "nothing matched".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataState {
    /// The log is missing, unreadable, or holds no parseable requests.
    NoData,
    /// Requests exist but none pass the filter.
    NoMatches,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub state: DataState,
    pub evaluated_at: NaiveDateTime,
    pub bucket_minutes: u32,
    pub views: Views,
    pub error_records: Vec<ErrorRecord>,
}

pub struct Engine {
    cache: EnrichmentCache,
    loader: Mutex<Box<dyn DatasetLoader>>,
    error_log: Option<PathBuf>,
    aggregator: Aggregator,
    default_bucket_minutes: u32,
    latest: ArcSwapOption<Evaluation>,
}

impl Engine {
    pub fn new(cache: EnrichmentCache, loader: Box<dyn DatasetLoader>) -> Self {
        Self {
            cache,
            loader: Mutex::new(loader),
            error_log: None,
            aggregator: Aggregator::new(DEFAULT_TOP_N),
            default_bucket_minutes: DEFAULT_BUCKET_MINUTES,
            latest: ArcSwapOption::empty(),
        }
    }

    pub fn from_config(cfg: &ShieldlensConfig) -> Result<Self, EnrichmentError> {
        let cache = build_enrichment(&cfg.enrichment)?;
        let loader = build_loader(cfg.sources.strategy, cfg.sources.access_log.clone());

        let mut engine = Self::new(cache, loader)
            .with_top_n(cfg.dashboard.top_n)
            .with_bucket_minutes(cfg.dashboard.bucket_minutes);
        engine.error_log = cfg.sources.error_log.clone();
        Ok(engine)
    }

    pub fn with_error_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.error_log = Some(path.into());
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.aggregator = Aggregator::new(top_n);
        self
    }

    pub fn with_bucket_minutes(mut self, minutes: u32) -> Self {
        self.default_bucket_minutes = minutes.max(1);
        self
    }

    /// Run one refresh against the current wall clock.
    pub fn evaluate(&self, filter: &FilterConfig) -> Result<Arc<Evaluation>, EngineError> {
        self.evaluate_at(filter, Utc::now().naive_utc())
    }

    /// Run one refresh with `now` as the evaluation instant (UTC).
    pub fn evaluate_at(
        &self,
        filter: &FilterConfig,
        now: NaiveDateTime,
    ) -> Result<Arc<Evaluation>, EngineError> {
        // Held for the whole refresh.
        let mut loader = self
            .loader
            .lock()
            .map_err(|_| EngineError::RefreshLockPoisoned)?;

        let dataset = loader.load(&self.cache);
        let errors = self
            .error_log
            .as_deref()
            .map(load_error_records)
            .unwrap_or_default();

        let matched = filter::apply(&dataset.records, filter, now);
        let bucket_minutes = filter
            .bucket_minutes
            .unwrap_or(self.default_bucket_minutes)
            .max(1);
        let views = self.aggregator.aggregate(&matched, bucket_minutes)?;

        let state = if dataset.is_empty() {
            DataState::NoData
        } else if matched.is_empty() {
            DataState::NoMatches
        } else {
            DataState::Ready
        };

        let error_records = filter::apply_to_errors(&errors, filter)
            .into_iter()
            .cloned()
            .collect();

        let stats = self.cache.stats();
        tracing::debug!(
            records = dataset.records.len(),
            matched = matched.len(),
            errors = errors.len(),
            geo_cache = stats.geo_entries,
            network_cache = stats.network_entries,
            bot_cache = stats.bot_entries,
            "refresh complete"
        );

        let evaluation = Arc::new(Evaluation {
            state,
            evaluated_at: now,
            bucket_minutes,
            views,
            error_records,
        });
        self.latest.store(Some(Arc::clone(&evaluation)));
        Ok(evaluation)
    }

    /// The last successful evaluation, if any.
    pub fn latest(&self) -> Option<Arc<Evaluation>> {
        self.latest.load_full()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
