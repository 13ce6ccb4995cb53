use crate::enrichment::{CachePolicy, UaEngineKind};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

/// Represents the top-level `shieldlens.hcl` file.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ShieldlensConfig {
    pub sources: SourcesConfig,

    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SourcesConfig {
    pub access_log: PathBuf,

    /// Optional; without it the error-record view stays empty.
    pub error_log: Option<PathBuf>,

    #[serde(default)]
    pub strategy: LoadStrategy,
}

#[derive(Default, Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LoadStrategy {
    /// Re-read the whole file every refresh.
    #[default]
    FullRescan,
    /// Remember a byte cursor and only parse what was appended.
    Tail,
}

#[derive(Default, Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnrichmentConfig {
    pub geoip_city_db: Option<PathBuf>,
    pub geoip_isp_db: Option<PathBuf>,
    pub geoip_connection_type_db: Option<PathBuf>,

    #[serde(default)]
    pub ua_engine: UaEngineKind,

    /// uap-core `regexes.yaml`, required by the `uaparser` engine.
    pub ua_regexes: Option<PathBuf>,

    #[serde(default)]
    pub cache: CacheConfig,
}

impl EnrichmentConfig {
    pub fn cache_policy(&self) -> CachePolicy {
        match (
            self.cache.policy,
            self.cache.capacity.and_then(NonZeroUsize::new),
        ) {
            (CachePolicyKind::Lru, Some(capacity)) => CachePolicy::Lru { capacity },
            _ => CachePolicy::Unbounded,
        }
    }
}

#[derive(Default, Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    #[serde(default)]
    pub policy: CachePolicyKind,

    /// Entries per table. Required for `lru`.
    pub capacity: Option<usize>,
}

#[derive(Default, Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CachePolicyKind {
    #[default]
    Unbounded,
    Lru,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardConfig {
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,

    /// Rows in the top IP / top URL tables.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Default histogram bucket width when a query does not set one.
    #[serde(default = "default_bucket_minutes")]
    pub bucket_minutes: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_refresh_interval_ms(),
            top_n: default_top_n(),
            bucket_minutes: default_bucket_minutes(),
        }
    }
}

impl DashboardConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

fn default_refresh_interval_ms() -> u64 {
    5_000
}

fn default_top_n() -> usize {
    15
}

fn default_bucket_minutes() -> u32 {
    1
}
