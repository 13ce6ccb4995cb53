//! Request enrichment: geolocation, network ownership and bot classification.
//!
//! The three data sources sit behind small lookup traits. [`EnrichmentCache`]
//! owns one of each and memoizes every answer by key (IP or user-agent), so a
//! refresh that re-reads the whole log only pays for keys it has never seen.

mod cache;
mod error;
mod geoip;
mod user_agent;

#[cfg(test)]
mod tests;

pub use cache::{CachePolicy, CacheStats, EnrichmentCache};
pub use error::EnrichmentError;
pub use geoip::{MaxMindGeo, MaxMindNetwork};
pub use user_agent::{UaEngine, UaEngineKind};

use crate::conf::types::EnrichmentConfig;

/// Resolves an IP address to a location.
pub trait GeoLookup: Send + Sync {
    /// `None` for reserved, malformed or unknown addresses.
    fn lookup(&self, ip: &str) -> Option<GeoInfo>;
}

/// Resolves an IP address to the network that owns it.
pub trait NetworkLookup: Send + Sync {
    fn lookup(&self, ip: &str) -> Option<NetworkInfo>;
}

/// Decides whether a user-agent string belongs to an automated client.
pub trait BotClassifier: Send + Sync {
    fn classify(&self, user_agent: &str) -> bool;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoInfo {
    /// e.g., US, GB, etc
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl GeoInfo {
    pub fn has_some_info(&self) -> bool {
        self.country.is_some() || self.latitude.is_some() || self.longitude.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkInfo {
    /// Internet service provider or owning organization
    pub isp: Option<String>,
    /// e.g., Cable/DSL, Corporate, Cellular
    pub usage_type: Option<String>,
}

impl NetworkInfo {
    pub fn has_some_info(&self) -> bool {
        self.isp.is_some() || self.usage_type.is_some()
    }
}

/// Stand-in for a source that is not configured. Knows nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unknown;

impl GeoLookup for Unknown {
    fn lookup(&self, _: &str) -> Option<GeoInfo> {
        None
    }
}

impl NetworkLookup for Unknown {
    fn lookup(&self, _: &str) -> Option<NetworkInfo> {
        None
    }
}

impl BotClassifier for Unknown {
    fn classify(&self, _: &str) -> bool {
        false
    }
}

/// Open every configured data source and wrap them in a cache.
///
/// Missing database paths leave that source [`Unknown`]; paths that are set
/// but cannot be opened are a hard error, since the operator asked for them.
pub fn build_enrichment(cfg: &EnrichmentConfig) -> Result<EnrichmentCache, EnrichmentError> {
    let mut cache = EnrichmentCache::new(cfg.cache_policy());

    if let Some(path) = &cfg.geoip_city_db {
        cache = cache.with_geo(MaxMindGeo::open(path)?);
    }

    if cfg.geoip_isp_db.is_some() || cfg.geoip_connection_type_db.is_some() {
        cache = cache.with_network(MaxMindNetwork::open(
            cfg.geoip_isp_db.as_deref(),
            cfg.geoip_connection_type_db.as_deref(),
        )?);
    }

    if let Some(engine) = user_agent::build_ua_engine(cfg.ua_engine, cfg.ua_regexes.as_deref())? {
        cache = cache.with_bot_classifier(engine);
    }

    Ok(cache)
}
