use crate::conf::types::{CachePolicyKind, ShieldlensConfig};
use crate::enrichment::UaEngineKind;

const MIN_REFRESH_INTERVAL_MS: u64 = 100;

/// Check everything serde cannot express. All problems are collected so the
/// operator can fix them in one pass.
pub fn validate(cfg: &ShieldlensConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if cfg.sources.access_log.as_os_str().is_empty() {
        errors.push("sources.access_log must not be empty".to_string());
    }

    //-------------------------------------------------------------------------
    // Enrichment
    //-------------------------------------------------------------------------
    let cache = &cfg.enrichment.cache;
    if cache.policy == CachePolicyKind::Lru && cache.capacity.unwrap_or(0) == 0 {
        errors.push("enrichment.cache.capacity must be at least 1 for policy \"lru\"".to_string());
    }

    if cfg.enrichment.ua_engine == UaEngineKind::UaParser && cfg.enrichment.ua_regexes.is_none() {
        errors.push("enrichment.ua_regexes is required for ua_engine \"uaparser\"".to_string());
    }

    //-------------------------------------------------------------------------
    // Dashboard
    //-------------------------------------------------------------------------
    let dashboard = &cfg.dashboard;
    if dashboard.top_n == 0 {
        errors.push("dashboard.top_n must be at least 1".to_string());
    }

    if dashboard.bucket_minutes == 0 {
        errors.push("dashboard.bucket_minutes must be at least 1".to_string());
    }

    if dashboard.refresh_interval_ms < MIN_REFRESH_INTERVAL_MS {
        errors.push(format!(
            "dashboard.refresh_interval_ms must be at least {MIN_REFRESH_INTERVAL_MS}"
        ));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
