use crate::conf::{ConfigError, ShieldlensConfig, load_config};
use crate::enrichment::{EnrichmentError, build_enrichment};
use owo_colors::OwoColorize;
use std::path::Path;

pub fn check(path: &Path, plain: bool) -> anyhow::Result<()> {
    let cfg = match load_config(path) {
        Ok(cfg) => cfg,
        Err(err) => {
            print_failure(&err, config_error_hint(&err), plain);
            std::process::exit(1);
        }
    };

    if let Err(err) = build_enrichment(&cfg.enrichment) {
        print_failure(&err, enrichment_error_hint(&err), plain);
        std::process::exit(1);
    }

    print_summary(&cfg, plain);
    Ok(())
}

fn print_summary(cfg: &ShieldlensConfig, plain: bool) {
    let ok = |line: String| {
        if plain {
            println!("ok: {line}");
        } else {
            println!("{} {line}", "✔".green());
        }
    };

    ok("Config loaded successfully".to_string());
    ok(format!("access log: {}", cfg.sources.access_log.display()));
    match &cfg.sources.error_log {
        Some(path) => ok(format!("error log: {}", path.display())),
        None => ok("error log: not configured".to_string()),
    }

    let enrichment = &cfg.enrichment;
    let databases = [
        &enrichment.geoip_city_db,
        &enrichment.geoip_isp_db,
        &enrichment.geoip_connection_type_db,
    ]
    .iter()
    .filter(|db| db.is_some())
    .count();
    ok(format!("{databases} GeoIP databases opened"));
    ok(format!("user-agent engine: {:?}", enrichment.ua_engine));
    ok(format!("cache policy: {:?}", enrichment.cache_policy()));
    ok(format!(
        "refresh every {}ms, top {}, {} min buckets",
        cfg.dashboard.refresh_interval_ms, cfg.dashboard.top_n, cfg.dashboard.bucket_minutes
    ));
}

fn print_failure(err: &dyn std::error::Error, hint: Option<&'static str>, plain: bool) {
    if plain {
        eprintln!("error: {err}");
    } else {
        eprintln!();
        eprintln!("{} {err}", "✘".red().bold());
    }
    if let Some(hint) = hint {
        eprintln!();
        eprintln!("{hint}");
    }
}

pub fn config_error_hint(err: &ConfigError) -> Option<&'static str> {
    match err {
        ConfigError::ReadFile { .. } => Some(
            "Pass the config file with --config, or a directory containing shieldlens.hcl.",
        ),

        ConfigError::Parse { .. } => Some(
            "A minimal config looks like:\n\
             \n\
             sources {\n\
             \x20 access_log = \"/var/log/nginx/access.log\"\n\
             }",
        ),

        ConfigError::Validation { .. } => None,
    }
}

pub fn enrichment_error_hint(err: &EnrichmentError) -> Option<&'static str> {
    match err {
        EnrichmentError::OpenDatabase { .. } => Some(
            "GeoIP databases must be MaxMind .mmdb files.\n\
             \n\
             Remove the setting to run without that lookup.",
        ),

        EnrichmentError::ReadUaRules { .. } | EnrichmentError::ParseUaRules { .. } => Some(
            "The uaparser engine reads uap-core's regexes.yaml.\n\
             \n\
             Set ua_engine = \"woothee\" to use the built-in rules instead.",
        ),

        EnrichmentError::MissingUaRules => None,
    }
}
