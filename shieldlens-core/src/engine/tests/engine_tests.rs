use crate::conf::types::LoadStrategy;
use crate::engine::{DataState, Engine};
use crate::enrichment::{BotClassifier, CachePolicy, EnrichmentCache, GeoInfo, GeoLookup};
use crate::filter::{FilterConfig, TimeWindow, Traffic};
use crate::loader::{Dataset, DatasetLoader, build_loader};
use crate::parse::parse_access_line;
use chrono::{NaiveDate, NaiveDateTime};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

fn at(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 10)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

fn line(ip: &str, minute: u32, url: &str, status: u16, ua: &str) -> String {
    format!(
        r#"{ip} - - [10/Jan/2024:10:{minute:02}:00 +0000] "GET {url} HTTP/1.1" {status} 100 "-" "{ua}""#
    )
}

#[derive(Clone, Default)]
struct CountingGeo {
    calls: Arc<AtomicUsize>,
}

impl GeoLookup for CountingGeo {
    fn lookup(&self, ip: &str) -> Option<GeoInfo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ip.starts_with("10.").then(|| GeoInfo {
            country: Some("US".into()),
            latitude: Some(37.75),
            longitude: Some(-97.82),
        })
    }
}

struct SubstringBots;

impl BotClassifier for SubstringBots {
    fn classify(&self, user_agent: &str) -> bool {
        user_agent.contains("bot")
    }
}

/// Serves a fixed set of lines and records how many loads overlap.
struct FixedLoader {
    lines: Vec<String>,
    active: Arc<AtomicUsize>,
    max_active: Arc<AtomicUsize>,
}

impl FixedLoader {
    fn new(lines: Vec<String>) -> Self {
        Self {
            lines,
            active: Arc::default(),
            max_active: Arc::default(),
        }
    }
}

impl DatasetLoader for FixedLoader {
    fn load(&mut self, cache: &EnrichmentCache) -> Dataset {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(5));

        let records = self
            .lines
            .iter()
            .filter_map(|l| parse_access_line(l))
            .map(|r| cache.enrich(r))
            .collect();
        self.active.fetch_sub(1, Ordering::SeqCst);
        Dataset::read(records)
    }
}

fn engine_with(lines: Vec<String>) -> Engine {
    let cache = EnrichmentCache::new(CachePolicy::Unbounded).with_bot_classifier(SubstringBots);
    Engine::new(cache, Box::new(FixedLoader::new(lines)))
}

#[test]
fn status_filter_narrows_every_view() {
    let lines: Vec<String> = (0..100)
        .map(|i| {
            let status = if i < 12 { 404 } else { 200 };
            line(&format!("10.0.0.{}", i % 7), i % 60, "/x", status, "Mozilla/5.0")
        })
        .collect();
    let engine = engine_with(lines);

    let filter = FilterConfig {
        statuses: [404].into(),
        ..FilterConfig::default()
    };
    let eval = engine.evaluate_at(&filter, at(11, 0)).unwrap();

    assert_eq!(eval.state, DataState::Ready);
    assert_eq!(eval.views.total_count, 12);
    assert_eq!(eval.views.status_distribution, BTreeMap::from([(404, 12)]));
    let histogram_total: usize = eval.views.histogram.iter().map(|b| b.count).sum();
    assert_eq!(histogram_total, 12);
}

#[test]
fn missing_log_reports_no_data() {
    let dir = tempdir().unwrap();
    let loader = build_loader(LoadStrategy::FullRescan, dir.path().join("absent.log"));
    let engine = Engine::new(EnrichmentCache::new(CachePolicy::Unbounded), loader);

    let eval = engine
        .evaluate_at(&FilterConfig::default(), at(11, 0))
        .unwrap();

    assert_eq!(eval.state, DataState::NoData);
    assert_eq!(eval.views.total_count, 0);
    assert!(eval.views.histogram.is_empty());
}

#[test]
fn log_without_parseable_lines_reports_no_data() {
    let engine = engine_with(vec!["garbage".into(), String::new()]);

    let eval = engine
        .evaluate_at(&FilterConfig::default(), at(11, 0))
        .unwrap();

    assert_eq!(eval.state, DataState::NoData);
}

#[test]
fn filter_that_matches_nothing_reports_no_matches() {
    let engine = engine_with(vec![line("10.0.0.1", 0, "/a", 200, "Mozilla/5.0")]);
    let filter = FilterConfig {
        url_contains: Some("/nowhere".into()),
        ..FilterConfig::default()
    };

    let eval = engine.evaluate_at(&filter, at(11, 0)).unwrap();

    assert_eq!(eval.state, DataState::NoMatches);
    assert_eq!(eval.views.total_count, 0);
}

#[test]
fn last_minutes_window_is_relative_to_evaluation_time() {
    let engine = engine_with(vec![
        line("10.0.0.1", 0, "/old", 200, "Mozilla/5.0"),
        line("10.0.0.1", 55, "/new", 200, "Mozilla/5.0"),
    ]);
    let filter = FilterConfig {
        window: TimeWindow::last_minutes(10),
        ..FilterConfig::default()
    };

    let eval = engine.evaluate_at(&filter, at(11, 0)).unwrap();

    assert_eq!(eval.views.total_count, 1);
    assert_eq!(eval.views.top_urls[0].value, "/new");
    assert_eq!(eval.evaluated_at, at(11, 0));
}

#[test]
fn traffic_filter_splits_bots_from_humans() {
    let engine = engine_with(vec![
        line("10.0.0.1", 0, "/a", 200, "Mozilla/5.0"),
        line("10.0.0.2", 1, "/a", 200, "Googlebot/2.1"),
        line("10.0.0.3", 2, "/a", 200, "Bingbot"),
    ]);

    let all = engine
        .evaluate_at(&FilterConfig::default(), at(11, 0))
        .unwrap();
    assert_eq!((all.views.bot_count, all.views.human_count), (2, 1));

    let humans = FilterConfig {
        traffic: Some(Traffic::Human),
        ..FilterConfig::default()
    };
    let eval = engine.evaluate_at(&humans, at(11, 0)).unwrap();
    assert_eq!(eval.views.total_count, 1);
    assert_eq!(eval.views.top_ips[0].value, "10.0.0.1");
}

#[test]
fn repeated_refreshes_reuse_enrichment_answers() {
    let geo = CountingGeo::default();
    let calls = Arc::clone(&geo.calls);
    let cache = EnrichmentCache::new(CachePolicy::Unbounded).with_geo(geo);
    let lines = vec![
        line("10.0.0.1", 0, "/a", 200, "Mozilla/5.0"),
        line("10.0.0.1", 1, "/b", 200, "Mozilla/5.0"),
        line("192.0.2.7", 2, "/c", 200, "Mozilla/5.0"),
    ];
    let engine = Engine::new(cache, Box::new(FixedLoader::new(lines)));

    for _ in 0..3 {
        engine
            .evaluate_at(&FilterConfig::default(), at(11, 0))
            .unwrap();
    }

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(engine.cache_stats().geo_entries, 2);
}

#[test]
fn refreshes_never_overlap() {
    let loader = FixedLoader::new(vec![line("10.0.0.1", 0, "/a", 200, "Mozilla/5.0")]);
    let max_active = Arc::clone(&loader.max_active);
    let engine = Arc::new(Engine::new(
        EnrichmentCache::new(CachePolicy::Unbounded),
        Box::new(loader),
    ));

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                engine
                    .evaluate_at(&FilterConfig::default(), at(11, 0))
                    .unwrap()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().views.total_count, 1);
    }

    assert_eq!(max_active.load(Ordering::SeqCst), 1);
}

#[test]
fn latest_holds_the_most_recent_evaluation() {
    let engine = engine_with(vec![line("10.0.0.1", 0, "/a", 200, "Mozilla/5.0")]);
    assert!(engine.latest().is_none());

    let eval = engine
        .evaluate_at(&FilterConfig::default(), at(11, 0))
        .unwrap();

    let latest = engine.latest().unwrap();
    assert!(Arc::ptr_eq(&eval, &latest));
}

#[test]
fn bucket_size_comes_from_filter_then_engine_default() {
    let lines = (0..10)
        .map(|m| line("10.0.0.1", m, "/a", 200, "Mozilla/5.0"))
        .collect();
    let engine = engine_with(lines).with_bucket_minutes(5);

    let eval = engine
        .evaluate_at(&FilterConfig::default(), at(11, 0))
        .unwrap();
    assert_eq!(eval.bucket_minutes, 5);
    assert_eq!(eval.views.histogram.len(), 2);

    let per_minute = FilterConfig {
        bucket_minutes: Some(1),
        ..FilterConfig::default()
    };
    let eval = engine.evaluate_at(&per_minute, at(11, 0)).unwrap();
    assert_eq!(eval.views.histogram.len(), 10);
}

#[test]
fn error_records_follow_the_ip_filter() {
    let dir = tempdir().unwrap();
    let error_log = dir.path().join("error.log");
    fs::write(
        &error_log,
        "2024/01/10 10:00:00 [error] 12#12: *1 open() \"/srv/x\" failed, client: 10.0.0.1, server: _\n\
         2024/01/10 10:00:05 [error] 12#12: *2 open() \"/srv/y\" failed, client: 10.0.0.2, server: _\n",
    )
    .unwrap();
    let engine = engine_with(vec![line("10.0.0.1", 0, "/a", 200, "Mozilla/5.0")])
        .with_error_log(&error_log);

    let all = engine
        .evaluate_at(&FilterConfig::default(), at(11, 0))
        .unwrap();
    assert_eq!(all.error_records.len(), 2);

    let filter = FilterConfig {
        ip_contains: Some("0.0.2".into()),
        ..FilterConfig::default()
    };
    let eval = engine.evaluate_at(&filter, at(11, 0)).unwrap();
    let ips: Vec<_> = eval.error_records.iter().map(|e| e.ip.as_str()).collect();
    assert_eq!(ips, vec!["10.0.0.2"]);
}
