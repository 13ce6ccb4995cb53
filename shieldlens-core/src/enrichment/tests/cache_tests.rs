use crate::enrichment::{
    BotClassifier, CachePolicy, EnrichmentCache, GeoInfo, GeoLookup, NetworkInfo, NetworkLookup,
};
use crate::parse::parse_access_line;
use pretty_assertions::assert_eq;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Clone, Default)]
struct CountingGeo {
    calls: Arc<AtomicUsize>,
}

impl GeoLookup for CountingGeo {
    fn lookup(&self, ip: &str) -> Option<GeoInfo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match ip {
            "10.0.0.1" => Some(GeoInfo {
                country: Some("US".into()),
                latitude: Some(37.75),
                longitude: Some(-97.82),
            }),
            _ => None,
        }
    }
}

#[derive(Clone, Default)]
struct CountingNetwork {
    calls: Arc<AtomicUsize>,
}

impl NetworkLookup for CountingNetwork {
    fn lookup(&self, _: &str) -> Option<NetworkInfo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Some(NetworkInfo {
            isp: Some("Example Telecom".into()),
            usage_type: Some("Cable/DSL".into()),
        })
    }
}

#[derive(Clone, Default)]
struct CountingBots {
    calls: Arc<AtomicUsize>,
}

impl BotClassifier for CountingBots {
    fn classify(&self, user_agent: &str) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        user_agent.contains("bot")
    }
}

fn lru(capacity: usize) -> CachePolicy {
    CachePolicy::Lru {
        capacity: NonZeroUsize::new(capacity).unwrap(),
    }
}

#[test]
fn same_key_hits_source_once() {
    let geo = CountingGeo::default();
    let cache = EnrichmentCache::new(CachePolicy::Unbounded).with_geo(geo.clone());

    let first = cache.lookup_geo("10.0.0.1");
    let second = cache.lookup_geo("10.0.0.1");

    assert_eq!(geo.calls.load(Ordering::SeqCst), 1);
    assert_eq!(first, second);
    assert_eq!(first.unwrap().country.as_deref(), Some("US"));
}

#[test]
fn unknown_answers_are_memoized_too() {
    let geo = CountingGeo::default();
    let cache = EnrichmentCache::new(CachePolicy::Unbounded).with_geo(geo.clone());

    assert_eq!(cache.lookup_geo("192.168.1.1"), None);
    assert_eq!(cache.lookup_geo("192.168.1.1"), None);
    assert_eq!(geo.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn tables_are_keyed_independently() {
    let geo = CountingGeo::default();
    let network = CountingNetwork::default();
    let bots = CountingBots::default();
    let cache = EnrichmentCache::new(CachePolicy::Unbounded)
        .with_geo(geo.clone())
        .with_network(network.clone())
        .with_bot_classifier(bots.clone());

    cache.lookup_geo("10.0.0.1");
    cache.lookup_geo("10.0.0.2");
    cache.lookup_network("10.0.0.1");
    cache.classify_bot("Googlebot/2.1");
    cache.classify_bot("Googlebot/2.1");

    assert_eq!(geo.calls.load(Ordering::SeqCst), 2);
    assert_eq!(network.calls.load(Ordering::SeqCst), 1);
    assert_eq!(bots.calls.load(Ordering::SeqCst), 1);

    let stats = cache.stats();
    assert_eq!(stats.geo_entries, 2);
    assert_eq!(stats.network_entries, 1);
    assert_eq!(stats.bot_entries, 1);
}

#[test]
fn caches_do_not_share_state() {
    let geo = CountingGeo::default();
    let a = EnrichmentCache::new(CachePolicy::Unbounded).with_geo(geo.clone());
    let b = EnrichmentCache::new(CachePolicy::Unbounded).with_geo(geo.clone());

    a.lookup_geo("10.0.0.1");
    b.lookup_geo("10.0.0.1");

    assert_eq!(geo.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn unconfigured_sources_leave_fields_empty() {
    let cache = EnrichmentCache::new(CachePolicy::Unbounded);
    let record = parse_access_line(
        r#"10.0.0.1 - - [10/Jan/2024:10:00:00 +0000] "GET /a HTTP/1.1" 200 512 "-" "Googlebot/2.1""#,
    )
    .unwrap();

    let enriched = cache.enrich(record.clone());

    assert_eq!(enriched, record);
}

#[test]
fn enrich_fills_every_field() {
    let cache = EnrichmentCache::new(CachePolicy::Unbounded)
        .with_geo(CountingGeo::default())
        .with_network(CountingNetwork::default())
        .with_bot_classifier(CountingBots::default());
    let record = parse_access_line(
        r#"10.0.0.1 - - [10/Jan/2024:10:00:00 +0000] "GET /a HTTP/1.1" 200 512 "-" "examplebot/1.0""#,
    )
    .unwrap();

    let enriched = cache.enrich(record);

    assert_eq!(enriched.country.as_deref(), Some("US"));
    assert_eq!(enriched.coordinates(), Some((37.75, -97.82)));
    assert_eq!(enriched.isp.as_deref(), Some("Example Telecom"));
    assert_eq!(enriched.usage_type.as_deref(), Some("Cable/DSL"));
    assert!(enriched.is_bot);
}

#[test]
fn failed_geo_keeps_the_record() {
    let cache = EnrichmentCache::new(CachePolicy::Unbounded)
        .with_geo(CountingGeo::default())
        .with_network(CountingNetwork::default());
    let record = parse_access_line(
        r#"not-an-ip - - [10/Jan/2024:10:00:00 +0000] "GET /a HTTP/1.1" 200 512 "-" "ua""#,
    )
    .unwrap();

    let enriched = cache.enrich(record);

    assert_eq!(enriched.ip, "not-an-ip");
    assert_eq!(enriched.country, None);
    assert_eq!(enriched.coordinates(), None);
    assert_eq!(enriched.isp.as_deref(), Some("Example Telecom"));
}

#[test]
fn lru_evicts_least_recently_used() {
    let geo = CountingGeo::default();
    let cache = EnrichmentCache::new(lru(2)).with_geo(geo.clone());

    cache.lookup_geo("a");
    cache.lookup_geo("b");
    // touch "a" so "b" becomes the oldest
    cache.lookup_geo("a");
    cache.lookup_geo("c");
    assert_eq!(geo.calls.load(Ordering::SeqCst), 3);
    assert_eq!(cache.stats().geo_entries, 2);

    // "a" survived
    cache.lookup_geo("a");
    assert_eq!(geo.calls.load(Ordering::SeqCst), 3);

    // "b" was evicted and goes back to the source
    cache.lookup_geo("b");
    assert_eq!(geo.calls.load(Ordering::SeqCst), 4);
    assert_eq!(cache.stats().geo_entries, 2);
}

#[test]
fn lru_with_room_behaves_like_unbounded() {
    let bots = CountingBots::default();
    let cache = EnrichmentCache::new(lru(16)).with_bot_classifier(bots.clone());

    for _ in 0..5 {
        assert!(cache.classify_bot("examplebot"));
        assert!(!cache.classify_bot("Mozilla/5.0"));
    }

    assert_eq!(bots.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn concurrent_lookups_hit_source_once_per_key() {
    let geo = CountingGeo::default();
    let cache = Arc::new(EnrichmentCache::new(CachePolicy::Unbounded).with_geo(geo.clone()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for i in 0..50 {
                    cache.lookup_geo(&format!("10.0.1.{i}"));
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(geo.calls.load(Ordering::SeqCst), 50);
}
