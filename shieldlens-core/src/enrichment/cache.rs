use crate::enrichment::{BotClassifier, GeoInfo, GeoLookup, NetworkInfo, NetworkLookup, Unknown};
use crate::record::RequestRecord;
use ahash::{AHashMap, RandomState};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};

/// How many answers each memo table may hold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CachePolicy {
    /// Entries live for the whole process. A key is looked up at most once.
    /// Memory grows with the number of distinct IPs and user agents seen.
    #[default]
    Unbounded,
    /// Least-recently-used eviction per table. An evicted key is looked up
    /// again the next time it appears.
    Lru { capacity: NonZeroUsize },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub geo_entries: usize,
    pub network_entries: usize,
    pub bot_entries: usize,
}

/// Memoizing front for the three enrichment sources.
///
/// One instance belongs to one engine; nothing is shared through globals.
/// Failed lookups are remembered as `None` like any other answer.
pub struct EnrichmentCache {
    geo: Box<dyn GeoLookup>,
    network: Box<dyn NetworkLookup>,
    bots: Box<dyn BotClassifier>,

    geo_memo: MemoTable<Option<GeoInfo>>,
    network_memo: MemoTable<Option<NetworkInfo>>,
    bot_memo: MemoTable<bool>,
}

impl EnrichmentCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            geo: Box::new(Unknown),
            network: Box::new(Unknown),
            bots: Box::new(Unknown),
            geo_memo: MemoTable::new(policy),
            network_memo: MemoTable::new(policy),
            bot_memo: MemoTable::new(policy),
        }
    }

    pub fn with_geo(mut self, geo: impl GeoLookup + 'static) -> Self {
        self.geo = Box::new(geo);
        self
    }

    pub fn with_network(mut self, network: impl NetworkLookup + 'static) -> Self {
        self.network = Box::new(network);
        self
    }

    pub fn with_bot_classifier(mut self, bots: impl BotClassifier + 'static) -> Self {
        self.bots = Box::new(bots);
        self
    }

    pub fn lookup_geo(&self, ip: &str) -> Option<GeoInfo> {
        self.geo_memo.get_or_insert_with(ip, || self.geo.lookup(ip))
    }

    pub fn lookup_network(&self, ip: &str) -> Option<NetworkInfo> {
        self.network_memo.get_or_insert_with(ip, || self.network.lookup(ip))
    }

    pub fn classify_bot(&self, user_agent: &str) -> bool {
        self.bot_memo.get_or_insert_with(user_agent, || self.bots.classify(user_agent))
    }

    /// Fill the enrichment fields of a freshly parsed record.
    pub fn enrich(&self, mut record: RequestRecord) -> RequestRecord {
        let geo = self.lookup_geo(&record.ip).unwrap_or_default();
        let network = self.lookup_network(&record.ip).unwrap_or_default();

        record.country = geo.country;
        record.latitude = geo.latitude;
        record.longitude = geo.longitude;
        record.isp = network.isp;
        record.usage_type = network.usage_type;
        record.is_bot = self.classify_bot(&record.user_agent);
        record
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            geo_entries: self.geo_memo.len(),
            network_entries: self.network_memo.len(),
            bot_entries: self.bot_memo.len(),
        }
    }
}

//-----------------------------------------------------------------------------
// Memo tables
//-----------------------------------------------------------------------------

enum MemoTable<V> {
    Unbounded(DashMap<String, V, RandomState>),
    Lru(Mutex<LruTable<V>>),
}

impl<V: Clone> MemoTable<V> {
    fn new(policy: CachePolicy) -> Self {
        match policy {
            CachePolicy::Unbounded => Self::Unbounded(DashMap::with_hasher(RandomState::new())),
            CachePolicy::Lru { capacity } => Self::Lru(Mutex::new(LruTable::new(capacity))),
        }
    }

    /// `lookup` runs with the key's slot locked, so concurrent callers for
    /// the same key never both reach the data source.
    fn get_or_insert_with(&self, key: &str, lookup: impl FnOnce() -> V) -> V {
        match self {
            Self::Unbounded(map) => {
                if let Some(hit) = map.get(key) {
                    return hit.value().clone();
                }
                map.entry(key.to_owned())
                    .or_insert_with(lookup)
                    .value()
                    .clone()
            }
            Self::Lru(table) => {
                // Entries are only ever inserted whole, so a poisoned table is still usable.
                let mut table = table.lock().unwrap_or_else(PoisonError::into_inner);
                if let Some(hit) = table.get(key) {
                    return hit;
                }
                let value = lookup();
                table.insert(key.to_owned(), value.clone());
                value
            }
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Unbounded(map) => map.len(),
            Self::Lru(table) => table.lock().unwrap_or_else(PoisonError::into_inner).len(),
        }
    }
}

struct LruTable<V> {
    capacity: usize,
    tick: u64,
    entries: AHashMap<String, (V, u64)>,
    /// last-use tick -> key, oldest first
    recency: BTreeMap<u64, String>,
}

impl<V: Clone> LruTable<V> {
    fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity: capacity.get(),
            tick: 0,
            entries: AHashMap::new(),
            recency: BTreeMap::new(),
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn get(&mut self, key: &str) -> Option<V> {
        let tick = self.next_tick();
        let (value, last_used) = self.entries.get_mut(key)?;

        if let Some(k) = self.recency.remove(&*last_used) {
            self.recency.insert(tick, k);
        }
        *last_used = tick;
        Some(value.clone())
    }

    fn insert(&mut self, key: String, value: V) {
        let tick = self.next_tick();

        if let Some((_, old_tick)) = self.entries.remove(&key) {
            self.recency.remove(&old_tick);
        } else if self.entries.len() >= self.capacity {
            if let Some((_, oldest)) = self.recency.pop_first() {
                self.entries.remove(&oldest);
            }
        }

        self.recency.insert(tick, key.clone());
        self.entries.insert(key, (value, tick));
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
