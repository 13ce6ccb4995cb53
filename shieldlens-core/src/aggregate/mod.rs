//! Aggregator: every dashboard view derived from one filtered record set.
//!
//! All views come from the same slice in a single pass, so they agree with
//! each other; [`Aggregator::aggregate`] checks the count invariants before
//! returning.

mod histogram;


pub use histogram::HistogramBucket;

use histogram::TimeHistogram;

use crate::record::RequestRecord;
use ahash::AHashMap;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

pub const DEFAULT_TOP_N: usize = 15;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregateError {
    #[error(
        "aggregate counts disagree: total={total} status_sum={status_sum} histogram_sum={histogram_sum}"
    )]
    Inconsistent {
        total: usize,
        status_sum: usize,
        histogram_sum: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Views {
    pub total_count: usize,
    pub histogram: Vec<HistogramBucket>,
    pub status_distribution: BTreeMap<u16, usize>,
    pub top_ips: Vec<Ranked>,
    pub top_urls: Vec<Ranked>,
    pub geo_points: Vec<GeoPoint>,
    pub detail_table: Vec<DetailRow>,
    pub facets: FacetOptions,
    pub bot_count: usize,
    pub human_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ranked {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// One group of identical (ip, time, country, coordinates, user agent,
/// bot flag, isp, usage type) tuples.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailRow {
    pub ip: String,
    pub time: NaiveDateTime,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub user_agent: String,
    pub is_bot: bool,
    pub isp: Option<String>,
    pub usage_type: Option<String>,
    pub count: usize,
}

/// Distinct values present in the filtered set, sorted ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacetOptions {
    pub methods: Vec<String>,
    pub statuses: Vec<u16>,
    pub countries: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    top_n: usize,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_N)
    }
}

impl Aggregator {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    pub fn aggregate(
        &self,
        records: &[&RequestRecord],
        bucket_minutes: u32,
    ) -> Result<Views, AggregateError> {
        let mut histogram = TimeHistogram::new(bucket_minutes);
        let mut status_distribution: BTreeMap<u16, usize> = BTreeMap::new();
        let mut ip_counts: AHashMap<&str, usize> = AHashMap::new();
        let mut url_counts: AHashMap<&str, usize> = AHashMap::new();
        let mut geo_points = Vec::new();
        let mut groups: BTreeMap<DetailKey<'_>, usize> = BTreeMap::new();
        let mut methods = BTreeSet::new();
        let mut statuses = BTreeSet::new();
        let mut countries = BTreeSet::new();
        let mut bot_count = 0;

        for r in records {
            histogram.record(r.time);
            *status_distribution.entry(r.status).or_insert(0) += 1;
            *ip_counts.entry(r.ip.as_str()).or_insert(0) += 1;
            *url_counts.entry(r.url.as_str()).or_insert(0) += 1;

            if let Some((latitude, longitude)) = r.coordinates() {
                geo_points.push(GeoPoint {
                    latitude,
                    longitude,
                });
            }

            *groups.entry(DetailKey::of(r)).or_insert(0) += 1;

            methods.insert(r.method.as_str());
            statuses.insert(r.status);
            if let Some(country) = &r.country {
                countries.insert(country.as_str());
            }

            if r.is_bot {
                bot_count += 1;
            }
        }

        let views = Views {
            total_count: records.len(),
            histogram: histogram.buckets(),
            status_distribution,
            top_ips: top_n(ip_counts, self.top_n),
            top_urls: top_n(url_counts, self.top_n),
            geo_points,
            detail_table: detail_rows(groups),
            facets: FacetOptions {
                methods: methods.into_iter().map(str::to_string).collect(),
                statuses: statuses.into_iter().collect(),
                countries: countries.into_iter().map(str::to_string).collect(),
            },
            bot_count,
            human_count: records.len() - bot_count,
        };

        check_consistency(&views)?;
        Ok(views)
    }
}

fn check_consistency(views: &Views) -> Result<(), AggregateError> {
    let status_sum: usize = views.status_distribution.values().sum();
    let histogram_sum: usize = views.histogram.iter().map(|b| b.count).sum();

    if status_sum == views.total_count && histogram_sum == views.total_count {
        Ok(())
    } else {
        Err(AggregateError::Inconsistent {
            total: views.total_count,
            status_sum,
            histogram_sum,
        })
    }
}

/// Most frequent first; equal counts fall back to ascending value.
fn top_n(counts: AHashMap<&str, usize>, n: usize) -> Vec<Ranked> {
    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_unstable_by_key(|(value, count)| (Reverse(*count), *value));
    ranked.truncate(n);

    ranked
        .into_iter()
        .map(|(value, count)| Ranked {
            value: value.to_string(),
            count,
        })
        .collect()
}

fn detail_rows(groups: BTreeMap<DetailKey<'_>, usize>) -> Vec<DetailRow> {
    let mut rows: Vec<DetailRow> = groups
        .into_iter()
        .map(|(key, count)| DetailRow {
            ip: key.ip.to_string(),
            time: key.time,
            country: key.country.map(str::to_string),
            latitude: key.latitude.map(|c| c.0),
            longitude: key.longitude.map(|c| c.0),
            user_agent: key.user_agent.to_string(),
            is_bot: key.is_bot,
            isp: key.isp.map(str::to_string),
            usage_type: key.usage_type.map(str::to_string),
            count,
        })
        .collect();

    // Stable: rows with equal counts keep key order.
    rows.sort_by_key(|row| Reverse(row.count));
    rows
}

#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct DetailKey<'a> {
    ip: &'a str,
    time: NaiveDateTime,
    country: Option<&'a str>,
    latitude: Option<Coord>,
    longitude: Option<Coord>,
    user_agent: &'a str,
    is_bot: bool,
    isp: Option<&'a str>,
    usage_type: Option<&'a str>,
}

impl<'a> DetailKey<'a> {
    fn of(r: &'a RequestRecord) -> Self {
        Self {
            ip: &r.ip,
            time: r.time,
            country: r.country.as_deref(),
            latitude: r.latitude.map(Coord),
            longitude: r.longitude.map(Coord),
            user_agent: &r.user_agent,
            is_bot: r.is_bot,
            isp: r.isp.as_deref(),
            usage_type: r.usage_type.as_deref(),
        }
    }
}

/// Coordinate with a total order, so it can take part in a grouping key.
#[derive(Clone, Copy)]
struct Coord(f64);

impl PartialEq for Coord {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Coord {}

impl PartialOrd for Coord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Coord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}
