//! Filter engine.
//!
//! A [`FilterConfig`] is a conjunction of independent constraints. Every
//! field has an "absent means no constraint" reading, so any combination of
//! fields is a valid query and the empty config keeps everything.


use crate::record::{ErrorRecord, RequestRecord};
use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub window: TimeWindow,

    /// Case-insensitive substring of the client IP.
    pub ip_contains: Option<String>,
    /// Case-insensitive substring of the request URL.
    pub url_contains: Option<String>,
    /// Case-insensitive substring of the user agent.
    pub user_agent_contains: Option<String>,

    /// Empty = any method.
    #[serde(default)]
    pub methods: BTreeSet<String>,
    /// Empty = any status.
    #[serde(default)]
    pub statuses: BTreeSet<u16>,
    /// Empty = any country. A non-empty set never matches records without one.
    #[serde(default)]
    pub countries: BTreeSet<String>,

    /// `None` keeps bots and humans.
    pub traffic: Option<Traffic>,

    /// Histogram bucket width. `None` falls back to the dashboard default.
    pub bucket_minutes: Option<u32>,
}

/// Inclusive time bounds on the record timestamp (UTC).
///
/// `last_minutes` wins over `start`/`end` when set. It is measured back from
/// the evaluation instant and imposes no upper bound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub last_minutes: Option<u32>,
}

impl TimeWindow {
    pub fn last_minutes(minutes: u32) -> Self {
        Self {
            last_minutes: Some(minutes),
            ..Self::default()
        }
    }

    pub fn between(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            last_minutes: None,
        }
    }

    fn bounds(&self, now: NaiveDateTime) -> (Option<NaiveDateTime>, Option<NaiveDateTime>) {
        match self.last_minutes {
            Some(minutes) => (Some(now - TimeDelta::minutes(i64::from(minutes))), None),
            None => (self.start, self.end),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Traffic {
    Bot,
    Human,
}

/// Records satisfying every active constraint, in input order.
///
/// `now` anchors [`TimeWindow::last_minutes`].
pub fn apply<'a>(
    records: &'a [RequestRecord],
    filter: &FilterConfig,
    now: NaiveDateTime,
) -> Vec<&'a RequestRecord> {
    let predicate = Predicate::new(filter, now);
    records.iter().filter(|r| predicate.matches(r)).collect()
}

/// Error records narrowed by the IP substring; their timestamps are source
/// text and take no part in time filtering.
pub fn apply_to_errors<'a>(
    errors: &'a [ErrorRecord],
    filter: &FilterConfig,
) -> Vec<&'a ErrorRecord> {
    let ip = needle(&filter.ip_contains);
    errors
        .iter()
        .filter(|e| contains(&e.ip, ip.as_deref()))
        .collect()
}

/// A [`FilterConfig`] compiled for repeated matching.
struct Predicate<'f> {
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
    ip: Option<String>,
    url: Option<String>,
    user_agent: Option<String>,
    filter: &'f FilterConfig,
}

impl<'f> Predicate<'f> {
    fn new(filter: &'f FilterConfig, now: NaiveDateTime) -> Self {
        let (start, end) = filter.window.bounds(now);
        Self {
            start,
            end,
            ip: needle(&filter.ip_contains),
            url: needle(&filter.url_contains),
            user_agent: needle(&filter.user_agent_contains),
            filter,
        }
    }

    fn matches(&self, r: &RequestRecord) -> bool {
        self.start.is_none_or(|start| r.time >= start)
            && self.end.is_none_or(|end| r.time <= end)
            && contains(&r.ip, self.ip.as_deref())
            && contains(&r.url, self.url.as_deref())
            && contains(&r.user_agent, self.user_agent.as_deref())
            && member(&self.filter.methods, &r.method)
            && member(&self.filter.statuses, &r.status)
            && self.matches_country(r)
            && match self.filter.traffic {
                Some(Traffic::Bot) => r.is_bot,
                Some(Traffic::Human) => !r.is_bot,
                None => true,
            }
    }

    fn matches_country(&self, r: &RequestRecord) -> bool {
        let countries = &self.filter.countries;
        countries.is_empty()
            || r.country
                .as_ref()
                .is_some_and(|country| countries.contains(country))
    }
}

/// Lowercased search term; an empty term imposes no constraint.
fn needle(term: &Option<String>) -> Option<String> {
    term.as_deref()
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn contains(haystack: &str, needle: Option<&str>) -> bool {
    needle.is_none_or(|n| haystack.to_lowercase().contains(n))
}

fn member<T: Ord>(set: &BTreeSet<T>, value: &T) -> bool {
    set.is_empty() || set.contains(value)
}
