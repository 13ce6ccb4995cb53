use chrono::{NaiveDateTime, TimeDelta, Timelike};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistogramBucket {
    pub start: NaiveDateTime,
    pub count: usize,
}

/// Fixed-width time buckets, floored on the Unix epoch so widths that
/// divide an hour line up with the clock.
#[derive(Clone)]
pub struct TimeHistogram {
    width_secs: i64,
    counts: BTreeMap<NaiveDateTime, usize>,
}

impl TimeHistogram {
    /// A width of 0 is treated as 1 minute.
    pub(crate) fn new(bucket_minutes: u32) -> Self {
        Self {
            width_secs: i64::from(bucket_minutes.max(1)) * 60,
            counts: BTreeMap::new(),
        }
    }

    pub(crate) fn bucket_start(&self, time: NaiveDateTime) -> NaiveDateTime {
        let secs = time.and_utc().timestamp();
        let offset = secs.rem_euclid(self.width_secs);
        let start = time - TimeDelta::seconds(offset);
        start.with_nanosecond(0).unwrap_or(start)
    }

    pub(crate) fn record(&mut self, time: NaiveDateTime) {
        *self.counts.entry(self.bucket_start(time)).or_insert(0) += 1;
    }

    /// Non-empty buckets, oldest first.
    pub(crate) fn buckets(&self) -> Vec<HistogramBucket> {
        self.counts
            .iter()
            .map(|(start, count)| HistogramBucket {
                start: *start,
                count: *count,
            })
            .collect()
    }
}
