//! Bucketing of timestamped events into hourly or daily counts.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    EventLogError, EventLogResult, Granularity, TimeBucket, TimeSummary, Timestamped,
};

/// Calendar components identifying one bucket, as produced by a group-by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    /// 1-12.
    pub month: u32,
    pub day: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<u32>,
}

impl Period {
    /// Components of the bucket containing `date`.
    pub fn of(date: DateTime<Utc>, granularity: Granularity) -> Self {
        use chrono::{Datelike, Timelike};
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
            hour: match granularity {
                Granularity::Hour => Some(date.hour()),
                Granularity::Day => None,
            },
        }
    }

    /// Start of the period. The hour is only honoured for hourly buckets.
    pub fn start(&self, granularity: Granularity) -> EventLogResult<DateTime<Utc>> {
        let hour = match granularity {
            Granularity::Hour => self.hour.unwrap_or(0),
            Granularity::Day => 0,
        };
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .map(|dt| dt.and_utc())
            .ok_or(EventLogError::InvalidPeriod {
                year: self.year,
                month: self.month,
                day: self.day,
                hour,
            })
    }
}

/// A grouped count for one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodCount {
    pub period: Period,
    pub count: u64,
}

/// Turn grouped rows into buckets, one per row, keeping the row order.
pub fn bucketize(
    groups: &[PeriodCount],
    granularity: Granularity,
) -> EventLogResult<Vec<TimeBucket>> {
    groups
        .iter()
        .map(|g| Ok(TimeBucket::new(g.period.start(granularity)?, g.count)))
        .collect()
}

/// Count raw items per bucket. Buckets appear in the order first seen.
pub fn time_summary<T: Timestamped>(items: &[T], granularity: Granularity) -> TimeSummary {
    let mut buckets: Vec<TimeBucket> = Vec::new();
    let mut slot_of: HashMap<DateTime<Utc>, usize> = HashMap::new();

    for item in items {
        let date = granularity.truncate(item.timestamp());
        let slot = *slot_of.entry(date).or_insert_with(|| {
            buckets.push(TimeBucket::empty(date));
            buckets.len() - 1
        });
        buckets[slot].count += 1;
    }

    TimeSummary::new(buckets)
}
