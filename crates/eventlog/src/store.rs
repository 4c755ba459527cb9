//! In-memory log store with the match, group, sort and distinct primitives
//! the summaries are built from.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::bucket::{Period, PeriodCount};
use crate::types::{Granularity, LogRecord, LogType, Origin, SortOrder};

/// Predicate over stored records. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub source: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Whether `start`/`end` are inclusive bounds.
    pub inclusive: bool,
    pub log_type: Option<LogType>,
    pub origin: Option<Origin>,
    /// Only records that carry a user id.
    pub require_user: bool,
}

impl LogFilter {
    /// Filter with inclusive time bounds, as the summaries use.
    pub fn within(
        source: Option<&str>,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            source: source.map(str::to_string),
            start,
            end,
            inclusive: true,
            ..Self::default()
        }
    }

    /// Filter with exclusive time bounds, as the raw log query uses.
    pub fn between(
        source: Option<&str>,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            source: source.map(str::to_string),
            start,
            end,
            inclusive: false,
            ..Self::default()
        }
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn with_log_type(mut self, log_type: LogType) -> Self {
        self.log_type = Some(log_type);
        self
    }

    pub fn requiring_user(mut self) -> Self {
        self.require_user = true;
        self
    }

    pub fn matches(&self, record: &LogRecord) -> bool {
        if let Some(source) = &self.source {
            if &record.source != source {
                return false;
            }
        }
        if let Some(start) = self.start {
            let after = if self.inclusive {
                record.timestamp >= start
            } else {
                record.timestamp > start
            };
            if !after {
                return false;
            }
        }
        if let Some(end) = self.end {
            let before = if self.inclusive {
                record.timestamp <= end
            } else {
                record.timestamp < end
            };
            if !before {
                return false;
            }
        }
        if let Some(log_type) = self.log_type {
            if record.log_type != log_type {
                return false;
            }
        }
        if let Some(origin) = self.origin {
            let matched = record
                .payload_object()
                .is_some_and(|payload| origin.matches_payload(&payload));
            if !matched {
                return false;
            }
        }
        if self.require_user && record.user_id().is_none() {
            return false;
        }
        true
    }
}

/// Insertion-ordered container for all stored records.
#[derive(Debug, Clone)]
pub struct LogStore {
    pub records: Vec<LogRecord>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Default for LogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LogStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        let now = now_secs();
        Self {
            records: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append one record.
    pub fn add(&mut self, record: LogRecord) {
        self.records.push(record);
        self.updated_at = now_secs();
    }

    /// Append many records, returning how many were added.
    pub fn extend(&mut self, records: impl IntoIterator<Item = LogRecord>) -> usize {
        let before = self.records.len();
        self.records.extend(records);
        self.updated_at = now_secs();
        self.records.len() - before
    }

    /// Return the number of records.
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// Matching records, newest first.
    pub fn find(&self, filter: &LogFilter) -> Vec<&LogRecord> {
        let mut found: Vec<_> = self.records.iter().filter(|r| filter.matches(r)).collect();
        found.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        found
    }

    /// Number of matching records.
    pub fn count_matching(&self, filter: &LogFilter) -> usize {
        self.records.iter().filter(|r| filter.matches(r)).count()
    }

    /// Group matching records by period, counting distinct transactions.
    ///
    /// Rows come out in first-seen order unless `sort` is given, in which
    /// case they are ordered by period.
    pub fn group_by_period(
        &self,
        filter: &LogFilter,
        granularity: Granularity,
        sort: Option<SortOrder>,
    ) -> Vec<PeriodCount> {
        let mut order: Vec<Period> = Vec::new();
        let mut transactions: HashMap<Period, HashSet<&str>> = HashMap::new();

        for record in self.records.iter().filter(|r| filter.matches(r)) {
            let period = Period::of(record.timestamp, granularity);
            transactions
                .entry(period)
                .or_insert_with(|| {
                    order.push(period);
                    HashSet::new()
                })
                .insert(record.transaction_id.as_str());
        }

        let key = |p: &Period| (p.year, p.month, p.day, p.hour.unwrap_or(0));
        match sort {
            Some(SortOrder::Asc) => order.sort_by_key(key),
            Some(SortOrder::Desc) => order.sort_by_key(|p| std::cmp::Reverse(key(p))),
            None => {}
        }

        order
            .into_iter()
            .map(|period| PeriodCount {
                period,
                count: transactions.get(&period).map_or(0, |t| t.len() as u64),
            })
            .collect()
    }

    /// Distinct values extracted from matching records, in first-seen order.
    pub fn distinct<F>(&self, filter: &LogFilter, extract: F) -> Vec<String>
    where
        F: Fn(&LogRecord) -> Option<String>,
    {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter(|r| filter.matches(r))
            .filter_map(extract)
            .filter(|v| seen.insert(v.clone()))
            .collect()
    }

    /// Every source that has logged at least once.
    pub fn sources(&self) -> HashSet<&str> {
        self.records.iter().map(|r| r.source.as_str()).collect()
    }
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
