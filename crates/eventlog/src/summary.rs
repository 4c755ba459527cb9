//! Query pipelines that turn stored records into time, intent and source
//! summaries.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bucket::bucketize;
use crate::counter::count;
use crate::gap_fill::fill_gaps;
use crate::store::{LogFilter, LogStore};
use crate::types::{
    CountResult, DateRange, EventLogError, EventLogResult, Granularity, LogRecord, LogType,
    Origin, SortOrder, TimeSummary,
};

/// Parameters of a time summary request.
#[derive(Debug, Clone, Default)]
pub struct TimeSummaryQuery {
    pub source: Option<String>,
    pub range: DateRange,
    pub granularity: Granularity,
    pub date_sort: Option<SortOrder>,
    pub fill_gaps: bool,
}

impl TimeSummaryQuery {
    fn filter(&self) -> LogFilter {
        LogFilter::within(self.source.as_deref(), self.range.start, self.range.end)
    }
}

/// Event counts per period for all traffic plus one partition per origin.
///
/// Gaps are only filled when a date sort was requested, since filling needs
/// a known direction.
pub fn time_summary(store: &LogStore, query: &TimeSummaryQuery) -> EventLogResult<TimeSummary> {
    let started = Instant::now();
    let filter = query.filter();
    let granularity = query.granularity;

    let total = store.group_by_period(&filter, granularity, query.date_sort);
    let mut summary = TimeSummary::new(bucketize(&total, granularity)?);

    for origin in Origin::ALL {
        let origin_filter = filter.clone().with_origin(origin);
        let rows = store.group_by_period(&origin_filter, granularity, query.date_sort);
        summary = summary.with_partition(origin.bucket_key(), bucketize(&rows, granularity)?);
    }

    let summary = match query.date_sort {
        Some(order) if query.fill_gaps => fill_gaps(&summary, &query.range, granularity, order),
        _ => summary,
    };

    tracing::debug!(
        source = ?query.source,
        %granularity,
        buckets = summary.buckets.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "time summary"
    );
    Ok(summary)
}

/// Frequency of intent names among matching records.
pub fn intent_summary(
    store: &LogStore,
    filter: &LogFilter,
    count_sort: Option<SortOrder>,
) -> CountResult {
    let records: Vec<&LogRecord> = store
        .records
        .iter()
        .filter(|r| filter.matches(r))
        .collect();

    count(records.len(), |i| records[i].intent_name()).sorted(count_sort)
}

/// Aggregate figures for one source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub unique_users: u64,
    pub total_events: u64,
    pub total_exceptions: u64,
    pub amazon_events: u64,
    pub google_events: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStats {
    pub source: String,
    pub stats: Stats,
}

/// Event, exception, origin and unique-user counts for `source`.
///
/// `total_events` only counts events that carry a user id.
pub fn source_stats(
    store: &LogStore,
    source: &str,
    range: &DateRange,
) -> EventLogResult<SourceStats> {
    if source.is_empty() {
        return Err(EventLogError::InvalidInput(
            "Source ID must be provided.".to_string(),
        ));
    }

    let filter = LogFilter::within(Some(source), range.start, range.end);
    // Events without a user id are not counted as user events.
    let user_events = filter.clone().requiring_user();
    let users = store.distinct(&user_events, LogRecord::user_id);
    let exceptions = filter.clone().with_log_type(LogType::Error);

    let stats = Stats {
        unique_users: users.len() as u64,
        total_events: store.count_matching(&user_events) as u64,
        total_exceptions: store.count_matching(&exceptions) as u64,
        amazon_events: store.count_matching(&filter.clone().with_origin(Origin::Amazon)) as u64,
        google_events: store.count_matching(&filter.with_origin(Origin::Google)) as u64,
    };

    Ok(SourceStats {
        source: source.to_string(),
        stats,
    })
}

/// Newest-first records for the raw log query. Bounds are exclusive.
pub fn query_logs<'a>(
    store: &'a LogStore,
    source: Option<&str>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Vec<&'a LogRecord> {
    store.find(&LogFilter::between(source, start, end))
}
