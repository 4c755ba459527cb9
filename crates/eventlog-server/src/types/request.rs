//! Query-string parameters and their conversion into core query values.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

use eventlog::{DateRange, Granularity, LogFilter, SortOrder, TimeSummaryQuery};

use super::error::{ServerError, ServerResult};

/// Most buckets a gap-filled time summary may produce.
pub const MAX_FILL_BUCKETS: i64 = 100_000;

/// Raw query parameters shared by every read endpoint.
///
/// Everything is kept as a string so that unknown enum values can fall back
/// to defaults instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryParams {
    pub source: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub granularity: Option<String>,
    pub date_sort: Option<String>,
    pub count_sort: Option<String>,
    pub fill_gaps: Option<String>,
}

impl QueryParams {
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref().filter(|s| !s.is_empty())
    }

    pub fn require_source(&self) -> ServerResult<&str> {
        self.source().ok_or(ServerError::MissingParam("source"))
    }

    pub fn start(&self) -> ServerResult<Option<DateTime<Utc>>> {
        parse_optional("start_time", self.start_time.as_deref())
    }

    pub fn end(&self) -> ServerResult<Option<DateTime<Utc>>> {
        parse_optional("end_time", self.end_time.as_deref())
    }

    pub fn range(&self) -> ServerResult<DateRange> {
        Ok(DateRange::new(self.start()?, self.end()?))
    }

    /// Unknown values fall back to daily buckets.
    pub fn granularity(&self) -> Granularity {
        self.granularity
            .as_deref()
            .and_then(|g| g.parse().ok())
            .unwrap_or_default()
    }

    pub fn date_sort(&self) -> Option<SortOrder> {
        self.date_sort.as_deref().and_then(|s| s.parse().ok())
    }

    pub fn count_sort(&self) -> Option<SortOrder> {
        self.count_sort.as_deref().and_then(|s| s.parse().ok())
    }

    /// Present and not an explicit false.
    pub fn fill_gaps(&self) -> bool {
        matches!(self.fill_gaps.as_deref(), Some(v) if !matches!(v, "" | "false" | "0"))
    }

    /// Exclusive filter used by the intent summary.
    pub fn intent_filter(&self) -> ServerResult<LogFilter> {
        Ok(LogFilter::between(self.source(), self.start()?, self.end()?))
    }

    /// Rejects gap-filled ranges that would exceed [`MAX_FILL_BUCKETS`].
    pub fn time_summary_query(&self) -> ServerResult<TimeSummaryQuery> {
        let query = TimeSummaryQuery {
            source: self.source().map(str::to_string),
            range: self.range()?,
            granularity: self.granularity(),
            date_sort: self.date_sort(),
            fill_gaps: self.fill_gaps(),
        };

        if query.fill_gaps && query.date_sort.is_some() {
            if let (Some(start), Some(end)) = (query.range.start, query.range.end) {
                let step = query.granularity.step().num_seconds();
                let steps = (end - start).num_seconds().abs() / step;
                if steps > MAX_FILL_BUCKETS {
                    return Err(ServerError::InvalidParams(format!(
                        "Range spans {steps} {} buckets; at most {MAX_FILL_BUCKETS} can be filled.",
                        query.granularity
                    )));
                }
            }
        }
        Ok(query)
    }
}

fn parse_optional(
    param: &'static str,
    value: Option<&str>,
) -> ServerResult<Option<DateTime<Utc>>> {
    match value {
        None | Some("") => Ok(None),
        Some(v) => parse_timestamp(v)
            .map(Some)
            .ok_or_else(|| ServerError::InvalidDate {
                param,
                value: v.to_string(),
            }),
    }
}

/// Parse RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.f]` (taken as UTC) or a
/// bare `YYYY-MM-DD`.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
