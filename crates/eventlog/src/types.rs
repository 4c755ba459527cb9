//! Core data types for event records, time buckets and count summaries.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogType {
    Verbose,
    Debug,
    Info,
    Warn,
    Error,
}

impl FromStr for LogType {
    type Err = EventLogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "VERBOSE" => Ok(LogType::Verbose),
            "DEBUG" => Ok(LogType::Debug),
            "INFO" => Ok(LogType::Info),
            "WARN" => Ok(LogType::Warn),
            "ERROR" => Ok(LogType::Error),
            other => Err(EventLogError::InvalidInput(format!(
                "Unknown log type: {other}"
            ))),
        }
    }
}

/// A single stored event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: String,
    pub source: String,
    pub transaction_id: String,
    pub payload: Value,
    #[serde(default)]
    pub tags: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub log_type: LogType,
}

impl LogRecord {
    /// The payload as a JSON object, decoding string payloads that hold one.
    pub fn payload_object(&self) -> Option<serde_json::Map<String, Value>> {
        match &self.payload {
            Value::Object(map) => Some(map.clone()),
            Value::String(s) => match serde_json::from_str::<Value>(s) {
                Ok(Value::Object(map)) => Some(map),
                _ => None,
            },
            _ => None,
        }
    }

    /// Platform the event came from, if the payload shape gives it away.
    pub fn origin(&self) -> Option<Origin> {
        let payload = self.payload_object()?;
        Origin::ALL
            .into_iter()
            .find(|origin| origin.matches_payload(&payload))
    }

    /// Intent or action name carried by the payload.
    pub fn intent_name(&self) -> Option<String> {
        let payload = Value::Object(self.payload_object()?);
        ["/request/intent/name", "/result/metadata/intentName", "/result/action"]
            .iter()
            .find_map(|path| payload.pointer(path).and_then(Value::as_str))
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    }

    /// End-user identifier carried by the payload.
    pub fn user_id(&self) -> Option<String> {
        let payload = Value::Object(self.payload_object()?);
        [
            "/context/user/userId",
            "/context/System/user/userId",
            "/session/user/userId",
        ]
        .iter()
        .find_map(|path| payload.pointer(path).and_then(Value::as_str))
        .filter(|id| !id.is_empty())
        .map(str::to_string)
    }
}

/// One entry of an ingestion batch; source and transaction come from the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub payload: Value,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    pub log_type: LogType,
}

/// A batch of entries posted by one source within one transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogBatch {
    pub source: String,
    pub transaction_id: String,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

impl LogBatch {
    /// Expand the batch into records, stamping each with the batch identity.
    pub fn into_records(self) -> EventLogResult<Vec<LogRecord>> {
        if self.source.is_empty() {
            return Err(EventLogError::InvalidInput("Source is missing".to_string()));
        }
        if self.transaction_id.is_empty() {
            return Err(EventLogError::InvalidInput(
                "Transaction ID is missing".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(self
            .logs
            .into_iter()
            .map(|entry| LogRecord {
                id: uuid::Uuid::new_v4().to_string(),
                source: self.source.clone(),
                transaction_id: self.transaction_id.clone(),
                payload: entry.payload,
                tags: entry.tags,
                timestamp: entry.timestamp.unwrap_or(now),
                log_type: entry.log_type,
            })
            .collect())
    }
}

/// Voice-assistant platform an event originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Amazon,
    Google,
}

impl Origin {
    pub const ALL: [Origin; 2] = [Origin::Amazon, Origin::Google];

    /// Payload keys whose presence marks traffic from this origin.
    pub fn payload_keys(self) -> &'static [&'static str] {
        match self {
            Origin::Amazon => &["request", "response"],
            Origin::Google => &["result", "speech"],
        }
    }

    pub fn matches_payload(self, payload: &serde_json::Map<String, Value>) -> bool {
        self.payload_keys().iter().any(|k| payload.contains_key(*k))
    }

    /// Name of this origin's sub-sequence inside a [`TimeSummary`].
    pub fn bucket_key(self) -> &'static str {
        match self {
            Origin::Amazon => "amazonBuckets",
            Origin::Google => "googleBuckets",
        }
    }
}

/// Width of a time bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    #[default]
    Day,
}

impl Granularity {
    /// One bucket width.
    pub fn step(self) -> Duration {
        match self {
            Granularity::Hour => Duration::hours(1),
            Granularity::Day => Duration::days(1),
        }
    }

    /// Normalize a timestamp to the start of the bucket containing it.
    pub fn truncate(self, date: DateTime<Utc>) -> DateTime<Utc> {
        let hour = match self {
            Granularity::Hour => date.hour(),
            Granularity::Day => 0,
        };
        date.with_hour(hour)
            .and_then(|d| d.with_minute(0))
            .and_then(|d| d.with_second(0))
            .and_then(|d| d.with_nanosecond(0))
            .unwrap_or(date)
    }
}

impl FromStr for Granularity {
    type Err = EventLogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hour" => Ok(Granularity::Hour),
            "day" => Ok(Granularity::Day),
            other => Err(EventLogError::InvalidInput(format!(
                "Unknown granularity: {other}"
            ))),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Hour => write!(f, "hour"),
            Granularity::Day => write!(f, "day"),
        }
    }
}

/// Requested ordering of dates or counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = EventLogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(EventLogError::InvalidInput(format!(
                "Unknown sort order: {other}"
            ))),
        }
    }
}

/// Optional bounds used to seed or extend a gap fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }
}

/// Number of events that fell into one hour or day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBucket {
    pub date: DateTime<Utc>,
    pub count: u64,
}

impl TimeBucket {
    pub fn new(date: DateTime<Utc>, count: u64) -> Self {
        Self { date, count }
    }

    /// A synthetic bucket inserted by gap filling.
    pub fn empty(date: DateTime<Utc>) -> Self {
        Self { date, count: 0 }
    }
}

/// Ordered buckets, optionally split into named sub-sequences (one per origin).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeSummary {
    pub buckets: Vec<TimeBucket>,
    #[serde(flatten)]
    pub partitions: BTreeMap<String, Vec<TimeBucket>>,
}

impl TimeSummary {
    pub fn new(buckets: Vec<TimeBucket>) -> Self {
        Self {
            buckets,
            partitions: BTreeMap::new(),
        }
    }

    pub fn with_partition(mut self, name: impl Into<String>, buckets: Vec<TimeBucket>) -> Self {
        self.partitions.insert(name.into(), buckets);
        self
    }

    pub fn partition(&self, name: &str) -> Option<&[TimeBucket]> {
        self.partitions.get(name).map(Vec::as_slice)
    }

    /// Sum of counts in the primary sequence.
    pub fn total(&self) -> u64 {
        self.buckets.iter().map(|b| b.count).sum()
    }
}

/// Anything that happened at a point in time.
pub trait Timestamped {
    fn timestamp(&self) -> DateTime<Utc>;
}

impl Timestamped for LogRecord {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl Timestamped for DateTime<Utc> {
    fn timestamp(&self) -> DateTime<Utc> {
        *self
    }
}

/// How many times a name was seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Count {
    pub name: String,
    pub count: u64,
}

/// Name frequencies in first-seen order unless explicitly sorted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CountResult {
    pub count: Vec<Count>,
}

impl CountResult {
    /// Stable sort by count; equal counts keep their first-seen order.
    pub fn sort(&mut self, order: SortOrder) {
        match order {
            SortOrder::Asc => self.count.sort_by_key(|c| c.count),
            SortOrder::Desc => self.count.sort_by_key(|c| std::cmp::Reverse(c.count)),
        }
    }

    pub fn sorted(mut self, order: Option<SortOrder>) -> Self {
        if let Some(order) = order {
            self.sort(order);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.count.iter().find(|c| c.name == name).map(|c| c.count)
    }

    pub fn total(&self) -> u64 {
        self.count.iter().map(|c| c.count).sum()
    }
}

/// Errors that can occur in the event log library.
#[derive(thiserror::Error, Debug)]
pub enum EventLogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid period: {year}-{month}-{day} hour {hour}")]
    InvalidPeriod {
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
    },
}

/// Convenience result type.
pub type EventLogResult<T> = Result<T, EventLogError>;
