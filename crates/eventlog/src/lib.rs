//! Eventlog core library for the event log service: frequency counts, time
//! buckets, gap filling, the log store and its snapshot format.

pub mod bucket;
pub mod counter;
pub mod gap_fill;
pub mod names;
pub mod storage;
pub mod store;
pub mod summary;
pub mod types;

pub use bucket::{bucketize, time_summary, Period, PeriodCount};
pub use counter::{count, count_supplier, NameSupplier};
pub use gap_fill::{fill_gaps, fill_inclusive, fill_sequence, fill_span, Direction};
pub use names::NameGenerator;
pub use storage::{EvlogReader, EvlogWriter};
pub use store::{LogFilter, LogStore};
pub use summary::{intent_summary, query_logs, source_stats, SourceStats, Stats, TimeSummaryQuery};
pub use types::*;
