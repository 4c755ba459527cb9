//! Gap filling: turn a sparse bucket sequence into a dense one.
//!
//! A filled sequence holds one bucket per granularity step between its
//! boundaries, ordered in the requested direction. Real buckets keep their
//! counts and positions; inserted buckets have a count of zero. Runs stop
//! early instead of overflowing at the ends of the representable calendar.

use chrono::{DateTime, Utc};

use crate::types::{DateRange, Granularity, SortOrder, TimeBucket, TimeSummary};

/// Which way "forward" points on the time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increasing,
    Decreasing,
}

impl Direction {
    /// Direction from `from` toward `to`. Equal dates count as increasing.
    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        if to < from {
            Direction::Decreasing
        } else {
            Direction::Increasing
        }
    }

    /// One step forward, or `None` past the end of the calendar.
    pub fn advance(self, date: DateTime<Utc>, granularity: Granularity) -> Option<DateTime<Utc>> {
        match self {
            Direction::Increasing => date.checked_add_signed(granularity.step()),
            Direction::Decreasing => date.checked_sub_signed(granularity.step()),
        }
    }

    /// True while `current` has not moved past `target`.
    pub fn within(self, current: DateTime<Utc>, target: DateTime<Utc>) -> bool {
        match self {
            Direction::Increasing => current <= target,
            Direction::Decreasing => current >= target,
        }
    }

    /// True while `current` has not reached `target`.
    pub fn before(self, current: DateTime<Utc>, target: DateTime<Utc>) -> bool {
        match self {
            Direction::Increasing => current < target,
            Direction::Decreasing => current > target,
        }
    }

    /// Order the two ends of a range so the forward-most endpoint comes first.
    fn orient(self, range: &DateRange) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        match self {
            Direction::Increasing => (range.start, range.end),
            Direction::Decreasing => (range.end, range.start),
        }
    }
}

impl From<SortOrder> for Direction {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => Direction::Increasing,
            SortOrder::Desc => Direction::Decreasing,
        }
    }
}

/// Zero buckets from `from` (included) toward `to` (excluded).
///
/// The direction follows the endpoints. Empty when either endpoint is
/// missing or both are equal.
pub fn fill_span(
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    granularity: Granularity,
) -> Vec<TimeBucket> {
    match endpoints(from, to) {
        Some((from, to)) => {
            let direction = Direction::between(from, to);
            run(direction, Some(from), granularity, |d| direction.before(d, to))
        }
        None => Vec::new(),
    }
}

/// Zero buckets from `from` to `to`, both included.
///
/// The direction follows the endpoints. Empty when either endpoint is
/// missing or both are equal.
pub fn fill_inclusive(
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    granularity: Granularity,
) -> Vec<TimeBucket> {
    match endpoints(from, to) {
        Some((from, to)) => {
            let direction = Direction::between(from, to);
            run(direction, Some(from), granularity, |d| direction.within(d, to))
        }
        None => Vec::new(),
    }
}

/// Fill the gaps of every sequence in `summary`.
///
/// `order` fixes the direction the sequences are expected to run in and the
/// direction synthetic buckets are laid out in. Range endpoints are
/// normalized to the start of their bucket. The input is left untouched.
pub fn fill_gaps(
    summary: &TimeSummary,
    range: &DateRange,
    granularity: Granularity,
    order: SortOrder,
) -> TimeSummary {
    let range = DateRange {
        start: range.start.map(|d| granularity.truncate(d)),
        end: range.end.map(|d| granularity.truncate(d)),
    };
    let direction = Direction::from(order);

    let filled = TimeSummary {
        buckets: fill_sequence(&summary.buckets, &range, granularity, direction),
        partitions: summary
            .partitions
            .iter()
            .map(|(name, buckets)| {
                (
                    name.clone(),
                    fill_sequence(buckets, &range, granularity, direction),
                )
            })
            .collect(),
    };

    tracing::debug!(
        before = summary.buckets.len(),
        after = filled.buckets.len(),
        %granularity,
        ?order,
        "filled bucket gaps"
    );
    filled
}

/// Fill one ordered sequence against an optional range.
///
/// Synthetic buckets start at the forward range endpoint (or the first real
/// bucket) and end at the backward range endpoint (or the last real bucket).
pub fn fill_sequence(
    buckets: &[TimeBucket],
    range: &DateRange,
    granularity: Granularity,
    direction: Direction,
) -> Vec<TimeBucket> {
    let (range_first, range_last) = direction.orient(range);

    let (Some(first), Some(last)) = (buckets.first(), buckets.last()) else {
        return match endpoints(range_first, range_last) {
            Some((from, to)) => {
                run(direction, Some(from), granularity, |d| direction.within(d, to))
            }
            None => Vec::new(),
        };
    };

    let end_date = range_last.unwrap_or(last.date);

    let mut filled = Vec::with_capacity(buckets.len());
    // First date not yet emitted; `None` once the calendar runs out.
    let mut next = Some(range_first.unwrap_or(first.date));
    for bucket in buckets {
        let gap = run(direction, next, granularity, |d| direction.before(d, bucket.date));
        filled.extend(gap);
        filled.push(*bucket);
        next = direction.advance(bucket.date, granularity);
    }

    let tail = run(direction, next, granularity, |d| direction.within(d, end_date));
    filled.extend(tail);
    filled
}

fn endpoints(
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    match (from, to) {
        (Some(from), Some(to)) if from != to => Some((from, to)),
        _ => None,
    }
}

/// Zero buckets stepping from `from` while `keep` holds.
fn run<F>(
    direction: Direction,
    from: Option<DateTime<Utc>>,
    granularity: Granularity,
    keep: F,
) -> Vec<TimeBucket>
where
    F: Fn(DateTime<Utc>) -> bool,
{
    std::iter::successors(from, |&d| direction.advance(d, granularity))
        .take_while(|&d| keep(d))
        .map(TimeBucket::empty)
        .collect()
}
