use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::record::{Metric, PutCall, TradeRecord};

pub const MINUTE_MS: i64 = 60_000;
pub const HOUR_MS: i64 = 60 * MINUTE_MS;
pub const DAY_MS: i64 = 24 * HOUR_MS;

/// Time resolution of the flow series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BucketWidth {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "1h")]
    OneHour,
}

impl BucketWidth {
    /// Coarser buckets for longer spans: over a week is hourly, over a day is
    /// quarter-hourly, anything shorter is per minute.
    pub fn for_span(span_ms: i64) -> Self {
        if span_ms > 7 * DAY_MS {
            BucketWidth::OneHour
        } else if span_ms > DAY_MS {
            BucketWidth::FifteenMinutes
        } else {
            BucketWidth::OneMinute
        }
    }

    pub fn millis(&self) -> i64 {
        match self {
            BucketWidth::OneMinute => MINUTE_MS,
            BucketWidth::FifteenMinutes => 15 * MINUTE_MS,
            BucketWidth::OneHour => HOUR_MS,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BucketWidth::OneMinute => "1m",
            BucketWidth::FifteenMinutes => "15m",
            BucketWidth::OneHour => "1h",
        }
    }

    /// Start of the bucket containing `timestamp`.
    pub fn floor(&self, timestamp: i64) -> i64 {
        timestamp.div_euclid(self.millis()) * self.millis()
    }
}

impl fmt::Display for BucketWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One trade as seen by the bucketer: unsigned metric value tagged with its side.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowTick {
    pub timestamp: i64,
    pub value: f64,
    pub put_call: PutCall,
    /// 0 when the trade carried no spot.
    pub spot: f64,
    pub time: String,
    pub full_date: String,
}

impl FlowTick {
    pub fn from_record(record: &TradeRecord, metric: Metric) -> Option<Self> {
        let put_call = record.put_call?;
        Some(Self {
            timestamp: record.timestamp,
            value: record.metric_value(metric),
            put_call,
            spot: record.spot.unwrap_or(0.0),
            time: record.time.clone(),
            full_date: record.full_date(),
        })
    }
}

/// Net flow over one fixed-width time slot.
///
/// `net_value` follows the same sign convention as strike aggregates: calls
/// add, puts subtract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeBucket {
    pub start: i64,
    pub width: BucketWidth,
    pub net_value: f64,
    pub spot_sum: f64,
    pub count: usize,
    /// Time of the first trade in the bucket.
    pub time: String,
    pub full_date: String,
}

impl TimeBucket {
    fn open(start: i64, width: BucketWidth, first: &FlowTick) -> Self {
        Self {
            start,
            width,
            net_value: 0.0,
            spot_sum: 0.0,
            count: 0,
            time: first.time.clone(),
            full_date: first.full_date.clone(),
        }
    }

    fn absorb(&mut self, tick: &FlowTick) {
        self.net_value += tick.put_call.signed(tick.value);
        self.spot_sum += tick.spot;
        self.count += 1;
    }

    pub fn avg_spot(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.spot_sum / self.count as f64
        }
    }
}

/// Sort ticks by time and fold them into consecutive buckets.
///
/// The width is chosen once from the total span. A bucket closes as soon as
/// the next tick floors to a different start.
pub fn bucket_flow(ticks: &[FlowTick]) -> Vec<TimeBucket> {
    let mut sorted: Vec<&FlowTick> = ticks.iter().collect();
    sorted.sort_by_key(|tick| tick.timestamp);

    let span = match (sorted.first(), sorted.last()) {
        (Some(first), Some(last)) => last.timestamp - first.timestamp,
        _ => return Vec::new(),
    };
    let width = BucketWidth::for_span(span);

    let (mut buckets, open) = sorted.into_iter().fold(
        (Vec::new(), None::<TimeBucket>),
        |(mut closed, open), tick| {
            let start = width.floor(tick.timestamp);
            let mut bucket = match open {
                Some(bucket) if bucket.start == start => bucket,
                Some(bucket) => {
                    closed.push(bucket);
                    TimeBucket::open(start, width, tick)
                }
                None => TimeBucket::open(start, width, tick),
            };
            bucket.absorb(tick);
            (closed, Some(bucket))
        },
    );
    buckets.extend(open);

    debug!(ticks = ticks.len(), buckets = buckets.len(), %width, span_ms = span, "bucketed flow");
    buckets
}
