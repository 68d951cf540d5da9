use std::fmt;

use serde::Serialize;

use crate::bucket::{bucket_flow, BucketWidth, FlowTick, TimeBucket};
use crate::error::{FlowError, Result};
use crate::record::{Metric, TradeRecord};

pub const DEFAULT_WINDOW_LENGTH: usize = 30;

/// Moving-average length in buckets, at least two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowLength(usize);

impl WindowLength {
    pub const MIN: usize = 2;

    pub fn new(length: usize) -> Result<Self> {
        if length < Self::MIN {
            return Err(FlowError::InvalidWindow {
                got: length,
                min: Self::MIN,
            });
        }
        Ok(Self(length))
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for WindowLength {
    fn default() -> Self {
        Self(DEFAULT_WINDOW_LENGTH)
    }
}

impl TryFrom<usize> for WindowLength {
    type Error = FlowError;

    fn try_from(length: usize) -> Result<Self> {
        Self::new(length)
    }
}

/// Direction of a cumulative-flow / moving-average crossover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Bullish,
    Bearish,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Signal::Bullish => "bullish",
            Signal::Bearish => "bearish",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MomentumPoint {
    pub timestamp: i64,
    pub time: String,
    pub full_date: String,
    pub width: BucketWidth,
    /// Running net flow up to and including this bucket.
    pub cumulative: f64,
    /// Average spot within the bucket.
    pub spot: f64,
    /// Trailing mean of `cumulative`; `None` until a full window exists.
    pub ma: Option<f64>,
    pub signal: Option<Signal>,
}

fn crossover(prev: f64, prev_ma: f64, current: f64, ma: f64) -> Option<Signal> {
    if prev < prev_ma && current > ma {
        Some(Signal::Bullish)
    } else if prev > prev_ma && current < ma {
        Some(Signal::Bearish)
    } else {
        None
    }
}

/// Cumulative flow, its trailing simple moving average and crossover signals.
///
/// The average at bucket `i` is the mean of `cumulative[i + 1 - n ..= i]`,
/// summed afresh from that slice, and is never estimated from a shorter
/// window. A signal needs the average at `i - 1` as well, so the first one can
/// appear at index `n`.
pub fn momentum_series(buckets: &[TimeBucket], window: WindowLength) -> Vec<MomentumPoint> {
    let n = window.get();
    let cumulative: Vec<f64> = buckets
        .iter()
        .scan(0.0, |running, bucket| {
            *running += bucket.net_value;
            Some(*running)
        })
        .collect();

    let mut prev_ma: Option<f64> = None;

    buckets
        .iter()
        .zip(&cumulative)
        .enumerate()
        .map(|(i, (bucket, &current))| {
            let ma = (i + 1 >= n).then(|| cumulative[i + 1 - n..=i].iter().sum::<f64>() / n as f64);

            let signal = match (prev_ma, ma) {
                (Some(prev_ma), Some(ma)) => crossover(cumulative[i - 1], prev_ma, current, ma),
                _ => None,
            };
            prev_ma = ma;

            MomentumPoint {
                timestamp: bucket.start,
                time: bucket.time.clone(),
                full_date: bucket.full_date.clone(),
                width: bucket.width,
                cumulative: current,
                spot: bucket.avg_spot(),
                ma,
                signal,
            }
        })
        .collect()
}

/// Bucket the eligible trades of `records` by `metric` and derive the momentum series.
///
/// `records` are expected to be filtered already; trades without a strike or
/// option type are skipped.
pub fn compute_momentum(records: &[TradeRecord], metric: Metric, window: WindowLength) -> Vec<MomentumPoint> {
    let ticks: Vec<FlowTick> = records
        .iter()
        .filter(|r| r.is_eligible())
        .filter_map(|r| FlowTick::from_record(r, metric))
        .collect();
    momentum_series(&bucket_flow(&ticks), window)
}
