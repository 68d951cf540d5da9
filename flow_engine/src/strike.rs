use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::record::{Metric, PutCall, TradeRecord};

pub const DEFAULT_WHALE_PREMIUM_THRESHOLD: f64 = 1_000_000.0;
pub const DEFAULT_WHALE_SIZE_THRESHOLD: f64 = 1_000.0;

/// Expiry selection: every expiry, or one exact expiry string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExpiryFilter {
    #[default]
    All,
    On(String),
}

impl ExpiryFilter {
    /// `"All"` (any case) or an empty string selects every expiry.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
            ExpiryFilter::All
        } else {
            ExpiryFilter::On(raw.to_string())
        }
    }

    pub fn matches(&self, expiry: &str) -> bool {
        match self {
            ExpiryFilter::All => true,
            ExpiryFilter::On(wanted) => wanted == expiry,
        }
    }
}

/// Large-trade cut-offs, one per metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhaleThresholds {
    pub premium: f64,
    pub size: f64,
}

impl Default for WhaleThresholds {
    fn default() -> Self {
        Self {
            premium: DEFAULT_WHALE_PREMIUM_THRESHOLD,
            size: DEFAULT_WHALE_SIZE_THRESHOLD,
        }
    }
}

impl WhaleThresholds {
    /// The selected metric decides whale status for both the premium and size tracks.
    pub fn is_whale(&self, metric: Metric, record: &TradeRecord) -> bool {
        match metric {
            Metric::Premium => record.premium >= self.premium,
            Metric::Size => record.size >= self.size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StrikeFilter {
    pub expiry: ExpiryFilter,
    pub metric: Metric,
    pub min_value: f64,
    pub whales: WhaleThresholds,
}

impl StrikeFilter {
    pub fn accepts(&self, record: &TradeRecord) -> bool {
        self.expiry.matches(&record.expiry) && record.metric_value(self.metric) >= self.min_value
    }
}

/// Records passing `filter` that can take part in aggregation, in input order.
pub fn filter_records<'a>(records: &'a [TradeRecord], filter: &StrikeFilter) -> Vec<&'a TradeRecord> {
    records
        .iter()
        .filter(|r| filter.accepts(r) && r.is_eligible())
        .collect()
}

/// Call/put flow at one strike, split into normal and whale tiers.
///
/// Sign invariant: call sums are never negative and put sums are never
/// positive. Both are accumulated through [`PutCall::signed`], the same
/// convention the time buckets use, so a renderer can draw the two sides as
/// diverging bars directly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrikeAggregate {
    pub strike: f64,
    pub call_premium_normal: f64,
    pub call_premium_whale: f64,
    pub put_premium_normal: f64,
    pub put_premium_whale: f64,
    pub call_size_normal: f64,
    pub call_size_whale: f64,
    pub put_size_normal: f64,
    pub put_size_whale: f64,
}

impl StrikeAggregate {
    fn new(strike: f64) -> Self {
        Self {
            strike,
            call_premium_normal: 0.0,
            call_premium_whale: 0.0,
            put_premium_normal: 0.0,
            put_premium_whale: 0.0,
            call_size_normal: 0.0,
            call_size_whale: 0.0,
            put_size_normal: 0.0,
            put_size_whale: 0.0,
        }
    }

    fn absorb(&mut self, put_call: PutCall, premium: f64, size: f64, whale: bool) {
        let premium = put_call.signed(premium);
        let size = put_call.signed(size);
        let (premium_sum, size_sum) = match (put_call, whale) {
            (PutCall::Call, false) => (&mut self.call_premium_normal, &mut self.call_size_normal),
            (PutCall::Call, true) => (&mut self.call_premium_whale, &mut self.call_size_whale),
            (PutCall::Put, false) => (&mut self.put_premium_normal, &mut self.put_size_normal),
            (PutCall::Put, true) => (&mut self.put_premium_whale, &mut self.put_size_whale),
        };
        *premium_sum += premium;
        *size_sum += size;
    }

    /// Call total for `metric` (non-negative).
    pub fn call_total(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Premium => self.call_premium_normal + self.call_premium_whale,
            Metric::Size => self.call_size_normal + self.call_size_whale,
        }
    }

    /// Put total for `metric`, kept negative.
    pub fn put_total(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Premium => self.put_premium_normal + self.put_premium_whale,
            Metric::Size => self.put_size_normal + self.put_size_whale,
        }
    }

    /// Two-sided activity at this strike: calls plus the magnitude of puts.
    pub fn gross(&self, metric: Metric) -> f64 {
        self.call_total(metric) + self.put_total(metric).abs()
    }
}

/// Unsigned call/put totals over the filtered set.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FlowTotals {
    pub call_premium: f64,
    pub put_premium: f64,
    pub call_size: f64,
    pub put_size: f64,
}

impl FlowTotals {
    pub fn calls(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Premium => self.call_premium,
            Metric::Size => self.call_size,
        }
    }

    pub fn puts(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Premium => self.put_premium,
            Metric::Size => self.put_size,
        }
    }

    /// Puts over calls; `None` when there is no call flow to divide by.
    pub fn put_call_ratio(&self, metric: Metric) -> Option<f64> {
        let calls = self.calls(metric);
        (calls > 0.0).then(|| self.puts(metric) / calls)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StrikeSummary {
    /// Highest strike first.
    pub aggregates: Vec<StrikeAggregate>,
    pub totals: FlowTotals,
    /// Mean spot over trades that carry one.
    pub avg_spot: Option<f64>,
    /// Spot of the chronologically last trade.
    pub latest_spot: Option<f64>,
}

#[derive(Debug, Default)]
struct StrikeFold {
    by_strike: HashMap<u64, StrikeAggregate>,
    totals: FlowTotals,
    spot_sum: f64,
    spot_count: usize,
}

impl StrikeFold {
    fn push(mut self, record: &TradeRecord, filter: &StrikeFilter) -> Self {
        let (Some(strike), Some(put_call)) = (record.strike, record.put_call) else {
            return self;
        };

        if let Some(spot) = record.spot {
            self.spot_sum += spot;
            self.spot_count += 1;
        }

        let whale = filter.whales.is_whale(filter.metric, record);
        self.by_strike
            .entry(strike.to_bits())
            .or_insert_with(|| StrikeAggregate::new(strike))
            .absorb(put_call, record.premium, record.size, whale);

        match put_call {
            PutCall::Call => {
                self.totals.call_premium += record.premium;
                self.totals.call_size += record.size;
            }
            PutCall::Put => {
                self.totals.put_premium += record.premium;
                self.totals.put_size += record.size;
            }
        }
        self
    }

    fn finish(self, latest_spot: Option<f64>) -> StrikeSummary {
        let mut aggregates: Vec<StrikeAggregate> = self.by_strike.into_values().collect();
        aggregates.sort_by(|a, b| b.strike.total_cmp(&a.strike));

        StrikeSummary {
            aggregates,
            totals: self.totals,
            avg_spot: (self.spot_count > 0).then(|| self.spot_sum / self.spot_count as f64),
            latest_spot,
        }
    }
}

/// Fold already-filtered records into per-strike aggregates and totals.
pub fn summarize_strikes(records: &[&TradeRecord], filter: &StrikeFilter) -> StrikeSummary {
    // max_by_key keeps the last of equal timestamps, matching a stable ascending sort
    let latest_spot = records
        .iter()
        .filter(|r| r.is_eligible())
        .max_by_key(|r| r.timestamp)
        .and_then(|r| r.spot);

    let summary = records
        .iter()
        .fold(StrikeFold::default(), |fold, record| fold.push(record, filter))
        .finish(latest_spot);

    debug!(
        trades = records.len(),
        strikes = summary.aggregates.len(),
        metric = %filter.metric,
        "aggregated strikes"
    );
    summary
}

/// Filter `records` and aggregate them per strike.
pub fn aggregate_by_strike(records: &[TradeRecord], filter: &StrikeFilter) -> StrikeSummary {
    summarize_strikes(&filter_records(records, filter), filter)
}
