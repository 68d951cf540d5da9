use std::fmt;

use serde::Serialize;

use crate::momentum::MomentumPoint;
use crate::record::Metric;
use crate::strike::StrikeSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sentiment {
    Bullish,
    Bearish,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TopStrike {
    pub strike: f64,
    pub gross: f64,
}

/// Headline numbers for the selected metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowSummary {
    pub metric: Metric,
    pub total_calls: f64,
    pub total_puts: f64,
    /// Put/call ratio; `None` when there is no call flow.
    pub put_call_ratio: Option<f64>,
    pub call_share_pct: f64,
    pub put_share_pct: f64,
    /// Bearish above a ratio of 1; `None` when the ratio is not applicable.
    pub sentiment: Option<Sentiment>,
    pub top_strike: Option<TopStrike>,
}

impl FlowSummary {
    pub fn from_strikes(strikes: &StrikeSummary, metric: Metric) -> Self {
        let total_calls = strikes.totals.calls(metric);
        let total_puts = strikes.totals.puts(metric);
        let put_call_ratio = strikes.totals.put_call_ratio(metric);

        let total = total_calls + total_puts;
        let share = |part: f64| if total > 0.0 { part / total * 100.0 } else { 0.0 };

        let sentiment = put_call_ratio.map(|pcr| {
            if pcr > 1.0 {
                Sentiment::Bearish
            } else {
                Sentiment::Bullish
            }
        });

        // first maximum wins on ties
        let top_strike = strikes
            .aggregates
            .iter()
            .map(|agg| TopStrike {
                strike: agg.strike,
                gross: agg.gross(metric),
            })
            .reduce(|best, current| if current.gross > best.gross { current } else { best });

        Self {
            metric,
            total_calls,
            total_puts,
            put_call_ratio,
            call_share_pct: share(total_calls),
            put_share_pct: share(total_puts),
            sentiment,
            top_strike,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FlowTrend {
    Accumulating,
    Distributing,
    #[default]
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SpotTrend {
    Increasing,
    Decreasing,
    #[default]
    Flat,
}

/// Flow moving against price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Divergence {
    /// Price falling while flow accumulates.
    Bullish,
    /// Price rising while flow distributes.
    Bearish,
}

/// First-versus-last comparison over the momentum series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TrendAnalysis {
    pub net_flow: FlowTrend,
    pub spot: SpotTrend,
    pub divergence: Option<Divergence>,
}

impl TrendAnalysis {
    /// Flat with no divergence unless the series has at least two points.
    pub fn from_series(series: &[MomentumPoint]) -> Self {
        let (first, last) = match series {
            [first, .., last] => (first, last),
            _ => return Self::default(),
        };

        let net_flow = if last.cumulative > first.cumulative {
            FlowTrend::Accumulating
        } else if last.cumulative < first.cumulative {
            FlowTrend::Distributing
        } else {
            FlowTrend::Flat
        };

        let spot = if last.spot > first.spot {
            SpotTrend::Increasing
        } else if last.spot < first.spot {
            SpotTrend::Decreasing
        } else {
            SpotTrend::Flat
        };

        let divergence = match (spot, net_flow) {
            (SpotTrend::Decreasing, FlowTrend::Accumulating) => Some(Divergence::Bullish),
            (SpotTrend::Increasing, FlowTrend::Distributing) => Some(Divergence::Bearish),
            _ => None,
        };

        Self {
            net_flow,
            spot,
            divergence,
        }
    }
}

impl fmt::Display for FlowTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FlowTrend::Accumulating => "Accumulating (Bullish)",
            FlowTrend::Distributing => "Distributing (Bearish)",
            FlowTrend::Flat => "Flat",
        })
    }
}

impl fmt::Display for SpotTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SpotTrend::Increasing => "Increasing",
            SpotTrend::Decreasing => "Decreasing",
            SpotTrend::Flat => "Flat",
        })
    }
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Divergence::Bullish => "Bullish Divergence (Price Down, Flow Up)",
            Divergence::Bearish => "Bearish Divergence (Price Up, Flow Down)",
        })
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Sentiment::Bullish => "Bullish",
            Sentiment::Bearish => "Bearish",
        })
    }
}
