use serde::Serialize;
use tracing::info;

use crate::bucket::{bucket_flow, FlowTick};
use crate::momentum::{momentum_series, MomentumPoint, WindowLength};
use crate::record::TradeRecord;
use crate::strike::{filter_records, summarize_strikes, StrikeFilter, StrikeSummary};
use crate::summary::{FlowSummary, TrendAnalysis};

/// Everything one analysis pass depends on. Nothing else feeds the result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalysisParams {
    pub filter: StrikeFilter,
    pub window: WindowLength,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowAnalysis {
    pub strikes: StrikeSummary,
    pub momentum: Vec<MomentumPoint>,
    pub summary: FlowSummary,
    pub trend: TrendAnalysis,
}

/// Filter once, then derive the strike view and the momentum view from the same trades.
pub fn analyze(records: &[TradeRecord], params: &AnalysisParams) -> FlowAnalysis {
    let metric = params.filter.metric;
    let filtered = filter_records(records, &params.filter);

    let strikes = summarize_strikes(&filtered, &params.filter);

    let ticks: Vec<FlowTick> = filtered
        .iter()
        .filter_map(|r| FlowTick::from_record(r, metric))
        .collect();
    let momentum = momentum_series(&bucket_flow(&ticks), params.window);

    let summary = FlowSummary::from_strikes(&strikes, metric);
    let trend = TrendAnalysis::from_series(&momentum);

    info!(
        records = records.len(),
        filtered = filtered.len(),
        strikes = strikes.aggregates.len(),
        buckets = momentum.len(),
        signals = momentum.iter().filter(|p| p.signal.is_some()).count(),
        "analyzed options flow"
    );

    FlowAnalysis {
        strikes,
        momentum,
        summary,
        trend,
    }
}
