pub mod analysis;
pub mod bucket;
pub mod config;
pub mod dataset;
pub mod error;
pub mod momentum;
pub mod normalize;
pub mod project;
pub mod record;
pub mod report;
pub mod strike;
pub mod summary;

pub use crate::analysis::{analyze, AnalysisParams, FlowAnalysis};
pub use crate::bucket::{bucket_flow, BucketWidth, FlowTick, TimeBucket};
pub use crate::config::FlowConfig;
pub use crate::dataset::{available_expiries, merge_datasets, Dataset, DatasetSelection};
pub use crate::error::{FlowError, Result};
pub use crate::momentum::{compute_momentum, momentum_series, MomentumPoint, Signal, WindowLength};
pub use crate::normalize::{parse_csv, parse_date_time, parse_premium};
pub use crate::project::{load_project, save_project};
pub use crate::record::{Metric, PutCall, TradeRecord};
pub use crate::report::{write_csv, write_records, CsvRecord};
pub use crate::strike::{
    aggregate_by_strike, ExpiryFilter, StrikeAggregate, StrikeFilter, StrikeSummary, WhaleThresholds,
};
pub use crate::summary::{FlowSummary, Sentiment, TrendAnalysis};
