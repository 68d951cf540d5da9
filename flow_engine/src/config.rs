use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::AnalysisParams;
use crate::error::{FlowError, Result};
use crate::momentum::{WindowLength, DEFAULT_WINDOW_LENGTH};
use crate::record::Metric;
use crate::strike::{
    ExpiryFilter, StrikeFilter, WhaleThresholds, DEFAULT_WHALE_PREMIUM_THRESHOLD,
    DEFAULT_WHALE_SIZE_THRESHOLD,
};

pub const ENV_WHALE_PREMIUM_THRESHOLD: &str = "WHALE_PREMIUM_THRESHOLD";
pub const ENV_WHALE_SIZE_THRESHOLD: &str = "WHALE_SIZE_THRESHOLD";
pub const ENV_MA_LENGTH: &str = "FLOW_MA_LENGTH";

/// Default analysis parameters for the command line tool.
///
/// The engine never reads this on its own; callers turn it into explicit
/// [`AnalysisParams`] with [`FlowConfig::params`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub metric: Metric,
    pub expiry: String,
    pub min_value: f64,
    pub window_length: usize,
    pub whale_premium_threshold: f64,
    pub whale_size_threshold: f64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            metric: Metric::Premium,
            expiry: "All".to_string(),
            min_value: 0.0,
            window_length: DEFAULT_WINDOW_LENGTH,
            whale_premium_threshold: DEFAULT_WHALE_PREMIUM_THRESHOLD,
            whale_size_threshold: DEFAULT_WHALE_SIZE_THRESHOLD,
        }
    }
}

impl FlowConfig {
    /// Read a JSON config file; keys left out keep their defaults.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        debug!(path = %path.display(), "loaded flow config");
        Ok(config)
    }

    /// Apply `WHALE_PREMIUM_THRESHOLD`, `WHALE_SIZE_THRESHOLD` and `FLOW_MA_LENGTH` from the environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_WHALE_PREMIUM_THRESHOLD) {
            self.whale_premium_threshold = parse_override(ENV_WHALE_PREMIUM_THRESHOLD, &value)?;
        }
        if let Some(value) = lookup(ENV_WHALE_SIZE_THRESHOLD) {
            self.whale_size_threshold = parse_override(ENV_WHALE_SIZE_THRESHOLD, &value)?;
        }
        if let Some(value) = lookup(ENV_MA_LENGTH) {
            self.window_length = parse_override(ENV_MA_LENGTH, &value)?;
        }
        Ok(self)
    }

    pub fn params(&self) -> Result<AnalysisParams> {
        Ok(AnalysisParams {
            filter: StrikeFilter {
                expiry: ExpiryFilter::parse(&self.expiry),
                metric: self.metric,
                min_value: self.min_value,
                whales: WhaleThresholds {
                    premium: self.whale_premium_threshold,
                    size: self.whale_size_threshold,
                },
            },
            window: WindowLength::new(self.window_length)?,
        })
    }
}

fn parse_override<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| FlowError::Config(format!("invalid value for {key}: {value:?}")))
}
