use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::FlowError;
use crate::normalize::{parse_date_time, parse_number, parse_premium_value, DATE_FORMAT};

pub const FIELD_DATE: &str = "date";
pub const FIELD_TIME: &str = "time";
pub const FIELD_TIMESTAMP: &str = "timestamp";
pub const FIELD_SYMBOL: &str = "symbol";
pub const FIELD_EXPIRY: &str = "expiry";
pub const FIELD_STRIKE: &str = "strike";
pub const FIELD_PUT_CALL: &str = "put_call";
pub const FIELD_SIDE: &str = "side";
pub const FIELD_SPOT: &str = "spot";
pub const FIELD_SIZE: &str = "size";
pub const FIELD_PRICE: &str = "price";
pub const FIELD_PREMIUM: &str = "premium";
pub const FIELD_SWEEP_BLOCK_SPLIT: &str = "sweep_block_split";
pub const FIELD_VOLUME: &str = "volume";
pub const FIELD_OPEN_INT: &str = "open_int";
pub const FIELD_CONDS: &str = "conds";

/// Option type of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PutCall {
    Call,
    Put,
}

impl PutCall {
    /// Case-insensitive parse of `call` / `put`; anything else is not a usable option type.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "call" => Some(PutCall::Call),
            "put" => Some(PutCall::Put),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PutCall::Call => "call",
            PutCall::Put => "put",
        }
    }

    /// Flow sign convention shared by strike aggregates and time buckets:
    /// call value counts positive, put value counts negative.
    pub fn signed(&self, value: f64) -> f64 {
        match self {
            PutCall::Call => value,
            PutCall::Put => -value,
        }
    }
}

impl fmt::Display for PutCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which per-trade value drives filtering, whale classification and flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Premium,
    Size,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Premium => "premium",
            Metric::Size => "size",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "premium" => Ok(Metric::Premium),
            "size" | "volume" => Ok(Metric::Size),
            other => Err(FlowError::Config(format!("unknown metric: {other}"))),
        }
    }
}

/// A single normalized options trade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRecord {
    /// Trade date as reported, `MM/DD/YYYY`.
    pub date: String,
    /// Wall-clock time as reported, `HH:MM:SS AM|PM`.
    pub time: String,
    /// Epoch milliseconds derived from `date` and `time`; 0 when unparseable.
    pub timestamp: i64,
    pub symbol: String,
    pub expiry: String,
    pub strike: Option<f64>,
    pub put_call: Option<PutCall>,
    pub side: String,
    pub spot: Option<f64>,
    pub size: f64,
    pub price: f64,
    pub premium: f64,
    pub sweep_block_split: String,
    pub volume: Option<f64>,
    pub open_interest: Option<f64>,
    pub conditions: String,
}

/// Composite identity used to drop duplicate trades across datasets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TradeKey {
    date: String,
    time: String,
    timestamp: i64,
    symbol: String,
    expiry: String,
    strike: Option<u64>,
    put_call: Option<PutCall>,
    size: u64,
    price: u64,
    premium: u64,
}

impl TradeRecord {
    /// Build a record from a header -> value map.
    ///
    /// Values may be strings (CSV import) or JSON scalars (rehydrated
    /// projects). An explicit numeric `timestamp` is honored, otherwise it is
    /// derived from `date` and `time`.
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        let text = |key: &str| fields.get(key).map(value_text).unwrap_or_default();
        let number = |key: &str| fields.get(key).and_then(value_number);
        let premium = |key: &str| fields.get(key).map(parse_premium_value).unwrap_or(0.0);

        let date = text(FIELD_DATE);
        let time = text(FIELD_TIME);
        let timestamp = number(FIELD_TIMESTAMP)
            .map(|ts| ts as i64)
            .unwrap_or_else(|| parse_date_time(&date, &time));

        Self {
            timestamp,
            symbol: text(FIELD_SYMBOL),
            expiry: text(FIELD_EXPIRY),
            strike: number(FIELD_STRIKE),
            put_call: PutCall::parse(&text(FIELD_PUT_CALL)),
            side: text(FIELD_SIDE),
            spot: number(FIELD_SPOT),
            size: number(FIELD_SIZE).unwrap_or(0.0),
            price: premium(FIELD_PRICE),
            premium: premium(FIELD_PREMIUM),
            sweep_block_split: text(FIELD_SWEEP_BLOCK_SPLIT),
            volume: number(FIELD_VOLUME),
            open_interest: number(FIELD_OPEN_INT),
            conditions: text(FIELD_CONDS),
            date,
            time,
        }
    }

    /// A record only takes part in aggregation with a non-zero strike and a known option type.
    pub fn is_eligible(&self) -> bool {
        matches!(self.strike, Some(strike) if strike != 0.0) && self.put_call.is_some()
    }

    pub fn metric_value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Premium => self.premium,
            Metric::Size => self.size,
        }
    }

    /// Calendar date of the trade; `None` when `date` is not `MM/DD/YYYY`.
    pub fn trade_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), DATE_FORMAT).ok()
    }

    pub fn full_date(&self) -> String {
        format!("{} {}", self.date, self.time)
    }

    pub fn dedup_key(&self) -> TradeKey {
        TradeKey {
            date: self.date.clone(),
            time: self.time.clone(),
            timestamp: self.timestamp,
            symbol: self.symbol.clone(),
            expiry: self.expiry.clone(),
            strike: self.strike.map(f64::to_bits),
            put_call: self.put_call,
            size: self.size.to_bits(),
            price: self.price.to_bits(),
            premium: self.premium.to_bits(),
        }
    }
}

/// Text form of a scalar field; absent and null become empty.
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

pub(crate) fn value_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}
