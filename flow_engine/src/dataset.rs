use std::collections::HashSet;
use std::str::FromStr;

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{FlowError, Result};
use crate::normalize::{parse_csv, DATE_FORMAT};
use crate::record::TradeRecord;

/// One imported trade export plus its identity metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub id: String,
    pub name: String,
    pub file_name: String,
    pub upload_time: String,
    pub records: Vec<TradeRecord>,
}

impl Dataset {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        file_name: impl Into<String>,
        upload_time: impl Into<String>,
        records: Vec<TradeRecord>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            file_name: file_name.into(),
            upload_time: upload_time.into(),
            records,
        }
    }

    /// Import a CSV export, naming the dataset after its first trade.
    pub fn from_csv(
        id: impl Into<String>,
        file_name: impl Into<String>,
        upload_time: impl Into<String>,
        text: &str,
    ) -> Self {
        let file_name = file_name.into();
        let records = parse_csv(text);
        let name = display_name(&records, &file_name);
        Self::new(id, name, file_name, upload_time, records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// `"SPY - 11/18/2025 04:14:57 PM"` from the first trade, falling back to the file name.
pub fn display_name(records: &[TradeRecord], file_name: &str) -> String {
    let Some(first) = records.first() else {
        return file_name.to_string();
    };

    if !first.date.is_empty() && !first.time.is_empty() && !first.symbol.is_empty() {
        format!("{} - {} {}", first.symbol, first.date, first.time)
    } else if !first.date.is_empty() {
        let symbol = if first.symbol.is_empty() { "Data" } else { first.symbol.as_str() };
        format!("{} - {}", symbol, first.date)
    } else {
        file_name.to_string()
    }
}

/// Which datasets feed the working set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DatasetSelection {
    #[default]
    All,
    Single(String),
}

impl DatasetSelection {
    /// Fails when a single dataset is requested that is not loaded.
    pub fn validate(&self, datasets: &[Dataset]) -> Result<()> {
        match self {
            DatasetSelection::All => Ok(()),
            DatasetSelection::Single(id) if datasets.iter().any(|ds| &ds.id == id) => Ok(()),
            DatasetSelection::Single(id) => Err(FlowError::DatasetNotFound(id.clone())),
        }
    }
}

impl FromStr for DatasetSelection {
    type Err = FlowError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            Ok(DatasetSelection::All)
        } else if s.is_empty() {
            Err(FlowError::Config("empty dataset id".to_string()))
        } else {
            Ok(DatasetSelection::Single(s.to_string()))
        }
    }
}

/// Build the working trade set.
///
/// `All` concatenates every dataset and keeps the first occurrence of each
/// trade key, preserving input order. `Single` passes that dataset's records
/// through untouched; an unknown id yields nothing.
pub fn merge_datasets(datasets: &[Dataset], selection: &DatasetSelection) -> Vec<TradeRecord> {
    match selection {
        DatasetSelection::All => {
            let mut seen = HashSet::new();
            let total: usize = datasets.iter().map(Dataset::len).sum();
            let merged: Vec<TradeRecord> = datasets
                .iter()
                .flat_map(|ds| ds.records.iter())
                .filter(|record| seen.insert(record.dedup_key()))
                .cloned()
                .collect();
            debug!(
                datasets = datasets.len(),
                total,
                unique = merged.len(),
                "merged datasets"
            );
            merged
        }
        DatasetSelection::Single(id) => datasets
            .iter()
            .find(|ds| &ds.id == id)
            .map(|ds| ds.records.clone())
            .unwrap_or_default(),
    }
}

/// Distinct non-empty expiries in chronological order; unparseable dates sort last.
pub fn available_expiries(records: &[TradeRecord]) -> Vec<String> {
    let distinct: HashSet<&str> = records
        .iter()
        .map(|r| r.expiry.as_str())
        .filter(|e| !e.is_empty())
        .collect();

    let mut expiries: Vec<(Option<NaiveDate>, String)> = distinct
        .into_iter()
        .map(|e| (NaiveDate::parse_from_str(e, DATE_FORMAT).ok(), e.to_string()))
        .collect();

    expiries.sort_by(|a, b| match (a.0, b.0) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.1.cmp(&b.1)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.1.cmp(&b.1),
    });
    expiries.into_iter().map(|(_, e)| e).collect()
}
