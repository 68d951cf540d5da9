use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::dataset::Dataset;
use crate::error::{FlowError, Result};
use crate::record::*;

/// Column order of compact datasets written by [`save_project`].
pub const COMPACT_HEADERS: [&str; 16] = [
    FIELD_DATE,
    FIELD_TIME,
    FIELD_SYMBOL,
    FIELD_EXPIRY,
    FIELD_STRIKE,
    FIELD_PUT_CALL,
    FIELD_SIDE,
    FIELD_SPOT,
    FIELD_SIZE,
    FIELD_PRICE,
    FIELD_PREMIUM,
    FIELD_SWEEP_BLOCK_SPLIT,
    FIELD_VOLUME,
    FIELD_OPEN_INT,
    FIELD_CONDS,
    FIELD_TIMESTAMP,
];

/// A dataset as persisted in a project file, either expanded (`data`) or
/// compact (`headers` + `rows`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredDataset {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    file_name: String,
    #[serde(default)]
    upload_time: String,
    #[serde(default)]
    data: Option<Vec<Map<String, Value>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_compact: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    headers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rows: Option<Vec<Vec<Value>>>,
}

impl StoredDataset {
    fn into_dataset(self) -> Dataset {
        let records: Vec<TradeRecord> = match (self.is_compact, self.headers, self.rows, self.data) {
            (Some(true), Some(headers), Some(rows), _) => rows
                .iter()
                .map(|row| TradeRecord::from_fields(&zip_row(&headers, row)))
                .collect(),
            (_, _, _, Some(data)) => data.iter().map(TradeRecord::from_fields).collect(),
            _ => {
                warn!(id = %self.id, "project dataset has no trade data");
                Vec::new()
            }
        };
        Dataset::new(self.id, self.name, self.file_name, self.upload_time, records)
    }

    fn compact(dataset: &Dataset) -> Self {
        let mut stored = StoredDataset {
            id: dataset.id.clone(),
            name: dataset.name.clone(),
            file_name: dataset.file_name.clone(),
            upload_time: dataset.upload_time.clone(),
            ..StoredDataset::default()
        };

        if dataset.is_empty() {
            stored.data = Some(Vec::new());
        } else {
            stored.is_compact = Some(true);
            stored.headers = Some(COMPACT_HEADERS.iter().map(|h| h.to_string()).collect());
            stored.rows = Some(dataset.records.iter().map(compact_row).collect());
        }
        stored
    }
}

/// Pair each header with the value at the same position; short rows leave trailing fields absent.
fn zip_row(headers: &[String], row: &[Value]) -> Map<String, Value> {
    headers
        .iter()
        .zip(row.iter())
        .map(|(header, value)| (header.clone(), value.clone()))
        .collect()
}

fn compact_row(record: &TradeRecord) -> Vec<Value> {
    let number = |value: Option<f64>| value.map(Value::from).unwrap_or(Value::Null);
    vec![
        Value::from(record.date.as_str()),
        Value::from(record.time.as_str()),
        Value::from(record.symbol.as_str()),
        Value::from(record.expiry.as_str()),
        number(record.strike),
        record
            .put_call
            .map(|pc| Value::from(pc.as_str()))
            .unwrap_or(Value::Null),
        Value::from(record.side.as_str()),
        number(record.spot),
        Value::from(record.size),
        Value::from(record.price),
        Value::from(record.premium),
        Value::from(record.sweep_block_split.as_str()),
        number(record.volume),
        number(record.open_interest),
        Value::from(record.conditions.as_str()),
        Value::from(record.timestamp),
    ]
}

/// Load a project file: a JSON array of datasets, compact or expanded.
pub fn load_project(json: &str) -> Result<Vec<Dataset>> {
    let root: Value = serde_json::from_str(json)?;
    let Value::Array(items) = root else {
        return Err(FlowError::InvalidProject(
            "top-level JSON is not an array".to_string(),
        ));
    };

    let datasets = items
        .into_iter()
        .map(|item| Ok(serde_json::from_value::<StoredDataset>(item)?.into_dataset()))
        .collect::<Result<Vec<Dataset>>>()?;

    debug!(
        datasets = datasets.len(),
        records = datasets.iter().map(Dataset::len).sum::<usize>(),
        "loaded project"
    );
    Ok(datasets)
}

/// Serialize datasets as a project file, every non-empty dataset in compact form.
pub fn save_project(datasets: &[Dataset]) -> Result<String> {
    let stored: Vec<StoredDataset> = datasets.iter().map(StoredDataset::compact).collect();
    Ok(serde_json::to_string(&stored)?)
}
