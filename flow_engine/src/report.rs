use std::fs::File;
use std::io;
use std::path::Path;

use csv::WriterBuilder;

use crate::error::{FlowError, Result};
use crate::momentum::MomentumPoint;
use crate::strike::StrikeAggregate;

/// A row type that can be written as one CSV line under a fixed header.
pub trait CsvRecord {
    fn headers() -> &'static [&'static str];
    fn record(&self) -> Vec<String>;
}

impl CsvRecord for StrikeAggregate {
    fn headers() -> &'static [&'static str] {
        &[
            "strike",
            "call_premium_normal",
            "call_premium_whale",
            "put_premium_normal",
            "put_premium_whale",
            "call_size_normal",
            "call_size_whale",
            "put_size_normal",
            "put_size_whale",
        ]
    }

    fn record(&self) -> Vec<String> {
        vec![
            format!("{:.2}", self.strike),
            format!("{:.2}", self.call_premium_normal),
            format!("{:.2}", self.call_premium_whale),
            format!("{:.2}", self.put_premium_normal),
            format!("{:.2}", self.put_premium_whale),
            format!("{:.0}", self.call_size_normal),
            format!("{:.0}", self.call_size_whale),
            format!("{:.0}", self.put_size_normal),
            format!("{:.0}", self.put_size_whale),
        ]
    }
}

impl CsvRecord for MomentumPoint {
    fn headers() -> &'static [&'static str] {
        &["timestamp", "full_date", "bucket", "cumulative", "ma", "spot", "signal"]
    }

    fn record(&self) -> Vec<String> {
        vec![
            self.timestamp.to_string(),
            self.full_date.clone(),
            self.width.label().to_string(),
            format!("{:.2}", self.cumulative),
            self.ma.map(|ma| format!("{:.2}", ma)).unwrap_or_default(),
            format!("{:.2}", self.spot),
            self.signal.map(|s| s.to_string()).unwrap_or_default(),
        ]
    }
}

/// Write `records` with their header row to any writer and hand the writer back.
pub fn write_records<T: CsvRecord, W: io::Write>(records: &[T], writer: W) -> Result<W> {
    let mut w = WriterBuilder::new().has_headers(false).from_writer(writer);
    w.write_record(T::headers())?;
    for record in records {
        w.write_record(record.record())?;
    }
    w.flush()?;
    w.into_inner().map_err(|e| FlowError::Io(e.into_error()))
}

pub fn write_csv<T: CsvRecord, P: AsRef<Path>>(records: &[T], path: P) -> Result<()> {
    write_records(records, File::create(path)?).map(|_| ())
}
