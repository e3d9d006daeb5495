//! CSV persistence for ticks, bars and feature rows.

use std::fs::{File, OpenOptions};
use std::path::Path;

use csv::{Reader, Writer, WriterBuilder};

use crate::error::AppError;
use crate::model::bar::Bar;
use crate::model::tick::Tick;
use crate::pipeline::{FeatureSet, WindowFeatures};

const TICK_HEADER: [&str; 3] = ["timestamp_ms", "price", "volume"];

fn ensure_parent(path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn create_writer(path: &Path) -> Result<Writer<File>, AppError> {
    ensure_parent(path)?;
    Ok(Writer::from_path(path)?)
}

pub fn write_ticks(path: &Path, ticks: &[Tick]) -> Result<(), AppError> {
    let mut writer = create_writer(path)?;
    for tick in ticks {
        writer.serialize(tick)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_ticks(path: &Path) -> Result<Vec<Tick>, AppError> {
    let mut reader = Reader::from_path(path)?;
    let ticks = reader
        .deserialize::<Tick>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ticks)
}

pub fn write_bars(path: &Path, bars: &[Bar]) -> Result<(), AppError> {
    let mut writer = create_writer(path)?;
    for bar in bars {
        writer.serialize(bar)?;
    }
    writer.flush()?;
    Ok(())
}

/// One row per window: position, spectral pairs, then the forward labels
/// (left blank on the last window, which has no successor).
pub fn write_features(path: &Path, set: &FeatureSet) -> Result<(), AppError> {
    let mut writer = create_writer(path)?;
    let n_pairs = set
        .rows
        .first()
        .map(|r| r.features.len() / 2)
        .unwrap_or(0);
    writer.write_record(feature_header(n_pairs))?;

    let labels = set.labels();
    for (i, row) in set.rows.iter().enumerate() {
        let mut record = feature_prefix(row);
        record.extend(row.features.iter().map(|v| v.to_string()));
        match labels.get(i) {
            Some(label) => {
                record.push(label.direction.to_string());
                record.push(label.change.to_string());
            }
            None => {
                record.push(String::new());
                record.push(String::new());
            }
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn feature_header(n_pairs: usize) -> Vec<String> {
    let mut header: Vec<String> = ["offset", "start_ms", "end_ms", "close"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    for i in 1..=n_pairs {
        header.push(format!("f{i}"));
        header.push(format!("m{i}"));
    }
    header.push("direction".to_string());
    header.push("change".to_string());
    header
}

fn feature_prefix(row: &WindowFeatures) -> Vec<String> {
    vec![
        row.offset.to_string(),
        row.start_ms.to_string(),
        row.end_ms.to_string(),
        row.close.to_string(),
    ]
}

/// Append-only tick sink; writes the header only when the file is new or empty.
pub struct TickAppender {
    writer: Writer<File>,
}

impl TickAppender {
    pub fn open(path: &Path) -> Result<Self, AppError> {
        ensure_parent(path)?;
        let needs_header = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        if needs_header {
            writer.write_record(TICK_HEADER)?;
            writer.flush()?;
        }
        Ok(Self { writer })
    }

    pub fn append(&mut self, tick: &Tick) -> Result<(), AppError> {
        self.writer.serialize(tick)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), AppError> {
        self.writer.flush()?;
        Ok(())
    }
}
