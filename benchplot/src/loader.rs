use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use thiserror::Error;

use crate::data::{Field, RawRecord, FIELD_COUNT, METHOD_COLUMN, THREADS_COLUMN, VARIANT_COLUMN};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("Missing column '{0}' in results header")]
    MissingColumn(String),
}

/// Positions of the required columns within the header row
struct ColumnLayout {
    method: usize,
    variant: usize,
    threads: usize,
    fields: [usize; FIELD_COUNT],
}

impl ColumnLayout {
    fn from_headers(headers: &StringRecord) -> Result<Self, LoadError> {
        let position = |name: &str| {
            headers
                .iter()
                .position(|header| header == name)
                .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
        };

        let mut fields = [0; FIELD_COUNT];
        for (slot, field) in fields.iter_mut().zip(Field::ALL) {
            *slot = position(field.column())?;
        }

        Ok(ColumnLayout {
            method: position(METHOD_COLUMN)?,
            variant: position(VARIANT_COLUMN)?,
            threads: position(THREADS_COLUMN)?,
            fields,
        })
    }
}

/// Reads the benchmark results file at `path`.
pub fn load_results(path: &Path, delimiter: u8) -> Result<Vec<RawRecord>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open results file '{}'", path.display()))?;
    read_results(file, delimiter)
        .with_context(|| format!("Failed to read results file '{}'", path.display()))
}

/// Reads delimited benchmark results with a header row.
///
/// Rows whose thread count is not a positive integer are skipped with a warning. All other
/// cells are kept verbatim (trimmed) for the cleaner; cells missing from a short row are empty.
pub fn read_results<R: Read>(reader: R, delimiter: u8) -> Result<Vec<RawRecord>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let layout = ColumnLayout::from_headers(reader.headers()?)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let line = row.position().map(|p| p.line()).unwrap_or_default();
        let cell = |idx: usize| row.get(idx).unwrap_or_default();

        let Some(threads) = parse_threads(cell(layout.threads)) else {
            log::warn!(
                "Skipping line {}: invalid thread count '{}'",
                line,
                cell(layout.threads)
            );
            continue;
        };

        records.push(RawRecord {
            line,
            method: cell(layout.method).to_string(),
            variant: cell(layout.variant).to_string(),
            threads,
            cells: layout.fields.map(|idx| cell(idx).to_string()),
        });
    }

    log::info!("Read {} benchmark records", records.len());
    Ok(records)
}

/// Accepts positive integers, also when written as a whole float (`"4.0"`).
pub fn parse_threads(cell: &str) -> Option<u32> {
    let cell = cell.trim();
    if let Ok(threads) = cell.parse::<u32>() {
        return (threads > 0).then_some(threads);
    }

    let value = cell.parse::<f64>().ok()?;
    (value.is_finite() && value.fract() == 0.0 && value >= 1.0 && value <= f64::from(u32::MAX))
        .then_some(value as u32)
}
