//! Canonical CSV store.
//!
//! Format: UTF-8, header `Date,Price`, ISO dates, plain decimal prices.
//! A zero-row series is written as the header alone.
//!
//! Writes are atomic: the file is written to `{path}.tmp` and renamed into
//! place, so a reader never observes a half-written file.

use super::provider::DataError;
use crate::series::{CanonicalSeries, PricePoint};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DATE_COLUMN: &str = "Date";
pub const PRICE_COLUMN: &str = "Price";

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Price")]
    price: Option<f64>,
}

/// Render a series as canonical CSV bytes.
pub fn to_csv_bytes(series: &CanonicalSeries) -> Result<Vec<u8>, DataError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    // Header written by hand so empty series still get one.
    writer.write_record([DATE_COLUMN, PRICE_COLUMN])?;
    for point in series.points() {
        writer.serialize(CsvRow {
            date: point.date,
            price: Some(point.price),
        })?;
    }

    writer
        .into_inner()
        .map_err(|e| DataError::Csv(format!("flush: {e}")))
}

/// Write a series to `path`, replacing any existing file.
///
/// Creates parent directories as needed. Returns the BLAKE3 hex digest of the
/// bytes written.
pub fn write_series(path: &Path, series: &CanonicalSeries) -> Result<String, DataError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| DataError::Io(format!("failed to create {}: {e}", parent.display())))?;
    }

    let bytes = to_csv_bytes(series)?;
    let tmp_path = tmp_path_for(path);

    fs::write(&tmp_path, &bytes)
        .map_err(|e| DataError::Io(format!("write {}: {e}", tmp_path.display())))?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        DataError::Io(format!("atomic rename failed: {e}"))
    })?;

    tracing::debug!(path = %path.display(), rows = series.len(), "wrote canonical csv");
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

/// Read a canonical CSV back into a series.
///
/// Rows with an empty price are skipped; the result is re-canonicalized so a
/// hand-edited file cannot break the series invariants.
pub fn read_series(path: &Path) -> Result<CanonicalSeries, DataError> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| DataError::Csv(format!("open {}: {e}", path.display())))?;

    let headers = reader.headers()?.clone();
    if headers.get(0) != Some(DATE_COLUMN) || headers.get(1) != Some(PRICE_COLUMN) {
        return Err(DataError::Csv(format!(
            "{}: expected header {DATE_COLUMN},{PRICE_COLUMN}, found {}",
            path.display(),
            headers.iter().collect::<Vec<_>>().join(",")
        )));
    }

    let mut points = Vec::new();
    for row in reader.deserialize::<CsvRow>() {
        let row = row?;
        if let Some(price) = row.price {
            points.push(PricePoint::new(row.date, price));
        }
    }

    let (series, drops) = CanonicalSeries::from_points(points);
    if drops.total() > 0 {
        tracing::warn!(
            path = %path.display(),
            invalid = drops.invalid_price,
            duplicates = drops.duplicate_date,
            "dropped rows while reading canonical csv"
        );
    }
    Ok(series)
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
