//! Spreadsheet feed adapter: published workbook → canonical CSV.
//!
//! Download and workbook decoding failures are fatal. Everything after that
//! (sheet choice, label search, period parsing) degrades to a header-only
//! output file, so format drift upstream never blocks the pipeline.

pub mod locator;
pub mod period;
pub mod sheet;

pub use locator::{
    extract_pairs, ColumnLabelLocator, LayoutLocator, Located, LocatorChain, RowLabelLocator,
    SeriesLayout,
};
pub use period::{parse_period, parse_period_label, parse_price};
pub use sheet::{Cell, RawSheet, Workbook};

use super::provider::{DataError, FetchReport, WorkbookSource};
use super::store;
use crate::series::{CanonicalSeries, DropCounts, PricePoint, SourceKind};
use std::path::Path;
use std::time::Duration;

/// World Bank CMO historical monthly prices ("Pink Sheet").
pub const WORLD_BANK_CMO_URL: &str = "https://thedocs.worldbank.org/en/doc/5d903e848db1d1b83e0ec8f744e55570-0350012021/related/CMO-Historical-Data-Monthly.xlsx";

/// Downloads a workbook over HTTP.
pub struct HttpWorkbookSource {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpWorkbookSource {
    pub fn new(url: impl Into<String>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| DataError::NetworkUnreachable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl WorkbookSource for HttpWorkbookSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn fetch_bytes(&self) -> Result<Vec<u8>, DataError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::Http {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let bytes = resp
            .bytes()
            .map_err(|e| DataError::NetworkUnreachable(format!("reading body: {e}")))?;
        Ok(bytes.to_vec())
    }
}

/// Fetch the workbook and write the target series to `out_path`.
///
/// Only the label-row layout is searched. A sheet without a matching label
/// row yields a header-only file.
pub fn fetch_spreadsheet(
    source: &dyn WorkbookSource,
    out_path: &Path,
) -> Result<FetchReport, DataError> {
    fetch_spreadsheet_with(source, &RowLabelLocator::default(), out_path)
}

/// Same as [`fetch_spreadsheet`] with a caller-chosen layout locator.
///
/// Pass [`LocatorChain::default`] to also accept the column layout.
pub fn fetch_spreadsheet_with(
    source: &dyn WorkbookSource,
    locator: &dyn LayoutLocator,
    out_path: &Path,
) -> Result<FetchReport, DataError> {
    let span = tracing::info_span!("fetch_spreadsheet", source = %source.describe());
    let _enter = span.enter();

    let bytes = source.fetch_bytes()?;
    tracing::info!(bytes = bytes.len(), "workbook downloaded");

    let mut workbook = Workbook::from_bytes(bytes)?;
    let (series, drops) = match workbook.pick_monthly_sheet() {
        Some(name) => {
            let sheet = workbook.read_sheet(&name)?;
            tracing::info!(sheet = %name, rows = sheet.height(), "worksheet loaded");
            series_from_sheet(&sheet, locator)
        }
        None => {
            tracing::warn!("workbook has no worksheets");
            (CanonicalSeries::empty(), DropCounts::default())
        }
    };

    let content_hash = store::write_series(out_path, &series)?;
    tracing::info!(
        rows = series.len(),
        dropped = drops.total(),
        path = %out_path.display(),
        "spreadsheet series written"
    );

    Ok(FetchReport {
        source: SourceKind::Spreadsheet,
        path: out_path.to_path_buf(),
        rows: series.len(),
        dropped: drops.total(),
        content_hash,
    })
}

/// Locate, reshape and canonicalize the target series of one worksheet.
///
/// Never fails: a missing layout yields an empty series.
pub fn series_from_sheet(
    sheet: &RawSheet,
    locator: &dyn LayoutLocator,
) -> (CanonicalSeries, DropCounts) {
    let layout = match locator.locate(sheet) {
        Located::Found(layout) => layout,
        Located::NotFound => {
            tracing::warn!(sheet = sheet.name(), locator = locator.name(), "target series not found");
            return (CanonicalSeries::empty(), DropCounts::default());
        }
    };

    let pairs = extract_pairs(sheet, layout);
    let total = pairs.len();

    let points: Vec<PricePoint> = pairs
        .iter()
        .filter_map(|(period, price)| Some(PricePoint::new(parse_period(period)?, parse_price(price)?)))
        .collect();

    if points.len() < total {
        tracing::debug!(
            unparsed = total - points.len(),
            "skipped cells without a parseable period or price"
        );
    }

    let (series, drops) = CanonicalSeries::from_points(points);
    if drops.duplicate_date > 0 {
        tracing::warn!(
            duplicates = drops.duplicate_date,
            "several periods mapped to the same month, kept the first"
        );
    }
    (series, drops)
}
