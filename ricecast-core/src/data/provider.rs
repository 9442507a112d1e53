//! Source traits and structured error types.
//!
//! The FuturesProvider and WorkbookSource traits abstract over the two
//! upstream sources so adapters can be driven by mock endpoints in tests.

use crate::series::{PricePoint, SourceKind};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Structured error types for data operations.
///
/// Everything here is fatal to the fetch that raised it. Spreadsheet layout
/// drift is not an error: it degrades to a header-only output file.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("workbook could not be opened: {0}")]
    Workbook(String),

    #[error("csv error: {0}")]
    Csv(String),

    #[error("i/o error: {0}")]
    Io(String),
}

impl From<std::io::Error> for DataError {
    fn from(e: std::io::Error) -> Self {
        DataError::Io(e.to_string())
    }
}

impl From<csv::Error> for DataError {
    fn from(e: csv::Error) -> Self {
        DataError::Csv(e.to_string())
    }
}

/// Outcome of one history request against a futures provider.
///
/// An empty result set is a normal outcome, distinct from a failed request.
#[derive(Debug, Clone, PartialEq)]
pub enum FuturesFetch {
    Populated(Vec<PricePoint>),
    Empty,
}

impl FuturesFetch {
    /// Wrap points, collapsing an empty vector into `Empty`.
    pub fn from_points(points: Vec<PricePoint>) -> Self {
        if points.is_empty() {
            FuturesFetch::Empty
        } else {
            FuturesFetch::Populated(points)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FuturesFetch::Empty)
    }
}

/// Trait for market-data providers (Yahoo Finance, mocks).
pub trait FuturesProvider {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the closing-price history of `symbol`.
    ///
    /// `range` and `interval` are passed through in the provider's own
    /// vocabulary (e.g. `"max"` / `"1d"`).
    fn fetch_history(
        &self,
        symbol: &str,
        range: &str,
        interval: &str,
    ) -> Result<FuturesFetch, DataError>;
}

/// Trait for spreadsheet sources: anything that can hand back workbook bytes.
pub trait WorkbookSource {
    /// Where the workbook comes from, for logging.
    fn describe(&self) -> String;

    fn fetch_bytes(&self) -> Result<Vec<u8>, DataError>;
}

/// Summary of a completed fetch, returned by both adapters.
#[derive(Debug, Clone, Serialize)]
pub struct FetchReport {
    pub source: SourceKind,
    pub path: PathBuf,
    pub rows: usize,
    /// Rows discarded by canonicalization (bad prices, duplicate dates).
    pub dropped: usize,
    /// BLAKE3 hash of the written file.
    pub content_hash: String,
}

impl FetchReport {
    /// True when the written file holds only the header.
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}
