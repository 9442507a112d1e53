//! Futures feed adapter: provider history → canonical CSV.

use super::provider::{DataError, FetchReport, FuturesFetch, FuturesProvider};
use super::store;
use crate::series::{CanonicalSeries, SourceKind};
use serde::Deserialize;
use std::path::Path;

/// CBOT rough rice futures, continuous front month.
pub const ROUGH_RICE_SYMBOL: &str = "ZR=F";

/// What to ask the provider for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FuturesRequest {
    pub symbol: String,
    /// Primary retrieval window, e.g. `"max"`.
    pub range: String,
    /// Shorter window tried once when the primary comes back empty.
    pub fallback_range: String,
    /// Bar interval, e.g. `"1d"`.
    pub interval: String,
}

impl Default for FuturesRequest {
    fn default() -> Self {
        Self {
            symbol: ROUGH_RICE_SYMBOL.to_string(),
            range: "max".to_string(),
            fallback_range: "10y".to_string(),
            interval: "1d".to_string(),
        }
    }
}

/// Fetch the instrument's history and write it to `out_path` as canonical CSV.
///
/// An empty result after the fallback window is not an error: the file is
/// written with the header only. Provider and network errors propagate.
pub fn fetch_futures(
    provider: &dyn FuturesProvider,
    request: &FuturesRequest,
    out_path: &Path,
) -> Result<FetchReport, DataError> {
    let span = tracing::info_span!("fetch_futures", provider = provider.name(), symbol = %request.symbol);
    let _enter = span.enter();

    let mut fetched = provider.fetch_history(&request.symbol, &request.range, &request.interval)?;

    if fetched.is_empty() && request.fallback_range != request.range {
        tracing::warn!(
            range = %request.range,
            fallback = %request.fallback_range,
            "primary retrieval returned no rows, trying fallback window"
        );
        fetched =
            provider.fetch_history(&request.symbol, &request.fallback_range, &request.interval)?;
    }

    let (series, drops) = match fetched {
        FuturesFetch::Populated(points) => CanonicalSeries::from_points(points),
        FuturesFetch::Empty => {
            tracing::warn!("provider returned no rows, writing header-only file");
            (CanonicalSeries::empty(), Default::default())
        }
    };

    let content_hash = store::write_series(out_path, &series)?;
    tracing::info!(
        rows = series.len(),
        dropped = drops.total(),
        path = %out_path.display(),
        "futures series written"
    );

    Ok(FetchReport {
        source: SourceKind::Futures,
        path: out_path.to_path_buf(),
        rows: series.len(),
        dropped: drops.total(),
        content_hash,
    })
}
