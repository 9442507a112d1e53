//! End-to-end: provider → canonical CSV → forecast.
//!
//! Tests:
//! 1. Futures history with gaps, duplicates and bad closes lands canonical on disk
//! 2. A persisted daily series forecasts 30 contiguous days past its last date
//! 3. An empty provider result produces a header-only file and a flat zero forecast
//! 4. Provider errors surface unchanged and leave no file behind

use chrono::{Days, NaiveDate};
use ricecast_core::data::{
    fetch_futures, read_series, DataError, FuturesFetch, FuturesProvider, FuturesRequest,
};
use ricecast_core::forecast::forecast_at;
use ricecast_core::series::PricePoint;

// ──────────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────────

/// Serves a fixed outcome for every range.
struct FixedProvider {
    outcome: fn() -> Result<FuturesFetch, DataError>,
}

impl FuturesProvider for FixedProvider {
    fn name(&self) -> &str {
        "fixed"
    }

    fn fetch_history(
        &self,
        _symbol: &str,
        _range: &str,
        _interval: &str,
    ) -> Result<FuturesFetch, DataError> {
        (self.outcome)()
    }
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Weekday closes for ~3 months, weekends missing, as a futures feed delivers them.
fn weekday_closes() -> Result<FuturesFetch, DataError> {
    let start = d(2024, 1, 1);
    let points: Vec<PricePoint> = (0..90u64)
        .map(|i| start + Days::new(i))
        .filter(|date| chrono::Datelike::weekday(date).number_from_monday() <= 5)
        .enumerate()
        .map(|(i, date)| PricePoint::new(date, 17.0 + (i as f64 * 0.3).sin() * 0.4))
        .collect();
    Ok(FuturesFetch::from_points(points))
}

fn messy_closes() -> Result<FuturesFetch, DataError> {
    Ok(FuturesFetch::from_points(vec![
        PricePoint::new(d(2024, 1, 3), 17.2),
        PricePoint::new(d(2024, 1, 2), 17.1),
        PricePoint::new(d(2024, 1, 2), 99.0),
        PricePoint::new(d(2024, 1, 4), f64::NAN),
        PricePoint::new(d(2024, 1, 5), 17.4),
    ]))
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[test]
fn futures_history_is_canonicalized_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("zr.csv");
    let provider = FixedProvider {
        outcome: messy_closes,
    };

    let report = fetch_futures(&provider, &FuturesRequest::default(), &out).unwrap();

    assert_eq!(report.rows, 3);
    assert_eq!(report.dropped, 2);
    assert_eq!(
        std::fs::read_to_string(&out).unwrap(),
        "Date,Price\n2024-01-02,17.1\n2024-01-03,17.2\n2024-01-05,17.4\n"
    );
}

#[test]
fn persisted_series_forecasts_past_last_date() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("zr.csv");
    let provider = FixedProvider {
        outcome: weekday_closes,
    };

    fetch_futures(&provider, &FuturesRequest::default(), &out).unwrap();
    let series = read_series(&out).unwrap();
    let last = series.last().unwrap().date;

    let fc = forecast_at(&series, 30, d(2030, 1, 1)).unwrap();

    assert_eq!(fc.len(), 30);
    for (i, p) in fc.points.iter().enumerate() {
        assert_eq!(p.date, last + Days::new(i as u64 + 1));
        assert!(p.forecast.is_finite());
    }
}

#[test]
fn empty_feed_gives_header_only_and_flat_zero() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("zr.csv");
    let provider = FixedProvider {
        outcome: || Ok(FuturesFetch::Empty),
    };

    let report = fetch_futures(&provider, &FuturesRequest::default(), &out).unwrap();
    assert!(report.is_empty());

    let series = read_series(&out).unwrap();
    assert!(series.is_empty());

    let fc = forecast_at(&series, 4, d(2025, 12, 30)).unwrap();
    let dates: Vec<_> = fc.points.iter().map(|p| p.date).collect();
    assert_eq!(
        dates,
        vec![d(2025, 12, 31), d(2026, 1, 1), d(2026, 1, 2), d(2026, 1, 3)]
    );
    assert!(fc.points.iter().all(|p| p.forecast == 0.0));
}

#[test]
fn provider_errors_surface_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("zr.csv");
    let provider = FixedProvider {
        outcome: || {
            Err(DataError::SymbolNotFound {
                symbol: "ZR=F".into(),
            })
        },
    };

    let err = fetch_futures(&provider, &FuturesRequest::default(), &out).unwrap_err();

    assert!(matches!(err, DataError::SymbolNotFound { .. }));
    assert!(!out.exists());
}
