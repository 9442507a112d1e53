//! Canonical price series and forecast series.
//!
//! Every source adapter normalizes into a [`CanonicalSeries`]: one price per
//! calendar date, dates strictly ascending, prices finite and non-negative.
//! The only way to build one is [`CanonicalSeries::from_points`], so the
//! invariants hold for every value of the type.

use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single observation: the closing/reference price on a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

/// Which upstream source produced a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Daily futures closes from the market-data provider.
    Futures,
    /// Monthly reference prices from the published spreadsheet.
    Spreadsheet,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Futures => write!(f, "futures"),
            SourceKind::Spreadsheet => write!(f, "spreadsheet"),
        }
    }
}

/// What canonicalization threw away.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropCounts {
    /// Points whose price was NaN, infinite or negative.
    pub invalid_price: usize,
    /// Points whose date was already taken by an earlier point.
    pub duplicate_date: usize,
}

impl DropCounts {
    pub fn total(&self) -> usize {
        self.invalid_price + self.duplicate_date
    }
}

/// Normalized `(date, price)` series shared by both source adapters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CanonicalSeries {
    points: Vec<PricePoint>,
}

impl CanonicalSeries {
    /// A valid zero-row series.
    pub fn empty() -> Self {
        Self { points: Vec::new() }
    }

    /// Build a series from points in any order.
    ///
    /// Drops non-finite and negative prices, keeps the first point seen for
    /// each date (input order), then sorts ascending by date.
    pub fn from_points(points: impl IntoIterator<Item = PricePoint>) -> (Self, DropCounts) {
        let mut drops = DropCounts::default();
        let mut seen = HashSet::new();
        let mut kept = Vec::new();

        for point in points {
            if !point.price.is_finite() || point.price < 0.0 {
                drops.invalid_price += 1;
                continue;
            }
            if !seen.insert(point.date) {
                drops.duplicate_date += 1;
                continue;
            }
            kept.push(point);
        }

        kept.sort_by_key(|p| p.date);
        (Self { points: kept }, drops)
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    /// The last `n` points (or all of them when shorter).
    pub fn tail(&self, n: usize) -> &[PricePoint] {
        let start = self.points.len().saturating_sub(n);
        &self.points[start..]
    }

    /// Polars view with `Date` and `Price` columns, for tabular display.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let dates: Vec<i32> = self.points.iter().map(|p| days_since_epoch(p.date)).collect();
        let prices: Vec<f64> = self.points.iter().map(|p| p.price).collect();

        DataFrame::new(vec![
            Column::new("Date".into(), dates).cast(&DataType::Date)?,
            Column::new("Price".into(), prices),
        ])
    }
}

/// One forecast step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub forecast: f64,
}

/// Point forecasts over contiguous future days.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ForecastSeries {
    pub points: Vec<ForecastPoint>,
}

impl ForecastSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The first `n` steps.
    pub fn head(&self, n: usize) -> &[ForecastPoint] {
        &self.points[..n.min(self.points.len())]
    }

    /// Polars view with `date` and `forecast` columns.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let dates: Vec<i32> = self.points.iter().map(|p| days_since_epoch(p.date)).collect();
        let values: Vec<f64> = self.points.iter().map(|p| p.forecast).collect();

        DataFrame::new(vec![
            Column::new("date".into(), dates).cast(&DataType::Date)?,
            Column::new("forecast".into(), values),
        ])
    }
}

fn days_since_epoch(date: NaiveDate) -> i32 {
    (date - NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()).num_days() as i32
}
