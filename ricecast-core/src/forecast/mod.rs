//! Forecast engine.
//!
//! The canonical series is resampled to a daily calendar (forward-filling
//! weekends, holidays and the days between monthly observations), then either
//! extended flat (short histories) or forecast with a weekly-seasonal SARIMA.

pub mod optimize;
pub mod resample;
pub mod sarima;

pub use optimize::{nelder_mead, Minimum, NelderMeadOptions};
pub use resample::resample_daily;
pub use sarima::{Sarima, SarimaOrder, SarimaParams};

use crate::series::{CanonicalSeries, ForecastPoint, ForecastSeries};
use chrono::{Days, NaiveDate};
use thiserror::Error;

/// Resampled observations required before the SARIMA model is used.
pub const MIN_OBSERVATIONS: usize = 20;

/// Default forecast horizon in days.
pub const DEFAULT_HORIZON: usize = 30;

/// Forecast errors.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("insufficient data: need {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("model fitting did not converge: {0}")]
    NonConvergence(String),

    #[error("model has not been fitted")]
    NotFitted,
}

/// Common interface of forecasting models.
pub trait Predictor {
    /// Fit the model to historical data.
    fn fit(&mut self, data: &[f64]) -> Result<(), ForecastError>;

    /// Point forecasts for the next `steps` observations.
    fn predict(&self, steps: usize) -> Result<Vec<f64>, ForecastError>;

    fn is_fitted(&self) -> bool;
}

/// Forecast `horizon` days past the end of `series`, using the local date as
/// the anchor for an empty series.
pub fn forecast(series: &CanonicalSeries, horizon: usize) -> Result<ForecastSeries, ForecastError> {
    forecast_at(series, horizon, chrono::Local::now().date_naive())
}

/// [`forecast`] with an explicit processing date.
pub fn forecast_at(
    series: &CanonicalSeries,
    horizon: usize,
    today: NaiveDate,
) -> Result<ForecastSeries, ForecastError> {
    forecast_with_order(series, horizon, today, SarimaOrder::DAILY_WEEKLY)
}

/// [`forecast_at`] with a caller-chosen model order.
pub fn forecast_with_order(
    series: &CanonicalSeries,
    horizon: usize,
    today: NaiveDate,
    order: SarimaOrder,
) -> Result<ForecastSeries, ForecastError> {
    let daily = resample_daily(series);
    let anchor = daily.last().map(|p| p.date).unwrap_or(today);

    if horizon == 0 {
        return Ok(ForecastSeries::default());
    }

    if daily.len() < MIN_OBSERVATIONS {
        let level = daily.last().map(|p| p.price).unwrap_or(0.0);
        tracing::info!(
            observations = daily.len(),
            level,
            %anchor,
            "history too short for SARIMA, using flat forecast"
        );
        return dated(anchor, std::iter::repeat(level).take(horizon));
    }

    let mut model = Sarima::new(order);
    model.fit(&daily.prices())?;
    let values = model.predict(horizon)?;

    tracing::info!(
        observations = daily.len(),
        horizon,
        sigma2 = model.sigma2(),
        %anchor,
        "SARIMA forecast produced"
    );
    dated(anchor, values)
}

/// Attach contiguous dates starting the day after `anchor`.
fn dated(
    anchor: NaiveDate,
    values: impl IntoIterator<Item = f64>,
) -> Result<ForecastSeries, ForecastError> {
    let points = values
        .into_iter()
        .enumerate()
        .map(|(i, forecast)| {
            anchor
                .checked_add_days(Days::new(i as u64 + 1))
                .map(|date| ForecastPoint { date, forecast })
                .ok_or_else(|| ForecastError::InvalidData(format!("date overflow after {anchor}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ForecastSeries { points })
}
