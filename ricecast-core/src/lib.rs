//! Ricecast Core — rice price ingestion and short-horizon forecasting.
//!
//! This crate contains:
//! - The canonical `(Date, Price)` series and its CSV store
//! - Source adapters for the rough-rice futures feed and the monthly
//!   reference-price spreadsheet
//! - Daily resampling and the weekly-seasonal SARIMA forecast engine
//! - Configuration and logging setup shared by the binaries

pub mod config;
pub mod data;
pub mod forecast;
pub mod logging;
pub mod series;

pub use series::{CanonicalSeries, ForecastPoint, ForecastSeries, PricePoint, SourceKind};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types handed between threads by callers are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<series::CanonicalSeries>();
        require_sync::<series::CanonicalSeries>();
        require_send::<series::ForecastSeries>();
        require_sync::<series::ForecastSeries>();
        require_send::<data::FetchReport>();
        require_sync::<data::FetchReport>();
        require_send::<data::DataError>();
        require_sync::<data::DataError>();
        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
        require_send::<data::HttpWorkbookSource>();
        require_sync::<data::HttpWorkbookSource>();
        require_send::<data::LocatorChain>();
        require_sync::<data::LocatorChain>();
        require_send::<forecast::Sarima>();
        require_sync::<forecast::Sarima>();
        require_send::<forecast::ForecastError>();
        require_sync::<forecast::ForecastError>();
        require_send::<config::RicecastConfig>();
        require_sync::<config::RicecastConfig>();
    }
}
