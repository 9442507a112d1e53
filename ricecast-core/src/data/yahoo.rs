//! Yahoo Finance futures provider.
//!
//! Fetches daily closes from Yahoo's v8 chart API using its `range`/`interval`
//! vocabulary (`max`, `10y`, `1d`, ...). Yahoo Finance has no official API and
//! is subject to unannounced format changes; parse failures surface as
//! `ResponseFormatChanged`.

use super::provider::{DataError, FuturesFetch, FuturesProvider};
use crate::series::PricePoint;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds.
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new() -> Result<Self, DataError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Provider pointed at another host (a mock server in tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::NetworkUnreachable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Build the chart API URL for a symbol.
    fn chart_url(&self, symbol: &str, range: &str, interval: &str) -> String {
        format!(
            "{}/v8/finance/chart/{symbol}?range={range}&interval={interval}",
            self.base_url
        )
    }

    /// Parse the chart API response into closing prices.
    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<FuturesFetch, DataError> {
        let result = match resp.chart.result {
            Some(result) => result,
            None => {
                return match resp.chart.error {
                    Some(err) if err.code == "Not Found" => Err(DataError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    }),
                    Some(err) => Err(DataError::ResponseFormatChanged(format!(
                        "{}: {}",
                        err.code, err.description
                    ))),
                    None => Ok(FuturesFetch::Empty),
                };
            }
        };

        let Some(data) = result.into_iter().next() else {
            return Ok(FuturesFetch::Empty);
        };

        // No timestamps means no sessions in the requested window.
        let Some(timestamps) = data.timestamp else {
            return Ok(FuturesFetch::Empty);
        };

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        // Session dates are the exchange's local calendar days.
        let offset = data.meta.as_ref().map_or(0, |m| m.gmtoffset);

        let mut points = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts + offset, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            // Null closes are holidays / halted sessions.
            if let Some(close) = quote.close.get(i).copied().flatten() {
                points.push(PricePoint::new(date, close));
            }
        }

        Ok(FuturesFetch::from_points(points))
    }
}

impl FuturesProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch_history(
        &self,
        symbol: &str,
        range: &str,
        interval: &str,
    ) -> Result<FuturesFetch, DataError> {
        let url = self.chart_url(symbol, range, interval);
        tracing::info!(%url, "requesting chart history");

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        // Yahoo reports unknown symbols as 404 with a chart error body.
        if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::Http {
                url,
                status: status.as_u16(),
            });
        }

        let chart: ChartResponse = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
        })?;

        Self::parse_response(symbol, chart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn parse(json: &str) -> Result<FuturesFetch, DataError> {
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        YahooProvider::parse_response("ZR=F", resp)
    }

    #[test]
    fn parses_closes_and_skips_nulls() {
        // Sessions at 14:30 UTC on Jan 2, 3 and 4 2024; Jan 3 has no close.
        let json = r#"{"chart":{"result":[{
            "timestamp":[1704205800,1704292200,1704378600],
            "indicators":{"quote":[{"close":[17.385,null,17.5]}]}
        }],"error":null}}"#;

        let FuturesFetch::Populated(points) = parse(json).unwrap() else {
            panic!("expected populated fetch");
        };
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(points[0].price, 17.385);
        assert_eq!(points[1].date, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
    }

    #[test]
    fn dates_follow_exchange_local_time() {
        // 02:00 UTC on Jan 3 is still Jan 2 in Chicago (UTC-5).
        let json = r#"{"chart":{"result":[{
            "meta":{"gmtoffset":-18000,"exchangeTimezoneName":"America/Chicago"},
            "timestamp":[1704247200],
            "indicators":{"quote":[{"close":[17.4]}]}
        }],"error":null}}"#;

        let FuturesFetch::Populated(points) = parse(json).unwrap() else {
            panic!("expected populated fetch");
        };
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn missing_timestamps_is_empty() {
        let json = r#"{"chart":{"result":[{"indicators":{"quote":[{}]}}],"error":null}}"#;
        assert_eq!(parse(json).unwrap(), FuturesFetch::Empty);
    }

    #[test]
    fn all_null_closes_is_empty() {
        let json = r#"{"chart":{"result":[{
            "timestamp":[1704205800],
            "indicators":{"quote":[{"close":[null]}]}
        }],"error":null}}"#;
        assert!(parse(json).unwrap().is_empty());
    }

    #[test]
    fn not_found_error_maps_to_symbol_not_found() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert!(matches!(parse(json), Err(DataError::SymbolNotFound { .. })));
    }

    #[test]
    fn other_chart_error_is_format_change() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Invalid input - interval=7q is not supported"}}}"#;
        assert!(matches!(parse(json), Err(DataError::ResponseFormatChanged(_))));
    }

    #[test]
    fn chart_url_uses_range_and_interval() {
        let provider = YahooProvider::with_base_url("http://localhost:9999/").unwrap();
        assert_eq!(
            provider.chart_url("ZR=F", "max", "1d"),
            "http://localhost:9999/v8/finance/chart/ZR=F?range=max&interval=1d"
        );
    }
}
