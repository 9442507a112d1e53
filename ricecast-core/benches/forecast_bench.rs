//! Criterion benchmarks for the forecast path.
//!
//! Benchmarks:
//! 1. Daily resampling of a sparse monthly series
//! 2. SARIMA fit + 30-day forecast at increasing history lengths
//! 3. Full `forecast_at` on a futures-like daily series

use chrono::{Days, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use ricecast_core::forecast::{forecast_at, resample_daily, Predictor, Sarima, SarimaOrder};
use ricecast_core::series::{CanonicalSeries, PricePoint};

// ── Helpers ──────────────────────────────────────────────────────────

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 1, 1).unwrap()
}

fn daily_prices(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 15.0 + (i as f64 * 0.05).sin() * 2.0 + (i % 7) as f64 * 0.05)
        .collect()
}

fn daily_series(n: usize) -> CanonicalSeries {
    CanonicalSeries::from_points(
        daily_prices(n)
            .into_iter()
            .enumerate()
            .map(|(i, p)| PricePoint::new(start() + Days::new(i as u64), p)),
    )
    .0
}

fn monthly_series(months: u32) -> CanonicalSeries {
    CanonicalSeries::from_points((0..months).map(|m| {
        let date = start()
            .checked_add_months(chrono::Months::new(m))
            .unwrap();
        PricePoint::new(date, 400.0 + (m as f64 * 0.2).cos() * 50.0)
    }))
    .0
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_resample(c: &mut Criterion) {
    let series = monthly_series(120);
    c.bench_function("resample_daily_10y_monthly", |b| {
        b.iter(|| resample_daily(black_box(&series)))
    });
}

fn bench_sarima(c: &mut Criterion) {
    let mut group = c.benchmark_group("sarima_fit_predict");
    group.sample_size(20);
    for n in [60usize, 365, 1500] {
        let data = daily_prices(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &data, |b, data| {
            b.iter(|| {
                let mut model = Sarima::new(SarimaOrder::DAILY_WEEKLY);
                model.fit(black_box(data)).unwrap();
                model.predict(30).unwrap()
            })
        });
    }
    group.finish();
}

fn bench_forecast(c: &mut Criterion) {
    let series = daily_series(1000);
    let today = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
    c.bench_function("forecast_at_1000_days", |b| {
        b.iter(|| forecast_at(black_box(&series), 30, today).unwrap())
    });
}

criterion_group!(benches, bench_resample, bench_sarima, bench_forecast);
criterion_main!(benches);
