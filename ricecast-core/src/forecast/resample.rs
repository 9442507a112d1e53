//! Daily resampling.

use crate::series::{CanonicalSeries, PricePoint};

/// Uniform daily index from the first to the last date, forward-filling gaps.
///
/// Idempotent on gap-free daily input; an empty series stays empty.
pub fn resample_daily(series: &CanonicalSeries) -> CanonicalSeries {
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return CanonicalSeries::empty();
    };

    let mut filled = Vec::with_capacity((last.date - first.date).num_days() as usize + 1);
    let mut source = series.points().iter().peekable();
    let mut carried = first.price;

    for date in first.date.iter_days().take_while(|d| *d <= last.date) {
        while let Some(point) = source.next_if(|p| p.date <= date) {
            carried = point.price;
        }
        filled.push(PricePoint::new(date, carried));
    }

    let (resampled, _) = CanonicalSeries::from_points(filled);
    resampled
}
