use super::types::{PriceSeries, VariationEvent};
use crate::error::DetectError;
use chrono::{DateTime, Utc};

/// Net drift between the first and last sample of `series`, in percent.
///
/// Returns `Ok(None)` for series shorter than two samples. A zero or
/// non-finite base price is an error rather than an infinite variation.
pub fn variation_pct(series: &PriceSeries) -> Result<Option<f64>, DetectError> {
    let (first, last) = match (series.first(), series.last()) {
        (Some(first), Some(last)) if series.len() >= 2 => (first, last),
        _ => return Ok(None),
    };

    for price in [first.price, last.price] {
        if !price.is_finite() {
            return Err(DetectError::NonFinitePrice(price));
        }
    }
    if first.price == 0.0 {
        return Err(DetectError::ZeroBasePrice);
    }

    Ok(Some((last.price - first.price) / first.price * 100.0))
}

/// Emits a [`VariationEvent`] when `|variation| >= threshold_pct`.
pub fn detect(
    series: &PriceSeries,
    threshold_pct: f64,
    detected_at: DateTime<Utc>,
) -> Result<Option<VariationEvent>, DetectError> {
    let variation = match variation_pct(series)? {
        Some(v) => v,
        None => return Ok(None),
    };

    // variation_pct only returns Some with at least two samples
    let (first, last) = match (series.first(), series.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Ok(None),
    };

    // NaN thresholds never fire.
    let fired = variation.abs() >= threshold_pct;
    Ok(fired.then(|| VariationEvent {
        symbol: series.symbol.clone(),
        initial_price: first.price,
        current_price: last.price,
        variation_pct: variation,
        window_start_time: first.timestamp,
        window_end_time: last.timestamp,
        detected_at,
    }))
}
