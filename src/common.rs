//! Common numeric utilities shared across the analytics stages

/// Initialize a result vector with NaN values
#[inline]
pub fn nan_vec(len: usize) -> Vec<f64> {
    vec![f64::NAN; len]
}

/// Check if we have enough data for the given period
#[inline]
pub fn has_enough_data(len: usize, period: usize) -> bool {
    len >= period && period > 0
}

/// Calculate the mean of a slice
#[inline]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (N - 1 denominator)
///
/// NaN for fewer than two values. Every volatility figure in the crate goes
/// through this function so rolling and whole-series numbers agree.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let variance = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - 1) as f64;
    variance.sqrt()
}

/// Safe division that returns NaN on divide by zero
#[inline]
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        f64::NAN
    } else {
        numerator / denominator
    }
}

/// Map NaN/infinite values to `None`
#[inline]
pub fn defined(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Compute rolling window operation
/// Returns vector of same length with NaN for insufficient lookback
pub fn rolling<F>(values: &[f64], period: usize, f: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let n = values.len();
    if !has_enough_data(n, period) {
        return nan_vec(n);
    }

    let mut result = nan_vec(n);
    for i in (period - 1)..n {
        let window = &values[(i + 1 - period)..=i];
        result[i] = f(window);
    }
    result
}

/// Round to one decimal place
#[inline]
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}


/// Price series builders shared by the unit tests
#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{Days, NaiveDate};

    use crate::types::{PricePoint, RawPriceRecord};

    /// `offset` days after 2024-01-01
    pub fn day(offset: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Days::new(offset)
    }

    /// Points at the given day offsets, open/high/low equal to the close
    pub fn points_at(points: &[(u64, f64)]) -> Vec<PricePoint> {
        points
            .iter()
            .map(|&(offset, close)| PricePoint {
                date: day(offset),
                open: close,
                high: close,
                low: close,
                close,
                volume: 0,
            })
            .collect()
    }

    /// One point per consecutive day
    pub fn series(closes: &[f64]) -> Vec<PricePoint> {
        let points: Vec<(u64, f64)> = closes.iter().enumerate().map(|(i, &c)| (i as u64, c)).collect();
        points_at(&points)
    }

    /// Close-only raw records on consecutive days
    pub fn records(closes: &[f64]) -> Vec<RawPriceRecord> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| RawPriceRecord::close_only(day(i as u64).format("%Y-%m-%d").to_string(), c))
            .collect()
    }
}
