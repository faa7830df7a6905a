//! Volatility
//!
//! Rolling and whole-series annualized volatility of daily returns.

use tracing::warn;

use crate::common::{defined, has_enough_data, nan_vec, rolling, sample_std};
use crate::returns::return_values;
use crate::types::{Degeneracy, ReturnPoint, VolatilityPoint, WindowVolatility};

/// Rolling Volatility
///
/// Sample standard deviation of the trailing `window` returns, annualized and
/// expressed in percent.
///
/// Formula: StdDev(returns[i-w+1..=i]) * sqrt(trading_days) * 100
///
/// The first `window - 1` values are NaN.
pub fn rolling_volatility(returns: &[f64], window: usize, trading_days: f64) -> Vec<f64> {
    let n = returns.len();
    if !has_enough_data(n, window) {
        return nan_vec(n);
    }

    let annualize = trading_days.sqrt();
    rolling(returns, window, sample_std)
        .into_iter()
        .map(|s| if s.is_nan() { f64::NAN } else { s * annualize * 100.0 })
        .collect()
}

/// Annualized Volatility
///
/// Whole-series sample standard deviation times sqrt(trading_days), as a
/// fraction. NaN for fewer than two returns.
pub fn annualized_volatility(returns: &[f64], trading_days: f64) -> f64 {
    sample_std(returns) * trading_days.sqrt()
}

/// Rolling volatility for every window, aligned to the return dates.
///
/// Windows longer than the series leave that window undefined everywhere and
/// are reported as [`Degeneracy::InsufficientHistory`].
pub fn rolling_volatilities(
    returns: &[ReturnPoint],
    windows: &[usize],
    trading_days: f64,
) -> (Vec<VolatilityPoint>, Vec<Degeneracy>) {
    let values = return_values(returns);
    let mut diagnostics = Vec::new();

    let per_window: Vec<Vec<f64>> = windows
        .iter()
        .map(|&w| {
            if !has_enough_data(values.len(), w) {
                warn!(window = w, available = values.len(), "not enough returns for volatility window");
                diagnostics.push(Degeneracy::InsufficientHistory {
                    feature: format!("volatility_{}d", w),
                    required: w,
                    available: values.len(),
                });
            }
            rolling_volatility(&values, w, trading_days)
        })
        .collect();

    let points = returns
        .iter()
        .enumerate()
        .map(|(i, r)| VolatilityPoint {
            date: r.date,
            windows: windows
                .iter()
                .zip(&per_window)
                .map(|(&window, series)| WindowVolatility {
                    window,
                    vol_pct: defined(series[i]),
                })
                .collect(),
        })
        .collect();

    (points, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        if a.is_nan() && b.is_nan() {
            return true;
        }
        (a - b).abs() < epsilon
    }

    fn return_points(values: &[f64]) -> Vec<ReturnPoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &r)| ReturnPoint {
                date: start + chrono::Days::new(i as u64),
                daily_return: r,
            })
            .collect()
    }

    #[test]
    fn test_rolling_volatility_warmup() {
        let returns = vec![0.01, -0.02, 0.015, 0.0, 0.01];
        let result = rolling_volatility(&returns, 3, 252.0);

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        for v in &result[2..] {
            assert!(!v.is_nan());
        }
    }

    #[test]
    fn test_rolling_volatility_value() {
        // Sample std of [0.01, -0.01] is sqrt(0.0002)
        let returns = vec![0.01, -0.01];
        let result = rolling_volatility(&returns, 2, 252.0);
        let expected = 0.0002_f64.sqrt() * 252.0_f64.sqrt() * 100.0;
        assert!(approx_eq(result[1], expected, 1e-9));
    }

    #[test]
    fn test_constant_returns_zero_volatility() {
        let returns = vec![0.01; 10];
        let result = rolling_volatility(&returns, 5, 252.0);
        assert!(approx_eq(result[9], 0.0, 1e-12));
    }

    #[test]
    fn test_window_longer_than_series() {
        let result = rolling_volatility(&[0.01, 0.02], 30, 252.0);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_annualized_volatility() {
        let returns = vec![0.01, -0.01, 0.02, -0.02, 0.01];
        let vol = annualized_volatility(&returns, 252.0);
        assert!(vol > 0.0);
        assert!(annualized_volatility(&[0.01], 252.0).is_nan());
    }

    #[test]
    fn test_rolling_volatilities_alignment_and_diagnostics() {
        let points = return_points(&[0.01, -0.02, 0.015, 0.0, 0.01]);
        let (vols, diagnostics) = rolling_volatilities(&points, &[2, 10], 252.0);

        assert_eq!(vols.len(), points.len());
        assert_eq!(vols[0].date, points[0].date);
        assert_eq!(vols[0].get(2), None);
        assert!(vols[1].get(2).is_some());
        assert!(vols.iter().all(|p| p.get(10).is_none()));

        assert_eq!(
            diagnostics,
            vec![Degeneracy::InsufficientHistory {
                feature: "volatility_10d".into(),
                required: 10,
                available: 5,
            }]
        );
    }
}
