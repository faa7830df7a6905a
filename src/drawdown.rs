//! Drawdown curve
//!
//! Running peak, percent decline from that peak, and the deepest decline so
//! far, computed over the full price series.

use crate::types::{DrawdownPoint, PricePoint};

/// Current Drawdown
///
/// Percent decline of each close from the running peak, always <= 0.
///
/// Formula: (Close - Peak) / Peak * 100
pub fn drawdown(closes: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    closes
        .iter()
        .map(|&close| {
            peak = peak.max(close);
            (close - peak) / peak * 100.0
        })
        .collect()
}

/// Drawdown curve with running peak and running minimum for every price.
pub fn drawdown_curve(prices: &[PricePoint]) -> Vec<DrawdownPoint> {
    let mut peak = f64::NEG_INFINITY;
    let mut deepest = 0.0_f64;

    prices
        .iter()
        .map(|p| {
            peak = peak.max(p.close);
            let dd = (p.close - peak) / peak * 100.0;
            deepest = deepest.min(dd);
            DrawdownPoint {
                date: p.date,
                drawdown_pct: dd,
                running_peak: peak,
                running_min_drawdown: deepest,
            }
        })
        .collect()
}

/// Deepest drawdown of the curve as a fraction (<= 0). Zero for an empty curve.
pub fn max_drawdown(curve: &[DrawdownPoint]) -> f64 {
    curve
        .last()
        .map(|p| p.running_min_drawdown / 100.0)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::fixtures::series;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_drawdown() {
        let closes = vec![100.0, 110.0, 100.0, 120.0, 100.0];
        let result = drawdown(&closes);

        assert!(approx_eq(result[0], 0.0, 0.001));
        assert!(approx_eq(result[1], 0.0, 0.001));
        // peak=110, price=100
        assert!(approx_eq(result[2], -9.09, 0.01));
        assert!(approx_eq(result[3], 0.0, 0.001));
        // peak=120, price=100
        assert!(approx_eq(result[4], -16.67, 0.01));
    }

    #[test]
    fn test_drawdown_curve() {
        let prices = series(&[100.0, 110.0, 120.0, 100.0, 80.0, 90.0]);
        let curve = drawdown_curve(&prices);

        assert_eq!(curve.len(), prices.len());
        assert_eq!(curve[0].drawdown_pct, 0.0);
        assert_eq!(curve[4].running_peak, 120.0);
        // 120 -> 80 is -33.33%, and the running minimum holds there
        assert!(approx_eq(curve[4].drawdown_pct, -33.333, 0.01));
        assert!(approx_eq(curve[5].running_min_drawdown, -33.333, 0.01));
        assert!(approx_eq(curve[5].drawdown_pct, -25.0, 1e-9));
        assert!(curve.iter().all(|p| p.drawdown_pct <= 0.0));
    }

    #[test]
    fn test_max_drawdown_fraction() {
        let curve = drawdown_curve(&series(&[1.0, 1.1, 1.2, 1.0, 0.8, 1.0, 1.1]));
        assert!(approx_eq(max_drawdown(&curve), -1.0 / 3.0, 1e-9));
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn test_curve_matches_plain_drawdown() {
        let closes = [50.0, 40.0, 45.0, 60.0, 30.0];
        let curve = drawdown_curve(&series(&closes));
        let plain = drawdown(&closes);
        for (p, d) in curve.iter().zip(&plain) {
            assert_eq!(p.drawdown_pct, *d);
        }
    }
}
