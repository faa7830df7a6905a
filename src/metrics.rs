// src/metrics.rs
// Whole-series risk metrics

use tracing::warn;

use crate::common::{defined, mean, safe_div, sample_std};
use crate::config::AnalysisConfig;
use crate::drawdown::{drawdown_curve, max_drawdown};
use crate::returns::{compounded_return, return_values};
use crate::types::{Degeneracy, Metric, PricePoint, ReturnPoint, RiskMetrics};
use crate::volatility::annualized_volatility;

/// Days per calendar year used for `years_analyzed`
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Calculate the risk summary from the price series and its returns.
///
/// Undefined values come back as `None` alongside a [`Degeneracy`] naming
/// them; nothing here fails the run.
pub fn calculate_risk_metrics(
    prices: &[PricePoint],
    returns: &[ReturnPoint],
    config: &AnalysisConfig,
) -> (RiskMetrics, Vec<Degeneracy>) {
    let rf = config.risk_free_rate;
    let periods = config.trading_days_per_year;
    let values = return_values(returns);
    let mut diagnostics = Vec::new();

    let enough_history = values.len() >= 2;
    if !enough_history {
        diagnostics.push(Degeneracy::InsufficientHistory {
            feature: "risk_metrics".into(),
            required: 3,
            available: prices.len(),
        });
    }

    let years_analyzed = match (prices.first(), prices.last()) {
        (Some(first), Some(last)) => (last.date - first.date).num_days() as f64 / DAYS_PER_YEAR,
        _ => 0.0,
    };

    // Total return
    let total_return = match (prices.first(), prices.last()) {
        (Some(first), Some(last)) => last.close / first.close - 1.0,
        _ => 0.0,
    };

    // CAGR
    let cagr = if values.is_empty() || years_analyzed <= 0.0 {
        f64::NAN
    } else {
        (1.0 + compounded_return(&values)).powf(1.0 / years_analyzed) - 1.0
    };

    let volatility = annualized_volatility(&values, periods);
    let sharpe = sharpe_ratio(&values, rf, periods);
    let sortino = sortino_ratio(&values, rf, periods);
    let excess_return = cagr - rf;

    // Max drawdown
    let max_dd = max_drawdown(&drawdown_curve(prices));

    // Short series are already reported as insufficient history above
    let mut check = |metric: Metric, value: f64| {
        let value = defined(value);
        if value.is_none() && enough_history {
            warn!(?metric, "risk metric undefined");
            diagnostics.push(Degeneracy::DegenerateRatio { metric });
        }
        value
    };

    let metrics = RiskMetrics {
        total_return,
        cagr: check(Metric::Cagr, cagr),
        volatility: check(Metric::Volatility, volatility),
        sharpe: check(Metric::Sharpe, sharpe),
        sortino: check(Metric::Sortino, sortino),
        max_drawdown: max_dd,
        years_analyzed,
        excess_return: check(Metric::ExcessReturn, excess_return),
        risk_free_rate: rf,
    };
    (metrics, diagnostics)
}

/// Convert an annual rate to the equivalent per-period rate
pub fn per_period_rate(annual: f64, periods: f64) -> f64 {
    (1.0 + annual).powf(1.0 / periods) - 1.0
}

fn excess_returns(returns: &[f64], rf: f64, periods: f64) -> Vec<f64> {
    let rf_period = per_period_rate(rf, periods);
    returns.iter().map(|r| r - rf_period).collect()
}

/// Sharpe ratio
///
/// Mean per-period excess return over its sample standard deviation,
/// annualized by sqrt(periods). NaN for fewer than two returns or zero
/// volatility.
pub fn sharpe_ratio(returns: &[f64], rf: f64, periods: f64) -> f64 {
    if returns.len() < 2 {
        return f64::NAN;
    }
    let excess = excess_returns(returns, rf, periods);
    safe_div(mean(&excess), sample_std(&excess)) * periods.sqrt()
}

/// Sortino ratio
///
/// Like Sharpe, but the denominator is the downside deviation: the root mean
/// square of the excess returns below zero, taken over all observations.
/// NaN when no return falls below the risk-free hurdle.
pub fn sortino_ratio(returns: &[f64], rf: f64, periods: f64) -> f64 {
    if returns.len() < 2 {
        return f64::NAN;
    }
    let excess = excess_returns(returns, rf, periods);
    safe_div(mean(&excess), downside_deviation(&excess)) * periods.sqrt()
}

/// Downside deviation of returns already expressed relative to the hurdle
fn downside_deviation(excess: &[f64]) -> f64 {
    if excess.is_empty() {
        return f64::NAN;
    }
    let sum_sq: f64 = excess.iter().filter(|&&r| r < 0.0).map(|r| r.powi(2)).sum();
    (sum_sq / excess.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::fixtures::series;
    use crate::returns::daily_returns;

    #[test]
    fn test_per_period_rate_compounds_back() {
        let daily = per_period_rate(0.025, 252.0);
        assert!(((1.0 + daily).powf(252.0) - 1.025).abs() < 1e-12);
    }

    #[test]
    fn test_sharpe_zero_volatility_is_nan() {
        assert!(sharpe_ratio(&[0.01, 0.01, 0.01], 0.0, 252.0).is_nan());
        assert!(sharpe_ratio(&[0.01], 0.0, 252.0).is_nan());
    }

    #[test]
    fn test_sharpe_sign() {
        let returns = vec![0.01, 0.02, -0.01, 0.03, 0.01];
        assert!(sharpe_ratio(&returns, 0.0, 252.0) > 0.0);
        let losing: Vec<f64> = returns.iter().map(|r| -r).collect();
        assert!(sharpe_ratio(&losing, 0.0, 252.0) < 0.0);
    }

    #[test]
    fn test_sortino_value() {
        // rf = 0: excess = returns; downside = sqrt((0.01^2) / 4)
        let returns = vec![0.02, -0.01, 0.03, 0.0];
        let expected = (0.04 / 4.0) / (0.0001_f64 / 4.0).sqrt() * 252.0_f64.sqrt();
        assert!((sortino_ratio(&returns, 0.0, 252.0) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_sortino_without_downside_is_nan() {
        assert!(sortino_ratio(&[0.01, 0.02, 0.03], 0.0, 252.0).is_nan());
    }

    #[test]
    fn test_metrics_single_point() {
        let prices = series(&[100.0]);
        let returns = daily_returns(&prices);
        let (m, diagnostics) = calculate_risk_metrics(&prices, &returns, &AnalysisConfig::default());

        assert_eq!(m.total_return, 0.0);
        assert_eq!(m.years_analyzed, 0.0);
        assert_eq!(m.max_drawdown, 0.0);
        assert!(m.cagr.is_none() && m.volatility.is_none());
        assert!(m.sharpe.is_none() && m.sortino.is_none() && m.excess_return.is_none());
        assert_eq!(
            diagnostics,
            vec![Degeneracy::InsufficientHistory {
                feature: "risk_metrics".into(),
                required: 3,
                available: 1,
            }]
        );
    }

    #[test]
    fn test_short_series_is_not_a_degenerate_ratio() {
        let prices = series(&[100.0, 110.0]);
        let returns = daily_returns(&prices);
        let (m, diagnostics) = calculate_risk_metrics(&prices, &returns, &AnalysisConfig::default());

        assert!(m.cagr.is_some());
        assert!(m.volatility.is_none() && m.sharpe.is_none() && m.sortino.is_none());
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics
            .iter()
            .all(|d| !matches!(d, Degeneracy::DegenerateRatio { .. })));
    }

    #[test]
    fn test_zero_volatility_is_a_degenerate_ratio() {
        let prices = series(&[100.0; 10]);
        let returns = daily_returns(&prices);
        let (m, diagnostics) = calculate_risk_metrics(&prices, &returns, &AnalysisConfig::default());

        assert_eq!(m.sharpe, None);
        assert_eq!(diagnostics, vec![Degeneracy::DegenerateRatio { metric: Metric::Sharpe }]);
    }

    #[test]
    fn test_metrics_values() {
        let prices = series(&[100.0, 110.0, 99.0, 120.0]);
        let returns = daily_returns(&prices);
        let config = AnalysisConfig::default();
        let (m, _) = calculate_risk_metrics(&prices, &returns, &config);

        assert!((m.total_return - 0.2).abs() < 1e-12);
        assert!((m.years_analyzed - 3.0 / 365.25).abs() < 1e-12);
        // 110 -> 99 is the deepest fall
        assert!((m.max_drawdown - (-0.1)).abs() < 1e-12);
        let cagr = m.cagr.unwrap();
        assert!((cagr - (1.2_f64.powf(365.25 / 3.0) - 1.0)).abs() / cagr < 1e-9);
        assert!((m.excess_return.unwrap() - (cagr - 0.025)).abs() < 1e-9);
        assert_eq!(m.risk_free_rate, 0.025);
    }
}
