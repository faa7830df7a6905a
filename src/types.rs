// src/types.rs
// Value objects flowing through the analytics pipeline

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;

// ============================================================================
// Input Records
// ============================================================================

/// A price record as delivered by a data source, before normalization.
///
/// Every field is optional; the normalizer decides what is usable.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPriceRecord {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub close: Option<f64>,
    /// Split/dividend adjusted close, preferred over `close` when present
    #[serde(default)]
    pub adj_close: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
}

impl RawPriceRecord {
    /// Record with only a date and a close price
    pub fn close_only(date: impl Into<String>, close: f64) -> Self {
        Self {
            date: Some(date.into()),
            close: Some(close),
            ..Default::default()
        }
    }
}

// ============================================================================
// Series Points
// ============================================================================

/// One trading day of a normalized series
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Simple return between a point and its predecessor, dated at the later point
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnPoint {
    pub date: NaiveDate,
    pub daily_return: f64,
}

/// Annualized volatility (percent) for one look-back window
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowVolatility {
    pub window: usize,
    pub vol_pct: Option<f64>,
}

/// Rolling volatilities on a return date, one entry per configured window
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolatilityPoint {
    pub date: NaiveDate,
    pub windows: Vec<WindowVolatility>,
}

impl VolatilityPoint {
    /// Volatility for `window`, `None` when undefined or not configured
    pub fn get(&self, window: usize) -> Option<f64> {
        self.windows
            .iter()
            .find(|w| w.window == window)
            .and_then(|w| w.vol_pct)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawdownPoint {
    pub date: NaiveDate,
    /// Percent below the running peak, always <= 0
    pub drawdown_pct: f64,
    pub running_peak: f64,
    /// Deepest drawdown seen so far, always <= 0
    pub running_min_drawdown: f64,
}

// ============================================================================
// Episodes
// ============================================================================

/// A closed peak-to-trough decline that met the configured threshold
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawdownEpisode {
    pub peak_date: NaiveDate,
    pub trough_date: NaiveDate,
    pub peak_price: f64,
    pub trough_price: f64,
    pub drawdown_pct: f64,
    pub duration_days: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryRecord {
    pub drawdown_pct: f64,
    pub drawdown_duration_days: i64,
    pub recovery_days: i64,
    pub recovery_months: f64,
    pub trough_date: NaiveDate,
    pub recovery_date: NaiveDate,
}

// ============================================================================
// Summary
// ============================================================================

/// Whole-series risk summary. `None` marks an undefined value.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMetrics {
    pub total_return: f64,
    pub cagr: Option<f64>,
    pub volatility: Option<f64>,
    pub sharpe: Option<f64>,
    pub sortino: Option<f64>,
    /// Deepest drawdown as a fraction (<= 0)
    pub max_drawdown: f64,
    pub years_analyzed: f64,
    pub excess_return: Option<f64>,
    pub risk_free_rate: f64,
}

impl RiskMetrics {
    /// Magnitude of the deepest drawdown, for display
    pub fn max_drawdown_abs(&self) -> f64 {
        self.max_drawdown.abs()
    }

    /// Label/value rows for a metrics table, percentages pre-formatted
    pub fn summary_table(&self, trading_days: usize) -> Vec<(&'static str, String)> {
        fn pct(v: Option<f64>) -> String {
            v.map(|x| format!("{:.2}%", x * 100.0)).unwrap_or_else(|| "n/a".into())
        }
        fn ratio(v: Option<f64>) -> String {
            v.map(|x| format!("{:.3}", x)).unwrap_or_else(|| "n/a".into())
        }

        vec![
            ("Total Return", pct(Some(self.total_return))),
            ("Annualized Return (CAGR)", pct(self.cagr)),
            ("Annualized Volatility", pct(self.volatility)),
            ("Risk-Free Rate", pct(Some(self.risk_free_rate))),
            ("Excess Return", pct(self.excess_return)),
            ("Sharpe Ratio", ratio(self.sharpe)),
            ("Sortino Ratio", ratio(self.sortino)),
            ("Maximum Drawdown", pct(Some(self.max_drawdown_abs()))),
            ("Years Analyzed", format!("{:.1}", self.years_analyzed)),
            ("Total Trading Days", trading_days.to_string()),
        ]
    }
}

/// Metric names used when reporting degenerate values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Cagr,
    Volatility,
    Sharpe,
    Sortino,
    ExcessReturn,
}

/// A non-fatal condition that left some outputs undefined
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Degeneracy {
    /// Too few observations for a computation
    #[serde(rename_all = "camelCase")]
    InsufficientHistory {
        feature: String,
        required: usize,
        available: usize,
    },
    /// A ratio whose denominator was zero or undefined
    #[serde(rename_all = "camelCase")]
    DegenerateRatio { metric: Metric },
}

// ============================================================================
// Report
// ============================================================================

/// One row of the aligned output table, keyed by price date
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    /// `None` on the first row
    pub daily_return: Option<f64>,
    pub volatility: Vec<WindowVolatility>,
    pub drawdown_pct: f64,
    pub running_peak: f64,
    pub running_min_drawdown: f64,
}

impl AnalysisRow {
    pub fn volatility(&self, window: usize) -> Option<f64> {
        self.volatility
            .iter()
            .find(|w| w.window == window)
            .and_then(|w| w.vol_pct)
    }
}

/// Everything one analysis run produces
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub symbol: Option<String>,
    pub config: AnalysisConfig,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub trading_days: usize,
    pub rows: Vec<AnalysisRow>,
    pub episodes: Vec<DrawdownEpisode>,
    pub recoveries: Vec<RecoveryRecord>,
    pub metrics: RiskMetrics,
    pub diagnostics: Vec<Degeneracy>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_record_defaults_missing_fields() {
        let raw: RawPriceRecord = serde_json::from_str(r#"{"date":"2024-01-02","close":10.5}"#).unwrap();
        assert_eq!(raw.date.as_deref(), Some("2024-01-02"));
        assert_eq!(raw.close, Some(10.5));
        assert!(raw.open.is_none() && raw.volume.is_none() && raw.adj_close.is_none());
    }

    #[test]
    fn test_raw_record_adj_close_camel_case() {
        let raw: RawPriceRecord = serde_json::from_str(r#"{"date":"2024-01-02","adjClose":9.5}"#).unwrap();
        assert_eq!(raw.adj_close, Some(9.5));
    }

    #[test]
    fn test_volatility_point_lookup() {
        let point = VolatilityPoint {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            windows: vec![
                WindowVolatility { window: 30, vol_pct: Some(12.0) },
                WindowVolatility { window: 60, vol_pct: None },
            ],
        };
        assert_eq!(point.get(30), Some(12.0));
        assert_eq!(point.get(60), None);
        assert_eq!(point.get(252), None);
    }

    #[test]
    fn test_summary_table_marks_undefined() {
        let metrics = RiskMetrics {
            total_return: 0.5,
            cagr: None,
            volatility: Some(0.2),
            sharpe: None,
            sortino: None,
            max_drawdown: -0.25,
            years_analyzed: 2.0,
            excess_return: None,
            risk_free_rate: 0.025,
        };
        let table = metrics.summary_table(500);
        assert_eq!(table[0], ("Total Return", "50.00%".to_string()));
        assert_eq!(table[1].1, "n/a");
        assert_eq!(table[7], ("Maximum Drawdown", "25.00%".to_string()));
        assert_eq!(table[9].1, "500");
    }

    #[test]
    fn test_degeneracy_serializes_with_kind_tag() {
        let d = Degeneracy::DegenerateRatio { metric: Metric::Sharpe };
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["kind"], "degenerateRatio");
        assert_eq!(json["metric"], "sharpe");
    }
}
