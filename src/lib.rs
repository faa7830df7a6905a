//! # RAVA Analytics
//!
//! Risk and volatility analysis for a single daily price series.
//!
//! ## Features
//! - Normalization of irregular raw price records
//! - Daily returns and rolling annualized volatility (30/60/252 days by default)
//! - Drawdown curve, major drawdown episodes and recovery times
//! - CAGR, volatility, Sharpe, Sortino and max drawdown summary
//! - Compiles to native and WASM
//!
//! ## Example
//! ```
//! use rava_analytics::{analyze_records, AnalysisConfig, RawPriceRecord};
//!
//! let raw: Vec<RawPriceRecord> = [100.0, 130.0, 100.0, 80.0, 60.0, 90.0, 135.0]
//!     .iter()
//!     .enumerate()
//!     .map(|(i, &close)| RawPriceRecord::close_only(format!("2024-01-{:02}", i + 1), close))
//!     .collect();
//!
//! let report = analyze_records(&raw, None, &AnalysisConfig::default()).unwrap();
//! assert_eq!(report.episodes.len(), 1);
//! assert_eq!(report.recoveries.len(), 1);
//! ```

pub mod common;
pub mod types;
pub mod config;
pub mod error;
pub mod normalize;
pub mod returns;
pub mod volatility;
pub mod drawdown;
pub mod episodes;
pub mod recovery;
pub mod metrics;
pub mod pipeline;
pub mod source;
pub mod cache;
pub mod frame;

// Re-export commonly used items at crate root
pub use config::AnalysisConfig;
pub use error::{AnalysisError, ConfigError, FetchError};
pub use types::{
    AnalysisReport, AnalysisRow, Degeneracy, DrawdownEpisode, DrawdownPoint, Metric, PricePoint, RawPriceRecord,
    RecoveryRecord, ReturnPoint, RiskMetrics, VolatilityPoint, WindowVolatility,
};
pub use normalize::normalize;
pub use returns::daily_returns;
pub use volatility::{rolling_volatility, rolling_volatilities, annualized_volatility};
pub use drawdown::{drawdown, drawdown_curve};
pub use episodes::{find_major_drawdowns, EpisodeParams, ScanState};
pub use recovery::calculate_recovery;
pub use metrics::{calculate_risk_metrics, sharpe_ratio, sortino_ratio};
pub use pipeline::{analyze_prices, analyze_records, analyze_symbol};
pub use source::{fetch_resolved, InMemorySource, JsonDirSource, ParquetSource, PriceSource};

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

/// WASM bindings for browser/Node.js use
#[cfg(feature = "wasm")]
#[wasm_bindgen]
pub struct Analytics;

#[cfg(feature = "wasm")]
#[wasm_bindgen]
impl Analytics {
    #[wasm_bindgen]
    pub fn rolling_volatility(returns: &[f64], window: usize) -> Vec<f64> {
        volatility::rolling_volatility(returns, window, 252.0)
    }

    #[wasm_bindgen]
    pub fn drawdown(closes: &[f64]) -> Vec<f64> {
        drawdown::drawdown(closes)
    }

    #[wasm_bindgen]
    pub fn sharpe(returns: &[f64], risk_free_rate: f64) -> f64 {
        metrics::sharpe_ratio(returns, risk_free_rate, 252.0)
    }

    #[wasm_bindgen]
    pub fn sortino(returns: &[f64], risk_free_rate: f64) -> f64 {
        metrics::sortino_ratio(returns, risk_free_rate, 252.0)
    }

    /// Full report for a JSON array of raw records, returned as JSON
    #[wasm_bindgen]
    pub fn analyze_json(records_json: &str) -> Result<String, JsValue> {
        let raw: Vec<RawPriceRecord> =
            serde_json::from_str(records_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let report = pipeline::analyze_records(&raw, None, &AnalysisConfig::default())
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        serde_json::to_string(&report).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}
