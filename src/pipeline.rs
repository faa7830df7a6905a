//! Analysis pipeline
//!
//! Normalizer -> returns -> volatility -> drawdown -> episodes -> recovery,
//! with the risk metrics computed from the normalized prices and returns.
//! Each stage finishes before the next starts; nothing is shared between runs.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::config::AnalysisConfig;
use crate::drawdown::drawdown_curve;
use crate::episodes::{find_major_drawdowns, EpisodeParams};
use crate::error::Result;
use crate::metrics::calculate_risk_metrics;
use crate::normalize::normalize;
use crate::recovery::calculate_recovery;
use crate::returns::daily_returns;
use crate::source::{fetch_resolved, PriceSource};
use crate::types::{
    AnalysisReport, AnalysisRow, Degeneracy, DrawdownPoint, PricePoint, RawPriceRecord, ReturnPoint,
    VolatilityPoint, WindowVolatility,
};
use crate::volatility::rolling_volatilities;

impl From<&AnalysisConfig> for EpisodeParams {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            threshold_pct: config.drawdown_threshold_pct,
            decline_trigger_pct: config.decline_trigger_pct,
        }
    }
}

/// Fetch `symbol` from `source` and analyse it.
///
/// The config is validated before anything is fetched. Fetch failures abort
/// before any stage runs and are returned unchanged as
/// [`AnalysisError::DataUnavailable`](crate::error::AnalysisError::DataUnavailable).
pub fn analyze_symbol<S: PriceSource + ?Sized>(
    source: &S,
    symbol: &str,
    start: Option<NaiveDate>,
    config: &AnalysisConfig,
) -> Result<AnalysisReport> {
    config.validate()?;
    let fetched = fetch_resolved(source, symbol, start).map_err(|e| {
        warn!(symbol, error = %e, "price fetch failed");
        e
    })?;
    analyze_records(&fetched.records, Some(&fetched.symbol), config)
}

/// Normalize raw records and analyse them.
pub fn analyze_records(
    raw: &[RawPriceRecord],
    symbol: Option<&str>,
    config: &AnalysisConfig,
) -> Result<AnalysisReport> {
    config.validate()?;
    let prices = normalize(raw, symbol)?;
    Ok(analyze_prices(prices, symbol, config))
}

/// Run every stage over an already normalized, non-empty series.
///
/// Degenerate inputs (too short for a window, zero volatility) leave the
/// affected fields undefined and are listed in `diagnostics`.
pub fn analyze_prices(prices: Vec<PricePoint>, symbol: Option<&str>, config: &AnalysisConfig) -> AnalysisReport {
    let mut diagnostics: Vec<Degeneracy> = Vec::new();

    let returns = daily_returns(&prices);
    if returns.is_empty() {
        warn!(points = prices.len(), "fewer than two prices, returns are empty");
        diagnostics.push(Degeneracy::InsufficientHistory {
            feature: "returns".into(),
            required: 2,
            available: prices.len(),
        });
    }

    let (volatility, vol_diagnostics) =
        rolling_volatilities(&returns, &config.volatility_windows, config.trading_days_per_year);
    diagnostics.extend(vol_diagnostics);

    let curve = drawdown_curve(&prices);
    let episodes = find_major_drawdowns(&prices, &EpisodeParams::from(config));
    let recoveries = calculate_recovery(&prices, &episodes);
    debug!(
        returns = returns.len(),
        episodes = episodes.len(),
        recoveries = recoveries.len(),
        "pipeline stages complete"
    );

    let (metrics, metric_diagnostics) = calculate_risk_metrics(&prices, &returns, config);
    diagnostics.extend(metric_diagnostics);

    let rows = aligned_rows(&prices, &returns, &volatility, &curve, &config.volatility_windows);
    let (start_date, end_date) = match (prices.first(), prices.last()) {
        (Some(first), Some(last)) => (first.date, last.date),
        _ => (NaiveDate::MIN, NaiveDate::MIN),
    };

    info!(
        symbol = symbol.unwrap_or("-"),
        trading_days = prices.len(),
        episodes = episodes.len(),
        diagnostics = diagnostics.len(),
        "analysis complete"
    );

    AnalysisReport {
        symbol: symbol.map(str::to_string),
        config: config.clone(),
        start_date,
        end_date,
        trading_days: prices.len(),
        rows,
        episodes,
        recoveries,
        metrics,
        diagnostics,
    }
}

/// One row per price date. Return and volatility columns lag by one point,
/// so the first row has none.
fn aligned_rows(
    prices: &[PricePoint],
    returns: &[ReturnPoint],
    volatility: &[VolatilityPoint],
    curve: &[DrawdownPoint],
    windows: &[usize],
) -> Vec<AnalysisRow> {
    let empty_vol: Vec<WindowVolatility> = windows
        .iter()
        .map(|&window| WindowVolatility { window, vol_pct: None })
        .collect();

    prices
        .iter()
        .zip(curve)
        .enumerate()
        .map(|(i, (p, dd))| {
            let lagged = i.checked_sub(1);
            AnalysisRow {
                date: p.date,
                open: p.open,
                high: p.high,
                low: p.low,
                close: p.close,
                volume: p.volume,
                daily_return: lagged.and_then(|j| returns.get(j)).map(|r| r.daily_return),
                volatility: lagged
                    .and_then(|j| volatility.get(j))
                    .map(|v| v.windows.clone())
                    .unwrap_or_else(|| empty_vol.clone()),
                drawdown_pct: dd.drawdown_pct,
                running_peak: dd.running_peak,
                running_min_drawdown: dd.running_min_drawdown,
            }
        })
        .collect()
}
