//! Daily simple returns

use crate::types::{PricePoint, ReturnPoint};

/// Simple returns of consecutive closes: `close[i] / close[i-1] - 1`.
///
/// N points yield N-1 returns, each dated at the later point. Fewer than two
/// points yield an empty series.
pub fn daily_returns(prices: &[PricePoint]) -> Vec<ReturnPoint> {
    prices
        .windows(2)
        .map(|w| ReturnPoint {
            date: w[1].date,
            daily_return: w[1].close / w[0].close - 1.0,
        })
        .collect()
}

/// Bare return values, in date order
pub fn return_values(returns: &[ReturnPoint]) -> Vec<f64> {
    returns.iter().map(|r| r.daily_return).collect()
}

/// Total return obtained by compounding every daily return
pub fn compounded_return(returns: &[f64]) -> f64 {
    returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}
