//! Recovery times after major drawdowns

use crate::common::round1;
use crate::types::{DrawdownEpisode, PricePoint, RecoveryRecord};

/// Average days per month used for `recovery_months`
pub const DAYS_PER_MONTH: f64 = 30.44;

/// First point strictly after `episode.trough_date` whose close regains
/// `episode.peak_price`.
pub fn find_recovery<'a>(prices: &'a [PricePoint], episode: &DrawdownEpisode) -> Option<&'a PricePoint> {
    let after_trough = prices.partition_point(|p| p.date <= episode.trough_date);
    prices[after_trough..]
        .iter()
        .find(|p| p.close >= episode.peak_price)
}

/// Recovery record for each episode that recovered. Episodes the series never
/// recovers from produce no record.
pub fn calculate_recovery(prices: &[PricePoint], episodes: &[DrawdownEpisode]) -> Vec<RecoveryRecord> {
    episodes
        .iter()
        .filter_map(|episode| {
            let recovered = find_recovery(prices, episode)?;
            let recovery_days = (recovered.date - episode.trough_date).num_days();
            Some(RecoveryRecord {
                drawdown_pct: episode.drawdown_pct,
                drawdown_duration_days: episode.duration_days,
                recovery_days,
                recovery_months: round1(recovery_days as f64 / DAYS_PER_MONTH),
                trough_date: episode.trough_date,
                recovery_date: recovered.date,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::fixtures::{points_at, series};

    fn episode(prices: &[PricePoint], peak: usize, trough: usize) -> DrawdownEpisode {
        let peak_price = prices[peak].close;
        let trough_price = prices[trough].close;
        DrawdownEpisode {
            peak_date: prices[peak].date,
            trough_date: prices[trough].date,
            peak_price,
            trough_price,
            drawdown_pct: (trough_price - peak_price) / peak_price * 100.0,
            duration_days: (prices[trough].date - prices[peak].date).num_days(),
        }
    }

    #[test]
    fn test_recovery_found() {
        let prices = series(&[100.0, 130.0, 100.0, 80.0, 60.0, 90.0, 135.0]);
        let records = calculate_recovery(&prices, &[episode(&prices, 1, 4)]);

        assert_eq!(records.len(), 1);
        let r = records[0];
        assert_eq!(r.recovery_date, prices[6].date);
        assert_eq!(r.recovery_days, 2);
        assert_eq!(r.recovery_months, 0.1);
        assert_eq!(r.drawdown_duration_days, 3);
        assert!(r.recovery_date > r.trough_date);
    }

    #[test]
    fn test_equal_close_counts_as_recovered() {
        let prices = series(&[100.0, 50.0, 100.0, 120.0]);
        let records = calculate_recovery(&prices, &[episode(&prices, 0, 1)]);
        assert_eq!(records[0].recovery_date, prices[2].date);
    }

    #[test]
    fn test_unrecovered_is_omitted() {
        let prices = series(&[100.0, 50.0, 70.0, 99.0]);
        assert!(calculate_recovery(&prices, &[episode(&prices, 0, 1)]).is_empty());
    }

    #[test]
    fn test_recovery_months_rounding() {
        let prices = points_at(&[(0, 100.0), (10, 60.0), (100, 101.0)]);
        let records = calculate_recovery(&prices, &[episode(&prices, 0, 1)]);
        assert_eq!(records[0].recovery_days, 90);
        // 90 / 30.44 = 2.956...
        assert_eq!(records[0].recovery_months, 3.0);
    }
}
