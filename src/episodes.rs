//! Major drawdown episodes
//!
//! A left-to-right scan over closes that tracks the running peak. A decline of
//! more than the trigger percentage below the peak opens a candidate episode;
//! the next strict new peak closes it. Closed candidates whose peak-to-trough
//! decline reaches the threshold are emitted.
//!
//! The scan is a fold of [`ScanState::step`] over the series. A candidate still
//! open when the series ends is never emitted.

use tracing::debug;

use crate::types::{DrawdownEpisode, PricePoint};

/// Detector parameters, both in percent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeParams {
    /// Minimum |drawdown| for an episode to be reported
    pub threshold_pct: f64,
    /// Decline below the peak that starts tracking a candidate
    pub decline_trigger_pct: f64,
}

impl Default for EpisodeParams {
    fn default() -> Self {
        Self {
            threshold_pct: 20.0,
            decline_trigger_pct: 5.0,
        }
    }
}

/// A position in the series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mark {
    pub index: usize,
    pub point: PricePoint,
}

/// Scan state between two steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanState {
    /// Highest close so far
    pub peak: Mark,
    /// Lowest close since `peak`, earliest on ties
    pub trough: Mark,
    /// Peak at which the open candidate started, `None` outside a drawdown
    pub drawdown_start: Option<Mark>,
}

impl ScanState {
    /// State after the first point of a series
    pub fn start(first: PricePoint) -> Self {
        let mark = Mark { index: 0, point: first };
        Self {
            peak: mark,
            trough: mark,
            drawdown_start: None,
        }
    }

    pub fn in_drawdown(&self) -> bool {
        self.drawdown_start.is_some()
    }

    /// Consume the point at `index`, returning the new state and the episode
    /// closed by this point, if any.
    pub fn step(self, index: usize, point: PricePoint, params: &EpisodeParams) -> (Self, Option<DrawdownEpisode>) {
        let mark = Mark { index, point };

        if point.close > self.peak.point.close {
            let emitted = self
                .drawdown_start
                .and_then(|start| close_episode(start, self.trough, params.threshold_pct));
            let next = Self {
                peak: mark,
                trough: mark,
                drawdown_start: None,
            };
            return (next, emitted);
        }

        let mut next = self;
        if point.close < next.trough.point.close {
            next.trough = mark;
        }
        let trigger = self.peak.point.close * (1.0 - params.decline_trigger_pct / 100.0);
        if next.drawdown_start.is_none() && point.close < trigger {
            next.drawdown_start = Some(self.peak);
        }
        (next, None)
    }
}

/// Build the episode for a finished candidate if it reaches the threshold.
fn close_episode(start: Mark, trough: Mark, threshold_pct: f64) -> Option<DrawdownEpisode> {
    let peak_price = start.point.close;
    let trough_price = trough.point.close;
    let drawdown_pct = (trough_price - peak_price) / peak_price * 100.0;

    if drawdown_pct.abs() < threshold_pct {
        return None;
    }
    Some(DrawdownEpisode {
        peak_date: start.point.date,
        trough_date: trough.point.date,
        peak_price,
        trough_price,
        drawdown_pct,
        duration_days: (trough.point.date - start.point.date).num_days(),
    })
}

/// Find every closed drawdown episode of at least `params.threshold_pct`.
pub fn find_major_drawdowns(prices: &[PricePoint], params: &EpisodeParams) -> Vec<DrawdownEpisode> {
    let Some((first, rest)) = prices.split_first() else {
        return Vec::new();
    };

    let (state, episodes) = rest.iter().enumerate().fold(
        (ScanState::start(*first), Vec::new()),
        |(state, mut episodes), (offset, point)| {
            let (next, emitted) = state.step(offset + 1, *point, params);
            episodes.extend(emitted);
            (next, episodes)
        },
    );

    if let Some(start) = state.drawdown_start {
        debug!(
            peak_date = %start.point.date,
            trough_date = %state.trough.point.date,
            "drawdown still open at series end, not reported"
        );
    }
    debug!(episodes = episodes.len(), "episode scan complete");
    episodes
}
