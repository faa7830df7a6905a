//! Series normalization
//!
//! Turns raw, possibly irregular price records into a chronologically ordered
//! daily series with unique dates and a usable close on every point.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::types::{PricePoint, RawPriceRecord};

/// Documented inception dates of well-known indices. Records dated earlier
/// are dropped for these symbols.
const INDEX_INCEPTIONS: &[(&str, (i32, u32, u32))] = &[("^GSPC", (1957, 3, 4))];

/// First valid date for `symbol`, if it is a known index.
///
/// The caret prefix is optional: `GSPC` and `^gspc` both match.
pub fn inception_floor(symbol: &str) -> Option<NaiveDate> {
    let bare = symbol.trim_start_matches('^');
    INDEX_INCEPTIONS
        .iter()
        .find(|(s, _)| s.trim_start_matches('^').eq_ignore_ascii_case(bare))
        .and_then(|&(_, (y, m, d))| NaiveDate::from_ymd_opt(y, m, d))
}

/// Parse a record date. Accepts `YYYY-MM-DD`, RFC 3339 timestamps and
/// `YYYY-MM-DD HH:MM:SS`; the time of day is discarded.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|dt| dt.date())
}

/// Convert one raw record, or `None` when it has no usable date or close.
fn to_price_point(raw: &RawPriceRecord) -> Option<PricePoint> {
    let date = raw.date.as_deref().and_then(parse_date)?;
    let close = raw
        .adj_close
        .filter(|c| c.is_finite() && *c > 0.0)
        .or(raw.close)
        .filter(|c| c.is_finite() && *c > 0.0)?;

    let or_close = |v: Option<f64>| v.filter(|x| x.is_finite()).unwrap_or(close);
    let volume = raw
        .volume
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.round() as u64)
        .unwrap_or(0);

    Some(PricePoint {
        date,
        open: or_close(raw.open),
        high: or_close(raw.high),
        low: or_close(raw.low),
        close,
        volume,
    })
}

/// Normalize raw records into a clean daily series.
///
/// Records without a parseable date or a positive close are dropped, later
/// duplicates of a date replace earlier ones, missing OHLC fields take the
/// close and missing volume becomes zero. When `symbol` names a known index,
/// records before its inception are excluded.
///
/// Returns [`AnalysisError::EmptySeries`] if nothing survives.
pub fn normalize(raw: &[RawPriceRecord], symbol: Option<&str>) -> Result<Vec<PricePoint>> {
    let floor = symbol.and_then(inception_floor);

    let mut by_date: BTreeMap<NaiveDate, PricePoint> = BTreeMap::new();
    let mut dropped = 0usize;
    for record in raw {
        match to_price_point(record) {
            Some(point) if floor.map_or(true, |f| point.date >= f) => {
                by_date.insert(point.date, point);
            }
            _ => dropped += 1,
        }
    }

    let points: Vec<PricePoint> = by_date.into_values().collect();
    debug!(
        raw = raw.len(),
        kept = points.len(),
        dropped,
        "normalized price series"
    );

    if points.is_empty() {
        return Err(AnalysisError::EmptySeries);
    }
    Ok(points)
}
