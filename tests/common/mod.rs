//! Series builders shared by the integration tests

#![allow(dead_code)]

use chrono::{Days, NaiveDate};

use rava_analytics::{PricePoint, RawPriceRecord};

/// `offset` days after 2024-01-01
pub fn day(offset: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Days::new(offset)
}

/// One point per consecutive day, open/high/low equal to the close
pub fn series(closes: &[f64]) -> Vec<PricePoint> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint {
            date: day(i as u64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 0,
        })
        .collect()
}

/// Close-only raw records on consecutive days
pub fn records(closes: &[f64]) -> Vec<RawPriceRecord> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| RawPriceRecord::close_only(day(i as u64).format("%Y-%m-%d").to_string(), c))
        .collect()
}
