// src/frame.rs
// Polars view of the aligned analysis table, for export

use std::io::Write;

use polars::prelude::*;

use crate::types::AnalysisReport;

/// Column name for a volatility window
pub fn volatility_column(window: usize) -> String {
    format!("volatility_{}d", window)
}

/// The full aligned table as a DataFrame, one row per price date.
///
/// Undefined returns and volatilities are nulls.
pub fn report_frame(report: &AnalysisReport) -> PolarsResult<DataFrame> {
    let rows = &report.rows;

    let mut columns = vec![
        Column::new(
            "date".into(),
            rows.iter().map(|r| r.date.format("%Y-%m-%d").to_string()).collect::<Vec<_>>(),
        ),
        Column::new("open".into(), rows.iter().map(|r| r.open).collect::<Vec<_>>()),
        Column::new("high".into(), rows.iter().map(|r| r.high).collect::<Vec<_>>()),
        Column::new("low".into(), rows.iter().map(|r| r.low).collect::<Vec<_>>()),
        Column::new("close".into(), rows.iter().map(|r| r.close).collect::<Vec<_>>()),
        Column::new("volume".into(), rows.iter().map(|r| r.volume).collect::<Vec<_>>()),
        Column::new(
            "daily_return".into(),
            rows.iter().map(|r| r.daily_return).collect::<Vec<_>>(),
        ),
    ];

    for &window in &report.config.volatility_windows {
        columns.push(Column::new(
            volatility_column(window).into(),
            rows.iter().map(|r| r.volatility(window)).collect::<Vec<_>>(),
        ));
    }

    columns.extend([
        Column::new("drawdown_pct".into(), rows.iter().map(|r| r.drawdown_pct).collect::<Vec<_>>()),
        Column::new("running_peak".into(), rows.iter().map(|r| r.running_peak).collect::<Vec<_>>()),
        Column::new(
            "running_min_drawdown".into(),
            rows.iter().map(|r| r.running_min_drawdown).collect::<Vec<_>>(),
        ),
    ]);

    DataFrame::new(columns)
}

/// Write the download view (date, close, daily return, longest-window
/// volatility, drawdown) as CSV.
pub fn write_csv<W: Write>(report: &AnalysisReport, writer: W) -> PolarsResult<()> {
    let frame = report_frame(report)?;
    let mut selected = frame.select([
        "date".to_string(),
        "close".to_string(),
        "daily_return".to_string(),
        volatility_column(report.config.largest_window()),
        "drawdown_pct".to_string(),
    ])?;
    CsvWriter::new(writer).include_header(true).finish(&mut selected)
}

/// Write the full table as parquet
pub fn write_parquet<W: Write>(report: &AnalysisReport, writer: W) -> PolarsResult<u64> {
    let mut frame = report_frame(report)?;
    ParquetWriter::new(writer).finish(&mut frame)
}
