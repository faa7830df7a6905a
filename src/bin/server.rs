//! RAVA analysis server
//!
//! Reads parquet files from PARQUET_DIR and serves analysis reports as JSON.
//!
//! Run: PARQUET_DIR=data/ticker_parquet cargo run --release --bin server
//! Test: curl "http://localhost:3040/analyze/SPY?start=2010-01-01"

use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rava_analytics::cache::{CacheKey, ReportCache};
use rava_analytics::frame::write_csv;
use rava_analytics::{
    analyze_records, analyze_symbol, AnalysisConfig, AnalysisError, AnalysisReport, DrawdownEpisode, ParquetSource,
    RawPriceRecord, RecoveryRecord, RiskMetrics,
};

// ============================================================================
// State & Config
// ============================================================================

struct AppState {
    source: ParquetSource,
    cache: ReportCache,
    config: AnalysisConfig,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

// ============================================================================
// Errors
// ============================================================================

enum ApiError {
    Analysis(AnalysisError),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        Self::Analysis(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Analysis(err) => {
                let status = match &err {
                    AnalysisError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
                    e if e.is_data_unavailable() => StatusCode::NOT_FOUND,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.to_string())
            }
            Self::Internal(message) => {
                error!(%message, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
struct AnalyzeQuery {
    start: Option<NaiveDate>,
}

#[derive(Deserialize)]
struct AnalyzeRequest {
    symbol: Option<String>,
    records: Vec<RawPriceRecord>,
    config: Option<AnalysisConfig>,
}

#[derive(Serialize)]
struct TickerListResponse {
    tickers: Vec<String>,
    count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    symbol: Option<String>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    trading_days: usize,
    metrics: RiskMetrics,
    episodes: Vec<DrawdownEpisode>,
    recoveries: Vec<RecoveryRecord>,
    compute_ms: f64,
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_tickers(State(state): State<Arc<AppState>>) -> Json<TickerListResponse> {
    let tickers = state.source.symbols();
    let count = tickers.len();
    Json(TickerListResponse { tickers, count })
}

/// Cached report for a symbol, computed on a blocking thread on a miss
async fn cached_report(
    state: &Arc<AppState>,
    symbol: String,
    start: Option<NaiveDate>,
) -> Result<Arc<AnalysisReport>, ApiError> {
    let key = CacheKey::new(&symbol, start);
    if let Some(report) = state.cache.get(&key).await {
        info!(symbol = %key.symbol, "cache hit");
        return Ok(report);
    }

    let task_state = Arc::clone(state);
    let report = tokio::task::spawn_blocking(move || {
        analyze_symbol(&task_state.source, &symbol, start, &task_state.config)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    let report = Arc::new(report);
    state.cache.put(key, Arc::clone(&report)).await;
    Ok(report)
}

async fn analyze_ticker(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
    Query(query): Query<AnalyzeQuery>,
) -> Result<Json<Arc<AnalysisReport>>, ApiError> {
    Ok(Json(cached_report(&state, ticker, query.start).await?))
}

async fn summarize_ticker(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
    Query(query): Query<AnalyzeQuery>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let started = Instant::now();
    let report = cached_report(&state, ticker, query.start).await?;
    Ok(Json(SummaryResponse {
        symbol: report.symbol.clone(),
        start_date: report.start_date,
        end_date: report.end_date,
        trading_days: report.trading_days,
        metrics: report.metrics,
        episodes: report.episodes.clone(),
        recoveries: report.recoveries.clone(),
        compute_ms: started.elapsed().as_secs_f64() * 1000.0,
    }))
}

async fn ticker_csv(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
    Query(query): Query<AnalyzeQuery>,
) -> Result<Response, ApiError> {
    let report = cached_report(&state, ticker, query.start).await?;
    let mut body = Vec::new();
    write_csv(&report, &mut body).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "text/csv")], body).into_response())
}

/// Analyse records posted by the client. Not cached.
async fn analyze_posted(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisReport>, ApiError> {
    let config = req.config.unwrap_or_else(|| state.config.clone());
    let report = tokio::task::spawn_blocking(move || analyze_records(&req.records, req.symbol.as_deref(), &config))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(report))
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let parquet_dir = env_or("PARQUET_DIR", "data/ticker_parquet");
    let addr: SocketAddr = env_or("RAVA_ADDR", "127.0.0.1:3040").parse()?;
    let ttl = Duration::from_secs(env_or("RAVA_CACHE_TTL_SECS", "3600").parse()?);

    let config = AnalysisConfig::default().with_env_overrides()?;
    config.validate()?;

    let state = Arc::new(AppState {
        source: ParquetSource::new(&parquet_dir),
        cache: ReportCache::new(ttl),
        config,
    });

    let sweeper = state.cache.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            sweeper.clear_expired().await;
        }
    });

    let app = Router::new()
        .route("/tickers", get(list_tickers))
        .route("/analyze", axum::routing::post(analyze_posted))
        .route("/analyze/{ticker}", get(analyze_ticker))
        .route("/analyze/{ticker}/summary", get(summarize_ticker))
        .route("/analyze/{ticker}/csv", get(ticker_csv))
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024))
        .with_state(state);

    info!(%parquet_dir, cache_ttl_secs = ttl.as_secs(), "starting");
    println!("RAVA server on http://{}", addr);
    println!("  GET  /tickers                  - list tickers");
    println!("  GET  /analyze/:ticker          - full report (?start=YYYY-MM-DD)");
    println!("  GET  /analyze/:ticker/summary  - metrics, episodes, recoveries");
    println!("  GET  /analyze/:ticker/csv      - download table");
    println!("  POST /analyze                  - analyse posted records");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
