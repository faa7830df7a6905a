//! In-memory TTL cache of analysis reports.
//!
//! Lives outside the pipeline: a report is a pure function of its inputs, so a
//! cached copy is only ever a shortcut, never a source of truth.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;

use crate::source::resolve_symbol;
use crate::types::AnalysisReport;

/// Cache key: resolved symbol plus optional start date
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub symbol: String,
    pub start: Option<NaiveDate>,
}

impl CacheKey {
    pub fn new(symbol: &str, start: Option<NaiveDate>) -> Self {
        Self {
            symbol: resolve_symbol(symbol),
            start,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    report: Arc<AnalysisReport>,
    expires_at: Instant,
}

#[derive(Debug)]
struct CacheInner {
    map: HashMap<CacheKey, CacheEntry>,
    ttl: Duration,
}

/// Thread-safe report cache with a single time-to-live.
#[derive(Debug, Clone)]
pub struct ReportCache {
    inner: Arc<tokio::sync::RwLock<CacheInner>>,
}

impl ReportCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(CacheInner {
                map: HashMap::new(),
                ttl,
            })),
        }
    }

    /// One hour TTL
    pub fn with_default_ttl() -> Self {
        Self::new(Duration::from_secs(3600))
    }

    /// Cached report for `key` if present and not expired
    pub async fn get(&self, key: &CacheKey) -> Option<Arc<AnalysisReport>> {
        let store = self.inner.read().await;
        store
            .map
            .get(key)
            .filter(|entry| Instant::now() <= entry.expires_at)
            .map(|entry| Arc::clone(&entry.report))
    }

    /// Store a report. A zero TTL disables caching.
    pub async fn put(&self, key: CacheKey, report: Arc<AnalysisReport>) {
        let mut store = self.inner.write().await;
        if store.ttl == Duration::ZERO {
            return;
        }
        let expires_at = Instant::now() + store.ttl;
        store.map.insert(key, CacheEntry { report, expires_at });
    }

    /// Drop expired entries
    pub async fn clear_expired(&self) {
        let mut store = self.inner.write().await;
        let now = Instant::now();
        store.map.retain(|_, entry| entry.expires_at > now);
    }

    /// Number of entries, including expired ones
    pub async fn len(&self) -> usize {
        self.inner.read().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
