/// API statistics tracking
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub last_request_time: Option<DateTime<Utc>>,
    pub last_success_time: Option<DateTime<Utc>>,
    pub last_error_time: Option<DateTime<Utc>>,
    pub last_error_message: Option<String>,
    pub average_response_time_ms: f64,
}

/// Thread-safe API statistics tracker
pub struct ApiStatsTracker {
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
    last_request_time: Arc<RwLock<Option<DateTime<Utc>>>>,
    last_success_time: Arc<RwLock<Option<DateTime<Utc>>>>,
    last_error: Arc<RwLock<Option<(DateTime<Utc>, String)>>>,
    avg_response_time: Arc<RwLock<f64>>,
}

impl Default for ApiStatsTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiStatsTracker {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            successful_requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            last_request_time: Arc::new(RwLock::new(None)),
            last_success_time: Arc::new(RwLock::new(None)),
            last_error: Arc::new(RwLock::new(None)),
            avg_response_time: Arc::new(RwLock::new(0.0)),
        }
    }

    pub async fn record_request(&self, success: bool, response_time_ms: f64) {
        let now = Utc::now();
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        *self.last_request_time.write().await = Some(now);

        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
            *self.last_success_time.write().await = Some(now);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }

        // Running average over all requests
        let mut avg = self.avg_response_time.write().await;
        let total = self.total_requests.load(Ordering::Relaxed);
        let previous_total = (total - 1) as f64;
        let accumulated = *avg * previous_total;
        *avg = (accumulated + response_time_ms) / (total as f64);
    }

    pub async fn record_error(&self, error_message: String) {
        *self.last_error.write().await = Some((Utc::now(), error_message));
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.total_requests.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        self.successful_requests.load(Ordering::Relaxed) as f64 / total as f64
    }

    pub async fn get_stats(&self) -> ApiStats {
        let last_error = self.last_error.read().await.clone();
        ApiStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            last_request_time: *self.last_request_time.read().await,
            last_success_time: *self.last_success_time.read().await,
            last_error_time: last_error.as_ref().map(|(t, _)| *t),
            last_error_message: last_error.map(|(_, m)| m),
            average_response_time_ms: *self.avg_response_time.read().await,
        }
    }
}
