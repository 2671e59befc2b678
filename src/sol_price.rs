/// SOL Price Service
///
/// Maintains a cached SOL/USD price for swap valuation across the backend.
/// Runs as a background task with a 30 s refresh cycle; providers are tried
/// in order until one returns a positive price. On total failure the last
/// known value is served, or the configured seed value on cold start.
use crate::apis::get_api_manager;
use crate::config::with_config;
use crate::logger::{self, LogTag};
use crate::shutdown::SHUTDOWN;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::sync::RwLock as StdRwLock;
use std::time::{Duration, Instant};
use tokio::time::interval;

// =============================================================================
// CONFIGURATION CONSTANTS
// =============================================================================

/// Cache expiry time in seconds (if the service stops updating)
const CACHE_EXPIRY_SECS: u64 = 300;

/// Maximum plausible single-step price change (anomaly rejection)
const MAX_PRICE_CHANGE_PERCENT: f64 = 50.0;

/// Minimum spacing between error log lines, per provider
const ERROR_LOG_INTERVAL_SECS: u64 = 60;

const WSOL_MINT: &str = crate::apis::solanatracker::WSOL_MINT;

// =============================================================================
// DATA STRUCTURES
// =============================================================================

/// Cached SOL price data with metadata
#[derive(Debug, Clone)]
pub struct SolPriceData {
    pub price_usd: f64,
    pub last_updated: Instant,
    pub is_valid: bool,
    pub source: &'static str,
    pub fetch_count: u64,
    pub error_count: u64,
}

impl Default for SolPriceData {
    fn default() -> Self {
        Self {
            price_usd: 0.0,
            last_updated: Instant::now(),
            is_valid: false,
            source: "uninitialized",
            fetch_count: 0,
            error_count: 0,
        }
    }
}

impl SolPriceData {
    /// Check if cached price is still fresh
    pub fn is_fresh(&self) -> bool {
        self.is_valid && self.last_updated.elapsed().as_secs() < CACHE_EXPIRY_SECS
    }

    pub fn age_seconds(&self) -> u64 {
        self.last_updated.elapsed().as_secs()
    }
}

// =============================================================================
// GLOBAL STATE
// =============================================================================

static SOL_PRICE_CACHE: Lazy<Arc<StdRwLock<SolPriceData>>> =
    Lazy::new(|| Arc::new(StdRwLock::new(SolPriceData::default())));

static SERVICE_RUNNING: Lazy<Arc<AtomicBool>> = Lazy::new(|| Arc::new(AtomicBool::new(false)));

/// Last error log time per provider, for rate-limited logging
static ERROR_LOG_TIMES: Lazy<StdRwLock<HashMap<&'static str, Instant>>> =
    Lazy::new(|| StdRwLock::new(HashMap::new()));

// =============================================================================
// PUBLIC API
// =============================================================================

/// Get the current SOL price, refreshing through the providers when stale
pub async fn get_price() -> f64 {
    {
        let cache = SOL_PRICE_CACHE.read().unwrap_or_else(|e| e.into_inner());
        let ttl = with_config(|cfg| cfg.sol_price.refresh_secs);
        if cache.is_valid && cache.last_updated.elapsed().as_secs() < ttl {
            return cache.price_usd;
        }
    }

    fetch_and_update(&mut 0).await;
    get_price_sync()
}

/// Get the cached SOL price without awaiting a refresh
///
/// Returns the last known value; on cold start, the configured seed.
pub fn get_price_sync() -> f64 {
    let cache = SOL_PRICE_CACHE.read().unwrap_or_else(|e| e.into_inner());
    if cache.price_usd > 0.0 {
        cache.price_usd
    } else {
        with_config(|cfg| cfg.sol_price.seed_price)
    }
}

/// Detailed SOL price information including metadata
pub fn get_price_info() -> SolPriceData {
    SOL_PRICE_CACHE
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
}

pub fn is_service_running() -> bool {
    SERVICE_RUNNING.load(Ordering::SeqCst)
}

// =============================================================================
// SERVICE LIFECYCLE
// =============================================================================

/// Start the SOL price service
///
/// Returns the JoinHandle so the runtime can wait for graceful shutdown.
pub fn start_service() -> tokio::task::JoinHandle<()> {
    logger::info(LogTag::SolPrice, "Starting SOL price service");
    SERVICE_RUNNING.store(true, Ordering::SeqCst);
    tokio::spawn(price_task())
}

// =============================================================================
// BACKGROUND TASK
// =============================================================================

async fn price_task() {
    let refresh_secs = with_config(|cfg| cfg.sol_price.refresh_secs);
    let mut price_interval = interval(Duration::from_secs(refresh_secs.max(1)));
    let mut consecutive_errors = 0u32;
    let shutdown = SHUTDOWN.notify();

    // Initial fetch before the first tick
    fetch_and_update(&mut consecutive_errors).await;

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                if SHUTDOWN.is_requested() {
                    logger::info(LogTag::SolPrice, "SOL price task shutdown requested");
                    break;
                }
            }
            _ = price_interval.tick() => {
                if SHUTDOWN.is_requested() {
                    break;
                }
                fetch_and_update(&mut consecutive_errors).await;
            }
        }
    }

    SERVICE_RUNNING.store(false, Ordering::SeqCst);
    logger::info(LogTag::SolPrice, "SOL price task completed");
}

// =============================================================================
// PRICE FETCHING LOGIC
// =============================================================================

/// Try each provider in order until a positive price is obtained
async fn fetch_and_update(consecutive_errors: &mut u32) {
    let apis = get_api_manager();

    // Provider order: metadata feed first, dashboard feed as fallback
    let providers: Vec<(&'static str, futures::future::BoxFuture<'static, Result<f64, String>>)> = vec![
        ("solanatracker", fetch_from_solanatracker(&apis)),
        ("birdeye", fetch_from_birdeye(&apis)),
    ];

    for (name, fut) in providers {
        match fut.await {
            Ok(price) if validate_price_change(price) => {
                update_cache(price, name);
                *consecutive_errors = 0;
                logger::debug(
                    LogTag::SolPrice,
                    &format!("SOL price updated: ${:.4} from {}", price, name),
                );
                return;
            }
            Ok(price) => {
                log_provider_error(
                    name,
                    &format!(
                        "price validation failed: ${:.4} (change >{}%)",
                        price, MAX_PRICE_CHANGE_PERCENT
                    ),
                );
            }
            Err(e) => {
                log_provider_error(name, &e);
            }
        }
    }

    // All providers failed; keep serving the last known value
    *consecutive_errors += 1;
    if let Ok(mut cache) = SOL_PRICE_CACHE.write() {
        cache.error_count += 1;
    }
}

fn fetch_from_solanatracker(
    apis: &Arc<crate::apis::ApiManager>,
) -> futures::future::BoxFuture<'static, Result<f64, String>> {
    let apis = apis.clone();
    Box::pin(async move {
        match apis.solanatracker.price(WSOL_MINT).await {
            Ok(Some(price)) => Ok(price),
            Ok(None) => Err("no price returned".to_string()),
            Err(e) => Err(e.to_string()),
        }
    })
}

fn fetch_from_birdeye(
    apis: &Arc<crate::apis::ApiManager>,
) -> futures::future::BoxFuture<'static, Result<f64, String>> {
    let apis = apis.clone();
    Box::pin(async move {
        let prices = apis
            .birdeye
            .multi_price(&[WSOL_MINT.to_string()])
            .await
            .map_err(|e| e.to_string())?;
        prices
            .get(WSOL_MINT)
            .copied()
            .ok_or_else(|| "no price returned".to_string())
    })
}

/// Reject implausible single-step jumps against the cached value
fn validate_price_change(new_price: f64) -> bool {
    if new_price <= 0.0 || !new_price.is_finite() {
        return false;
    }

    if let Ok(cache) = SOL_PRICE_CACHE.read() {
        if cache.is_valid && cache.price_usd > 0.0 {
            let change_percent = ((new_price - cache.price_usd) / cache.price_usd).abs() * 100.0;
            if change_percent > MAX_PRICE_CHANGE_PERCENT {
                return false;
            }
        }
    }

    true
}

fn update_cache(price: f64, source: &'static str) {
    if let Ok(mut cache) = SOL_PRICE_CACHE.write() {
        cache.price_usd = price;
        cache.last_updated = Instant::now();
        cache.is_valid = true;
        cache.source = source;
        cache.fetch_count += 1;
    }
}

/// Log a provider failure at most once per minute per provider
fn log_provider_error(provider: &'static str, message: &str) {
    let should_log = {
        let mut times = ERROR_LOG_TIMES.write().unwrap_or_else(|e| e.into_inner());
        match times.get(provider) {
            Some(last) if last.elapsed().as_secs() < ERROR_LOG_INTERVAL_SECS => false,
            _ => {
                times.insert(provider, Instant::now());
                true
            }
        }
    };

    if should_log {
        logger::warning(
            LogTag::SolPrice,
            &format!("SOL price provider {} failed: {}", provider, message),
        );
    }
}

// =============================================================================
// UTILITY FUNCTIONS
// =============================================================================

/// Service statistics line for diagnostics
pub fn get_stats() -> String {
    let cache = SOL_PRICE_CACHE.read().unwrap_or_else(|e| e.into_inner());
    format!(
        "SOL Price: ${:.4} | Age: {}s | Valid: {} | Source: {} | Fetches: {} | Errors: {} | Running: {}",
        cache.price_usd,
        cache.age_seconds(),
        cache.is_valid,
        cache.source,
        cache.fetch_count,
        cache.error_count,
        is_service_running()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cold_start_serves_seed_price() {
        // The global cache starts invalid with price 0.0
        let price = get_price_sync();
        assert!(price > 0.0);
    }

    #[test]
    fn rejects_nonsense_prices() {
        assert!(!validate_price_change(0.0));
        assert!(!validate_price_change(-1.0));
        assert!(!validate_price_change(f64::NAN));
        assert!(!validate_price_change(f64::INFINITY));
    }
}
