/// Birdeye API client
///
/// Dashboard-side feed: token overview, upstream OHLCV for curated tokens,
/// batched prices, and the trending list that seeds the curated dashboard.
/// Requires an API key; without one the client is constructed disabled.
pub mod types;

pub use self::types::{MultiPriceItem, OhlcvItem, TokenOverview, TrendingToken};

use crate::apis::client::{HttpClient, RateLimiter};
use crate::apis::stats::{ApiStats, ApiStatsTracker};
use crate::errors::{ApiError, ApiResult};
use crate::logger::{self, LogTag};
use crate::types::{Ohlcv, Timeframe};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;

// ============================================================================
// API CONFIGURATION
// ============================================================================

const FEED: &str = "birdeye";

const BASE_URL: &str = "https://public-api.birdeye.so";

const DEFAULT_CHAIN: &str = "solana";

pub const TIMEOUT_SECS: u64 = 10;

pub const RATE_LIMIT_OVERVIEW_PER_MINUTE: usize = 120;
pub const RATE_LIMIT_OHLCV_PER_MINUTE: usize = 120;
pub const RATE_LIMIT_MULTI_PRICE_PER_MINUTE: usize = 60;
pub const RATE_LIMIT_TRENDING_PER_MINUTE: usize = 30;

/// Maximum addresses per multi-price request
const MAX_MULTI_PRICE_ADDRESSES: usize = 100;

// ============================================================================
// CLIENT IMPLEMENTATION
// ============================================================================

pub struct BirdeyeClient {
    http: HttpClient,
    client: Client,
    api_key: String,
    stats: Arc<ApiStatsTracker>,
    enabled: bool,
    limiter_overview: RateLimiter,
    limiter_ohlcv: RateLimiter,
    limiter_multi_price: RateLimiter,
    limiter_trending: RateLimiter,
}

impl BirdeyeClient {
    pub fn new(api_key: &str, timeout_seconds: u64) -> ApiResult<Self> {
        let enabled = !api_key.is_empty();
        if !enabled {
            logger::warning(LogTag::Api, "[BIRDEYE] No API key configured; client disabled");
        }

        let http = HttpClient::new(timeout_seconds)?;
        let client = http.client().clone();

        Ok(Self {
            http,
            client,
            api_key: api_key.to_string(),
            stats: Arc::new(ApiStatsTracker::new()),
            enabled,
            limiter_overview: RateLimiter::new(RATE_LIMIT_OVERVIEW_PER_MINUTE),
            limiter_ohlcv: RateLimiter::new(RATE_LIMIT_OHLCV_PER_MINUTE),
            limiter_multi_price: RateLimiter::new(RATE_LIMIT_MULTI_PRICE_PER_MINUTE),
            limiter_trending: RateLimiter::new(RATE_LIMIT_TRENDING_PER_MINUTE),
        })
    }

    pub async fn get_stats(&self) -> ApiStats {
        self.stats.get_stats().await
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn ensure_enabled(&self) -> ApiResult<()> {
        if self.enabled {
            Ok(())
        } else {
            Err(ApiError::Disabled { feed: FEED })
        }
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}/{}", BASE_URL, path))
            .header("X-API-KEY", &self.api_key)
            .header("x-chain", DEFAULT_CHAIN)
    }

    async fn get_data<T>(
        &self,
        builder: reqwest::RequestBuilder,
        limiter: &RateLimiter,
    ) -> ApiResult<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        self.ensure_enabled()?;

        let start = std::time::Instant::now();
        let result = self
            .http
            .get_json::<types::Envelope<T>>(FEED, builder, limiter)
            .await;
        let elapsed = start.elapsed().as_millis() as f64;

        match result {
            Ok(envelope) => {
                self.stats.record_request(true, elapsed).await;
                Ok(envelope.and_then(|e| e.data))
            }
            Err(e) => {
                self.stats.record_request(false, elapsed).await;
                self.stats.record_error(e.to_string()).await;
                Err(e)
            }
        }
    }

    /// Token overview: display info plus the current market columns
    pub async fn token_overview(&self, address: &str) -> ApiResult<Option<TokenOverview>> {
        let builder = self.request(&format!("defi/token_overview?address={}", address));
        self.get_data(builder, &self.limiter_overview).await
    }

    /// OHLCV candles in `[from, to]` (epoch ms bounds)
    pub async fn ohlcv(
        &self,
        address: &str,
        timeframe: Timeframe,
        from_ms: i64,
        to_ms: i64,
    ) -> ApiResult<Vec<Ohlcv>> {
        let path = format!(
            "defi/ohlcv?address={}&type={}&time_from={}&time_to={}",
            address,
            birdeye_interval(timeframe),
            from_ms / 1000,
            to_ms / 1000
        );

        logger::debug(
            LogTag::Api,
            &format!(
                "[BIRDEYE] Fetching OHLCV: token={}, tf={}",
                address, timeframe
            ),
        );

        let data: Option<types::OhlcvData> =
            self.get_data(self.request(&path), &self.limiter_ohlcv).await?;

        let mut candles: Vec<Ohlcv> = data
            .map(|d| d.items)
            .unwrap_or_default()
            .into_iter()
            .map(|i| Ohlcv {
                timestamp: i.unix_time * 1000,
                open: i.o,
                high: i.h,
                low: i.l,
                close: i.c,
                volume: i.v,
            })
            .filter(|c| c.is_valid())
            .collect();
        candles.sort_by_key(|c| c.timestamp);
        Ok(candles)
    }

    /// Current prices for up to 100 addresses in one call
    pub async fn multi_price(&self, addresses: &[String]) -> ApiResult<HashMap<String, f64>> {
        if addresses.is_empty() {
            return Ok(HashMap::new());
        }
        if addresses.len() > MAX_MULTI_PRICE_ADDRESSES {
            return Err(ApiError::BadResponse {
                feed: FEED,
                message: format!(
                    "Too many addresses: {} (max {})",
                    addresses.len(),
                    MAX_MULTI_PRICE_ADDRESSES
                ),
            });
        }

        let path = format!("defi/multi_price?list_address={}", addresses.join(","));
        let data: Option<HashMap<String, Option<MultiPriceItem>>> = self
            .get_data(self.request(&path), &self.limiter_multi_price)
            .await?;

        Ok(data
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(addr, item)| item.map(|i| (addr, i.value)))
            .filter(|(_, price)| *price > 0.0 && price.is_finite())
            .collect())
    }

    /// Trending tokens; seeds the curated dashboard list
    pub async fn trending(&self, limit: usize) -> ApiResult<Vec<TrendingToken>> {
        let path = format!(
            "defi/token_trending?sort_by=rank&sort_type=asc&limit={}",
            limit.min(100)
        );
        let data: Option<types::TrendingData> = self
            .get_data(self.request(&path), &self.limiter_trending)
            .await?;
        Ok(data.map(|d| d.tokens).unwrap_or_default())
    }
}

/// Map internal timeframes to Birdeye interval labels
fn birdeye_interval(timeframe: Timeframe) -> &'static str {
    match timeframe {
        Timeframe::Second1 => "1m", // upstream has no 1s; callers use swap-derived data
        Timeframe::Minute1 => "1m",
        Timeframe::Minute5 => "5m",
        Timeframe::Minute15 => "15m",
        Timeframe::Hour1 => "1H",
        Timeframe::Hour4 => "4H",
        Timeframe::Day1 => "1D",
        Timeframe::Week1 => "1W",
        Timeframe::Month1 => "1M",
    }
}
