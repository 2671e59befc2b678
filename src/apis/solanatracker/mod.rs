/// SolanaTracker data API client
///
/// Primary pull feed: token metadata, prices, pairs, cursor-paged swap
/// history, launchpad lists (new / graduating / graduated), bonding status,
/// and holder stats. Requires an API key; without one the client is
/// constructed disabled and every call fails fast as unavailable.
pub mod types;

pub use self::types::{
    BondingStatus, ChartCandle, HoldersResponse, LaunchpadItem, LaunchpadList, PoolDetail,
    PriceResponse, RawTrade, SwapPage, TokenResponse, TopHolderEntry, TradeLeg, WSOL_MINT,
};

use crate::apis::client::RateLimiter;
use crate::apis::stats::{ApiStats, ApiStatsTracker};
use crate::errors::{ApiError, ApiResult};
use crate::logger::{self, LogTag};
use crate::types::{HolderStats, Ohlcv, Timeframe, TopHolder};
use reqwest::Client;
use std::sync::Arc;

// ============================================================================
// API CONFIGURATION
// ============================================================================

const FEED: &'static str = "solanatracker";

const BASE_URL: &str = "https://data.solanatracker.io";

/// Request timeout in seconds; metadata endpoints are fast
pub const TIMEOUT_SECS: u64 = 10;

/// Rate limits per endpoint (requests per minute)
pub const RATE_LIMIT_PRICE_PER_MINUTE: usize = 300;
pub const RATE_LIMIT_TOKEN_PER_MINUTE: usize = 120;
pub const RATE_LIMIT_SWAPS_PER_MINUTE: usize = 300;
pub const RATE_LIMIT_LAUNCHPAD_PER_MINUTE: usize = 120;
pub const RATE_LIMIT_HOLDERS_PER_MINUTE: usize = 60;
pub const RATE_LIMIT_CHART_PER_MINUTE: usize = 120;

// ============================================================================
// CLIENT IMPLEMENTATION
// ============================================================================

pub struct SolanaTrackerClient {
    http: crate::apis::client::HttpClient,
    client: Client,
    api_key: String,
    stats: Arc<ApiStatsTracker>,
    enabled: bool,
    limiter_price: RateLimiter,
    limiter_token: RateLimiter,
    limiter_swaps: RateLimiter,
    limiter_launchpad: RateLimiter,
    limiter_holders: RateLimiter,
    limiter_chart: RateLimiter,
}

impl SolanaTrackerClient {
    pub fn new(api_key: &str, timeout_seconds: u64) -> ApiResult<Self> {
        let enabled = !api_key.is_empty();
        if !enabled {
            logger::warning(
                LogTag::Api,
                "[SOLANATRACKER] No API key configured; client disabled",
            );
        }

        let http = crate::apis::client::HttpClient::new(timeout_seconds)?;
        let client = http.client().clone();

        Ok(Self {
            http,
            client,
            api_key: api_key.to_string(),
            stats: Arc::new(ApiStatsTracker::new()),
            enabled,
            limiter_price: RateLimiter::new(RATE_LIMIT_PRICE_PER_MINUTE),
            limiter_token: RateLimiter::new(RATE_LIMIT_TOKEN_PER_MINUTE),
            limiter_swaps: RateLimiter::new(RATE_LIMIT_SWAPS_PER_MINUTE),
            limiter_launchpad: RateLimiter::new(RATE_LIMIT_LAUNCHPAD_PER_MINUTE),
            limiter_holders: RateLimiter::new(RATE_LIMIT_HOLDERS_PER_MINUTE),
            limiter_chart: RateLimiter::new(RATE_LIMIT_CHART_PER_MINUTE),
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
            .header("x-api-key", &self.api_key)
    }

    async fn get_json<T>(
        &self,
        builder: reqwest::RequestBuilder,
        limiter: &RateLimiter,
    ) -> ApiResult<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        self.ensure_enabled()?;

        let start = std::time::Instant::now();
        let result = self.http.get_json::<T>(FEED, builder, limiter).await;
        let elapsed = start.elapsed().as_millis() as f64;

        match &result {
            Ok(_) => self.stats.record_request(true, elapsed).await,
            Err(e) => {
                self.stats.record_request(false, elapsed).await;
                self.stats.record_error(e.to_string()).await;
            }
        }

        result
    }

    /// Current USD price of a token
    pub async fn price(&self, address: &str) -> ApiResult<Option<f64>> {
        let builder = self.request(&format!("price?token={}", address));
        let response: Option<PriceResponse> = self.get_json(builder, &self.limiter_price).await?;
        Ok(response.map(|p| p.price).filter(|p| *p > 0.0 && p.is_finite()))
    }

    /// Full token metadata with pools
    pub async fn token_metadata(&self, address: &str) -> ApiResult<Option<TokenResponse>> {
        let builder = self.request(&format!("tokens/{}", address));
        self.get_json(builder, &self.limiter_token).await
    }

    /// All pools for a token
    pub async fn token_pairs(&self, address: &str) -> ApiResult<Vec<PoolDetail>> {
        Ok(self
            .token_metadata(address)
            .await?
            .map(|t| t.pools)
            .unwrap_or_default())
    }

    /// One page of swap history, newest first
    ///
    /// `cursor` comes from the previous page's `next_cursor`.
    pub async fn token_swaps(
        &self,
        address: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> ApiResult<SwapPage> {
        let mut path = format!("trades/{}?limit={}&sortDirection=DESC", address, limit);
        if let Some(cursor) = cursor {
            path.push_str(&format!("&cursor={}", cursor));
        }

        let page: Option<SwapPage> = self
            .get_json(self.request(&path), &self.limiter_swaps)
            .await?;
        Ok(page.unwrap_or(SwapPage {
            trades: Vec::new(),
            next_cursor: None,
            has_next: false,
        }))
    }

    /// Launchpad category list (new / graduating / graduated)
    pub async fn launchpad_list(
        &self,
        list: LaunchpadList,
        limit: usize,
    ) -> ApiResult<Vec<LaunchpadItem>> {
        let path = format!("launchpad/{}?limit={}", list.path_segment(), limit);
        let items: Option<Vec<LaunchpadItem>> = self
            .get_json(self.request(&path), &self.limiter_launchpad)
            .await?;
        Ok(items.unwrap_or_default())
    }

    /// Bonding curve status for a single token
    pub async fn bonding_status(&self, address: &str) -> ApiResult<Option<BondingStatus>> {
        let builder = self.request(&format!("launchpad/status/{}", address));
        self.get_json(builder, &self.limiter_launchpad).await
    }

    /// Holder statistics (count and concentration)
    pub async fn holder_stats(&self, address: &str) -> ApiResult<Option<HoldersResponse>> {
        let builder = self.request(&format!("tokens/{}/holders", address));
        self.get_json(builder, &self.limiter_holders).await
    }

    /// Top holders by balance
    pub async fn top_holders(&self, address: &str) -> ApiResult<Vec<TopHolder>> {
        let builder = self.request(&format!("tokens/{}/holders/top", address));
        let entries: Option<Vec<TopHolderEntry>> =
            self.get_json(builder, &self.limiter_holders).await?;

        Ok(entries
            .unwrap_or_default()
            .into_iter()
            .map(|e| TopHolder {
                wallet: e.address,
                amount: e.amount,
                percent: e.percentage,
            })
            .collect())
    }

    /// Combined holder stats for the read service
    pub async fn holders(&self, address: &str) -> ApiResult<Option<HolderStats>> {
        let (stats, top) = tokio::join!(self.holder_stats(address), self.top_holders(address));
        let stats = stats?;
        let top = top.unwrap_or_default();

        Ok(stats.map(|s| HolderStats {
            holder_count: s.total,
            top10_percent: s.top10_percentage,
            top_holders: top,
        }))
    }

    /// OHLCV candles for a pool in `[from, to]` (epoch ms bounds)
    pub async fn pair_ohlcv(
        &self,
        pool_id: &str,
        timeframe: Timeframe,
        from_ms: i64,
        to_ms: i64,
    ) -> ApiResult<Vec<Ohlcv>> {
        let path = format!(
            "chart/{}?type={}&time_from={}&time_to={}",
            pool_id,
            timeframe.as_str(),
            from_ms / 1000,
            to_ms / 1000
        );

        let response: Option<types::ChartResponse> =
            self.get_json(self.request(&path), &self.limiter_chart).await?;

        let mut candles: Vec<Ohlcv> = response
            .map(|r| r.oclhv)
            .unwrap_or_default()
            .into_iter()
            .map(|c| Ohlcv {
                timestamp: c.time * 1000,
                open: c.open,
                high: c.high,
                low: c.low,
                close: c.close,
                volume: c.volume,
            })
            .filter(|c| c.is_valid())
            .collect();
        candles.sort_by_key(|c| c.timestamp);
        Ok(candles)
    }
}
