/// DexScreener API client
///
/// Keyless pairs feed used as the second hop of the token-detail fallback
/// chain and for text search.
///
/// Endpoints:
/// 1. /token-pairs/v1/{chainId}/{tokenAddress} - all pools for a token
/// 2. /latest/dex/search?q={query} - search pairs
pub mod types;

pub use self::types::{DexScreenerPairRaw, DexScreenerToken, PairsResponse};

use crate::apis::client::{HttpClient, RateLimiter};
use crate::apis::stats::{ApiStats, ApiStatsTracker};
use crate::errors::ApiResult;
use crate::logger::{self, LogTag};
use reqwest::Client;
use std::sync::Arc;

// ============================================================================
// API CONFIGURATION
// ============================================================================

const FEED: &str = "dexscreener";

const BASE_URL: &str = "https://api.dexscreener.com";

/// Default chain for all lookups
const DEFAULT_CHAIN_ID: &str = "solana";

pub const TIMEOUT_SECS: u64 = 10;

pub const RATE_LIMIT_TOKEN_PAIRS_PER_MINUTE: usize = 300;
pub const RATE_LIMIT_SEARCH_PER_MINUTE: usize = 300;

// ============================================================================
// CLIENT IMPLEMENTATION
// ============================================================================

pub struct DexScreenerClient {
    http: HttpClient,
    client: Client,
    stats: Arc<ApiStatsTracker>,
    limiter_token_pairs: RateLimiter,
    limiter_search: RateLimiter,
}

impl DexScreenerClient {
    pub fn new(timeout_seconds: u64) -> ApiResult<Self> {
        let http = HttpClient::new(timeout_seconds)?;
        let client = http.client().clone();

        Ok(Self {
            http,
            client,
            stats: Arc::new(ApiStatsTracker::new()),
            limiter_token_pairs: RateLimiter::new(RATE_LIMIT_TOKEN_PAIRS_PER_MINUTE),
            limiter_search: RateLimiter::new(RATE_LIMIT_SEARCH_PER_MINUTE),
        })
    }

    pub async fn get_stats(&self) -> ApiStats {
        self.stats.get_stats().await
    }

    async fn get_json<T>(
        &self,
        builder: reqwest::RequestBuilder,
        limiter: &RateLimiter,
    ) -> ApiResult<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
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

    /// All pools for a single token address, most liquid first
    pub async fn pairs_by_token(&self, token_address: &str) -> ApiResult<Vec<DexScreenerPairRaw>> {
        let url = format!(
            "{}/token-pairs/v1/{}/{}",
            BASE_URL, DEFAULT_CHAIN_ID, token_address
        );

        logger::debug(
            LogTag::Api,
            &format!("[DEXSCREENER] Fetching token pairs: token={}", token_address),
        );

        let pairs: Option<Vec<DexScreenerPairRaw>> = self
            .get_json(self.client.get(&url), &self.limiter_token_pairs)
            .await?;

        let mut pairs = pairs.unwrap_or_default();
        pairs.sort_by(|a, b| {
            let la = a.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0);
            let lb = b.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0);
            lb.partial_cmp(&la).unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(pairs)
    }

    /// Search for pairs by token name, symbol, or address
    pub async fn search(&self, query: &str) -> ApiResult<Vec<DexScreenerPairRaw>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/latest/dex/search", BASE_URL);

        logger::debug(
            LogTag::Api,
            &format!("[DEXSCREENER] Searching pairs: query={}", query),
        );

        let builder = self.client.get(&url).query(&[("q", query)]);
        let response: Option<PairsResponse> = self.get_json(builder, &self.limiter_search).await?;

        Ok(response
            .map(|r| {
                r.pairs
                    .into_iter()
                    .filter(|p| p.chain_id == DEFAULT_CHAIN_ID)
                    .collect()
            })
            .unwrap_or_default())
    }
}
