/// CoinGecko API client
///
/// Supply feed: circulating/total supply by coin id. Optional API key raises
/// the rate budget; without one the client still works on the public tier.
pub mod types;

pub use self::types::CoinSupply;

use crate::apis::client::{HttpClient, RateLimiter};
use crate::apis::stats::{ApiStats, ApiStatsTracker};
use crate::errors::ApiResult;
use crate::logger::{self, LogTag};
use reqwest::Client;
use std::sync::Arc;

// ============================================================================
// API CONFIGURATION
// ============================================================================

const FEED: &str = "coingecko";

const BASE_URL: &str = "https://api.coingecko.com/api/v3";

pub const TIMEOUT_SECS: u64 = 10;

/// Public tier is 10-30/min; keyed tier is 500/min
pub const RATE_LIMIT_PUBLIC_PER_MINUTE: usize = 10;
pub const RATE_LIMIT_KEYED_PER_MINUTE: usize = 300;

// ============================================================================
// CLIENT IMPLEMENTATION
// ============================================================================

pub struct CoinGeckoClient {
    http: HttpClient,
    client: Client,
    api_key: String,
    stats: Arc<ApiStatsTracker>,
    limiter: RateLimiter,
}

impl CoinGeckoClient {
    pub fn new(api_key: &str, timeout_seconds: u64) -> ApiResult<Self> {
        let http = HttpClient::new(timeout_seconds)?;
        let client = http.client().clone();
        let limit = if api_key.is_empty() {
            RATE_LIMIT_PUBLIC_PER_MINUTE
        } else {
            RATE_LIMIT_KEYED_PER_MINUTE
        };

        Ok(Self {
            http,
            client,
            api_key: api_key.to_string(),
            stats: Arc::new(ApiStatsTracker::new()),
            limiter: RateLimiter::new(limit),
        })
    }

    pub async fn get_stats(&self) -> ApiStats {
        self.stats.get_stats().await
    }

    /// Supply numbers for a coin id (e.g. "solana")
    pub async fn supply(&self, coin_id: &str) -> ApiResult<Option<CoinSupply>> {
        let url = format!(
            "{}/coins/{}?localization=false&tickers=false&community_data=false&developer_data=false",
            BASE_URL, coin_id
        );

        logger::debug(
            LogTag::Api,
            &format!("[COINGECKO] Fetching supply: coin={}", coin_id),
        );

        let mut builder = self.client.get(&url);
        if !self.api_key.is_empty() {
            builder = builder.header("x-cg-demo-api-key", &self.api_key);
        }

        let start = std::time::Instant::now();
        let result = self
            .http
            .get_json::<types::CoinResponse>(FEED, builder, &self.limiter)
            .await;
        let elapsed = start.elapsed().as_millis() as f64;

        match result {
            Ok(response) => {
                self.stats.record_request(true, elapsed).await;
                Ok(response.map(|r| CoinSupply {
                    coin_id: r.id,
                    circulating_supply: r.market_data.circulating_supply.unwrap_or(0.0),
                    total_supply: r.market_data.total_supply,
                    max_supply: r.market_data.max_supply,
                }))
            }
            Err(e) => {
                self.stats.record_request(false, elapsed).await;
                self.stats.record_error(e.to_string()).await;
                Err(e)
            }
        }
    }
}
