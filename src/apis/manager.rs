/// Global API manager singleton - single instance of all pull clients
///
/// Centralizes rate limiting and stats tracking per upstream. The push feed
/// client is not held here; it is a long-lived connection owned by the live
/// trade ingester.
use once_cell::sync::Lazy;
use std::sync::Arc;

use crate::config::get_config_clone;
use crate::logger::{self, LogTag};

use super::birdeye::{BirdeyeClient, TIMEOUT_SECS as BIRDEYE_TIMEOUT};
use super::coingecko::{CoinGeckoClient, TIMEOUT_SECS as COINGECKO_TIMEOUT};
use super::dexscreener::{DexScreenerClient, TIMEOUT_SECS as DEXSCREENER_TIMEOUT};
use super::solanatracker::{SolanaTrackerClient, TIMEOUT_SECS as SOLANATRACKER_TIMEOUT};

/// Global API manager - holds all pull clients with their rate limiters
pub struct ApiManager {
    pub solanatracker: SolanaTrackerClient,
    pub dexscreener: DexScreenerClient,
    pub birdeye: BirdeyeClient,
    pub coingecko: CoinGeckoClient,
}

impl ApiManager {
    fn new() -> Self {
        let cfg = get_config_clone();

        logger::info(LogTag::Api, "Initializing global API manager");

        let solanatracker =
            SolanaTrackerClient::new(&cfg.api_keys.metadata, SOLANATRACKER_TIMEOUT)
                .unwrap_or_else(|e| {
                    logger::warning(
                        LogTag::Api,
                        &format!("Failed to initialize SolanaTracker client: {} - using disabled client", e),
                    );
                    SolanaTrackerClient::new("", SOLANATRACKER_TIMEOUT)
                        .expect("Failed to create disabled SolanaTracker client")
                });

        let dexscreener = DexScreenerClient::new(DEXSCREENER_TIMEOUT)
            .expect("Failed to create DexScreener client");

        let birdeye = BirdeyeClient::new(&cfg.api_keys.dashboard, BIRDEYE_TIMEOUT)
            .unwrap_or_else(|e| {
                logger::warning(
                    LogTag::Api,
                    &format!("Failed to initialize Birdeye client: {} - using disabled client", e),
                );
                BirdeyeClient::new("", BIRDEYE_TIMEOUT)
                    .expect("Failed to create disabled Birdeye client")
            });

        let coingecko = CoinGeckoClient::new(&cfg.api_keys.supply, COINGECKO_TIMEOUT)
            .expect("Failed to create CoinGecko client");

        Self {
            solanatracker,
            dexscreener,
            birdeye,
            coingecko,
        }
    }
}

static API_MANAGER: Lazy<Arc<ApiManager>> = Lazy::new(|| Arc::new(ApiManager::new()));

/// Get the global API manager instance
pub fn get_api_manager() -> Arc<ApiManager> {
    API_MANAGER.clone()
}
