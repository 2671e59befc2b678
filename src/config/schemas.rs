/// Configuration schemas - all config structures defined once with defaults
///
/// Each struct is defined with the config_struct! macro: single-source
/// definition, embedded defaults, serde support.
use crate::config_struct;

// ============================================================================
// DATABASE CONFIGURATION
// ============================================================================

config_struct! {
    /// SQLite storage configuration
    pub struct DatabaseConfig {
        /// Path to the SQLite database file
        path: String = "data/pulseboard.db".to_string(),

        /// Connection pool size hint (rusqlite serializes through one
        /// connection; kept for parity with managed deployments)
        pool_size: u32 = 10,
    }
}

// ============================================================================
// KV CACHE CONFIGURATION
// ============================================================================

config_struct! {
    /// Short-TTL string cache fronting the read services
    pub struct KvCacheConfig {
        /// Optional remote backend URL; only the in-memory backend ships,
        /// a configured URL is logged and ignored
        url: String = String::new(),

        /// Default TTL for entries inserted without an explicit TTL
        default_ttl_secs: u64 = 30,

        /// Maximum entries before LRU eviction
        max_entries: usize = 10_000,
    }
}

// ============================================================================
// API KEYS
// ============================================================================

config_struct! {
    /// Upstream API credentials; an empty string disables that client
    pub struct ApiKeysConfig {
        metadata: String = String::new(),
        dashboard: String = String::new(),
        supply: String = String::new(),
    }
}

// ============================================================================
// PULSE SYNC CONFIGURATION
// ============================================================================

config_struct! {
    /// Pulse feed sync engine configuration
    pub struct PulseConfig {
        sync_interval_ms: u64 = 5_000,

        // Graduating classification window, USD market cap, half-open upper bound
        graduation_mc_min_usd: f64 = 10_000.0,
        graduation_mc_max_usd: f64 = 69_000.0,

        /// SOL market cap at which a NEW token is promoted to GRADUATING
        /// in memory from push trade events
        graduation_proximity_sol_mc: f64 = 400.0,

        // Stale-row expiry windows
        ttl_new_hours: i64 = 24,
        ttl_graduating_hours: i64 = 48,
        ttl_graduated_days: i64 = 7,

        // Feed list sizes per category
        new_list_limit: usize = 50,
        graduating_list_limit: usize = 100,
        graduated_list_limit: usize = 50,

        /// Historical backfills scheduled per tick (K_init)
        init_sync_limit: usize = 5,

        /// Tail syncs scheduled per tick (K_tail)
        tail_sync_limit: usize = 20,

        /// Orphan cleanup cadence and batch size
        orphan_cleanup_interval_secs: u64 = 300,
        orphan_cleanup_batch: usize = 10,
    }
}

// ============================================================================
// DASHBOARD CONFIGURATION
// ============================================================================

config_struct! {
    /// Curated dashboard token sync configuration
    pub struct DashboardConfig {
        sync_interval_ms: u64 = 60_000,

        /// Number of trending tokens kept on the curated list
        list_size: usize = 100,
    }
}

// ============================================================================
// SWAP SYNC CONFIGURATION
// ============================================================================

config_struct! {
    /// Historical backfill and tail sync configuration
    pub struct SwapSyncConfig {
        max_pages: usize = 200,
        page_size: usize = 100,

        /// Batch size for swap inserts
        insert_batch: usize = 100,
    }
}

// ============================================================================
// CANDLE CACHE CONFIGURATION
// ============================================================================

config_struct! {
    /// Candle cache engine configuration
    pub struct CandlesConfig {
        /// Minimum age before the live candle is refetched
        live_refresh_ms: i64 = 300_000,

        /// Upsert chunk size
        write_chunk: usize = 100,
    }
}

// ============================================================================
// IMAGE / LOGO FETCH CONFIGURATION
// ============================================================================

config_struct! {
    /// IPFS gateway fallback chain for logo resolution
    pub struct ImagesConfig {
        gateways: Vec<String> = vec![
            "https://ipfs.io/ipfs/".to_string(),
            "https://cloudflare-ipfs.com/ipfs/".to_string(),
            "https://gateway.pinata.cloud/ipfs/".to_string(),
        ],
        timeout_ms: u64 = 10_000,

        /// Retries per gateway before moving to the next
        retries_per_gateway: u32 = 2,
    }
}

// ============================================================================
// SOL PRICE SERVICE CONFIGURATION
// ============================================================================

config_struct! {
    /// SOL/USD price service configuration
    pub struct SolPriceConfig {
        refresh_secs: u64 = 30,

        /// Cold-start value returned until the first successful fetch
        seed_price: f64 = 150.0,
    }
}

// ============================================================================
// SERVER CONFIGURATION
// ============================================================================

config_struct! {
    /// WebSocket gateway configuration
    pub struct ServerConfig {
        host: String = "127.0.0.1".to_string(),
        port: u16 = 8090,
    }
}

// ============================================================================
// ROOT CONFIGURATION
// ============================================================================

config_struct! {
    /// Root configuration combining all sections
    pub struct Config {
        database: DatabaseConfig = DatabaseConfig::default(),
        kv_cache: KvCacheConfig = KvCacheConfig::default(),
        api_keys: ApiKeysConfig = ApiKeysConfig::default(),
        pulse: PulseConfig = PulseConfig::default(),
        dashboard: DashboardConfig = DashboardConfig::default(),
        swap_sync: SwapSyncConfig = SwapSyncConfig::default(),
        candles: CandlesConfig = CandlesConfig::default(),
        images: ImagesConfig = ImagesConfig::default(),
        sol_price: SolPriceConfig = SolPriceConfig::default(),
        server: ServerConfig = ServerConfig::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Config::default();
        assert_eq!(cfg.pulse.sync_interval_ms, 5_000);
        assert_eq!(cfg.pulse.graduation_mc_max_usd, 69_000.0);
        assert_eq!(cfg.swap_sync.max_pages, 200);
        assert_eq!(cfg.candles.live_refresh_ms, 300_000);
        assert_eq!(cfg.dashboard.sync_interval_ms, 60_000);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [pulse]
            sync_interval_ms = 1000

            [api_keys]
            metadata = "key-123"
            "#,
        )
        .expect("parse");
        assert_eq!(cfg.pulse.sync_interval_ms, 1_000);
        assert_eq!(cfg.pulse.tail_sync_limit, 20);
        assert_eq!(cfg.api_keys.metadata, "key-123");
        assert!(cfg.api_keys.dashboard.is_empty());
    }
}
