/// Read services
///
/// The query surface the external HTTP router consumes. Read-only against
/// the store; upstream feeds are touched only on cache misses, behind the
/// KV cache with per-endpoint TTLs, and through the fallback chains of the
/// recovery policy (metadata -> pairs -> dashboard for token detail,
/// upstream -> swap-derived for OHLCV).

pub mod holders;
pub mod ohlcv;
pub mod stats;
pub mod tokens;
pub mod trades;

use crate::candles::CandleCacheEngine;
use crate::database::Database;
use crate::swap_sync::SwapSyncEngine;
use std::sync::Arc;
use std::time::Duration;

/// KV cache TTLs per endpoint family
pub(crate) const TTL_TOKEN_DETAIL: Duration = Duration::from_secs(60);
pub(crate) const TTL_OHLCV_DB: Duration = Duration::from_secs(5);
pub(crate) const TTL_OHLCV_UPSTREAM: Duration = Duration::from_secs(30);
pub(crate) const TTL_TRADES: Duration = Duration::from_secs(5);
pub(crate) const TTL_HOLDERS: Duration = Duration::from_secs(60);
pub(crate) const TTL_STATS: Duration = Duration::from_secs(15);
pub(crate) const TTL_SUPPLY: Duration = Duration::from_secs(300);

pub struct ReadServices {
    pub(crate) db: Arc<Database>,
    pub(crate) swap_sync: Arc<SwapSyncEngine>,
    pub(crate) candle_engine: CandleCacheEngine,
}

impl ReadServices {
    pub fn new(db: Arc<Database>, swap_sync: Arc<SwapSyncEngine>) -> Arc<Self> {
        let candle_engine = CandleCacheEngine::new(db.clone());
        Arc::new(Self {
            db,
            swap_sync,
            candle_engine,
        })
    }
}
