/// Candle derivation and caching
///
/// `aggregate` holds the pure helpers (weekly/monthly rollups, swap
/// bucketing, per-trade candles); `engine` owns the persisted candle cache
/// with its historical-immutability policy.

pub mod aggregate;
pub mod engine;

pub use aggregate::{
    aggregate_to_monthly, aggregate_to_weekly, build_candles_from_swaps, build_per_trade_candles,
};
pub use engine::{CandleCacheEngine, CandleFetcher};
