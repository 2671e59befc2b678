use crate::apis::get_api_manager;
use crate::cache::get_kv_cache;
use crate::candles::{build_per_trade_candles, CandleFetcher};
use crate::errors::{ApiResult, AppError, AppResult};
use crate::services::{ReadServices, TTL_OHLCV_DB, TTL_OHLCV_UPSTREAM};
use crate::types::{now_ms, Ohlcv, Timeframe};
use async_trait::async_trait;

/// Default candle count when the caller gives no range
const DEFAULT_MAX_CANDLES: usize = 300;

/// Fetcher wiring the candle cache engine to the dashboard feed
struct DashboardCandleFetcher;

#[async_trait]
impl CandleFetcher for DashboardCandleFetcher {
    async fn fetch(
        &self,
        address: &str,
        timeframe: Timeframe,
        from_ms: i64,
        to_ms: i64,
    ) -> ApiResult<Vec<Ohlcv>> {
        get_api_manager()
            .birdeye
            .ohlcv(address, timeframe, from_ms, to_ms)
            .await
    }
}

impl ReadServices {
    /// OHLCV for a dashboard token: candle cache over the upstream feed,
    /// weekly/monthly served by daily aggregation
    pub async fn get_ohlcv_dashboard(
        &self,
        address: &str,
        timeframe: Timeframe,
        from_ms: Option<i64>,
        to_ms: Option<i64>,
    ) -> AppResult<Vec<Ohlcv>> {
        let to = to_ms.unwrap_or_else(now_ms);
        let from = from_ms
            .unwrap_or_else(|| to - timeframe.interval_ms() * DEFAULT_MAX_CANDLES as i64);

        let cache_key = format!("ohlcv:dash:{}:{}:{}:{}", address, timeframe, from, to);
        let engine = &self.candle_engine;
        get_kv_cache()
            .get_or_set_json(&cache_key, TTL_OHLCV_UPSTREAM, || async move {
                engine
                    .get_candles(address, timeframe, from, to, &DashboardCandleFetcher)
                    .await
                    .map_err(AppError::from)
            })
            .await
    }

    /// OHLCV for a pulse token: derived from persisted swaps only
    ///
    /// `per_trade` switches to one-candle-per-trade output for charts that
    /// request it; the interval-bucket path is the normative behavior.
    pub async fn get_ohlcv_pulse(
        &self,
        address: &str,
        timeframe: Timeframe,
        max_candles: Option<usize>,
        per_trade: bool,
    ) -> AppResult<Vec<Ohlcv>> {
        let max = max_candles.unwrap_or(DEFAULT_MAX_CANDLES).clamp(1, 2_000);

        let cache_key = format!(
            "ohlcv:pulse:{}:{}:{}:{}",
            address,
            timeframe,
            max,
            if per_trade { "pt" } else { "iv" }
        );
        let swap_sync = &self.swap_sync;
        let db = &self.db;
        get_kv_cache()
            .get_or_set_json(&cache_key, TTL_OHLCV_DB, || async move {
                if per_trade {
                    let window = db.get_swaps_asc_window(address, max.saturating_mul(2))?;
                    let mut candles = build_per_trade_candles(&window);
                    if candles.len() > max {
                        candles = candles[candles.len() - max..].to_vec();
                    }
                    Ok(candles)
                } else {
                    swap_sync
                        .get_ohlcv(address, timeframe.interval_ms(), max)
                        .map_err(AppError::from)
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use crate::services::tokens::tests::test_services;
    use crate::types::{SwapSide, Timeframe, TokenSwap};

    fn swap(address: &str, tx: &str, ts: i64, price: f64, value: f64) -> TokenSwap {
        TokenSwap {
            token_address: address.to_string(),
            tx_hash: tx.to_string(),
            timestamp: ts,
            side: SwapSide::Buy,
            wallet_address: "w".to_string(),
            token_amount: value / price,
            sol_amount: 0.1,
            price_usd: price,
            total_value_usd: value,
        }
    }

    #[tokio::test]
    async fn pulse_ohlcv_buckets_persisted_swaps() {
        let (services, db) = test_services();
        db.insert_swaps(&[
            swap("P1", "a", 0, 1.0, 10.0),
            swap("P1", "b", 400, 1.2, 20.0),
            swap("P1", "c", 900, 0.9, 30.0),
            swap("P1", "d", 1_500, 1.1, 5.0),
        ])
        .unwrap();

        let candles = services
            .get_ohlcv_pulse("P1", Timeframe::Second1, Some(10), false)
            .await
            .unwrap();

        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open, 1.0);
        assert_eq!(candles[0].close, 0.9);
        assert_eq!(candles[0].volume, 60.0);
        assert_eq!(candles[1].close, 1.1);
    }

    #[tokio::test]
    async fn per_trade_option_returns_one_candle_per_swap() {
        let (services, db) = test_services();
        db.insert_swaps(&[
            swap("P2", "a", 0, 1.0, 10.0),
            swap("P2", "b", 1_000, 1.2, 20.0),
        ])
        .unwrap();

        let candles = services
            .get_ohlcv_pulse("P2", Timeframe::Second1, Some(10), true)
            .await
            .unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[1].open, 1.0); // chained from previous close
        assert_eq!(candles[1].close, 1.2);
    }
}
