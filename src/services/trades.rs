use crate::cache::get_kv_cache;
use crate::errors::{AppError, AppResult};
use crate::logger::{self, LogTag};
use crate::services::{ReadServices, TTL_TRADES};
use crate::types::{TokenSwap, TradeOut};

/// Quote side of every launchpad pair
const QUOTE_SYMBOL: &str = "SOL";

impl ReadServices {
    /// Recent trades, newest first
    ///
    /// When the token has no completed backfill, a background one is
    /// triggered and whatever is already present is returned immediately;
    /// the caller is never blocked beyond the DB read.
    pub async fn get_trades(&self, address: &str, limit: usize) -> AppResult<Vec<TradeOut>> {
        let limit = limit.clamp(1, 500);

        let synced = self
            .db
            .get_sync_status(address)
            .map_err(AppError::from)?
            .map(|s| s.swaps_synced)
            .unwrap_or(false);

        if !synced {
            let engine = self.swap_sync.clone();
            let target = address.to_string();
            tokio::spawn(async move {
                if let Err(e) = engine.sync_historical(&target).await {
                    logger::warning(
                        LogTag::SwapSync,
                        &format!("On-demand backfill failed for {}: {}", target, e),
                    );
                }
            });
        }

        let cache_key = format!("trades:{}:{}", address, limit);
        let db = &self.db;
        let symbol = self
            .db
            .get_pulse_token(address)
            .ok()
            .flatten()
            .map(|r| r.symbol)
            .unwrap_or_default();

        get_kv_cache()
            .get_or_set_json(&cache_key, TTL_TRADES, || async move {
                let swaps = db.get_swaps_desc(address, limit)?;
                Ok::<_, AppError>(swaps.iter().map(|s| swap_to_trade(s, &symbol)).collect())
            })
            .await
    }
}

fn swap_to_trade(swap: &TokenSwap, token_symbol: &str) -> TradeOut {
    TradeOut {
        tx_hash: swap.tx_hash.clone(),
        timestamp: swap.timestamp,
        side: swap.side,
        wallet: swap.wallet_address.clone(),
        token_amount: swap.token_amount,
        token_amount_usd: swap.total_value_usd,
        token_symbol: token_symbol.to_string(),
        other_amount: swap.sol_amount,
        other_symbol: QUOTE_SYMBOL.to_string(),
        other_amount_usd: swap.total_value_usd,
        price_usd: swap.price_usd,
        total_value_usd: swap.total_value_usd,
    }
}

#[cfg(test)]
mod tests {
    use crate::services::tokens::tests::test_services;
    use crate::types::{now_ms, SwapSide, TokenSwap};

    #[tokio::test]
    async fn unsynced_token_returns_immediately_with_what_exists() {
        let (services, db) = test_services();

        db.insert_swaps(&[TokenSwap {
            token_address: "T1".to_string(),
            tx_hash: "tx-1".to_string(),
            timestamp: 5_000,
            side: SwapSide::Sell,
            wallet_address: "w".to_string(),
            token_amount: 10.0,
            sol_amount: 0.2,
            price_usd: 0.5,
            total_value_usd: 5.0,
        }])
        .unwrap();

        // No sync status row at all: still serves the present rows
        let trades = services.get_trades("T1", 50).await.unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].tx_hash, "tx-1");
        assert_eq!(trades[0].other_symbol, "SOL");
    }

    #[tokio::test]
    async fn synced_token_reads_descending() {
        let (services, db) = test_services();
        let now = now_ms();

        let swaps: Vec<TokenSwap> = (0..5)
            .map(|i| TokenSwap {
                token_address: "T2".to_string(),
                tx_hash: format!("tx-{}", i),
                timestamp: 1_000 * i,
                side: SwapSide::Buy,
                wallet_address: "w".to_string(),
                token_amount: 1.0,
                sol_amount: 0.1,
                price_usd: 1.0,
                total_value_usd: 1.0,
            })
            .collect();
        db.insert_swaps(&swaps).unwrap();
        db.mark_swaps_synced("T2", Some(0), Some(4_000), 5, now).unwrap();

        let trades = services.get_trades("T2", 3).await.unwrap();
        assert_eq!(trades.len(), 3);
        assert!(trades[0].timestamp > trades[1].timestamp);
    }
}
