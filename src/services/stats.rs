use crate::cache::get_kv_cache;
use crate::errors::{AppError, AppResult};
use crate::services::{ReadServices, TTL_STATS};
use crate::types::{now_ms, PulseCategory};
use serde::{Deserialize, Serialize};

const DAY_MS: i64 = 86_400_000;

/// Aggregate stats for one pulse token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenStats {
    pub address: String,
    pub symbol: String,
    pub category: PulseCategory,
    pub price: f64,
    pub market_cap: f64,
    pub liquidity: f64,
    pub tx_count: i64,
    pub reply_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bonding_progress: Option<f64>,
    /// Sum of swap value over the trailing 24 h window
    pub volume_24h_usd: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graduated_at: Option<i64>,
}

impl ReadServices {
    /// Pulse token stats: the stored row plus a 24 h swap-value aggregate
    pub async fn get_stats(&self, address: &str) -> AppResult<TokenStats> {
        let cache_key = format!("stats:{}", address);
        let db = &self.db;
        get_kv_cache()
            .get_or_set_json(&cache_key, TTL_STATS, || async move {
                let row = db
                    .get_pulse_token(address)?
                    .ok_or_else(|| AppError::NotFound(format!("token {}", address)))?;

                let volume_24h_usd = db.sum_swap_value_since(address, now_ms() - DAY_MS)?;

                Ok(TokenStats {
                    address: row.address,
                    symbol: row.symbol,
                    category: row.category,
                    price: row.price,
                    market_cap: row.market_cap,
                    liquidity: row.liquidity,
                    tx_count: row.tx_count,
                    reply_count: row.reply_count,
                    bonding_progress: row.bonding_progress,
                    volume_24h_usd,
                    graduated_at: row.graduated_at,
                })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::PulseTokenRow;
    use crate::services::tokens::tests::test_services;
    use crate::types::{SwapSide, TokenSwap};

    #[tokio::test]
    async fn stats_combine_row_and_swap_window() {
        let (services, db) = test_services();
        let now = now_ms();

        db.upsert_pulse_token(&PulseTokenRow {
            address: "S1".to_string(),
            symbol: "STAT".to_string(),
            name: "Stat".to_string(),
            decimals: 6,
            logo_uri: None,
            price: 0.01,
            price_change_24h: 0.0,
            volume_24h: 0.0,
            market_cap: 20_000.0,
            liquidity: 4_000.0,
            category: PulseCategory::Graduating,
            bonding_progress: Some(0.6),
            graduated_at: None,
            token_created_at: Some(now),
            description: None,
            twitter: None,
            telegram: None,
            website: None,
            reply_count: 2,
            tx_count: 10,
            created_at: now,
            updated_at: now,
        })
        .unwrap();

        db.insert_swaps(&[
            TokenSwap {
                token_address: "S1".to_string(),
                tx_hash: "in-window".to_string(),
                timestamp: now - 1_000,
                side: SwapSide::Buy,
                wallet_address: "w".to_string(),
                token_amount: 1.0,
                sol_amount: 0.1,
                price_usd: 1.0,
                total_value_usd: 25.0,
            },
            TokenSwap {
                token_address: "S1".to_string(),
                tx_hash: "out-of-window".to_string(),
                timestamp: now - 2 * DAY_MS,
                side: SwapSide::Buy,
                wallet_address: "w".to_string(),
                token_amount: 1.0,
                sol_amount: 0.1,
                price_usd: 1.0,
                total_value_usd: 99.0,
            },
        ])
        .unwrap();

        let stats = services.get_stats("S1").await.unwrap();
        assert_eq!(stats.symbol, "STAT");
        assert_eq!(stats.volume_24h_usd, 25.0);
        assert_eq!(stats.category, PulseCategory::Graduating);
    }
}
