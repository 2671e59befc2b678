use crate::apis::get_api_manager;
use crate::cache::get_kv_cache;
use crate::database::PulseTokenRow;
use crate::errors::{AppError, AppResult};
use crate::logger::{self, LogTag};
use crate::services::{ReadServices, TTL_SUPPLY, TTL_TOKEN_DETAIL};
use crate::types::{now_ms, PulseCategory, PulseTokenOut, TokenLite, TokenSource};

impl ReadServices {
    /// Token detail, DB-first
    ///
    /// A pulse token present in the store is returned unchanged. Otherwise
    /// the fallback chain runs (metadata feed, pairs feed, dashboard feed);
    /// the first hit is cached into `pulse_token` so the next read is local.
    pub async fn get_token(&self, address: &str) -> AppResult<PulseTokenOut> {
        if let Some(row) = self.db.get_pulse_token(address)? {
            return Ok(row.to_out(TokenSource::Db));
        }

        let cache_key = format!("token:{}", address);
        let db = &self.db;
        get_kv_cache()
            .get_or_set_json(&cache_key, TTL_TOKEN_DETAIL, || async {
                let (row, source) = fetch_token_from_feeds(address).await?;
                db.upsert_pulse_token(&row)?;
                Ok(row.to_out(source))
            })
            .await
    }

    /// Dashboard token list with text search and pagination
    pub fn get_token_list(
        &self,
        sort: &str,
        descending: bool,
        page: usize,
        limit: usize,
        search: Option<&str>,
    ) -> AppResult<Vec<TokenLite>> {
        let rows = self
            .db
            .list_dashboard_tokens(sort, descending, page, limit.clamp(1, 500), search)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(rows.iter().map(|r| r.to_token_lite()).collect())
    }

    /// Supply lookup by coin id, cached for five minutes
    pub async fn get_supply(&self, coin_id: &str) -> AppResult<crate::apis::coingecko::CoinSupply> {
        let cache_key = format!("supply:{}", coin_id);
        get_kv_cache()
            .get_or_set_json(&cache_key, TTL_SUPPLY, || async {
                get_api_manager()
                    .coingecko
                    .supply(coin_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("coin {}", coin_id)))
            })
            .await
    }
}

/// Fallback chain: metadata feed, then pairs feed, then dashboard feed
async fn fetch_token_from_feeds(address: &str) -> AppResult<(PulseTokenRow, TokenSource)> {
    let apis = get_api_manager();

    match apis.solanatracker.token_metadata(address).await {
        Ok(Some(token)) => {
            return Ok((metadata_to_row(address, &token), TokenSource::Metadata));
        }
        Ok(None) => {}
        Err(e) => {
            logger::debug(
                LogTag::Api,
                &format!("Token detail via metadata failed for {}: {}", address, e),
            );
        }
    }

    match apis.dexscreener.pairs_by_token(address).await {
        Ok(pairs) if !pairs.is_empty() => {
            let lite = pairs[0].to_token_lite();
            return Ok((lite_to_row(lite), TokenSource::DexPairs));
        }
        Ok(_) => {}
        Err(e) => {
            logger::debug(
                LogTag::Api,
                &format!("Token detail via pairs failed for {}: {}", address, e),
            );
        }
    }

    match apis.birdeye.token_overview(address).await {
        Ok(Some(overview)) => {
            return Ok((lite_to_row(overview.to_token_lite()), TokenSource::Dashboard));
        }
        Ok(None) => {}
        Err(e) => {
            logger::debug(
                LogTag::Api,
                &format!("Token detail via dashboard failed for {}: {}", address, e),
            );
        }
    }

    Err(AppError::NotFound(format!("token {}", address)))
}

fn metadata_to_row(
    address: &str,
    response: &crate::apis::solanatracker::TokenResponse,
) -> PulseTokenRow {
    let now = now_ms();
    let best_pool = response.pools.first();
    PulseTokenRow {
        address: address.to_string(),
        symbol: response.token.symbol.clone(),
        name: response.token.name.clone(),
        decimals: if response.token.decimals > 0 {
            response.token.decimals
        } else {
            6
        },
        logo_uri: response.token.image.clone(),
        price: best_pool.map(|p| p.price.usd).unwrap_or(0.0),
        price_change_24h: 0.0,
        volume_24h: best_pool
            .and_then(|p| p.txns.as_ref())
            .map(|t| t.volume)
            .unwrap_or(0.0),
        market_cap: best_pool.map(|p| p.market_cap.usd).unwrap_or(0.0),
        liquidity: best_pool.map(|p| p.liquidity.usd).unwrap_or(0.0),
        category: PulseCategory::New,
        bonding_progress: None,
        graduated_at: None,
        token_created_at: response.token.created_on,
        description: response.token.description.clone(),
        twitter: response.token.twitter.clone(),
        telegram: response.token.telegram.clone(),
        website: response.token.website.clone(),
        reply_count: 0,
        tx_count: response.txns,
        created_at: now,
        updated_at: now,
    }
}

fn lite_to_row(lite: TokenLite) -> PulseTokenRow {
    let now = now_ms();
    PulseTokenRow {
        address: lite.address,
        symbol: lite.symbol,
        name: lite.name,
        decimals: lite.decimals,
        logo_uri: lite.logo_uri,
        price: lite.price,
        price_change_24h: lite.price_change_24h,
        volume_24h: lite.volume_24h,
        market_cap: lite.market_cap,
        liquidity: lite.liquidity,
        category: PulseCategory::New,
        bonding_progress: None,
        graduated_at: None,
        token_created_at: None,
        description: None,
        twitter: None,
        telegram: None,
        website: None,
        reply_count: 0,
        tx_count: 0,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::database::Database;
    use crate::swap_sync::{SwapPageFetcher, SwapSyncEngine};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct NoSwaps;

    #[async_trait]
    impl SwapPageFetcher for NoSwaps {
        async fn fetch_page(
            &self,
            _address: &str,
            _cursor: Option<&str>,
            _limit: usize,
        ) -> crate::errors::ApiResult<crate::apis::solanatracker::SwapPage> {
            Ok(crate::apis::solanatracker::SwapPage {
                trades: Vec::new(),
                next_cursor: None,
                has_next: false,
            })
        }
    }

    pub(crate) fn test_services() -> (Arc<ReadServices>, Arc<Database>) {
        let db = Arc::new(Database::in_memory().unwrap());
        let swap_sync = Arc::new(SwapSyncEngine::new(db.clone(), Arc::new(NoSwaps)));
        (ReadServices::new(db.clone(), swap_sync), db)
    }

    #[tokio::test]
    async fn db_resident_pulse_token_served_unchanged() {
        let (services, db) = test_services();

        let now = now_ms();
        db.upsert_pulse_token(&PulseTokenRow {
            address: "Mint1".to_string(),
            symbol: "ONE".to_string(),
            name: "One".to_string(),
            decimals: 6,
            logo_uri: Some("https://x/logo.png".to_string()),
            price: 0.5,
            price_change_24h: 2.0,
            volume_24h: 100.0,
            market_cap: 50_000.0,
            liquidity: 9_000.0,
            category: PulseCategory::Graduating,
            bonding_progress: Some(0.8),
            graduated_at: None,
            token_created_at: Some(now),
            description: None,
            twitter: None,
            telegram: None,
            website: None,
            reply_count: 3,
            tx_count: 42,
            created_at: now,
            updated_at: now,
        })
        .unwrap();

        let out = services.get_token("Mint1").await.unwrap();
        assert_eq!(out.token.symbol, "ONE");
        assert_eq!(out.category, PulseCategory::Graduating);
        assert!(matches!(out.source, TokenSource::Db));
    }

    #[tokio::test]
    async fn token_list_search_and_paging() {
        let (services, db) = test_services();
        for (addr, symbol, mc) in [("A1", "DOGE", 5.0), ("B2", "PEPE", 9.0), ("C3", "DOPE", 7.0)] {
            db.upsert_dashboard_token(&crate::database::DashboardTokenRow {
                address: addr.to_string(),
                symbol: symbol.to_string(),
                name: format!("{} coin", symbol),
                decimals: 9,
                logo_uri: None,
                price: 1.0,
                price_change_24h: 0.0,
                volume_24h: 0.0,
                market_cap: mc,
                liquidity: 0.0,
                created_at: 1,
                updated_at: 1,
            })
            .unwrap();
        }

        let hits = services
            .get_token_list("market_cap", true, 0, 10, Some("do"))
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].symbol, "DOPE"); // higher market cap first
        assert_eq!(hits[1].symbol, "DOGE");
    }
}
