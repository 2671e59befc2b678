/// Swap sync engine
///
/// Owns `token_swap` for pull sources: one-shot historical backfill per token
/// plus repeated incremental tail sync, and the swap-derived OHLCV read that
/// is the single candle source for pulse tokens.
///
/// The live ingester also inserts swaps (push source); both writers share the
/// `(token_address, tx_hash)` constraint so races are harmless.
pub mod parser;

pub use parser::parse_raw_trade;

use crate::apis::solanatracker::SwapPage;
use crate::candles::aggregate::build_candles_from_swaps;
use crate::config::with_config;
use crate::database::Database;
use crate::errors::ApiResult;
use crate::logger::{self, LogTag};
use crate::shutdown::is_shutdown_requested;
use crate::sol_price;
use crate::types::{now_ms, Ohlcv};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Fetch seam for cursor-paged swap history
#[async_trait]
pub trait SwapPageFetcher: Send + Sync {
    async fn fetch_page(
        &self,
        address: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> ApiResult<SwapPage>;
}

/// Production fetcher bound to the metadata feed
pub struct UpstreamSwapFetcher;

#[async_trait]
impl SwapPageFetcher for UpstreamSwapFetcher {
    async fn fetch_page(
        &self,
        address: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> ApiResult<SwapPage> {
        crate::apis::get_api_manager()
            .solanatracker
            .token_swaps(address, cursor, limit)
            .await
    }
}

/// Outcome of a sync invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// This call performed the work
    Completed { inserted: usize },
    /// Another in-flight call owns this address
    AlreadyRunning,
    /// Historical sync had already finished earlier
    AlreadySynced,
    /// Cancelled partway by shutdown; status not marked synced
    Cancelled,
}

/// Addresses with an in-flight historical backfill (single-flight guard)
static SYNCING_TOKENS: Lazy<Mutex<HashSet<String>>> = Lazy::new(|| Mutex::new(HashSet::new()));

/// Removes the address from the guard set when the backfill scope ends
struct SyncGuard {
    address: String,
}

impl Drop for SyncGuard {
    fn drop(&mut self) {
        SYNCING_TOKENS
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.address);
    }
}

fn try_claim(address: &str) -> Option<SyncGuard> {
    let mut syncing = SYNCING_TOKENS.lock().unwrap_or_else(|e| e.into_inner());
    if syncing.contains(address) {
        return None;
    }
    syncing.insert(address.to_string());
    Some(SyncGuard {
        address: address.to_string(),
    })
}

pub struct SwapSyncEngine {
    db: Arc<Database>,
    fetcher: Arc<dyn SwapPageFetcher>,
}

impl SwapSyncEngine {
    pub fn new(db: Arc<Database>, fetcher: Arc<dyn SwapPageFetcher>) -> Self {
        Self { db, fetcher }
    }

    /// Full historical backfill for a token
    ///
    /// Single-flight per address: concurrent calls return immediately
    /// without inserting anything. Already-synced tokens are a no-op.
    pub async fn sync_historical(&self, address: &str) -> anyhow::Result<SyncOutcome> {
        if let Some(status) = self.db.get_sync_status(address)? {
            if status.swaps_synced {
                return Ok(SyncOutcome::AlreadySynced);
            }
        }

        let _guard = match try_claim(address) {
            Some(guard) => guard,
            None => return Ok(SyncOutcome::AlreadyRunning),
        };

        // Re-check after claiming; a concurrent call may have finished
        // between the status read and the claim
        if let Some(status) = self.db.get_sync_status(address)? {
            if status.swaps_synced {
                return Ok(SyncOutcome::AlreadySynced);
            }
        }

        let (max_pages, page_size, insert_batch) = with_config(|cfg| {
            (
                cfg.swap_sync.max_pages,
                cfg.swap_sync.page_size,
                cfg.swap_sync.insert_batch,
            )
        });

        let sol_price = sol_price::get_price_sync();
        let mut cursor: Option<String> = None;
        let mut inserted = 0usize;
        let mut pages = 0usize;

        loop {
            if is_shutdown_requested() {
                logger::info(
                    LogTag::SwapSync,
                    &format!("Backfill cancelled for {} after {} pages", address, pages),
                );
                return Ok(SyncOutcome::Cancelled);
            }
            if pages >= max_pages {
                break;
            }

            let page = self
                .fetcher
                .fetch_page(address, cursor.as_deref(), page_size)
                .await?;
            pages += 1;

            let swaps: Vec<_> = page
                .trades
                .iter()
                .filter_map(|raw| parse_raw_trade(raw, address, sol_price))
                .collect();

            for batch in swaps.chunks(insert_batch.max(1)) {
                inserted += self.db.insert_swaps(batch)?;
            }

            cursor = page.next_cursor;
            if !page.has_next || cursor.is_none() {
                break;
            }
        }

        let bounds = self.db.swap_time_bounds(address)?;
        let total = self.db.count_swaps(address)?;
        self.db.mark_swaps_synced(
            address,
            bounds.map(|(oldest, _)| oldest),
            bounds.map(|(_, newest)| newest),
            total,
            now_ms(),
        )?;

        logger::info(
            LogTag::SwapSync,
            &format!(
                "Historical backfill complete for {}: {} swaps over {} pages",
                address, total, pages
            ),
        );

        Ok(SyncOutcome::Completed { inserted })
    }

    /// Incremental tail sync: newest page only
    ///
    /// Delegates to historical when the token has never been backfilled.
    pub async fn sync_new(&self, address: &str) -> anyhow::Result<SyncOutcome> {
        let synced = self
            .db
            .get_sync_status(address)?
            .map(|s| s.swaps_synced)
            .unwrap_or(false);
        if !synced {
            return self.sync_historical(address).await;
        }

        let page_size = with_config(|cfg| cfg.swap_sync.page_size);
        let sol_price = sol_price::get_price_sync();

        let page = self.fetcher.fetch_page(address, None, page_size).await?;
        let swaps: Vec<_> = page
            .trades
            .iter()
            .filter_map(|raw| parse_raw_trade(raw, address, sol_price))
            .collect();

        let inserted = self.db.insert_swaps(&swaps)?;
        let newest = swaps.iter().map(|s| s.timestamp).max();
        self.db
            .bump_sync_tail(address, newest, inserted as i64, now_ms())?;

        logger::debug(
            LogTag::SwapSync,
            &format!("Tail sync for {}: {} new swaps", address, inserted),
        );

        Ok(SyncOutcome::Completed { inserted })
    }

    /// Swap-derived OHLCV; the single candle source for pulse tokens
    ///
    /// Reads a bounded window (`max_candles * 2` newest swaps), buckets by
    /// interval, gap-fills, and returns the last `max_candles`.
    pub fn get_ohlcv(
        &self,
        address: &str,
        interval_ms: i64,
        max_candles: usize,
    ) -> anyhow::Result<Vec<Ohlcv>> {
        let window = self
            .db
            .get_swaps_asc_window(address, max_candles.saturating_mul(2))?;
        Ok(build_candles_from_swaps(&window, interval_ms, max_candles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::solanatracker::{RawTrade, TradeLeg, WSOL_MINT};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn raw_trade(tx: &str, mint: &str, time: i64, sol: f64, tokens: f64) -> RawTrade {
        RawTrade {
            tx: tx.to_string(),
            side: "buy".to_string(),
            wallet: "w".to_string(),
            time,
            volume: None,
            from: TradeLeg {
                address: WSOL_MINT.to_string(),
                amount: sol,
                amount_usd: None,
                price_usd: Some(150.0),
            },
            to: TradeLeg {
                address: mint.to_string(),
                amount: tokens,
                amount_usd: None,
                price_usd: None,
            },
        }
    }

    /// Two pages of history, newest first, with an artificial page delay so
    /// concurrent callers overlap
    struct PagedFetcher {
        mint: String,
        fetch_calls: AtomicUsize,
    }

    #[async_trait]
    impl SwapPageFetcher for PagedFetcher {
        async fn fetch_page(
            &self,
            address: &str,
            cursor: Option<&str>,
            _limit: usize,
        ) -> ApiResult<SwapPage> {
            assert_eq!(address, self.mint);
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;

            match cursor {
                None => Ok(SwapPage {
                    trades: vec![
                        raw_trade("tx-4", &self.mint, 4_000, 1.0, 100.0),
                        raw_trade("tx-3", &self.mint, 3_000, 1.0, 100.0),
                    ],
                    next_cursor: Some("page-2".to_string()),
                    has_next: true,
                }),
                Some("page-2") => Ok(SwapPage {
                    trades: vec![
                        raw_trade("tx-2", &self.mint, 2_000, 1.0, 100.0),
                        raw_trade("tx-1", &self.mint, 1_000, 1.0, 100.0),
                    ],
                    next_cursor: None,
                    has_next: false,
                }),
                Some(other) => panic!("unexpected cursor {}", other),
            }
        }
    }

    #[tokio::test]
    async fn historical_backfill_pages_and_marks_synced() {
        let db = Arc::new(Database::in_memory().unwrap());
        let engine = SwapSyncEngine::new(
            db.clone(),
            Arc::new(PagedFetcher {
                mint: "MINT".to_string(),
                fetch_calls: AtomicUsize::new(0),
            }),
        );

        let outcome = engine.sync_historical("MINT").await.unwrap();
        assert_eq!(outcome, SyncOutcome::Completed { inserted: 4 });

        let status = db.get_sync_status("MINT").unwrap().unwrap();
        assert!(status.swaps_synced);
        assert_eq!(status.total_swaps, 4);
        assert_eq!(status.oldest_swap_time, Some(1_000));
        assert_eq!(status.newest_swap_time, Some(4_000));

        // Second call is a no-op
        assert_eq!(
            engine.sync_historical("MINT").await.unwrap(),
            SyncOutcome::AlreadySynced
        );
    }

    #[tokio::test]
    async fn concurrent_backfills_single_flight() {
        let db = Arc::new(Database::in_memory().unwrap());
        let fetcher = Arc::new(PagedFetcher {
            mint: "MINT2".to_string(),
            fetch_calls: AtomicUsize::new(0),
        });
        let engine = Arc::new(SwapSyncEngine::new(db.clone(), fetcher.clone()));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let engine = engine.clone();
            handles.push(tokio::spawn(
                async move { engine.sync_historical("MINT2").await },
            ));
        }

        let mut completed = 0;
        let mut bounced = 0;
        for handle in handles {
            match handle.await.unwrap().unwrap() {
                SyncOutcome::Completed { .. } => completed += 1,
                SyncOutcome::AlreadyRunning | SyncOutcome::AlreadySynced => bounced += 1,
                SyncOutcome::Cancelled => panic!("unexpected cancel"),
            }
        }

        assert_eq!(completed, 1);
        assert_eq!(bounced, 9);
        assert_eq!(db.count_swaps("MINT2").unwrap(), 4);
        // Exactly one backfill hit the upstream (two pages)
        assert_eq!(fetcher.fetch_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn tail_sync_bumps_watermarks() {
        let db = Arc::new(Database::in_memory().unwrap());
        let engine = SwapSyncEngine::new(
            db.clone(),
            Arc::new(PagedFetcher {
                mint: "MINT3".to_string(),
                fetch_calls: AtomicUsize::new(0),
            }),
        );

        engine.sync_historical("MINT3").await.unwrap();

        // Tail sync re-reads the newest page; all rows are duplicates
        let outcome = engine.sync_new("MINT3").await.unwrap();
        assert_eq!(outcome, SyncOutcome::Completed { inserted: 0 });

        let status = db.get_sync_status("MINT3").unwrap().unwrap();
        assert_eq!(status.total_swaps, 4); // unchanged
    }

    #[tokio::test]
    async fn ohlcv_from_synced_swaps() {
        let db = Arc::new(Database::in_memory().unwrap());
        let engine = SwapSyncEngine::new(
            db.clone(),
            Arc::new(PagedFetcher {
                mint: "MINT4".to_string(),
                fetch_calls: AtomicUsize::new(0),
            }),
        );
        engine.sync_historical("MINT4").await.unwrap();

        let candles = engine.get_ohlcv("MINT4", 1_000, 300).unwrap();
        // Swaps at 1s..4s, one candle per second
        assert_eq!(candles.len(), 4);
        assert!(candles.iter().all(|c| c.is_valid()));
    }
}
