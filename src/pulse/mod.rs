/// Pulse sync engine
///
/// Every 5 s: refresh the launchpad lists, classify and upsert pulse tokens,
/// enrich missing logos from the cached logo map, expire stale rows, and
/// schedule swap syncs. A single-flight guard keeps ticks from overlapping;
/// a slower companion loop deletes orphaned swap history.
use crate::apis::solanatracker::{LaunchpadItem, LaunchpadList};
use crate::config::with_config;
use crate::database::{Database, PulseTokenRow};
use crate::errors::ApiResult;
use crate::ingester::{get_image_resolver, TradeIngester};
use crate::logger::{self, LogTag};
use crate::shutdown::{is_shutdown_requested, SHUTDOWN};
use crate::swap_sync::SwapSyncEngine;
use crate::types::{now_ms, PulseCategory};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Fetch seam for the launchpad lists
#[async_trait]
pub trait PulseListFetcher: Send + Sync {
    async fn fetch_list(&self, list: LaunchpadList, limit: usize) -> ApiResult<Vec<LaunchpadItem>>;
}

/// Production fetcher bound to the metadata feed
pub struct UpstreamPulseFetcher;

#[async_trait]
impl PulseListFetcher for UpstreamPulseFetcher {
    async fn fetch_list(&self, list: LaunchpadList, limit: usize) -> ApiResult<Vec<LaunchpadItem>> {
        crate::apis::get_api_manager()
            .solanatracker
            .launchpad_list(list, limit)
            .await
    }
}

/// Clears the tick flag when a tick scope ends
struct TickGuard<'a>(&'a AtomicBool);

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct PulseSyncEngine {
    db: Arc<Database>,
    ingester: Arc<TradeIngester>,
    swap_sync: Arc<SwapSyncEngine>,
    fetcher: Arc<dyn PulseListFetcher>,
    tick_running: AtomicBool,
}

impl PulseSyncEngine {
    pub fn new(
        db: Arc<Database>,
        ingester: Arc<TradeIngester>,
        swap_sync: Arc<SwapSyncEngine>,
        fetcher: Arc<dyn PulseListFetcher>,
    ) -> Arc<Self> {
        Arc::new(Self {
            db,
            ingester,
            swap_sync,
            fetcher,
            tick_running: AtomicBool::new(false),
        })
    }

    /// Start the sync loop and the orphan cleanup loop
    pub fn start(self: &Arc<Self>) -> Vec<tokio::task::JoinHandle<()>> {
        let sync_engine = self.clone();
        let sync_handle = tokio::spawn(async move {
            let interval_ms = with_config(|cfg| cfg.pulse.sync_interval_ms);
            let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms.max(100)));
            let shutdown = SHUTDOWN.notify();

            logger::info(LogTag::Pulse, "Pulse sync engine started");
            loop {
                tokio::select! {
                    _ = shutdown.notified() => {
                        if is_shutdown_requested() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        if is_shutdown_requested() {
                            break;
                        }
                        sync_engine.tick().await;
                    }
                }
            }
            logger::info(LogTag::Pulse, "Pulse sync engine stopped");
        });

        let cleanup_engine = self.clone();
        let cleanup_handle = tokio::spawn(async move {
            let interval_secs = with_config(|cfg| cfg.pulse.orphan_cleanup_interval_secs);
            let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
            let shutdown = SHUTDOWN.notify();

            loop {
                tokio::select! {
                    _ = shutdown.notified() => {
                        if is_shutdown_requested() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        if is_shutdown_requested() {
                            break;
                        }
                        if let Err(e) = cleanup_engine.orphan_cleanup() {
                            logger::warning(
                                LogTag::Pulse,
                                &format!("Orphan cleanup failed: {}", e),
                            );
                        }
                    }
                }
            }
        });

        vec![sync_handle, cleanup_handle]
    }

    /// One sync tick; overlapping calls return immediately
    pub async fn tick(&self) {
        if self.tick_running.swap(true, Ordering::SeqCst) {
            return;
        }
        let _guard = TickGuard(&self.tick_running);

        let (new_limit, graduating_limit, graduated_limit) = with_config(|cfg| {
            (
                cfg.pulse.new_list_limit,
                cfg.pulse.graduating_list_limit,
                cfg.pulse.graduated_list_limit,
            )
        });

        // Refresh: three feed lists plus real-time supplements from the
        // ingester; a failed list degrades to empty and never kills the tick
        let (new_list, graduating_list, graduated_list) = tokio::join!(
            self.fetch_list_logged(LaunchpadList::New, new_limit),
            self.fetch_list_logged(LaunchpadList::Graduating, graduating_limit),
            self.fetch_list_logged(LaunchpadList::Graduated, graduated_limit),
        );

        let realtime_new = self.ingester.drain_new_tokens();
        let migrations = self.ingester.drain_migrations();
        let migrated: HashSet<String> = migrations.iter().map(|m| m.mint.clone()).collect();

        // Classify + persist
        if let Err(e) = self.classify_and_persist(
            &new_list,
            &graduating_list,
            &graduated_list,
            &migrated,
            &realtime_new,
        ) {
            logger::warning(LogTag::Pulse, &format!("Classification failed: {}", e));
        }

        // Proximity promotions observed by the push consumer supplement the
        // graduating list; only NEW rows move, the range rule owns the rest
        for mint in self.ingester.graduating_snapshot() {
            match self.db.get_pulse_token(&mint) {
                Ok(Some(row)) if row.category == PulseCategory::New => {
                    if let Err(e) = self.db.set_pulse_category(&mint, PulseCategory::Graduating) {
                        logger::warning(
                            LogTag::Pulse,
                            &format!("Proximity promotion failed for {}: {}", mint, e),
                        );
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    logger::warning(
                        LogTag::Pulse,
                        &format!("Proximity lookup failed for {}: {}", mint, e),
                    );
                }
            }
        }

        // Migrations observed by the push consumer reclassify the persisted row
        for mint in &migrated {
            match self.db.set_pulse_category(mint, PulseCategory::Graduated) {
                Ok(true) => {}
                Ok(false) => logger::debug(
                    LogTag::Pulse,
                    &format!("Migration for unknown pulse token {}", mint),
                ),
                Err(e) => logger::warning(
                    LogTag::Pulse,
                    &format!("Reclassification failed for {}: {}", mint, e),
                ),
            }
        }

        self.enrich_logos().await;
        self.expire_stale();
        self.kick_swap_syncs();
    }

    async fn fetch_list_logged(&self, list: LaunchpadList, limit: usize) -> Vec<LaunchpadItem> {
        match self.fetcher.fetch_list(list, limit).await {
            Ok(items) => items,
            Err(e) => {
                logger::warning(
                    LogTag::Pulse,
                    &format!("Launchpad {} list fetch failed: {}", list.path_segment(), e),
                );
                Vec::new()
            }
        }
    }

    fn classify_and_persist(
        &self,
        new_list: &[LaunchpadItem],
        graduating_list: &[LaunchpadItem],
        graduated_list: &[LaunchpadItem],
        migrated: &HashSet<String>,
        realtime_new: &[crate::pushfeed::NewTokenEvent],
    ) -> anyhow::Result<()> {
        let (mc_min, mc_max) = with_config(|cfg| {
            (
                cfg.pulse.graduation_mc_min_usd,
                cfg.pulse.graduation_mc_max_usd,
            )
        });

        let mut seen: HashSet<String> = HashSet::new();

        // Feed items carry full market columns; the graduated list wins over
        // the other two when an address appears twice
        for (item, feed_category) in graduated_list
            .iter()
            .map(|i| (i, PulseCategory::Graduated))
            .chain(graduating_list.iter().map(|i| (i, PulseCategory::Graduating)))
            .chain(new_list.iter().map(|i| (i, PulseCategory::New)))
        {
            if !seen.insert(item.mint.clone()) {
                continue;
            }
            let category = classify_item(item, feed_category, migrated, mc_min, mc_max);
            self.db.upsert_pulse_token(&item_to_row(item, category))?;
        }

        // Real-time new tokens not present in any feed list yet
        let sol_usd = crate::sol_price::get_price_sync();
        for event in realtime_new {
            if seen.contains(&event.mint) {
                continue;
            }
            let category = if migrated.contains(&event.mint) {
                PulseCategory::Graduated
            } else {
                PulseCategory::New
            };
            self.db
                .upsert_pulse_token(&event_to_row(event, category, sol_usd))?;
        }

        Ok(())
    }

    /// Logo enrichment from the cached logo map only; per-row feed calls
    /// caused rate-limit storms and stay out of the sync path
    async fn enrich_logos(&self) {
        let resolver = get_image_resolver();

        for category in [PulseCategory::New, PulseCategory::Graduating] {
            let rows = match self.db.list_pulse_tokens(category, 100) {
                Ok(rows) => rows,
                Err(e) => {
                    logger::warning(LogTag::Pulse, &format!("Logo enrich read failed: {}", e));
                    continue;
                }
            };

            for row in rows.iter().filter(|r| r.logo_uri.is_none()) {
                if let Some(logo) = resolver.cached_logo(&row.address).await {
                    if let Err(e) = self.db.set_pulse_logo(&row.address, &logo) {
                        logger::debug(
                            LogTag::Pulse,
                            &format!("Logo write failed for {}: {}", row.address, e),
                        );
                    }
                }
            }
        }
    }

    fn expire_stale(&self) {
        let (ttl_new_h, ttl_graduating_h, ttl_graduated_d) = with_config(|cfg| {
            (
                cfg.pulse.ttl_new_hours,
                cfg.pulse.ttl_graduating_hours,
                cfg.pulse.ttl_graduated_days,
            )
        });

        match self.db.expire_stale_pulse_tokens(
            now_ms(),
            ttl_new_h * 3_600_000,
            ttl_graduating_h * 3_600_000,
            ttl_graduated_d * 86_400_000,
        ) {
            Ok(counts) if counts.total() > 0 => {
                logger::info(
                    LogTag::Pulse,
                    &format!(
                        "Expired pulse tokens: {} new, {} graduating, {} graduated",
                        counts.new, counts.graduating, counts.graduated
                    ),
                );
            }
            Ok(_) => {}
            Err(e) => logger::warning(LogTag::Pulse, &format!("Expiry failed: {}", e)),
        }
    }

    /// Schedule historical backfills and tail syncs; scheduling failures are
    /// logged and never abort the tick
    fn kick_swap_syncs(&self) {
        let (k_init, k_tail) =
            with_config(|cfg| (cfg.pulse.init_sync_limit, cfg.pulse.tail_sync_limit));

        match self.db.pulse_tokens_needing_sync(k_init) {
            Ok(addresses) => {
                for address in addresses {
                    let engine = self.swap_sync.clone();
                    tokio::spawn(async move {
                        if let Err(e) = engine.sync_historical(&address).await {
                            logger::warning(
                                LogTag::SwapSync,
                                &format!("Scheduled backfill failed for {}: {}", address, e),
                            );
                        }
                    });
                }
            }
            Err(e) => logger::warning(LogTag::Pulse, &format!("Backfill scheduling failed: {}", e)),
        }

        match self.db.pulse_tokens_for_tail_sync(k_tail) {
            Ok(addresses) => {
                for address in addresses {
                    let engine = self.swap_sync.clone();
                    tokio::spawn(async move {
                        if let Err(e) = engine.sync_new(&address).await {
                            logger::debug(
                                LogTag::SwapSync,
                                &format!("Scheduled tail sync failed for {}: {}", address, e),
                            );
                        }
                    });
                }
            }
            Err(e) => logger::warning(LogTag::Pulse, &format!("Tail scheduling failed: {}", e)),
        }
    }

    /// Delete swap history for tokens that left `pulse_token`
    ///
    /// Bounded batch per invocation; checks for shutdown between tokens.
    pub fn orphan_cleanup(&self) -> anyhow::Result<usize> {
        let batch = with_config(|cfg| cfg.pulse.orphan_cleanup_batch);

        let pulse_addresses: HashSet<String> =
            self.db.pulse_token_addresses()?.into_iter().collect();
        let synced = self.db.synced_addresses()?;

        let mut cleaned = 0usize;
        for address in synced
            .into_iter()
            .filter(|a| !pulse_addresses.contains(a))
            .take(batch)
        {
            if is_shutdown_requested() {
                break;
            }

            let swaps = self.db.delete_swaps_for(&address)?;
            self.db.delete_sync_status(&address)?;
            cleaned += 1;

            logger::info(
                LogTag::Pulse,
                &format!("Orphan cleanup: {} ({} swap rows)", address, swaps),
            );
        }

        Ok(cleaned)
    }
}

/// Resolve the persisted category for one feed item
fn classify_item(
    item: &LaunchpadItem,
    feed_category: PulseCategory,
    migrated: &HashSet<String>,
    mc_min: f64,
    mc_max: f64,
) -> PulseCategory {
    if migrated.contains(&item.mint)
        || feed_category == PulseCategory::Graduated
        || item.graduated_at.is_some()
    {
        return PulseCategory::Graduated;
    }

    // Half-open range: mc == upper bound is NOT graduating
    if item.market_cap_usd >= mc_min && item.market_cap_usd < mc_max {
        return PulseCategory::Graduating;
    }

    PulseCategory::New
}

fn item_to_row(item: &LaunchpadItem, category: PulseCategory) -> PulseTokenRow {
    let now = now_ms();
    PulseTokenRow {
        address: item.mint.clone(),
        symbol: item.symbol.clone(),
        name: item.name.clone(),
        decimals: if item.decimals > 0 { item.decimals } else { 6 },
        logo_uri: item.image.clone(),
        price: item.price_usd,
        price_change_24h: item.price_change_24h,
        volume_24h: item.volume_24h,
        market_cap: item.market_cap_usd,
        liquidity: item.liquidity_usd,
        category,
        bonding_progress: item.bonding_progress,
        graduated_at: item.graduated_at,
        token_created_at: item.created_at,
        description: item.description.clone(),
        twitter: item.twitter.clone(),
        telegram: item.telegram.clone(),
        website: item.website.clone(),
        reply_count: item.replies,
        tx_count: item.txns,
        created_at: now,
        updated_at: now,
    }
}

fn event_to_row(
    event: &crate::pushfeed::NewTokenEvent,
    category: PulseCategory,
    sol_usd: f64,
) -> PulseTokenRow {
    let now = now_ms();
    PulseTokenRow {
        address: event.mint.clone(),
        symbol: event.symbol.clone(),
        name: event.name.clone(),
        decimals: 6,
        logo_uri: None,
        price: 0.0,
        price_change_24h: 0.0,
        volume_24h: 0.0,
        market_cap: event.market_cap_sol * sol_usd,
        liquidity: event.v_sol_in_bonding_curve * sol_usd,
        category,
        bonding_progress: None,
        graduated_at: None,
        token_created_at: Some(event.timestamp),
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
mod tests {
    use super::*;
    use crate::hub::Hub;
    use crate::swap_sync::{SwapPageFetcher, SwapSyncEngine};
    use parking_lot::Mutex;

    struct FixtureLists {
        new: Mutex<Vec<LaunchpadItem>>,
        graduating: Mutex<Vec<LaunchpadItem>>,
        graduated: Mutex<Vec<LaunchpadItem>>,
    }

    #[async_trait]
    impl PulseListFetcher for FixtureLists {
        async fn fetch_list(
            &self,
            list: LaunchpadList,
            _limit: usize,
        ) -> ApiResult<Vec<LaunchpadItem>> {
            Ok(match list {
                LaunchpadList::New => self.new.lock().clone(),
                LaunchpadList::Graduating => self.graduating.lock().clone(),
                LaunchpadList::Graduated => self.graduated.lock().clone(),
            })
        }
    }

    struct EmptySwaps;

    #[async_trait]
    impl SwapPageFetcher for EmptySwaps {
        async fn fetch_page(
            &self,
            _address: &str,
            _cursor: Option<&str>,
            _limit: usize,
        ) -> ApiResult<crate::apis::solanatracker::SwapPage> {
            Ok(crate::apis::solanatracker::SwapPage {
                trades: Vec::new(),
                next_cursor: None,
                has_next: false,
            })
        }
    }

    fn item(mint: &str, mc: f64) -> LaunchpadItem {
        LaunchpadItem {
            mint: mint.to_string(),
            name: format!("{} token", mint),
            symbol: mint.to_uppercase(),
            decimals: 6,
            image: None,
            description: None,
            twitter: None,
            telegram: None,
            website: None,
            price_usd: 0.001,
            market_cap_usd: mc,
            liquidity_usd: 1_000.0,
            volume_24h: 10.0,
            price_change_24h: 0.0,
            bonding_progress: Some(0.5),
            created_at: Some(now_ms()),
            graduated_at: None,
            txns: 5,
            replies: 1,
        }
    }

    fn engine_with(
        lists: FixtureLists,
    ) -> (
        Arc<PulseSyncEngine>,
        Arc<Database>,
        Arc<TradeIngester>,
        Arc<FixtureLists>,
    ) {
        let lists = Arc::new(lists);
        let db = Arc::new(Database::in_memory().unwrap());
        let hub = Hub::new();
        let ingester = TradeIngester::new(db.clone(), hub);
        let swap_sync = Arc::new(SwapSyncEngine::new(db.clone(), Arc::new(EmptySwaps)));
        let engine =
            PulseSyncEngine::new(db.clone(), ingester.clone(), swap_sync, lists.clone());
        (engine, db, ingester, lists)
    }

    #[test]
    fn graduation_range_is_half_open() {
        let migrated = HashSet::new();
        assert_eq!(
            classify_item(&item("a", 10_000.0), PulseCategory::New, &migrated, 10_000.0, 69_000.0),
            PulseCategory::Graduating
        );
        assert_eq!(
            classify_item(&item("b", 68_999.0), PulseCategory::New, &migrated, 10_000.0, 69_000.0),
            PulseCategory::Graduating
        );
        // Exactly at the upper bound is NOT graduating
        assert_eq!(
            classify_item(&item("c", 69_000.0), PulseCategory::New, &migrated, 10_000.0, 69_000.0),
            PulseCategory::New
        );
    }

    #[tokio::test]
    async fn tick_persists_all_categories() {
        let mut graduated_item = item("grad", 80_000.0);
        graduated_item.graduated_at = Some(now_ms());

        let (engine, db, _, _) = engine_with(FixtureLists {
            new: Mutex::new(vec![item("fresh", 2_000.0)]),
            graduating: Mutex::new(vec![item("mid", 25_000.0)]),
            graduated: Mutex::new(vec![graduated_item]),
        });

        engine.tick().await;

        assert_eq!(
            db.get_pulse_token("fresh").unwrap().unwrap().category,
            PulseCategory::New
        );
        assert_eq!(
            db.get_pulse_token("mid").unwrap().unwrap().category,
            PulseCategory::Graduating
        );
        let grad = db.get_pulse_token("grad").unwrap().unwrap();
        assert_eq!(grad.category, PulseCategory::Graduated);
        assert!(grad.graduated_at.is_some());
    }

    #[tokio::test]
    async fn tick_twice_is_idempotent() {
        let (engine, db, _, _) = engine_with(FixtureLists {
            new: Mutex::new(vec![item("a", 1_000.0), item("b", 2_000.0)]),
            graduating: Mutex::new(vec![item("c", 20_000.0)]),
            graduated: Mutex::new(Vec::new()),
        });

        engine.tick().await;
        let first: Vec<String> = db.pulse_token_addresses().unwrap();

        engine.tick().await;
        let second: Vec<String> = db.pulse_token_addresses().unwrap();

        let mut first_sorted = first.clone();
        first_sorted.sort();
        let mut second_sorted = second;
        second_sorted.sort();
        assert_eq!(first_sorted, second_sorted);
    }

    #[tokio::test]
    async fn graduation_transition_scenario() {
        // Tick 1: token shows up on the new list at $5k
        let lists = FixtureLists {
            new: Mutex::new(vec![item("B", 5_000.0)]),
            graduating: Mutex::new(Vec::new()),
            graduated: Mutex::new(Vec::new()),
        };
        let (engine, db, ingester, lists) = engine_with(lists);
        engine.tick().await;
        assert_eq!(
            db.get_pulse_token("B").unwrap().unwrap().category,
            PulseCategory::New
        );

        // Tick 2: market cap climbs into the graduation window
        *lists.new.lock() = vec![item("B", 65_000.0)];
        engine.tick().await;
        assert_eq!(
            db.get_pulse_token("B").unwrap().unwrap().category,
            PulseCategory::Graduating
        );

        // Migration arrives on push; next tick reclassifies and stamps
        ingester.handle_frame(
            &serde_json::json!({
                "mint": "B", "txType": "migrate", "pool": "pool-1", "signature": "sig-m",
            })
            .to_string(),
        );
        engine.tick().await;

        let row = db.get_pulse_token("B").unwrap().unwrap();
        assert_eq!(row.category, PulseCategory::Graduated);
        let stamp = row.graduated_at.expect("graduated_at stamped");
        assert!(stamp <= now_ms());

        // Later ticks keep the original stamp
        engine.tick().await;
        assert_eq!(
            db.get_pulse_token("B").unwrap().unwrap().graduated_at,
            Some(stamp)
        );
    }

    #[tokio::test]
    async fn realtime_new_tokens_land_within_one_tick() {
        let (engine, db, ingester, _) = engine_with(FixtureLists {
            new: Mutex::new(Vec::new()),
            graduating: Mutex::new(Vec::new()),
            graduated: Mutex::new(Vec::new()),
        });

        ingester.handle_frame(
            &serde_json::json!({
                "mint": "A", "txType": "create", "symbol": "X", "name": "XToken",
                "signature": "sig-c", "marketCapSol": 5.0,
            })
            .to_string(),
        );

        engine.tick().await;

        let row = db.get_pulse_token("A").unwrap().unwrap();
        assert_eq!(row.category, PulseCategory::New);
        assert_eq!(row.symbol, "X");
    }

    #[tokio::test]
    async fn orphan_cleanup_removes_departed_tokens() {
        let (engine, db, _, _) = engine_with(FixtureLists {
            new: Mutex::new(Vec::new()),
            graduating: Mutex::new(Vec::new()),
            graduated: Mutex::new(Vec::new()),
        });

        // Synced token with swap rows but no pulse_token row
        let swaps: Vec<crate::types::TokenSwap> = (0..50)
            .map(|i| crate::types::TokenSwap {
                token_address: "gone".to_string(),
                tx_hash: format!("tx-{}", i),
                timestamp: i,
                side: crate::types::SwapSide::Buy,
                wallet_address: "w".to_string(),
                token_amount: 1.0,
                sol_amount: 1.0,
                price_usd: 1.0,
                total_value_usd: 1.0,
            })
            .collect();
        db.insert_swaps(&swaps).unwrap();
        db.mark_swaps_synced("gone", Some(0), Some(49), 50, now_ms())
            .unwrap();

        // A live token must survive
        db.upsert_pulse_token(&item_to_row(&item("alive", 1_000.0), PulseCategory::New))
            .unwrap();
        db.insert_swaps(&[crate::types::TokenSwap {
            token_address: "alive".to_string(),
            tx_hash: "tx-a".to_string(),
            timestamp: 1,
            side: crate::types::SwapSide::Buy,
            wallet_address: "w".to_string(),
            token_amount: 1.0,
            sol_amount: 1.0,
            price_usd: 1.0,
            total_value_usd: 1.0,
        }])
        .unwrap();
        db.mark_swaps_synced("alive", Some(1), Some(1), 1, now_ms())
            .unwrap();

        let cleaned = engine.orphan_cleanup().unwrap();
        assert_eq!(cleaned, 1);
        assert_eq!(db.count_swaps("gone").unwrap(), 0);
        assert!(db.get_sync_status("gone").unwrap().is_none());
        assert_eq!(db.count_swaps("alive").unwrap(), 1);
        assert!(db.get_sync_status("alive").unwrap().is_some());
    }

    #[tokio::test]
    async fn overlapping_ticks_single_flight() {
        let (engine, _, _, _) = engine_with(FixtureLists {
            new: Mutex::new(vec![item("x", 1_000.0)]),
            graduating: Mutex::new(Vec::new()),
            graduated: Mutex::new(Vec::new()),
        });

        // Mark a tick as running; the next call must bail immediately
        engine.tick_running.store(true, Ordering::SeqCst);
        engine.tick().await; // returns without touching the flag's owner
        assert!(engine.tick_running.load(Ordering::SeqCst));
        engine.tick_running.store(false, Ordering::SeqCst);
    }
}
