/// Live trade ingester
///
/// Consumes the push feed (new tokens, trades, migrations), persists swaps
/// idempotently, maintains per-token 1-second candle rings, and emits fan-out
/// events. Owns the push connection's reconnect state machine.
pub mod candles;
pub mod images;

pub use candles::{OneSecondRing, RING_RETENTION_SECS};
pub use images::{get_image_resolver, ImageResolver};

use crate::config::with_config;
use crate::database::Database;
use crate::hub::{Hub, ServerMessage, Topic};
use crate::logger::{self, LogTag};
use crate::pushfeed::{
    decode_event, ConnectionState, MigrationEvent, NewTokenEvent, PushEvent, PushFeedConnection,
    TradeEvent, PUSH_FEED_URL,
};
use crate::shutdown::SHUTDOWN;
use crate::sol_price;
use crate::types::{now_ms, PulseCategory, PulseTokenOut, SwapSide, TokenLite, TokenSource,
    TokenSwap, TradeOut};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Quote symbol for launchpad pairs; everything trades against SOL
const QUOTE_SYMBOL: &str = "SOL";

/// Reconnect policy
const BACKOFF_INITIAL: Duration = Duration::from_secs(1);
const BACKOFF_CAP: Duration = Duration::from_secs(60);
const MAX_CONSECUTIVE_ATTEMPTS: u32 = 10;

/// Bound on tracked trade subscriptions
const TRACKED_TOKENS_CAP: usize = 100;

// =============================================================================
// TRACKED-TOKEN LRU
// =============================================================================

/// LRU of tokens with an active trade subscription
///
/// Insertion past capacity evicts the least recently touched token; the
/// caller unsubscribes it and drops its ring.
#[derive(Default)]
struct TrackedTokens {
    set: HashSet<String>,
    order: VecDeque<String>,
}

impl TrackedTokens {
    fn touch(&mut self, mint: &str) {
        if self.set.contains(mint) {
            self.order.retain(|m| m != mint);
            self.order.push_back(mint.to_string());
        }
    }

    /// Insert a mint, returning the evicted one when over capacity
    fn insert(&mut self, mint: &str) -> Option<String> {
        if self.set.contains(mint) {
            self.touch(mint);
            return None;
        }

        self.set.insert(mint.to_string());
        self.order.push_back(mint.to_string());

        if self.set.len() > TRACKED_TOKENS_CAP {
            if let Some(evicted) = self.order.pop_front() {
                self.set.remove(&evicted);
                return Some(evicted);
            }
        }
        None
    }

    fn contains(&self, mint: &str) -> bool {
        self.set.contains(mint)
    }

    fn all(&self) -> Vec<String> {
        self.order.iter().cloned().collect()
    }
}

/// Subscription change the connection loop must apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SubAction {
    Subscribe(String),
    Unsubscribe(String),
}

// =============================================================================
// INGESTER
// =============================================================================

pub struct TradeIngester {
    db: Arc<Database>,
    hub: Arc<Hub>,
    images: Arc<ImageResolver>,

    tracked: Mutex<TrackedTokens>,
    rings: Mutex<HashMap<String, OneSecondRing>>,

    /// New-token events observed since the last pulse tick
    pending_new: Mutex<HashMap<String, NewTokenEvent>>,
    /// Migration events observed since the last pulse tick
    pending_migrations: Mutex<HashMap<String, MigrationEvent>>,
    /// Tokens currently considered NEW in memory (proximity promotion pool)
    new_set: Mutex<HashSet<String>>,
    /// Tokens promoted to GRADUATING in memory
    graduating_set: Mutex<HashSet<String>>,

    state: Mutex<ConnectionState>,
    dropped_trades: AtomicU64,
    persist_failures: AtomicU64,
    decode_failures: AtomicU64,
}

impl TradeIngester {
    pub fn new(db: Arc<Database>, hub: Arc<Hub>) -> Arc<Self> {
        Arc::new(Self {
            db,
            hub,
            images: get_image_resolver(),
            tracked: Mutex::new(TrackedTokens::default()),
            rings: Mutex::new(HashMap::new()),
            pending_new: Mutex::new(HashMap::new()),
            pending_migrations: Mutex::new(HashMap::new()),
            new_set: Mutex::new(HashSet::new()),
            graduating_set: Mutex::new(HashSet::new()),
            state: Mutex::new(ConnectionState::Disconnected),
            dropped_trades: AtomicU64::new(0),
            persist_failures: AtomicU64::new(0),
            decode_failures: AtomicU64::new(0),
        })
    }

    /// Start the push consumer task
    pub fn start(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let ingester = self.clone();
        tokio::spawn(async move {
            ingester.run_loop().await;
        })
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.state.lock()
    }

    // =========================================================================
    // PULSE-ENGINE SURFACE
    // =========================================================================

    /// Take the new-token events observed since the last call
    pub fn drain_new_tokens(&self) -> Vec<NewTokenEvent> {
        self.pending_new.lock().drain().map(|(_, e)| e).collect()
    }

    /// Take the migration events observed since the last call
    pub fn drain_migrations(&self) -> Vec<MigrationEvent> {
        self.pending_migrations
            .lock()
            .drain()
            .map(|(_, e)| e)
            .collect()
    }

    /// Tokens the proximity rule currently classifies as graduating
    pub fn graduating_snapshot(&self) -> Vec<String> {
        self.graduating_set.lock().iter().cloned().collect()
    }

    /// The in-memory 1 s candles for a token
    pub fn ring_candles(&self, mint: &str) -> Vec<crate::types::Ohlcv> {
        self.rings
            .lock()
            .get(mint)
            .map(|r| r.candles())
            .unwrap_or_default()
    }

    // =========================================================================
    // CONNECTION STATE MACHINE
    // =========================================================================

    async fn run_loop(self: Arc<Self>) {
        let mut attempts = 0u32;
        let mut backoff = BACKOFF_INITIAL;
        let shutdown = SHUTDOWN.notify();

        loop {
            if SHUTDOWN.is_requested() {
                break;
            }

            *self.state.lock() = ConnectionState::Connecting;

            let mut conn = match PushFeedConnection::connect(PUSH_FEED_URL).await {
                Ok(conn) => conn,
                Err(e) => {
                    attempts += 1;
                    logger::warning(
                        LogTag::Ingester,
                        &format!("Push feed connect failed (attempt {}): {}", attempts, e),
                    );
                    if attempts >= MAX_CONSECUTIVE_ATTEMPTS {
                        *self.state.lock() = ConnectionState::Disconnected;
                        logger::error(
                            LogTag::Ingester,
                            "Push feed unreachable after max attempts; ingester paused",
                        );
                        return;
                    }
                    *self.state.lock() = ConnectionState::Backoff;
                    tokio::select! {
                        _ = shutdown.notified() => return,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    backoff = (backoff * 2).min(BACKOFF_CAP);
                    continue;
                }
            };

            *self.state.lock() = ConnectionState::Connected;

            // Global streams plus replay of all tracked trade subscriptions
            *self.state.lock() = ConnectionState::Subscribing;
            let tracked = self.tracked.lock().all();
            let subscribed = async {
                conn.subscribe_new_tokens().await?;
                conn.subscribe_migrations().await?;
                conn.subscribe_token_trades(&tracked).await
            }
            .await;

            if let Err(e) = subscribed {
                logger::warning(
                    LogTag::Ingester,
                    &format!("Push feed subscribe failed: {}", e),
                );
                attempts += 1;
                if attempts >= MAX_CONSECUTIVE_ATTEMPTS {
                    *self.state.lock() = ConnectionState::Disconnected;
                    logger::error(
                        LogTag::Ingester,
                        "Push feed unreachable after max attempts; ingester paused",
                    );
                    return;
                }
                *self.state.lock() = ConnectionState::Backoff;
                tokio::select! {
                    _ = shutdown.notified() => return,
                    _ = tokio::time::sleep(backoff) => {}
                }
                backoff = (backoff * 2).min(BACKOFF_CAP);
                continue;
            }

            *self.state.lock() = ConnectionState::Streaming;
            attempts = 0;
            backoff = BACKOFF_INITIAL;
            logger::info(LogTag::Ingester, "Push feed streaming");

            // Stream until error, close, or shutdown
            loop {
                tokio::select! {
                    _ = shutdown.notified() => {
                        if SHUTDOWN.is_requested() {
                            conn.close().await;
                            *self.state.lock() = ConnectionState::Disconnected;
                            return;
                        }
                    }
                    frame = conn.next_frame() => {
                        match frame {
                            Ok(Some(text)) => {
                                let actions = self.handle_frame(&text);
                                for action in actions {
                                    let result = match &action {
                                        SubAction::Subscribe(mint) => {
                                            conn.subscribe_token_trades(&[mint.clone()]).await
                                        }
                                        SubAction::Unsubscribe(mint) => {
                                            conn.unsubscribe_token_trades(&[mint.clone()]).await
                                        }
                                    };
                                    if let Err(e) = result {
                                        logger::warning(
                                            LogTag::Ingester,
                                            &format!("Subscription change failed ({:?}): {}", action, e),
                                        );
                                    }
                                }
                            }
                            Ok(None) => {
                                logger::warning(LogTag::Ingester, "Push feed closed by upstream");
                                break;
                            }
                            Err(e) => {
                                logger::warning(
                                    LogTag::Ingester,
                                    &format!("Push feed read error: {}", e),
                                );
                                break;
                            }
                        }
                    }
                }
            }

            *self.state.lock() = ConnectionState::Backoff;
            tokio::select! {
                _ = shutdown.notified() => return,
                _ = tokio::time::sleep(backoff) => {}
            }
            backoff = (backoff * 2).min(BACKOFF_CAP);
        }

        *self.state.lock() = ConnectionState::Disconnected;
    }

    // =========================================================================
    // EVENT HANDLING
    // =========================================================================

    /// Decode and dispatch one frame; failures are isolated and counted
    pub(crate) fn handle_frame(&self, raw: &str) -> Vec<SubAction> {
        match decode_event(raw, now_ms()) {
            Ok(Some(PushEvent::NewToken(event))) => self.handle_new_token(event),
            Ok(Some(PushEvent::Trade(event))) => {
                self.handle_trade(event);
                Vec::new()
            }
            Ok(Some(PushEvent::Migration(event))) => {
                self.handle_migration(event);
                Vec::new()
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                self.decode_failures.fetch_add(1, Ordering::Relaxed);
                logger::debug(LogTag::Ingester, &format!("Frame decode failed: {}", e));
                Vec::new()
            }
        }
    }

    fn handle_new_token(&self, event: NewTokenEvent) -> Vec<SubAction> {
        let mint = event.mint.clone();

        self.new_set.lock().insert(mint.clone());
        self.pending_new.lock().insert(mint.clone(), event.clone());

        // Announce the pair before logo resolution; the logo follows as a
        // token-update once a gateway answers
        let sol_usd = sol_price::get_price_sync();
        self.hub.publish(
            &Topic::Pulse,
            ServerMessage::PulseNewPair {
                token: new_token_out(&event, sol_usd),
            },
        );

        if let Some(uri) = event.uri.clone().filter(|u| !u.is_empty()) {
            let images = self.images.clone();
            let hub = self.hub.clone();
            let db = self.db.clone();
            let logo_mint = mint.clone();
            tokio::spawn(async move {
                if let Some(logo_uri) = images.prefetch_logo(&logo_mint, &uri).await {
                    if let Err(e) = db.set_pulse_logo(&logo_mint, &logo_uri) {
                        logger::debug(
                            LogTag::Images,
                            &format!("Logo persist failed for {}: {}", logo_mint, e),
                        );
                    }
                    hub.publish(
                        &Topic::Pulse,
                        ServerMessage::PulseTokenUpdate {
                            address: logo_mint,
                            logo_uri: Some(logo_uri),
                        },
                    );
                }
            });
        }

        // Track the token's trade stream, evicting the coldest if full
        let mut actions = vec![SubAction::Subscribe(mint.clone())];
        if let Some(evicted) = self.tracked.lock().insert(&mint) {
            self.rings.lock().remove(&evicted);
            actions.push(SubAction::Unsubscribe(evicted));
        }
        actions
    }

    fn handle_trade(&self, event: TradeEvent) {
        let sol_usd = sol_price::get_price_sync();

        // Price only derivable when both legs are positive
        if event.token_amount <= 0.0 || event.sol_amount <= 0.0 || sol_usd <= 0.0 {
            self.dropped_trades.fetch_add(1, Ordering::Relaxed);
            return;
        }
        let price_usd = event.sol_amount * sol_usd / event.token_amount;
        if !price_usd.is_finite() || price_usd <= 0.0 {
            self.dropped_trades.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let total_value_usd = event.sol_amount * sol_usd;
        let side = match event.tx_type.as_str() {
            "sell" => SwapSide::Sell,
            _ => SwapSide::Buy,
        };

        let swap = TokenSwap {
            token_address: event.mint.clone(),
            tx_hash: event.signature.clone(),
            timestamp: event.timestamp,
            side,
            wallet_address: event.trader.clone(),
            token_amount: event.token_amount,
            sol_amount: event.sol_amount,
            price_usd,
            total_value_usd,
        };

        // Unique-conflict duplicates are absorbed by the insert itself; any
        // other failure gets one retry, then the trade is dropped
        if let Err(first) = self.db.insert_swaps(std::slice::from_ref(&swap)) {
            if let Err(second) = self.db.insert_swaps(std::slice::from_ref(&swap)) {
                self.persist_failures.fetch_add(1, Ordering::Relaxed);
                logger::warning(
                    LogTag::Ingester,
                    &format!(
                        "Swap persist failed twice for {} ({} / {})",
                        event.mint, first, second
                    ),
                );
            }
        }

        self.tracked.lock().touch(&event.mint);

        // Fold into the 1 s ring and emit candle updates
        let update = {
            let mut rings = self.rings.lock();
            rings
                .entry(event.mint.clone())
                .or_insert_with(OneSecondRing::new)
                .apply_trade(event.timestamp, price_usd, total_value_usd)
        };

        let ohlcv_topic = Topic::Ohlcv {
            base: event.mint.clone(),
            quote: QUOTE_SYMBOL.to_string(),
            tf: "1s".to_string(),
        };
        if let Some(closed) = update.closed {
            self.hub.publish(
                &ohlcv_topic,
                ServerMessage::OhlcvClosed {
                    base: event.mint.clone(),
                    quote: QUOTE_SYMBOL.to_string(),
                    tf: "1s".to_string(),
                    candle: closed,
                },
            );
        }
        self.hub.publish(
            &ohlcv_topic,
            ServerMessage::OhlcvUpdate {
                base: event.mint.clone(),
                quote: QUOTE_SYMBOL.to_string(),
                tf: "1s".to_string(),
                candle: update.current,
            },
        );

        self.hub.publish(
            &Topic::Trades {
                base: event.mint.clone(),
                quote: QUOTE_SYMBOL.to_string(),
            },
            ServerMessage::Trade {
                base: event.mint.clone(),
                quote: QUOTE_SYMBOL.to_string(),
                trade: trade_out(&swap, &event),
            },
        );

        // Proximity promotion: NEW -> GRADUATING in memory
        let threshold = with_config(|cfg| cfg.pulse.graduation_proximity_sol_mc);
        if event.market_cap_sol >= threshold && self.new_set.lock().remove(&event.mint) {
            self.graduating_set.lock().insert(event.mint.clone());
            self.hub.publish(
                &Topic::Pulse,
                ServerMessage::PulseGraduating {
                    address: event.mint.clone(),
                    market_cap_sol: event.market_cap_sol,
                    timestamp: event.timestamp,
                },
            );
        }
    }

    fn handle_migration(&self, event: MigrationEvent) {
        self.graduating_set.lock().remove(&event.mint);
        self.new_set.lock().remove(&event.mint);
        self.pending_migrations
            .lock()
            .insert(event.mint.clone(), event.clone());

        // Persisted reclassification happens on the next pulse sync tick
        self.hub.publish(
            &Topic::Pulse,
            ServerMessage::PulseMigrated {
                address: event.mint,
                pool: event.pool,
                timestamp: event.timestamp,
            },
        );
    }
}

/// Shape a new-token event into the client-facing pulse token
fn new_token_out(event: &NewTokenEvent, sol_usd: f64) -> PulseTokenOut {
    PulseTokenOut {
        token: TokenLite {
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
        },
        category: PulseCategory::New,
        description: None,
        tx_count: 0,
        reply_count: 0,
        created_at: event.timestamp,
        twitter: None,
        telegram: None,
        website: None,
        bonding_progress: None,
        graduated_at: None,
        complete: Some(false),
        source: TokenSource::Push,
    }
}

fn trade_out(swap: &TokenSwap, event: &TradeEvent) -> TradeOut {
    TradeOut {
        tx_hash: swap.tx_hash.clone(),
        timestamp: swap.timestamp,
        side: swap.side,
        wallet: swap.wallet_address.clone(),
        token_amount: swap.token_amount,
        token_amount_usd: swap.total_value_usd,
        token_symbol: String::new(),
        other_amount: event.sol_amount,
        other_symbol: QUOTE_SYMBOL.to_string(),
        other_amount_usd: swap.total_value_usd,
        price_usd: swap.price_usd,
        total_value_usd: swap.total_value_usd,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_ingester() -> (Arc<TradeIngester>, Arc<Hub>, Arc<Database>) {
        let db = Arc::new(Database::in_memory().unwrap());
        let hub = Hub::new();
        let ingester = TradeIngester::new(db.clone(), hub.clone());
        (ingester, hub, db)
    }

    fn trade_frame(mint: &str, sig: &str, ts: i64, sol: f64, tokens: f64, mc_sol: f64) -> String {
        serde_json::json!({
            "mint": mint,
            "txType": "buy",
            "tokenAmount": tokens,
            "solAmount": sol,
            "vSolInBondingCurve": 30.0,
            "marketCapSol": mc_sol,
            "traderPublicKey": "trader",
            "signature": sig,
            "timestamp": ts,
        })
        .to_string()
    }

    #[tokio::test]
    async fn trades_persist_idempotently_and_fill_the_ring() {
        let (ingester, hub, db) = test_ingester();
        let (sub, mut rx) = hub.register().unwrap();
        hub.subscribe(
            sub,
            Topic::Ohlcv {
                base: "M1".to_string(),
                quote: "SOL".to_string(),
                tf: "1s".to_string(),
            },
        );

        let frame = trade_frame("M1", "sig-1", 1_700_000_000_500, 1.0, 1000.0, 10.0);
        ingester.handle_frame(&frame);
        ingester.handle_frame(&frame); // duplicate delivery

        assert_eq!(db.count_swaps("M1").unwrap(), 1);
        assert_eq!(ingester.ring_candles("M1").len(), 1);

        // Both deliveries emitted a live-candle update
        assert!(matches!(
            rx.try_recv().unwrap(),
            ServerMessage::OhlcvUpdate { .. }
        ));
    }

    #[tokio::test]
    async fn one_second_aggregation_scenario() {
        let (ingester, _hub, _db) = test_ingester();
        let base = 1_700_000_000_000i64;
        let sol = sol_price::get_price_sync();

        // Prices scale with sol_amount/token_amount; choose legs so the
        // trade prices are p, 1.2p, 0.9p
        ingester.handle_frame(&trade_frame("M2", "a", base, 1.0, 1000.0, 10.0));
        ingester.handle_frame(&trade_frame("M2", "b", base + 300, 1.2, 1000.0, 10.0));
        ingester.handle_frame(&trade_frame("M2", "c", base + 700, 0.9, 1000.0, 10.0));

        let candles = ingester.ring_candles("M2");
        assert_eq!(candles.len(), 1);
        let c = candles[0];
        let p = sol / 1000.0;
        assert!((c.open - p).abs() < 1e-9);
        assert!((c.high - 1.2 * p).abs() < 1e-9);
        assert!((c.low - 0.9 * p).abs() < 1e-9);
        assert!((c.close - 0.9 * p).abs() < 1e-9);
        assert!((c.volume - (1.0 + 1.2 + 0.9) * sol).abs() < 1e-6);
    }

    #[tokio::test]
    async fn new_token_event_announces_and_subscribes() {
        let (ingester, hub, _db) = test_ingester();
        let (sub, mut rx) = hub.register().unwrap();
        hub.subscribe(sub, Topic::Pulse);

        let frame = serde_json::json!({
            "mint": "M3",
            "txType": "create",
            "symbol": "TST",
            "name": "Test Token",
            "uri": "",
            "signature": "sig-create",
            "marketCapSol": 5.0,
            "vSolInBondingCurve": 30.0,
        })
        .to_string();

        let actions = ingester.handle_frame(&frame);
        assert_eq!(actions, vec![SubAction::Subscribe("M3".to_string())]);

        match rx.try_recv().unwrap() {
            ServerMessage::PulseNewPair { token } => {
                assert_eq!(token.token.address, "M3");
                assert_eq!(token.category, PulseCategory::New);
            }
            other => panic!("unexpected {:?}", other),
        }

        assert_eq!(ingester.drain_new_tokens().len(), 1);
        assert!(ingester.drain_new_tokens().is_empty()); // drained
    }

    #[tokio::test]
    async fn proximity_promotes_new_to_graduating() {
        let (ingester, hub, _db) = test_ingester();
        let (sub, mut rx) = hub.register().unwrap();
        hub.subscribe(sub, Topic::Pulse);

        let create = serde_json::json!({
            "mint": "M4", "txType": "create", "symbol": "G", "name": "Grad",
            "signature": "s1", "marketCapSol": 5.0,
        })
        .to_string();
        ingester.handle_frame(&create);
        let _ = rx.try_recv(); // pulse:new-pair

        // Below the threshold: no promotion
        ingester.handle_frame(&trade_frame("M4", "t1", 1_000, 1.0, 1000.0, 100.0));
        assert!(ingester.graduating_snapshot().is_empty());

        // Above the 400 SOL default threshold
        ingester.handle_frame(&trade_frame("M4", "t2", 2_000, 1.0, 1000.0, 450.0));
        assert_eq!(ingester.graduating_snapshot(), vec!["M4".to_string()]);

        let saw_graduating = std::iter::from_fn(|| rx.try_recv().ok())
            .any(|m| matches!(m, ServerMessage::PulseGraduating { .. }));
        assert!(saw_graduating);
    }

    #[tokio::test]
    async fn migration_clears_memory_state_and_emits() {
        let (ingester, hub, _db) = test_ingester();
        let (sub, mut rx) = hub.register().unwrap();
        hub.subscribe(sub, Topic::Pulse);

        ingester.handle_frame(
            &serde_json::json!({
                "mint": "M5", "txType": "create", "symbol": "X", "name": "X",
                "signature": "s1", "marketCapSol": 5.0,
            })
            .to_string(),
        );
        ingester.handle_frame(&trade_frame("M5", "t", 1_000, 1.0, 1000.0, 500.0));
        assert_eq!(ingester.graduating_snapshot(), vec!["M5".to_string()]);

        ingester.handle_frame(
            &serde_json::json!({
                "mint": "M5", "txType": "migrate", "pool": "raydium-pool", "signature": "s2",
            })
            .to_string(),
        );

        assert!(ingester.graduating_snapshot().is_empty());
        assert_eq!(ingester.drain_migrations().len(), 1);

        let saw_migrated = std::iter::from_fn(|| rx.try_recv().ok())
            .any(|m| matches!(m, ServerMessage::PulseMigrated { .. }));
        assert!(saw_migrated);
    }

    #[tokio::test]
    async fn tracked_lru_evicts_and_unsubscribes() {
        let (ingester, _hub, _db) = test_ingester();

        for i in 0..TRACKED_TOKENS_CAP {
            let frame = serde_json::json!({
                "mint": format!("mint-{}", i), "txType": "create",
                "symbol": "S", "name": "N", "signature": format!("sig-{}", i),
            })
            .to_string();
            ingester.handle_frame(&frame);
        }

        // One more pushes out the oldest
        let actions = ingester.handle_frame(
            &serde_json::json!({
                "mint": "mint-overflow", "txType": "create",
                "symbol": "S", "name": "N", "signature": "sig-x",
            })
            .to_string(),
        );

        assert!(actions.contains(&SubAction::Subscribe("mint-overflow".to_string())));
        assert!(actions.contains(&SubAction::Unsubscribe("mint-0".to_string())));
    }
}
