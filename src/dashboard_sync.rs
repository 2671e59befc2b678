/// Dashboard token sync
///
/// Keeps the curated `token` table fresh from the dashboard feed: the
/// trending list seeds membership, per-token market columns come from the
/// same payload, and tokens that fall off the list are removed. Price
/// updates fan out to per-token subscribers; a faster companion task
/// publishes the `dashboard:prices` snapshot while anyone is listening.
use crate::apis::get_api_manager;
use crate::config::with_config;
use crate::database::{Database, DashboardTokenRow};
use crate::hub::{DashboardPrice, Hub, ServerMessage, Topic};
use crate::logger::{self, LogTag};
use crate::shutdown::{is_shutdown_requested, SHUTDOWN};
use crate::types::now_ms;
use std::sync::Arc;
use std::time::Duration;

/// Snapshot cadence for the `dashboard` topic
const SNAPSHOT_INTERVAL_MS: u64 = 1_000;

/// Start the dashboard sync loop and the snapshot task
pub fn start(db: Arc<Database>, hub: Arc<Hub>) -> Vec<tokio::task::JoinHandle<()>> {
    let sync_db = db.clone();
    let sync_hub = hub.clone();
    let sync_handle = tokio::spawn(async move {
        let interval_ms = with_config(|cfg| cfg.dashboard.sync_interval_ms);
        let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms.max(1_000)));
        let shutdown = SHUTDOWN.notify();

        logger::info(LogTag::Dashboard, "Dashboard sync started");
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
                    sync_once(&sync_db, &sync_hub).await;
                }
            }
        }
        logger::info(LogTag::Dashboard, "Dashboard sync stopped");
    });

    let snapshot_handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(SNAPSHOT_INTERVAL_MS));
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
                    publish_snapshot(&db, &hub);
                }
            }
        }
    });

    vec![sync_handle, snapshot_handle]
}

/// One refresh pass over the curated list
async fn sync_once(db: &Arc<Database>, hub: &Arc<Hub>) {
    let list_size = with_config(|cfg| cfg.dashboard.list_size);
    let apis = get_api_manager();

    let trending = match apis.birdeye.trending(list_size).await {
        Ok(tokens) => tokens,
        Err(e) => {
            logger::warning(LogTag::Dashboard, &format!("Trending fetch failed: {}", e));
            return;
        }
    };

    if trending.is_empty() {
        logger::warning(LogTag::Dashboard, "Trending list empty; keeping current set");
        return;
    }

    let now = now_ms();
    let mut kept: Vec<String> = Vec::with_capacity(trending.len());

    for token in &trending {
        let lite = token.to_token_lite();
        kept.push(lite.address.clone());

        let row = DashboardTokenRow {
            address: lite.address.clone(),
            symbol: lite.symbol,
            name: lite.name,
            decimals: lite.decimals,
            logo_uri: lite.logo_uri,
            price: lite.price,
            price_change_24h: lite.price_change_24h,
            volume_24h: lite.volume_24h,
            market_cap: lite.market_cap,
            liquidity: lite.liquidity,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = db.upsert_dashboard_token(&row) {
            logger::warning(
                LogTag::Dashboard,
                &format!("Token upsert failed for {}: {}", row.address, e),
            );
            continue;
        }

        // Per-token price push, only where someone is subscribed
        let topic = Topic::Token(row.address.clone());
        if hub.subscriber_count(&topic) > 0 {
            hub.publish(
                &topic,
                ServerMessage::PriceUpdate {
                    address: row.address.clone(),
                    price: row.price,
                    price_change_24h: row.price_change_24h,
                    market_cap: row.market_cap,
                    volume_24h: row.volume_24h,
                    liquidity: row.liquidity,
                    timestamp: now,
                },
            );
        }
    }

    match db.delete_dashboard_tokens_not_in(&kept) {
        Ok(0) => {}
        Ok(removed) => logger::info(
            LogTag::Dashboard,
            &format!("Removed {} tokens that left the curated list", removed),
        ),
        Err(e) => logger::warning(LogTag::Dashboard, &format!("List pruning failed: {}", e)),
    }
}

/// Publish the dashboard price snapshot while the topic has subscribers
fn publish_snapshot(db: &Arc<Database>, hub: &Arc<Hub>) {
    if hub.subscriber_count(&Topic::Dashboard) == 0 {
        return;
    }

    let list_size = with_config(|cfg| cfg.dashboard.list_size);
    let tokens = match db.list_dashboard_tokens("market_cap", true, 0, list_size, None) {
        Ok(tokens) => tokens,
        Err(e) => {
            logger::warning(LogTag::Dashboard, &format!("Snapshot read failed: {}", e));
            return;
        }
    };

    let prices: Vec<DashboardPrice> = tokens
        .iter()
        .map(|t| DashboardPrice {
            address: t.address.clone(),
            price: t.price,
            price_change_24h: t.price_change_24h,
            market_cap: t.market_cap,
        })
        .collect();

    hub.publish(&Topic::Dashboard, ServerMessage::DashboardPrices { prices });
}
