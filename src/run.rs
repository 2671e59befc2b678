/// Runtime assembly: init -> start -> graceful shutdown
///
/// Owns component construction and lifecycle ordering. Components receive
/// their handles here; nothing reaches into another component's state.
use crate::arguments::Arguments;
use crate::config::{update_config, with_config};
use crate::database::Database;
use crate::hub::Hub;
use crate::ingester::TradeIngester;
use crate::logger::{self, LogTag};
use crate::pulse::{PulseSyncEngine, UpstreamPulseFetcher};
use crate::shutdown::SHUTDOWN;
use crate::swap_sync::{SwapSyncEngine, UpstreamSwapFetcher};
use crate::{dashboard_sync, sol_price, webserver};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

/// Grace period for in-flight work after shutdown is requested
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

pub async fn start(args: &Arguments) -> anyhow::Result<()> {
    apply_argument_overrides(args);

    let db_path = with_config(|cfg| cfg.database.path.clone());
    let db = Arc::new(Database::new(&db_path).context("database init failed")?);
    logger::info(LogTag::System, &format!("Database ready at {}", db_path));

    let hub = Hub::new();
    let swap_sync = Arc::new(SwapSyncEngine::new(db.clone(), Arc::new(UpstreamSwapFetcher)));
    let ingester = TradeIngester::new(db.clone(), hub.clone());
    let pulse = PulseSyncEngine::new(
        db.clone(),
        ingester.clone(),
        swap_sync.clone(),
        Arc::new(UpstreamPulseFetcher),
    );

    let mut handles = Vec::new();

    handles.push(sol_price::start_service());
    if args.no_ingester {
        logger::warning(LogTag::System, "Live trade ingester disabled by --no-ingester");
    } else {
        handles.push(ingester.start());
    }
    handles.extend(pulse.start());
    handles.extend(dashboard_sync::start(db.clone(), hub.clone()));
    handles.push(webserver::start(hub.clone()).await?);

    logger::info(LogTag::System, "All services started");

    // Park until Ctrl-C or an internal shutdown request
    SHUTDOWN.wait().await;

    // Stop accepting subscribers first, then give loops a bounded window to
    // observe the flag and let in-flight DB writes complete
    hub.stop_accepting();
    let drain = async {
        for handle in handles {
            let _ = handle.await;
        }
    };
    if tokio::time::timeout(SHUTDOWN_GRACE, drain).await.is_err() {
        logger::warning(
            LogTag::System,
            "Grace period expired; abandoning remaining tasks",
        );
    }

    logger::info(LogTag::System, "Shutdown complete");
    Ok(())
}

/// Fold command-line overrides into the loaded configuration
fn apply_argument_overrides(args: &Arguments) {
    if args.db_path.is_none() && args.port.is_none() {
        return;
    }

    update_config(|cfg| {
        if let Some(db_path) = &args.db_path {
            cfg.database.path = db_path.clone();
        }
        if let Some(port) = args.port {
            cfg.server.port = port;
        }
    });
}
