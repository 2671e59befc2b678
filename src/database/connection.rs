use anyhow::{Context, Result};
use rusqlite::Connection;
use std::sync::Mutex;

/// Main database connection wrapper
pub struct Database {
    pub(crate) conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database at `db_path` and ensure the schema
    pub fn new(db_path: &str) -> Result<Self> {
        if let Some(parent) = std::path::Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
            }
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database: {}", db_path))?;

        // WAL keeps readers unblocked while sync engines write
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        let db = Self {
            conn: Mutex::new(conn),
        };

        db.initialize_tables()?;
        Ok(db)
    }

    /// In-memory database for tests
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.initialize_tables()?;
        Ok(db)
    }

    /// Initialize all required database tables
    fn initialize_tables(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());

        self.create_token_table(&conn)?;
        self.create_pulse_token_table(&conn)?;
        self.create_token_swap_table(&conn)?;
        self.create_token_sync_status_table(&conn)?;
        self.create_candle_cache_table(&conn)?;

        self.create_indexes(&conn)?;

        Ok(())
    }

    /// Curated dashboard tokens
    fn create_token_table(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS token (
                address TEXT PRIMARY KEY,
                symbol TEXT NOT NULL,
                name TEXT NOT NULL,
                decimals INTEGER NOT NULL DEFAULT 9,
                logo_uri TEXT,
                price REAL NOT NULL DEFAULT 0,
                price_change_24h REAL NOT NULL DEFAULT 0,
                volume_24h REAL NOT NULL DEFAULT 0,
                market_cap REAL NOT NULL DEFAULT 0,
                liquidity REAL NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Launchpad pulse tokens (new / graduating / graduated)
    fn create_pulse_token_table(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS pulse_token (
                address TEXT PRIMARY KEY,
                symbol TEXT NOT NULL,
                name TEXT NOT NULL,
                decimals INTEGER NOT NULL DEFAULT 9,
                logo_uri TEXT,
                price REAL NOT NULL DEFAULT 0,
                price_change_24h REAL NOT NULL DEFAULT 0,
                volume_24h REAL NOT NULL DEFAULT 0,
                market_cap REAL NOT NULL DEFAULT 0,
                liquidity REAL NOT NULL DEFAULT 0,
                category TEXT NOT NULL,
                bonding_progress REAL,
                graduated_at INTEGER,
                token_created_at INTEGER,
                description TEXT,
                twitter TEXT,
                telegram TEXT,
                website TEXT,
                reply_count INTEGER NOT NULL DEFAULT 0,
                tx_count INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Immutable swap history; (token_address, tx_hash) is the idempotence key
    fn create_token_swap_table(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS token_swap (
                token_address TEXT NOT NULL,
                tx_hash TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                type TEXT NOT NULL,
                wallet_address TEXT NOT NULL,
                token_amount REAL NOT NULL,
                sol_amount REAL NOT NULL,
                price_usd REAL NOT NULL,
                total_value_usd REAL NOT NULL,
                PRIMARY KEY (token_address, tx_hash)
            )",
            [],
        )?;
        Ok(())
    }

    /// Per-token swap sync bookkeeping; single writer is the swap sync engine
    fn create_token_sync_status_table(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS token_sync_status (
                token_address TEXT PRIMARY KEY,
                swaps_synced INTEGER NOT NULL DEFAULT 0,
                oldest_swap_time INTEGER,
                newest_swap_time INTEGER,
                total_swaps INTEGER NOT NULL DEFAULT 0,
                last_swap_sync INTEGER
            )",
            [],
        )?;
        Ok(())
    }

    /// Cached upstream candles; historical buckets are write-once
    fn create_candle_cache_table(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS candle_cache (
                token_address TEXT NOT NULL,
                timeframe TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume REAL NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (token_address, timeframe, timestamp)
            )",
            [],
        )?;
        Ok(())
    }

    /// Create database indexes for performance
    fn create_indexes(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_token_swap_addr_ts
             ON token_swap(token_address, timestamp DESC)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_pulse_token_category_created
             ON pulse_token(category, token_created_at DESC)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_pulse_token_category_graduated
             ON pulse_token(category, graduated_at DESC)",
            [],
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_initializes_cleanly_twice() {
        let db = Database::in_memory().expect("open");
        // A second pass over CREATE IF NOT EXISTS must be a no-op
        db.initialize_tables().expect("re-init");
    }
}
