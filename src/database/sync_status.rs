use crate::database::connection::Database;
use crate::database::models::SyncStatusRow;
use anyhow::Result;
use rusqlite::{params, Row};

impl Database {
    pub fn get_sync_status(&self, address: &str) -> Result<Option<SyncStatusRow>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = conn.prepare(
            "SELECT token_address, swaps_synced, oldest_swap_time, newest_swap_time,
                    total_swaps, last_swap_sync
             FROM token_sync_status WHERE token_address = ?1",
        )?;
        let mut rows = stmt.query_map([address], row_to_status)?;

        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Record a completed historical backfill
    pub fn mark_swaps_synced(
        &self,
        address: &str,
        oldest: Option<i64>,
        newest: Option<i64>,
        total: i64,
        synced_at: i64,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "INSERT INTO token_sync_status
             (token_address, swaps_synced, oldest_swap_time, newest_swap_time,
              total_swaps, last_swap_sync)
             VALUES (?1, 1, ?2, ?3, ?4, ?5)
             ON CONFLICT(token_address) DO UPDATE SET
                swaps_synced = 1,
                oldest_swap_time = excluded.oldest_swap_time,
                newest_swap_time = excluded.newest_swap_time,
                total_swaps = excluded.total_swaps,
                last_swap_sync = excluded.last_swap_sync",
            params![address, oldest, newest, total, synced_at],
        )?;
        Ok(())
    }

    /// Apply a tail-sync delta: newer watermark and additional row count
    pub fn bump_sync_tail(
        &self,
        address: &str,
        newest: Option<i64>,
        added: i64,
        synced_at: i64,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "UPDATE token_sync_status SET
                newest_swap_time = MAX(COALESCE(newest_swap_time, 0), COALESCE(?1, 0)),
                total_swaps = total_swaps + ?2,
                last_swap_sync = ?3
             WHERE token_address = ?4",
            params![newest, added, synced_at, address],
        )?;
        Ok(())
    }

    pub fn delete_sync_status(&self, address: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let deleted = conn.execute(
            "DELETE FROM token_sync_status WHERE token_address = ?1",
            params![address],
        )?;
        Ok(deleted > 0)
    }

    /// Addresses with a completed sync (orphan-cleanup candidates)
    pub fn synced_addresses(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt =
            conn.prepare("SELECT token_address FROM token_sync_status WHERE swaps_synced = 1")?;
        let iter = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut addresses = Vec::new();
        for addr in iter {
            addresses.push(addr?);
        }
        Ok(addresses)
    }
}

fn row_to_status(row: &Row) -> Result<SyncStatusRow, rusqlite::Error> {
    Ok(SyncStatusRow {
        token_address: row.get(0)?,
        swaps_synced: row.get::<_, i64>(1)? != 0,
        oldest_swap_time: row.get(2)?,
        newest_swap_time: row.get(3)?,
        total_swaps: row.get(4)?,
        last_swap_sync: row.get(5)?,
    })
}
