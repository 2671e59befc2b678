use crate::database::connection::Database;
use crate::types::{SwapSide, TokenSwap};
use anyhow::Result;
use rusqlite::{params, Row};

impl Database {
    /// Insert swaps, skipping rows that already exist
    ///
    /// `(token_address, tx_hash)` is the idempotence key; duplicate delivery
    /// from the push feed and pull backfills land on the same constraint.
    /// Returns the number of rows actually inserted.
    pub fn insert_swaps(&self, swaps: &[TokenSwap]) -> Result<usize> {
        if swaps.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let tx = conn.transaction()?;

        let mut inserted = 0usize;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO token_swap
                 (token_address, tx_hash, timestamp, type, wallet_address,
                  token_amount, sol_amount, price_usd, total_value_usd)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(token_address, tx_hash) DO NOTHING",
            )?;

            for swap in swaps {
                inserted += stmt.execute(params![
                    swap.token_address,
                    swap.tx_hash,
                    swap.timestamp,
                    swap.side.as_str(),
                    swap.wallet_address,
                    swap.token_amount,
                    swap.sol_amount,
                    swap.price_usd,
                    swap.total_value_usd,
                ])?;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    /// Most recent swaps for a token, newest first
    pub fn get_swaps_desc(&self, address: &str, limit: usize) -> Result<Vec<TokenSwap>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = conn.prepare(
            "SELECT token_address, tx_hash, timestamp, type, wallet_address,
                    token_amount, sol_amount, price_usd, total_value_usd
             FROM token_swap WHERE token_address = ?1
             ORDER BY timestamp DESC LIMIT ?2",
        )?;
        let iter = stmt.query_map(params![address, limit as i64], row_to_swap)?;

        let mut swaps = Vec::new();
        for swap in iter {
            swaps.push(swap?);
        }
        Ok(swaps)
    }

    /// Oldest-first read window for OHLCV derivation
    ///
    /// Reads the `limit` newest swaps and returns them in ascending time
    /// order, so the window always ends at the present.
    pub fn get_swaps_asc_window(&self, address: &str, limit: usize) -> Result<Vec<TokenSwap>> {
        let mut swaps = self.get_swaps_desc(address, limit)?;
        swaps.reverse();
        Ok(swaps)
    }

    /// Sum of `total_value_usd` inside a trailing window
    pub fn sum_swap_value_since(&self, address: &str, since_ms: i64) -> Result<f64> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let total: f64 = conn.query_row(
            "SELECT COALESCE(SUM(total_value_usd), 0) FROM token_swap
             WHERE token_address = ?1 AND timestamp >= ?2",
            params![address, since_ms],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    pub fn count_swaps(&self, address: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM token_swap WHERE token_address = ?1",
            params![address],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Oldest and newest swap timestamps for a token
    pub fn swap_time_bounds(&self, address: &str) -> Result<Option<(i64, i64)>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let bounds: (Option<i64>, Option<i64>) = conn.query_row(
            "SELECT MIN(timestamp), MAX(timestamp) FROM token_swap WHERE token_address = ?1",
            params![address],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(match bounds {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        })
    }

    /// Delete all swap rows for a token (orphan cleanup)
    pub fn delete_swaps_for(&self, address: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let deleted = conn.execute(
            "DELETE FROM token_swap WHERE token_address = ?1",
            params![address],
        )?;
        Ok(deleted)
    }
}

fn row_to_swap(row: &Row) -> Result<TokenSwap, rusqlite::Error> {
    let side_str: String = row.get(3)?;
    Ok(TokenSwap {
        token_address: row.get(0)?,
        tx_hash: row.get(1)?,
        timestamp: row.get(2)?,
        side: SwapSide::from_str(&side_str).unwrap_or(SwapSide::Buy),
        wallet_address: row.get(4)?,
        token_amount: row.get(5)?,
        sol_amount: row.get(6)?,
        price_usd: row.get(7)?,
        total_value_usd: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_swap(address: &str, tx: &str, ts: i64, price: f64, value: f64) -> TokenSwap {
        TokenSwap {
            token_address: address.to_string(),
            tx_hash: tx.to_string(),
            timestamp: ts,
            side: SwapSide::Buy,
            wallet_address: "wallet-1".to_string(),
            token_amount: 1000.0,
            sol_amount: 0.5,
            price_usd: price,
            total_value_usd: value,
        }
    }

    #[test]
    fn duplicate_swaps_insert_once() {
        let db = Database::in_memory().unwrap();
        let swap = sample_swap("A", "sig-1", 1_000, 1.0, 10.0);

        assert_eq!(db.insert_swaps(&[swap.clone()]).unwrap(), 1);
        assert_eq!(db.insert_swaps(&[swap.clone()]).unwrap(), 0);
        assert_eq!(db.count_swaps("A").unwrap(), 1);
    }

    #[test]
    fn desc_read_and_time_bounds() {
        let db = Database::in_memory().unwrap();
        db.insert_swaps(&[
            sample_swap("A", "s1", 1_000, 1.0, 10.0),
            sample_swap("A", "s2", 3_000, 1.2, 20.0),
            sample_swap("A", "s3", 2_000, 1.1, 30.0),
        ])
        .unwrap();

        let swaps = db.get_swaps_desc("A", 10).unwrap();
        assert_eq!(
            swaps.iter().map(|s| s.timestamp).collect::<Vec<_>>(),
            vec![3_000, 2_000, 1_000]
        );
        assert_eq!(db.swap_time_bounds("A").unwrap(), Some((1_000, 3_000)));
    }

    #[test]
    fn windowed_value_sum() {
        let db = Database::in_memory().unwrap();
        db.insert_swaps(&[
            sample_swap("A", "s1", 1_000, 1.0, 10.0),
            sample_swap("A", "s2", 5_000, 1.2, 20.0),
        ])
        .unwrap();

        assert_eq!(db.sum_swap_value_since("A", 2_000).unwrap(), 20.0);
        assert_eq!(db.sum_swap_value_since("A", 0).unwrap(), 30.0);
        assert_eq!(db.sum_swap_value_since("B", 0).unwrap(), 0.0);
    }
}
