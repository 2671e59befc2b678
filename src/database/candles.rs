use crate::database::connection::Database;
use crate::types::{Ohlcv, Timeframe};
use anyhow::Result;
use rusqlite::params;

impl Database {
    /// Cached candles inside `[from, to]`, ascending by bucket
    pub fn get_cached_candles(
        &self,
        address: &str,
        timeframe: Timeframe,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<Vec<Ohlcv>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = conn.prepare(
            "SELECT timestamp, open, high, low, close, volume
             FROM candle_cache
             WHERE token_address = ?1 AND timeframe = ?2
               AND timestamp >= ?3 AND timestamp <= ?4
             ORDER BY timestamp ASC",
        )?;
        let iter = stmt.query_map(
            params![address, timeframe.as_str(), from_ms, to_ms],
            |row| {
                Ok(Ohlcv {
                    timestamp: row.get(0)?,
                    open: row.get(1)?,
                    high: row.get(2)?,
                    low: row.get(3)?,
                    close: row.get(4)?,
                    volume: row.get(5)?,
                })
            },
        )?;

        let mut candles = Vec::new();
        for candle in iter {
            candles.push(candle?);
        }
        Ok(candles)
    }

    /// Upsert candles in chunks, stamping `updated_at`
    ///
    /// Callers own the immutability policy: the cache engine only passes
    /// historical buckets here when a full refetch explicitly returned them.
    pub fn upsert_candles(
        &self,
        address: &str,
        timeframe: Timeframe,
        candles: &[Ohlcv],
        chunk_size: usize,
        updated_at: i64,
    ) -> Result<usize> {
        if candles.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut written = 0usize;

        for chunk in candles.chunks(chunk_size.max(1)) {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO candle_cache
                     (token_address, timeframe, timestamp, open, high, low, close, volume, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                     ON CONFLICT(token_address, timeframe, timestamp) DO UPDATE SET
                        open = excluded.open,
                        high = excluded.high,
                        low = excluded.low,
                        close = excluded.close,
                        volume = excluded.volume,
                        updated_at = excluded.updated_at",
                )?;
                for candle in chunk {
                    written += stmt.execute(params![
                        address,
                        timeframe.as_str(),
                        candle.timestamp,
                        candle.open,
                        candle.high,
                        candle.low,
                        candle.close,
                        candle.volume,
                        updated_at,
                    ])?;
                }
            }
            tx.commit()?;
        }

        Ok(written)
    }

    /// Most recent `updated_at` across a token/timeframe (live-candle staleness)
    pub fn latest_candle_update(
        &self,
        address: &str,
        timeframe: Timeframe,
    ) -> Result<Option<i64>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let updated: Option<i64> = conn.query_row(
            "SELECT MAX(updated_at) FROM candle_cache
             WHERE token_address = ?1 AND timeframe = ?2",
            params![address, timeframe.as_str()],
            |row| row.get(0),
        )?;
        Ok(updated)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_read_is_ascending_and_inclusive() {
        let db = Database::in_memory().unwrap();
        let candles = vec![
            Ohlcv::new(3_600_000, 1.0, 1.2, 0.9, 1.1, 10.0),
            Ohlcv::new(7_200_000, 1.1, 1.3, 1.0, 1.2, 20.0),
            Ohlcv::new(10_800_000, 1.2, 1.4, 1.1, 1.3, 30.0),
        ];
        db.upsert_candles("T", Timeframe::Hour1, &candles, 100, 1)
            .unwrap();

        let read = db
            .get_cached_candles("T", Timeframe::Hour1, 3_600_000, 7_200_000)
            .unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[0].timestamp, 3_600_000);
        assert_eq!(read[1].timestamp, 7_200_000);
    }

    #[test]
    fn timeframes_do_not_collide() {
        let db = Database::in_memory().unwrap();
        let candle = vec![Ohlcv::new(0, 1.0, 1.0, 1.0, 1.0, 1.0)];
        db.upsert_candles("T", Timeframe::Hour1, &candle, 100, 1)
            .unwrap();
        db.upsert_candles("T", Timeframe::Day1, &candle, 100, 1)
            .unwrap();

        assert_eq!(
            db.get_cached_candles("T", Timeframe::Hour1, 0, 10).unwrap().len(),
            1
        );
        assert_eq!(
            db.get_cached_candles("T", Timeframe::Day1, 0, 10).unwrap().len(),
            1
        );
    }

    #[test]
    fn upsert_overwrites_same_bucket() {
        let db = Database::in_memory().unwrap();
        db.upsert_candles(
            "T",
            Timeframe::Minute1,
            &[Ohlcv::new(60_000, 1.0, 1.0, 1.0, 1.0, 1.0)],
            100,
            1,
        )
        .unwrap();
        db.upsert_candles(
            "T",
            Timeframe::Minute1,
            &[Ohlcv::new(60_000, 2.0, 2.5, 1.8, 2.2, 9.0)],
            100,
            2,
        )
        .unwrap();

        let read = db
            .get_cached_candles("T", Timeframe::Minute1, 0, 120_000)
            .unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].close, 2.2);
        assert_eq!(db.latest_candle_update("T", Timeframe::Minute1).unwrap(), Some(2));
    }
}
