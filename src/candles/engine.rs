/// Candle cache engine
///
/// Caches upstream candles for dashboard tokens. For a given timeframe the
/// bucket containing "now" is the live candle; every earlier bucket is
/// historical and immutable once stored. Historical rows are only rewritten
/// when a full range refetch explicitly returned those buckets.
use crate::candles::aggregate::{aggregate_to_monthly, aggregate_to_weekly};
use crate::config::with_config;
use crate::database::Database;
use crate::errors::ApiResult;
use crate::logger::{self, LogTag};
use crate::types::{now_ms, Ohlcv, Timeframe};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Fetch seam for upstream candles; the read service hands in a fetcher
/// bound to the dashboard feed, tests hand in fixtures
#[async_trait]
pub trait CandleFetcher: Send + Sync {
    async fn fetch(
        &self,
        address: &str,
        timeframe: Timeframe,
        from_ms: i64,
        to_ms: i64,
    ) -> ApiResult<Vec<Ohlcv>>;
}

/// How many candles must be present relative to the expected count before
/// the cached range is trusted
const COMPLETENESS_RATIO: f64 = 0.5;

pub struct CandleCacheEngine {
    db: Arc<Database>,
}

impl CandleCacheEngine {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Serve candles in `[from, to]`, fetching from upstream only where the
    /// cache cannot answer
    pub async fn get_candles(
        &self,
        address: &str,
        timeframe: Timeframe,
        from_ms: i64,
        to_ms: i64,
        fetcher: &dyn CandleFetcher,
    ) -> anyhow::Result<Vec<Ohlcv>> {
        self.get_candles_at(now_ms(), address, timeframe, from_ms, to_ms, fetcher)
            .await
    }

    /// Same as [`get_candles`] with an explicit clock (testable)
    pub async fn get_candles_at(
        &self,
        now: i64,
        address: &str,
        timeframe: Timeframe,
        from_ms: i64,
        to_ms: i64,
        fetcher: &dyn CandleFetcher,
    ) -> anyhow::Result<Vec<Ohlcv>> {
        if timeframe.is_aggregated() {
            return self
                .get_aggregated_candles(address, timeframe, from_ms, to_ms, fetcher)
                .await;
        }

        let interval = timeframe.interval_ms();
        let live_refresh_ms = with_config(|cfg| cfg.candles.live_refresh_ms);
        let cached = self
            .db
            .get_cached_candles(address, timeframe, from_ms, to_ms)?;

        // Bucket count over an inclusive range; both endpoints' buckets can
        // hold a cached row
        let expected = ((to_ms - from_ms) / interval + 1).max(0) as usize;
        let incomplete = (cached.len() as f64) < COMPLETENESS_RATIO * expected as f64;

        if incomplete {
            logger::debug(
                LogTag::Candles,
                &format!(
                    "Cache incomplete for {} {} ({}/{} candles), refetching range",
                    address,
                    timeframe,
                    cached.len(),
                    expected
                ),
            );
            return self
                .refetch_range(now, address, timeframe, from_ms, to_ms, &cached, fetcher)
                .await;
        }

        let needs_older = cached
            .first()
            .map(|c| c.timestamp > from_ms + interval)
            .unwrap_or(true);
        let last_updated = self.db.latest_candle_update(address, timeframe)?;
        let needs_live = last_updated
            .map(|u| now - u > live_refresh_ms)
            .unwrap_or(true);

        if needs_older {
            return self
                .refetch_range(now, address, timeframe, from_ms, to_ms, &cached, fetcher)
                .await;
        }

        if needs_live {
            let live_bucket = now.div_euclid(interval) * interval;
            let fetch_from = live_bucket - interval;

            let fetched = fetcher
                .fetch(address, timeframe, fetch_from, now)
                .await
                .unwrap_or_else(|e| {
                    logger::warning(
                        LogTag::Candles,
                        &format!("Live candle refresh failed for {}: {}", address, e),
                    );
                    Vec::new()
                });

            // Only buckets inside the refresh window may be written; anything
            // older is historical and must stay untouched
            let writable: Vec<Ohlcv> = fetched
                .into_iter()
                .filter(|c| c.timestamp >= fetch_from)
                .collect();

            if !writable.is_empty() {
                let chunk = with_config(|cfg| cfg.candles.write_chunk);
                self.db
                    .upsert_candles(address, timeframe, &writable, chunk, now)?;
            }

            return Ok(merge_candles(&cached, &writable, from_ms, to_ms));
        }

        Ok(cached)
    }

    /// Full-range refetch; the upstream answer replaces the cached view
    async fn refetch_range(
        &self,
        now: i64,
        address: &str,
        timeframe: Timeframe,
        from_ms: i64,
        to_ms: i64,
        cached: &[Ohlcv],
        fetcher: &dyn CandleFetcher,
    ) -> anyhow::Result<Vec<Ohlcv>> {
        let fetched = match fetcher.fetch(address, timeframe, from_ms, to_ms).await {
            Ok(candles) => candles,
            Err(e) => {
                logger::warning(
                    LogTag::Candles,
                    &format!("Range fetch failed for {} {}: {}", address, timeframe, e),
                );
                return Ok(cached.to_vec());
            }
        };

        if !fetched.is_empty() {
            let chunk = with_config(|cfg| cfg.candles.write_chunk);
            self.db
                .upsert_candles(address, timeframe, &fetched, chunk, now)?;
        }

        Ok(merge_candles(cached, &fetched, from_ms, to_ms))
    }

    /// Weekly / monthly reads
    ///
    /// Consult the cache under `1w` / `1M` first; on miss, fetch daily
    /// candles spanning the window and aggregate. Aggregates are not written
    /// back; a dedicated population job owns those rows.
    async fn get_aggregated_candles(
        &self,
        address: &str,
        timeframe: Timeframe,
        from_ms: i64,
        to_ms: i64,
        fetcher: &dyn CandleFetcher,
    ) -> anyhow::Result<Vec<Ohlcv>> {
        let cached = self
            .db
            .get_cached_candles(address, timeframe, from_ms, to_ms)?;
        if !cached.is_empty() {
            return Ok(cached);
        }

        let daily = fetcher
            .fetch(address, Timeframe::Day1, from_ms, to_ms)
            .await
            .unwrap_or_default();

        let aggregated = match timeframe {
            Timeframe::Month1 => aggregate_to_monthly(&daily),
            _ => aggregate_to_weekly(&daily),
        };

        Ok(aggregated
            .into_iter()
            .filter(|c| c.timestamp >= from_ms && c.timestamp <= to_ms)
            .collect())
    }
}

/// Merge cached and fetched candles; fetched wins on bucket collision
fn merge_candles(cached: &[Ohlcv], fetched: &[Ohlcv], from_ms: i64, to_ms: i64) -> Vec<Ohlcv> {
    let mut merged: BTreeMap<i64, Ohlcv> = BTreeMap::new();
    for candle in cached {
        merged.insert(candle.timestamp, *candle);
    }
    for candle in fetched {
        merged.insert(candle.timestamp, *candle);
    }

    merged
        .into_values()
        .filter(|c| c.timestamp >= from_ms && c.timestamp <= to_ms)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Fixture fetcher: serves a fixed candle series, records every call
    struct FixtureFetcher {
        candles: Vec<Ohlcv>,
        calls: AtomicUsize,
        requested: Mutex<Vec<(i64, i64)>>,
    }

    impl FixtureFetcher {
        fn new(candles: Vec<Ohlcv>) -> Self {
            Self {
                candles,
                calls: AtomicUsize::new(0),
                requested: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CandleFetcher for FixtureFetcher {
        async fn fetch(
            &self,
            _address: &str,
            _timeframe: Timeframe,
            from_ms: i64,
            to_ms: i64,
        ) -> ApiResult<Vec<Ohlcv>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requested.lock().unwrap().push((from_ms, to_ms));
            Ok(self
                .candles
                .iter()
                .filter(|c| c.timestamp >= from_ms && c.timestamp <= to_ms)
                .copied()
                .collect())
        }
    }

    const HOUR: i64 = 3_600_000;

    fn hourly_series(from: i64, count: usize) -> Vec<Ohlcv> {
        (0..count)
            .map(|i| {
                let ts = from + (i as i64) * HOUR;
                Ohlcv::new(ts, 1.0 + i as f64, 2.0 + i as f64, 0.5, 1.5 + i as f64, 10.0)
            })
            .collect()
    }

    #[tokio::test]
    async fn first_call_fetches_second_call_hits_cache_then_live_only() {
        let db = Arc::new(Database::in_memory().unwrap());
        let engine = CandleCacheEngine::new(db.clone());

        let now = 120 * HOUR + 1_800_000; // mid-bucket
        let from = now - 120 * HOUR;
        let series = hourly_series(0, 121);
        let fetcher = FixtureFetcher::new(series);

        // Cold cache: one full-range fetch
        let first = engine
            .get_candles_at(now, "T", Timeframe::Hour1, from, now, &fetcher)
            .await
            .unwrap();
        assert_eq!(fetcher.call_count(), 1);
        assert!(first.len() >= 120);

        // Warm cache within the live refresh window: no fetch at all
        let second = engine
            .get_candles_at(now + 1_000, "T", Timeframe::Hour1, from, now, &fetcher)
            .await
            .unwrap();
        assert_eq!(fetcher.call_count(), 1);
        assert_eq!(first.len(), second.len());

        // Past the live refresh window: only the live bucket is refetched
        let later = now + with_config(|cfg| cfg.candles.live_refresh_ms) + 1;
        engine
            .get_candles_at(later, "T", Timeframe::Hour1, from, now, &fetcher)
            .await
            .unwrap();
        assert_eq!(fetcher.call_count(), 2);
        let (last_from, _) = *fetcher.requested.lock().unwrap().last().unwrap();
        let live_bucket = later.div_euclid(HOUR) * HOUR;
        assert_eq!(last_from, live_bucket - HOUR);
    }

    #[tokio::test]
    async fn historical_rows_survive_live_refresh_byte_identical() {
        let db = Arc::new(Database::in_memory().unwrap());
        let engine = CandleCacheEngine::new(db.clone());

        let now = 50 * HOUR + 600_000;
        let from = 0;
        let fetcher = FixtureFetcher::new(hourly_series(0, 51));

        engine
            .get_candles_at(now, "T", Timeframe::Hour1, from, now, &fetcher)
            .await
            .unwrap();
        let before = db.get_cached_candles("T", Timeframe::Hour1, 0, 40 * HOUR).unwrap();

        // Live-only refresh against a fetcher that would return different
        // values everywhere; only the live window may change
        let mutated: Vec<Ohlcv> = hourly_series(0, 51)
            .into_iter()
            .map(|mut c| {
                c.close += 100.0;
                c.high += 100.0;
                c
            })
            .collect();
        let mutating_fetcher = FixtureFetcher::new(mutated);

        let later = now + with_config(|cfg| cfg.candles.live_refresh_ms) + 1;
        engine
            .get_candles_at(later, "T", Timeframe::Hour1, from, now, &mutating_fetcher)
            .await
            .unwrap();

        let after = db.get_cached_candles("T", Timeframe::Hour1, 0, 40 * HOUR).unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn weekly_aggregates_from_daily_without_writeback() {
        let db = Arc::new(Database::in_memory().unwrap());
        let engine = CandleCacheEngine::new(db.clone());

        const DAY: i64 = 86_400_000;
        // Two full weeks of daily candles starting on a Sunday bucket
        let week_start = crate::candles::aggregate::week_bucket_start(1_700_000_000_000);
        let daily: Vec<Ohlcv> = (0..14)
            .map(|i| Ohlcv::new(week_start + i * DAY, 1.0, 2.0, 0.5, 1.5, 10.0))
            .collect();
        let fetcher = FixtureFetcher::new(daily);

        let candles = engine
            .get_candles_at(
                week_start + 15 * DAY,
                "T",
                Timeframe::Week1,
                week_start,
                week_start + 14 * DAY,
                &fetcher,
            )
            .await
            .unwrap();

        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].volume, 70.0);

        // No write-back under the weekly timeframe
        let cached = db
            .get_cached_candles("T", Timeframe::Week1, 0, i64::MAX / 2)
            .unwrap();
        assert!(cached.is_empty());
    }
}
