/// Pure aggregation helpers
///
/// All functions are reentrant, preserve chronological order, and are
/// idempotent over de-duplicated input.
use crate::types::{Ohlcv, TokenSwap};
use chrono::{Datelike, TimeZone, Utc};
use std::collections::BTreeMap;

/// Per-trade candles: a new candle may open at its own price instead of the
/// previous close when the inter-trade gap exceeds this
pub const MAX_GAP_MS: i64 = 5_000;

const DAY_MS: i64 = 86_400_000;
const WEEK_MS: i64 = 7 * DAY_MS;

// =============================================================================
// WEEKLY / MONTHLY ROLLUPS
// =============================================================================

/// Aggregate daily candles into weekly candles (UTC Sunday boundary)
///
/// Rules per bucket: open = first day's open, close = last day's close,
/// high/low = extremes, volume = sum.
pub fn aggregate_to_weekly(daily: &[Ohlcv]) -> Vec<Ohlcv> {
    aggregate_by_bucket(daily, week_bucket_start)
}

/// Aggregate daily candles into calendar-month candles (UTC)
pub fn aggregate_to_monthly(daily: &[Ohlcv]) -> Vec<Ohlcv> {
    aggregate_by_bucket(daily, month_bucket_start)
}

fn aggregate_by_bucket(daily: &[Ohlcv], bucket_of: fn(i64) -> i64) -> Vec<Ohlcv> {
    // De-dupe by timestamp and order chronologically before grouping;
    // repeated aggregation of the same set must be stable
    let mut deduped: BTreeMap<i64, Ohlcv> = BTreeMap::new();
    for candle in daily {
        deduped.entry(candle.timestamp).or_insert(*candle);
    }

    let mut buckets: BTreeMap<i64, Ohlcv> = BTreeMap::new();
    for (ts, candle) in deduped {
        let bucket = bucket_of(ts);
        match buckets.get_mut(&bucket) {
            None => {
                buckets.insert(
                    bucket,
                    Ohlcv::new(
                        bucket,
                        candle.open,
                        candle.high,
                        candle.low,
                        candle.close,
                        candle.volume,
                    ),
                );
            }
            Some(agg) => {
                agg.high = agg.high.max(candle.high);
                agg.low = agg.low.min(candle.low);
                agg.close = candle.close;
                agg.volume += candle.volume;
            }
        }
    }

    buckets.into_values().collect()
}

/// Start of the UTC week (Sunday 00:00) containing `ts_ms`
///
/// The epoch fell on a Thursday, so Sunday-aligned weeks are offset by
/// four days from plain `ts / WEEK_MS` bucketing.
pub fn week_bucket_start(ts_ms: i64) -> i64 {
    let days = ts_ms.div_euclid(DAY_MS);
    let day_of_week = (days + 4).rem_euclid(7); // 0 = Sunday
    (days - day_of_week) * DAY_MS
}

/// Start of the UTC calendar month containing `ts_ms`
pub fn month_bucket_start(ts_ms: i64) -> i64 {
    let dt = Utc
        .timestamp_millis_opt(ts_ms)
        .single()
        .unwrap_or_else(|| Utc.timestamp_millis_opt(0).unwrap());
    Utc.with_ymd_and_hms(dt.year(), dt.month(), 1, 0, 0, 0)
        .single()
        .map(|d| d.timestamp_millis())
        .unwrap_or(ts_ms - ts_ms.rem_euclid(WEEK_MS))
}

// =============================================================================
// SWAP BUCKETING
// =============================================================================

/// Build interval candles from swaps
///
/// Buckets by `floor(ts / interval_ms) * interval_ms`; the first swap in a
/// bucket seeds all four prices, later swaps extend high/low/close and add
/// `total_value_usd` to volume. Missing buckets between the first and last
/// observed bucket are filled with flat zero-volume candles at the previous
/// close. Returns the last `max_candles`.
pub fn build_candles_from_swaps(
    swaps: &[TokenSwap],
    interval_ms: i64,
    max_candles: usize,
) -> Vec<Ohlcv> {
    if swaps.is_empty() || interval_ms <= 0 {
        return Vec::new();
    }

    let mut ordered: Vec<&TokenSwap> = swaps.iter().filter(|s| s.price_usd > 0.0).collect();
    ordered.sort_by_key(|s| s.timestamp);

    let mut buckets: BTreeMap<i64, Ohlcv> = BTreeMap::new();
    for swap in ordered {
        let bucket = swap.timestamp.div_euclid(interval_ms) * interval_ms;
        match buckets.get_mut(&bucket) {
            None => {
                buckets.insert(
                    bucket,
                    Ohlcv::new(
                        bucket,
                        swap.price_usd,
                        swap.price_usd,
                        swap.price_usd,
                        swap.price_usd,
                        swap.total_value_usd,
                    ),
                );
            }
            Some(candle) => {
                candle.high = candle.high.max(swap.price_usd);
                candle.low = candle.low.min(swap.price_usd);
                candle.close = swap.price_usd;
                candle.volume += swap.total_value_usd;
            }
        }
    }

    let observed: Vec<Ohlcv> = buckets.into_values().collect();
    let filled = fill_gaps(&observed, interval_ms);

    if filled.len() > max_candles {
        filled[filled.len() - max_candles..].to_vec()
    } else {
        filled
    }
}

/// Emit flat candles for missing buckets between the first and last observed
fn fill_gaps(candles: &[Ohlcv], interval_ms: i64) -> Vec<Ohlcv> {
    let Some(first) = candles.first() else {
        return Vec::new();
    };
    let last_ts = candles[candles.len() - 1].timestamp;

    let mut result = Vec::with_capacity(candles.len());
    let mut next_expected = first.timestamp;
    let mut prev_close = first.open;
    let mut idx = 0usize;

    while next_expected <= last_ts {
        if idx < candles.len() && candles[idx].timestamp == next_expected {
            result.push(candles[idx]);
            prev_close = candles[idx].close;
            idx += 1;
        } else {
            result.push(Ohlcv::flat(next_expected, prev_close));
        }
        next_expected += interval_ms;
    }

    result
}

// =============================================================================
// PER-TRADE CANDLES
// =============================================================================

/// One candle per trade, chained open-to-close
///
/// `open_i = close_{i-1}` unless the inter-trade gap exceeds [`MAX_GAP_MS`];
/// high/low are the extremes of open and close. Trades with prices outside
/// `[median/10, median*10]` are dropped before chaining.
pub fn build_per_trade_candles(swaps: &[TokenSwap]) -> Vec<Ohlcv> {
    let mut ordered: Vec<&TokenSwap> = swaps.iter().filter(|s| s.price_usd > 0.0).collect();
    ordered.sort_by_key(|s| s.timestamp);

    let median = match median_price(&ordered) {
        Some(m) => m,
        None => return Vec::new(),
    };
    let (min_price, max_price) = (median / 10.0, median * 10.0);

    let mut candles: Vec<Ohlcv> = Vec::with_capacity(ordered.len());
    let mut prev: Option<(i64, f64)> = None; // (timestamp, close)

    for swap in ordered {
        if swap.price_usd < min_price || swap.price_usd > max_price {
            continue;
        }

        let open = match prev {
            Some((prev_ts, prev_close)) if swap.timestamp - prev_ts <= MAX_GAP_MS => prev_close,
            _ => swap.price_usd,
        };
        let close = swap.price_usd;

        candles.push(Ohlcv::new(
            swap.timestamp,
            open,
            open.max(close),
            open.min(close),
            close,
            swap.total_value_usd,
        ));
        prev = Some((swap.timestamp, close));
    }

    candles
}

fn median_price(ordered: &[&TokenSwap]) -> Option<f64> {
    let mut prices: Vec<f64> = ordered
        .iter()
        .map(|s| s.price_usd)
        .filter(|p| *p > 0.0)
        .collect();
    if prices.is_empty() {
        return None;
    }
    prices.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    Some(prices[prices.len() / 2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SwapSide;

    fn swap(ts: i64, price: f64, value: f64) -> TokenSwap {
        TokenSwap {
            token_address: "T".to_string(),
            tx_hash: format!("tx-{}", ts),
            timestamp: ts,
            side: SwapSide::Buy,
            wallet_address: "w".to_string(),
            token_amount: value / price,
            sol_amount: 0.0,
            price_usd: price,
            total_value_usd: value,
        }
    }

    fn daily(ts: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Ohlcv {
        Ohlcv::new(ts, open, high, low, close, volume)
    }

    #[test]
    fn week_buckets_start_on_utc_sunday() {
        // 2024-01-07 was a Sunday
        let sunday = Utc.with_ymd_and_hms(2024, 1, 7, 0, 0, 0).unwrap();
        let wednesday = Utc.with_ymd_and_hms(2024, 1, 10, 15, 30, 0).unwrap();

        assert_eq!(
            week_bucket_start(wednesday.timestamp_millis()),
            sunday.timestamp_millis()
        );
        assert_eq!(
            week_bucket_start(sunday.timestamp_millis()),
            sunday.timestamp_millis()
        );
    }

    #[test]
    fn monthly_bucket_is_calendar_first() {
        let mid = Utc.with_ymd_and_hms(2024, 2, 17, 8, 0, 0).unwrap();
        let first = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        assert_eq!(
            month_bucket_start(mid.timestamp_millis()),
            first.timestamp_millis()
        );
    }

    #[test]
    fn weekly_aggregation_rules() {
        // Mon Jan 8 + Tue Jan 9 2024, same week (Sunday Jan 7)
        let mon = Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap().timestamp_millis();
        let tue = mon + DAY_MS;

        let weekly = aggregate_to_weekly(&[
            daily(mon, 10.0, 15.0, 9.0, 12.0, 100.0),
            daily(tue, 12.0, 20.0, 11.0, 18.0, 200.0),
        ]);

        assert_eq!(weekly.len(), 1);
        let w = weekly[0];
        assert_eq!(w.open, 10.0);
        assert_eq!(w.close, 18.0);
        assert_eq!(w.high, 20.0);
        assert_eq!(w.low, 9.0);
        assert_eq!(w.volume, 300.0);
    }

    #[test]
    fn aggregation_is_idempotent_under_shuffle_and_dupes() {
        let mon = Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap().timestamp_millis();
        let days = vec![
            daily(mon, 10.0, 15.0, 9.0, 12.0, 100.0),
            daily(mon + DAY_MS, 12.0, 20.0, 11.0, 18.0, 200.0),
            daily(mon + 2 * DAY_MS, 18.0, 19.0, 14.0, 15.0, 50.0),
        ];

        let mut shuffled = days.clone();
        shuffled.reverse();
        shuffled.push(days[1]); // duplicate

        assert_eq!(aggregate_to_weekly(&days), aggregate_to_weekly(&shuffled));
    }

    #[test]
    fn swap_bucketing_matches_trade_aggregation_scenario() {
        // Three trades in one second: prices 1.0, 1.2, 0.9; values 10, 20, 30
        let base = 1_700_000_000_000i64;
        let candles = build_candles_from_swaps(
            &[
                swap(base, 1.0, 10.0),
                swap(base + 300, 1.2, 20.0),
                swap(base + 700, 0.9, 30.0),
            ],
            1_000,
            300,
        );

        assert_eq!(candles.len(), 1);
        let c = candles[0];
        assert_eq!(c.open, 1.0);
        assert_eq!(c.high, 1.2);
        assert_eq!(c.low, 0.9);
        assert_eq!(c.close, 0.9);
        assert_eq!(c.volume, 60.0);
    }

    #[test]
    fn gap_filling_emits_flat_candles() {
        let candles = build_candles_from_swaps(
            &[swap(0, 1.0, 10.0), swap(3_500, 2.0, 20.0)],
            1_000,
            300,
        );

        // Buckets 0, 1000 (gap), 2000 (gap), 3000
        assert_eq!(candles.len(), 4);
        assert_eq!(candles[1], Ohlcv::flat(1_000, 1.0));
        assert_eq!(candles[2], Ohlcv::flat(2_000, 1.0));
        assert_eq!(candles[3].close, 2.0);
    }

    #[test]
    fn max_candles_keeps_the_tail() {
        let swaps: Vec<TokenSwap> = (0..10).map(|i| swap(i * 1_000, 1.0 + i as f64, 5.0)).collect();
        let candles = build_candles_from_swaps(&swaps, 1_000, 3);
        assert_eq!(candles.len(), 3);
        assert_eq!(candles[0].timestamp, 7_000);
        assert_eq!(candles[2].timestamp, 9_000);
    }

    #[test]
    fn per_trade_candles_chain_and_break_on_gaps() {
        let candles = build_per_trade_candles(&[
            swap(0, 1.0, 10.0),
            swap(2_000, 1.5, 10.0),
            swap(10_000, 1.2, 10.0), // gap > 5s, opens at own price
        ]);

        assert_eq!(candles.len(), 3);
        assert_eq!(candles[0].open, 1.0);
        assert_eq!(candles[1].open, 1.0); // previous close
        assert_eq!(candles[1].close, 1.5);
        assert_eq!(candles[1].high, 1.5);
        assert_eq!(candles[1].low, 1.0);
        assert_eq!(candles[2].open, 1.2); // gap reset
    }

    #[test]
    fn per_trade_outlier_filter_drops_price_spikes() {
        let candles = build_per_trade_candles(&[
            swap(0, 1.0, 10.0),
            swap(1_000, 1.1, 10.0),
            swap(2_000, 500.0, 10.0), // outlier vs median ~1.1
            swap(3_000, 0.9, 10.0),
        ]);

        assert_eq!(candles.len(), 3);
        assert!(candles.iter().all(|c| c.high < 10.0));
    }
}
