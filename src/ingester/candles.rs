/// In-memory 1-second candle rings
///
/// One ring per tracked token, fed directly from push trades. Buckets are
/// 1 s wide; only the last [`RING_RETENTION_SECS`] of buckets are kept.
use crate::types::Ohlcv;
use std::collections::VecDeque;

/// Ring retention window in seconds
pub const RING_RETENTION_SECS: i64 = 300;

const BUCKET_MS: i64 = 1_000;

/// Result of applying one trade to a ring
#[derive(Debug, Clone, Copy)]
pub struct RingUpdate {
    /// The candle covering the trade's bucket, after the update
    pub current: Ohlcv,
    /// The previous candle, when this trade opened a new bucket
    pub closed: Option<Ohlcv>,
}

#[derive(Debug, Default)]
pub struct OneSecondRing {
    candles: VecDeque<Ohlcv>,
}

impl OneSecondRing {
    pub fn new() -> Self {
        Self {
            candles: VecDeque::new(),
        }
    }

    /// Fold one trade into the ring
    ///
    /// Same bucket as the last candle: extend high/low/close and add volume.
    /// Newer bucket: append a candle opening at the trade price and report
    /// the prior candle as closed. Trades older than the last bucket are
    /// folded into it rather than reordering the ring.
    pub fn apply_trade(&mut self, ts_ms: i64, price: f64, value_usd: f64) -> RingUpdate {
        let bucket = ts_ms.div_euclid(BUCKET_MS) * BUCKET_MS;

        let closed = match self.candles.back_mut() {
            Some(last) if bucket <= last.timestamp => {
                last.high = last.high.max(price);
                last.low = last.low.min(price);
                last.close = price;
                last.volume += value_usd;
                let current = *last;
                self.trim(bucket);
                return RingUpdate {
                    current,
                    closed: None,
                };
            }
            Some(last) => Some(*last),
            None => None,
        };

        self.candles
            .push_back(Ohlcv::new(bucket, price, price, price, price, value_usd));
        self.trim(bucket);

        RingUpdate {
            current: *self.candles.back().expect("just pushed"),
            closed,
        }
    }

    /// Drop buckets older than the retention window
    fn trim(&mut self, newest_bucket: i64) {
        let cutoff = newest_bucket - RING_RETENTION_SECS * BUCKET_MS;
        while let Some(front) = self.candles.front() {
            if front.timestamp < cutoff {
                self.candles.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn candles(&self) -> Vec<Ohlcv> {
        self.candles.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trades_in_one_second_fold_into_one_candle() {
        let mut ring = OneSecondRing::new();
        let base = 1_700_000_000_000i64;

        ring.apply_trade(base, 1.0, 10.0);
        ring.apply_trade(base + 300, 1.2, 20.0);
        let update = ring.apply_trade(base + 700, 0.9, 30.0);

        assert_eq!(ring.len(), 1);
        let c = update.current;
        assert_eq!(c.open, 1.0);
        assert_eq!(c.high, 1.2);
        assert_eq!(c.low, 0.9);
        assert_eq!(c.close, 0.9);
        assert_eq!(c.volume, 60.0);
        assert!(update.closed.is_none());
    }

    #[test]
    fn new_bucket_closes_the_previous_candle() {
        let mut ring = OneSecondRing::new();
        let base = 1_700_000_000_000i64;

        ring.apply_trade(base, 1.0, 10.0);
        let update = ring.apply_trade(base + 1_000, 1.5, 5.0);

        assert_eq!(ring.len(), 2);
        let closed = update.closed.expect("previous candle closed");
        assert_eq!(closed.close, 1.0);
        assert_eq!(update.current.open, 1.5);
    }

    #[test]
    fn retention_window_bounds_the_ring() {
        let mut ring = OneSecondRing::new();
        let base = 1_700_000_000_000i64;

        for i in 0..400 {
            ring.apply_trade(base + i * 1_000, 1.0, 1.0);
        }

        assert!(ring.len() <= (RING_RETENTION_SECS + 1) as usize);
        let oldest = ring.candles()[0].timestamp;
        let newest = base + 399 * 1_000;
        assert!(newest - oldest <= RING_RETENTION_SECS * 1_000);
    }
}
