/// Canonical internal types shared across components
///
/// Upstream adapters translate vendor payloads into these shapes at the
/// boundary; nothing vendor-specific leaks past the `apis` modules.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// TIMEFRAMES
// =============================================================================

/// Supported candle timeframes
///
/// `Second1` exists only for the live in-memory ring and swap-derived reads;
/// the candle cache persists `Minute1` and coarser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1s")]
    Second1,
    #[serde(rename = "1m")]
    Minute1,
    #[serde(rename = "5m")]
    Minute5,
    #[serde(rename = "15m")]
    Minute15,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "1d")]
    Day1,
    #[serde(rename = "1w")]
    Week1,
    #[serde(rename = "1M")]
    Month1,
}

impl Timeframe {
    /// Bucket width in milliseconds
    ///
    /// `Month1` uses a 30-day nominal width; calendar-exact monthly buckets
    /// are produced by the aggregation helpers, not by fixed-width bucketing.
    pub fn interval_ms(&self) -> i64 {
        match self {
            Timeframe::Second1 => 1_000,
            Timeframe::Minute1 => 60_000,
            Timeframe::Minute5 => 300_000,
            Timeframe::Minute15 => 900_000,
            Timeframe::Hour1 => 3_600_000,
            Timeframe::Hour4 => 14_400_000,
            Timeframe::Day1 => 86_400_000,
            Timeframe::Week1 => 604_800_000,
            Timeframe::Month1 => 2_592_000_000,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Second1 => "1s",
            Timeframe::Minute1 => "1m",
            Timeframe::Minute5 => "5m",
            Timeframe::Minute15 => "15m",
            Timeframe::Hour1 => "1h",
            Timeframe::Hour4 => "4h",
            Timeframe::Day1 => "1d",
            Timeframe::Week1 => "1w",
            Timeframe::Month1 => "1M",
        }
    }

    pub fn from_str(s: &str) -> Option<Timeframe> {
        match s {
            "1s" => Some(Timeframe::Second1),
            "1m" => Some(Timeframe::Minute1),
            "5m" => Some(Timeframe::Minute5),
            "15m" => Some(Timeframe::Minute15),
            "1h" => Some(Timeframe::Hour1),
            "4h" => Some(Timeframe::Hour4),
            "1d" => Some(Timeframe::Day1),
            "1w" => Some(Timeframe::Week1),
            "1M" => Some(Timeframe::Month1),
            _ => None,
        }
    }

    /// Timeframes persisted in the candle cache
    pub fn cacheable() -> &'static [Timeframe] {
        &[
            Timeframe::Minute1,
            Timeframe::Minute5,
            Timeframe::Minute15,
            Timeframe::Hour1,
            Timeframe::Hour4,
            Timeframe::Day1,
            Timeframe::Week1,
            Timeframe::Month1,
        ]
    }

    /// Whether this timeframe is served by daily-candle aggregation
    pub fn is_aggregated(&self) -> bool {
        matches!(self, Timeframe::Week1 | Timeframe::Month1)
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// CANDLES
// =============================================================================

/// A single OHLCV candle; `timestamp` is the bucket start in epoch ms
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ohlcv {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Ohlcv {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// A zero-volume candle flat at `price` (used for gap filling)
    pub fn flat(timestamp: i64, price: f64) -> Self {
        Self::new(timestamp, price, price, price, price, 0.0)
    }

    /// Validates OHLC ordering and non-negative volume
    pub fn is_valid(&self) -> bool {
        self.high >= self.low
            && self.open >= self.low
            && self.open <= self.high
            && self.close >= self.low
            && self.close <= self.high
            && self.volume >= 0.0
    }
}

// =============================================================================
// TOKENS
// =============================================================================

/// Common market columns shared by dashboard and pulse tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenLite {
    pub address: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    pub price: f64,
    pub price_change_24h: f64,
    pub volume_24h: f64,
    pub market_cap: f64,
    pub liquidity: f64,
}

/// Pulse token lifecycle category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PulseCategory {
    New,
    Graduating,
    Graduated,
}

impl PulseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PulseCategory::New => "new",
            PulseCategory::Graduating => "graduating",
            PulseCategory::Graduated => "graduated",
        }
    }

    pub fn from_str(s: &str) -> Option<PulseCategory> {
        match s {
            "new" => Some(PulseCategory::New),
            "graduating" => Some(PulseCategory::Graduating),
            "graduated" => Some(PulseCategory::Graduated),
            _ => None,
        }
    }
}

impl fmt::Display for PulseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which system produced a token record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenSource {
    Db,
    Metadata,
    DexPairs,
    Dashboard,
    Push,
}

/// Pulse token as served to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseTokenOut {
    #[serde(flatten)]
    pub token: TokenLite,
    pub category: PulseCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tx_count: i64,
    pub reply_count: i64,
    /// Token creation time, epoch ms
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bonding_progress: Option<f64>,
    /// Graduation time, epoch ms
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graduated_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complete: Option<bool>,
    pub source: TokenSource,
}

// =============================================================================
// SWAPS / TRADES
// =============================================================================

/// Swap direction relative to the tracked token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapSide {
    Buy,
    Sell,
}

impl SwapSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwapSide::Buy => "buy",
            SwapSide::Sell => "sell",
        }
    }

    pub fn from_str(s: &str) -> Option<SwapSide> {
        match s {
            "buy" => Some(SwapSide::Buy),
            "sell" => Some(SwapSide::Sell),
            _ => None,
        }
    }
}

/// Canonical persisted swap row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSwap {
    pub token_address: String,
    pub tx_hash: String,
    /// Epoch ms
    pub timestamp: i64,
    pub side: SwapSide,
    pub wallet_address: String,
    pub token_amount: f64,
    pub sol_amount: f64,
    pub price_usd: f64,
    pub total_value_usd: f64,
}

/// Trade as served to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeOut {
    pub tx_hash: String,
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub side: SwapSide,
    pub wallet: String,
    pub token_amount: f64,
    pub token_amount_usd: f64,
    pub token_symbol: String,
    pub other_amount: f64,
    pub other_symbol: String,
    pub other_amount_usd: f64,
    pub price_usd: f64,
    pub total_value_usd: f64,
}

// =============================================================================
// HOLDERS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolderStats {
    pub holder_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top10_percent: Option<f64>,
    pub top_holders: Vec<TopHolder>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopHolder {
    pub wallet: String,
    pub amount: f64,
    pub percent: f64,
}

// =============================================================================
// HELPERS
// =============================================================================

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn ms_to_datetime(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeframe_round_trips_through_strings() {
        for tf in Timeframe::cacheable() {
            assert_eq!(Timeframe::from_str(tf.as_str()), Some(*tf));
        }
        assert_eq!(Timeframe::from_str("1s"), Some(Timeframe::Second1));
        assert_eq!(Timeframe::from_str("2h"), None);
    }

    #[test]
    fn flat_candle_is_valid() {
        let c = Ohlcv::flat(1_700_000_000_000, 0.42);
        assert!(c.is_valid());
        assert_eq!(c.open, c.close);
        assert_eq!(c.volume, 0.0);
    }

    #[test]
    fn invalid_candle_detected() {
        let c = Ohlcv::new(0, 2.0, 1.5, 1.0, 1.2, 5.0);
        assert!(!c.is_valid()); // open above high
    }
}
