/// SolanaTracker API response types
///
/// Vendor field names live here and nowhere else; everything exposed to the
/// rest of the crate is either one of these structs or a canonical type.
use serde::{Deserialize, Serialize};

/// Wrapped SOL mint, the native leg in swap price derivation
pub const WSOL_MINT: &str = "So11111111111111111111111111111111111111112";

// ============================================================================
// PRICE / METADATA
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct PriceResponse {
    pub price: f64,
    #[serde(rename = "priceQuote", default)]
    pub price_quote: Option<f64>,
    #[serde(rename = "lastUpdated", default)]
    pub last_updated: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: TokenDetail,
    #[serde(default)]
    pub pools: Vec<PoolDetail>,
    #[serde(default)]
    pub buys: i64,
    #[serde(default)]
    pub sells: i64,
    #[serde(default)]
    pub txns: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenDetail {
    pub mint: String,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub decimals: u8,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub telegram: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(rename = "createdOn", default)]
    pub created_on: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolDetail {
    #[serde(rename = "poolId")]
    pub pool_id: String,
    #[serde(rename = "tokenAddress", default)]
    pub token_address: Option<String>,
    #[serde(rename = "quoteToken", default)]
    pub quote_token: Option<String>,
    #[serde(rename = "marketCap", default)]
    pub market_cap: MarketValue,
    #[serde(default)]
    pub liquidity: MarketValue,
    #[serde(default)]
    pub price: MarketValue,
    #[serde(rename = "txns", default)]
    pub txns: Option<PoolTxns>,
    #[serde(rename = "lastUpdated", default)]
    pub last_updated: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketValue {
    #[serde(default)]
    pub usd: f64,
    #[serde(default)]
    pub quote: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolTxns {
    #[serde(default)]
    pub buys: i64,
    #[serde(default)]
    pub sells: i64,
    #[serde(default)]
    pub volume: f64,
}

// ============================================================================
// SWAPS (cursor-paged)
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SwapPage {
    #[serde(default)]
    pub trades: Vec<RawTrade>,
    #[serde(rename = "nextCursor", default)]
    pub next_cursor: Option<String>,
    #[serde(rename = "hasNextPage", default)]
    pub has_next: bool,
}

/// One upstream trade; either leg may carry USD enrichment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTrade {
    pub tx: String,
    #[serde(rename = "type")]
    pub side: String,
    pub wallet: String,
    /// Epoch ms
    pub time: i64,
    /// Total trade value in USD when the upstream derived one
    #[serde(default)]
    pub volume: Option<f64>,
    pub from: TradeLeg,
    pub to: TradeLeg,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeLeg {
    pub address: String,
    pub amount: f64,
    #[serde(rename = "amountUsd", default)]
    pub amount_usd: Option<f64>,
    #[serde(rename = "priceUsd", default)]
    pub price_usd: Option<f64>,
}

// ============================================================================
// LAUNCHPAD LISTS
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct LaunchpadItem {
    pub mint: String,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub decimals: u8,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub telegram: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(rename = "priceUsd", default)]
    pub price_usd: f64,
    #[serde(rename = "marketCapUsd", default)]
    pub market_cap_usd: f64,
    #[serde(rename = "liquidityUsd", default)]
    pub liquidity_usd: f64,
    #[serde(rename = "volume24h", default)]
    pub volume_24h: f64,
    #[serde(rename = "priceChange24h", default)]
    pub price_change_24h: f64,
    #[serde(rename = "bondingProgress", default)]
    pub bonding_progress: Option<f64>,
    /// Epoch ms
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<i64>,
    /// Epoch ms, set once the token left the bonding curve
    #[serde(rename = "graduatedAt", default)]
    pub graduated_at: Option<i64>,
    #[serde(default)]
    pub txns: i64,
    #[serde(default)]
    pub replies: i64,
}

/// Launchpad list category selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchpadList {
    New,
    Graduating,
    Graduated,
}

impl LaunchpadList {
    pub fn path_segment(&self) -> &'static str {
        match self {
            LaunchpadList::New => "new",
            LaunchpadList::Graduating => "graduating",
            LaunchpadList::Graduated => "graduated",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BondingStatus {
    pub mint: String,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub complete: bool,
    #[serde(default)]
    pub graduated: bool,
}

// ============================================================================
// HOLDERS
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct HoldersResponse {
    #[serde(default)]
    pub total: i64,
    #[serde(rename = "top10Percentage", default)]
    pub top10_percentage: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopHolderEntry {
    pub address: String,
    pub amount: f64,
    #[serde(default)]
    pub percentage: f64,
}

// ============================================================================
// OHLCV
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResponse {
    #[serde(default)]
    pub oclhv: Vec<ChartCandle>,
}

/// Upstream candle; `time` is epoch seconds
#[derive(Debug, Clone, Deserialize)]
pub struct ChartCandle {
    pub time: i64,
    pub open: f64,
    pub close: f64,
    pub low: f64,
    pub high: f64,
    #[serde(default)]
    pub volume: f64,
}
