/// Birdeye API response types
use crate::types::TokenLite;
use serde::Deserialize;

/// Generic envelope: every endpoint wraps its payload in `{success, data}`
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenOverview {
    pub address: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub decimals: u8,
    #[serde(rename = "logoURI", default)]
    pub logo_uri: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(rename = "priceChange24hPercent", default)]
    pub price_change_24h: f64,
    #[serde(rename = "v24hUSD", default)]
    pub volume_24h: f64,
    #[serde(rename = "mc", default)]
    pub market_cap: f64,
    #[serde(default)]
    pub liquidity: f64,
}

impl TokenOverview {
    pub fn to_token_lite(&self) -> TokenLite {
        TokenLite {
            address: self.address.clone(),
            symbol: self.symbol.clone(),
            name: self.name.clone(),
            decimals: self.decimals,
            logo_uri: self.logo_uri.clone(),
            price: self.price,
            price_change_24h: self.price_change_24h,
            volume_24h: self.volume_24h,
            market_cap: self.market_cap,
            liquidity: self.liquidity,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OhlcvData {
    #[serde(default)]
    pub items: Vec<OhlcvItem>,
}

/// Upstream candle; `unix_time` is epoch seconds
#[derive(Debug, Clone, Deserialize)]
pub struct OhlcvItem {
    #[serde(rename = "unixTime")]
    pub unix_time: i64,
    pub o: f64,
    pub h: f64,
    pub l: f64,
    pub c: f64,
    #[serde(default)]
    pub v: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MultiPriceItem {
    #[serde(default)]
    pub value: f64,
    #[serde(rename = "priceChange24h", default)]
    pub price_change_24h: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrendingData {
    #[serde(default)]
    pub tokens: Vec<TrendingToken>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrendingToken {
    pub address: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub decimals: u8,
    #[serde(rename = "logoURI", default)]
    pub logo_uri: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(rename = "volume24hUSD", default)]
    pub volume_24h: f64,
    #[serde(rename = "marketcap", default)]
    pub market_cap: f64,
    #[serde(default)]
    pub liquidity: f64,
    #[serde(default)]
    pub rank: i64,
}

impl TrendingToken {
    pub fn to_token_lite(&self) -> TokenLite {
        TokenLite {
            address: self.address.clone(),
            symbol: self.symbol.clone(),
            name: self.name.clone(),
            decimals: self.decimals,
            logo_uri: self.logo_uri.clone(),
            price: self.price,
            price_change_24h: 0.0,
            volume_24h: self.volume_24h,
            market_cap: self.market_cap,
            liquidity: self.liquidity,
        }
    }
}
