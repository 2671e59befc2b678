/// DexScreener API response types
use crate::types::TokenLite;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct PairsResponse {
    #[serde(default)]
    pub pairs: Vec<DexScreenerPairRaw>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DexScreenerPairRaw {
    #[serde(rename = "chainId", default)]
    pub chain_id: String,
    #[serde(rename = "dexId", default)]
    pub dex_id: String,
    #[serde(rename = "pairAddress", default)]
    pub pair_address: String,
    #[serde(rename = "baseToken")]
    pub base_token: DexScreenerToken,
    #[serde(rename = "quoteToken")]
    pub quote_token: DexScreenerToken,
    #[serde(rename = "priceUsd", default)]
    pub price_usd: Option<String>,
    #[serde(rename = "priceChange", default)]
    pub price_change: Option<PriceChange>,
    #[serde(default)]
    pub volume: Option<VolumeWindows>,
    #[serde(default)]
    pub liquidity: Option<Liquidity>,
    #[serde(rename = "marketCap", default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub info: Option<PairInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DexScreenerToken {
    pub address: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceChange {
    #[serde(default)]
    pub h24: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VolumeWindows {
    #[serde(default)]
    pub h24: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Liquidity {
    #[serde(default)]
    pub usd: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PairInfo {
    #[serde(rename = "imageUrl", default)]
    pub image_url: Option<String>,
}

impl DexScreenerPairRaw {
    /// Map to the canonical token shape, viewed from the base token
    pub fn to_token_lite(&self) -> TokenLite {
        TokenLite {
            address: self.base_token.address.clone(),
            symbol: self.base_token.symbol.clone(),
            name: self.base_token.name.clone(),
            decimals: 9,
            logo_uri: self.info.as_ref().and_then(|i| i.image_url.clone()),
            price: self
                .price_usd
                .as_deref()
                .and_then(|p| p.parse::<f64>().ok())
                .unwrap_or(0.0),
            price_change_24h: self
                .price_change
                .as_ref()
                .and_then(|c| c.h24)
                .unwrap_or(0.0),
            volume_24h: self.volume.as_ref().and_then(|v| v.h24).unwrap_or(0.0),
            market_cap: self.market_cap.unwrap_or(0.0),
            liquidity: self
                .liquidity
                .as_ref()
                .and_then(|l| l.usd)
                .unwrap_or(0.0),
        }
    }
}
