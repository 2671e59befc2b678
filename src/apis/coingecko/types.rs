/// CoinGecko API response types
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CoinResponse {
    pub id: String,
    #[serde(rename = "market_data")]
    pub market_data: MarketData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketData {
    #[serde(default)]
    pub circulating_supply: Option<f64>,
    #[serde(default)]
    pub total_supply: Option<f64>,
    #[serde(default)]
    pub max_supply: Option<f64>,
}

/// Canonical supply shape handed to the read services
#[derive(Debug, Clone, serde::Serialize, Deserialize)]
pub struct CoinSupply {
    pub coin_id: String,
    pub circulating_supply: f64,
    pub total_supply: Option<f64>,
    pub max_supply: Option<f64>,
}
