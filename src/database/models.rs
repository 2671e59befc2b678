/// Row structs for the persisted tables
///
/// These mirror the table columns one-to-one; conversion to the canonical
/// client-facing types happens at the service layer.
use crate::types::{PulseCategory, PulseTokenOut, TokenLite, TokenSource};
use serde::{Deserialize, Serialize};

/// Row of the curated `token` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardTokenRow {
    pub address: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub logo_uri: Option<String>,
    pub price: f64,
    pub price_change_24h: f64,
    pub volume_24h: f64,
    pub market_cap: f64,
    pub liquidity: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl DashboardTokenRow {
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

/// Row of the `pulse_token` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseTokenRow {
    pub address: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub logo_uri: Option<String>,
    pub price: f64,
    pub price_change_24h: f64,
    pub volume_24h: f64,
    pub market_cap: f64,
    pub liquidity: f64,
    pub category: PulseCategory,
    pub bonding_progress: Option<f64>,
    pub graduated_at: Option<i64>,
    pub token_created_at: Option<i64>,
    pub description: Option<String>,
    pub twitter: Option<String>,
    pub telegram: Option<String>,
    pub website: Option<String>,
    pub reply_count: i64,
    pub tx_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl PulseTokenRow {
    pub fn to_out(&self, source: TokenSource) -> PulseTokenOut {
        PulseTokenOut {
            token: TokenLite {
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
            },
            category: self.category,
            description: self.description.clone(),
            tx_count: self.tx_count,
            reply_count: self.reply_count,
            created_at: self.token_created_at.unwrap_or(self.created_at),
            twitter: self.twitter.clone(),
            telegram: self.telegram.clone(),
            website: self.website.clone(),
            bonding_progress: self.bonding_progress,
            graduated_at: self.graduated_at,
            complete: Some(self.category == PulseCategory::Graduated),
            source,
        }
    }
}

/// Row of the `token_sync_status` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncStatusRow {
    pub token_address: String,
    pub swaps_synced: bool,
    pub oldest_swap_time: Option<i64>,
    pub newest_swap_time: Option<i64>,
    pub total_swaps: i64,
    pub last_swap_sync: Option<i64>,
}
