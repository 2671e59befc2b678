/// Fan-out wire protocol
///
/// Tagged JSON messages in both directions. The `type` field carries the
/// protocol name; payload fields sit beside it.
use crate::types::{Ohlcv, PulseTokenOut, TradeOut};
use serde::{Deserialize, Serialize};

// =============================================================================
// CLIENT -> SERVER
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "subscribe:token")]
    SubscribeToken { address: String },
    #[serde(rename = "unsubscribe:token")]
    UnsubscribeToken { address: String },

    #[serde(rename = "subscribe:pulse")]
    SubscribePulse,
    #[serde(rename = "unsubscribe:pulse")]
    UnsubscribePulse,

    #[serde(rename = "subscribe:dashboard")]
    SubscribeDashboard,
    #[serde(rename = "unsubscribe:dashboard")]
    UnsubscribeDashboard,

    #[serde(rename = "subscribe:ohlcv")]
    SubscribeOhlcv {
        base: String,
        quote: String,
        tf: String,
    },
    #[serde(rename = "unsubscribe:ohlcv")]
    UnsubscribeOhlcv {
        base: String,
        quote: String,
        tf: String,
    },

    #[serde(rename = "subscribe:trades")]
    SubscribeTrades { base: String, quote: String },
    #[serde(rename = "unsubscribe:trades")]
    UnsubscribeTrades { base: String, quote: String },
}

// =============================================================================
// SERVER -> CLIENT
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "price:update")]
    PriceUpdate {
        address: String,
        price: f64,
        price_change_24h: f64,
        market_cap: f64,
        volume_24h: f64,
        liquidity: f64,
        timestamp: i64,
    },

    #[serde(rename = "pulse:new-pair")]
    PulseNewPair { token: PulseTokenOut },

    #[serde(rename = "pulse:graduating")]
    PulseGraduating {
        address: String,
        market_cap_sol: f64,
        timestamp: i64,
    },

    #[serde(rename = "pulse:migrated")]
    PulseMigrated {
        address: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pool: Option<String>,
        timestamp: i64,
    },

    #[serde(rename = "pulse:token-update")]
    PulseTokenUpdate {
        address: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        logo_uri: Option<String>,
    },

    #[serde(rename = "ohlcv:update")]
    OhlcvUpdate {
        base: String,
        quote: String,
        tf: String,
        candle: Ohlcv,
    },

    #[serde(rename = "ohlcv:closed")]
    OhlcvClosed {
        base: String,
        quote: String,
        tf: String,
        candle: Ohlcv,
    },

    #[serde(rename = "trade")]
    Trade {
        base: String,
        quote: String,
        trade: TradeOut,
    },

    #[serde(rename = "dashboard:prices")]
    DashboardPrices { prices: Vec<DashboardPrice> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardPrice {
    pub address: String,
    pub price: f64,
    pub price_change_24h: f64,
    pub market_cap: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_protocol_round_trips() {
        let raw = r#"{"type":"subscribe:ohlcv","base":"MintA","quote":"SOL","tf":"1m"}"#;
        let msg: ClientMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(
            msg,
            ClientMessage::SubscribeOhlcv {
                base: "MintA".to_string(),
                quote: "SOL".to_string(),
                tf: "1m".to_string(),
            }
        );

        let raw = r#"{"type":"subscribe:pulse"}"#;
        assert_eq!(
            serde_json::from_str::<ClientMessage>(raw).unwrap(),
            ClientMessage::SubscribePulse
        );
    }

    #[test]
    fn server_messages_carry_protocol_names() {
        let msg = ServerMessage::PulseTokenUpdate {
            address: "A".to_string(),
            logo_uri: Some("https://x/logo.png".to_string()),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "pulse:token-update");
        assert_eq!(json["address"], "A");
    }
}
