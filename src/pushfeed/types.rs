/// PumpPortal push feed payload types
///
/// The wire format is a single JSON object stream where `txType`
/// discriminates the event. Decoding happens here so only tagged variants
/// reach the ingester.
use serde::{Deserialize, Serialize};

/// A decoded push feed event
#[derive(Debug, Clone)]
pub enum PushEvent {
    NewToken(NewTokenEvent),
    Trade(TradeEvent),
    Migration(MigrationEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTokenEvent {
    pub mint: String,
    pub symbol: String,
    pub name: String,
    /// Metadata URI (usually IPFS) holding the token image
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(rename = "traderPublicKey", default)]
    pub creator: String,
    #[serde(rename = "initialBuy", default)]
    pub initial_buy: f64,
    #[serde(rename = "marketCapSol", default)]
    pub market_cap_sol: f64,
    #[serde(rename = "vSolInBondingCurve", default)]
    pub v_sol_in_bonding_curve: f64,
    pub signature: String,
    /// Epoch ms; absent on some frames, stamped at receipt
    #[serde(default)]
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeEvent {
    pub mint: String,
    /// "buy" or "sell"
    #[serde(rename = "txType")]
    pub tx_type: String,
    #[serde(rename = "tokenAmount", default)]
    pub token_amount: f64,
    #[serde(rename = "solAmount", default)]
    pub sol_amount: f64,
    #[serde(rename = "vSolInBondingCurve", default)]
    pub v_sol_in_bonding_curve: f64,
    #[serde(rename = "marketCapSol", default)]
    pub market_cap_sol: f64,
    #[serde(rename = "traderPublicKey", default)]
    pub trader: String,
    pub signature: String,
    #[serde(default)]
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationEvent {
    pub mint: String,
    /// Destination DEX pool the token graduated into
    #[serde(default)]
    pub pool: Option<String>,
    pub signature: String,
    #[serde(default)]
    pub timestamp: i64,
}

/// Decode one raw frame into a typed event
///
/// Frames that are not events (subscription acks, heartbeats) decode to
/// `None`; malformed event frames are a decode error for the caller to
/// count and skip.
pub fn decode_event(raw: &str, received_at_ms: i64) -> Result<Option<PushEvent>, String> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {}", e))?;

    let tx_type = match value.get("txType").and_then(|v| v.as_str()) {
        Some(t) => t.to_string(),
        None => return Ok(None), // ack or heartbeat
    };

    let stamp = |ts: i64| if ts > 0 { ts } else { received_at_ms };

    match tx_type.as_str() {
        "create" => {
            let mut event: NewTokenEvent = serde_json::from_value(value)
                .map_err(|e| format!("bad create event: {}", e))?;
            event.timestamp = stamp(event.timestamp);
            Ok(Some(PushEvent::NewToken(event)))
        }
        "buy" | "sell" => {
            let mut event: TradeEvent =
                serde_json::from_value(value).map_err(|e| format!("bad trade event: {}", e))?;
            event.timestamp = stamp(event.timestamp);
            Ok(Some(PushEvent::Trade(event)))
        }
        "migrate" => {
            let mut event: MigrationEvent = serde_json::from_value(value)
                .map_err(|e| format!("bad migration event: {}", e))?;
            event.timestamp = stamp(event.timestamp);
            Ok(Some(PushEvent::Migration(event)))
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_trade_event() {
        let raw = r#"{
            "mint": "MintA",
            "txType": "buy",
            "tokenAmount": 1000.0,
            "solAmount": 0.5,
            "vSolInBondingCurve": 35.2,
            "marketCapSol": 42.0,
            "traderPublicKey": "Trader1",
            "signature": "sig-1"
        }"#;

        let event = decode_event(raw, 1_700_000_000_000).unwrap().unwrap();
        match event {
            PushEvent::Trade(t) => {
                assert_eq!(t.mint, "MintA");
                assert_eq!(t.tx_type, "buy");
                assert_eq!(t.timestamp, 1_700_000_000_000); // stamped at receipt
            }
            _ => panic!("expected trade"),
        }
    }

    #[test]
    fn decodes_create_and_migrate() {
        let create = r#"{"mint":"M","txType":"create","symbol":"X","name":"Y","signature":"s"}"#;
        assert!(matches!(
            decode_event(create, 1).unwrap().unwrap(),
            PushEvent::NewToken(_)
        ));

        let migrate = r#"{"mint":"M","txType":"migrate","pool":"pool-1","signature":"s"}"#;
        assert!(matches!(
            decode_event(migrate, 1).unwrap().unwrap(),
            PushEvent::Migration(_)
        ));
    }

    #[test]
    fn acks_decode_to_none() {
        let ack = r#"{"message":"Successfully subscribed to token trades"}"#;
        assert!(decode_event(ack, 1).unwrap().is_none());
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(decode_event("not json", 1).is_err());
    }
}
