/// Upstream trade parsing and price derivation
///
/// Turns raw feed trades into canonical swap rows. Price derivation tries,
/// in order, until a positive price is obtained:
/// 1. native-leg formula: `(native_amount * native_usd_price) / token_amount`
/// 2. `usd_amount / amount` of the target side
/// 3. upstream-reported `usd_price` of the target side
/// 4. `total_value_usd / token_amount`
///
/// Trades with zero token amount, or no derivable positive price, are
/// discarded.
use crate::apis::solanatracker::{RawTrade, TradeLeg, WSOL_MINT};
use crate::types::{SwapSide, TokenSwap};

pub fn parse_raw_trade(raw: &RawTrade, target_mint: &str, sol_price_usd: f64) -> Option<TokenSwap> {
    let (target_leg, other_leg, side) = if raw.to.address == target_mint {
        (&raw.to, &raw.from, SwapSide::Buy)
    } else if raw.from.address == target_mint {
        (&raw.from, &raw.to, SwapSide::Sell)
    } else {
        return None;
    };

    let token_amount = target_leg.amount;
    if token_amount <= 0.0 || !token_amount.is_finite() {
        return None;
    }

    let price_usd = derive_price(target_leg, other_leg, raw.volume, sol_price_usd)?;

    let sol_amount = if other_leg.address == WSOL_MINT {
        other_leg.amount
    } else {
        0.0
    };

    let total_value_usd = raw
        .volume
        .filter(|v| *v > 0.0)
        .unwrap_or(price_usd * token_amount);

    Some(TokenSwap {
        token_address: target_mint.to_string(),
        tx_hash: raw.tx.clone(),
        timestamp: raw.time,
        side: match raw.side.as_str() {
            "buy" => SwapSide::Buy,
            "sell" => SwapSide::Sell,
            _ => side,
        },
        wallet_address: raw.wallet.clone(),
        token_amount,
        sol_amount,
        price_usd,
        total_value_usd,
    })
}

fn derive_price(
    target: &TradeLeg,
    other: &TradeLeg,
    total_value_usd: Option<f64>,
    sol_price_usd: f64,
) -> Option<f64> {
    let positive = |p: f64| (p > 0.0 && p.is_finite()).then_some(p);

    // 1. Native leg against the target
    if other.address == WSOL_MINT && other.amount > 0.0 {
        let native_usd = other.price_usd.filter(|p| *p > 0.0).unwrap_or(sol_price_usd);
        if native_usd > 0.0 {
            if let Some(price) = positive(other.amount * native_usd / target.amount) {
                return Some(price);
            }
        }
    }

    // 2. USD enrichment on the target leg
    if let Some(usd) = target.amount_usd.filter(|u| *u > 0.0) {
        if let Some(price) = positive(usd / target.amount) {
            return Some(price);
        }
    }

    // 3. Upstream unit price of the target leg
    if let Some(price) = target.price_usd.and_then(positive) {
        return Some(price);
    }

    // 4. Total trade value spread over the target amount
    if let Some(total) = total_value_usd.filter(|v| *v > 0.0) {
        if let Some(price) = positive(total / target.amount) {
            return Some(price);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(
        target: &str,
        side: &str,
        from: TradeLeg,
        to: TradeLeg,
        volume: Option<f64>,
    ) -> RawTrade {
        let _ = target;
        RawTrade {
            tx: "sig-1".to_string(),
            side: side.to_string(),
            wallet: "wallet-1".to_string(),
            time: 1_700_000_000_000,
            volume,
            from,
            to,
        }
    }

    fn leg(address: &str, amount: f64) -> TradeLeg {
        TradeLeg {
            address: address.to_string(),
            amount,
            amount_usd: None,
            price_usd: None,
        }
    }

    #[test]
    fn native_leg_formula_wins() {
        // Buy 1000 MINT for 2 SOL at $150/SOL => price $0.30
        let trade = raw(
            "MINT",
            "buy",
            leg(WSOL_MINT, 2.0),
            leg("MINT", 1000.0),
            None,
        );
        let swap = parse_raw_trade(&trade, "MINT", 150.0).unwrap();
        assert!((swap.price_usd - 0.30).abs() < 1e-12);
        assert_eq!(swap.side, SwapSide::Buy);
        assert_eq!(swap.sol_amount, 2.0);
        assert!((swap.total_value_usd - 300.0).abs() < 1e-9);
    }

    #[test]
    fn falls_back_to_target_usd_amount() {
        let mut target = leg("MINT", 500.0);
        target.amount_usd = Some(100.0);
        let trade = raw("MINT", "sell", target, leg("USDC", 100.0), None);

        let swap = parse_raw_trade(&trade, "MINT", 0.0).unwrap();
        assert!((swap.price_usd - 0.2).abs() < 1e-12);
        assert_eq!(swap.side, SwapSide::Sell);
        assert_eq!(swap.sol_amount, 0.0);
    }

    #[test]
    fn falls_back_to_unit_price_then_total_value() {
        let mut target = leg("MINT", 500.0);
        target.price_usd = Some(0.25);
        let trade = raw("MINT", "sell", target, leg("USDC", 125.0), None);
        assert_eq!(parse_raw_trade(&trade, "MINT", 0.0).unwrap().price_usd, 0.25);

        let trade = raw(
            "MINT",
            "sell",
            leg("MINT", 400.0),
            leg("USDC", 100.0),
            Some(100.0),
        );
        assert_eq!(parse_raw_trade(&trade, "MINT", 0.0).unwrap().price_usd, 0.25);
    }

    #[test]
    fn unpriceable_trades_are_discarded() {
        // No SOL leg, no enrichment, no volume
        let trade = raw("MINT", "buy", leg("USDC", 10.0), leg("MINT", 100.0), None);
        assert!(parse_raw_trade(&trade, "MINT", 150.0).is_none());

        // Zero token amount
        let trade = raw("MINT", "buy", leg(WSOL_MINT, 1.0), leg("MINT", 0.0), None);
        assert!(parse_raw_trade(&trade, "MINT", 150.0).is_none());

        // Target not in the trade at all
        let trade = raw("MINT", "buy", leg(WSOL_MINT, 1.0), leg("OTHER", 10.0), None);
        assert!(parse_raw_trade(&trade, "MINT", 150.0).is_none());
    }
}
