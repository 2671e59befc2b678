use crate::database::connection::Database;
use crate::database::models::DashboardTokenRow;
use crate::types::now_ms;
use anyhow::Result;
use rusqlite::{params, Row};

impl Database {
    /// Upsert a curated dashboard token, preserving its first-seen time
    pub fn upsert_dashboard_token(&self, token: &DashboardTokenRow) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "INSERT INTO token
             (address, symbol, name, decimals, logo_uri, price, price_change_24h,
              volume_24h, market_cap, liquidity, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT(address) DO UPDATE SET
                symbol = excluded.symbol,
                name = excluded.name,
                decimals = excluded.decimals,
                logo_uri = COALESCE(excluded.logo_uri, token.logo_uri),
                price = excluded.price,
                price_change_24h = excluded.price_change_24h,
                volume_24h = excluded.volume_24h,
                market_cap = excluded.market_cap,
                liquidity = excluded.liquidity,
                updated_at = excluded.updated_at",
            params![
                token.address,
                token.symbol,
                token.name,
                token.decimals,
                token.logo_uri,
                token.price,
                token.price_change_24h,
                token.volume_24h,
                token.market_cap,
                token.liquidity,
                token.created_at,
                token.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get a dashboard token by address
    pub fn get_dashboard_token(&self, address: &str) -> Result<Option<DashboardTokenRow>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = conn.prepare(
            "SELECT address, symbol, name, decimals, logo_uri, price, price_change_24h,
                    volume_24h, market_cap, liquidity, created_at, updated_at
             FROM token WHERE address = ?1",
        )?;
        let mut rows = stmt.query_map([address], row_to_dashboard_token)?;

        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// List dashboard tokens with sort/order/pagination and optional
    /// case-insensitive text search over symbol, name, and address
    pub fn list_dashboard_tokens(
        &self,
        sort: &str,
        descending: bool,
        page: usize,
        limit: usize,
        search: Option<&str>,
    ) -> Result<Vec<DashboardTokenRow>> {
        // Sort column comes from a fixed vocabulary; never interpolate
        // caller-controlled text into the statement.
        let sort_column = match sort {
            "price" => "price",
            "price_change_24h" => "price_change_24h",
            "volume_24h" => "volume_24h",
            "liquidity" => "liquidity",
            "symbol" => "symbol",
            "name" => "name",
            _ => "market_cap",
        };
        let order = if descending { "DESC" } else { "ASC" };
        let offset = page.saturating_mul(limit);

        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());

        let mut tokens = Vec::new();
        if let Some(q) = search {
            let pattern = format!("%{}%", q.to_lowercase());
            let sql = format!(
                "SELECT address, symbol, name, decimals, logo_uri, price, price_change_24h,
                        volume_24h, market_cap, liquidity, created_at, updated_at
                 FROM token
                 WHERE lower(symbol) LIKE ?1 OR lower(name) LIKE ?1 OR lower(address) LIKE ?1
                 ORDER BY {} {} LIMIT ?2 OFFSET ?3",
                sort_column, order
            );
            let mut stmt = conn.prepare(&sql)?;
            let iter = stmt.query_map(
                params![pattern, limit as i64, offset as i64],
                row_to_dashboard_token,
            )?;
            for row in iter {
                tokens.push(row?);
            }
        } else {
            let sql = format!(
                "SELECT address, symbol, name, decimals, logo_uri, price, price_change_24h,
                        volume_24h, market_cap, liquidity, created_at, updated_at
                 FROM token ORDER BY {} {} LIMIT ?1 OFFSET ?2",
                sort_column, order
            );
            let mut stmt = conn.prepare(&sql)?;
            let iter = stmt.query_map(params![limit as i64, offset as i64], row_to_dashboard_token)?;
            for row in iter {
                tokens.push(row?);
            }
        }

        Ok(tokens)
    }

    /// Remove tokens that fell off the curated list
    pub fn delete_dashboard_tokens_not_in(&self, keep: &[String]) -> Result<usize> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());

        if keep.is_empty() {
            let deleted = conn.execute("DELETE FROM token", [])?;
            return Ok(deleted);
        }

        let placeholders = vec!["?"; keep.len()].join(",");
        let sql = format!("DELETE FROM token WHERE address NOT IN ({})", placeholders);
        let deleted = conn.execute(&sql, rusqlite::params_from_iter(keep.iter()))?;
        Ok(deleted)
    }

    /// Update only the live market columns of a dashboard token
    pub fn update_dashboard_token_price(
        &self,
        address: &str,
        price: f64,
        price_change_24h: f64,
        volume_24h: f64,
        market_cap: f64,
        liquidity: f64,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "UPDATE token SET price = ?1, price_change_24h = ?2, volume_24h = ?3,
                    market_cap = ?4, liquidity = ?5, updated_at = ?6
             WHERE address = ?7",
            params![
                price,
                price_change_24h,
                volume_24h,
                market_cap,
                liquidity,
                now_ms(),
                address
            ],
        )?;
        Ok(())
    }
}

fn row_to_dashboard_token(row: &Row) -> Result<DashboardTokenRow, rusqlite::Error> {
    Ok(DashboardTokenRow {
        address: row.get(0)?,
        symbol: row.get(1)?,
        name: row.get(2)?,
        decimals: row.get(3)?,
        logo_uri: row.get(4)?,
        price: row.get(5)?,
        price_change_24h: row.get(6)?,
        volume_24h: row.get(7)?,
        market_cap: row.get(8)?,
        liquidity: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(address: &str, symbol: &str, market_cap: f64) -> DashboardTokenRow {
        DashboardTokenRow {
            address: address.to_string(),
            symbol: symbol.to_string(),
            name: format!("{} Token", symbol),
            decimals: 9,
            logo_uri: None,
            price: 1.0,
            price_change_24h: 0.0,
            volume_24h: 0.0,
            market_cap,
            liquidity: 0.0,
            created_at: now_ms(),
            updated_at: now_ms(),
        }
    }

    #[test]
    fn upsert_preserves_created_at_and_logo() {
        let db = Database::in_memory().unwrap();
        let mut token = sample("So1", "AAA", 100.0);
        token.logo_uri = Some("ipfs://logo".to_string());
        db.upsert_dashboard_token(&token).unwrap();

        let original = db.get_dashboard_token("So1").unwrap().unwrap();

        let mut update = sample("So1", "AAA", 200.0);
        update.logo_uri = None;
        update.created_at = original.created_at + 999;
        db.upsert_dashboard_token(&update).unwrap();

        let after = db.get_dashboard_token("So1").unwrap().unwrap();
        assert_eq!(after.created_at, original.created_at);
        assert_eq!(after.logo_uri.as_deref(), Some("ipfs://logo"));
        assert_eq!(after.market_cap, 200.0);
    }

    #[test]
    fn search_is_case_insensitive_contains() {
        let db = Database::in_memory().unwrap();
        db.upsert_dashboard_token(&sample("Mint1", "BONK", 10.0)).unwrap();
        db.upsert_dashboard_token(&sample("Mint2", "WIF", 20.0)).unwrap();

        let hits = db
            .list_dashboard_tokens("market_cap", true, 0, 10, Some("bon"))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].symbol, "BONK");

        let hits = db
            .list_dashboard_tokens("market_cap", true, 0, 10, Some("mint"))
            .unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn curated_list_pruning() {
        let db = Database::in_memory().unwrap();
        db.upsert_dashboard_token(&sample("A", "AAA", 1.0)).unwrap();
        db.upsert_dashboard_token(&sample("B", "BBB", 2.0)).unwrap();

        let deleted = db
            .delete_dashboard_tokens_not_in(&["A".to_string()])
            .unwrap();
        assert_eq!(deleted, 1);
        assert!(db.get_dashboard_token("B").unwrap().is_none());
    }
}
