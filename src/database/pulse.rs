use crate::database::connection::Database;
use crate::database::models::PulseTokenRow;
use crate::types::{now_ms, PulseCategory};
use anyhow::Result;
use rusqlite::{params, Row};

/// Counts of rows removed by one expiry pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpiredCounts {
    pub new: usize,
    pub graduating: usize,
    pub graduated: usize,
}

impl ExpiredCounts {
    pub fn total(&self) -> usize {
        self.new + self.graduating + self.graduated
    }
}

impl Database {
    /// Upsert a pulse token with its category
    ///
    /// `graduated_at` is stamped exactly once: on the first transition into
    /// GRADUATED. Later upserts keep the original stamp, and a token never
    /// leaves GRADUATED through this path.
    pub fn upsert_pulse_token(&self, row: &PulseTokenRow) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());

        let graduated_at = if row.category == PulseCategory::Graduated {
            Some(row.graduated_at.unwrap_or_else(now_ms))
        } else {
            row.graduated_at
        };

        conn.execute(
            "INSERT INTO pulse_token
             (address, symbol, name, decimals, logo_uri, price, price_change_24h,
              volume_24h, market_cap, liquidity, category, bonding_progress,
              graduated_at, token_created_at, description, twitter, telegram,
              website, reply_count, tx_count, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                     ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)
             ON CONFLICT(address) DO UPDATE SET
                symbol = excluded.symbol,
                name = excluded.name,
                decimals = excluded.decimals,
                logo_uri = COALESCE(excluded.logo_uri, pulse_token.logo_uri),
                price = excluded.price,
                price_change_24h = excluded.price_change_24h,
                volume_24h = excluded.volume_24h,
                market_cap = excluded.market_cap,
                liquidity = excluded.liquidity,
                category = CASE
                    WHEN pulse_token.category = 'graduated' THEN 'graduated'
                    ELSE excluded.category
                END,
                bonding_progress = COALESCE(excluded.bonding_progress, pulse_token.bonding_progress),
                graduated_at = COALESCE(pulse_token.graduated_at, excluded.graduated_at),
                token_created_at = COALESCE(pulse_token.token_created_at, excluded.token_created_at),
                description = COALESCE(excluded.description, pulse_token.description),
                twitter = COALESCE(excluded.twitter, pulse_token.twitter),
                telegram = COALESCE(excluded.telegram, pulse_token.telegram),
                website = COALESCE(excluded.website, pulse_token.website),
                reply_count = MAX(excluded.reply_count, pulse_token.reply_count),
                tx_count = MAX(excluded.tx_count, pulse_token.tx_count),
                updated_at = excluded.updated_at",
            params![
                row.address,
                row.symbol,
                row.name,
                row.decimals,
                row.logo_uri,
                row.price,
                row.price_change_24h,
                row.volume_24h,
                row.market_cap,
                row.liquidity,
                row.category.as_str(),
                row.bonding_progress,
                graduated_at,
                row.token_created_at,
                row.description,
                row.twitter,
                row.telegram,
                row.website,
                row.reply_count,
                row.tx_count,
                row.created_at,
                row.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_pulse_token(&self, address: &str) -> Result<Option<PulseTokenRow>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM pulse_token WHERE address = ?1",
            PULSE_COLUMNS
        ))?;
        let mut rows = stmt.query_map([address], row_to_pulse_token)?;

        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// List pulse tokens in a category, newest first
    ///
    /// NEW/GRADUATING order by token creation time; GRADUATED by graduation
    /// time (both backed by the category indexes).
    pub fn list_pulse_tokens(
        &self,
        category: PulseCategory,
        limit: usize,
    ) -> Result<Vec<PulseTokenRow>> {
        let order_column = match category {
            PulseCategory::Graduated => "graduated_at",
            _ => "COALESCE(token_created_at, created_at)",
        };

        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let sql = format!(
            "SELECT {} FROM pulse_token WHERE category = ?1 ORDER BY {} DESC LIMIT ?2",
            PULSE_COLUMNS, order_column
        );
        let mut stmt = conn.prepare(&sql)?;
        let iter = stmt.query_map(params![category.as_str(), limit as i64], row_to_pulse_token)?;

        let mut tokens = Vec::new();
        for row in iter {
            tokens.push(row?);
        }
        Ok(tokens)
    }

    /// Reclassify a token, stamping `graduated_at` on the first GRADUATED write
    pub fn set_pulse_category(&self, address: &str, category: PulseCategory) -> Result<bool> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let changed = if category == PulseCategory::Graduated {
            conn.execute(
                "UPDATE pulse_token
                 SET category = ?1,
                     graduated_at = COALESCE(graduated_at, ?2),
                     updated_at = ?2
                 WHERE address = ?3",
                params![category.as_str(), now_ms(), address],
            )?
        } else {
            conn.execute(
                "UPDATE pulse_token SET category = ?1, updated_at = ?2 WHERE address = ?3",
                params![category.as_str(), now_ms(), address],
            )?
        };
        Ok(changed > 0)
    }

    /// Set a pulse token's logo if it has none yet
    pub fn set_pulse_logo(&self, address: &str, logo_uri: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let changed = conn.execute(
            "UPDATE pulse_token SET logo_uri = ?1, updated_at = ?2
             WHERE address = ?3 AND logo_uri IS NULL",
            params![logo_uri, now_ms(), address],
        )?;
        Ok(changed > 0)
    }

    /// Delete stale rows per the category TTL policy
    pub fn expire_stale_pulse_tokens(
        &self,
        now: i64,
        ttl_new_ms: i64,
        ttl_graduating_ms: i64,
        ttl_graduated_ms: i64,
    ) -> Result<ExpiredCounts> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());

        let new = conn.execute(
            "DELETE FROM pulse_token
             WHERE category = 'new' AND COALESCE(token_created_at, created_at) < ?1",
            params![now - ttl_new_ms],
        )?;
        let graduating = conn.execute(
            "DELETE FROM pulse_token WHERE category = 'graduating' AND updated_at < ?1",
            params![now - ttl_graduating_ms],
        )?;
        let graduated = conn.execute(
            "DELETE FROM pulse_token
             WHERE category = 'graduated' AND graduated_at IS NOT NULL AND graduated_at < ?1",
            params![now - ttl_graduated_ms],
        )?;

        Ok(ExpiredCounts {
            new,
            graduating,
            graduated,
        })
    }

    /// All pulse token addresses (orphan-cleanup membership check)
    pub fn pulse_token_addresses(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = conn.prepare("SELECT address FROM pulse_token")?;
        let iter = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut addresses = Vec::new();
        for addr in iter {
            addresses.push(addr?);
        }
        Ok(addresses)
    }

    /// Pulse tokens ordered by market cap that have no completed swap sync
    pub fn pulse_tokens_needing_sync(&self, limit: usize) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = conn.prepare(
            "SELECT p.address FROM pulse_token p
             LEFT JOIN token_sync_status s ON s.token_address = p.address
             WHERE COALESCE(s.swaps_synced, 0) = 0
             ORDER BY p.market_cap DESC
             LIMIT ?1",
        )?;
        let iter = stmt.query_map([limit as i64], |row| row.get::<_, String>(0))?;

        let mut addresses = Vec::new();
        for addr in iter {
            addresses.push(addr?);
        }
        Ok(addresses)
    }

    /// Already-synced pulse tokens for tail sync, most recently updated first
    pub fn pulse_tokens_for_tail_sync(&self, limit: usize) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = conn.prepare(
            "SELECT p.address FROM pulse_token p
             JOIN token_sync_status s ON s.token_address = p.address
             WHERE s.swaps_synced = 1
             ORDER BY p.updated_at DESC
             LIMIT ?1",
        )?;
        let iter = stmt.query_map([limit as i64], |row| row.get::<_, String>(0))?;

        let mut addresses = Vec::new();
        for addr in iter {
            addresses.push(addr?);
        }
        Ok(addresses)
    }
}

const PULSE_COLUMNS: &str = "address, symbol, name, decimals, logo_uri, price, price_change_24h, \
     volume_24h, market_cap, liquidity, category, bonding_progress, graduated_at, \
     token_created_at, description, twitter, telegram, website, reply_count, tx_count, \
     created_at, updated_at";

fn row_to_pulse_token(row: &Row) -> Result<PulseTokenRow, rusqlite::Error> {
    let category_str: String = row.get(10)?;
    let category = PulseCategory::from_str(&category_str).unwrap_or(PulseCategory::New);

    Ok(PulseTokenRow {
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
        category,
        bonding_progress: row.get(11)?,
        graduated_at: row.get(12)?,
        token_created_at: row.get(13)?,
        description: row.get(14)?,
        twitter: row.get(15)?,
        telegram: row.get(16)?,
        website: row.get(17)?,
        reply_count: row.get(18)?,
        tx_count: row.get(19)?,
        created_at: row.get(20)?,
        updated_at: row.get(21)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_row(address: &str, category: PulseCategory) -> PulseTokenRow {
        let now = now_ms();
        PulseTokenRow {
            address: address.to_string(),
            symbol: "TST".to_string(),
            name: "Test".to_string(),
            decimals: 6,
            logo_uri: None,
            price: 0.001,
            price_change_24h: 0.0,
            volume_24h: 100.0,
            market_cap: 15_000.0,
            liquidity: 5_000.0,
            category,
            bonding_progress: Some(0.4),
            graduated_at: None,
            token_created_at: Some(now),
            description: None,
            twitter: None,
            telegram: None,
            website: None,
            reply_count: 0,
            tx_count: 3,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn graduated_at_stamped_once_and_category_sticks() {
        let db = Database::in_memory().unwrap();
        db.upsert_pulse_token(&sample_row("A", PulseCategory::New))
            .unwrap();

        assert!(db.set_pulse_category("A", PulseCategory::Graduated).unwrap());
        let first = db.get_pulse_token("A").unwrap().unwrap();
        let stamp = first.graduated_at.expect("stamped");

        // A later feed upsert claiming NEW must not demote or restamp
        db.upsert_pulse_token(&sample_row("A", PulseCategory::New))
            .unwrap();
        let after = db.get_pulse_token("A").unwrap().unwrap();
        assert_eq!(after.category, PulseCategory::Graduated);
        assert_eq!(after.graduated_at, Some(stamp));
    }

    #[test]
    fn upsert_is_idempotent_for_row_sets() {
        let db = Database::in_memory().unwrap();
        let row = sample_row("B", PulseCategory::Graduating);
        db.upsert_pulse_token(&row).unwrap();
        db.upsert_pulse_token(&row).unwrap();

        let listed = db
            .list_pulse_tokens(PulseCategory::Graduating, 10)
            .unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[test]
    fn expiry_windows_per_category() {
        let db = Database::in_memory().unwrap();
        let now = now_ms();
        let hour = 3_600_000i64;

        let mut old_new = sample_row("old-new", PulseCategory::New);
        old_new.token_created_at = Some(now - 25 * hour);
        db.upsert_pulse_token(&old_new).unwrap();

        let fresh_new = sample_row("fresh-new", PulseCategory::New);
        db.upsert_pulse_token(&fresh_new).unwrap();

        let mut old_grad = sample_row("old-grad", PulseCategory::Graduated);
        old_grad.graduated_at = Some(now - 8 * 24 * hour);
        db.upsert_pulse_token(&old_grad).unwrap();

        let counts = db
            .expire_stale_pulse_tokens(now, 24 * hour, 48 * hour, 7 * 24 * hour)
            .unwrap();
        assert_eq!(counts.new, 1);
        assert_eq!(counts.graduated, 1);
        assert_eq!(counts.graduating, 0);

        assert!(db.get_pulse_token("old-new").unwrap().is_none());
        assert!(db.get_pulse_token("fresh-new").unwrap().is_some());
    }
}
