use crate::apis::get_api_manager;
use crate::cache::get_kv_cache;
use crate::errors::{AppError, AppResult};
use crate::services::{ReadServices, TTL_HOLDERS};
use crate::types::HolderStats;

impl ReadServices {
    /// Holder statistics: count/concentration and top holders, fetched in
    /// parallel upstream and cached for a minute
    pub async fn get_holders(&self, address: &str) -> AppResult<HolderStats> {
        let cache_key = format!("holders:{}", address);
        get_kv_cache()
            .get_or_set_json(&cache_key, TTL_HOLDERS, || async {
                get_api_manager()
                    .solanatracker
                    .holders(address)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("holders for {}", address)))
            })
            .await
    }
}
