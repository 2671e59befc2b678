/// Configuration module - type-safe config system with embedded defaults
///
/// # Architecture
///
/// - `macros.rs` - The `config_struct!` macro for defining configs with embedded defaults
/// - `schemas.rs` - All configuration structures defined once with defaults
/// - `utils.rs` - Loading, reloading, and access utilities
///
/// # Usage
///
/// ```rust
/// use pulseboard::config::{load_config, with_config};
///
/// load_config()?;
/// let interval = with_config(|cfg| cfg.pulse.sync_interval_ms);
/// # Ok::<(), String>(())
/// ```
// Export the macro
#[macro_use]
mod macros;

pub mod schemas;
pub mod utils;

pub use schemas::{
    ApiKeysConfig, CandlesConfig, Config, DashboardConfig, DatabaseConfig, ImagesConfig,
    KvCacheConfig, PulseConfig, ServerConfig, SolPriceConfig, SwapSyncConfig,
};

pub use utils::{
    get_config_clone, is_config_initialized, load_config, load_config_from_path, reload_config,
    update_config, with_config, CONFIG,
};
