/// Configuration utilities - loading, reloading, and access helpers

use super::schemas::Config;
use once_cell::sync::OnceCell;
use std::sync::RwLock;

/// Global configuration instance; access through the helpers below
pub static CONFIG: OnceCell<RwLock<Config>> = OnceCell::new();

/// Default configuration file path
pub const CONFIG_FILE_PATH: &str = "data/config.toml";

/// Load configuration from the default path and initialize the global CONFIG
///
/// Call once at startup. A missing file is not an error; defaults apply.
pub fn load_config() -> Result<(), String> {
    load_config_from_path(None)
}

/// Load configuration from a specific path (or the default when `None`)
pub fn load_config_from_path(path: Option<&str>) -> Result<(), String> {
    let path = path.unwrap_or(CONFIG_FILE_PATH);

    let config = if std::path::Path::new(path).exists() {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path, e))?;

        toml::from_str::<Config>(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path, e))?
    } else {
        Config::default()
    };

    CONFIG
        .set(RwLock::new(config))
        .map_err(|_| "Config already initialized".to_string())?;

    Ok(())
}

/// Reload configuration from disk, atomically replacing the active values
pub fn reload_config(path: Option<&str>) -> Result<(), String> {
    let path = path.unwrap_or(CONFIG_FILE_PATH);

    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file '{}': {}", path, e))?;

    let new_config = toml::from_str::<Config>(&contents)
        .map_err(|e| format!("Failed to parse config file '{}': {}", path, e))?;

    match CONFIG.get() {
        Some(lock) => {
            let mut config = lock.write().unwrap_or_else(|e| e.into_inner());
            *config = new_config;
            Ok(())
        }
        None => Err("Config not initialized. Call load_config() first.".to_string()),
    }
}

pub fn is_config_initialized() -> bool {
    CONFIG.get().is_some()
}

/// Read configuration values through a closure
///
/// Falls back to defaults when the global config has not been initialized
/// (unit tests exercise components without bootstrap).
pub fn with_config<F, R>(f: F) -> R
where
    F: FnOnce(&Config) -> R,
{
    match CONFIG.get() {
        Some(lock) => {
            let config = lock.read().unwrap_or_else(|e| e.into_inner());
            f(&config)
        }
        None => f(&Config::default()),
    }
}

/// Clone the entire active configuration
pub fn get_config_clone() -> Config {
    with_config(|cfg| cfg.clone())
}

/// Mutate the active configuration (command-line overrides at startup)
pub fn update_config<F>(f: F)
where
    F: FnOnce(&mut Config),
{
    if let Some(lock) = CONFIG.get() {
        let mut config = lock.write().unwrap_or_else(|e| e.into_inner());
        f(&mut config);
    }
}
