/// Log tags identifying the subsystem a message originates from
///
/// Each tag maps to a `--debug-<key>` command-line flag via `debug_key()`.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTag {
    Api,
    Cache,
    Candles,
    Config,
    Dashboard,
    Db,
    Hub,
    Images,
    Ingester,
    Pulse,
    Server,
    SolPrice,
    SwapSync,
    System,
}

impl LogTag {
    /// Display name shown in the console/file prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            LogTag::Api => "API",
            LogTag::Cache => "CACHE",
            LogTag::Candles => "CANDLES",
            LogTag::Config => "CONFIG",
            LogTag::Dashboard => "DASHBOARD",
            LogTag::Db => "DB",
            LogTag::Hub => "HUB",
            LogTag::Images => "IMAGES",
            LogTag::Ingester => "INGESTER",
            LogTag::Pulse => "PULSE",
            LogTag::Server => "SERVER",
            LogTag::SolPrice => "SOLPRICE",
            LogTag::SwapSync => "SWAPSYNC",
            LogTag::System => "SYSTEM",
        }
    }

    /// Key used for `--debug-<key>` and `--verbose-<key>` flags
    pub fn debug_key(&self) -> &'static str {
        match self {
            LogTag::Api => "api",
            LogTag::Cache => "cache",
            LogTag::Candles => "candles",
            LogTag::Config => "config",
            LogTag::Dashboard => "dashboard",
            LogTag::Db => "db",
            LogTag::Hub => "hub",
            LogTag::Images => "images",
            LogTag::Ingester => "ingester",
            LogTag::Pulse => "pulse",
            LogTag::Server => "server",
            LogTag::SolPrice => "sol-price",
            LogTag::SwapSync => "swap-sync",
            LogTag::System => "system",
        }
    }

    pub fn all() -> &'static [LogTag] {
        &[
            LogTag::Api,
            LogTag::Cache,
            LogTag::Candles,
            LogTag::Config,
            LogTag::Dashboard,
            LogTag::Db,
            LogTag::Hub,
            LogTag::Images,
            LogTag::Ingester,
            LogTag::Pulse,
            LogTag::Server,
            LogTag::SolPrice,
            LogTag::SwapSync,
            LogTag::System,
        ]
    }
}

impl std::fmt::Display for LogTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
