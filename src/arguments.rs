/// Command-line arguments
///
/// Debug flags of the form `--debug-<tag>` (e.g. `--debug-ingester`) are not
/// listed here; the logger scans the raw argument list for them at init time
/// so new tags never require a clap change.
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "pulseboard", about = "Solana market-data aggregation backend")]
pub struct Arguments {
    /// Path to the TOML configuration file (default: data/config.toml)
    #[arg(long)]
    pub config: Option<String>,

    /// Override the SQLite database path from the config file
    #[arg(long)]
    pub db_path: Option<String>,

    /// Override the WebSocket gateway port from the config file
    #[arg(long)]
    pub port: Option<u16>,

    /// Disable the live trade ingester (pull feeds only)
    #[arg(long, default_value_t = false)]
    pub no_ingester: bool,

    /// Enable verbose logging for all modules
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
}
