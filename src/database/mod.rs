/// Durable token store on SQLite
///
/// One `Database` handle wraps the connection; table-domain operations live
/// in per-table impl blocks (`tokens`, `pulse`, `swaps`, `sync_status`,
/// `candles`). Components receive an `Arc<Database>` at construction time.
///
/// Writer discipline (enforced by convention, checked in review):
/// - `pulse_token`     — pulse sync engine
/// - `token_swap`      — live ingester + swap sync engine (same conflict key)
/// - `token_sync_status` — swap sync engine only
/// - `candle_cache`    — candle cache engine only
/// - `token`           — dashboard sync only

pub mod candles;
pub mod connection;
pub mod models;
pub mod pulse;
pub mod swaps;
pub mod sync_status;
pub mod tokens;

pub use connection::Database;
pub use models::{DashboardTokenRow, PulseTokenRow, SyncStatusRow};
