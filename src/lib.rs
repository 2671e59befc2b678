pub mod apis;
pub mod arguments;
pub mod cache;
pub mod candles;
pub mod config;
pub mod dashboard_sync;
pub mod database;
pub mod errors;
pub mod hub;
pub mod ingester;
pub mod logger;
pub mod pulse;
pub mod pushfeed;
pub mod run;
pub mod services;
pub mod shutdown;
pub mod sol_price;
pub mod swap_sync;
pub mod types;
pub mod webserver;
