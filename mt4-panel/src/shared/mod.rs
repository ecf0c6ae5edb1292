/// Shared modules for the MT4 panel and logger
pub mod account_log;
pub mod aggregation;
pub mod config;
pub mod error;
pub mod input;
pub mod ledger;
pub mod logging;
pub mod monitor;
pub mod runner;
pub mod snapshot;
pub mod state;
pub mod transport;
pub mod types;
pub mod view;
pub mod websocket;
pub mod widget;
