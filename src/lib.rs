//! benchctl library

mod config;
mod continuation;
mod error;
mod helpers;
mod jobs;
mod launch;
mod local_logger;
mod prelude;
mod process_table;
mod registry;
mod request_client;
mod tracker;

pub mod cli;
pub mod logger;

pub use error::TrackerError;
pub use local_logger::clean_logger;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
