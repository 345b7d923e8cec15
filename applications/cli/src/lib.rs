//! Record Sync command line
//!
//! Argument handling and configuration for the `recsync` binary. The binary
//! wires the SQLite backed capabilities and the local file mover into the
//! sync engine and prints the run summary.

pub mod args;
pub mod config;
pub mod error;

pub use args::{normalize_args, parse_datetime, Cli, Command, CommonArgs};
pub use config::RecSyncConfig;
pub use error::{CliError, Result};
