//! # CLI Interface
//!
//! Command-line arguments for `msgboard-node`, via `clap` derive. Every
//! runtime option can also come from a `MSGBOARD_*` environment variable.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Message board ledger node.
///
/// Hosts the board ledger, advances its block height on a timer, persists
/// every transaction, and serves the REST/JSON-RPC/WebSocket API and
/// Prometheus metrics.
#[derive(Parser, Debug)]
#[command(
    name = "msgboard-node",
    about = "Message board ledger node",
    version,
    propagate_version = true
)]
pub struct MsgboardCli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the node.
    Run(RunArgs),
    /// Create the data directory and write a genesis state.
    Init(InitArgs),
    /// Query the status of a running node via its API.
    Status(StatusArgs),
    /// Print version information and exit.
    Version,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Directory holding the node database.
    ///
    /// Created on first run if it does not exist.
    #[arg(long, short = 'd', env = "MSGBOARD_DATA_DIR", default_value = "./msgboard-data")]
    pub data_dir: PathBuf,

    /// Port for the REST, JSON-RPC and WebSocket API.
    #[arg(long, env = "MSGBOARD_RPC_PORT", default_value_t = 9841)]
    pub rpc_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "MSGBOARD_METRICS_PORT", default_value_t = 9842)]
    pub metrics_port: u16,

    /// Owner identity for a fresh genesis.
    ///
    /// Ignored when the data directory already holds a state.
    #[arg(long, env = "MSGBOARD_OWNER")]
    pub owner: Option<String>,

    /// Milliseconds per block.
    #[arg(long, env = "MSGBOARD_BLOCK_TIME_MS", default_value_t = 1_000)]
    pub block_time_ms: u64,

    /// Log output format.
    #[arg(long, env = "MSGBOARD_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Directory to initialize.
    #[arg(long, short = 'd', env = "MSGBOARD_DATA_DIR", default_value = "./msgboard-data")]
    pub data_dir: PathBuf,

    /// Identity that owns the new board.
    #[arg(long, env = "MSGBOARD_OWNER")]
    pub owner: String,

    /// Overwrite an existing state.
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// API endpoint of the running node.
    #[arg(long, default_value = "http://127.0.0.1:9841")]
    pub rpc_url: String,
}
