// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Message Board Node
//!
//! Entry point for the `msgboard-node` binary. Parses CLI arguments,
//! initializes logging and metrics, opens the board store, drives the block
//! clock, and serves the HTTP/WS API.
//!
//! Subcommands:
//!
//! - `run`     start the node
//! - `init`    create a data directory with a genesis state
//! - `status`  query a running node's status endpoint
//! - `version` print build version information

mod api;
mod cli;
mod logging;
mod metrics;
mod store;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast;

use msgboard_contracts::{Ledger, LedgerState};

use cli::{Commands, MsgboardCli};
use logging::LogFormat;
use metrics::NodeMetrics;
use store::BoardStore;

/// Broadcast channel capacity for live event streaming.
const EVENT_CHANNEL_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = MsgboardCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Init(args) => init_node(args),
        Commands::Status(args) => query_status(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

fn open_store(data_dir: &Path) -> Result<BoardStore> {
    let db_path = data_dir.join("db");
    std::fs::create_dir_all(&db_path)
        .with_context(|| format!("failed to create database directory: {}", db_path.display()))?;
    let store = BoardStore::open(&db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;
    tracing::info!(path = %db_path.display(), "database opened");
    Ok(store)
}

/// The persisted state, or a fresh genesis owned by `owner`.
fn load_or_genesis(store: &BoardStore, owner: Option<&str>) -> Result<LedgerState> {
    if let Some(state) = store.load_state().context("failed to load ledger state")? {
        tracing::info!(
            height = state.height,
            owner = %state.board.get_owner(),
            messages = state.board.get_total_messages(),
            "ledger state loaded"
        );
        return Ok(state);
    }

    let owner = owner.context("no ledger state found; pass --owner or run `msgboard-node init`")?;
    let state = LedgerState::genesis(owner);
    store
        .save_state(&state)
        .context("failed to write genesis state")?;
    tracing::info!(%owner, "genesis state created");
    Ok(state)
}

/// Starts the node: API server, metrics endpoint and block clock.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(logging::DEFAULT_FILTER, args.log_format);

    tracing::info!(
        rpc_port = args.rpc_port,
        metrics_port = args.metrics_port,
        block_time_ms = args.block_time_ms,
        data_dir = %args.data_dir.display(),
        "starting msgboard-node"
    );

    // --- Persistent storage ---
    let store = open_store(&args.data_dir)?;
    let state = load_or_genesis(&store, args.owner.as_deref())?;

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new().context("failed to register metrics")?);
    node_metrics.block_height.set(state.height as i64);
    node_metrics
        .contract_balance
        .set(state.board.get_contract_balance() as i64);
    node_metrics
        .total_messages
        .set(state.board.get_total_messages() as i64);

    // --- Ledger ---
    let ledger = Arc::new(Ledger::with_journal(state, Box::new(store.clone())));

    // --- Event broadcast ---
    let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

    let app_state = api::AppState {
        version: env!("CARGO_PKG_VERSION").to_string(),
        ledger: Arc::clone(&ledger),
        store: store.clone(),
        metrics: Arc::clone(&node_metrics),
        event_tx: event_tx.clone(),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.rpc_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind RPC listener on {}", api_addr))?;
    tracing::info!("RPC/API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Block clock ---
    let ledger_ref = Arc::clone(&ledger);
    let store_ref = store.clone();
    let metrics_ref = Arc::clone(&node_metrics);
    let event_tx_ref = event_tx.clone();
    let block_time = std::time::Duration::from_millis(args.block_time_ms.max(1));
    let block_loop = tokio::spawn(async move {
        let mut interval = tokio::time::interval(block_time);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            let height = ledger_ref.advance(1);
            if let Err(e) = store_ref.save_block_height(height) {
                tracing::warn!(height, "failed to persist block height: {}", e);
            }
            metrics_ref.block_height.set(height as i64);
            metrics_ref.blocks_produced_total.inc();

            let _ = event_tx_ref.send(api::NodeEvent::NewBlock {
                height,
                timestamp: chrono::Utc::now().to_rfc3339(),
            });

            tracing::debug!(height, "block produced");
        }
    });

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    block_loop.abort();

    let final_state = ledger.snapshot();
    store
        .save_state(&final_state)
        .context("failed to persist final state")?;
    store.flush().context("failed to flush database")?;
    tracing::info!(height = final_state.height, "msgboard-node stopped");
    Ok(())
}

/// Creates a data directory holding a genesis state.
fn init_node(args: cli::InitArgs) -> Result<()> {
    logging::init_logging("msgboard_node=info", LogFormat::Pretty);

    let data_dir = &args.data_dir;
    tracing::info!(data_dir = %data_dir.display(), owner = %args.owner, "initializing node");

    let store = open_store(data_dir)?;
    let state = write_genesis(&store, &args.owner, args.force)?;

    println!("Node initialized successfully.");
    println!("  Data directory : {}", data_dir.display());
    println!("  Owner          : {}", state.board.get_owner());

    Ok(())
}

/// Writes a genesis state owned by `owner` and reads it back.
///
/// Refuses to replace an existing state unless `force` is set.
fn write_genesis(store: &BoardStore, owner: &str, force: bool) -> Result<LedgerState> {
    if store.has_state()? && !force {
        anyhow::bail!("data directory already holds a ledger state; pass --force to overwrite it");
    }
    store
        .save_state(&LedgerState::genesis(owner))
        .context("failed to write genesis state")?;
    store
        .require_state()
        .context("genesis state was not persisted")
}

/// Queries a running node's status endpoint and prints the result.
async fn query_status(args: cli::StatusArgs) -> Result<()> {
    let url = format!("{}/status", args.rpc_url.trim_end_matches('/'));
    let body = http_get(&url).await?;
    println!("{}", body);
    Ok(())
}

/// Plain HTTP/1.1 GET over a TCP stream; returns the response body.
async fn http_get(url: &str) -> Result<String> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let target = Target::parse(url).map_err(|e| anyhow::anyhow!("invalid URL: {}", e))?;
    let addr = format!("{}:{}", target.host, target.port);
    let mut stream = tokio::net::TcpStream::connect(&addr)
        .await
        .with_context(|| format!("failed to connect to {}", addr))?;

    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        target.path, target.host,
    );
    stream.write_all(request.as_bytes()).await?;
    stream.shutdown().await?;

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    let response = String::from_utf8_lossy(&buf);

    Ok(response
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_string())
        .unwrap_or_else(|| response.to_string()))
}

/// Host, port and path of an `http://` URL.
#[derive(Debug, PartialEq, Eq)]
struct Target {
    host: String,
    port: u16,
    path: String,
}

impl Target {
    fn parse(url: &str) -> Result<Self, String> {
        let rest = url.strip_prefix("http://").unwrap_or(url);
        if rest.starts_with("https://") {
            return Err("https is not supported".into());
        }

        let (authority, path) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, "/"),
        };
        if authority.is_empty() {
            return Err("missing host".into());
        }

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => (
                host,
                port.parse::<u16>().map_err(|e| format!("bad port: {}", e))?,
            ),
            None => (authority, 80),
        };

        Ok(Self {
            host: host.to_string(),
            port,
            path: path.to_string(),
        })
    }
}

fn print_version() {
    println!("msgboard-node      {}", env!("CARGO_PKG_VERSION"));
    println!("msgboard-contracts {}", msgboard_contracts::VERSION);
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_parsing() {
        assert_eq!(
            Target::parse("http://127.0.0.1:9841/status").unwrap(),
            Target {
                host: "127.0.0.1".into(),
                port: 9841,
                path: "/status".into(),
            }
        );
        assert_eq!(Target::parse("localhost").unwrap().port, 80);
        assert_eq!(Target::parse("localhost").unwrap().path, "/");
        assert!(Target::parse("http://host:notaport/").is_err());
        assert!(Target::parse("https://secure").is_err());
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let store = BoardStore::open_temporary().unwrap();
        let state = write_genesis(&store, "deployer", false).unwrap();
        assert_eq!(state.board.get_owner(), "deployer");
        assert_eq!(state.height, 0);

        assert!(write_genesis(&store, "intruder", false).is_err());
        assert_eq!(store.require_state().unwrap().board.get_owner(), "deployer");

        let replaced = write_genesis(&store, "successor", true).unwrap();
        assert_eq!(replaced.board.get_owner(), "successor");
    }

    #[test]
    fn genesis_requires_owner_on_empty_store() {
        let store = BoardStore::open_temporary().unwrap();
        assert!(load_or_genesis(&store, None).is_err());

        let state = load_or_genesis(&store, Some("deployer")).unwrap();
        assert_eq!(state.board.get_owner(), "deployer");
        assert!(store.has_state().unwrap());

        // Existing state wins over a different --owner.
        let again = load_or_genesis(&store, Some("someone-else")).unwrap();
        assert_eq!(again.board.get_owner(), "deployer");
    }
}
