//! # REST + JSON-RPC + WebSocket API
//!
//! The node's HTTP interface. All endpoints share [`AppState`] through
//! axum's `State` extractor. REST routes are read-only; every write goes
//! through `board_submit` on the JSON-RPC gateway.
//!
//! ## Endpoints
//!
//! | Method | Path                                | Description                     |
//! |--------|-------------------------------------|---------------------------------|
//! | GET    | `/health`                           | Liveness probe                  |
//! | GET    | `/status`                           | Node status summary             |
//! | GET    | `/stats`                            | Board-wide counters             |
//! | GET    | `/fees`                             | Current fee schedule            |
//! | GET    | `/messages/:id`                     | Raw message record              |
//! | GET    | `/messages/:id/active`              | Message if live, else `null`    |
//! | GET    | `/messages/:id/pinned`              | Pin status at current height    |
//! | GET    | `/messages/:id/expired`             | Expiry status at current height |
//! | GET    | `/messages/:id/history/:index`      | Pre-edit content                |
//! | GET    | `/messages/:id/reactions/:type`     | Tally for one reaction type     |
//! | GET    | `/users/:id/stats`                  | Per-identity stats              |
//! | GET    | `/accounts/:id/nonce`               | Next transaction nonce          |
//! | GET    | `/pages/:page?size=N`               | Newest-first page of messages   |
//! | GET    | `/receipts/:tx_id`                  | Stored transaction receipt      |
//! | POST   | `/rpc`                              | JSON-RPC 2.0 gateway            |
//! | GET    | `/ws`                               | Live block and receipt stream   |

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use msgboard_contracts::{
    BlockHeight, BoardError, Ledger, LedgerError, MessageId, ReactionType, Receipt, Transaction,
};

use crate::metrics::SharedMetrics;
use crate::store::BoardStore;

/// Page size used when `?size=` is omitted.
const DEFAULT_PAGE_SIZE: u64 = 10;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub version: String,
    pub ledger: Arc<Ledger>,
    pub store: BoardStore,
    pub metrics: SharedMetrics,
    /// Live notifications for WebSocket subscribers.
    pub event_tx: broadcast::Sender<NodeEvent>,
}

/// Events pushed to WebSocket subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum NodeEvent {
    /// The block loop advanced the height.
    NewBlock { height: BlockHeight, timestamp: String },
    /// A transaction was included.
    Receipt(Receipt),
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/stats", get(stats_handler))
        .route("/fees", get(fees_handler))
        .route("/messages/:id", get(message_handler))
        .route("/messages/:id/active", get(active_message_handler))
        .route("/messages/:id/pinned", get(pinned_handler))
        .route("/messages/:id/expired", get(expired_handler))
        .route("/messages/:id/history/:index", get(history_handler))
        .route("/messages/:id/reactions/:type", get(reaction_count_handler))
        .route("/users/:id/stats", get(user_stats_handler))
        .route("/accounts/:id/nonce", get(nonce_handler))
        .route("/pages/:page", get(page_handler))
        .route("/receipts/:tx_id", get(receipt_handler))
        .route("/rpc", post(rpc_handler))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// Hands a transaction to the ledger and fans the result out to metrics
/// and WebSocket subscribers.
///
/// Blocks on the ledger lock and the store commit. Async callers run it
/// through `spawn_blocking`.
pub fn submit_transaction(state: &AppState, tx: Transaction) -> Result<Receipt, LedgerError> {
    state.metrics.transactions_submitted_total.inc();
    let timer = state.metrics.transaction_latency_seconds.start_timer();
    let result = state.ledger.submit(tx);
    timer.observe_duration();

    match &result {
        Ok(receipt) => {
            state.metrics.observe_receipt(receipt);
            let (balance, messages) = state
                .ledger
                .read(|board, _| (board.get_contract_balance(), board.get_total_messages()));
            state.metrics.contract_balance.set(balance as i64);
            state.metrics.total_messages.set(messages as i64);
            // No subscribers is fine.
            let _ = state.event_tx.send(NodeEvent::Receipt(receipt.clone()));
        }
        Err(LedgerError::BadNonce { sender, expected, got }) => {
            state.metrics.observe_bad_nonce();
            tracing::debug!(%sender, expected, got, "transaction rejected: bad nonce");
        }
        Err(e) => tracing::error!("transaction submission failed: {}", e),
    }
    result
}

// ---------------------------------------------------------------------------
// JSON-RPC Types
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request envelope.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// Must be "2.0".
    pub jsonrpc: String,
    pub method: String,
    pub params: Option<serde_json::Value>,
    pub id: serde_json::Value,
}

/// A JSON-RPC 2.0 response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: serde_json::Value,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    const INVALID_REQUEST: i32 = -32600;
    const METHOD_NOT_FOUND: i32 = -32601;
    const INVALID_PARAMS: i32 = -32602;
    const INTERNAL: i32 = -32603;
    const NOT_FOUND: i32 = -32001;
    const BAD_NONCE: i32 = -32002;

    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    pub block_height: BlockHeight,
    pub owner: String,
    pub paused: bool,
    pub total_messages: u64,
    /// Receipts persisted so far.
    pub receipts: u64,
    /// RFC 3339 timestamp of the response.
    pub timestamp: String,
}

/// Response payload for `GET /pages/:page`.
#[derive(Debug, Serialize, Deserialize)]
pub struct PageResponse {
    pub start_id: MessageId,
    pub end_id: MessageId,
    pub total: u64,
    /// Newest first.
    pub messages: Vec<msgboard_contracts::Message>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub size: Option<u64>,
}

/// Error body returned by REST endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Board error code, when the failure maps to one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u32>,
}

fn not_found(what: String) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: what,
            code: None,
        }),
    )
        .into_response()
}

fn board_error(status: StatusCode, e: BoardError) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
            code: Some(e.code()),
        }),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// REST Handlers
// ---------------------------------------------------------------------------

/// `GET /health`: liveness only.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let (block_height, owner, paused, total_messages) = state.ledger.read(|board, height| {
        (
            height,
            board.get_owner().to_string(),
            board.is_paused(),
            board.get_total_messages(),
        )
    });
    let receipts = state.store.receipt_count().unwrap_or_else(|e| {
        tracing::warn!("failed to read receipt count: {}", e);
        0
    });

    Json(StatusResponse {
        version: state.version.clone(),
        block_height,
        owner,
        paused,
        total_messages,
        receipts,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

async fn stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.ledger.read(|board, _| board.get_contract_stats()))
}

async fn fees_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.ledger.read(|board, _| board.get_fees()))
}

async fn message_handler(Path(id): Path<MessageId>, State(state): State<AppState>) -> Response {
    match state.ledger.read(|board, _| board.get_message(id).cloned()) {
        Some(msg) => Json(msg).into_response(),
        None => not_found(format!("message {} not found", id)),
    }
}

/// `null` when the message is deleted, expired or unknown.
async fn active_message_handler(
    Path(id): Path<MessageId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    Json(
        state
            .ledger
            .read(|board, height| board.get_active_message(id, height).cloned()),
    )
}

async fn pinned_handler(
    Path(id): Path<MessageId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let (height, pinned) = state
        .ledger
        .read(|board, height| (height, board.is_message_pinned(id, height)));
    Json(json!({ "id": id, "height": height, "pinned": pinned }))
}

async fn expired_handler(
    Path(id): Path<MessageId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let (height, expired) = state
        .ledger
        .read(|board, height| (height, board.is_message_expired(id, height)));
    Json(json!({ "id": id, "height": height, "expired": expired }))
}

async fn history_handler(
    Path((id, index)): Path<(MessageId, u32)>,
    State(state): State<AppState>,
) -> Response {
    match state
        .ledger
        .read(|board, _| board.get_edit_history(id, index).cloned())
    {
        Some(entry) => Json(entry).into_response(),
        None => not_found(format!("no edit {} for message {}", index, id)),
    }
}

async fn reaction_count_handler(
    Path((id, raw_type)): Path<(MessageId, u64)>,
    State(state): State<AppState>,
) -> Response {
    let reaction_type = match ReactionType::from_u64(raw_type) {
        Ok(t) => t,
        Err(e) => return board_error(StatusCode::BAD_REQUEST, e),
    };
    let count = state
        .ledger
        .read(|board, _| board.get_reaction_count(id, reaction_type));
    Json(json!({ "id": id, "reaction_type": reaction_type, "count": count })).into_response()
}

async fn user_stats_handler(Path(user): Path<String>, State(state): State<AppState>) -> Response {
    match state
        .ledger
        .read(|board, _| board.get_user_stats(&user).cloned())
    {
        Some(stats) => Json(stats).into_response(),
        None => not_found(format!("no stats for {}", user)),
    }
}

async fn nonce_handler(
    Path(sender): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let next_nonce = state.ledger.next_nonce(&sender);
    Json(json!({ "sender": sender, "next_nonce": next_nonce }))
}

async fn page_handler(
    Path(page): Path<u64>,
    Query(query): Query<PageQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let size = query.size.unwrap_or(DEFAULT_PAGE_SIZE);
    Json(state.ledger.read(|board, _| {
        let range = board.get_page_range(page, size);
        PageResponse {
            start_id: range.start_id,
            end_id: range.end_id,
            total: range.total,
            messages: board.get_page(page, size).into_iter().cloned().collect(),
        }
    }))
}

async fn receipt_handler(Path(tx_id): Path<String>, State(state): State<AppState>) -> Response {
    match state.store.get_receipt(&tx_id) {
        Ok(Some(receipt)) => Json(receipt).into_response(),
        Ok(None) => not_found(format!("receipt {} not found", tx_id)),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("store error: {}", e),
                code: None,
            }),
        )
            .into_response(),
    }
}

// ---------------------------------------------------------------------------
// JSON-RPC
// ---------------------------------------------------------------------------

/// `POST /rpc`: JSON-RPC 2.0 gateway.
async fn rpc_handler(
    State(state): State<AppState>,
    Json(req): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    let outcome = if req.jsonrpc != "2.0" {
        Err(JsonRpcError::new(
            JsonRpcError::INVALID_REQUEST,
            "Invalid Request: jsonrpc must be \"2.0\"",
        ))
    } else {
        dispatch(&state, &req.method, req.params).await
    };

    let (result, error) = match outcome {
        Ok(value) => (Some(value), None),
        Err(e) => (None, Some(e)),
    };
    Json(JsonRpcResponse {
        jsonrpc: "2.0".into(),
        result,
        error,
        id: req.id,
    })
}

/// The first positional parameter, or the params value itself when named.
fn first_param(params: Option<serde_json::Value>) -> Option<serde_json::Value> {
    match params? {
        serde_json::Value::Array(mut items) if !items.is_empty() => Some(items.swap_remove(0)),
        serde_json::Value::Array(_) => None,
        other => Some(other),
    }
}

fn to_value<T: Serialize>(value: T) -> Result<serde_json::Value, JsonRpcError> {
    serde_json::to_value(value)
        .map_err(|e| JsonRpcError::new(JsonRpcError::INTERNAL, format!("Internal error: {}", e)))
}

async fn dispatch(
    state: &AppState,
    method: &str,
    params: Option<serde_json::Value>,
) -> Result<serde_json::Value, JsonRpcError> {
    match method {
        "board_height" => Ok(json!(state.ledger.height())),
        "board_getStats" => to_value(state.ledger.read(|board, _| board.get_contract_stats())),
        "board_getNonce" => {
            let sender = first_param(params)
                .and_then(|v| v.as_str().map(str::to_string))
                .ok_or_else(|| {
                    JsonRpcError::new(JsonRpcError::INVALID_PARAMS, "Invalid params: expected [sender]")
                })?;
            Ok(json!(state.ledger.next_nonce(&sender)))
        }
        "board_getMessage" => {
            let id = first_param(params)
                .and_then(|v| v.as_u64())
                .ok_or_else(|| {
                    JsonRpcError::new(JsonRpcError::INVALID_PARAMS, "Invalid params: expected [id]")
                })?;
            match state.ledger.read(|board, _| board.get_message(id).cloned()) {
                Some(msg) => to_value(msg),
                None => Err(JsonRpcError::new(
                    JsonRpcError::NOT_FOUND,
                    format!("Message not found: {}", id),
                )),
            }
        }
        "board_submit" => {
            let tx: Transaction = first_param(params)
                .ok_or_else(|| {
                    JsonRpcError::new(
                        JsonRpcError::INVALID_PARAMS,
                        "Invalid params: expected [transaction]",
                    )
                })
                .and_then(|v| {
                    serde_json::from_value(v).map_err(|e| {
                        JsonRpcError::new(
                            JsonRpcError::INVALID_PARAMS,
                            format!("Invalid params: {}", e),
                        )
                    })
                })?;
            // Lock and sled commit block; keep them off the async workers.
            let worker = state.clone();
            let submitted = tokio::task::spawn_blocking(move || submit_transaction(&worker, tx))
                .await
                .map_err(|e| {
                    JsonRpcError::new(
                        JsonRpcError::INTERNAL,
                        format!("Internal error: submission task failed: {}", e),
                    )
                })?;
            match submitted {
                Ok(receipt) => to_value(receipt),
                Err(LedgerError::BadNonce { expected, got, .. }) => Err(JsonRpcError {
                    code: JsonRpcError::BAD_NONCE,
                    message: format!("Bad nonce: expected {}, got {}", expected, got),
                    data: Some(json!({ "expected": expected })),
                }),
                Err(e) => Err(JsonRpcError::new(
                    JsonRpcError::INTERNAL,
                    format!("Internal error: {}", e),
                )),
            }
        }
        _ => Err(JsonRpcError::new(
            JsonRpcError::METHOD_NOT_FOUND,
            format!("Method not found: {}", method),
        )),
    }
}

// ---------------------------------------------------------------------------
// WebSocket
// ---------------------------------------------------------------------------

/// `GET /ws`: push-only stream of [`NodeEvent`]s as JSON text frames.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

async fn handle_ws_connection(mut socket: WebSocket, state: AppState) {
    let mut rx = state.event_tx.subscribe();

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(ev) => {
                        let payload = match serde_json::to_string(&ev) {
                            Ok(s) => s,
                            Err(e) => {
                                tracing::warn!("failed to serialize ws event: {}", e);
                                continue;
                            }
                        };
                        if socket.send(WsMessage::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("ws subscriber lagged by {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(_)) => {}
                    _ => break,
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
