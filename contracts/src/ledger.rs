//! # Ledger Host
//!
//! The single-writer boundary around a [`MessageBoard`]. Every mutation goes
//! through [`Ledger::submit`], which holds one write lock for the whole of
//! nonce check, execution, event collection and journaling. Readers take the
//! read lock and always see a committed state.
//!
//! ## Transaction inclusion
//!
//! A transaction whose nonce matches the sender's next nonce is *included*:
//! its nonce is consumed even when the call itself fails, and a [`Receipt`]
//! records the outcome. A transaction with any other nonce is rejected
//! outright with [`LedgerError::BadNonce`] and leaves no trace.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::board::MessageBoard;
use crate::call::{BoardCall, CallOutput};
use crate::error::BoardError;
use crate::events::BoardEvent;
use crate::message::BlockHeight;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LedgerError {
    /// The transaction's nonce is not the sender's next nonce.
    #[error("bad nonce for {sender}: expected {expected}, got {got}")]
    BadNonce {
        sender: String,
        expected: u64,
        got: u64,
    },

    /// The transaction could not be encoded for hashing.
    #[error("encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    /// The journal refused the transaction; nothing was committed.
    #[error("journal error: {0}")]
    Journal(anyhow::Error),
}

// ---------------------------------------------------------------------------
// Transactions & receipts
// ---------------------------------------------------------------------------

/// A call signed off by `sender` with its account nonce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub nonce: u64,
    pub call: BoardCall,
}

/// Result of an included transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Ok(CallOutput),
    Err { code: u32 },
}

impl Outcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }

    /// The board error behind a failed outcome.
    pub fn error(&self) -> Option<BoardError> {
        match self {
            Outcome::Ok(_) => None,
            Outcome::Err { code } => BoardError::from_code(*code),
        }
    }
}

impl From<Result<CallOutput, BoardError>> for Outcome {
    fn from(result: Result<CallOutput, BoardError>) -> Self {
        match result {
            Ok(output) => Outcome::Ok(output),
            Err(e) => Outcome::Err { code: e.code() },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Hex BLAKE3 of the encoded transaction and its inclusion height.
    pub tx_id: String,
    pub sender: String,
    pub nonce: u64,
    pub height: BlockHeight,
    /// Wire name of the executed call.
    pub call: String,
    pub outcome: Outcome,
    /// Exactly one event on success, none on failure.
    pub events: Vec<BoardEvent>,
}

/// Computes the id a transaction gets when included at `height`.
pub fn transaction_id(tx: &Transaction, height: BlockHeight) -> Result<String, LedgerError> {
    let bytes = bincode::serialize(&(tx, height))?;
    Ok(hex::encode(blake3::hash(&bytes).as_bytes()))
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Everything the ledger persists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    pub board: MessageBoard,
    pub height: BlockHeight,
    /// Next expected nonce per sender; absent means 0.
    pub nonces: BTreeMap<String, u64>,
}

impl LedgerState {
    /// An empty board owned by `owner`, at height 0.
    pub fn genesis(owner: impl Into<String>) -> Self {
        Self {
            board: MessageBoard::new(owner),
            height: 0,
            nonces: BTreeMap::new(),
        }
    }

    pub fn next_nonce(&self, sender: &str) -> u64 {
        self.nonces.get(sender).copied().unwrap_or(0)
    }
}

/// Durable sink for committed transactions.
///
/// Called with the write lock held, so implementations see transactions in
/// execution order and must not call back into the ledger.
pub trait Journal: Send + Sync {
    fn record(&self, state: &LedgerState, receipt: &Receipt) -> anyhow::Result<()>;
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

pub struct Ledger {
    state: RwLock<LedgerState>,
    journal: Option<Box<dyn Journal>>,
}

impl Ledger {
    pub fn new(state: LedgerState) -> Self {
        Self {
            state: RwLock::new(state),
            journal: None,
        }
    }

    pub fn with_journal(state: LedgerState, journal: Box<dyn Journal>) -> Self {
        Self {
            state: RwLock::new(state),
            journal: Some(journal),
        }
    }

    /// Checks the nonce, executes the call and returns its receipt.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::BadNonce`] if `tx.nonce` is not the sender's next
    ///   nonce. Nothing is recorded.
    /// - [`LedgerError::Journal`] if the journal rejects the transaction.
    ///   The state, nonce included, is rolled back, so the same transaction
    ///   can be resubmitted.
    pub fn submit(&self, tx: Transaction) -> Result<Receipt, LedgerError> {
        let mut state = self.state.write();

        let expected = state.next_nonce(&tx.sender);
        if tx.nonce != expected {
            return Err(LedgerError::BadNonce {
                sender: tx.sender,
                expected,
                got: tx.nonce,
            });
        }

        let height = state.height;
        let tx_id = transaction_id(&tx, height)?;
        // Pre-state for rollback if the journal refuses the write.
        let before = self.journal.as_ref().map(|_| state.clone());

        let result = state.board.execute(&tx.sender, height, &tx.call);
        let events = state.board.take_events();
        state
            .nonces
            .insert(tx.sender.clone(), expected.saturating_add(1));

        if let Err(e) = &result {
            debug!(
                tx_id = %tx_id,
                sender = %tx.sender,
                call = tx.call.name(),
                code = e.code(),
                "call rejected"
            );
        }

        let receipt = Receipt {
            tx_id,
            sender: tx.sender,
            nonce: tx.nonce,
            height,
            call: tx.call.name().to_string(),
            outcome: result.into(),
            events,
        };

        if let (Some(journal), Some(before)) = (&self.journal, before) {
            if let Err(e) = journal.record(&state, &receipt) {
                *state = before;
                return Err(LedgerError::Journal(e));
            }
        }
        Ok(receipt)
    }

    /// Moves the logical clock forward and returns the new height.
    pub fn advance(&self, blocks: u64) -> BlockHeight {
        let mut state = self.state.write();
        state.height = state.height.saturating_add(blocks);
        state.height
    }

    pub fn height(&self) -> BlockHeight {
        self.state.read().height
    }

    pub fn next_nonce(&self, sender: &str) -> u64 {
        self.state.read().next_nonce(sender)
    }

    /// Runs `f` against a consistent view of the board and current height.
    pub fn read<R>(&self, f: impl FnOnce(&MessageBoard, BlockHeight) -> R) -> R {
        let state = self.state.read();
        f(&state.board, state.height)
    }

    pub fn snapshot(&self) -> LedgerState {
        self.state.read().clone()
    }

    /// Replaces the whole state, e.g. after loading it from disk.
    pub fn restore(&self, state: LedgerState) {
        *self.state.write() = state;
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("height", &self.height())
            .field("journal", &self.journal.is_some())
            .finish()
    }
}
