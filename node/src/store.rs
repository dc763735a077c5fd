//! # Board Store
//!
//! Persistence for the node, on sled.
//!
//! | Tree       | Key              | Value                    |
//! |------------|------------------|--------------------------|
//! | `state`    | `"ledger"`       | `bincode(LedgerState)`   |
//! | `receipts` | `tx_id` (hex)    | `json(Receipt)`          |
//! | `metadata` | key (UTF-8)      | value (bytes)            |
//!
//! Receipts are JSON because their events are internally tagged, which
//! bincode cannot read back.
//!
//! [`BoardStore`] is the ledger's [`Journal`]: each included transaction
//! writes the new state, its receipt and the height in one sled
//! transaction across all three trees, while the ledger lock is held.

use sled::transaction::{ConflictableTransactionResult, TransactionError, Transactional};
use sled::{Db, Tree};
use std::path::Path;

use msgboard_contracts::ledger::{Journal, LedgerState, Receipt};
use msgboard_contracts::BlockHeight;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("key not found: {0}")]
    NotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

const KEY_STATE: &[u8] = b"ledger";
const META_HEIGHT: &[u8] = b"block_height";
const META_RECEIPTS: &[u8] = b"receipt_count";

fn be_u64(bytes: &[u8]) -> StoreResult<u64> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StoreError::Serialization(format!("expected 8 bytes, got {}", bytes.len())))?;
    Ok(u64::from_be_bytes(arr))
}

// ---------------------------------------------------------------------------
// BoardStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BoardStore {
    db: Db,
    state: Tree,
    receipts: Tree,
    metadata: Tree,
}

impl BoardStore {
    /// Open or create a store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        Self::from_db(sled::open(path)?)
    }

    /// An in-memory store removed on drop.
    #[cfg(test)]
    pub fn open_temporary() -> StoreResult<Self> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: Db) -> StoreResult<Self> {
        Ok(Self {
            state: db.open_tree("state")?,
            receipts: db.open_tree("receipts")?,
            metadata: db.open_tree("metadata")?,
            db,
        })
    }

    // -- State ----------------------------------------------------------------

    /// The last persisted state, with its height raised to the last
    /// persisted block height if blocks were produced after it.
    pub fn load_state(&self) -> StoreResult<Option<LedgerState>> {
        let Some(bytes) = self.state.get(KEY_STATE)? else {
            return Ok(None);
        };
        let mut state: LedgerState =
            bincode::deserialize(&bytes).map_err(|e| StoreError::Serialization(e.to_string()))?;
        if let Some(height) = self.block_height()? {
            state.height = state.height.max(height);
        }
        Ok(Some(state))
    }

    /// Like [`load_state`](Self::load_state) but fails if the store was never
    /// initialized.
    pub fn require_state(&self) -> StoreResult<LedgerState> {
        self.load_state()?
            .ok_or_else(|| StoreError::NotFound("ledger state".into()))
    }

    /// Writes a full state outside of any transaction (genesis, shutdown).
    pub fn save_state(&self, state: &LedgerState) -> StoreResult<()> {
        let bytes =
            bincode::serialize(state).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.state.insert(KEY_STATE, bytes)?;
        self.metadata
            .insert(META_HEIGHT, state.height.to_be_bytes().to_vec())?;
        self.db.flush()?;
        Ok(())
    }

    pub fn has_state(&self) -> StoreResult<bool> {
        Ok(self.state.contains_key(KEY_STATE)?)
    }

    // -- Height ---------------------------------------------------------------

    pub fn save_block_height(&self, height: BlockHeight) -> StoreResult<()> {
        self.metadata
            .insert(META_HEIGHT, height.to_be_bytes().to_vec())?;
        Ok(())
    }

    pub fn block_height(&self) -> StoreResult<Option<BlockHeight>> {
        self.metadata
            .get(META_HEIGHT)?
            .map(|v| be_u64(&v))
            .transpose()
    }

    // -- Receipts -------------------------------------------------------------

    pub fn get_receipt(&self, tx_id: &str) -> StoreResult<Option<Receipt>> {
        match self.receipts.get(tx_id.as_bytes())? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| StoreError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    pub fn receipt_count(&self) -> StoreResult<u64> {
        Ok(self
            .metadata
            .get(META_RECEIPTS)?
            .map(|v| be_u64(&v))
            .transpose()?
            .unwrap_or(0))
    }

    /// State, receipt, height and receipt count in one atomic write.
    pub fn commit(&self, state: &LedgerState, receipt: &Receipt) -> StoreResult<()> {
        let state_bytes =
            bincode::serialize(state).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let receipt_bytes =
            serde_json::to_vec(receipt).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let height = state.height.to_be_bytes();
        let count = self.receipt_count()?.saturating_add(1).to_be_bytes();

        (&self.state, &self.receipts, &self.metadata)
            .transaction(
                |(state_tree, receipts, metadata)| -> ConflictableTransactionResult<(), ()> {
                    state_tree.insert(KEY_STATE, state_bytes.as_slice())?;
                    receipts.insert(receipt.tx_id.as_bytes(), receipt_bytes.as_slice())?;
                    metadata.insert(META_HEIGHT, &height[..])?;
                    metadata.insert(META_RECEIPTS, &count[..])?;
                    Ok(())
                },
            )
            .map_err(|e| match e {
                TransactionError::Storage(e) => StoreError::Sled(e),
                TransactionError::Abort(()) => {
                    StoreError::Serialization("store transaction aborted".into())
                }
            })
    }

    pub fn flush(&self) -> StoreResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl Journal for BoardStore {
    fn record(&self, state: &LedgerState, receipt: &Receipt) -> anyhow::Result<()> {
        self.commit(state, receipt)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msgboard_contracts::{BoardCall, Ledger, Transaction};

    fn post(nonce: u64) -> Transaction {
        Transaction {
            sender: "alice".into(),
            nonce,
            call: BoardCall::PostMessage {
                content: "persisted".into(),
            },
        }
    }

    #[test]
    fn empty_store_has_no_state() {
        let store = BoardStore::open_temporary().unwrap();
        assert!(store.load_state().unwrap().is_none());
        assert!(!store.has_state().unwrap());
        assert!(matches!(store.require_state(), Err(StoreError::NotFound(_))));
        assert_eq!(store.receipt_count().unwrap(), 0);
    }

    #[test]
    fn journal_persists_state_and_receipts() {
        let store = BoardStore::open_temporary().unwrap();
        let ledger = Ledger::with_journal(LedgerState::genesis("deployer"), Box::new(store.clone()));
        ledger.advance(50);
        let ok = ledger.submit(post(0)).unwrap();
        let failed = ledger.submit(post(1)).unwrap();

        let loaded = store.require_state().unwrap();
        assert_eq!(loaded, ledger.snapshot());
        assert_eq!(store.receipt_count().unwrap(), 2);
        assert_eq!(store.get_receipt(&ok.tx_id).unwrap(), Some(ok));
        assert_eq!(store.get_receipt(&failed.tx_id).unwrap(), Some(failed));
        assert!(store.get_receipt("deadbeef").unwrap().is_none());
    }

    #[test]
    fn block_height_raises_loaded_height() {
        let store = BoardStore::open_temporary().unwrap();
        store.save_state(&LedgerState::genesis("deployer")).unwrap();
        store.save_block_height(77).unwrap();
        assert_eq!(store.require_state().unwrap().height, 77);
    }
}
