//! # Global Counters & Treasury
//!
//! Aggregate totals for the whole board plus the collected fee balance.
//!
//! The counters only ever grow, with one exception: `contract_balance`
//! shrinks on withdrawal. At all times
//! `contract_balance == total_fees_collected - total_withdrawn`.

use serde::{Deserialize, Serialize};

use crate::error::{BoardError, BoardResult};

/// Height-stamped record of a fee withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub amount: u64,
    pub recipient: String,
    pub height: u64,
}

/// Board-wide totals and the fee balance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalCounters {
    /// Id the next message will receive.
    pub message_nonce: u64,
    /// Posts plus replies ever created.
    pub total_messages: u64,
    pub total_deleted: u64,
    pub total_edits: u64,
    pub total_replies: u64,
    pub total_fees_collected: u64,
    pub total_withdrawn: u64,
    /// Fees currently held by the board.
    pub contract_balance: u64,
}

/// Adds one to a counter, failing instead of wrapping.
pub(crate) fn incremented(value: u64) -> BoardResult<u64> {
    value.checked_add(1).ok_or(BoardError::InvalidInput)
}

/// Adds `amount` to a running total, failing instead of wrapping.
pub(crate) fn credited(value: u64, amount: u64) -> BoardResult<u64> {
    value.checked_add(amount).ok_or(BoardError::InvalidInput)
}

impl GlobalCounters {
    /// Confirms a fee can be collected without overflowing either total.
    pub fn check_collect(&self, fee: u64) -> BoardResult<()> {
        credited(self.total_fees_collected, fee)?;
        credited(self.contract_balance, fee)?;
        Ok(())
    }

    /// Books a collected fee. Callers run [`check_collect`](Self::check_collect)
    /// first so this cannot fail halfway.
    pub(crate) fn collect(&mut self, fee: u64) {
        self.total_fees_collected = self.total_fees_collected.saturating_add(fee);
        self.contract_balance = self.contract_balance.saturating_add(fee);
    }

    /// Validates a withdrawal against the current balance.
    ///
    /// # Errors
    ///
    /// - [`BoardError::InvalidInput`] for a zero amount.
    /// - [`BoardError::InsufficientBalance`] when `amount` exceeds the balance.
    pub fn check_withdraw(&self, amount: u64) -> BoardResult<()> {
        if amount == 0 {
            return Err(BoardError::InvalidInput);
        }
        if amount > self.contract_balance {
            return Err(BoardError::InsufficientBalance);
        }
        Ok(())
    }

    /// Debits a validated withdrawal and returns the remaining balance.
    pub(crate) fn withdraw(&mut self, amount: u64) -> u64 {
        self.contract_balance -= amount;
        self.total_withdrawn = self.total_withdrawn.saturating_add(amount);
        self.contract_balance
    }
}
