//! # Access & Pause Control
//!
//! Tracks the board owner, an optional pending owner, and the pause flag.
//!
//! Ownership moves in two steps: the current owner proposes a candidate,
//! then the candidate accepts. A fresh proposal replaces any earlier one,
//! so only the most recently proposed identity can ever accept.
//!
//! The pause flag gates content mutations only. Withdrawals, fee changes,
//! ownership management and every read view keep working while paused.

use serde::{Deserialize, Serialize};

use crate::error::{BoardError, BoardResult};

/// Owner identity, pending proposal, and pause flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControl {
    owner: String,
    proposed_owner: Option<String>,
    paused: bool,
}

impl AccessControl {
    /// Starts unpaused with `owner` in charge and nothing pending.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            proposed_owner: None,
            paused: false,
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn proposed_owner(&self) -> Option<&str> {
        self.proposed_owner.as_deref()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Fails with [`BoardError::OwnerOnly`] unless `caller` is the owner.
    pub fn ensure_owner(&self, caller: &str) -> BoardResult<()> {
        if caller != self.owner {
            return Err(BoardError::OwnerOnly);
        }
        Ok(())
    }

    /// Fails with [`BoardError::Paused`] while content mutations are suspended.
    pub fn ensure_not_paused(&self) -> BoardResult<()> {
        if self.paused {
            return Err(BoardError::Paused);
        }
        Ok(())
    }

    /// Suspends content mutations. Pausing an already paused board is allowed.
    pub fn pause(&mut self, caller: &str) -> BoardResult<()> {
        self.ensure_owner(caller)?;
        self.paused = true;
        Ok(())
    }

    /// Resumes content mutations.
    pub fn unpause(&mut self, caller: &str) -> BoardResult<()> {
        self.ensure_owner(caller)?;
        self.paused = false;
        Ok(())
    }

    /// Records `candidate` as the pending owner, replacing any earlier one.
    pub fn propose(&mut self, caller: &str, candidate: &str) -> BoardResult<()> {
        self.ensure_owner(caller)?;
        self.proposed_owner = Some(candidate.to_string());
        Ok(())
    }

    /// Clears the pending proposal and returns the candidate it named.
    ///
    /// Cancelling with nothing pending is a no-op that returns `None`.
    pub fn cancel_proposal(&mut self, caller: &str) -> BoardResult<Option<String>> {
        self.ensure_owner(caller)?;
        Ok(self.proposed_owner.take())
    }

    /// Completes the transfer if `caller` is the pending candidate.
    ///
    /// Returns the previous owner.
    ///
    /// # Errors
    ///
    /// - [`BoardError::NoPendingProposal`] when nothing is pending.
    /// - [`BoardError::NotProposedOwner`] when someone else was proposed.
    pub fn accept(&mut self, caller: &str) -> BoardResult<String> {
        match self.proposed_owner.as_deref() {
            None => Err(BoardError::NoPendingProposal),
            Some(candidate) if candidate != caller => Err(BoardError::NotProposedOwner),
            Some(_) => {
                self.proposed_owner = None;
                Ok(std::mem::replace(&mut self.owner, caller.to_string()))
            }
        }
    }
}
