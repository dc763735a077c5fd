//! # Fee Configuration
//!
//! Four independently configurable charges, each bounded to
//! [`MIN_FEE`]..=[`MAX_FEE`]. A new value applies from the next paid action
//! on; nothing already charged is revisited.

use serde::{Deserialize, Serialize};

use crate::config::{
    DEFAULT_FEE_PIN_24H, DEFAULT_FEE_PIN_72H, DEFAULT_FEE_POST, DEFAULT_FEE_REACTION, MAX_FEE,
    MIN_FEE, PIN_24H_BLOCKS, PIN_72H_BLOCKS,
};
use crate::error::{BoardError, BoardResult};

/// Which of the four charges a setter or event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeeKind {
    /// Posting a message or a reply.
    Post,
    /// Pinning for [`PIN_24H_BLOCKS`].
    #[serde(rename = "pin-24h")]
    Pin24h,
    /// Pinning for [`PIN_72H_BLOCKS`].
    #[serde(rename = "pin-72h")]
    Pin72h,
    /// Reacting to a message.
    Reaction,
}

impl std::fmt::Display for FeeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeeKind::Post => write!(f, "post"),
            FeeKind::Pin24h => write!(f, "pin-24h"),
            FeeKind::Pin72h => write!(f, "pin-72h"),
            FeeKind::Reaction => write!(f, "reaction"),
        }
    }
}

/// The current fee schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConfig {
    pub post: u64,
    pub pin_24h: u64,
    pub pin_72h: u64,
    pub reaction: u64,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            post: DEFAULT_FEE_POST,
            pin_24h: DEFAULT_FEE_PIN_24H,
            pin_72h: DEFAULT_FEE_PIN_72H,
            reaction: DEFAULT_FEE_REACTION,
        }
    }
}

impl FeeConfig {
    /// Current value of one charge.
    pub fn get(&self, kind: FeeKind) -> u64 {
        match kind {
            FeeKind::Post => self.post,
            FeeKind::Pin24h => self.pin_24h,
            FeeKind::Pin72h => self.pin_72h,
            FeeKind::Reaction => self.reaction,
        }
    }

    /// Checks every charge against the fee bounds.
    ///
    /// # Errors
    ///
    /// [`BoardError::InvalidInput`] if any charge is out of range.
    pub fn validate(&self) -> BoardResult<()> {
        let in_bounds = [self.post, self.pin_24h, self.pin_72h, self.reaction]
            .iter()
            .all(|fee| (MIN_FEE..=MAX_FEE).contains(fee));
        if in_bounds {
            Ok(())
        } else {
            Err(BoardError::InvalidInput)
        }
    }

    /// Replaces one charge and returns the value it had before.
    ///
    /// # Errors
    ///
    /// [`BoardError::InvalidInput`] when `value` is outside the fee bounds.
    pub fn set(&mut self, kind: FeeKind, value: u64) -> BoardResult<u64> {
        if !(MIN_FEE..=MAX_FEE).contains(&value) {
            return Err(BoardError::InvalidInput);
        }
        let slot = match kind {
            FeeKind::Post => &mut self.post,
            FeeKind::Pin24h => &mut self.pin_24h,
            FeeKind::Pin72h => &mut self.pin_72h,
            FeeKind::Reaction => &mut self.reaction,
        };
        Ok(std::mem::replace(slot, value))
    }

    /// Maps a pin duration to the charge that applies to it.
    ///
    /// Only the two standard windows are accepted.
    pub fn pin_fee(&self, duration: u64) -> BoardResult<u64> {
        match duration {
            PIN_24H_BLOCKS => Ok(self.pin_24h),
            PIN_72H_BLOCKS => Ok(self.pin_72h),
            _ => Err(BoardError::InvalidInput),
        }
    }
}
