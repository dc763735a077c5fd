//! # Board Errors
//!
//! Every rejected call maps to exactly one [`BoardError`], and every variant
//! carries a fixed numeric code. Callers outside the ledger (wallet UIs,
//! batch submitters) key their user-facing text off the code, so the codes
//! are part of the public contract and must never be renumbered.
//!
//! | Code | Variant               |
//! |------|-----------------------|
//! | 100  | `OwnerOnly`           |
//! | 101  | `NotFound`            |
//! | 102  | `Unauthorized`        |
//! | 103  | `InvalidInput`        |
//! | 104  | `MaxEditsReached`     |
//! | 105  | `AlreadyReacted`      |
//! | 106  | `TooSoon`             |
//! | 107  | `Paused`              |
//! | 108  | `InsufficientBalance` |
//! | 109  | `AlreadyDeleted`      |
//! | 110  | `NoPendingProposal`   |
//! | 111  | `NotProposedOwner`    |

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by board entry points.
///
/// A call that returns an error has not changed any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum BoardError {
    /// The caller is not the board owner.
    #[error("owner only")]
    OwnerOnly,

    /// No message exists with the requested id.
    #[error("message not found")]
    NotFound,

    /// The caller is not the author of the message.
    #[error("unauthorized: caller is not the author")]
    Unauthorized,

    /// A length, duration, amount, reaction type or fee is out of range.
    #[error("invalid input")]
    InvalidInput,

    /// The message has already been edited the maximum number of times.
    #[error("max edits reached")]
    MaxEditsReached,

    /// The caller already reacted to this message.
    #[error("already reacted")]
    AlreadyReacted,

    /// The author posted too recently.
    #[error("too soon: post cooldown has not elapsed")]
    TooSoon,

    /// Content mutations are suspended.
    #[error("board is paused")]
    Paused,

    /// Withdrawal exceeds the collected balance.
    #[error("insufficient balance")]
    InsufficientBalance,

    /// The message was soft-deleted.
    #[error("message already deleted")]
    AlreadyDeleted,

    /// There is no ownership proposal to accept.
    #[error("no pending ownership proposal")]
    NoPendingProposal,

    /// The caller is not the proposed owner.
    #[error("caller is not the proposed owner")]
    NotProposedOwner,
}

impl BoardError {
    /// All variants in code order.
    pub const ALL: [BoardError; 12] = [
        BoardError::OwnerOnly,
        BoardError::NotFound,
        BoardError::Unauthorized,
        BoardError::InvalidInput,
        BoardError::MaxEditsReached,
        BoardError::AlreadyReacted,
        BoardError::TooSoon,
        BoardError::Paused,
        BoardError::InsufficientBalance,
        BoardError::AlreadyDeleted,
        BoardError::NoPendingProposal,
        BoardError::NotProposedOwner,
    ];

    /// The stable numeric code for this error.
    pub const fn code(self) -> u32 {
        match self {
            BoardError::OwnerOnly => 100,
            BoardError::NotFound => 101,
            BoardError::Unauthorized => 102,
            BoardError::InvalidInput => 103,
            BoardError::MaxEditsReached => 104,
            BoardError::AlreadyReacted => 105,
            BoardError::TooSoon => 106,
            BoardError::Paused => 107,
            BoardError::InsufficientBalance => 108,
            BoardError::AlreadyDeleted => 109,
            BoardError::NoPendingProposal => 110,
            BoardError::NotProposedOwner => 111,
        }
    }

    /// Maps a numeric code back to its variant.
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.code() == code)
    }
}

/// Shorthand used across the board modules.
pub type BoardResult<T> = Result<T, BoardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_contiguous_from_100() {
        for (i, err) in BoardError::ALL.iter().enumerate() {
            assert_eq!(err.code(), 100 + i as u32);
        }
    }

    #[test]
    fn from_code_inverts_code() {
        for err in BoardError::ALL {
            assert_eq!(BoardError::from_code(err.code()), Some(err));
        }
        assert_eq!(BoardError::from_code(99), None);
        assert_eq!(BoardError::from_code(112), None);
    }
}
