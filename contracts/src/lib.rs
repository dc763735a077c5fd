// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Message Board Ledger
//!
//! Deterministic core of a fee-charging public message board. Identities
//! post short messages, reply, edit (with a kept history), pin for a paid
//! window, react once per message, and soft-delete their own posts. An owner
//! can pause the board, tune fees, withdraw collected fees and hand the
//! board over through a two-step transfer.
//!
//! - [`board::MessageBoard`]: the aggregate root and every entry point.
//! - [`views`]: read-only queries, available even while paused.
//! - [`call`]: serializable calls and their dispatch.
//! - [`ledger`]: the single-writer host: nonces, receipts, journaling.
//!
//! ## Design Principles
//!
//! 1. Every failure is one of twelve [`BoardError`] variants with a stable
//!    numeric code, and leaves the state exactly as it was.
//! 2. Counter arithmetic is checked. Overflow is rejected, never wrapped.
//! 3. The crate has no clock, no randomness and no I/O. Time is a block
//!    height passed in by the caller.
//! 4. Records are never physically removed: deletes are flags, edit history
//!    only grows.

pub mod access;
pub mod board;
pub mod call;
pub mod config;
pub mod counters;
pub mod error;
pub mod events;
pub mod fees;
pub mod history;
pub mod ledger;
pub mod message;
pub mod reactions;
pub mod stats;
pub mod views;

pub use board::MessageBoard;
pub use call::{BoardCall, CallOutput};
pub use error::{BoardError, BoardResult};
pub use events::BoardEvent;
pub use fees::{FeeConfig, FeeKind};
pub use ledger::{Journal, Ledger, LedgerError, LedgerState, Outcome, Receipt, Transaction};
pub use message::{BlockHeight, Message, MessageId};
pub use reactions::ReactionType;
pub use stats::UserStats;
pub use views::{ContractStats, PageRange};

/// Crate version, as reported by the node.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
