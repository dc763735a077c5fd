//! # Board Parameters
//!
//! Every fixed number the ledger enforces lives here. Heights are logical
//! block heights; fees are in the smallest fee unit.
//!
//! Changing any of these after launch changes consensus-visible behavior,
//! so treat them as frozen once a board has history.

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// Shortest accepted message body, in Unicode scalar values.
pub const MIN_CONTENT_CHARS: usize = 1;

/// Longest accepted message body, in Unicode scalar values. An emoji counts
/// once, not per UTF-8 byte.
pub const MAX_CONTENT_CHARS: usize = 280;

/// How many times a single message may be edited over its lifetime.
pub const MAX_EDIT_COUNT: u32 = 10;

// ---------------------------------------------------------------------------
// Timing (in blocks)
// ---------------------------------------------------------------------------

/// Minimum height gap between two posts (or replies) by the same author.
/// Six blocks is roughly an hour at ten-minute blocks.
pub const MIN_POST_GAP: u64 = 6;

/// Blocks after creation at which a message stops being "active". Fixed at
/// creation; edits and pins never move it.
pub const MESSAGE_TTL_BLOCKS: u64 = 144;

/// The short pin window (~24 hours).
pub const PIN_24H_BLOCKS: u64 = 144;

/// The long pin window (~72 hours).
pub const PIN_72H_BLOCKS: u64 = 432;

// ---------------------------------------------------------------------------
// Fees
// ---------------------------------------------------------------------------

/// Lower bound for every configurable fee.
pub const MIN_FEE: u64 = 1_000;

/// Upper bound for every configurable fee.
pub const MAX_FEE: u64 = 10_000_000;

/// Default charge for a post or reply.
pub const DEFAULT_FEE_POST: u64 = 10_000;

/// Default charge for a 144-block pin.
pub const DEFAULT_FEE_PIN_24H: u64 = 50_000;

/// Default charge for a 432-block pin.
pub const DEFAULT_FEE_PIN_72H: u64 = 100_000;

/// Default charge for a reaction.
pub const DEFAULT_FEE_REACTION: u64 = 5_000;

// ---------------------------------------------------------------------------
// Reactions
// ---------------------------------------------------------------------------

/// Smallest valid reaction tag.
pub const REACTION_TYPE_MIN: u8 = 1;

/// Largest valid reaction tag.
pub const REACTION_TYPE_MAX: u8 = 5;

/// Tag recorded by the untyped react call.
pub const DEFAULT_REACTION_TYPE: u8 = 1;

// ---------------------------------------------------------------------------
// Read views
// ---------------------------------------------------------------------------

/// Largest page the pagination helper will describe. Larger requests are
/// clamped down to this.
pub const MAX_PAGE_SIZE: u64 = 50;
