//! # Read Views
//!
//! Side-effect-free queries over a [`MessageBoard`]. None of them check the
//! pause flag. Height-dependent views take the height explicitly so the
//! caller decides which block they are reading at.

use serde::{Deserialize, Serialize};

use crate::board::MessageBoard;
use crate::config::MAX_PAGE_SIZE;
use crate::counters::{GlobalCounters, Withdrawal};
use crate::error::BoardResult;
use crate::fees::{FeeConfig, FeeKind};
use crate::history::EditHistoryEntry;
use crate::message::{BlockHeight, Message, MessageId};
use crate::reactions::ReactionType;
use crate::stats::UserStats;

/// Board-wide summary returned by [`MessageBoard::get_contract_stats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractStats {
    pub total_messages: u64,
    pub total_deleted: u64,
    pub total_edits: u64,
    pub total_replies: u64,
    pub total_fees_collected: u64,
    pub total_withdrawn: u64,
    pub contract_balance: u64,
    pub message_nonce: u64,
    pub paused: bool,
}

/// A window of message ids for newest-first paging. `end_id` is exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start_id: MessageId,
    pub end_id: MessageId,
    pub total: u64,
}

impl PageRange {
    pub fn is_empty(&self) -> bool {
        self.start_id >= self.end_id
    }

    /// Ids on this page, newest first.
    pub fn ids(&self) -> impl Iterator<Item = MessageId> {
        (self.start_id..self.end_id).rev()
    }
}

impl MessageBoard {
    // -----------------------------------------------------------------------
    // Messages
    // -----------------------------------------------------------------------

    /// The raw record, deleted or expired included.
    pub fn get_message(&self, id: MessageId) -> Option<&Message> {
        self.message_ref(id).ok()
    }

    /// The record only while it is neither deleted nor expired at `height`.
    pub fn get_active_message(&self, id: MessageId, height: BlockHeight) -> Option<&Message> {
        self.get_message(id).filter(|m| m.is_active_at(height))
    }

    pub fn is_message_pinned(&self, id: MessageId, height: BlockHeight) -> bool {
        self.get_message(id).is_some_and(|m| m.is_pinned_at(height))
    }

    /// Unknown ids report `false`.
    pub fn is_message_expired(&self, id: MessageId, height: BlockHeight) -> bool {
        self.get_message(id).is_some_and(|m| m.is_expired_at(height))
    }

    pub fn is_message_deleted(&self, id: MessageId) -> bool {
        self.get_message(id).is_some_and(|m| m.deleted)
    }

    /// # Errors
    ///
    /// `NotFound` for an unknown id.
    pub fn is_reply(&self, id: MessageId) -> BoardResult<bool> {
        Ok(self.message_ref(id)?.is_reply())
    }

    /// The parent id of a reply, or `0` for a top-level message.
    ///
    /// Note that `0` is also a valid parent; use [`is_reply`](Self::is_reply)
    /// to tell the two apart.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id.
    pub fn get_reply_parent(&self, id: MessageId) -> BoardResult<MessageId> {
        Ok(self.message_ref(id)?.parent_id().unwrap_or(0))
    }

    /// Pre-edit content at `index`; index 0 is the original text.
    pub fn get_edit_history(&self, id: MessageId, index: u32) -> Option<&EditHistoryEntry> {
        self.history.get(id, index)
    }

    /// Every prior version of a message, oldest first.
    pub fn get_edit_versions(&self, id: MessageId) -> &[EditHistoryEntry] {
        self.history.versions(id)
    }

    /// Reverse-chronological window over the id space.
    ///
    /// `size` is clamped to [`MAX_PAGE_SIZE`]. Page 0 holds the newest
    /// `size` ids; a page past the oldest message is empty.
    pub fn get_page_range(&self, page: u64, size: u64) -> PageRange {
        let total = self.counters.message_nonce;
        let size = size.min(MAX_PAGE_SIZE);
        let end_id = total.saturating_sub(page.saturating_mul(size));
        let start_id = end_id.saturating_sub(size);
        PageRange {
            start_id,
            end_id,
            total,
        }
    }

    /// Messages on a page, newest first.
    pub fn get_page(&self, page: u64, size: u64) -> Vec<&Message> {
        self.get_page_range(page, size)
            .ids()
            .filter_map(|id| self.get_message(id))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Reactions
    // -----------------------------------------------------------------------

    pub fn has_user_reacted(&self, id: MessageId, user: &str) -> bool {
        self.reactions.has_reacted(id, user)
    }

    pub fn get_user_reaction(&self, id: MessageId, user: &str) -> Option<ReactionType> {
        self.reactions.reaction_of(id, user)
    }

    pub fn get_reaction_count(&self, id: MessageId, reaction_type: ReactionType) -> u64 {
        self.reactions.tally(id, reaction_type)
    }

    /// Distinct identities that reacted to `id`, whatever the type.
    pub fn get_reactor_count(&self, id: MessageId) -> u64 {
        self.reactions.reactor_count(id)
    }

    // -----------------------------------------------------------------------
    // Users, governance, treasury
    // -----------------------------------------------------------------------

    pub fn get_user_stats(&self, user: &str) -> Option<&UserStats> {
        self.stats.get(user)
    }

    pub fn get_owner(&self) -> &str {
        self.access.owner()
    }

    pub fn get_proposed_owner(&self) -> Option<&str> {
        self.access.proposed_owner()
    }

    pub fn is_paused(&self) -> bool {
        self.access.is_paused()
    }

    pub fn get_fees(&self) -> FeeConfig {
        self.fees
    }

    pub fn fee(&self, kind: FeeKind) -> u64 {
        self.fees.get(kind)
    }

    pub fn counters(&self) -> &GlobalCounters {
        &self.counters
    }

    pub fn get_message_nonce(&self) -> u64 {
        self.counters.message_nonce
    }

    pub fn get_total_messages(&self) -> u64 {
        self.counters.total_messages
    }

    pub fn get_total_deleted(&self) -> u64 {
        self.counters.total_deleted
    }

    pub fn get_total_edits(&self) -> u64 {
        self.counters.total_edits
    }

    pub fn get_total_replies(&self) -> u64 {
        self.counters.total_replies
    }

    pub fn get_total_fees_collected(&self) -> u64 {
        self.counters.total_fees_collected
    }

    pub fn get_contract_balance(&self) -> u64 {
        self.counters.contract_balance
    }

    /// Append-only payout log.
    pub fn get_withdrawals(&self) -> &[Withdrawal] {
        &self.withdrawals
    }

    pub fn get_contract_stats(&self) -> ContractStats {
        let c = &self.counters;
        ContractStats {
            total_messages: c.total_messages,
            total_deleted: c.total_deleted,
            total_edits: c.total_edits,
            total_replies: c.total_replies,
            total_fees_collected: c.total_fees_collected,
            total_withdrawn: c.total_withdrawn,
            contract_balance: c.contract_balance,
            message_nonce: c.message_nonce,
            paused: self.access.is_paused(),
        }
    }
}
