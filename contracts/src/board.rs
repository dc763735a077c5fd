//! # Message Board
//!
//! The aggregate root. Owns every store (messages, reactions, edit history,
//! user stats), the counters, the fee schedule and access control, and
//! exposes one method per entry point.
//!
//! ## Atomicity
//!
//! Every entry point runs in two phases:
//!
//! 1. **Check**: pause flag, input bounds, existence, deletion, authorship
//!    and state preconditions, then every counter bump is computed with
//!    checked arithmetic. Nothing is written yet.
//! 2. **Commit**: the precomputed values are stored. This phase cannot
//!    fail.
//!
//! An error therefore always means "no state changed, no event emitted".
//!
//! ## Precondition order
//!
//! Checks run cheapest-first: pause, then stateless input bounds (content
//! length, pin duration, reaction type), then message existence, deletion,
//! authorship, and finally stateful limits (edit cap, duplicate reaction,
//! cooldown). When several preconditions fail at once the first one in this
//! order is reported.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::access::AccessControl;
use crate::counters::{incremented, GlobalCounters, Withdrawal};
use crate::error::{BoardError, BoardResult};
use crate::events::BoardEvent;
use crate::fees::{FeeConfig, FeeKind};
use crate::history::EditHistory;
use crate::message::{validate_content, BlockHeight, Message, MessageId};
use crate::reactions::{ReactionLedger, ReactionType};
use crate::stats::UserStatsStore;

/// The complete board state.
///
/// Not internally synchronized: wrap it in a [`Ledger`](crate::ledger::Ledger)
/// (or an equivalent single-writer boundary) before sharing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBoard {
    pub(crate) access: AccessControl,
    pub(crate) fees: FeeConfig,
    pub(crate) counters: GlobalCounters,
    /// Indexed by id; ids are dense and start at 0.
    pub(crate) messages: Vec<Message>,
    pub(crate) reactions: ReactionLedger,
    pub(crate) history: EditHistory,
    pub(crate) stats: UserStatsStore,
    pub(crate) withdrawals: Vec<Withdrawal>,
    #[serde(skip)]
    events: Vec<BoardEvent>,
}

impl MessageBoard {
    /// A fresh board owned by `owner` with the default fee schedule.
    pub fn new(owner: impl Into<String>) -> Self {
        Self::from_parts(owner, FeeConfig::default())
    }

    /// A fresh board with a custom starting fee schedule.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if any fee is outside `MIN_FEE..=MAX_FEE`.
    pub fn with_fees(owner: impl Into<String>, fees: FeeConfig) -> BoardResult<Self> {
        fees.validate()?;
        Ok(Self::from_parts(owner, fees))
    }

    fn from_parts(owner: impl Into<String>, fees: FeeConfig) -> Self {
        Self {
            access: AccessControl::new(owner),
            fees,
            counters: GlobalCounters::default(),
            messages: Vec::new(),
            reactions: ReactionLedger::new(),
            history: EditHistory::new(),
            stats: UserStatsStore::new(),
            withdrawals: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Drains the events emitted since the last call.
    pub fn take_events(&mut self) -> Vec<BoardEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: BoardEvent) {
        self.events.push(event);
    }

    pub(crate) fn message_ref(&self, id: MessageId) -> BoardResult<&Message> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.messages.get(i))
            .ok_or(BoardError::NotFound)
    }

    fn message_mut(&mut self, id: MessageId) -> BoardResult<&mut Message> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.messages.get_mut(i))
            .ok_or(BoardError::NotFound)
    }

    // -----------------------------------------------------------------------
    // Posting
    // -----------------------------------------------------------------------

    /// Posts a new top-level message and returns its id.
    ///
    /// Charges the post fee and starts the author's cooldown.
    ///
    /// # Errors
    ///
    /// `Paused`, `InvalidInput` (length), `TooSoon`.
    pub fn post_message(
        &mut self,
        sender: &str,
        height: BlockHeight,
        content: &str,
    ) -> BoardResult<MessageId> {
        self.access.ensure_not_paused()?;
        validate_content(content)?;
        let id = self.create_message(sender, height, content, None)?;
        let expires_at = self.message_ref(id)?.expires_at_height;
        self.emit(BoardEvent::MessagePosted {
            message_id: id,
            author: sender.to_string(),
            fee: self.fees.post,
            expires_at,
        });
        debug!(message_id = id, author = sender, height, "message posted");
        Ok(id)
    }

    /// Posts a reply to `parent_id` and returns the new message's id.
    ///
    /// Replies pay the post fee and share the posting cooldown. Deleting
    /// the parent later does not touch its replies.
    ///
    /// # Errors
    ///
    /// `Paused`, `InvalidInput` (length), `NotFound` / `AlreadyDeleted`
    /// (parent), `TooSoon`.
    pub fn reply_to_message(
        &mut self,
        sender: &str,
        height: BlockHeight,
        parent_id: MessageId,
        content: &str,
    ) -> BoardResult<MessageId> {
        self.access.ensure_not_paused()?;
        validate_content(content)?;
        let parent = self.message_ref(parent_id)?;
        parent.ensure_live()?;
        let parent_replies = incremented(parent.reply_count)?;
        let total_replies = incremented(self.counters.total_replies)?;

        let id = self.create_message(sender, height, content, Some(parent_id))?;

        self.message_mut(parent_id)?.reply_count = parent_replies;
        self.counters.total_replies = total_replies;
        self.emit(BoardEvent::ReplyPosted {
            message_id: id,
            parent_id,
            author: sender.to_string(),
            fee: self.fees.post,
        });
        debug!(message_id = id, parent_id, author = sender, height, "reply posted");
        Ok(id)
    }

    /// Shared tail of post and reply: cooldown, fee, id allocation.
    fn create_message(
        &mut self,
        sender: &str,
        height: BlockHeight,
        content: &str,
        parent: Option<MessageId>,
    ) -> BoardResult<MessageId> {
        self.stats.ensure_cooldown(sender, height)?;
        let fee = self.fees.post;
        let id = self.counters.message_nonce;
        let next_nonce = incremented(id)?;
        let total_messages = incremented(self.counters.total_messages)?;
        self.counters.check_collect(fee)?;
        let stats = self.stats.preview_post(sender, fee, height)?;

        self.messages
            .push(Message::new(id, sender, content, height, parent));
        self.counters.message_nonce = next_nonce;
        self.counters.total_messages = total_messages;
        self.counters.collect(fee);
        self.stats.put(sender, stats);
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Mutating an existing message
    // -----------------------------------------------------------------------

    /// Replaces the content of the caller's own message.
    ///
    /// The old content is appended to the edit history first. Free of
    /// charge, and does not touch the cooldown.
    ///
    /// # Errors
    ///
    /// `Paused`, `InvalidInput` (length), `NotFound`, `AlreadyDeleted`,
    /// `Unauthorized`, `MaxEditsReached`.
    pub fn edit_message(
        &mut self,
        sender: &str,
        height: BlockHeight,
        message_id: MessageId,
        content: &str,
    ) -> BoardResult<()> {
        self.access.ensure_not_paused()?;
        validate_content(content)?;
        let msg = self.message_ref(message_id)?;
        msg.ensure_live()?;
        msg.ensure_author(sender)?;
        if msg.edits_remaining() == 0 {
            return Err(BoardError::MaxEditsReached);
        }
        let edit_number = msg.edit_count + 1;
        let total_edits = incremented(self.counters.total_edits)?;

        let msg = self.message_mut(message_id)?;
        let previous = std::mem::replace(&mut msg.content, content.to_string());
        msg.edit_count = edit_number;
        msg.edited = true;
        self.history.append(message_id, previous, height);
        self.counters.total_edits = total_edits;
        self.emit(BoardEvent::MessageEdited {
            message_id,
            editor: sender.to_string(),
            edit_number,
        });
        debug!(message_id, edit_number, height, "message edited");
        Ok(())
    }

    /// Pins the caller's own message for `duration` blocks from `height`.
    ///
    /// Re-pinning overwrites the previous expiry with `height + duration`;
    /// it does not add to whatever time was left.
    ///
    /// # Errors
    ///
    /// `Paused`, `InvalidInput` (duration other than 144 or 432),
    /// `NotFound`, `AlreadyDeleted`, `Unauthorized`.
    pub fn pin_message(
        &mut self,
        sender: &str,
        height: BlockHeight,
        message_id: MessageId,
        duration: u64,
    ) -> BoardResult<()> {
        self.access.ensure_not_paused()?;
        let fee = self.fees.pin_fee(duration)?;
        let msg = self.message_ref(message_id)?;
        msg.ensure_live()?;
        msg.ensure_author(sender)?;
        let pin_expires_at = height
            .checked_add(duration)
            .ok_or(BoardError::InvalidInput)?;
        self.counters.check_collect(fee)?;
        let stats = self.stats.preview_spend(sender, fee)?;

        let msg = self.message_mut(message_id)?;
        msg.pinned = true;
        msg.pin_expires_at_height = pin_expires_at;
        self.counters.collect(fee);
        self.stats.put(sender, stats);
        self.emit(BoardEvent::MessagePinned {
            message_id,
            author: sender.to_string(),
            duration,
            pin_expires_at,
            fee,
        });
        debug!(message_id, duration, pin_expires_at, "message pinned");
        Ok(())
    }

    /// Reacts with the default type. Shares the one-per-identity slot with
    /// [`react_to_message_typed`](Self::react_to_message_typed).
    pub fn react_to_message(
        &mut self,
        sender: &str,
        height: BlockHeight,
        message_id: MessageId,
    ) -> BoardResult<()> {
        self.react(sender, height, message_id, ReactionType::DEFAULT)
    }

    /// Reacts with an explicit type in `1..=5`.
    ///
    /// # Errors
    ///
    /// `Paused`, `InvalidInput` (type), `NotFound`, `AlreadyDeleted`,
    /// `AlreadyReacted`.
    pub fn react_to_message_typed(
        &mut self,
        sender: &str,
        height: BlockHeight,
        message_id: MessageId,
        reaction_type: u64,
    ) -> BoardResult<()> {
        self.access.ensure_not_paused()?;
        let reaction_type = ReactionType::from_u64(reaction_type)?;
        self.react(sender, height, message_id, reaction_type)
    }

    fn react(
        &mut self,
        sender: &str,
        height: BlockHeight,
        message_id: MessageId,
        reaction_type: ReactionType,
    ) -> BoardResult<()> {
        self.access.ensure_not_paused()?;
        let msg = self.message_ref(message_id)?;
        msg.ensure_live()?;
        self.reactions.ensure_can_react(message_id, sender)?;
        let reaction_count = incremented(msg.reaction_count)?;
        let fee = self.fees.reaction;
        self.counters.check_collect(fee)?;
        let stats = self.stats.preview_spend(sender, fee)?;

        self.reactions.record(message_id, sender, reaction_type);
        self.message_mut(message_id)?.reaction_count = reaction_count;
        self.counters.collect(fee);
        self.stats.put(sender, stats);
        self.emit(BoardEvent::ReactionAdded {
            message_id,
            reactor: sender.to_string(),
            reaction_type,
            fee,
        });
        debug!(message_id, reactor = sender, %reaction_type, height, "reaction added");
        Ok(())
    }

    /// Soft-deletes the caller's own message and clears its pin.
    ///
    /// Content, counters and stats are kept. Replies are untouched.
    ///
    /// # Errors
    ///
    /// `Paused`, `NotFound`, `AlreadyDeleted`, `Unauthorized`.
    pub fn delete_message(
        &mut self,
        sender: &str,
        height: BlockHeight,
        message_id: MessageId,
    ) -> BoardResult<()> {
        self.access.ensure_not_paused()?;
        let msg = self.message_ref(message_id)?;
        msg.ensure_live()?;
        msg.ensure_author(sender)?;
        let total_deleted = incremented(self.counters.total_deleted)?;

        let msg = self.message_mut(message_id)?;
        msg.deleted = true;
        msg.pinned = false;
        self.counters.total_deleted = total_deleted;
        self.emit(BoardEvent::MessageDeleted {
            message_id,
            author: sender.to_string(),
        });
        debug!(message_id, height, "message deleted");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Administration (never gated by pause)
    // -----------------------------------------------------------------------

    pub fn pause(&mut self, sender: &str) -> BoardResult<()> {
        self.access.pause(sender)?;
        self.emit(BoardEvent::ContractPaused {
            by: sender.to_string(),
        });
        info!(by = sender, "board paused");
        Ok(())
    }

    pub fn unpause(&mut self, sender: &str) -> BoardResult<()> {
        self.access.unpause(sender)?;
        self.emit(BoardEvent::ContractUnpaused {
            by: sender.to_string(),
        });
        info!(by = sender, "board unpaused");
        Ok(())
    }

    /// Names `candidate` as the pending owner, replacing any earlier proposal.
    pub fn propose_ownership_transfer(&mut self, sender: &str, candidate: &str) -> BoardResult<()> {
        self.access.propose(sender, candidate)?;
        self.emit(BoardEvent::OwnershipProposed {
            owner: sender.to_string(),
            candidate: candidate.to_string(),
        });
        info!(owner = sender, candidate, "ownership transfer proposed");
        Ok(())
    }

    /// Completes a pending transfer. Only the proposed candidate may call this.
    pub fn accept_ownership(&mut self, sender: &str) -> BoardResult<()> {
        let previous_owner = self.access.accept(sender)?;
        info!(previous_owner = %previous_owner, new_owner = sender, "ownership accepted");
        self.emit(BoardEvent::OwnershipAccepted {
            previous_owner,
            new_owner: sender.to_string(),
        });
        Ok(())
    }

    pub fn cancel_ownership_transfer(&mut self, sender: &str) -> BoardResult<()> {
        let candidate = self.access.cancel_proposal(sender)?;
        info!(owner = sender, candidate = ?candidate, "ownership transfer cancelled");
        self.emit(BoardEvent::OwnershipTransferCancelled {
            owner: sender.to_string(),
            candidate,
        });
        Ok(())
    }

    /// Pays `amount` of the collected balance out to `recipient`.
    ///
    /// # Errors
    ///
    /// `OwnerOnly`, `InvalidInput` (zero amount), `InsufficientBalance`.
    pub fn withdraw_fees(
        &mut self,
        sender: &str,
        height: BlockHeight,
        amount: u64,
        recipient: &str,
    ) -> BoardResult<()> {
        self.access.ensure_owner(sender)?;
        self.counters.check_withdraw(amount)?;

        let remaining_balance = self.counters.withdraw(amount);
        self.withdrawals.push(Withdrawal {
            amount,
            recipient: recipient.to_string(),
            height,
        });
        self.emit(BoardEvent::FeesWithdrawn {
            amount,
            recipient: recipient.to_string(),
            remaining_balance,
        });
        info!(amount, recipient, remaining_balance, "fees withdrawn");
        Ok(())
    }

    /// Updates one fee. Applies to the next paid action only.
    ///
    /// # Errors
    ///
    /// `OwnerOnly`, `InvalidInput` (outside the fee bounds).
    pub fn set_fee(&mut self, sender: &str, kind: FeeKind, value: u64) -> BoardResult<()> {
        self.access.ensure_owner(sender)?;
        let old_value = self.fees.set(kind, value)?;
        self.emit(BoardEvent::FeeUpdated {
            kind,
            old_value,
            new_value: value,
        });
        info!(%kind, old_value, new_value = value, "fee updated");
        Ok(())
    }

    pub fn set_fee_post_message(&mut self, sender: &str, value: u64) -> BoardResult<()> {
        self.set_fee(sender, FeeKind::Post, value)
    }

    pub fn set_fee_pin_24h(&mut self, sender: &str, value: u64) -> BoardResult<()> {
        self.set_fee(sender, FeeKind::Pin24h, value)
    }

    pub fn set_fee_pin_72h(&mut self, sender: &str, value: u64) -> BoardResult<()> {
        self.set_fee(sender, FeeKind::Pin72h, value)
    }

    pub fn set_fee_reaction(&mut self, sender: &str, value: u64) -> BoardResult<()> {
        self.set_fee(sender, FeeKind::Reaction, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MAX_EDIT_COUNT, PIN_24H_BLOCKS, PIN_72H_BLOCKS};

    const OWNER: &str = "deployer";

    #[test]
    fn post_allocates_sequential_ids_and_charges_fee() {
        let mut board = MessageBoard::new(OWNER);
        assert_eq!(board.post_message("alice", 100, "Hello"), Ok(0));
        assert_eq!(board.post_message("bob", 100, "Hi"), Ok(1));
        assert_eq!(board.counters.message_nonce, 2);
        assert_eq!(board.counters.total_messages, 2);
        assert_eq!(board.counters.contract_balance, 20_000);
    }

    #[test]
    fn custom_fee_schedule_must_be_in_bounds() {
        let out_of_range = FeeConfig {
            post: 0,
            pin_24h: 1,
            pin_72h: u64::MAX,
            reaction: 0,
        };
        assert_eq!(
            MessageBoard::with_fees(OWNER, out_of_range),
            Err(BoardError::InvalidInput)
        );

        let fees = FeeConfig {
            post: 2_000,
            ..FeeConfig::default()
        };
        let mut board = MessageBoard::with_fees(OWNER, fees).unwrap();
        board.post_message("alice", 100, "cheap").unwrap();
        assert_eq!(board.get_contract_balance(), 2_000);
    }

    #[test]
    fn failed_call_changes_nothing_and_emits_nothing() {
        let mut board = MessageBoard::new(OWNER);
        board.post_message("alice", 100, "Hello").unwrap();
        board.take_events();
        let before = board.clone();

        assert_eq!(board.post_message("alice", 101, "again"), Err(BoardError::TooSoon));
        assert_eq!(board.edit_message("bob", 101, 0, "x"), Err(BoardError::Unauthorized));
        assert_eq!(board.pin_message("alice", 101, 0, 100), Err(BoardError::InvalidInput));
        assert_eq!(board.react_to_message_typed("bob", 101, 0, 9), Err(BoardError::InvalidInput));
        assert_eq!(board.delete_message("alice", 101, 7), Err(BoardError::NotFound));
        assert_eq!(board.withdraw_fees(OWNER, 101, 10_001, OWNER), Err(BoardError::InsufficientBalance));

        assert_eq!(board, before);
        assert!(board.take_events().is_empty());
    }

    #[test]
    fn edit_records_history_before_applying() {
        let mut board = MessageBoard::new(OWNER);
        board.post_message("alice", 100, "v0").unwrap();
        board.edit_message("alice", 101, 0, "v1").unwrap();
        board.edit_message("alice", 102, 0, "v2").unwrap();

        let msg = &board.messages[0];
        assert_eq!(msg.content, "v2");
        assert_eq!(msg.edit_count, 2);
        assert!(msg.edited);
        assert_eq!(board.history.get(0, 0).unwrap().previous_content, "v0");
        assert_eq!(board.history.get(0, 1).unwrap().previous_content, "v1");
        assert_eq!(board.counters.total_edits, 2);
    }

    #[test]
    fn edit_cap_is_enforced() {
        let mut board = MessageBoard::new(OWNER);
        board.post_message("alice", 100, "orig").unwrap();
        for i in 0..MAX_EDIT_COUNT {
            board
                .edit_message("alice", 100, 0, &format!("edit {i}"))
                .unwrap();
        }
        assert_eq!(
            board.edit_message("alice", 100, 0, "one too many"),
            Err(BoardError::MaxEditsReached)
        );
    }

    #[test]
    fn pin_fee_depends_on_duration() {
        let mut board = MessageBoard::new(OWNER);
        board.post_message("alice", 100, "a").unwrap();
        board.post_message("bob", 100, "b").unwrap();
        board.pin_message("alice", 100, 0, PIN_24H_BLOCKS).unwrap();
        board.pin_message("bob", 100, 1, PIN_72H_BLOCKS).unwrap();
        assert_eq!(board.stats.get("alice").unwrap().total_spent, 60_000);
        assert_eq!(board.stats.get("bob").unwrap().total_spent, 110_000);
    }

    #[test]
    fn react_paths_share_one_slot() {
        let mut board = MessageBoard::new(OWNER);
        board.post_message("alice", 100, "a").unwrap();
        board.react_to_message("bob", 100, 0).unwrap();
        assert_eq!(
            board.react_to_message_typed("bob", 100, 0, 3),
            Err(BoardError::AlreadyReacted)
        );
        board.react_to_message_typed("carol", 100, 0, 3).unwrap();
        assert_eq!(
            board.react_to_message("carol", 100, 0),
            Err(BoardError::AlreadyReacted)
        );
        assert_eq!(board.messages[0].reaction_count, 2);
    }

    #[test]
    fn each_success_emits_one_event() {
        let mut board = MessageBoard::new(OWNER);
        board.post_message("alice", 100, "a").unwrap();
        board.react_to_message("bob", 100, 0).unwrap();
        board.pause(OWNER).unwrap();
        let names: Vec<_> = board.take_events().iter().map(|e| e.name()).collect();
        assert_eq!(names, ["message-posted", "reaction-added", "contract-paused"]);
        assert!(board.take_events().is_empty());
    }
}
