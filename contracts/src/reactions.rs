//! # Reaction Ledger
//!
//! One reaction slot per `(message, identity)`, ever. The untyped and typed
//! react calls share that slot, so reacting once in either form closes it
//! for both. Each accepted reaction also bumps a per-type tally.
//!
//! Invariant: for every message, the sum of its tallies equals the number
//! of recorded reactors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_REACTION_TYPE, REACTION_TYPE_MAX, REACTION_TYPE_MIN};
use crate::error::{BoardError, BoardResult};
use crate::message::MessageId;

const TYPE_COUNT: usize = (REACTION_TYPE_MAX - REACTION_TYPE_MIN + 1) as usize;

/// A reaction tag in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ReactionType(u8);

impl ReactionType {
    /// The tag recorded by the untyped react call.
    pub const DEFAULT: ReactionType = ReactionType(DEFAULT_REACTION_TYPE);

    /// Validates a raw tag.
    ///
    /// # Errors
    ///
    /// [`BoardError::InvalidInput`] outside `1..=5`.
    pub fn new(raw: u8) -> BoardResult<Self> {
        if !(REACTION_TYPE_MIN..=REACTION_TYPE_MAX).contains(&raw) {
            return Err(BoardError::InvalidInput);
        }
        Ok(Self(raw))
    }

    /// Like [`new`](Self::new) but for wider integers coming off the wire.
    pub fn from_u64(raw: u64) -> BoardResult<Self> {
        u8::try_from(raw)
            .map_err(|_| BoardError::InvalidInput)
            .and_then(Self::new)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    fn slot(self) -> usize {
        (self.0 - REACTION_TYPE_MIN) as usize
    }
}

impl TryFrom<u8> for ReactionType {
    type Error = BoardError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<ReactionType> for u8 {
    fn from(t: ReactionType) -> u8 {
        t.0
    }
}

impl std::fmt::Display for ReactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who reacted to what, and the per-type totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionLedger {
    /// message -> (reactor -> type)
    records: BTreeMap<MessageId, BTreeMap<String, ReactionType>>,
    /// message -> count per type, indexed by `type - 1`
    tallies: BTreeMap<MessageId, [u64; TYPE_COUNT]>,
}

impl ReactionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_reacted(&self, message_id: MessageId, reactor: &str) -> bool {
        self.reaction_of(message_id, reactor).is_some()
    }

    /// The type `reactor` chose for `message_id`, if any.
    pub fn reaction_of(&self, message_id: MessageId, reactor: &str) -> Option<ReactionType> {
        self.records
            .get(&message_id)
            .and_then(|by_user| by_user.get(reactor))
            .copied()
    }

    /// Count of `reaction_type` reactions on `message_id`.
    pub fn tally(&self, message_id: MessageId, reaction_type: ReactionType) -> u64 {
        self.tallies
            .get(&message_id)
            .map(|t| t[reaction_type.slot()])
            .unwrap_or(0)
    }

    /// Sum of all tallies for `message_id`.
    pub fn total(&self, message_id: MessageId) -> u64 {
        self.tallies
            .get(&message_id)
            .map(|t| t.iter().sum())
            .unwrap_or(0)
    }

    /// Number of distinct reactors on `message_id`.
    pub fn reactor_count(&self, message_id: MessageId) -> u64 {
        self.records
            .get(&message_id)
            .map(|r| r.len() as u64)
            .unwrap_or(0)
    }

    /// Fails with [`BoardError::AlreadyReacted`] if the slot is taken.
    pub fn ensure_can_react(&self, message_id: MessageId, reactor: &str) -> BoardResult<()> {
        if self.has_reacted(message_id, reactor) {
            return Err(BoardError::AlreadyReacted);
        }
        Ok(())
    }

    /// Records a reaction. Callers check [`ensure_can_react`](Self::ensure_can_react)
    /// first; a second record for the same slot is ignored.
    pub(crate) fn record(
        &mut self,
        message_id: MessageId,
        reactor: &str,
        reaction_type: ReactionType,
    ) {
        let by_user = self.records.entry(message_id).or_default();
        if by_user.contains_key(reactor) {
            return;
        }
        by_user.insert(reactor.to_string(), reaction_type);
        let tally = self.tallies.entry(message_id).or_insert([0; TYPE_COUNT]);
        tally[reaction_type.slot()] += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rt(raw: u8) -> ReactionType {
        ReactionType::new(raw).unwrap()
    }

    #[test]
    fn reaction_type_bounds() {
        assert_eq!(ReactionType::new(0), Err(BoardError::InvalidInput));
        assert_eq!(ReactionType::new(6), Err(BoardError::InvalidInput));
        assert_eq!(ReactionType::from_u64(300), Err(BoardError::InvalidInput));
        for raw in 1..=5 {
            assert_eq!(ReactionType::new(raw).unwrap().get(), raw);
        }
        assert_eq!(ReactionType::DEFAULT.get(), 1);
    }

    #[test]
    fn tallies_are_tracked_per_type() {
        let mut ledger = ReactionLedger::new();
        ledger.record(0, "alice", rt(2));
        ledger.record(0, "bob", rt(2));
        ledger.record(0, "carol", rt(5));
        assert_eq!(ledger.tally(0, rt(2)), 2);
        assert_eq!(ledger.tally(0, rt(5)), 1);
        assert_eq!(ledger.tally(0, rt(1)), 0);
        assert_eq!(ledger.total(0), 3);
        assert_eq!(ledger.reactor_count(0), 3);
    }

    #[test]
    fn slot_is_shared_across_types() {
        let mut ledger = ReactionLedger::new();
        ledger.record(0, "alice", rt(3));
        assert_eq!(ledger.ensure_can_react(0, "alice"), Err(BoardError::AlreadyReacted));
        assert!(ledger.ensure_can_react(1, "alice").is_ok());
        assert_eq!(ledger.reaction_of(0, "alice"), Some(rt(3)));

        // A stray second record does not double count.
        ledger.record(0, "alice", rt(4));
        assert_eq!(ledger.total(0), 1);
        assert_eq!(ledger.reaction_of(0, "alice"), Some(rt(3)));
    }

    #[test]
    fn reaction_type_serializes_as_plain_number() {
        let json = serde_json::to_string(&rt(4)).unwrap();
        assert_eq!(json, "4");
        assert!(serde_json::from_str::<ReactionType>("9").is_err());
    }
}
