//! # User Stats
//!
//! Per-identity spend and posting activity. Posts and replies advance
//! `messages_posted` and `last_post_height`; pins and reactions only add to
//! `total_spent`. Only `last_post_height` feeds the posting cooldown.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::MIN_POST_GAP;
use crate::counters::{credited, incremented};
use crate::error::{BoardError, BoardResult};
use crate::message::BlockHeight;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub messages_posted: u64,
    /// Sum of every fee this identity has paid.
    pub total_spent: u64,
    /// `None` until the identity posts or replies for the first time.
    pub last_post_height: Option<BlockHeight>,
}

impl UserStats {
    /// Whether a post at `height` clears the cooldown.
    pub fn can_post_at(&self, height: BlockHeight) -> bool {
        match self.last_post_height {
            Some(last) => height.saturating_sub(last) >= MIN_POST_GAP,
            None => true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStatsStore {
    users: BTreeMap<String, UserStats>,
}

impl UserStatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user: &str) -> Option<&UserStats> {
        self.users.get(user)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Fails with [`BoardError::TooSoon`] if `user` posted fewer than
    /// [`MIN_POST_GAP`] blocks before `height`.
    pub fn ensure_cooldown(&self, user: &str, height: BlockHeight) -> BoardResult<()> {
        match self.users.get(user) {
            Some(stats) if !stats.can_post_at(height) => Err(BoardError::TooSoon),
            _ => Ok(()),
        }
    }

    /// Computes the stats a post at `height` paying `fee` would produce.
    pub(crate) fn preview_post(
        &self,
        user: &str,
        fee: u64,
        height: BlockHeight,
    ) -> BoardResult<UserStats> {
        let current = self.users.get(user).cloned().unwrap_or_default();
        Ok(UserStats {
            messages_posted: incremented(current.messages_posted)?,
            total_spent: credited(current.total_spent, fee)?,
            last_post_height: Some(height),
        })
    }

    /// Computes the stats a non-posting payment of `fee` would produce.
    pub(crate) fn preview_spend(&self, user: &str, fee: u64) -> BoardResult<UserStats> {
        let current = self.users.get(user).cloned().unwrap_or_default();
        Ok(UserStats {
            total_spent: credited(current.total_spent, fee)?,
            ..current
        })
    }

    pub(crate) fn put(&mut self, user: &str, stats: UserStats) {
        self.users.insert(user.to_string(), stats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_post_is_never_too_soon() {
        let store = UserStatsStore::new();
        assert!(store.ensure_cooldown("alice", 0).is_ok());
    }

    #[test]
    fn cooldown_requires_full_gap() {
        let mut store = UserStatsStore::new();
        let stats = store.preview_post("alice", 10_000, 100).unwrap();
        store.put("alice", stats);
        assert_eq!(store.ensure_cooldown("alice", 100), Err(BoardError::TooSoon));
        assert_eq!(store.ensure_cooldown("alice", 105), Err(BoardError::TooSoon));
        assert!(store.ensure_cooldown("alice", 106).is_ok());
        assert!(store.ensure_cooldown("bob", 100).is_ok());
    }

    #[test]
    fn spending_leaves_cooldown_untouched() {
        let mut store = UserStatsStore::new();
        store.put("alice", store.preview_post("alice", 10_000, 100).unwrap());
        store.put("alice", store.preview_spend("alice", 50_000).unwrap());
        let stats = store.get("alice").unwrap();
        assert_eq!(stats.messages_posted, 1);
        assert_eq!(stats.total_spent, 60_000);
        assert_eq!(stats.last_post_height, Some(100));
    }

    #[test]
    fn reactor_without_posts_has_no_post_height() {
        let mut store = UserStatsStore::new();
        store.put("bob", store.preview_spend("bob", 5_000).unwrap());
        let stats = store.get("bob").unwrap();
        assert_eq!(stats.messages_posted, 0);
        assert_eq!(stats.last_post_height, None);
        assert!(store.ensure_cooldown("bob", 0).is_ok());
    }
}
