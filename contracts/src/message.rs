//! # Message Records
//!
//! A message is created by a post or a reply and is never physically
//! removed. Its lifecycle:
//!
//! 1. **Created**: `expires_at_height` is fixed at `created_at_height +`
//!    [`MESSAGE_TTL_BLOCKS`] and never moves again.
//! 2. **Mutated**: up to [`MAX_EDIT_COUNT`] edits, any number of paid pins
//!    (each re-pin restarts the window from the current height), and one
//!    reaction per identity.
//! 3. **Soft-deleted**: one way. Every field is kept for audit, but the
//!    message no longer accepts edits, pins, reactions or replies.
//!
//! Replies store their parent as `parent_id + 1` in `reply_to`, so zero
//! means "not a reply" and message 0 can still be replied to.

use serde::{Deserialize, Serialize};

use crate::config::{MAX_CONTENT_CHARS, MAX_EDIT_COUNT, MESSAGE_TTL_BLOCKS, MIN_CONTENT_CHARS};
use crate::error::{BoardError, BoardResult};

/// Sequential message identifier, starting at 0.
pub type MessageId = u64;

/// A logical block height.
pub type BlockHeight = u64;

/// A single board message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub author: String,
    pub content: String,
    pub created_at_height: BlockHeight,
    pub expires_at_height: BlockHeight,
    pub pinned: bool,
    pub pin_expires_at_height: BlockHeight,
    pub reaction_count: u64,
    pub deleted: bool,
    pub edited: bool,
    pub edit_count: u32,
    /// `0` for top-level messages, otherwise `parent_id + 1`.
    pub reply_to: u64,
    pub reply_count: u64,
}

impl Message {
    pub(crate) fn new(
        id: MessageId,
        author: &str,
        content: &str,
        height: BlockHeight,
        parent: Option<MessageId>,
    ) -> Self {
        Self {
            id,
            author: author.to_string(),
            content: content.to_string(),
            created_at_height: height,
            expires_at_height: height.saturating_add(MESSAGE_TTL_BLOCKS),
            pinned: false,
            pin_expires_at_height: 0,
            reaction_count: 0,
            deleted: false,
            edited: false,
            edit_count: 0,
            reply_to: parent.map_or(0, |p| p + 1),
            reply_count: 0,
        }
    }

    pub fn is_reply(&self) -> bool {
        self.reply_to != 0
    }

    /// The parent's id, if this message is a reply.
    pub fn parent_id(&self) -> Option<MessageId> {
        self.reply_to.checked_sub(1)
    }

    /// Past the fixed creation-time window. Edits and pins do not extend it.
    pub fn is_expired_at(&self, height: BlockHeight) -> bool {
        height >= self.expires_at_height
    }

    /// Pinned and the pin window has not yet closed.
    pub fn is_pinned_at(&self, height: BlockHeight) -> bool {
        self.pinned && height < self.pin_expires_at_height
    }

    /// Neither deleted nor expired.
    pub fn is_active_at(&self, height: BlockHeight) -> bool {
        !self.deleted && !self.is_expired_at(height)
    }

    pub fn edits_remaining(&self) -> u32 {
        MAX_EDIT_COUNT.saturating_sub(self.edit_count)
    }

    /// Fails with [`BoardError::AlreadyDeleted`] once soft-deleted.
    pub(crate) fn ensure_live(&self) -> BoardResult<()> {
        if self.deleted {
            return Err(BoardError::AlreadyDeleted);
        }
        Ok(())
    }

    /// Fails with [`BoardError::Unauthorized`] unless `caller` wrote this message.
    pub(crate) fn ensure_author(&self, caller: &str) -> BoardResult<()> {
        if self.author != caller {
            return Err(BoardError::Unauthorized);
        }
        Ok(())
    }
}

/// Checks a message body against the length bounds, counted in Unicode
/// scalar values rather than bytes.
pub fn validate_content(content: &str) -> BoardResult<()> {
    let len = content.chars().count();
    if !(MIN_CONTENT_CHARS..=MAX_CONTENT_CHARS).contains(&len) {
        return Err(BoardError::InvalidInput);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_bounds_count_characters_not_bytes() {
        assert_eq!(validate_content(""), Err(BoardError::InvalidInput));
        assert!(validate_content("a").is_ok());
        assert!(validate_content(&"a".repeat(280)).is_ok());
        assert_eq!(
            validate_content(&"a".repeat(281)),
            Err(BoardError::InvalidInput)
        );
        // 280 four-byte emoji are 1120 bytes but still within bounds.
        assert!(validate_content(&"🚀".repeat(280)).is_ok());
        assert!(validate_content("你好世界").is_ok());
    }

    #[test]
    fn reply_encoding_offsets_parent_by_one() {
        let top = Message::new(0, "alice", "root", 100, None);
        assert_eq!(top.reply_to, 0);
        assert!(!top.is_reply());
        assert_eq!(top.parent_id(), None);

        let reply = Message::new(1, "bob", "re", 106, Some(0));
        assert_eq!(reply.reply_to, 1);
        assert!(reply.is_reply());
        assert_eq!(reply.parent_id(), Some(0));
    }

    #[test]
    fn expiry_is_fixed_at_creation() {
        let msg = Message::new(0, "alice", "hi", 100, None);
        assert_eq!(msg.expires_at_height, 244);
        assert!(!msg.is_expired_at(243));
        assert!(msg.is_expired_at(244));
        assert!(msg.is_active_at(243));
        assert!(!msg.is_active_at(244));
    }

    #[test]
    fn pin_window_is_half_open() {
        let mut msg = Message::new(0, "alice", "hi", 100, None);
        assert!(!msg.is_pinned_at(100));
        msg.pinned = true;
        msg.pin_expires_at_height = 254;
        assert!(msg.is_pinned_at(253));
        assert!(!msg.is_pinned_at(254));
    }
}
