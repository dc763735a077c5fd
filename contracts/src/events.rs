//! # Board Events
//!
//! Each successful mutating call emits exactly one [`BoardEvent`]; failed
//! calls emit nothing. The board buffers events until the host drains them
//! with [`MessageBoard::take_events`](crate::board::MessageBoard::take_events)
//! and attaches them to the transaction receipt.

use serde::{Deserialize, Serialize};

use crate::fees::FeeKind;
use crate::message::{BlockHeight, MessageId};
use crate::reactions::ReactionType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum BoardEvent {
    #[serde(rename_all = "kebab-case")]
    MessagePosted {
        message_id: MessageId,
        author: String,
        fee: u64,
        expires_at: BlockHeight,
    },
    #[serde(rename_all = "kebab-case")]
    ReplyPosted {
        message_id: MessageId,
        parent_id: MessageId,
        author: String,
        fee: u64,
    },
    /// `edit_number` is the message's edit count after this edit.
    #[serde(rename_all = "kebab-case")]
    MessageEdited {
        message_id: MessageId,
        editor: String,
        edit_number: u32,
    },
    #[serde(rename_all = "kebab-case")]
    MessagePinned {
        message_id: MessageId,
        author: String,
        duration: u64,
        pin_expires_at: BlockHeight,
        fee: u64,
    },
    #[serde(rename_all = "kebab-case")]
    ReactionAdded {
        message_id: MessageId,
        reactor: String,
        reaction_type: ReactionType,
        fee: u64,
    },
    #[serde(rename_all = "kebab-case")]
    MessageDeleted {
        message_id: MessageId,
        author: String,
    },
    #[serde(rename_all = "kebab-case")]
    FeesWithdrawn {
        amount: u64,
        recipient: String,
        remaining_balance: u64,
    },
    ContractPaused {
        by: String,
    },
    ContractUnpaused {
        by: String,
    },
    OwnershipProposed {
        owner: String,
        candidate: String,
    },
    /// `candidate` is `None` when nothing was pending.
    OwnershipTransferCancelled {
        owner: String,
        candidate: Option<String>,
    },
    #[serde(rename_all = "kebab-case")]
    OwnershipAccepted {
        previous_owner: String,
        new_owner: String,
    },
    #[serde(rename_all = "kebab-case")]
    FeeUpdated {
        kind: FeeKind,
        old_value: u64,
        new_value: u64,
    },
}

impl BoardEvent {
    /// The event name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            BoardEvent::MessagePosted { .. } => "message-posted",
            BoardEvent::ReplyPosted { .. } => "reply-posted",
            BoardEvent::MessageEdited { .. } => "message-edited",
            BoardEvent::MessagePinned { .. } => "message-pinned",
            BoardEvent::ReactionAdded { .. } => "reaction-added",
            BoardEvent::MessageDeleted { .. } => "message-deleted",
            BoardEvent::FeesWithdrawn { .. } => "fees-withdrawn",
            BoardEvent::ContractPaused { .. } => "contract-paused",
            BoardEvent::ContractUnpaused { .. } => "contract-unpaused",
            BoardEvent::OwnershipProposed { .. } => "ownership-proposed",
            BoardEvent::OwnershipTransferCancelled { .. } => "ownership-transfer-cancelled",
            BoardEvent::OwnershipAccepted { .. } => "ownership-accepted",
            BoardEvent::FeeUpdated { .. } => "fee-updated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_uses_kebab_case_tags_and_fields() {
        let ev = BoardEvent::MessageEdited {
            message_id: 0,
            editor: "alice".into(),
            edit_number: 1,
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "message-edited");
        assert_eq!(json["message-id"], 0);
        assert_eq!(json["edit-number"], 1);
        assert_eq!(ev.name(), "message-edited");
    }

    #[test]
    fn name_matches_serde_tag() {
        let events = [
            BoardEvent::ContractPaused { by: "d".into() },
            BoardEvent::FeeUpdated {
                kind: FeeKind::Pin72h,
                old_value: 1,
                new_value: 2,
            },
            BoardEvent::OwnershipTransferCancelled {
                owner: "d".into(),
                candidate: None,
            },
        ];
        for ev in events {
            let json = serde_json::to_value(&ev).unwrap();
            assert_eq!(json["event"], ev.name());
        }
    }
}
