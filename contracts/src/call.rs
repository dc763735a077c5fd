//! # Call Dispatch
//!
//! [`BoardCall`] is the serializable form of every mutating entry point, so
//! a host can carry calls inside transactions and replay them.

use serde::{Deserialize, Serialize};

use crate::board::MessageBoard;
use crate::error::BoardResult;
use crate::fees::FeeKind;
use crate::message::{BlockHeight, MessageId};

/// One mutating entry point with its arguments.
///
/// On the wire: `{"call": "post-message", "args": {"content": "hi"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", content = "args", rename_all = "kebab-case")]
pub enum BoardCall {
    PostMessage { content: String },
    ReplyToMessage { parent_id: MessageId, content: String },
    EditMessage { message_id: MessageId, content: String },
    PinMessage { message_id: MessageId, duration: u64 },
    ReactToMessage { message_id: MessageId },
    ReactToMessageTyped { message_id: MessageId, reaction_type: u64 },
    DeleteMessage { message_id: MessageId },
    PauseContract,
    UnpauseContract,
    ProposeOwnershipTransfer { candidate: String },
    AcceptOwnership,
    CancelOwnershipTransfer,
    WithdrawFees { amount: u64, recipient: String },
    SetFeePostMessage { value: u64 },
    SetFeePin24h { value: u64 },
    SetFeePin72h { value: u64 },
    SetFeeReaction { value: u64 },
}

impl BoardCall {
    /// The wire name of the call, for logs and metrics labels.
    pub fn name(&self) -> &'static str {
        match self {
            BoardCall::PostMessage { .. } => "post-message",
            BoardCall::ReplyToMessage { .. } => "reply-to-message",
            BoardCall::EditMessage { .. } => "edit-message",
            BoardCall::PinMessage { .. } => "pin-message",
            BoardCall::ReactToMessage { .. } => "react-to-message",
            BoardCall::ReactToMessageTyped { .. } => "react-to-message-typed",
            BoardCall::DeleteMessage { .. } => "delete-message",
            BoardCall::PauseContract => "pause-contract",
            BoardCall::UnpauseContract => "unpause-contract",
            BoardCall::ProposeOwnershipTransfer { .. } => "propose-ownership-transfer",
            BoardCall::AcceptOwnership => "accept-ownership",
            BoardCall::CancelOwnershipTransfer => "cancel-ownership-transfer",
            BoardCall::WithdrawFees { .. } => "withdraw-fees",
            BoardCall::SetFeePostMessage { .. } => "set-fee-post-message",
            BoardCall::SetFeePin24h { .. } => "set-fee-pin24h",
            BoardCall::SetFeePin72h { .. } => "set-fee-pin72h",
            BoardCall::SetFeeReaction { .. } => "set-fee-reaction",
        }
    }
}

/// What a successful call returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutput {
    /// Id allocated by a post or reply.
    MessageId(MessageId),
    Done,
}

impl MessageBoard {
    /// Runs `call` on behalf of `sender` at `height`.
    pub fn execute(
        &mut self,
        sender: &str,
        height: BlockHeight,
        call: &BoardCall,
    ) -> BoardResult<CallOutput> {
        use BoardCall::*;

        let done = |r: BoardResult<()>| r.map(|()| CallOutput::Done);
        match call {
            PostMessage { content } => self
                .post_message(sender, height, content)
                .map(CallOutput::MessageId),
            ReplyToMessage { parent_id, content } => self
                .reply_to_message(sender, height, *parent_id, content)
                .map(CallOutput::MessageId),
            EditMessage {
                message_id,
                content,
            } => done(self.edit_message(sender, height, *message_id, content)),
            PinMessage {
                message_id,
                duration,
            } => done(self.pin_message(sender, height, *message_id, *duration)),
            ReactToMessage { message_id } => {
                done(self.react_to_message(sender, height, *message_id))
            }
            ReactToMessageTyped {
                message_id,
                reaction_type,
            } => done(self.react_to_message_typed(sender, height, *message_id, *reaction_type)),
            DeleteMessage { message_id } => done(self.delete_message(sender, height, *message_id)),
            PauseContract => done(self.pause(sender)),
            UnpauseContract => done(self.unpause(sender)),
            ProposeOwnershipTransfer { candidate } => {
                done(self.propose_ownership_transfer(sender, candidate))
            }
            AcceptOwnership => done(self.accept_ownership(sender)),
            CancelOwnershipTransfer => done(self.cancel_ownership_transfer(sender)),
            WithdrawFees { amount, recipient } => {
                done(self.withdraw_fees(sender, height, *amount, recipient))
            }
            SetFeePostMessage { value } => done(self.set_fee(sender, FeeKind::Post, *value)),
            SetFeePin24h { value } => done(self.set_fee(sender, FeeKind::Pin24h, *value)),
            SetFeePin72h { value } => done(self.set_fee(sender, FeeKind::Pin72h, *value)),
            SetFeeReaction { value } => done(self.set_fee(sender, FeeKind::Reaction, *value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoardError;

    #[test]
    fn wire_shape() {
        let call: BoardCall = serde_json::from_str(
            r#"{"call":"reply-to-message","args":{"parent_id":3,"content":"hey"}}"#,
        )
        .unwrap();
        assert_eq!(
            call,
            BoardCall::ReplyToMessage {
                parent_id: 3,
                content: "hey".into()
            }
        );
        let unit: BoardCall = serde_json::from_str(r#"{"call":"pause-contract"}"#).unwrap();
        assert_eq!(unit, BoardCall::PauseContract);
    }

    #[test]
    fn name_matches_serde_tag() {
        let calls = [
            BoardCall::SetFeePin24h { value: 1_000 },
            BoardCall::AcceptOwnership,
            BoardCall::ReactToMessageTyped {
                message_id: 0,
                reaction_type: 2,
            },
        ];
        for call in calls {
            let json = serde_json::to_value(&call).unwrap();
            assert_eq!(json["call"], call.name());
        }
    }

    #[test]
    fn execute_dispatches_to_entry_points() {
        let mut board = MessageBoard::new("deployer");
        let post = BoardCall::PostMessage {
            content: "hello".into(),
        };
        assert_eq!(
            board.execute("alice", 100, &post),
            Ok(CallOutput::MessageId(0))
        );
        assert_eq!(board.execute("alice", 101, &post), Err(BoardError::TooSoon));
        assert_eq!(
            board.execute("bob", 101, &BoardCall::ReactToMessage { message_id: 0 }),
            Ok(CallOutput::Done)
        );
        assert_eq!(
            board.execute("bob", 101, &BoardCall::SetFeeReaction { value: 2_000 }),
            Err(BoardError::OwnerOnly)
        );
        assert_eq!(
            board.execute("deployer", 101, &BoardCall::SetFeeReaction { value: 2_000 }),
            Ok(CallOutput::Done)
        );
        assert_eq!(board.get_fees().reaction, 2_000);
    }
}
