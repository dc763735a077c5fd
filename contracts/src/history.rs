//! # Edit History
//!
//! Append-only log of the content a message had before each edit, keyed by
//! `(message_id, edit_index)`. The entry is written before the edit applies,
//! so index 0 always holds the original text. Rows are never removed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::message::{BlockHeight, MessageId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditHistoryEntry {
    pub previous_content: String,
    /// Height at which the replacing edit was applied.
    pub edited_at_height: BlockHeight,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditHistory {
    entries: BTreeMap<MessageId, Vec<EditHistoryEntry>>,
}

impl EditHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the pre-edit content and returns the index it landed on.
    pub(crate) fn append(
        &mut self,
        message_id: MessageId,
        previous_content: String,
        height: BlockHeight,
    ) -> u32 {
        let log = self.entries.entry(message_id).or_default();
        log.push(EditHistoryEntry {
            previous_content,
            edited_at_height: height,
        });
        (log.len() - 1) as u32
    }

    pub fn get(&self, message_id: MessageId, index: u32) -> Option<&EditHistoryEntry> {
        self.entries
            .get(&message_id)
            .and_then(|log| log.get(index as usize))
    }

    /// Every prior version of a message, oldest first.
    pub fn versions(&self, message_id: MessageId) -> &[EditHistoryEntry] {
        self.entries
            .get(&message_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
