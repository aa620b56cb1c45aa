// SPDX-FileCopyrightText: 2026 Belfry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Normalized events consumed by the reconciliation engine, and the
//! delta it produces for each one.
//!
//! Events may reference conversations or messages the engine has never
//! seen; that is always tolerated. At-least-once delivery means any
//! event can be a duplicate of an earlier one.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::message::RawMessage;
use crate::types::{ConversationId, MessageId};

/// Read pointer for one conversation in a bulk read event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InboxPointer {
    pub conversation_id: ConversationId,
    #[serde(default)]
    pub max_message_id: Option<MessageId>,
    #[serde(default)]
    pub max_timestamp: Option<i64>,
}

/// Edits for one conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationEdits {
    pub conversation_id: ConversationId,
    pub messages: Vec<RawMessage>,
}

/// Explicit deletions for one conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationDeletions {
    pub conversation_id: ConversationId,
    pub message_ids: Vec<MessageId>,
}

/// History truncation bound for one conversation: everything at or
/// below `up_to` is gone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryBound {
    pub conversation_id: ConversationId,
    pub up_to: MessageId,
}

/// Server-reported unread count for one conversation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConversationCount {
    pub conversation_id: ConversationId,
    pub count: u32,
}

/// An event after intake normalization, ready for the dispatcher queue.
#[derive(Debug, Clone, Display, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NormalizedEvent {
    /// New messages arrived. `is_final_of_batch` marks the last page of
    /// a paginated push load: the resulting state must be flushed to
    /// the renderer even if this page's own delta was small.
    NewMessages {
        messages: Vec<RawMessage>,
        #[serde(default)]
        is_final_of_batch: bool,
    },
    /// The user read one conversation up to a message id and/or
    /// timestamp bound.
    ReadUpTo {
        conversation_id: ConversationId,
        #[serde(default)]
        max_message_id: Option<MessageId>,
        #[serde(default)]
        max_timestamp: Option<i64>,
    },
    /// Bulk read pointers for many conversations at once.
    ReadMany { inbox_pointers: Vec<InboxPointer> },
    /// Content edits. Messages not currently pending are ignored; an
    /// edit never creates a pending entry.
    EditedMessages { per_conversation: Vec<ConversationEdits> },
    /// Explicit per-message deletions.
    DeletedMessages {
        per_conversation: Vec<ConversationDeletions>,
    },
    /// Per-conversation history truncation.
    DeletedHistoryUpTo { per_conversation: Vec<HistoryBound> },
    /// Server-truth snapshot replacing all local state wholesale. The
    /// recovery path after restart or a long disconnect.
    FullResync {
        per_conversation_counts: Vec<ConversationCount>,
        pending_snapshot: Vec<RawMessage>,
    },
}

/// What one event did to the store.
///
/// "Significant" deltas change what a rendered notification would show:
/// the total moved, or some conversation crossed zero in either
/// direction. Content-only edits are tracked separately because they
/// re-render the existing alert without sounding it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delta {
    /// Conversations whose count went 0 -> >0.
    pub added_conversations: Vec<ConversationId>,
    /// Conversations whose count went >0 -> 0.
    pub removed_conversations: Vec<ConversationId>,
    /// Whether the total unread count changed.
    pub changed_total: bool,
    /// Conversations where pending content was replaced in place.
    pub edited_conversations: Vec<ConversationId>,
}

impl Delta {
    /// Whether this delta must be reflected in a rendered alert or badge.
    pub fn is_significant(&self) -> bool {
        self.changed_total
            || !self.added_conversations.is_empty()
            || !self.removed_conversations.is_empty()
    }

    /// Whether the event changed anything at all, including quiet
    /// content edits.
    pub fn has_changes(&self) -> bool {
        self.is_significant() || !self.edited_conversations.is_empty()
    }

    pub fn note_added(&mut self, conversation: ConversationId) {
        if !self.added_conversations.contains(&conversation) {
            self.added_conversations.push(conversation);
        }
    }

    pub fn note_removed(&mut self, conversation: ConversationId) {
        if !self.removed_conversations.contains(&conversation) {
            self.removed_conversations.push(conversation);
        }
    }

    pub fn note_edited(&mut self, conversation: ConversationId) {
        if !self.edited_conversations.contains(&conversation) {
            self.edited_conversations.push(conversation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_delta_is_quiet() {
        let delta = Delta::default();
        assert!(!delta.is_significant());
        assert!(!delta.has_changes());
    }

    #[test]
    fn zero_crossing_is_significant_without_total_change() {
        // A resync can redistribute counts while keeping the same total.
        let mut delta = Delta::default();
        delta.note_added(ConversationId(1));
        delta.note_removed(ConversationId(2));
        assert!(delta.is_significant());
    }

    #[test]
    fn edits_alone_are_changes_but_not_significant() {
        let mut delta = Delta::default();
        delta.note_edited(ConversationId(1));
        assert!(!delta.is_significant());
        assert!(delta.has_changes());
    }

    #[test]
    fn note_helpers_deduplicate() {
        let mut delta = Delta::default();
        delta.note_added(ConversationId(1));
        delta.note_added(ConversationId(1));
        assert_eq!(delta.added_conversations.len(), 1);
    }

    #[test]
    fn event_names_render_for_logging() {
        let event = NormalizedEvent::ReadMany {
            inbox_pointers: vec![],
        };
        assert_eq!(event.to_string(), "read_many");
    }

    #[test]
    fn events_round_trip_through_serde() {
        let event = NormalizedEvent::ReadUpTo {
            conversation_id: ConversationId(10),
            max_message_id: Some(MessageId(5)),
            max_timestamp: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: NormalizedEvent = serde_json::from_str(&json).unwrap();
        match back {
            NormalizedEvent::ReadUpTo {
                conversation_id,
                max_message_id,
                max_timestamp,
            } => {
                assert_eq!(conversation_id, ConversationId(10));
                assert_eq!(max_message_id, Some(MessageId(5)));
                assert_eq!(max_timestamp, None);
            }
            other => panic!("unexpected event: {other}"),
        }
    }
}
