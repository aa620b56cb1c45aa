// SPDX-FileCopyrightText: 2026 Belfry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event and message constructors shared by integration tests.
//!
//! Each helper fills in sensible defaults; tests override individual
//! fields with struct update syntax where a scenario needs more.

use belfry_core::event::{ConversationCount, InboxPointer, NormalizedEvent};
use belfry_core::message::{MessagePreview, RawMessage};
use belfry_core::types::{ClientTagId, ConversationId, ConversationKind, MessageId};

/// Timestamps count up from here so ids and times sort the same way.
pub const BASE_TIMESTAMP: i64 = 1_700_000_000;

/// A group-chat message with a server id and a short text preview.
pub fn raw_message(conversation: i64, message: i64) -> RawMessage {
    RawMessage {
        conversation_id: ConversationId(conversation),
        message_id: MessageId(message),
        client_tag_id: ClientTagId(0),
        sender_id: 40,
        timestamp: BASE_TIMESTAMP + message,
        kind: ConversationKind::Group,
        conversation_label: None,
        is_mention: false,
        mention_origin: None,
        is_silent: false,
        is_service_event: false,
        preview: MessagePreview::from_text(format!("message {message}")),
    }
}

/// A one-to-one message, which counts as personal.
pub fn personal_message(conversation: i64, message: i64) -> RawMessage {
    RawMessage {
        kind: ConversationKind::Private,
        ..raw_message(conversation, message)
    }
}

/// New messages on a non-final page: the coalescing delay applies.
pub fn new_messages(messages: Vec<RawMessage>) -> NormalizedEvent {
    NormalizedEvent::NewMessages {
        messages,
        is_final_of_batch: false,
    }
}

/// New messages on the final page of a batch: flushes immediately.
pub fn final_page(messages: Vec<RawMessage>) -> NormalizedEvent {
    NormalizedEvent::NewMessages {
        messages,
        is_final_of_batch: true,
    }
}

/// A read marker covering everything up to `max` in one conversation.
pub fn read_up_to(conversation: i64, max: i64) -> NormalizedEvent {
    NormalizedEvent::ReadUpTo {
        conversation_id: ConversationId(conversation),
        max_message_id: Some(MessageId(max)),
        max_timestamp: None,
    }
}

/// Read markers for several conversations at once.
pub fn read_many(pointers: &[(i64, i64)]) -> NormalizedEvent {
    NormalizedEvent::ReadMany {
        inbox_pointers: pointers
            .iter()
            .map(|&(conversation, max)| InboxPointer {
                conversation_id: ConversationId(conversation),
                max_message_id: Some(MessageId(max)),
                max_timestamp: None,
            })
            .collect(),
    }
}

/// A full resync carrying only server-side counts, no message bodies.
pub fn resync_counts(counts: &[(i64, u32)]) -> NormalizedEvent {
    NormalizedEvent::FullResync {
        per_conversation_counts: counts
            .iter()
            .map(|&(conversation, count)| ConversationCount {
                conversation_id: ConversationId(conversation),
                count,
            })
            .collect(),
        pending_snapshot: vec![],
    }
}
