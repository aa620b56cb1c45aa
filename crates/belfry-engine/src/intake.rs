// SPDX-FileCopyrightText: 2026 Belfry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event intake: the gate between transport-shaped updates and the
//! reconciliation engine.
//!
//! Transports are allowed to hand over whatever their wire format
//! produced. Intake drops the raw messages no engine stage can do
//! anything with (no server id and no client tag, so unmatchable for
//! later edits, reads, and dedupe) and passes everything else through
//! untouched.

use tracing::warn;

use belfry_core::event::NormalizedEvent;
use belfry_core::message::RawMessage;

/// Strip unusable messages out of an event before it reaches the
/// dispatcher. Events without message payloads pass through unchanged.
pub fn sanitize(event: NormalizedEvent) -> NormalizedEvent {
    match event {
        NormalizedEvent::NewMessages {
            messages,
            is_final_of_batch,
        } => NormalizedEvent::NewMessages {
            messages: keep_identified(messages),
            is_final_of_batch,
        },
        NormalizedEvent::FullResync {
            per_conversation_counts,
            pending_snapshot,
        } => NormalizedEvent::FullResync {
            per_conversation_counts,
            pending_snapshot: keep_identified(pending_snapshot),
        },
        other => other,
    }
}

fn keep_identified(messages: Vec<RawMessage>) -> Vec<RawMessage> {
    messages
        .into_iter()
        .filter(|message| {
            let usable = message.has_identity();
            if !usable {
                warn!(
                    conversation = %message.conversation_id,
                    timestamp = message.timestamp,
                    "dropping message without server id or client tag"
                );
            }
            usable
        })
        .collect()
}
