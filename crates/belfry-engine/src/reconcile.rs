// SPDX-FileCopyrightText: 2026 Belfry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The reconciliation engine: the single authority that mutates the
//! unread store.
//!
//! `apply` folds one normalized event into the store and reports what
//! changed. Events arrive at-least-once and in any order the transports
//! produce; every operation here is idempotent (a duplicate NewMessages
//! dedupes to an in-place edit, a duplicate removal finds nothing to
//! remove). Counts move only here; whether anything audible happens is
//! decided later, by the throttle and the planner.

use tracing::debug;

use belfry_core::event::{Delta, NormalizedEvent};
use belfry_core::message::{PendingMessage, RawMessage};
use belfry_core::traits::FocusSignal;
use belfry_core::types::{ConversationId, MessageId};

use crate::store::UnreadStore;

/// What one event application produced, beyond the store mutation.
#[derive(Debug, Default)]
pub struct ApplyOutcome {
    pub delta: Delta,
    /// Conversations made alert-worthy by this event: they gained a
    /// fresh pending message, or a mention marker when the message was
    /// attributed elsewhere. Candidates for an audible alert at the
    /// next alert flush, subject to the throttle.
    pub alerted: Vec<ConversationId>,
    /// Conversations whose new message was swallowed because the user
    /// had them open. The renderer gets an in-app chime instead.
    pub chimes: Vec<ConversationId>,
}

/// Apply one event to the store, in arrival order.
pub fn apply(
    store: &mut UnreadStore,
    focus: &dyn FocusSignal,
    event: &NormalizedEvent,
) -> ApplyOutcome {
    let mut outcome = ApplyOutcome::default();
    match event {
        NormalizedEvent::NewMessages { messages, .. } => {
            let focused = focus.focused_conversation();
            for raw in messages {
                apply_new_message(store, focused, raw, &mut outcome);
            }
        }
        NormalizedEvent::ReadUpTo {
            conversation_id,
            max_message_id,
            max_timestamp,
        } => {
            apply_read(
                store,
                *conversation_id,
                *max_message_id,
                *max_timestamp,
                &mut outcome.delta,
            );
        }
        NormalizedEvent::ReadMany { inbox_pointers } => {
            for pointer in inbox_pointers {
                apply_read(
                    store,
                    pointer.conversation_id,
                    pointer.max_message_id,
                    pointer.max_timestamp,
                    &mut outcome.delta,
                );
            }
        }
        NormalizedEvent::EditedMessages { per_conversation } => {
            for edits in per_conversation {
                for raw in &edits.messages {
                    apply_edit(store, edits.conversation_id, raw, &mut outcome.delta);
                }
            }
        }
        NormalizedEvent::DeletedMessages { per_conversation } => {
            for deletions in per_conversation {
                for message_id in &deletions.message_ids {
                    if let Some(seq) = store.find_by_id(deletions.conversation_id, *message_id) {
                        remove_one(store, seq, &mut outcome.delta);
                    }
                }
            }
        }
        NormalizedEvent::DeletedHistoryUpTo { per_conversation } => {
            for bound in per_conversation {
                // History truncation is physical: it hits every pending
                // message living in the conversation, regardless of which
                // entry it is counted under.
                let seqs = store.seqs_where(|m| {
                    m.conversation_id == bound.conversation_id
                        && m.message_id.is_assigned()
                        && m.message_id <= bound.up_to
                });
                for seq in seqs {
                    remove_one(store, seq, &mut outcome.delta);
                }
            }
        }
        NormalizedEvent::FullResync {
            per_conversation_counts,
            pending_snapshot,
        } => {
            apply_resync(store, per_conversation_counts, pending_snapshot, &mut outcome.delta);
        }
    }

    debug!(
        event = %event,
        total = store.total_unread(),
        significant = outcome.delta.is_significant(),
        "reconciled"
    );
    outcome
}

fn apply_new_message(
    store: &mut UnreadStore,
    focused: Option<ConversationId>,
    raw: &RawMessage,
    outcome: &mut ApplyOutcome,
) {
    // Dedupe first: an already-known message is an edit in place, never
    // a second increment.
    if raw.message_id.is_assigned()
        && let Some(seq) = store.find_by_id(raw.conversation_id, raw.message_id)
    {
        if let Some(message) = store.message_mut(seq) {
            message.apply_edit(raw);
            outcome.delta.note_edited(message.origin_conversation_id);
        }
        return;
    }
    if raw.client_tag_id.is_present()
        && let Some(seq) = store.find_by_tag(raw.client_tag_id)
    {
        // The server copy of a client-tagged push: adopt the assigned id
        // so later reads and deletes can find it, then refresh content.
        store.adopt_server_id(seq, raw.message_id);
        if let Some(message) = store.message_mut(seq) {
            message.apply_edit(raw);
            outcome.delta.note_edited(message.origin_conversation_id);
        }
        return;
    }

    if focused == Some(raw.conversation_id) {
        if !outcome.chimes.contains(&raw.conversation_id) {
            outcome.chimes.push(raw.conversation_id);
        }
        return;
    }

    let pending = PendingMessage::from_raw(raw);
    let home = pending.conversation_id;
    let origin = pending.origin_conversation_id;
    let attributed_elsewhere = pending.is_attributed_elsewhere();

    let inserted = store.insert_pending(pending);
    outcome.delta.changed_total = true;
    if inserted.created_entry {
        outcome.delta.note_added(origin);
    }
    if attributed_elsewhere && store.bump_override(home) {
        // The mention marker makes the home conversation alert-worthy
        // too, even when it is muted.
        if !outcome.alerted.contains(&home) {
            outcome.alerted.push(home);
        }
    }
    if !outcome.alerted.contains(&origin) {
        outcome.alerted.push(origin);
    }
}

/// Whether a read bound covers a pending message. An id bound can only
/// cover messages the server has acknowledged; a timestamp bound covers
/// anything old enough, acked or not.
fn read_covers(
    message: &PendingMessage,
    max_message_id: Option<MessageId>,
    max_timestamp: Option<i64>,
) -> bool {
    if let Some(max) = max_message_id
        && message.message_id.is_assigned()
        && message.message_id <= max
    {
        return true;
    }
    if let Some(max) = max_timestamp
        && message.timestamp <= max
    {
        return true;
    }
    false
}

fn apply_read(
    store: &mut UnreadStore,
    conversation: ConversationId,
    max_message_id: Option<MessageId>,
    max_timestamp: Option<i64>,
    delta: &mut Delta,
) {
    // Reads clear the unread state of the conversation they target, which
    // is the entry index: mentions counted here from other threads are
    // cleared by reading this conversation, not their home thread.
    for seq in store.conversation_seqs(conversation) {
        let covered = store
            .message(seq)
            .is_some_and(|m| read_covers(m, max_message_id, max_timestamp));
        if covered {
            remove_one(store, seq, delta);
        }
    }
}

fn apply_edit(
    store: &mut UnreadStore,
    conversation: ConversationId,
    raw: &RawMessage,
    delta: &mut Delta,
) {
    // Edits refresh content in place. An id the store never held is
    // invisible: an edit must not create an entry or move a count.
    if raw.message_id.is_assigned()
        && let Some(seq) = store.find_by_id(conversation, raw.message_id)
    {
        if let Some(message) = store.message_mut(seq) {
            message.apply_edit(raw);
            delta.note_edited(message.origin_conversation_id);
        }
    }
}

fn remove_one(store: &mut UnreadStore, seq: u64, delta: &mut Delta) {
    if let Some(removed) = store.remove_seq(seq) {
        delta.changed_total = true;
        if removed.entry_removed {
            delta.note_removed(removed.message.origin_conversation_id);
        }
    }
}

fn apply_resync(
    store: &mut UnreadStore,
    counts: &[belfry_core::event::ConversationCount],
    snapshot: &[RawMessage],
    delta: &mut Delta,
) {
    let before_total = store.total_unread();
    let before: Vec<ConversationId> = store.entries().map(|e| e.conversation_id()).collect();

    store.clear();

    // Attach the snapshot with the same dedupe as live arrivals, but no
    // focus skip: the snapshot is server truth, not a live delivery.
    for raw in snapshot {
        if raw.message_id.is_assigned()
            && let Some(seq) = store.find_by_id(raw.conversation_id, raw.message_id)
        {
            if let Some(message) = store.message_mut(seq) {
                message.apply_edit(raw);
            }
            continue;
        }
        if raw.client_tag_id.is_present()
            && let Some(seq) = store.find_by_tag(raw.client_tag_id)
        {
            store.adopt_server_id(seq, raw.message_id);
            if let Some(message) = store.message_mut(seq) {
                message.apply_edit(raw);
            }
            continue;
        }
        store.insert_pending(PendingMessage::from_raw(raw));
    }

    // Server counts are authoritative and may exceed the snapshot.
    for count in counts {
        store.raise_count_to(count.conversation_id, count.count);
    }
    store.rebuild_override_counts();

    for entry in store.entries() {
        if !before.contains(&entry.conversation_id()) {
            delta.note_added(entry.conversation_id());
        }
    }
    for conversation in before {
        if store.entry(conversation).is_none() {
            delta.note_removed(conversation);
        }
    }
    delta.changed_total = store.total_unread() != before_total;
}

#[cfg(test)]
mod tests {
    use super::*;
    use belfry_core::event::{
        ConversationCount, ConversationDeletions, ConversationEdits, HistoryBound, InboxPointer,
    };
    use belfry_core::message::MessagePreview;
    use belfry_core::traits::focus::Unfocused;
    use belfry_core::types::{ClientTagId, ConversationKind};

    struct FocusOn(ConversationId);

    impl FocusSignal for FocusOn {
        fn focused_conversation(&self) -> Option<ConversationId> {
            Some(self.0)
        }
    }

    fn raw(conversation: i64, message: i64) -> RawMessage {
        RawMessage {
            conversation_id: ConversationId(conversation),
            message_id: MessageId(message),
            client_tag_id: ClientTagId(0),
            sender_id: 7,
            timestamp: 1_000 + message,
            kind: ConversationKind::Group,
            conversation_label: None,
            is_mention: false,
            mention_origin: None,
            is_silent: false,
            is_service_event: false,
            preview: MessagePreview::from_text(format!("msg {message}")),
        }
    }

    fn new_messages(messages: Vec<RawMessage>) -> NormalizedEvent {
        NormalizedEvent::NewMessages {
            messages,
            is_final_of_batch: false,
        }
    }

    fn read_up_to(conversation: i64, max: i64) -> NormalizedEvent {
        NormalizedEvent::ReadUpTo {
            conversation_id: ConversationId(conversation),
            max_message_id: Some(MessageId(max)),
            max_timestamp: None,
        }
    }

    #[test]
    fn new_message_increments_and_alerts() {
        let mut store = UnreadStore::new();
        let outcome = apply(&mut store, &Unfocused, &new_messages(vec![raw(10, 1)]));

        assert_eq!(store.total_unread(), 1);
        assert!(outcome.delta.is_significant());
        assert_eq!(outcome.delta.added_conversations, vec![ConversationId(10)]);
        assert_eq!(outcome.alerted, vec![ConversationId(10)]);
        assert!(outcome.chimes.is_empty());
        store.assert_invariants();
    }

    #[test]
    fn duplicate_message_is_an_edit_not_an_increment() {
        let mut store = UnreadStore::new();
        apply(&mut store, &Unfocused, &new_messages(vec![raw(10, 5)]));

        let mut dup = raw(10, 5);
        dup.preview = MessagePreview::from_text("edited");
        let outcome = apply(&mut store, &Unfocused, &new_messages(vec![dup]));

        assert_eq!(store.total_unread(), 1);
        assert!(!outcome.delta.is_significant());
        assert!(outcome.delta.has_changes());
        assert!(outcome.alerted.is_empty());
        let seq = store.find_by_id(ConversationId(10), MessageId(5)).unwrap();
        assert_eq!(store.message(seq).unwrap().preview.text(), "edited");
        store.assert_invariants();
    }

    #[test]
    fn client_tagged_push_collapses_with_server_copy() {
        let mut store = UnreadStore::new();
        let mut push = raw(10, 0);
        push.client_tag_id = ClientTagId(900);
        apply(&mut store, &Unfocused, &new_messages(vec![push]));
        assert_eq!(store.total_unread(), 1);

        let mut acked = raw(10, 44);
        acked.client_tag_id = ClientTagId(900);
        let outcome = apply(&mut store, &Unfocused, &new_messages(vec![acked]));

        assert_eq!(store.total_unread(), 1, "same message, not a second one");
        assert!(!outcome.delta.is_significant());
        // The adopted id is now addressable for reads and deletes.
        assert!(store.find_by_id(ConversationId(10), MessageId(44)).is_some());
        store.assert_invariants();
    }

    #[test]
    fn focused_conversation_swallows_into_chime() {
        let mut store = UnreadStore::new();
        let focus = FocusOn(ConversationId(10));
        let outcome = apply(&mut store, &focus, &new_messages(vec![raw(10, 1), raw(20, 2)]));

        assert_eq!(store.total_unread(), 1, "only the unfocused one counts");
        assert_eq!(outcome.chimes, vec![ConversationId(10)]);
        assert_eq!(outcome.alerted, vec![ConversationId(20)]);
        store.assert_invariants();
    }

    #[test]
    fn read_up_to_removes_covered_messages() {
        let mut store = UnreadStore::new();
        apply(
            &mut store,
            &Unfocused,
            &new_messages(vec![raw(10, 1), raw(10, 2), raw(10, 3)]),
        );

        let outcome = apply(&mut store, &Unfocused, &read_up_to(10, 2));
        assert_eq!(store.total_unread(), 1);
        assert!(outcome.delta.changed_total);
        assert!(outcome.delta.removed_conversations.is_empty());

        let outcome = apply(&mut store, &Unfocused, &read_up_to(10, 3));
        assert_eq!(store.total_unread(), 0);
        assert_eq!(outcome.delta.removed_conversations, vec![ConversationId(10)]);
        store.assert_invariants();
    }

    #[test]
    fn read_is_monotonic() {
        let mut store = UnreadStore::new();
        apply(&mut store, &Unfocused, &new_messages(vec![raw(10, 5)]));
        apply(&mut store, &Unfocused, &read_up_to(10, 5));
        assert_eq!(store.total_unread(), 0);

        // A stale, lower bound afterwards changes nothing.
        let outcome = apply(&mut store, &Unfocused, &read_up_to(10, 4));
        assert!(!outcome.delta.has_changes());
        assert_eq!(store.total_unread(), 0);
        store.assert_invariants();
    }

    #[test]
    fn timestamp_bound_covers_unacked_messages() {
        let mut store = UnreadStore::new();
        let mut push = raw(10, 0);
        push.client_tag_id = ClientTagId(31);
        push.timestamp = 500;
        apply(&mut store, &Unfocused, &new_messages(vec![push]));

        // An id-only bound cannot touch a message with no id yet.
        let outcome = apply(&mut store, &Unfocused, &read_up_to(10, 1_000_000));
        assert!(!outcome.delta.has_changes());
        assert_eq!(store.total_unread(), 1);

        let outcome = apply(
            &mut store,
            &Unfocused,
            &NormalizedEvent::ReadUpTo {
                conversation_id: ConversationId(10),
                max_message_id: None,
                max_timestamp: Some(600),
            },
        );
        assert!(outcome.delta.changed_total);
        assert_eq!(store.total_unread(), 0);
        store.assert_invariants();
    }

    #[test]
    fn read_many_clears_several_conversations() {
        let mut store = UnreadStore::new();
        apply(
            &mut store,
            &Unfocused,
            &new_messages(vec![raw(10, 1), raw(20, 2), raw(30, 3)]),
        );

        let outcome = apply(
            &mut store,
            &Unfocused,
            &NormalizedEvent::ReadMany {
                inbox_pointers: vec![
                    InboxPointer {
                        conversation_id: ConversationId(10),
                        max_message_id: Some(MessageId(1)),
                        max_timestamp: None,
                    },
                    InboxPointer {
                        conversation_id: ConversationId(20),
                        max_message_id: Some(MessageId(2)),
                        max_timestamp: None,
                    },
                ],
            },
        );

        assert_eq!(store.total_unread(), 1);
        assert_eq!(outcome.delta.removed_conversations.len(), 2);
        store.assert_invariants();
    }

    #[test]
    fn edits_touch_only_pending_messages() {
        let mut store = UnreadStore::new();
        apply(&mut store, &Unfocused, &new_messages(vec![raw(10, 1)]));

        let mut edit = raw(10, 1);
        edit.preview = MessagePreview::from_text("fixed typo");
        let unknown = raw(10, 99);
        let outcome = apply(
            &mut store,
            &Unfocused,
            &NormalizedEvent::EditedMessages {
                per_conversation: vec![ConversationEdits {
                    conversation_id: ConversationId(10),
                    messages: vec![edit, unknown],
                }],
            },
        );

        assert_eq!(store.total_unread(), 1, "edits never create entries");
        assert!(!outcome.delta.is_significant());
        assert_eq!(outcome.delta.edited_conversations, vec![ConversationId(10)]);
        let seq = store.find_by_id(ConversationId(10), MessageId(1)).unwrap();
        assert_eq!(store.message(seq).unwrap().preview.text(), "fixed typo");
    }

    #[test]
    fn edit_of_unknown_message_changes_nothing() {
        let mut store = UnreadStore::new();
        let outcome = apply(
            &mut store,
            &Unfocused,
            &NormalizedEvent::EditedMessages {
                per_conversation: vec![ConversationEdits {
                    conversation_id: ConversationId(10),
                    messages: vec![raw(10, 99)],
                }],
            },
        );
        assert!(!outcome.delta.has_changes());
        assert!(store.is_empty());
    }

    #[test]
    fn edit_notes_the_attributed_conversation() {
        let mut store = UnreadStore::new();
        let mut mention = raw(-100, 3);
        mention.is_mention = true;
        mention.mention_origin = Some(ConversationId(7));
        apply(&mut store, &Unfocused, &new_messages(vec![mention]));

        // The edit event is grouped under the thread the message lives
        // in, but the card that needs refreshing belongs to the origin.
        let mut edit = raw(-100, 3);
        edit.preview = MessagePreview::from_text("reworded");
        let outcome = apply(
            &mut store,
            &Unfocused,
            &NormalizedEvent::EditedMessages {
                per_conversation: vec![ConversationEdits {
                    conversation_id: ConversationId(-100),
                    messages: vec![edit],
                }],
            },
        );

        assert_eq!(outcome.delta.edited_conversations, vec![ConversationId(7)]);
        let seq = store.find_by_id(ConversationId(-100), MessageId(3)).unwrap();
        assert_eq!(store.message(seq).unwrap().preview.text(), "reworded");
        store.assert_invariants();
    }

    #[test]
    fn delete_is_idempotent_with_prior_read() {
        let mut store = UnreadStore::new();
        apply(&mut store, &Unfocused, &new_messages(vec![raw(10, 1), raw(10, 2)]));
        apply(&mut store, &Unfocused, &read_up_to(10, 1));
        assert_eq!(store.total_unread(), 1);

        // Deleting the already-read id must not double-decrement.
        let outcome = apply(
            &mut store,
            &Unfocused,
            &NormalizedEvent::DeletedMessages {
                per_conversation: vec![ConversationDeletions {
                    conversation_id: ConversationId(10),
                    message_ids: vec![MessageId(1), MessageId(2)],
                }],
            },
        );

        assert_eq!(store.total_unread(), 0);
        assert_eq!(outcome.delta.removed_conversations, vec![ConversationId(10)]);
        store.assert_invariants();
    }

    #[test]
    fn history_truncation_is_physical() {
        let mut store = UnreadStore::new();
        // A mention living in -100 but counted against 7.
        let mut mention = raw(-100, 3);
        mention.is_mention = true;
        mention.mention_origin = Some(ConversationId(7));
        apply(
            &mut store,
            &Unfocused,
            &new_messages(vec![raw(-100, 1), mention, raw(-100, 8)]),
        );
        assert_eq!(store.conversation_count(ConversationId(7)), 1);

        let outcome = apply(
            &mut store,
            &Unfocused,
            &NormalizedEvent::DeletedHistoryUpTo {
                per_conversation: vec![HistoryBound {
                    conversation_id: ConversationId(-100),
                    up_to: MessageId(5),
                }],
            },
        );

        // Ids 1 and 3 are gone, including the mention counted elsewhere.
        assert_eq!(store.total_unread(), 1);
        assert_eq!(store.conversation_count(ConversationId(7)), 0);
        assert!(outcome.delta.removed_conversations.contains(&ConversationId(7)));
        store.assert_invariants();
    }

    #[test]
    fn mention_read_clears_origin_and_home_marker() {
        let mut store = UnreadStore::new();
        let mut mention = raw(-100, 3);
        mention.is_mention = true;
        mention.mention_origin = Some(ConversationId(7));
        let outcome = apply(&mut store, &Unfocused, &new_messages(vec![raw(-100, 1), mention]));

        assert_eq!(store.conversation_count(ConversationId(7)), 1);
        assert_eq!(
            store.entry(ConversationId(-100)).unwrap().override_mention_count(),
            1
        );
        // The mention rings its origin entry and its home thread.
        assert!(outcome.alerted.contains(&ConversationId(7)));
        assert!(outcome.alerted.contains(&ConversationId(-100)));

        // Reading the origin conversation clears the mention and the
        // marker it left on its home thread.
        let outcome = apply(&mut store, &Unfocused, &read_up_to(7, 1_000_000));
        assert_eq!(store.conversation_count(ConversationId(7)), 0);
        assert!(outcome.delta.removed_conversations.contains(&ConversationId(7)));
        assert_eq!(
            store.entry(ConversationId(-100)).unwrap().override_mention_count(),
            0
        );
        store.assert_invariants();
    }

    #[test]
    fn mention_without_home_entry_rings_only_origin() {
        let mut store = UnreadStore::new();
        let mut mention = raw(-100, 3);
        mention.is_mention = true;
        mention.mention_origin = Some(ConversationId(7));
        let outcome = apply(&mut store, &Unfocused, &new_messages(vec![mention]));

        // No entry for the home thread exists, so there is nothing to
        // mark; only the origin entry counts and rings.
        assert_eq!(outcome.alerted, vec![ConversationId(7)]);
        assert!(store.entry(ConversationId(-100)).is_none());
        assert_eq!(store.conversation_count(ConversationId(7)), 1);
        store.assert_invariants();
    }

    #[test]
    fn resync_replaces_state_wholesale() {
        let mut store = UnreadStore::new();
        apply(
            &mut store,
            &Unfocused,
            &new_messages(vec![raw(10, 1), raw(20, 2), raw(20, 3)]),
        );

        let outcome = apply(
            &mut store,
            &Unfocused,
            &NormalizedEvent::FullResync {
                per_conversation_counts: vec![ConversationCount {
                    conversation_id: ConversationId(20),
                    count: 5,
                }],
                pending_snapshot: vec![],
            },
        );

        assert_eq!(store.total_unread(), 5);
        assert_eq!(store.conversation_count(ConversationId(20)), 5);
        assert_eq!(store.conversation_count(ConversationId(10)), 0);
        assert!(outcome.delta.is_significant());
        assert!(outcome.delta.removed_conversations.contains(&ConversationId(10)));
        store.assert_invariants();
    }

    #[test]
    fn resync_snapshot_floors_server_counts() {
        let mut store = UnreadStore::new();
        let outcome = apply(
            &mut store,
            &Unfocused,
            &NormalizedEvent::FullResync {
                per_conversation_counts: vec![ConversationCount {
                    conversation_id: ConversationId(10),
                    count: 1,
                }],
                pending_snapshot: vec![raw(10, 1), raw(10, 2), raw(10, 1)],
            },
        );

        // Two distinct snapshot messages beat the stale server count of 1,
        // and the duplicate collapses.
        assert_eq!(store.total_unread(), 2);
        assert!(outcome.delta.changed_total);
        store.assert_invariants();
    }

    #[test]
    fn resync_rebuilds_mention_markers() {
        let mut store = UnreadStore::new();
        let mut mention = raw(-100, 3);
        mention.is_mention = true;
        mention.mention_origin = Some(ConversationId(7));
        apply(
            &mut store,
            &Unfocused,
            &NormalizedEvent::FullResync {
                per_conversation_counts: vec![ConversationCount {
                    conversation_id: ConversationId(-100),
                    count: 2,
                }],
                pending_snapshot: vec![raw(-100, 1), mention],
            },
        );

        assert_eq!(store.conversation_count(ConversationId(7)), 1);
        assert_eq!(
            store.entry(ConversationId(-100)).unwrap().override_mention_count(),
            1
        );
        store.assert_invariants();
    }

    #[test]
    fn resync_with_identical_state_is_quiet() {
        let mut store = UnreadStore::new();
        apply(&mut store, &Unfocused, &new_messages(vec![raw(10, 1)]));

        let outcome = apply(
            &mut store,
            &Unfocused,
            &NormalizedEvent::FullResync {
                per_conversation_counts: vec![ConversationCount {
                    conversation_id: ConversationId(10),
                    count: 1,
                }],
                pending_snapshot: vec![raw(10, 1)],
            },
        );
        assert!(!outcome.delta.is_significant());
        assert_eq!(store.total_unread(), 1);
    }

    #[test]
    fn focus_applies_per_message_not_per_batch() {
        let mut store = UnreadStore::new();
        let focus = FocusOn(ConversationId(10));
        // Duplicate of an existing pending still dedupes even when its
        // conversation is focused.
        apply(&mut store, &Unfocused, &new_messages(vec![raw(10, 1)]));
        let outcome = apply(&mut store, &focus, &new_messages(vec![raw(10, 1)]));
        assert_eq!(store.total_unread(), 1);
        assert!(outcome.chimes.is_empty(), "dedupe wins over focus");
    }
}
