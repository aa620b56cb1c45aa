// SPDX-FileCopyrightText: 2026 Belfry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The unread state store: the authoritative in-memory model of every
//! message still counted as unread, mirrored by per-conversation entries
//! and running totals.
//!
//! The store is pure bookkeeping. It is mutated only by the
//! reconciliation engine, which itself runs on the single dispatcher
//! worker, so no interior locking is needed. Invariants maintained here:
//!
//! - `total_unread == Σ entry.count` over all entries
//! - an entry exists iff its count is nonzero
//! - every pending message is indexed by exactly one entry (the entry of
//!   its `origin_conversation_id`), and `entry.count >= indexed messages`
//!   (a server-reported count can exceed the messages we actually hold)

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use serde::Serialize;

use belfry_core::message::PendingMessage;
use belfry_core::types::{AccountId, ClientTagId, ConversationId, ConversationKind, MessageId};

/// Unread bookkeeping for one conversation.
///
/// Lives in the store only while its count is nonzero. The index holds
/// the store-internal sequence numbers of the pending messages counted
/// against this conversation, in insertion order (ascending = oldest
/// first).
#[derive(Debug, Clone)]
pub struct ConversationUnreadEntry {
    conversation_id: ConversationId,
    count: u32,
    override_mention_count: u32,
    kind: Option<ConversationKind>,
    label: Option<String>,
    index: BTreeSet<u64>,
}

impl ConversationUnreadEntry {
    fn new(conversation_id: ConversationId) -> Self {
        Self {
            conversation_id,
            count: 0,
            override_mention_count: 0,
            kind: None,
            label: None,
            index: BTreeSet::new(),
        }
    }

    pub fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Mention-driven alerts counted against a different origin
    /// conversation but physically living here. A muted conversation
    /// with a nonzero override still surfaces, showing this count.
    pub fn override_mention_count(&self) -> u32 {
        self.override_mention_count
    }

    /// `None` when the entry was created from a server count alone and
    /// no pending message has revealed the conversation kind yet.
    pub fn kind(&self) -> Option<ConversationKind> {
        self.kind
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Number of pending messages actually held for this conversation.
    /// Never exceeds `count`.
    pub fn pending_len(&self) -> usize {
        self.index.len()
    }
}

/// Outcome of inserting one pending message.
pub(crate) struct InsertOutcome {
    pub seq: u64,
    /// The insert created the conversation's entry (count went 0 -> 1).
    pub created_entry: bool,
}

/// Outcome of removing one pending message.
pub(crate) struct RemovedPending {
    pub message: PendingMessage,
    /// The removal emptied the conversation's entry (count hit 0).
    pub entry_removed: bool,
}

/// The full unread state for one account.
///
/// Messages are keyed internally by a monotonically increasing sequence
/// number; `order` keeps them newest-first. Two secondary maps support
/// the transport-facing identities: `(conversation, message id)` for
/// acknowledged messages and the client tag for pre-ack dedupe.
#[derive(Debug, Default)]
pub struct UnreadStore {
    next_seq: u64,
    /// Sequence numbers, front = newest. Strictly descending.
    order: VecDeque<u64>,
    messages: HashMap<u64, PendingMessage>,
    by_id: HashMap<(ConversationId, MessageId), u64>,
    by_tag: HashMap<ClientTagId, u64>,
    entries: HashMap<ConversationId, ConversationUnreadEntry>,
    total_unread: u32,
    personal_count: u32,
}

impl UnreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_unread(&self) -> u32 {
        self.total_unread
    }

    /// Number of pending messages with `is_personal`.
    pub fn personal_count(&self) -> u32 {
        self.personal_count
    }

    pub fn conversation_count(&self, conversation: ConversationId) -> u32 {
        self.entries.get(&conversation).map_or(0, |e| e.count)
    }

    pub fn entry(&self, conversation: ConversationId) -> Option<&ConversationUnreadEntry> {
        self.entries.get(&conversation)
    }

    pub fn entries(&self) -> impl Iterator<Item = &ConversationUnreadEntry> {
        self.entries.values()
    }

    /// Number of conversations with a nonzero count.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total pending messages held, across all conversations.
    pub fn pending_len(&self) -> usize {
        self.messages.len()
    }

    /// All pending messages, newest first.
    pub fn newest_first(&self) -> impl Iterator<Item = &PendingMessage> {
        self.order.iter().filter_map(|seq| self.messages.get(seq))
    }

    /// Pending messages counted against one conversation, newest first.
    pub fn conversation_pending_newest_first(
        &self,
        conversation: ConversationId,
    ) -> impl Iterator<Item = &PendingMessage> {
        self.entries
            .get(&conversation)
            .into_iter()
            .flat_map(|e| e.index.iter().rev())
            .filter_map(|seq| self.messages.get(seq))
    }

    pub(crate) fn find_by_id(
        &self,
        conversation: ConversationId,
        message_id: MessageId,
    ) -> Option<u64> {
        self.by_id.get(&(conversation, message_id)).copied()
    }

    pub(crate) fn find_by_tag(&self, tag: ClientTagId) -> Option<u64> {
        self.by_tag.get(&tag).copied()
    }

    pub(crate) fn message(&self, seq: u64) -> Option<&PendingMessage> {
        self.messages.get(&seq)
    }

    /// Mutable access for in-place content edits. Identity fields must
    /// not change through this; use [`UnreadStore::adopt_server_id`] for
    /// id adoption so the secondary indexes stay in sync.
    pub(crate) fn message_mut(&mut self, seq: u64) -> Option<&mut PendingMessage> {
        self.messages.get_mut(&seq)
    }

    /// Record the server-assigned id of a previously client-tagged
    /// message and index it under its new identity. The tag index is
    /// kept so a re-push of the same tag still deduplicates.
    pub(crate) fn adopt_server_id(&mut self, seq: u64, message_id: MessageId) {
        if !message_id.is_assigned() {
            return;
        }
        if let Some(message) = self.messages.get_mut(&seq)
            && !message.message_id.is_assigned()
        {
            message.adopt_server_id(message_id);
            self.by_id.insert((message.conversation_id, message_id), seq);
        }
    }

    /// Insert a new pending message, counting it against its origin
    /// conversation and creating that entry if needed.
    pub(crate) fn insert_pending(&mut self, message: PendingMessage) -> InsertOutcome {
        let seq = self.next_seq;
        self.next_seq += 1;

        if message.message_id.is_assigned() {
            self.by_id
                .insert((message.conversation_id, message.message_id), seq);
        }
        if message.client_tag_id.is_present() {
            self.by_tag.insert(message.client_tag_id, seq);
        }
        if message.is_personal {
            self.personal_count += 1;
        }
        self.total_unread = self.total_unread.saturating_add(1);

        let origin = message.origin_conversation_id;
        let mut created_entry = false;
        let entry = self.entries.entry(origin).or_insert_with(|| {
            created_entry = true;
            ConversationUnreadEntry::new(origin)
        });
        entry.count = entry.count.saturating_add(1);
        entry.index.insert(seq);
        // Kind and label describe the entry's own conversation, so only
        // messages physically living there may teach them.
        if message.conversation_id == origin {
            if entry.kind.is_none() {
                entry.kind = Some(message.kind);
            }
            if entry.label.is_none() && message.conversation_label.is_some() {
                entry.label = message.conversation_label.clone();
            }
        }

        self.order.push_front(seq);
        self.messages.insert(seq, message);
        InsertOutcome { seq, created_entry }
    }

    /// Increment the override mention counter on a conversation's entry.
    /// A mention cannot leave a marker on a conversation that has no
    /// entry of its own; returns whether the increment landed.
    pub(crate) fn bump_override(&mut self, conversation: ConversationId) -> bool {
        if let Some(entry) = self.entries.get_mut(&conversation) {
            entry.override_mention_count = entry.override_mention_count.saturating_add(1);
            true
        } else {
            false
        }
    }

    /// Remove one pending message, unwinding every index and count it
    /// touched. Returns `None` if the sequence is unknown (already
    /// removed), which makes bulk removals naturally idempotent.
    pub(crate) fn remove_seq(&mut self, seq: u64) -> Option<RemovedPending> {
        let message = self.messages.remove(&seq)?;

        // `order` is strictly descending, so the position is found by a
        // reversed binary search.
        if let Ok(pos) = self.order.binary_search_by(|probe| probe.cmp(&seq).reverse()) {
            self.order.remove(pos);
        }
        if message.message_id.is_assigned() {
            self.by_id
                .remove(&(message.conversation_id, message.message_id));
        }
        if message.client_tag_id.is_present() {
            self.by_tag.remove(&message.client_tag_id);
        }
        if message.is_personal {
            self.personal_count = self.personal_count.saturating_sub(1);
        }
        self.total_unread = self.total_unread.saturating_sub(1);

        let origin = message.origin_conversation_id;
        let mut entry_removed = false;
        if let Some(entry) = self.entries.get_mut(&origin) {
            entry.index.remove(&seq);
            entry.count = entry.count.saturating_sub(1);
            entry_removed = entry.count == 0;
        }
        if entry_removed {
            // The override counter dies with the entry.
            self.entries.remove(&origin);
        }
        if message.is_attributed_elsewhere()
            && let Some(home) = self.entries.get_mut(&message.conversation_id)
        {
            home.override_mention_count = home.override_mention_count.saturating_sub(1);
        }

        Some(RemovedPending {
            message,
            entry_removed,
        })
    }

    /// Raise one conversation's count to at least `count`, creating the
    /// entry if needed. Used by the resync rebuild, where server counts
    /// are authoritative but may exceed the pending messages we hold.
    /// Never lowers a count below the attached messages.
    pub(crate) fn raise_count_to(&mut self, conversation: ConversationId, count: u32) -> bool {
        if count == 0 && !self.entries.contains_key(&conversation) {
            return false;
        }
        let mut created = false;
        let entry = self.entries.entry(conversation).or_insert_with(|| {
            created = true;
            ConversationUnreadEntry::new(conversation)
        });
        if entry.count < count {
            self.total_unread = self.total_unread.saturating_add(count - entry.count);
            entry.count = count;
        }
        created
    }

    /// Recompute every entry's override mention counter from the
    /// messages actually held. Used after a resync rebuild, where the
    /// insertion order of snapshot messages must not matter.
    pub(crate) fn rebuild_override_counts(&mut self) {
        for entry in self.entries.values_mut() {
            entry.override_mention_count = 0;
        }
        let homes: Vec<ConversationId> = self
            .messages
            .values()
            .filter(|m| m.is_attributed_elsewhere())
            .map(|m| m.conversation_id)
            .collect();
        for conversation in homes {
            if let Some(entry) = self.entries.get_mut(&conversation) {
                entry.override_mention_count += 1;
            }
        }
    }

    /// Sequence numbers of all pending messages matching a predicate,
    /// newest first.
    pub(crate) fn seqs_where(&self, mut pred: impl FnMut(&PendingMessage) -> bool) -> Vec<u64> {
        self.order
            .iter()
            .copied()
            .filter(|seq| self.messages.get(seq).is_some_and(&mut pred))
            .collect()
    }

    /// Sequence numbers counted against one conversation, oldest first.
    pub(crate) fn conversation_seqs(&self, conversation: ConversationId) -> Vec<u64> {
        self.entries
            .get(&conversation)
            .map(|e| e.index.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Drop all state. Sequence numbers keep counting up so stale seqs
    /// from before the clear can never alias new messages.
    pub(crate) fn clear(&mut self) {
        self.order.clear();
        self.messages.clear();
        self.by_id.clear();
        self.by_tag.clear();
        self.entries.clear();
        self.total_unread = 0;
        self.personal_count = 0;
    }

    /// Immutable snapshot published to readers outside the worker.
    pub fn snapshot(&self, account: AccountId) -> EngineSnapshot {
        EngineSnapshot {
            account,
            total_unread: self.total_unread,
            personal_count: self.personal_count,
            conversations: self
                .entries
                .iter()
                .map(|(id, entry)| (*id, entry.count))
                .collect(),
        }
    }

    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let sum: u32 = self.entries.values().map(|e| e.count).sum();
        assert_eq!(self.total_unread, sum, "total must equal the entry sum");

        assert_eq!(self.order.len(), self.messages.len());
        let mut indexed = 0usize;
        for entry in self.entries.values() {
            assert!(entry.count > 0, "zero-count entries must be removed");
            assert!(
                entry.count as usize >= entry.index.len(),
                "count below held messages for {}",
                entry.conversation_id
            );
            for seq in &entry.index {
                let message = self.messages.get(seq).expect("index points at a message");
                assert_eq!(message.origin_conversation_id, entry.conversation_id);
            }
            indexed += entry.index.len();
        }
        assert_eq!(indexed, self.messages.len(), "every message has one home");

        let personal = self.messages.values().filter(|m| m.is_personal).count();
        assert_eq!(self.personal_count as usize, personal);

        for (&(conversation, message_id), seq) in &self.by_id {
            let message = self.messages.get(seq).expect("by_id points at a message");
            assert_eq!(message.conversation_id, conversation);
            assert_eq!(message.message_id, message_id);
        }
        for (&tag, seq) in &self.by_tag {
            let message = self.messages.get(seq).expect("by_tag points at a message");
            assert_eq!(message.client_tag_id, tag);
        }
    }
}

/// Immutable view of the store published after every processed event.
///
/// Reads from outside the worker (badge values, per-conversation counts)
/// are answered from the latest snapshot, never from live state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub account: AccountId,
    pub total_unread: u32,
    pub personal_count: u32,
    /// Nonzero unread counts per conversation.
    pub conversations: BTreeMap<ConversationId, u32>,
}

impl EngineSnapshot {
    pub fn empty(account: AccountId) -> Self {
        Self {
            account,
            total_unread: 0,
            personal_count: 0,
            conversations: BTreeMap::new(),
        }
    }

    pub fn conversation_count(&self, conversation: ConversationId) -> u32 {
        self.conversations.get(&conversation).copied().unwrap_or(0)
    }
}
