// SPDX-FileCopyrightText: 2026 Belfry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raw transport messages and the pending-message representation the
//! engine keeps for every message still counted as unread.

use std::fmt;
use std::sync::Arc;
use std::sync::OnceLock;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::types::{ClientTagId, ConversationId, ConversationKind, MessageId};

/// Lazily rendered, memoized summary text for one message.
///
/// Rendering message text can be expensive (entity parsing, media
/// captions), so the transport hands us a closure and we render at most
/// once, the first time a delivery plan actually needs the text.
/// Serialization forces a render; deserialization yields a pre-rendered
/// preview, which is what scenario files and tests want.
#[derive(Clone)]
pub struct MessagePreview {
    provider: Arc<dyn Fn() -> String + Send + Sync>,
    rendered: OnceLock<String>,
}

impl MessagePreview {
    /// A preview that renders on first use.
    pub fn deferred(provider: impl Fn() -> String + Send + Sync + 'static) -> Self {
        Self {
            provider: Arc::new(provider),
            rendered: OnceLock::new(),
        }
    }

    /// A preview whose text is already known.
    pub fn from_text(text: impl Into<String>) -> Self {
        let rendered = OnceLock::new();
        let _ = rendered.set(text.into());
        Self {
            provider: Arc::new(String::new),
            rendered,
        }
    }

    /// The summary text, rendering it now if it never was.
    pub fn text(&self) -> &str {
        self.rendered.get_or_init(|| (self.provider)())
    }

    /// Whether the text has been rendered yet.
    pub fn is_rendered(&self) -> bool {
        self.rendered.get().is_some()
    }
}

impl fmt::Debug for MessagePreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rendered.get() {
            Some(text) => write!(f, "MessagePreview({text:?})"),
            None => write!(f, "MessagePreview(<unrendered>)"),
        }
    }
}

impl Serialize for MessagePreview {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.text())
    }
}

impl<'de> Deserialize<'de> for MessagePreview {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Self::from_text(text))
    }
}

impl Default for MessagePreview {
    fn default() -> Self {
        Self::from_text("")
    }
}

/// One message as delivered by the transport, before normalization.
///
/// The transport guarantees at-least-once delivery, so the same message
/// can arrive several times (and as both a client-tagged local push and
/// a server-acknowledged copy). Deduplication is the engine's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    pub conversation_id: ConversationId,
    /// Zero until the server acknowledges the message.
    #[serde(default)]
    pub message_id: MessageId,
    /// Zero when no client tag was attached.
    #[serde(default)]
    pub client_tag_id: ClientTagId,
    pub sender_id: i64,
    /// Unix seconds.
    pub timestamp: i64,
    pub kind: ConversationKind,
    /// Display name for the conversation, when the transport knows it.
    #[serde(default)]
    pub conversation_label: Option<String>,
    #[serde(default)]
    pub is_mention: bool,
    /// For a mention inside a thread the user did not open, the
    /// conversation the alert should be attributed to instead.
    #[serde(default)]
    pub mention_origin: Option<ConversationId>,
    #[serde(default)]
    pub is_silent: bool,
    #[serde(default)]
    pub is_service_event: bool,
    #[serde(default)]
    pub preview: MessagePreview,
}

impl RawMessage {
    /// A message with neither a server id nor a client tag cannot be
    /// deduplicated or removed later; it is dropped at intake.
    pub fn has_identity(&self) -> bool {
        self.message_id.is_assigned() || self.client_tag_id.is_present()
    }

    /// Whether the message counts toward the personal-message total:
    /// a real message in a 1:1 chat, not a service event.
    pub fn is_personal_message(&self) -> bool {
        self.kind == ConversationKind::Private && !self.is_service_event
    }
}

/// One message currently counted as unread/pending notification.
///
/// Identity is `(conversation_id, message_id)` once the server id is
/// assigned, `client_tag_id` before that. Created from a normalized
/// NewMessages event, edited in place, destroyed by read/delete events
/// or a full resync.
#[derive(Debug, Clone)]
pub struct PendingMessage {
    pub conversation_id: ConversationId,
    pub message_id: MessageId,
    pub client_tag_id: ClientTagId,
    pub timestamp: i64,
    pub kind: ConversationKind,
    pub conversation_label: Option<String>,
    pub mentions_self: bool,
    pub is_personal: bool,
    /// The conversation whose unread count this message increments.
    /// Differs from `conversation_id` for mentions attributed elsewhere.
    pub origin_conversation_id: ConversationId,
    pub silent: bool,
    pub preview: MessagePreview,
}

impl PendingMessage {
    /// Build a pending message from a raw one. Mention attribution: a
    /// mention carrying a distinct origin is counted against that origin
    /// conversation; everything else is counted where it lives.
    pub fn from_raw(raw: &RawMessage) -> Self {
        let origin = match raw.mention_origin {
            Some(origin) if raw.is_mention && origin != raw.conversation_id => origin,
            _ => raw.conversation_id,
        };
        Self {
            conversation_id: raw.conversation_id,
            message_id: raw.message_id,
            client_tag_id: raw.client_tag_id,
            timestamp: raw.timestamp,
            kind: raw.kind,
            conversation_label: raw.conversation_label.clone(),
            mentions_self: raw.is_mention,
            is_personal: raw.is_personal_message(),
            origin_conversation_id: origin,
            silent: raw.is_silent,
            preview: raw.preview.clone(),
        }
    }

    /// Whether this message is counted against a conversation other than
    /// the one it physically lives in.
    pub fn is_attributed_elsewhere(&self) -> bool {
        self.origin_conversation_id != self.conversation_id
    }

    /// Replace the message content in place. Identity and the counted
    /// classification (personal, mention attribution) never change here;
    /// counts are maintained by increments, not recomputed from content.
    pub fn apply_edit(&mut self, raw: &RawMessage) {
        self.preview = raw.preview.clone();
        self.silent = raw.is_silent;
        if raw.conversation_label.is_some() {
            self.conversation_label = raw.conversation_label.clone();
        }
    }

    /// Adopt the server-assigned id once a client-tagged message is
    /// acknowledged.
    pub fn adopt_server_id(&mut self, message_id: MessageId) {
        if message_id.is_assigned() {
            self.message_id = message_id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn raw(conversation: i64, message: i64) -> RawMessage {
        RawMessage {
            conversation_id: ConversationId(conversation),
            message_id: MessageId(message),
            client_tag_id: ClientTagId(0),
            sender_id: 7,
            timestamp: 1_000,
            kind: ConversationKind::Group,
            conversation_label: None,
            is_mention: false,
            mention_origin: None,
            is_silent: false,
            is_service_event: false,
            preview: MessagePreview::from_text("hello"),
        }
    }

    #[test]
    fn preview_renders_exactly_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let preview = MessagePreview::deferred(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            "rendered".to_string()
        });

        assert!(!preview.is_rendered());
        assert_eq!(preview.text(), "rendered");
        assert_eq!(preview.text(), "rendered");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn preview_serializes_as_plain_text() {
        let preview = MessagePreview::from_text("photo");
        let json = serde_json::to_string(&preview).unwrap();
        assert_eq!(json, "\"photo\"");

        let back: MessagePreview = serde_json::from_str("\"photo\"").unwrap();
        assert_eq!(back.text(), "photo");
        assert!(back.is_rendered());
    }

    #[test]
    fn identity_requires_some_id() {
        let mut m = raw(1, 0);
        assert!(!m.has_identity());
        m.client_tag_id = ClientTagId(99);
        assert!(m.has_identity());
        m.client_tag_id = ClientTagId(0);
        m.message_id = MessageId(5);
        assert!(m.has_identity());
    }

    #[test]
    fn personal_excludes_service_events_and_groups() {
        let mut m = raw(1, 1);
        assert!(!m.is_personal_message());
        m.kind = ConversationKind::Private;
        assert!(m.is_personal_message());
        m.is_service_event = true;
        assert!(!m.is_personal_message());
    }

    #[test]
    fn mention_attribution_goes_to_origin() {
        let mut m = raw(-100, 42);
        m.is_mention = true;
        m.mention_origin = Some(ConversationId(7));

        let pending = PendingMessage::from_raw(&m);
        assert_eq!(pending.conversation_id, ConversationId(-100));
        assert_eq!(pending.origin_conversation_id, ConversationId(7));
        assert!(pending.is_attributed_elsewhere());
    }

    #[test]
    fn mention_without_origin_stays_home() {
        let mut m = raw(-100, 42);
        m.is_mention = true;

        let pending = PendingMessage::from_raw(&m);
        assert_eq!(pending.origin_conversation_id, ConversationId(-100));
        assert!(!pending.is_attributed_elsewhere());
    }

    #[test]
    fn edit_replaces_content_but_not_classification() {
        let m = {
            let mut m = raw(1, 1);
            m.kind = ConversationKind::Private;
            m
        };
        let mut pending = PendingMessage::from_raw(&m);
        assert!(pending.is_personal);

        let mut edit = raw(1, 1);
        edit.preview = MessagePreview::from_text("edited");
        edit.is_silent = true;
        edit.is_service_event = true; // would flip is_personal if recomputed
        pending.apply_edit(&edit);

        assert_eq!(pending.preview.text(), "edited");
        assert!(pending.silent);
        assert!(pending.is_personal, "counts are increment-maintained");
    }

    #[test]
    fn adopt_server_id_ignores_zero() {
        let mut m = raw(1, 0);
        m.client_tag_id = ClientTagId(5);
        let mut pending = PendingMessage::from_raw(&m);

        pending.adopt_server_id(MessageId(0));
        assert_eq!(pending.message_id, MessageId(0));
        pending.adopt_server_id(MessageId(123));
        assert_eq!(pending.message_id, MessageId(123));
    }
}
