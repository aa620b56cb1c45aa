// SPDX-FileCopyrightText: 2026 Belfry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock settings store for deterministic testing.
//!
//! `MockSettings` implements `SettingsStore` over in-memory maps, with
//! chainable setup, runtime mutation, and failure injection.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use belfry_core::traits::settings::{
    ConversationSettings, KindSettings, SettingsError, SettingsStore, ThrottleLimits,
};
use belfry_core::types::{ConversationId, ConversationKind};

/// An in-memory settings store for testing.
///
/// Unconfigured conversations and kinds answer with defaults, matching
/// a fresh install. `set_failing(true)` makes every read return
/// `SettingsError::Unavailable`, which the engine downgrades to
/// defaults.
#[derive(Default)]
pub struct MockSettings {
    conversations: Mutex<HashMap<ConversationId, ConversationSettings>>,
    kinds: Mutex<HashMap<ConversationKind, KindSettings>>,
    failing: AtomicBool,
}

impl MockSettings {
    /// Create a mock store where everything is at defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace one conversation's settings.
    pub fn with_conversation(
        self,
        conversation: ConversationId,
        settings: ConversationSettings,
    ) -> Self {
        self.set_conversation(conversation, settings);
        self
    }

    /// Replace one kind's defaults.
    pub fn with_kind(self, kind: ConversationKind, settings: KindSettings) -> Self {
        self.kinds.lock().unwrap().insert(kind, settings);
        self
    }

    /// Mute one conversation until the given unix timestamp.
    pub fn muted(self, conversation: ConversationId, until: i64) -> Self {
        self.set_mute(conversation, Some(until));
        self
    }

    /// Set a per-conversation throttle override.
    pub fn with_throttle(self, conversation: ConversationId, limits: ThrottleLimits) -> Self {
        self.conversations
            .lock()
            .unwrap()
            .entry(conversation)
            .or_default()
            .throttle = Some(limits);
        self
    }

    /// Replace one conversation's settings at runtime.
    pub fn set_conversation(&self, conversation: ConversationId, settings: ConversationSettings) {
        self.conversations
            .lock()
            .unwrap()
            .insert(conversation, settings);
    }

    /// Change one conversation's mute bound at runtime. `None` unmutes.
    pub fn set_mute(&self, conversation: ConversationId, until: Option<i64>) {
        self.conversations
            .lock()
            .unwrap()
            .entry(conversation)
            .or_default()
            .mute_until = until;
    }

    /// Make every read fail (or succeed again) from now on.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), SettingsError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(SettingsError::Unavailable("injected failure".into()))
        } else {
            Ok(())
        }
    }
}

impl SettingsStore for MockSettings {
    fn conversation_settings(
        &self,
        conversation: ConversationId,
    ) -> Result<ConversationSettings, SettingsError> {
        self.check_available()?;
        Ok(self
            .conversations
            .lock()
            .unwrap()
            .get(&conversation)
            .cloned()
            .unwrap_or_default())
    }

    fn kind_defaults(&self, kind: ConversationKind) -> Result<KindSettings, SettingsError> {
        self.check_available()?;
        Ok(self
            .kinds
            .lock()
            .unwrap()
            .get(&kind)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_reads_answer_defaults() {
        let settings = MockSettings::new();
        let conversation = settings
            .conversation_settings(ConversationId(1))
            .expect("fresh store reads succeed");
        assert_eq!(conversation, ConversationSettings::default());
        let kind = settings
            .kind_defaults(ConversationKind::Group)
            .expect("fresh store reads succeed");
        assert!(kind.preview_enabled);
    }

    #[test]
    fn chained_setup_is_visible_to_reads() {
        let settings = MockSettings::new()
            .muted(ConversationId(7), i64::MAX)
            .with_throttle(
                ConversationId(7),
                ThrottleLimits {
                    max_alerts_per_window: 1,
                    window_seconds: 60,
                },
            );
        let read = settings
            .conversation_settings(ConversationId(7))
            .expect("configured store reads succeed");
        assert!(read.is_muted_at(1_000));
        assert_eq!(
            read.throttle,
            Some(ThrottleLimits {
                max_alerts_per_window: 1,
                window_seconds: 60,
            })
        );
    }

    #[test]
    fn failure_injection_flips_both_ways() {
        let settings = MockSettings::new();
        settings.set_failing(true);
        assert!(settings.conversation_settings(ConversationId(1)).is_err());
        assert!(settings.kind_defaults(ConversationKind::Private).is_err());
        settings.set_failing(false);
        assert!(settings.conversation_settings(ConversationId(1)).is_ok());
    }

    #[test]
    fn runtime_mute_updates_an_existing_entry() {
        let settings = MockSettings::new().muted(ConversationId(3), i64::MAX);
        settings.set_mute(ConversationId(3), None);
        let read = settings
            .conversation_settings(ConversationId(3))
            .expect("read succeeds");
        assert!(!read.is_muted_at(0));
    }
}
