// SPDX-FileCopyrightText: 2026 Belfry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Settings store trait: synchronous reads of the user's notification
//! preferences. Writes happen through the host's own settings UI and
//! never through the engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::plan::AlertProfile;
use crate::types::{ConversationId, ConversationKind};

/// Default at most 2 alerts per conversation per rolling window.
pub const DEFAULT_MAX_ALERTS_PER_WINDOW: u32 = 2;
/// Default rolling window of 3 minutes.
pub const DEFAULT_WINDOW_SECONDS: i64 = 180;

/// Reading settings failed. The engine treats this as "use built-in
/// defaults", never as a reason to stop processing events.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings store unavailable: {0}")]
    Unavailable(String),
}

/// Alert-throttle limits ("smart notifications") for one conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleLimits {
    /// Alerts allowed per window; 0 disables throttling entirely.
    pub max_alerts_per_window: u32,
    pub window_seconds: i64,
}

impl Default for ThrottleLimits {
    fn default() -> Self {
        Self {
            max_alerts_per_window: DEFAULT_MAX_ALERTS_PER_WINDOW,
            window_seconds: DEFAULT_WINDOW_SECONDS,
        }
    }
}

/// Per-conversation overrides. Every field is optional; `None` falls
/// through to the per-kind defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationSettings {
    /// Muted until this unix timestamp. `i64::MAX` means muted forever.
    #[serde(default)]
    pub mute_until: Option<i64>,
    #[serde(default)]
    pub profile: Option<AlertProfile>,
    #[serde(default)]
    pub throttle: Option<ThrottleLimits>,
    #[serde(default)]
    pub preview_enabled: Option<bool>,
}

impl ConversationSettings {
    pub fn is_muted_at(&self, now: i64) -> bool {
        self.mute_until.is_some_and(|until| until > now)
    }
}

/// Defaults for one conversation kind (private / group / broadcast).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindSettings {
    #[serde(default)]
    pub mute_until: Option<i64>,
    pub profile: AlertProfile,
    pub preview_enabled: bool,
}

impl Default for KindSettings {
    fn default() -> Self {
        Self {
            mute_until: None,
            profile: AlertProfile::default(),
            preview_enabled: true,
        }
    }
}

impl KindSettings {
    pub fn is_muted_at(&self, now: i64) -> bool {
        self.mute_until.is_some_and(|until| until > now)
    }
}

/// Synchronous settings reads consulted while planning deliveries.
///
/// Implementations are expected to be cheap (an in-memory map or a
/// preferences cache); the engine calls these on its worker and an
/// error is downgraded to defaults, never propagated.
pub trait SettingsStore: Send + Sync {
    fn conversation_settings(
        &self,
        conversation: ConversationId,
    ) -> Result<ConversationSettings, SettingsError>;

    fn kind_defaults(&self, kind: ConversationKind) -> Result<KindSettings, SettingsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mute_until_is_exclusive_at_the_boundary() {
        let settings = ConversationSettings {
            mute_until: Some(100),
            ..Default::default()
        };
        assert!(settings.is_muted_at(99));
        assert!(!settings.is_muted_at(100));
        assert!(!settings.is_muted_at(101));
    }

    #[test]
    fn forever_mute() {
        let settings = ConversationSettings {
            mute_until: Some(i64::MAX),
            ..Default::default()
        };
        assert!(settings.is_muted_at(i64::MAX - 1));
    }

    #[test]
    fn default_throttle_limits_match_constants() {
        let limits = ThrottleLimits::default();
        assert_eq!(limits.max_alerts_per_window, 2);
        assert_eq!(limits.window_seconds, 180);
    }

    #[test]
    fn kind_defaults_enable_previews() {
        let defaults = KindSettings::default();
        assert!(defaults.preview_enabled);
        assert!(defaults.mute_until.is_none());
    }
}
