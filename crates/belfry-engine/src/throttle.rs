// SPDX-FileCopyrightText: 2026 Belfry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-conversation alert throttle ("smart notifications"): at most N
//! audible alerts per conversation per rolling window.
//!
//! Suppression gates only the sound; counts and badges move regardless.
//! Records live purely in memory. They are lost on restart, which the
//! recovery design requires: after a resync nothing remembers old alert
//! times, so the first post-restart alert is always allowed.

use std::collections::{HashMap, VecDeque};

use strum::Display;

use belfry_core::traits::settings::ThrottleLimits;
use belfry_core::types::ConversationId;

/// Outcome of one authorization request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ThrottleDecision {
    Allowed,
    Suppressed,
}

impl ThrottleDecision {
    pub fn is_allowed(self) -> bool {
        self == ThrottleDecision::Allowed
    }
}

/// The rolling-window rate limiter. One record per conversation holding
/// the timestamps of its recent authorized alerts, created lazily on
/// the first authorization.
#[derive(Debug, Default)]
pub struct AlertThrottle {
    defaults: ThrottleLimits,
    records: HashMap<ConversationId, VecDeque<i64>>,
}

impl AlertThrottle {
    pub fn new(defaults: ThrottleLimits) -> Self {
        Self {
            defaults,
            records: HashMap::new(),
        }
    }

    /// Decide whether a visible alert may fire for this conversation at
    /// `now` (unix seconds). `limits` is the per-conversation settings
    /// override; `None` uses the configured defaults.
    ///
    /// If the oldest remembered alert has aged out, the window rolled
    /// over: the record resets to just this alert and it is allowed.
    /// Otherwise the alert is allowed while the record has room.
    pub fn authorize(
        &mut self,
        conversation: ConversationId,
        limits: Option<ThrottleLimits>,
        now: i64,
    ) -> ThrottleDecision {
        let limits = limits.unwrap_or(self.defaults);
        if limits.max_alerts_per_window == 0 {
            self.records.remove(&conversation);
            return ThrottleDecision::Allowed;
        }

        let record = self.records.entry(conversation).or_default();
        if let Some(&oldest) = record.front()
            && now - oldest >= limits.window_seconds
        {
            record.clear();
        }
        if (record.len() as u32) < limits.max_alerts_per_window {
            record.push_back(now);
            ThrottleDecision::Allowed
        } else {
            ThrottleDecision::Suppressed
        }
    }

    /// Drop the record for a conversation whose entry left the store.
    pub fn forget(&mut self, conversation: ConversationId) {
        self.records.remove(&conversation);
    }

    /// Keep only records whose conversation still satisfies `keep`.
    /// Used after a full resync replaces the set of live entries.
    pub fn retain(&mut self, mut keep: impl FnMut(ConversationId) -> bool) {
        self.records.retain(|conversation, _| keep(*conversation));
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.records.len()
    }
}
