// SPDX-FileCopyrightText: 2026 Belfry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery plans: the engine's immutable output describing what alerts
//! should be shown, updated, or withdrawn. A plan is handed to the
//! external renderer and never mutated after construction.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::types::{AccountId, ConversationId};

/// Notification priority tier, resolved from settings precedence.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PriorityTier {
    /// Shown without heads-up or sound; used for quiet re-renders.
    Low,
    Default,
    High,
    Urgent,
}

/// Which sound an alert plays, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundSelection {
    None,
    Default,
    /// A user-chosen sound, identified by an opaque path or ringtone id.
    Custom(String),
}

/// Vibration behavior for an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VibrationPattern {
    Off,
    Default,
    Short,
    Long,
}

/// The full audible/visual selection for one descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertProfile {
    pub priority: PriorityTier,
    pub sound: SoundSelection,
    pub vibration: VibrationPattern,
    /// LED color as 0xRRGGBB, when the device supports one.
    #[serde(default)]
    pub led: Option<u32>,
}

impl Default for AlertProfile {
    fn default() -> Self {
        Self {
            priority: PriorityTier::Default,
            sound: SoundSelection::Default,
            vibration: VibrationPattern::Default,
            led: None,
        }
    }
}

impl AlertProfile {
    /// The profile used when an alert must update without making noise:
    /// muted conversations, throttled conversations, and re-renders of
    /// already-shown content.
    pub fn silent() -> Self {
        Self {
            priority: PriorityTier::Low,
            sound: SoundSelection::None,
            vibration: VibrationPattern::Off,
            led: None,
        }
    }

    /// Strip everything audible, keeping the visual identity (LED).
    pub fn silenced(&self) -> Self {
        Self {
            priority: PriorityTier::Low,
            sound: SoundSelection::None,
            vibration: VibrationPattern::Off,
            led: self.led,
        }
    }

    pub fn is_audible(&self) -> bool {
        self.sound != SoundSelection::None || self.vibration != VibrationPattern::Off
    }
}

/// Stable key attached to each rendered alert so an external dismissal
/// can be mapped back to its conversation (or to the summary).
///
/// Format: `belfry:<account>:<conversation>` or `belfry:<account>:summary`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DismissalKey(String);

/// What a dismissal key points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissalTarget {
    Summary,
    Conversation(ConversationId),
}

impl DismissalKey {
    pub fn conversation(account: AccountId, conversation: ConversationId) -> Self {
        Self(format!("belfry:{account}:{conversation}"))
    }

    pub fn summary(account: AccountId) -> Self {
        Self(format!("belfry:{account}:summary"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse a key back into its account and target. Returns `None` for
    /// keys this engine did not produce.
    pub fn parse(key: &str) -> Option<(AccountId, DismissalTarget)> {
        let rest = key.strip_prefix("belfry:")?;
        let (account, target) = rest.split_once(':')?;
        let account = AccountId(account.parse().ok()?);
        if target == "summary" {
            return Some((account, DismissalTarget::Summary));
        }
        let conversation = ConversationId(target.parse().ok()?);
        Some((account, DismissalTarget::Conversation(conversation)))
    }
}

impl fmt::Display for DismissalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One alert to show or update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationDescriptor {
    /// `None` for the aggregated summary descriptor.
    pub conversation: Option<ConversationId>,
    pub title: String,
    /// Preview lines, newest first. Empty when previews are disabled.
    pub body_lines: Vec<String>,
    /// The unread count this alert shows. For a muted conversation
    /// surfacing only because of mentions, this is the mention count.
    pub unread_count: u32,
    pub profile: AlertProfile,
    pub dismissal_key: DismissalKey,
    /// Unix seconds of the newest message covered, for OS-side ordering.
    pub timestamp: i64,
}

/// The engine's output for one flush: what to show, what to withdraw.
///
/// Each plan carries the complete desired notification surface, not a
/// diff: every card that should exist is in `per_conversation`, and a
/// `summary` of `None` means no summary should be showing. `to_cancel`
/// names the withdrawals explicitly so a renderer does not have to
/// remember what it rendered last time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeliveryPlan {
    pub account: AccountId,
    /// Aggregated descriptor, present when more than one conversation
    /// has pending messages.
    pub summary: Option<NotificationDescriptor>,
    /// Per-conversation descriptors, most recent conversation first.
    pub per_conversation: Vec<NotificationDescriptor>,
    /// Conversations whose previously shown alerts must be withdrawn.
    pub to_cancel: BTreeSet<ConversationId>,
}

impl DeliveryPlan {
    /// True when the plan neither shows nor withdraws anything.
    pub fn is_empty(&self) -> bool {
        self.summary.is_none() && self.per_conversation.is_empty() && self.to_cancel.is_empty()
    }

    /// Look up the descriptor for one conversation, if planned.
    pub fn descriptor_for(&self, conversation: ConversationId) -> Option<&NotificationDescriptor> {
        self.per_conversation
            .iter()
            .find(|d| d.conversation == Some(conversation))
    }
}
