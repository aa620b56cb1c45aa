// SPDX-FileCopyrightText: 2026 Belfry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identifier newtypes and common enums used across the Belfry workspace.
//!
//! All ids are transport-assigned integers. `MessageId(0)` means "not yet
//! acknowledged by the server" and `ClientTagId(0)` means "no client tag";
//! both conventions come from the wire protocol, not from this crate.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifies one signed-in user account. Each account runs its own
/// fully independent engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub i32);

/// Identifies a chat thread (1:1, group, or broadcast channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationId(pub i64);

/// Server-assigned message identifier. Zero when the message has been
/// pushed to the client before the server acknowledged it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub i64);

/// Client-generated correlation id, used to match a locally-known message
/// against its later server copy. Zero when absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientTagId(pub i64);

impl MessageId {
    /// Whether the server has assigned this id yet.
    pub fn is_assigned(&self) -> bool {
        self.0 != 0
    }
}

impl ClientTagId {
    pub fn is_present(&self) -> bool {
        self.0 != 0
    }
}

// Zero is the wire convention for "absent", so it is also the Default.
impl Default for AccountId {
    fn default() -> Self {
        AccountId(0)
    }
}

impl Default for MessageId {
    fn default() -> Self {
        MessageId(0)
    }
}

impl Default for ClientTagId {
    fn default() -> Self {
        ClientTagId(0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of chat a conversation is. Drives which per-kind default
/// settings apply when a conversation has no explicit override.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConversationKind {
    /// 1:1 chat with another user.
    Private,
    /// Multi-user group chat.
    Group,
    /// One-to-many broadcast channel.
    Broadcast,
}
