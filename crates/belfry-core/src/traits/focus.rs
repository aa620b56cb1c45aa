// SPDX-FileCopyrightText: 2026 Belfry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Foreground/focus signal: which conversation, if any, the user is
//! looking at right now.

use crate::types::ConversationId;

/// Host-provided focus state, read synchronously on the engine worker.
///
/// A message arriving for the focused conversation is consumed silently
/// (it triggers the in-app chime instead of an alert and increments
/// nothing). `None` whenever the app is backgrounded, even if a chat
/// was left open.
pub trait FocusSignal: Send + Sync {
    fn focused_conversation(&self) -> Option<ConversationId>;
}

/// The no-focus signal: the app is always treated as backgrounded.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unfocused;

impl FocusSignal for Unfocused {
    fn focused_conversation(&self) -> Option<ConversationId> {
        None
    }
}
