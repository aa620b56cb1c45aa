// SPDX-FileCopyrightText: 2026 Belfry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification renderer trait: the boundary to the OS alert subsystem.

use async_trait::async_trait;

use crate::error::BelfryError;
use crate::plan::DeliveryPlan;
use crate::types::ConversationId;

/// Turns delivery plans into OS-level alerts.
///
/// Invoked on the engine worker once per flushed significant delta. A
/// returned error discards that cycle's plan; unread state is untouched
/// and the next significant delta retries rendering, so implementations
/// should not retry internally.
#[async_trait]
pub trait NotificationRenderer: Send + Sync {
    async fn deliver(&self, plan: DeliveryPlan) -> Result<(), BelfryError>;

    /// Side-channel fired instead of an alert when a message arrives for
    /// the conversation the user is currently looking at. Fire-and-forget.
    fn in_app_chime(&self, _conversation: ConversationId) {}
}
