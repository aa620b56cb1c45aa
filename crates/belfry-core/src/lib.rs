// SPDX-FileCopyrightText: 2026 Belfry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Belfry notification engine.
//!
//! This crate provides the value types flowing through the engine
//! (messages, events, deltas, delivery plans), the collaborator traits
//! hosts implement (settings, focus, renderer), and the shared error
//! type. It contains no engine logic and no async machinery beyond the
//! renderer trait definition.

pub mod error;
pub mod event;
pub mod message;
pub mod plan;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::BelfryError;
pub use event::{Delta, NormalizedEvent};
pub use message::{MessagePreview, PendingMessage, RawMessage};
pub use plan::{AlertProfile, DeliveryPlan, DismissalKey, NotificationDescriptor};
pub use types::{AccountId, ClientTagId, ConversationId, ConversationKind, MessageId};

// Re-export the collaborator traits at crate root.
pub use traits::{FocusSignal, NotificationRenderer, SettingsStore};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn belfry_error_has_all_variants() {
        // Verify all 6 error variants exist and can be constructed.
        let _config = BelfryError::Config("test".into());
        let _intake = BelfryError::Intake {
            message: "test".into(),
        };
        let _dispatch = BelfryError::Dispatch {
            message: "test".into(),
            source: None,
        };
        let _render = BelfryError::Render {
            message: "test".into(),
            source: Some(Box::new(std::io::Error::other("test"))),
        };
        let _timeout = BelfryError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = BelfryError::Internal("test".into());
    }

    #[test]
    fn error_messages_are_prefixed_by_domain() {
        let err = BelfryError::Render {
            message: "permission revoked".into(),
            source: None,
        };
        assert_eq!(err.to_string(), "render error: permission revoked");
    }

    #[test]
    fn all_trait_modules_are_exported() {
        // Compile-time check that every collaborator trait is reachable
        // through the public API.
        fn _assert_settings<T: SettingsStore>() {}
        fn _assert_focus<T: FocusSignal>() {}
        fn _assert_renderer<T: NotificationRenderer>() {}
    }

    #[test]
    fn unfocused_signal_reports_nothing() {
        use traits::focus::Unfocused;
        assert_eq!(Unfocused.focused_conversation(), None);
    }
}
