// SPDX-FileCopyrightText: 2026 Belfry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end engine testing.
//!
//! `EngineHarness` spawns a real engine worker wired to the mock
//! settings store, focus signal, and recording renderer, and exposes
//! all of them for assertions.

use std::sync::Arc;
use std::sync::Mutex;

use belfry_config::BelfryConfig;
use belfry_core::error::BelfryError;
use belfry_core::event::NormalizedEvent;
use belfry_core::traits::FocusSignal;
use belfry_core::types::{AccountId, ConversationId};
use belfry_engine::{AccountEngine, EngineHandle};

use crate::mock_renderer::RecordingRenderer;
use crate::mock_settings::MockSettings;

/// A focus signal tests can point at any conversation, or nowhere.
#[derive(Default)]
pub struct FixedFocus {
    focused: Mutex<Option<ConversationId>>,
}

impl FixedFocus {
    pub fn new(focused: Option<ConversationId>) -> Self {
        Self {
            focused: Mutex::new(focused),
        }
    }

    /// Move focus at runtime. `None` backgrounds the app.
    pub fn set(&self, focused: Option<ConversationId>) {
        *self.focused.lock().unwrap() = focused;
    }
}

impl FocusSignal for FixedFocus {
    fn focused_conversation(&self) -> Option<ConversationId> {
        *self.focused.lock().unwrap()
    }
}

/// Builder for creating test engines with configurable options.
pub struct EngineHarnessBuilder {
    account: AccountId,
    config: BelfryConfig,
    settings: MockSettings,
    focused: Option<ConversationId>,
}

impl EngineHarnessBuilder {
    fn new() -> Self {
        Self {
            account: AccountId(1),
            config: BelfryConfig::default(),
            settings: MockSettings::new(),
            focused: None,
        }
    }

    /// Run the engine for a different account.
    pub fn with_account(mut self, account: AccountId) -> Self {
        self.account = account;
        self
    }

    /// Use a non-default configuration.
    pub fn with_config(mut self, config: BelfryConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a pre-configured settings store.
    pub fn with_settings(mut self, settings: MockSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Start with a conversation already focused.
    pub fn with_focus(mut self, conversation: ConversationId) -> Self {
        self.focused = Some(conversation);
        self
    }

    /// Spawn the engine. Must be called from within a tokio runtime.
    pub fn build(self) -> EngineHarness {
        let settings = Arc::new(self.settings);
        let focus = Arc::new(FixedFocus::new(self.focused));
        let renderer = Arc::new(RecordingRenderer::new());
        let engine = AccountEngine::spawn(
            self.account,
            &self.config,
            settings.clone(),
            focus.clone(),
            renderer.clone(),
        );
        let handle = engine.handle();
        EngineHarness {
            handle,
            settings,
            focus,
            renderer,
            engine,
        }
    }
}

/// A spawned engine wired to mocks, ready to receive events.
pub struct EngineHarness {
    /// Handle for submitting events and reading snapshots.
    pub handle: EngineHandle,
    /// The settings store the engine consults.
    pub settings: Arc<MockSettings>,
    /// The focus signal the engine reads.
    pub focus: Arc<FixedFocus>,
    /// Captured delivery plans and chimes.
    pub renderer: Arc<RecordingRenderer>,
    engine: AccountEngine,
}

impl EngineHarness {
    /// Create a new builder for configuring the harness.
    pub fn builder() -> EngineHarnessBuilder {
        EngineHarnessBuilder::new()
    }

    /// A harness with all defaults.
    pub fn spawn() -> Self {
        Self::builder().build()
    }

    /// Submit one event to the engine.
    pub async fn submit(&self, event: NormalizedEvent) -> Result<(), BelfryError> {
        self.handle.submit(event).await
    }

    /// Drain, flush, and stop the engine worker.
    pub async fn shutdown(self) -> Result<(), BelfryError> {
        self.engine.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{final_page, raw_message};

    #[tokio::test(start_paused = true)]
    async fn harness_round_trip() {
        let harness = EngineHarness::spawn();
        harness
            .submit(final_page(vec![raw_message(10, 1)]))
            .await
            .unwrap();
        harness.renderer.wait_for_plans(1).await;

        let snapshot = harness.handle.query().await.unwrap();
        assert_eq!(snapshot.total_unread, 1);
        harness.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn focus_changes_apply_to_later_events() {
        let harness = EngineHarness::builder()
            .with_focus(ConversationId(10))
            .build();
        harness
            .submit(final_page(vec![raw_message(10, 1)]))
            .await
            .unwrap();
        // The queue is asynchronous: wait until the first event has been
        // processed before moving focus.
        harness.handle.query().await.unwrap();
        harness.focus.set(None);
        harness
            .submit(final_page(vec![raw_message(10, 2)]))
            .await
            .unwrap();
        harness.renderer.wait_for_plans(1).await;

        assert_eq!(harness.renderer.chimes(), vec![ConversationId(10)]);
        let snapshot = harness.handle.query().await.unwrap();
        assert_eq!(snapshot.total_unread, 1, "only the unfocused arrival counts");
        harness.shutdown().await.unwrap();
    }
}
