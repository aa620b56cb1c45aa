// SPDX-FileCopyrightText: 2026 Belfry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock renderer for deterministic testing.
//!
//! `RecordingRenderer` implements `NotificationRenderer` by capturing
//! every delivered plan and chime for assertion in tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Notify;

use belfry_core::error::BelfryError;
use belfry_core::plan::DeliveryPlan;
use belfry_core::traits::NotificationRenderer;
use belfry_core::types::ConversationId;

/// A renderer that records instead of rendering.
///
/// Plans arrive in delivery order. `set_failing(true)` makes `deliver`
/// return a render error, which the engine logs and swallows; the plan
/// is not recorded in that case.
#[derive(Default)]
pub struct RecordingRenderer {
    plans: Mutex<Vec<DeliveryPlan>>,
    chimes: Mutex<Vec<ConversationId>>,
    failing: AtomicBool,
    delivered: Notify,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// All plans delivered so far, oldest first.
    pub fn plans(&self) -> Vec<DeliveryPlan> {
        self.plans.lock().unwrap().clone()
    }

    pub fn plan_count(&self) -> usize {
        self.plans.lock().unwrap().len()
    }

    /// The most recently delivered plan.
    pub fn last_plan(&self) -> Option<DeliveryPlan> {
        self.plans.lock().unwrap().last().cloned()
    }

    /// Conversations that chimed in-app instead of alerting.
    pub fn chimes(&self) -> Vec<ConversationId> {
        self.chimes.lock().unwrap().clone()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.plans.lock().unwrap().clear();
        self.chimes.lock().unwrap().clear();
    }

    /// Make `deliver` fail (or succeed again) from now on.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Wait until at least `count` plans have been delivered.
    ///
    /// On the paused test clock this also lets an armed coalescing
    /// timer fire, so a test can simply await the plan it expects.
    pub async fn wait_for_plans(&self, count: usize) {
        loop {
            let delivered = self.delivered.notified();
            if self.plan_count() >= count {
                return;
            }
            delivered.await;
        }
    }
}

#[async_trait]
impl NotificationRenderer for RecordingRenderer {
    async fn deliver(&self, plan: DeliveryPlan) -> Result<(), BelfryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(BelfryError::Render {
                message: "injected failure".into(),
                source: None,
            });
        }
        self.plans.lock().unwrap().push(plan);
        self.delivered.notify_waiters();
        Ok(())
    }

    fn in_app_chime(&self, conversation: ConversationId) {
        self.chimes.lock().unwrap().push(conversation);
    }
}
