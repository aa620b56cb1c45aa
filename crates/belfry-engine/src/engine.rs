// SPDX-FileCopyrightText: 2026 Belfry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The dispatcher: one serialized worker task per account.
//!
//! Producers (push handlers, UI events, resync jobs) submit events from
//! any task; the worker sanitizes and applies them strictly in
//! submission order and is the only code that touches the store and the
//! throttle. Significant
//! new-message deltas are coalesced behind a short delay so a paginated
//! burst renders once; reads, deletes, and edits re-render immediately
//! but quietly. Cross-thread reads are served from the last published
//! snapshot, never from live state.

use std::collections::BTreeSet;
use std::sync::Arc;

use arc_swap::ArcSwap;
use strum::Display;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info_span, trace, warn};

use belfry_config::{BelfryConfig, EngineConfig};
use belfry_core::error::BelfryError;
use belfry_core::event::NormalizedEvent;
use belfry_core::traits::settings::ThrottleLimits;
use belfry_core::traits::{FocusSignal, NotificationRenderer, SettingsStore};
use belfry_core::types::{AccountId, ConversationId};

use crate::intake;
use crate::planner::{self, PlanContext};
use crate::reconcile;
use crate::store::{EngineSnapshot, UnreadStore};
use crate::throttle::AlertThrottle;

enum Command {
    Event(NormalizedEvent),
    Query(oneshot::Sender<EngineSnapshot>),
    RemoteActivity(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Display)]
#[strum(serialize_all = "snake_case")]
enum WorkerState {
    Idle,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FlushMode {
    /// Re-render current state without sound; an armed coalescing timer
    /// and the set of alert-worthy conversations survive.
    Quiet,
    /// Consult the throttle and let the authorized conversations sound.
    Alert,
}

/// One account's engine: the spawned worker plus its public handle.
pub struct AccountEngine {
    handle: EngineHandle,
    task: JoinHandle<()>,
}

impl AccountEngine {
    /// Spawn the worker task for one account. The engine holds no
    /// global state; independent accounts get independent instances.
    pub fn spawn(
        account: AccountId,
        config: &BelfryConfig,
        settings: Arc<dyn SettingsStore>,
        focus: Arc<dyn FocusSignal>,
        renderer: Arc<dyn NotificationRenderer>,
    ) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel(config.engine.channel_capacity.max(1));
        let (badge_tx, badge_rx) = watch::channel(0u32);
        let snapshot = Arc::new(ArcSwap::from_pointee(EngineSnapshot::empty(account)));
        let cancel = CancellationToken::new();

        let worker = Worker {
            account,
            config: config.engine.clone(),
            store: UnreadStore::new(),
            throttle: AlertThrottle::new(ThrottleLimits {
                max_alerts_per_window: config.throttle.max_alerts_per_window,
                window_seconds: config.throttle.window_seconds,
            }),
            settings,
            focus,
            renderer,
            snapshot: Arc::clone(&snapshot),
            badge: badge_tx,
            commands: commands_rx,
            cancel: cancel.clone(),
            state: WorkerState::Idle,
            needs_flush: false,
            flush_deadline: None,
            dirty_alert: BTreeSet::new(),
            pending_cancel: BTreeSet::new(),
            last_remote_activity: None,
        };
        let task = tokio::spawn(worker.run().instrument(info_span!("engine", account = %account)));

        Self {
            handle: EngineHandle {
                account,
                commands: commands_tx,
                snapshot,
                badge: badge_rx,
                cancel,
            },
            task,
        }
    }

    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Signal shutdown and wait for the worker to drain its queue,
    /// flush anything pending, and stop.
    pub async fn shutdown(self) -> Result<(), BelfryError> {
        self.handle.cancel.cancel();
        self.task
            .await
            .map_err(|e| BelfryError::Internal(format!("engine worker failed: {e}")))
    }
}

/// Cheaply clonable entry point to one account's engine.
#[derive(Clone)]
pub struct EngineHandle {
    account: AccountId,
    commands: mpsc::Sender<Command>,
    snapshot: Arc<ArcSwap<EngineSnapshot>>,
    badge: watch::Receiver<u32>,
    cancel: CancellationToken,
}

impl EngineHandle {
    pub fn account(&self) -> AccountId {
        self.account
    }

    /// Enqueue one event; the worker sanitizes it on arrival. Returns
    /// an error only when the worker is gone; event-level problems
    /// never surface here.
    pub async fn submit(&self, event: NormalizedEvent) -> Result<(), BelfryError> {
        let name = event.to_string();
        self.commands
            .send(Command::Event(event))
            .await
            .map_err(|_| BelfryError::Dispatch {
                message: format!("engine worker is gone, dropped {name} event"),
                source: None,
            })
    }

    /// Total unread count from the last published snapshot.
    pub fn total_unread(&self) -> u32 {
        self.snapshot.load().total_unread
    }

    /// One conversation's count from the last published snapshot.
    pub fn conversation_count(&self, conversation: ConversationId) -> u32 {
        self.snapshot.load().conversation_count(conversation)
    }

    /// The last published snapshot.
    pub fn snapshot(&self) -> Arc<EngineSnapshot> {
        self.snapshot.load_full()
    }

    /// Ask the worker itself for the current state. Slower than
    /// [`EngineHandle::snapshot`] but sees every event submitted before
    /// this call.
    pub async fn query(&self) -> Result<EngineSnapshot, BelfryError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Query(reply_tx))
            .await
            .map_err(|_| BelfryError::Dispatch {
                message: "engine worker is gone, dropped query".into(),
                source: None,
            })?;
        reply_rx.await.map_err(|_| BelfryError::Dispatch {
            message: "engine worker dropped the query reply".into(),
            source: None,
        })
    }

    /// Fires on every change of the total unread count. Unchanged
    /// totals are not re-broadcast.
    pub fn badge_watch(&self) -> watch::Receiver<u32> {
        self.badge.clone()
    }

    /// Record that another device of this user was just active, which
    /// lengthens the coalescing delay for a while.
    pub async fn note_remote_activity(&self, timestamp: i64) -> Result<(), BelfryError> {
        self.commands
            .send(Command::RemoteActivity(timestamp))
            .await
            .map_err(|_| BelfryError::Dispatch {
                message: "engine worker is gone, dropped remote activity".into(),
                source: None,
            })
    }

    /// Signal the worker to drain and stop, without waiting.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

struct Worker {
    account: AccountId,
    config: EngineConfig,
    store: UnreadStore,
    throttle: AlertThrottle,
    settings: Arc<dyn SettingsStore>,
    focus: Arc<dyn FocusSignal>,
    renderer: Arc<dyn NotificationRenderer>,
    snapshot: Arc<ArcSwap<EngineSnapshot>>,
    badge: watch::Sender<u32>,
    commands: mpsc::Receiver<Command>,
    cancel: CancellationToken,
    state: WorkerState,
    /// A significant new-message delta is waiting to be alert-flushed.
    needs_flush: bool,
    /// When the coalescing timer fires, if armed.
    flush_deadline: Option<Instant>,
    /// Conversations with fresh messages since the last alert flush.
    dirty_alert: BTreeSet<ConversationId>,
    /// Conversations whose alerts must be withdrawn at the next flush.
    pending_cancel: BTreeSet<ConversationId>,
    last_remote_activity: Option<i64>,
}

impl Worker {
    async fn run(mut self) {
        debug!("engine worker started");
        loop {
            let deadline = self.flush_deadline;
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else { break };
                    self.set_state(WorkerState::Processing);
                    self.handle_command(command).await;
                    while let Ok(next) = self.commands.try_recv() {
                        self.handle_command(next).await;
                    }
                    self.set_state(WorkerState::Idle);
                }
                _ = time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.flush(FlushMode::Alert).await;
                }
                _ = self.cancel.cancelled() => {
                    while let Ok(next) = self.commands.try_recv() {
                        self.handle_command(next).await;
                    }
                    if self.needs_flush || self.flush_deadline.is_some() {
                        self.flush(FlushMode::Alert).await;
                    }
                    break;
                }
            }
        }
        self.publish();
        debug!("engine worker stopped");
    }

    fn set_state(&mut self, state: WorkerState) {
        if self.state != state {
            trace!(from = %self.state, to = %state, "dispatcher state");
            self.state = state;
        }
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Event(event) => self.apply_event(event).await,
            Command::Query(reply) => {
                let _ = reply.send(self.store.snapshot(self.account));
            }
            Command::RemoteActivity(timestamp) => {
                let newest = self
                    .last_remote_activity
                    .map_or(timestamp, |known| known.max(timestamp));
                self.last_remote_activity = Some(newest);
                trace!(timestamp = newest, "remote device activity noted");
            }
        }
    }

    async fn apply_event(&mut self, event: NormalizedEvent) {
        // Sanitizing here, not at submit, keeps drop warnings inside
        // the worker's span and thus attributed to the account.
        let event = intake::sanitize(event);
        let outcome = reconcile::apply(&mut self.store, self.focus.as_ref(), &event);

        for conversation in &outcome.chimes {
            self.renderer.in_app_chime(*conversation);
        }
        for conversation in &outcome.delta.removed_conversations {
            self.pending_cancel.insert(*conversation);
            self.dirty_alert.remove(conversation);
            self.throttle.forget(*conversation);
        }
        for conversation in &outcome.delta.added_conversations {
            // Re-added before its cancellation flushed: the alert lives on.
            self.pending_cancel.remove(conversation);
        }
        for conversation in &outcome.alerted {
            self.dirty_alert.insert(*conversation);
        }

        match &event {
            NormalizedEvent::NewMessages {
                is_final_of_batch, ..
            } => {
                if outcome.delta.is_significant() {
                    let delay = self.coalesce_delay();
                    self.needs_flush = true;
                    self.flush_deadline = Some(Instant::now() + delay);
                    trace!(delay_ms = delay.as_millis() as u64, "alert flush scheduled");
                }
                if *is_final_of_batch && (self.needs_flush || self.flush_deadline.is_some()) {
                    self.flush(FlushMode::Alert).await;
                } else if !outcome.delta.is_significant() && outcome.delta.has_changes() {
                    // Content changed under an existing alert: update it
                    // now, without sound.
                    self.flush(FlushMode::Quiet).await;
                }
            }
            NormalizedEvent::FullResync { .. } => {
                self.needs_flush = false;
                self.flush_deadline = None;
                self.dirty_alert.clear();
                self.throttle
                    .retain(|conversation| self.store.entry(conversation).is_some());
                self.flush(FlushMode::Quiet).await;
            }
            _ => {
                if outcome.delta.has_changes() || !self.pending_cancel.is_empty() {
                    self.flush(FlushMode::Quiet).await;
                }
            }
        }

        self.publish();
    }

    /// The current coalescing delay. Longer while another device of the
    /// same user was recently active, since a read marker from over
    /// there often arrives within a few seconds.
    fn coalesce_delay(&self) -> Duration {
        let now = chrono::Utc::now().timestamp();
        if remote_recently_active(
            self.last_remote_activity,
            now,
            self.config.remote_activity_window_secs,
        ) {
            Duration::from_millis(self.config.remote_activity_delay_ms)
        } else {
            Duration::from_millis(self.config.coalesce_delay_ms)
        }
    }

    async fn flush(&mut self, mode: FlushMode) {
        let now = chrono::Utc::now().timestamp();
        let alert_conversations = match mode {
            FlushMode::Alert => {
                self.flush_deadline = None;
                let dirty = std::mem::take(&mut self.dirty_alert);
                // Only conversations that will put up a card may be
                // charged: a muted or focused conversation renders
                // nothing this flush and keeps its window slots.
                let candidates = planner::alert_candidates(
                    &self.store,
                    self.settings.as_ref(),
                    self.focus.as_ref(),
                    now,
                    &dirty,
                );
                let mut allowed = BTreeSet::new();
                for conversation in candidates {
                    let limits = self.throttle_limits_for(conversation);
                    let decision = self.throttle.authorize(conversation, limits, now);
                    trace!(conversation = %conversation, decision = %decision, "throttle consulted");
                    if decision.is_allowed() {
                        allowed.insert(conversation);
                    }
                }
                allowed
            }
            FlushMode::Quiet => BTreeSet::new(),
        };
        self.needs_flush = false;

        let cancellations = std::mem::take(&mut self.pending_cancel);
        let context = PlanContext {
            account: self.account,
            store: &self.store,
            settings: self.settings.as_ref(),
            focus: self.focus.as_ref(),
            alert_conversations: &alert_conversations,
            cancellations: &cancellations,
            now,
            max_grouped: self.config.max_grouped,
            preview_lines: self.config.preview_lines,
        };
        let plan = planner::plan(&context);
        if plan.is_empty() {
            return;
        }
        debug!(
            cards = plan.per_conversation.len(),
            summary = plan.summary.is_some(),
            cancels = plan.to_cancel.len(),
            "delivering plan"
        );
        if let Err(e) = self.renderer.deliver(plan).await {
            // Counts stay correct; the next significant delta re-renders.
            error!(error = %e, "renderer rejected delivery plan");
        }
    }

    fn throttle_limits_for(&self, conversation: ConversationId) -> Option<ThrottleLimits> {
        match self.settings.conversation_settings(conversation) {
            Ok(settings) => settings.throttle,
            Err(e) => {
                warn!(conversation = %conversation, error = %e, "settings unavailable, using default throttle");
                None
            }
        }
    }

    /// Publish the snapshot and the badge value. The badge watch only
    /// fires when the total actually moved.
    fn publish(&self) {
        let snapshot = self.store.snapshot(self.account);
        let total = snapshot.total_unread;
        self.snapshot.store(Arc::new(snapshot));
        self.badge.send_if_modified(|current| {
            if *current == total {
                false
            } else {
                *current = total;
                true
            }
        });
    }
}

/// Whether another session of this user was active within the window.
fn remote_recently_active(last_activity: Option<i64>, now: i64, window_secs: i64) -> bool {
    last_activity.is_some_and(|at| now - at <= window_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use tracing_test::traced_test;

    use belfry_core::message::{MessagePreview, RawMessage};
    use belfry_core::plan::DeliveryPlan;
    use belfry_core::traits::focus::Unfocused;
    use belfry_core::traits::settings::{ConversationSettings, KindSettings, SettingsError};
    use belfry_core::types::{ClientTagId, ConversationKind, MessageId};

    struct SinkRenderer;

    #[async_trait]
    impl NotificationRenderer for SinkRenderer {
        async fn deliver(&self, _plan: DeliveryPlan) -> Result<(), BelfryError> {
            Ok(())
        }
    }

    struct DefaultSettings;

    impl SettingsStore for DefaultSettings {
        fn conversation_settings(
            &self,
            _conversation: ConversationId,
        ) -> Result<ConversationSettings, SettingsError> {
            Ok(ConversationSettings::default())
        }

        fn kind_defaults(&self, _kind: ConversationKind) -> Result<KindSettings, SettingsError> {
            Ok(KindSettings::default())
        }
    }

    #[test]
    fn remote_activity_window() {
        assert!(!remote_recently_active(None, 100, 30));
        assert!(remote_recently_active(Some(80), 100, 30));
        assert!(remote_recently_active(Some(70), 100, 30));
        assert!(!remote_recently_active(Some(69), 100, 30));
    }

    #[test]
    fn dispatcher_states_render_for_logging() {
        assert_eq!(WorkerState::Idle.to_string(), "idle");
        assert_eq!(WorkerState::Processing.to_string(), "processing");
    }

    #[traced_test]
    #[tokio::test]
    async fn intake_drops_are_attributed_to_the_account() {
        let engine = AccountEngine::spawn(
            AccountId(7),
            &BelfryConfig::default(),
            Arc::new(DefaultSettings),
            Arc::new(Unfocused),
            Arc::new(SinkRenderer),
        );
        let handle = engine.handle();

        let unusable = RawMessage {
            conversation_id: ConversationId(-913),
            message_id: MessageId(0),
            client_tag_id: ClientTagId(0),
            sender_id: 1,
            timestamp: 100,
            kind: ConversationKind::Group,
            conversation_label: None,
            is_mention: false,
            mention_origin: None,
            is_silent: false,
            is_service_event: false,
            preview: MessagePreview::from_text("ghost"),
        };
        handle
            .submit(NormalizedEvent::NewMessages {
                messages: vec![unusable],
                is_final_of_batch: true,
            })
            .await
            .unwrap();
        engine.shutdown().await.unwrap();

        logs_assert(|lines: &[&str]| {
            for line in lines {
                if line.contains("dropping message") && line.contains("conversation=-913") {
                    return if line.contains("account=7") {
                        Ok(())
                    } else {
                        Err(format!("drop warning lost its account: {line}"))
                    };
                }
            }
            Err("drop warning was never logged".into())
        });
    }
}
