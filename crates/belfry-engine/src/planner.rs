// SPDX-FileCopyrightText: 2026 Belfry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The delivery planner: turns the current unread state into the
//! immutable plan handed to the renderer.
//!
//! Planning is a pure function of the store, the user's settings, and
//! the flush context (which conversations are authorized to sound,
//! which must be withdrawn). It never mutates anything; suppressing or
//! muting an alert here has no effect on counts. The same candidate
//! selection also answers, ahead of an alert flush, which conversations
//! can surface at all: one filtered out here never reaches the
//! throttle.

use std::collections::BTreeSet;

use tracing::warn;

use belfry_core::message::PendingMessage;
use belfry_core::plan::{AlertProfile, DeliveryPlan, DismissalKey, NotificationDescriptor};
use belfry_core::traits::settings::{ConversationSettings, KindSettings};
use belfry_core::traits::{FocusSignal, SettingsStore};
use belfry_core::types::{AccountId, ConversationId};

use crate::store::UnreadStore;

/// Everything one planning pass needs, borrowed from the worker.
pub struct PlanContext<'a> {
    pub account: AccountId,
    pub store: &'a UnreadStore,
    pub settings: &'a dyn SettingsStore,
    pub focus: &'a dyn FocusSignal,
    /// Conversations cleared by the throttle to make noise this flush.
    /// Everything else renders silently.
    pub alert_conversations: &'a BTreeSet<ConversationId>,
    /// Conversations whose previously shown alerts must be withdrawn.
    pub cancellations: &'a BTreeSet<ConversationId>,
    /// Unix seconds, for mute-until checks.
    pub now: i64,
    /// Cap on per-conversation descriptors in a grouped plan.
    pub max_grouped: usize,
    /// Cap on body lines in a single-conversation plan.
    pub preview_lines: usize,
}

struct Candidate<'a> {
    conversation: ConversationId,
    title: String,
    unread_count: u32,
    preview_enabled: bool,
    /// The configured profile, before flush-time silencing.
    base_profile: AlertProfile,
    /// Show the override mentions instead of the entry's own messages.
    mention_fallback: bool,
    display: &'a PendingMessage,
}

/// Every entry that would surface a card right now, newest first: not
/// focused, not muted (unless override mentions force it through), and
/// holding at least one renderable message.
fn select_candidates<'a>(
    store: &'a UnreadStore,
    settings: &dyn SettingsStore,
    focus: &dyn FocusSignal,
    now: i64,
) -> Vec<Candidate<'a>> {
    let focused = focus.focused_conversation();
    let mut candidates: Vec<Candidate<'_>> = Vec::new();

    for entry in store.entries() {
        let conversation = entry.conversation_id();
        if focused == Some(conversation) {
            continue;
        }

        let conv_settings = conversation_settings_or_default(settings, conversation);
        let kind_settings = kind_settings_or_default(settings, entry.kind());
        let muted = conv_settings.is_muted_at(now) || kind_settings.is_muted_at(now);

        // A muted conversation surfaces only for mentions attributed to
        // another thread, and then shows the mention count.
        let mention_fallback = muted && entry.override_mention_count() > 0;
        if muted && !mention_fallback {
            continue;
        }

        let display = if mention_fallback {
            store
                .newest_first()
                .find(|m| m.conversation_id == conversation && m.is_attributed_elsewhere())
        } else {
            store.conversation_pending_newest_first(conversation).next()
        };
        // Entries holding a bare server count have nothing to render;
        // they still weigh in the badge.
        let Some(display) = display else { continue };

        candidates.push(Candidate {
            conversation,
            title: entry
                .label()
                .map(str::to_owned)
                .unwrap_or_else(|| format!("Conversation {conversation}")),
            unread_count: if mention_fallback {
                entry.override_mention_count()
            } else {
                entry.count()
            },
            preview_enabled: conv_settings
                .preview_enabled
                .unwrap_or(kind_settings.preview_enabled),
            base_profile: conv_settings
                .profile
                .clone()
                .unwrap_or_else(|| kind_settings.profile.clone()),
            mention_fallback,
            display,
        });
    }

    candidates.sort_by_key(|c| std::cmp::Reverse((c.display.timestamp, c.conversation)));
    candidates
}

/// The subset of `dirty` that would surface a card right now. The
/// dispatcher charges throttle slots only for these: a muted or focused
/// conversation renders nothing this flush, so it keeps its slots.
pub fn alert_candidates(
    store: &UnreadStore,
    settings: &dyn SettingsStore,
    focus: &dyn FocusSignal,
    now: i64,
    dirty: &BTreeSet<ConversationId>,
) -> BTreeSet<ConversationId> {
    select_candidates(store, settings, focus, now)
        .iter()
        .map(|candidate| candidate.conversation)
        .filter(|conversation| dirty.contains(conversation))
        .collect()
}

/// Build the delivery plan for the current state.
pub fn plan(ctx: &PlanContext<'_>) -> DeliveryPlan {
    let mut candidates = select_candidates(ctx.store, ctx.settings, ctx.focus, ctx.now);

    let mut plan = DeliveryPlan {
        account: ctx.account,
        summary: None,
        per_conversation: Vec::new(),
        to_cancel: ctx.cancellations.clone(),
    };

    if candidates.len() == 1 {
        let single = &candidates[0];
        plan.per_conversation
            .push(single_descriptor(ctx, single));
    } else if candidates.len() > 1 {
        plan.summary = Some(summary_descriptor(ctx, &candidates));
        candidates.truncate(ctx.max_grouped);
        for candidate in &candidates {
            plan.per_conversation.push(grouped_descriptor(ctx, candidate));
        }
    }
    plan
}

fn conversation_settings_or_default(
    settings: &dyn SettingsStore,
    conversation: ConversationId,
) -> ConversationSettings {
    match settings.conversation_settings(conversation) {
        Ok(settings) => settings,
        Err(e) => {
            warn!(conversation = %conversation, error = %e, "settings unavailable, using defaults");
            ConversationSettings::default()
        }
    }
}

fn kind_settings_or_default(
    settings: &dyn SettingsStore,
    kind: Option<belfry_core::types::ConversationKind>,
) -> KindSettings {
    let Some(kind) = kind else {
        return KindSettings::default();
    };
    match settings.kind_defaults(kind) {
        Ok(settings) => settings,
        Err(e) => {
            warn!(kind = %kind, error = %e, "settings unavailable, using defaults");
            KindSettings::default()
        }
    }
}

/// The one-conversation layout: a single card with up to
/// `preview_lines` of message text.
fn single_descriptor(ctx: &PlanContext<'_>, candidate: &Candidate<'_>) -> NotificationDescriptor {
    let body_lines = if candidate.preview_enabled {
        display_messages(ctx.store, candidate)
            .take(ctx.preview_lines)
            .map(|m| m.preview.text().to_owned())
            .collect()
    } else {
        Vec::new()
    };
    descriptor(ctx, candidate, body_lines)
}

/// One card inside a grouped plan: a single preview line.
fn grouped_descriptor(ctx: &PlanContext<'_>, candidate: &Candidate<'_>) -> NotificationDescriptor {
    let body_lines = if candidate.preview_enabled {
        vec![candidate.display.preview.text().to_owned()]
    } else {
        Vec::new()
    };
    descriptor(ctx, candidate, body_lines)
}

fn descriptor(
    ctx: &PlanContext<'_>,
    candidate: &Candidate<'_>,
    body_lines: Vec<String>,
) -> NotificationDescriptor {
    // The throttle's verdict and the sender's silent flag strip the
    // noise, never the card.
    let profile = if candidate.display.silent
        || !ctx.alert_conversations.contains(&candidate.conversation)
    {
        candidate.base_profile.silenced()
    } else {
        candidate.base_profile.clone()
    };
    NotificationDescriptor {
        conversation: Some(candidate.conversation),
        title: candidate.title.clone(),
        body_lines,
        unread_count: candidate.unread_count,
        profile,
        dismissal_key: DismissalKey::conversation(ctx.account, candidate.conversation),
        timestamp: candidate.display.timestamp,
    }
}

/// The aggregated descriptor shown above the per-conversation cards.
/// Always quiet: the sound, if any, rides the conversation cards. Its
/// totals cover the planned conversations only; muted backlog, the
/// focused chat, and bare-count entries weigh in the badge, not here.
fn summary_descriptor(
    ctx: &PlanContext<'_>,
    candidates: &[Candidate<'_>],
) -> NotificationDescriptor {
    let unread: u32 = candidates.iter().map(|c| c.unread_count).sum();
    let body_lines = candidates
        .iter()
        .take(ctx.max_grouped)
        .map(|c| {
            if c.preview_enabled {
                format!("{}: {}", c.title, c.display.preview.text())
            } else {
                c.title.clone()
            }
        })
        .collect();
    NotificationDescriptor {
        conversation: None,
        title: format!("{} new messages from {} chats", unread, candidates.len()),
        body_lines,
        unread_count: unread,
        profile: AlertProfile::silent(),
        dismissal_key: DismissalKey::summary(ctx.account),
        timestamp: candidates.first().map_or(ctx.now, |c| c.display.timestamp),
    }
}

fn display_messages<'a>(
    store: &'a UnreadStore,
    candidate: &Candidate<'a>,
) -> Box<dyn Iterator<Item = &'a PendingMessage> + 'a> {
    let conversation = candidate.conversation;
    if candidate.mention_fallback {
        Box::new(
            store
                .newest_first()
                .filter(move |m| m.conversation_id == conversation && m.is_attributed_elsewhere()),
        )
    } else {
        Box::new(store.conversation_pending_newest_first(conversation))
    }
}
