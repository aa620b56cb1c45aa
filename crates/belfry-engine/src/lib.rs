// SPDX-FileCopyrightText: 2026 Belfry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Belfry notification engine.
//!
//! One [`AccountEngine`] per signed-in account ingests normalized
//! message events, keeps the unread bookkeeping consistent, rate-limits
//! audible alerts, and hands delivery plans to a host-provided renderer.
//! The pipeline, in event order: intake sanitization, the serialized
//! dispatcher worker, reconciliation against the unread store, the
//! per-conversation throttle, and the delivery planner.

pub mod engine;
pub mod intake;
pub mod planner;
pub mod reconcile;
pub mod store;
pub mod throttle;

pub use engine::{AccountEngine, EngineHandle};
pub use store::{EngineSnapshot, UnreadStore};
pub use throttle::{AlertThrottle, ThrottleDecision};
