// SPDX-FileCopyrightText: 2026 Belfry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Belfry integration tests.
//!
//! Provides mock implementations of the engine's host traits and a
//! harness that wires them to a spawned engine, for fast, deterministic
//! tests without a real notification subsystem.
//!
//! # Components
//!
//! - [`MockSettings`] - Settings store with per-conversation overrides and failure injection
//! - [`RecordingRenderer`] - Renderer that captures delivery plans for assertions
//! - [`FixedFocus`] - Focus signal with a settable focused conversation
//! - [`EngineHarness`] - A spawned engine wired to the mocks above

pub mod fixtures;
pub mod harness;
pub mod mock_renderer;
pub mod mock_settings;

pub use harness::{EngineHarness, FixedFocus};
pub use mock_renderer::RecordingRenderer;
pub use mock_settings::MockSettings;
