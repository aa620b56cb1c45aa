// SPDX-FileCopyrightText: 2026 Belfry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions at the engine boundary.
//!
//! The engine itself owns no settings storage, no focus tracking, and
//! no OS alert surface; hosts supply all three through these traits.

pub mod focus;
pub mod renderer;
pub mod settings;

// Re-export all traits at the traits module level for convenience.
pub use focus::FocusSignal;
pub use renderer::NotificationRenderer;
pub use settings::SettingsStore;
