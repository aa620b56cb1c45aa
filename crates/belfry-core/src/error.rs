// SPDX-FileCopyrightText: 2026 Belfry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Belfry notification engine.

use thiserror::Error;

/// The primary error type used across the Belfry engine and its collaborator traits.
#[derive(Debug, Error)]
pub enum BelfryError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// A raw event could not be normalized (missing identity, empty payload).
    #[error("intake error: {message}")]
    Intake { message: String },

    /// Dispatcher errors (queue closed, worker gone, enqueue after shutdown).
    #[error("dispatch error: {message}")]
    Dispatch {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Notification renderer errors (OS alert API rejected the plan).
    #[error("render error: {message}")]
    Render {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
