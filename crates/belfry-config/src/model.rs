// SPDX-FileCopyrightText: 2026 Belfry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model for the Belfry notification engine.
//!
//! Every struct carries `#[serde(deny_unknown_fields)]` so a misspelled
//! key fails at startup instead of being silently ignored.

use serde::{Deserialize, Serialize};

/// Top-level Belfry configuration.
///
/// Every section is optional; an empty file yields the same values as
/// [`BelfryConfig::default`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BelfryConfig {
    /// Reconciliation and delivery engine settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Alert frequency throttling settings.
    #[serde(default)]
    pub throttle: ThrottleConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// Reconciliation and delivery engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Delay before flushing a coalesced batch of new-message deltas, in milliseconds.
    #[serde(default = "default_coalesce_delay_ms")]
    pub coalesce_delay_ms: u64,

    /// Coalescing delay used while another device is actively reading, in milliseconds.
    #[serde(default = "default_remote_activity_delay_ms")]
    pub remote_activity_delay_ms: u64,

    /// How long a remote read marks the account as remotely active, in seconds.
    #[serde(default = "default_remote_activity_window_secs")]
    pub remote_activity_window_secs: i64,

    /// Maximum number of per-conversation cards shown under a summary notification.
    #[serde(default = "default_max_grouped")]
    pub max_grouped: usize,

    /// Maximum number of message preview lines in a single-conversation notification.
    #[serde(default = "default_preview_lines")]
    pub preview_lines: usize,

    /// Capacity of the bounded event channel feeding each account worker.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            coalesce_delay_ms: default_coalesce_delay_ms(),
            remote_activity_delay_ms: default_remote_activity_delay_ms(),
            remote_activity_window_secs: default_remote_activity_window_secs(),
            max_grouped: default_max_grouped(),
            preview_lines: default_preview_lines(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_coalesce_delay_ms() -> u64 {
    1000
}

fn default_remote_activity_delay_ms() -> u64 {
    3000
}

fn default_remote_activity_window_secs() -> i64 {
    30
}

fn default_max_grouped() -> usize {
    7
}

fn default_preview_lines() -> usize {
    10
}

fn default_channel_capacity() -> usize {
    512
}

/// Alert frequency throttling configuration.
///
/// These are the account-wide defaults; individual conversations may carry
/// their own limits via the settings store.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ThrottleConfig {
    /// Maximum audible alerts per conversation within the window. Zero disables throttling.
    #[serde(default = "default_max_alerts_per_window")]
    pub max_alerts_per_window: u32,

    /// Length of the throttle window, in seconds.
    #[serde(default = "default_window_seconds")]
    pub window_seconds: i64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_alerts_per_window: default_max_alerts_per_window(),
            window_seconds: default_window_seconds(),
        }
    }
}

fn default_max_alerts_per_window() -> u32 {
    2
}

fn default_window_seconds() -> i64 {
    180
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// One of trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
