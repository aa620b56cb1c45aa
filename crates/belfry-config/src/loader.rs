// SPDX-FileCopyrightText: 2026 Belfry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading through Figment.
//!
//! Sources merge in precedence order: compiled defaults first, then
//! `/etc/belfry/belfry.toml`, the XDG user config, `./belfry.toml`, and
//! `BELFRY_*` environment variables on top of everything.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;

use crate::model::BelfryConfig;

/// Load from the standard XDG hierarchy with env overrides.
pub fn load_config() -> Result<BelfryConfig, figment::Error> {
    let user_config = dirs::config_dir()
        .map(|dir| dir.join("belfry/belfry.toml"))
        .unwrap_or_default();

    Figment::new()
        .merge(Serialized::defaults(BelfryConfig::default()))
        .merge(Toml::file("/etc/belfry/belfry.toml"))
        .merge(Toml::file(user_config))
        .merge(Toml::file("belfry.toml"))
        .merge(env_overrides())
        .extract()
}

/// Parse one TOML string on top of the defaults. No file lookup, no env
/// overrides; this is the entry point tests and embedders use.
pub fn load_config_from_str(toml_content: &str) -> Result<BelfryConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BelfryConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load one explicit config file, still honoring env overrides.
pub fn load_config_from_path(path: &Path) -> Result<BelfryConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BelfryConfig::default()))
        .merge(Toml::file(path))
        .merge(env_overrides())
        .extract()
}

/// `BELFRY_*` variables mapped onto config paths. Uses an explicit
/// section map instead of `Env::split("_")`: the key names themselves
/// contain underscores, so `BELFRY_ENGINE_COALESCE_DELAY_MS` must become
/// `engine.coalesce_delay_ms`, not `engine.coalesce.delay.ms`.
fn env_overrides() -> Env {
    Env::prefixed("BELFRY_").map(|key| {
        // `key` arrives lowercased with the prefix stripped, e.g.
        // BELFRY_ENGINE_MAX_GROUPED -> "engine_max_grouped".
        key.as_str()
            .replacen("engine_", "engine.", 1)
            .replacen("throttle_", "throttle.", 1)
            .replacen("log_", "log.", 1)
            .into()
    })
}
