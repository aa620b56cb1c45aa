// SPDX-FileCopyrightText: 2026 Belfry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the Belfry notification engine.
//!
//! TOML files merge across the XDG hierarchy with `BELFRY_*` environment
//! overrides on top. Unknown keys are rejected (`deny_unknown_fields`)
//! and semantic constraints are checked after deserialization; failures
//! come back as miette diagnostics that point into the offending file and
//! suggest the key the author probably meant.
//!
//! # Usage
//!
//! ```no_run
//! use belfry_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Coalesce delay: {} ms", config.engine.coalesce_delay_ms);
//! ```

use std::path::{Path, PathBuf};

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{BelfryConfig, EngineConfig, LogConfig, ThrottleConfig};

/// Load configuration from the XDG hierarchy and validate it.
///
/// On a figment failure the hierarchy's files are re-read so the
/// diagnostics can carry source spans; on success the semantic checks in
/// [`validation`] run before the config is handed back.
pub fn load_and_validate() -> Result<BelfryConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(
            err,
            &read_sources(&hierarchy_paths()),
        )),
    }
}

/// Load one explicit config file and validate it. Env overrides still
/// apply on top of the file.
pub fn load_and_validate_path(path: &Path) -> Result<BelfryConfig, Vec<ConfigError>> {
    match loader::load_config_from_path(path) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = read_sources(&[path.to_path_buf()]);
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Validate a TOML string directly. Used by tests and embedders that
/// manage their own files.
pub fn load_and_validate_str(toml_content: &str) -> Result<BelfryConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// The files `load_config` consults, most local first. The cwd-relative
/// name is absolutized to match the path figment reports in error
/// metadata.
fn hierarchy_paths() -> Vec<PathBuf> {
    let local = std::env::current_dir()
        .map(|dir| dir.join("belfry.toml"))
        .unwrap_or_else(|_| PathBuf::from("belfry.toml"));

    let mut paths = vec![local];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("belfry/belfry.toml"));
    }
    paths.push(PathBuf::from("/etc/belfry/belfry.toml"));
    paths
}

/// Contents of every listed file that exists, for span resolution.
fn read_sources(paths: &[PathBuf]) -> Vec<(String, String)> {
    paths
        .iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(path).ok()?;
            Some((path.display().to_string(), content))
        })
        .collect()
}
