// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./minerva.toml` > `~/.config/minerva/minerva.toml`
//! > `/etc/minerva/minerva.toml` with environment variable overrides via the
//! `MINERVA_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::MinervaConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/minerva/minerva.toml` (system-wide)
/// 3. `~/.config/minerva/minerva.toml` (user XDG config)
/// 4. `./minerva.toml` (local directory)
/// 5. `MINERVA_*` environment variables
pub fn load_config() -> Result<MinervaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MinervaConfig::default()))
        .merge(Toml::file("/etc/minerva/minerva.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("minerva/minerva.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("minerva.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from inline TOML only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<MinervaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MinervaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MinervaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MinervaConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` so underscore-bearing key
/// names stay intact: `MINERVA_REMOTE_MODEL_API_KEY` must map to
/// `remote_model.api_key`, not `remote.model.api.key`.
fn env_provider() -> Env {
    Env::prefixed("MINERVA_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("router_", "router.", 1)
            .replacen("agent_", "agent.", 1)
            .replacen("vector_", "vector.", 1)
            .replacen("embedding_", "embedding.", 1)
            .replacen("local_model_", "local_model.", 1)
            .replacen("remote_model_", "remote_model.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("gateway_", "gateway.", 1);
        mapped.into()
    })
}
