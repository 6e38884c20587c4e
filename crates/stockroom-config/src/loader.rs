// SPDX-FileCopyrightText: 2026 Stockroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./stockroom.toml` > `~/.config/stockroom/stockroom.toml` >
//! `/etc/stockroom/stockroom.toml` with environment variable overrides via `STOCKROOM_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::StockroomConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/stockroom/stockroom.toml` (system-wide)
/// 3. `~/.config/stockroom/stockroom.toml` (user XDG config)
/// 4. `./stockroom.toml` (local directory)
/// 5. `STOCKROOM_*` environment variables
pub fn load_config() -> Result<StockroomConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<StockroomConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(StockroomConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<StockroomConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(StockroomConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(StockroomConfig::default()))
        .merge(Toml::file("/etc/stockroom/stockroom.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("stockroom/stockroom.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("stockroom.toml"))
        .merge(env_provider())
}

/// Config sections that environment variables may address.
const SECTIONS: [&str; 4] = ["api", "cache", "workflow", "logging"];

/// Environment provider mapping the `_` after a section name to `.`.
///
/// Uses `Env::map()` rather than `Env::split("_")` so underscore-containing
/// keys survive: `STOCKROOM_API_AUTH_TOKEN` maps to `api.auth_token`, not
/// `api.auth.token`.
fn env_provider() -> Env {
    Env::prefixed("STOCKROOM_").map(|key| {
        let key_str = key.as_str().to_ascii_lowercase();
        let mapped = SECTIONS
            .iter()
            .find_map(|section| {
                key_str
                    .strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|rest| format!("{section}.{rest}"))
            })
            .unwrap_or_else(|| key_str.clone());
        mapped.into()
    })
}
