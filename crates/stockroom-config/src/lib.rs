// SPDX-FileCopyrightText: 2026 Stockroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Stockroom admin client.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, `STOCKROOM_*` environment variable overrides, and
//! miette diagnostics with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use stockroom_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("backend: {}", config.api.base_url);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{render_errors, ConfigError, TomlSource};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::StockroomConfig;

/// Load configuration from the XDG hierarchy and validate it.
pub fn load_and_validate() -> Result<StockroomConfig, Vec<ConfigError>> {
    finish(loader::load_config(), collect_toml_sources)
}

/// Load configuration from one explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<StockroomConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path), || {
        std::fs::read_to_string(path)
            .map(|content| vec![TomlSource::new(path.display().to_string(), content)])
            .unwrap_or_default()
    })
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<StockroomConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![TomlSource::new("<inline>", toml_content)]
    })
}

/// Runs validation on success; on a figment error, reads the sources
/// (only then) so diagnostics can point into them.
fn finish(
    loaded: Result<StockroomConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<TomlSource>,
) -> Result<StockroomConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Collect TOML source file contents for error span resolution.
fn collect_toml_sources() -> Vec<TomlSource> {
    let mut candidates = vec![std::path::PathBuf::from("/etc/stockroom/stockroom.toml")];
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("stockroom/stockroom.toml"));
    }
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join("stockroom.toml"));
    }

    candidates
        .into_iter()
        .filter_map(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| TomlSource::new(path.display().to_string(), content))
        })
        .collect()
}
