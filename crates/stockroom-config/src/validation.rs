// SPDX-FileCopyrightText: 2026 Stockroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::StockroomConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Longest undo window accepted, in seconds.
const MAX_UNDO_WINDOW_SECS: u64 = 60;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &StockroomConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let base_url = config.api.base_url.trim();
    if base_url.is_empty() {
        fail("api.base_url must not be empty".to_string());
    } else if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        fail(format!(
            "api.base_url `{base_url}` must start with http:// or https://"
        ));
    }

    if config.api.timeout_secs == 0 {
        fail("api.timeout_secs must be at least 1".to_string());
    }

    if let Some(token) = &config.api.auth_token
        && token.trim().is_empty()
    {
        fail("api.auth_token must not be blank when set".to_string());
    }

    let window = config.workflow.undo_window_secs;
    if window == 0 || window > MAX_UNDO_WINDOW_SECS {
        fail(format!(
            "workflow.undo_window_secs must be between 1 and {MAX_UNDO_WINDOW_SECS}, got {window}"
        ));
    }

    if config.workflow.default_page_size == 0 {
        fail("workflow.default_page_size must be at least 1".to_string());
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        fail(format!(
            "logging.level `{}` is not one of {}",
            config.logging.level,
            LOG_LEVELS.join(", ")
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
