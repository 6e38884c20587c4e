// SPDX-FileCopyrightText: 2026 Stockroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Stockroom admin client.

use thiserror::Error;

/// Message shown to the user when the backend did not provide one.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// The primary error type shared by the resource client, cache, and workflow layers.
///
/// Every variant carries owned strings only, so one failed fetch can be
/// cloned out to every caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockroomError {
    /// No response was received (offline, timeout, DNS, connection reset).
    #[error("network error: {message}")]
    Network { message: String },

    /// The backend responded with a failure status.
    #[error("backend error ({status_code}): {message}")]
    Backend { status_code: u16, message: String },

    /// A mutation was requested on ids already under mutation.
    #[error("conflict: {model} ids already under mutation: {}", ids.join(", "))]
    Conflict { model: String, ids: Vec<String> },

    /// Malformed input rejected before reaching the network.
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration errors (bad base URL, invalid header values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl StockroomError {
    /// Returns the message suitable for an error notification.
    ///
    /// Backend-provided messages are passed through; everything else
    /// collapses to [`GENERIC_FAILURE_MESSAGE`] unless it is a client-side
    /// rejection the user can act on.
    pub fn user_message(&self) -> String {
        match self {
            StockroomError::Backend { message, .. } if !message.trim().is_empty() => {
                message.clone()
            }
            StockroomError::Conflict { .. } => {
                "This item is already being updated. Please wait.".to_string()
            }
            StockroomError::Validation(message) => message.clone(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    /// Returns true when the server answered (as opposed to a transport failure).
    pub fn is_backend(&self) -> bool {
        matches!(self, StockroomError::Backend { .. })
    }
}
