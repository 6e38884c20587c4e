// SPDX-FileCopyrightText: 2026 Stockroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Stockroom integration tests.
//!
//! Provides mock collaborators for fast, deterministic, CI-runnable tests
//! without a backend.
//!
//! # Components
//!
//! - [`MockResourceClient`] - In-memory backend with call counting, scripted failures, and gates
//! - [`RecordingNotifier`] - Notifier capturing every notification and undo handle

pub mod mock_client;
pub mod recording_notifier;

pub use mock_client::{Gate, MockCall, MockResourceClient, RecordedCall, trashed};
pub use recording_notifier::{Notification, RecordingNotifier};
