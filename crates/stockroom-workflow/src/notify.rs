// SPDX-FileCopyrightText: 2026 Stockroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contract of the notification presenter.

use std::time::Duration;

use crate::undo::UndoHandle;

/// Surfaces mutation outcomes to the user.
///
/// Rendering is up to the implementation. An `on_undo` handle, when
/// given, disarms itself after `undo_window` or after its first use.
pub trait Notifier: Send + Sync + 'static {
    fn notify_success(
        &self,
        message: &str,
        description: Option<&str>,
        undo_window: Duration,
        on_undo: Option<UndoHandle>,
    );

    fn notify_error(&self, message: &str, description: Option<&str>);
}
