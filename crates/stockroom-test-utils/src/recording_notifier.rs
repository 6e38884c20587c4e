// SPDX-FileCopyrightText: 2026 Stockroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notifier that records every notification for later assertions.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use stockroom_workflow::{Notifier, UndoHandle};

/// One captured notification.
#[derive(Debug, Clone)]
pub enum Notification {
    Success {
        message: String,
        description: Option<String>,
        undo_window: Duration,
        on_undo: Option<UndoHandle>,
    },
    Error {
        message: String,
        description: Option<String>,
    },
}

impl Notification {
    pub fn message(&self) -> &str {
        match self {
            Notification::Success { message, .. } | Notification::Error { message, .. } => message,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Notification::Success { description, .. }
            | Notification::Error { description, .. } => description.as_deref(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notification::Error { .. })
    }

    pub fn undo(&self) -> Option<&UndoHandle> {
        match self {
            Notification::Success { on_undo, .. } => on_undo.as_ref(),
            Notification::Error { .. } => None,
        }
    }
}

/// Captures notifications in order. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    log: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.log().clone()
    }

    pub fn successes(&self) -> Vec<Notification> {
        self.log().iter().filter(|n| !n.is_error()).cloned().collect()
    }

    pub fn errors(&self) -> Vec<Notification> {
        self.log().iter().filter(|n| n.is_error()).cloned().collect()
    }

    pub fn last(&self) -> Option<Notification> {
        self.log().last().cloned()
    }

    pub fn clear(&self) {
        self.log().clear();
    }

    // Notifier methods are synchronous, so this is a std mutex.
    fn log(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Notifier for RecordingNotifier {
    fn notify_success(
        &self,
        message: &str,
        description: Option<&str>,
        undo_window: Duration,
        on_undo: Option<UndoHandle>,
    ) {
        self.log().push(Notification::Success {
            message: message.to_string(),
            description: description.map(str::to_string),
            undo_window,
            on_undo,
        });
    }

    fn notify_error(&self, message: &str, description: Option<&str>) {
        self.log().push(Notification::Error {
            message: message.to_string(),
            description: description.map(str::to_string),
        });
    }
}
