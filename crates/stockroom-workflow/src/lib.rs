// SPDX-FileCopyrightText: 2026 Stockroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Soft-delete workflow for the Stockroom admin client.
//!
//! [`SoftDeleteController`] owns the list-view state machine
//! (`Idle → Loading → Ready → Mutating → Ready | Error`), the registry that
//! keeps at most one mutation in flight per (model, id), and the
//! delete → notify → undo → restore cycle. Outcomes are surfaced through
//! the [`Notifier`] trait; soft deletes hand it a single-use, time-boxed
//! [`UndoHandle`].

pub mod controller;
pub mod notify;
pub mod pending;
pub mod undo;
pub mod view;

pub use controller::{DEFAULT_UNDO_WINDOW, SoftDeleteController, WorkflowOptions};
pub use notify::Notifier;
pub use pending::PendingRegistry;
pub use undo::UndoHandle;
pub use view::{ListView, ViewSnapshot, ViewStatus};
