// SPDX-FileCopyrightText: 2026 Stockroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Stockroom admin client.
//!
//! This crate provides the shared data model (entities, list queries,
//! pending operations), the error taxonomy, the entity forms, the
//! application state holder, and the [`ResourceClient`] trait that the
//! HTTP client and the test mocks implement.

pub mod app_state;
pub mod error;
pub mod forms;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use app_state::{AppState, Session, Theme};
pub use error::StockroomError;
pub use forms::EntityForm;
pub use traits::ResourceClient;
pub use types::{
    BulkOutcome, Entity, EntityId, ListMeta, ListQuery, ListResult, ModelName, OperationKind,
    OperationState, PendingOperation, Scope,
};
