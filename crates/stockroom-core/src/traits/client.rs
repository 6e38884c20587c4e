// SPDX-FileCopyrightText: 2026 Stockroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resource client trait for the generic soft-delete REST API.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::error::StockroomError;
use crate::forms::EntityForm;
use crate::types::{BulkOutcome, Entity, EntityId, ListQuery, ListResult, ModelName};

/// Issues backend calls for one family of models addressed by name.
///
/// Implementations never touch the query cache; invalidation after a
/// successful write is the caller's job. Transport failures surface as
/// [`StockroomError::Network`], non-2xx responses as
/// [`StockroomError::Backend`].
#[async_trait]
pub trait ResourceClient: Send + Sync + 'static {
    /// Lists non-deleted entities for `query.model`.
    async fn list_active(&self, query: &ListQuery) -> Result<ListResult, StockroomError>;

    /// Lists soft-deleted entities for `query.model`.
    async fn list_trash(&self, query: &ListQuery) -> Result<ListResult, StockroomError>;

    /// Soft-deletes one entity through the model's plain delete route.
    async fn soft_delete(&self, model: &ModelName, id: &EntityId) -> Result<(), StockroomError>;

    /// Restores a soft-deleted entity. Restoring an active entity is not an error.
    async fn restore(&self, model: &ModelName, id: &EntityId) -> Result<Entity, StockroomError>;

    /// Permanently removes an entity. Never retried.
    async fn force_delete(&self, model: &ModelName, id: &EntityId) -> Result<(), StockroomError>;

    /// Restores many entities; `ids` must not be empty.
    async fn bulk_restore(
        &self,
        model: &ModelName,
        ids: &BTreeSet<EntityId>,
    ) -> Result<BulkOutcome, StockroomError>;

    /// Permanently removes many entities; `ids` must not be empty.
    async fn bulk_force_delete(
        &self,
        model: &ModelName,
        ids: &BTreeSet<EntityId>,
    ) -> Result<BulkOutcome, StockroomError>;

    /// Creates an entity from a validated form.
    async fn create(&self, form: &EntityForm) -> Result<Entity, StockroomError>;

    /// Updates an entity from a validated form.
    async fn update(&self, id: &EntityId, form: &EntityForm) -> Result<Entity, StockroomError>;

    /// Dispatches to [`list_active`](Self::list_active) or
    /// [`list_trash`](Self::list_trash) by the query's scope.
    async fn list(&self, query: &ListQuery) -> Result<ListResult, StockroomError> {
        match query.scope {
            crate::types::Scope::Active => self.list_active(query).await,
            crate::types::Scope::Trash => self.list_trash(query).await,
        }
    }
}
