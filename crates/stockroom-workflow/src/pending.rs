// SPDX-FileCopyrightText: 2026 Stockroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry of in-flight mutations; at most one per (model, id).

use std::collections::{BTreeSet, HashMap};

use stockroom_core::{
    EntityId, ModelName, OperationKind, OperationState, PendingOperation, StockroomError,
};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// Tracks mutating calls from issue until their outcome is reported.
#[derive(Debug, Default)]
pub struct PendingRegistry {
    ops: Mutex<HashMap<Uuid, PendingOperation>>,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new in-flight operation.
    ///
    /// The whole request is rejected with [`StockroomError::Conflict`] if
    /// any of `ids` is already under mutation for `model`.
    pub async fn begin(
        &self,
        kind: OperationKind,
        model: &ModelName,
        ids: BTreeSet<EntityId>,
    ) -> Result<Uuid, StockroomError> {
        let mut ops = self.ops.lock().await;

        let busy: BTreeSet<&EntityId> = ops
            .values()
            .filter(|op| op.state == OperationState::InFlight && &op.model == model)
            .flat_map(|op| op.ids.intersection(&ids))
            .collect();
        if !busy.is_empty() {
            return Err(StockroomError::Conflict {
                model: model.to_string(),
                ids: busy.into_iter().map(ToString::to_string).collect(),
            });
        }

        let op = PendingOperation::new(kind, model.clone(), ids);
        let id = op.id;
        debug!(op = %id, kind = %kind, model = %model, count = op.ids.len(), "mutation issued");
        ops.insert(id, op);
        Ok(id)
    }

    /// Records the server's answer for an operation.
    pub async fn complete(&self, id: Uuid, succeeded: bool) {
        if let Some(op) = self.ops.lock().await.get_mut(&id) {
            op.state = if succeeded {
                OperationState::Succeeded
            } else {
                OperationState::Failed
            };
        }
    }

    /// Drops an operation once its outcome has been reported.
    pub async fn finish(&self, id: Uuid) -> Option<PendingOperation> {
        self.ops.lock().await.remove(&id)
    }

    /// Ids of `model` currently under mutation.
    pub async fn in_flight(&self, model: &ModelName) -> BTreeSet<EntityId> {
        self.ops
            .lock()
            .await
            .values()
            .filter(|op| op.state == OperationState::InFlight && &op.model == model)
            .flat_map(|op| op.ids.iter().cloned())
            .collect()
    }

    /// Number of tracked operations, reported or not.
    pub async fn len(&self) -> usize {
        self.ops.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.ops.lock().await.is_empty()
    }
}
