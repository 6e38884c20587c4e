// SPDX-FileCopyrightText: 2026 Stockroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time-boxed, single-use undo of a soft delete.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use stockroom_core::{Entity, EntityId, StockroomError};
use tokio::time::Instant;
use tracing::debug;

use crate::controller::{ControllerInner, detached};
use crate::view::ListView;

/// Restores a soft-deleted entity when invoked within its window.
///
/// Clones share the same one-shot state: whichever clone is invoked
/// first wins, every later call is a no-op.
#[derive(Clone)]
pub struct UndoHandle {
    inner: Arc<UndoState>,
}

struct UndoState {
    controller: Arc<ControllerInner>,
    view: ListView,
    entity: Entity,
    position: usize,
    deadline: Instant,
    used: AtomicBool,
}

impl UndoHandle {
    pub(crate) fn new(
        controller: Arc<ControllerInner>,
        view: ListView,
        entity: Entity,
        position: usize,
        window: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(UndoState {
                controller,
                view,
                entity,
                position,
                deadline: Instant::now() + window,
                used: AtomicBool::new(false),
            }),
        }
    }

    pub fn entity_id(&self) -> &EntityId {
        self.inner.entity.id()
    }

    pub fn deadline(&self) -> Instant {
        self.inner.deadline
    }

    /// True while the handle can still be invoked.
    pub fn is_armed(&self) -> bool {
        !self.inner.used.load(Ordering::Acquire) && Instant::now() < self.inner.deadline
    }

    /// Restores the entity and puts it back into the active view.
    ///
    /// Returns `Ok(None)` once the window has passed or the handle was
    /// already used. A failed restore leaves the entity deleted and
    /// still consumes the handle.
    pub async fn invoke(&self) -> Result<Option<Entity>, StockroomError> {
        if Instant::now() >= self.inner.deadline {
            debug!(id = %self.entity_id(), "undo window expired");
            return Ok(None);
        }
        if self.inner.used.swap(true, Ordering::AcqRel) {
            debug!(id = %self.entity_id(), "undo already used");
            return Ok(None);
        }

        let state = Arc::clone(&self.inner);
        detached(async move {
            state
                .controller
                .undo_soft_delete(&state.view, &state.entity, state.position)
                .await
        })
        .await
        .map(Some)
    }
}

impl std::fmt::Debug for UndoHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UndoHandle")
            .field("model", self.inner.view.model())
            .field("id", self.entity_id())
            .field("deadline", &self.inner.deadline)
            .field("used", &self.inner.used.load(Ordering::Acquire))
            .finish()
    }
}
