// SPDX-FileCopyrightText: 2026 Stockroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-view list state: the state machine, optimistic edits, and
//! reconciliation against fetched pages.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use stockroom_core::{
    Entity, EntityId, ListMeta, ListQuery, ListResult, ModelName, Scope, StockroomError,
};
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

/// States of a list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStatus {
    /// Nothing fetched yet.
    Idle,
    /// A list call is outstanding.
    Loading,
    /// The last result is shown and no mutation is pending.
    Ready,
    /// At least one mutation on this view is outstanding.
    Mutating,
    /// The last operation failed; the previous items stay visible.
    Error,
}

impl std::fmt::Display for ViewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewStatus::Idle => write!(f, "idle"),
            ViewStatus::Loading => write!(f, "loading"),
            ViewStatus::Ready => write!(f, "ready"),
            ViewStatus::Mutating => write!(f, "mutating"),
            ViewStatus::Error => write!(f, "error"),
        }
    }
}

/// Read-only copy of a view's state at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    pub status: ViewStatus,
    pub query: ListQuery,
    pub items: Vec<Entity>,
    pub meta: ListMeta,
    /// User-facing message of the last failure, cleared by a successful load.
    pub last_error: Option<String>,
    /// Per-id failure reasons shown next to rows.
    pub annotations: BTreeMap<EntityId, String>,
    /// Ids removed optimistically and awaiting their mutation's outcome.
    pub in_flight: BTreeSet<EntityId>,
    /// The items came from a cache entry already marked stale.
    pub stale: bool,
    pub disposed: bool,
}

impl ViewSnapshot {
    pub fn ids(&self) -> Vec<EntityId> {
        self.items.iter().map(|e| e.id().clone()).collect()
    }
}

/// An entity removed optimistically, kept until its mutation resolves.
#[derive(Debug, Clone)]
pub(crate) struct Stashed {
    pub(crate) entity: Entity,
    pub(crate) position: usize,
    /// Whether the freshest fetch still lists this id.
    pub(crate) present_in_latest: bool,
}

#[derive(Debug)]
pub(crate) struct ViewState {
    status: ViewStatus,
    query: ListQuery,
    items: Vec<Entity>,
    meta: ListMeta,
    last_error: Option<String>,
    annotations: BTreeMap<EntityId, String>,
    stash: HashMap<EntityId, Stashed>,
    generation: u64,
    loading: bool,
    stale: bool,
    /// Set once any page has been applied.
    fetched: bool,
    disposed: bool,
}

impl ViewState {
    fn new(query: ListQuery) -> Self {
        Self {
            status: ViewStatus::Idle,
            query,
            items: Vec::new(),
            meta: ListMeta::default(),
            last_error: None,
            annotations: BTreeMap::new(),
            stash: HashMap::new(),
            generation: 0,
            loading: false,
            stale: false,
            fetched: false,
            disposed: false,
        }
    }

    pub(crate) fn query(&self) -> &ListQuery {
        &self.query
    }

    pub(crate) fn query_mut(&mut self) -> &mut ListQuery {
        &mut self.query
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn has_fetched(&self) -> bool {
        self.fetched
    }

    /// Starts a new load and returns its generation.
    pub(crate) fn begin_load(&mut self) -> u64 {
        self.generation += 1;
        self.loading = true;
        self.status = ViewStatus::Loading;
        self.generation
    }

    /// Shows a cached page while a load is revalidating it.
    pub(crate) fn show_cached(&mut self, result: &ListResult, stale: bool) {
        self.apply_fetch(result);
        self.stale = stale;
    }

    /// Replaces the items with a fetched page.
    ///
    /// Ids under mutation keep their optimistic state; only their
    /// membership in the latest fetch is recorded.
    pub(crate) fn apply_fetch(&mut self, result: &ListResult) {
        for (id, stashed) in self.stash.iter_mut() {
            stashed.present_in_latest = result.contains(id);
        }
        self.items = result
            .items
            .iter()
            .filter(|e| !self.stash.contains_key(e.id()))
            .cloned()
            .collect();
        self.meta = result.meta;
        self.stale = false;
        self.fetched = true;

        let visible: BTreeSet<&EntityId> = self.items.iter().map(Entity::id).collect();
        self.annotations.retain(|id, _| visible.contains(id));
    }

    pub(crate) fn finish_load(&mut self, result: Result<&ListResult, &StockroomError>) {
        self.loading = false;
        match result {
            Ok(result) => {
                self.apply_fetch(result);
                self.last_error = None;
                self.settle_status();
            }
            Err(err) => {
                self.last_error = Some(err.user_message());
                self.status = ViewStatus::Error;
            }
        }
    }

    /// Removes `ids` optimistically, stashing each entity with its position.
    ///
    /// Fails without touching the view if any id is not currently shown.
    pub(crate) fn take_optimistic(
        &mut self,
        ids: &BTreeSet<EntityId>,
    ) -> Result<Vec<(Entity, usize)>, StockroomError> {
        let mut positions: Vec<usize> = Vec::with_capacity(ids.len());
        let mut missing = Vec::new();
        for id in ids {
            match self.items.iter().position(|e| e.id() == id) {
                Some(pos) => positions.push(pos),
                None => missing.push(id.to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(StockroomError::Validation(format!(
                "not in the current {} view: {}",
                self.query.scope,
                missing.join(", ")
            )));
        }

        // Highest index first so the recorded positions are the original ones.
        positions.sort_unstable_by(|a, b| b.cmp(a));
        let mut taken = Vec::with_capacity(positions.len());
        for position in positions {
            let entity = self.items.remove(position);
            self.annotations.remove(entity.id());
            self.stash.insert(
                entity.id().clone(),
                Stashed {
                    entity: entity.clone(),
                    position,
                    present_in_latest: true,
                },
            );
            taken.push((entity, position));
        }
        taken.reverse();
        self.status = ViewStatus::Mutating;
        Ok(taken)
    }

    /// Resolves optimistic removals against a mutation's outcome.
    ///
    /// Ids in `succeeded` stay removed. Ids in `failed` are put back at
    /// their old position, if the latest fetch still lists them, and
    /// annotated with their reason. `error` moves the view to `Error`.
    pub(crate) fn settle(
        &mut self,
        succeeded: &BTreeSet<EntityId>,
        failed: &BTreeMap<EntityId, String>,
        error: Option<String>,
    ) {
        for id in succeeded {
            self.stash.remove(id);
        }

        let mut returning: Vec<Stashed> = failed
            .keys()
            .filter_map(|id| self.stash.remove(id))
            .collect();
        returning.sort_by_key(|s| s.position);
        for stashed in returning {
            if !stashed.present_in_latest
                || self.items.iter().any(|e| e.id() == stashed.entity.id())
            {
                continue;
            }
            let position = stashed.position.min(self.items.len());
            self.items.insert(position, stashed.entity);
        }
        for (id, reason) in failed {
            if self.items.iter().any(|e| e.id() == id) {
                self.annotations.insert(id.clone(), reason.clone());
            }
        }

        match error {
            Some(message) => {
                self.last_error = Some(message);
                self.status = ViewStatus::Error;
            }
            None => self.settle_status(),
        }
    }

    /// Puts a restored entity back, e.g. after an undo.
    pub(crate) fn reinsert(&mut self, entity: Entity, position: usize) {
        if self.items.iter().any(|e| e.id() == entity.id()) {
            return;
        }
        let position = position.min(self.items.len());
        self.items.insert(position, entity);
    }

    fn settle_status(&mut self) {
        self.status = if self.loading {
            ViewStatus::Loading
        } else if !self.stash.is_empty() {
            ViewStatus::Mutating
        } else {
            ViewStatus::Ready
        };
    }

    fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            status: self.status,
            query: self.query.clone(),
            items: self.items.clone(),
            meta: self.meta,
            last_error: self.last_error.clone(),
            annotations: self.annotations.clone(),
            in_flight: self.stash.keys().cloned().collect(),
            stale: self.stale,
            disposed: self.disposed,
        }
    }
}

/// Handle to one observed list (a query with a scope).
///
/// Cloning the handle shares the same view.
#[derive(Debug, Clone)]
pub struct ListView {
    model: ModelName,
    scope: Scope,
    cancel: CancellationToken,
    state: Arc<Mutex<ViewState>>,
}

impl ListView {
    pub(crate) fn new(query: ListQuery) -> Self {
        Self {
            model: query.model.clone(),
            scope: query.scope,
            cancel: CancellationToken::new(),
            state: Arc::new(Mutex::new(ViewState::new(query))),
        }
    }

    pub fn model(&self) -> &ModelName {
        &self.model
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub async fn snapshot(&self) -> ViewSnapshot {
        self.state.lock().await.snapshot()
    }

    pub async fn status(&self) -> ViewStatus {
        self.state.lock().await.status
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().await
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Marks the view disposed and aborts outstanding fetch awaits.
    pub(crate) async fn dispose(&self) {
        self.state.lock().await.disposed = true;
        self.cancel.cancel();
    }
}
