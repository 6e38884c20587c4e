// SPDX-FileCopyrightText: 2026 Stockroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Soft-delete workflow controller.
//!
//! Orchestrates list loading and the delete, notify, undo, restore cycle
//! on top of the shared [`QueryCache`]. Every write removes its ids from
//! the view optimistically, invalidates both scopes of the model on
//! success, and reports its outcome through the [`Notifier`].

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use stockroom_cache::QueryCache;
use stockroom_config::model::WorkflowConfig;
use stockroom_core::types::DEFAULT_PAGE_SIZE;
use stockroom_core::{
    BulkOutcome, Entity, EntityId, ListQuery, ModelName, OperationKind, ResourceClient, Scope,
    StockroomError,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::notify::Notifier;
use crate::pending::PendingRegistry;
use crate::undo::UndoHandle;
use crate::view::{ListView, ViewSnapshot};

/// Default time an undo stays available after a soft delete.
pub const DEFAULT_UNDO_WINDOW: Duration = Duration::from_secs(5);

/// Tunables of the workflow controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowOptions {
    pub undo_window: Duration,
    pub default_page_size: u32,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            undo_window: DEFAULT_UNDO_WINDOW,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl From<&WorkflowConfig> for WorkflowOptions {
    fn from(config: &WorkflowConfig) -> Self {
        Self {
            undo_window: Duration::from_secs(config.undo_window_secs),
            default_page_size: config.default_page_size,
        }
    }
}

/// Drives list views and the mutations issued from them.
///
/// Cheap to clone; clones share the pending-operation registry.
#[derive(Clone)]
pub struct SoftDeleteController {
    inner: Arc<ControllerInner>,
}

pub(crate) struct ControllerInner {
    cache: Arc<QueryCache>,
    notifier: Arc<dyn Notifier>,
    pending: PendingRegistry,
    options: WorkflowOptions,
}

/// An optimistic removal in progress.
struct Mutation {
    op: Uuid,
    model: ModelName,
    ids: BTreeSet<EntityId>,
    taken: Vec<(Entity, usize)>,
}

impl SoftDeleteController {
    pub fn new(
        cache: Arc<QueryCache>,
        notifier: Arc<dyn Notifier>,
        options: WorkflowOptions,
    ) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                cache,
                notifier,
                pending: PendingRegistry::new(),
                options,
            }),
        }
    }

    pub fn from_config(
        cache: Arc<QueryCache>,
        notifier: Arc<dyn Notifier>,
        config: &WorkflowConfig,
    ) -> Self {
        Self::new(cache, notifier, WorkflowOptions::from(config))
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.inner.cache
    }

    pub fn options(&self) -> WorkflowOptions {
        self.inner.options
    }

    /// Number of mutations issued and not yet reported.
    pub async fn pending_count(&self) -> usize {
        self.inner.pending.len().await
    }

    /// Opens a view on `query`. Nothing is fetched until [`load`](Self::load).
    pub fn open_view(&self, query: ListQuery) -> Result<ListView, StockroomError> {
        query.validate()?;
        debug!(model = %query.model, scope = %query.scope, "view opened");
        Ok(ListView::new(query))
    }

    /// Opens the first page of `model` in `scope` with the configured page size.
    pub fn open(&self, model: ModelName, scope: Scope) -> ListView {
        ListView::new(
            ListQuery::new(model, scope).with_page_size(self.inner.options.default_page_size),
        )
    }

    /// Fetches the view's current query through the cache.
    ///
    /// A result that arrives after a newer load started, or after the
    /// view was disposed, is discarded.
    pub async fn load(&self, view: &ListView) -> Result<(), StockroomError> {
        self.inner.load(view).await
    }

    /// Moves to `page` and reloads.
    pub async fn set_page(&self, view: &ListView, page: u32) -> Result<(), StockroomError> {
        {
            let mut state = view.lock().await;
            let query = state.query().clone().with_page(page);
            query.validate()?;
            *state.query_mut() = query;
        }
        self.load(view).await
    }

    /// Replaces the filters, resets to the first page, and reloads.
    pub async fn set_filters(
        &self,
        view: &ListView,
        filters: BTreeMap<String, String>,
    ) -> Result<(), StockroomError> {
        {
            let mut state = view.lock().await;
            let mut query = state.query().clone().with_page(1);
            query.filters = filters;
            query.validate()?;
            *state.query_mut() = query;
        }
        self.load(view).await
    }

    /// Tears the view down. Outstanding fetches are abandoned; mutations
    /// already issued still run to completion.
    pub async fn dispose(&self, view: &ListView) {
        view.dispose().await;
        debug!(model = %view.model(), scope = %view.scope(), "view disposed");
    }

    pub async fn snapshot(&self, view: &ListView) -> ViewSnapshot {
        view.snapshot().await
    }

    /// Moves one entity of an active view to the trash.
    ///
    /// On success the returned handle (also passed to the notifier) can
    /// undo the delete within the configured window.
    ///
    /// Mutations run on their own task: once issued they are settled,
    /// reported, and cleared even if the returned future is dropped.
    pub async fn soft_delete(
        &self,
        view: &ListView,
        id: &EntityId,
    ) -> Result<UndoHandle, StockroomError> {
        let inner = Arc::clone(&self.inner);
        let (view, id) = (view.clone(), id.clone());
        detached(async move { inner.soft_delete(&view, &id).await }).await
    }

    /// Restores one entity of a trash view.
    pub async fn restore(&self, view: &ListView, id: &EntityId) -> Result<Entity, StockroomError> {
        let inner = Arc::clone(&self.inner);
        let (view, id) = (view.clone(), id.clone());
        detached(async move { inner.restore(&view, &id).await }).await
    }

    /// Permanently deletes one entity of a trash view. There is no undo.
    pub async fn force_delete(&self, view: &ListView, id: &EntityId) -> Result<(), StockroomError> {
        let inner = Arc::clone(&self.inner);
        let (view, id) = (view.clone(), id.clone());
        detached(async move { inner.force_delete(&view, &id).await }).await
    }

    /// Restores several entities of a trash view.
    pub async fn bulk_restore(
        &self,
        view: &ListView,
        ids: &BTreeSet<EntityId>,
    ) -> Result<BulkOutcome, StockroomError> {
        let inner = Arc::clone(&self.inner);
        let (view, ids) = (view.clone(), ids.clone());
        detached(async move {
            inner
                .bulk(&view, OperationKind::BulkRestore, &ids, "restore", "restored")
                .await
        })
        .await
    }

    /// Permanently deletes several entities of a trash view.
    pub async fn bulk_force_delete(
        &self,
        view: &ListView,
        ids: &BTreeSet<EntityId>,
    ) -> Result<BulkOutcome, StockroomError> {
        let inner = Arc::clone(&self.inner);
        let (view, ids) = (view.clone(), ids.clone());
        detached(async move {
            inner
                .bulk(
                    &view,
                    OperationKind::BulkForceDelete,
                    &ids,
                    "permanently delete",
                    "permanently deleted",
                )
                .await
        })
        .await
    }
}

impl ControllerInner {
    async fn soft_delete(
        self: &Arc<Self>,
        view: &ListView,
        id: &EntityId,
    ) -> Result<UndoHandle, StockroomError> {
        let inner = self;
        let mutation = inner
            .begin(view, OperationKind::SoftDelete, single(id), Some(Scope::Active))
            .await?;
        let (entity, position) = mutation.first()?;

        let outcome = inner
            .call(&mutation, |client, model| async move {
                client.soft_delete(&model, id).await
            })
            .await;

        let result = match outcome {
            Ok(()) => {
                inner.settle_success(view, &mutation.ids).await;
                info!(model = %mutation.model, id = %id, "moved to trash");
                let handle = UndoHandle::new(
                    Arc::clone(inner),
                    view.clone(),
                    entity.clone(),
                    position,
                    inner.options.undo_window,
                );
                inner.notifier.notify_success(
                    "Moved to trash",
                    Some(&format!("{} was moved to trash", entity.label())),
                    inner.options.undo_window,
                    Some(handle.clone()),
                );
                Ok(handle)
            }
            Err(err) => {
                inner
                    .settle_failure(
                        view,
                        &mutation.ids,
                        &err,
                        &format!("Could not move {} to trash", entity.label()),
                    )
                    .await;
                Err(err)
            }
        };
        inner.pending.finish(mutation.op).await;
        result
    }

    async fn restore(
        self: &Arc<Self>,
        view: &ListView,
        id: &EntityId,
    ) -> Result<Entity, StockroomError> {
        let inner = self;
        let mutation = inner
            .begin(view, OperationKind::Restore, single(id), Some(Scope::Trash))
            .await?;
        let (entity, _) = mutation.first()?;

        let outcome = inner
            .call(&mutation, |client, model| async move {
                client.restore(&model, id).await
            })
            .await;

        let result = match outcome {
            Ok(restored) => {
                inner.settle_success(view, &mutation.ids).await;
                info!(model = %mutation.model, id = %id, "restored");
                inner.notifier.notify_success(
                    "Restored",
                    Some(&format!("{} was restored", entity.label())),
                    inner.options.undo_window,
                    None,
                );
                Ok(restored)
            }
            Err(err) => {
                inner
                    .settle_failure(
                        view,
                        &mutation.ids,
                        &err,
                        &format!("Could not restore {}", entity.label()),
                    )
                    .await;
                Err(err)
            }
        };
        inner.pending.finish(mutation.op).await;
        result
    }

    async fn force_delete(
        self: &Arc<Self>,
        view: &ListView,
        id: &EntityId,
    ) -> Result<(), StockroomError> {
        let inner = self;
        let mutation = inner
            .begin(view, OperationKind::ForceDelete, single(id), Some(Scope::Trash))
            .await?;
        let (entity, _) = mutation.first()?;

        let outcome = inner
            .call(&mutation, |client, model| async move {
                client.force_delete(&model, id).await
            })
            .await;

        let result = match outcome {
            Ok(()) => {
                inner.settle_success(view, &mutation.ids).await;
                info!(model = %mutation.model, id = %id, "permanently deleted");
                inner.notifier.notify_success(
                    "Permanently deleted",
                    Some(&format!("{} was permanently deleted", entity.label())),
                    inner.options.undo_window,
                    None,
                );
                Ok(())
            }
            Err(err) => {
                inner
                    .settle_failure(
                        view,
                        &mutation.ids,
                        &err,
                        &format!("Could not permanently delete {}", entity.label()),
                    )
                    .await;
                Err(err)
            }
        };
        inner.pending.finish(mutation.op).await;
        result
    }

    async fn load(&self, view: &ListView) -> Result<(), StockroomError> {
        let (query, generation, show_cached) = {
            let mut state = view.lock().await;
            if state.is_disposed() {
                return Err(StockroomError::Validation("view is disposed".into()));
            }
            let generation = state.begin_load();
            (state.query().clone(), generation, !state.has_fetched())
        };

        // A first load shows whatever the cache holds while it revalidates.
        if show_cached && let Some(cached) = self.cache.peek(&query).await {
            let mut state = view.lock().await;
            if state.generation() == generation && !state.is_disposed() {
                state.show_cached(&cached.result, cached.stale);
            }
        }

        let token = view.cancel_token().clone();
        let outcome = tokio::select! {
            _ = token.cancelled() => {
                debug!(model = %query.model, scope = %query.scope, "view disposed, fetch abandoned");
                return Ok(());
            }
            outcome = self.cache.get(&query) => outcome,
        };

        let mut state = view.lock().await;
        if state.is_disposed() || state.generation() != generation {
            warn!(
                model = %query.model,
                scope = %query.scope,
                generation,
                current = state.generation(),
                disposed = state.is_disposed(),
                "discarding superseded list result"
            );
            return Ok(());
        }
        state.finish_load(outcome.as_ref().map(|result| &**result));
        outcome.map(|_| ())
    }

    /// Registers the operation and removes `ids` from the view.
    ///
    /// Rejections are reported to the notifier like any other failure.
    async fn begin(
        &self,
        view: &ListView,
        kind: OperationKind,
        ids: BTreeSet<EntityId>,
        scope: Option<Scope>,
    ) -> Result<Mutation, StockroomError> {
        let result = self.try_begin(view, kind, ids, scope).await;
        if let Err(err) = &result {
            warn!(model = %view.model(), kind = %kind, error = %err, "mutation rejected");
            let description = format!("The {kind} request was rejected");
            self.notifier
                .notify_error(&err.user_message(), Some(&description));
        }
        result
    }

    async fn try_begin(
        &self,
        view: &ListView,
        kind: OperationKind,
        ids: BTreeSet<EntityId>,
        scope: Option<Scope>,
    ) -> Result<Mutation, StockroomError> {
        if let Some(scope) = scope
            && view.scope() != scope
        {
            return Err(StockroomError::Validation(format!(
                "{kind} is only available from the {scope} view"
            )));
        }
        if ids.is_empty() {
            return Err(StockroomError::Validation(format!(
                "{kind} requires at least one id"
            )));
        }

        let model = view.model().clone();
        let op = self.pending.begin(kind, &model, ids.clone()).await?;

        let taken = {
            let mut state = view.lock().await;
            if state.is_disposed() {
                Err(StockroomError::Validation("view is disposed".into()))
            } else {
                state.take_optimistic(&ids)
            }
        };
        match taken {
            Ok(taken) => Ok(Mutation {
                op,
                model,
                ids,
                taken,
            }),
            Err(err) => {
                self.pending.finish(op).await;
                Err(err)
            }
        }
    }

    /// Issues the backend call, records its outcome, and invalidates the
    /// model's cache on success.
    async fn call<T, F, Fut>(&self, mutation: &Mutation, f: F) -> Result<T, StockroomError>
    where
        F: FnOnce(Arc<dyn ResourceClient>, ModelName) -> Fut,
        Fut: Future<Output = Result<T, StockroomError>>,
    {
        let client = Arc::clone(self.cache.client());
        let outcome = f(client, mutation.model.clone()).await;
        self.pending.complete(mutation.op, outcome.is_ok()).await;
        if outcome.is_ok() {
            self.cache.invalidate_for_write(&mutation.model).await;
        }
        outcome
    }

    async fn settle_success(&self, view: &ListView, ids: &BTreeSet<EntityId>) {
        let mut state = view.lock().await;
        if !state.is_disposed() {
            state.settle(ids, &BTreeMap::new(), None);
        }
    }

    async fn settle_failure(
        &self,
        view: &ListView,
        ids: &BTreeSet<EntityId>,
        err: &StockroomError,
        description: &str,
    ) {
        let message = err.user_message();
        {
            let mut state = view.lock().await;
            if !state.is_disposed() {
                let failed = ids.iter().map(|id| (id.clone(), message.clone())).collect();
                state.settle(&BTreeSet::new(), &failed, Some(message.clone()));
            }
        }
        warn!(model = %view.model(), error = %err, "{description}");
        self.notifier.notify_error(&message, Some(description));
    }

    async fn bulk(
        &self,
        view: &ListView,
        kind: OperationKind,
        ids: &BTreeSet<EntityId>,
        action: &str,
        done: &str,
    ) -> Result<BulkOutcome, StockroomError> {
        let mutation = self.begin(view, kind, ids.clone(), Some(Scope::Trash)).await?;

        let outcome = self
            .call(&mutation, |client, model| async move {
                match kind {
                    OperationKind::BulkForceDelete => client.bulk_force_delete(&model, ids).await,
                    _ => client.bulk_restore(&model, ids).await,
                }
            })
            .await;

        let result = match outcome {
            Ok(mut outcome) => {
                // Ids the server did not mention are treated as failed.
                for id in ids {
                    if !outcome.succeeded.contains(id) && !outcome.failed.contains_key(id) {
                        outcome
                            .failed
                            .insert(id.clone(), "no outcome reported".to_string());
                    }
                }
                self.report_bulk(view, &outcome, action, done).await;
                Ok(outcome)
            }
            Err(err) => {
                let description = format!("Could not {action} {} items", ids.len());
                self.settle_failure(view, ids, &err, &description).await;
                Err(err)
            }
        };
        self.pending.finish(mutation.op).await;
        result
    }

    async fn report_bulk(&self, view: &ListView, outcome: &BulkOutcome, action: &str, done: &str) {
        let reasons = outcome
            .failed
            .iter()
            .map(|(id, reason)| format!("{id}: {reason}"))
            .collect::<Vec<_>>()
            .join("\n");
        let total_failure = outcome.succeeded.is_empty();

        {
            let mut state = view.lock().await;
            if !state.is_disposed() {
                let error = total_failure.then(|| format!("Could not {action} any item"));
                state.settle(&outcome.succeeded, &outcome.failed, error);
            }
        }

        if total_failure {
            warn!(model = %view.model(), action, failed = outcome.failed.len(), "bulk mutation failed");
            self.notifier.notify_error(
                &format!("Could not {action} {} items", outcome.failed.len()),
                Some(&reasons),
            );
        } else if outcome.failed.is_empty() {
            info!(model = %view.model(), action, succeeded = outcome.succeeded.len(), "bulk mutation completed");
            self.notifier.notify_success(
                &format!("{} items {done}", outcome.succeeded.len()),
                None,
                self.options.undo_window,
                None,
            );
        } else {
            warn!(
                model = %view.model(),
                action,
                succeeded = outcome.succeeded.len(),
                failed = outcome.failed.len(),
                "bulk mutation partially failed"
            );
            self.notifier.notify_success(
                &format!(
                    "{} succeeded, {} failed",
                    outcome.succeeded.len(),
                    outcome.failed.len()
                ),
                Some(&reasons),
                self.options.undo_window,
                None,
            );
        }
    }

    /// Restores a soft-deleted entity on behalf of an [`UndoHandle`].
    pub(crate) async fn undo_soft_delete(
        &self,
        view: &ListView,
        entity: &Entity,
        position: usize,
    ) -> Result<Entity, StockroomError> {
        let model = view.model().clone();
        let id = entity.id().clone();
        let op = match self
            .pending
            .begin(OperationKind::Restore, &model, single(&id))
            .await
        {
            Ok(op) => op,
            Err(err) => {
                self.notifier.notify_error(
                    &err.user_message(),
                    Some(&format!("Could not restore {}", entity.label())),
                );
                return Err(err);
            }
        };

        let client = Arc::clone(self.cache.client());
        let outcome = client.restore(&model, &id).await;
        self.pending.complete(op, outcome.is_ok()).await;

        let result = match outcome {
            Ok(restored) => {
                self.cache.invalidate_for_write(&model).await;
                // A bare acknowledgement carries no fields; keep the shown copy.
                let mut shown = if restored.fields().is_empty() {
                    entity.clone()
                } else {
                    restored.clone()
                };
                shown.mark_restored();
                {
                    let mut state = view.lock().await;
                    if !state.is_disposed() {
                        state.reinsert(shown, position);
                    }
                }
                info!(model = %model, id = %id, "soft delete undone");
                self.notifier.notify_success(
                    "Restored",
                    Some(&format!("{} was restored", entity.label())),
                    self.options.undo_window,
                    None,
                );
                Ok(restored)
            }
            Err(err) => {
                warn!(model = %model, id = %id, error = %err, "undo failed");
                self.notifier.notify_error(
                    &err.user_message(),
                    Some(&format!("Could not restore {}", entity.label())),
                );
                Err(err)
            }
        };
        self.pending.finish(op).await;
        result
    }
}

impl Mutation {
    fn first(&self) -> Result<(Entity, usize), StockroomError> {
        self.taken
            .first()
            .cloned()
            .ok_or_else(|| StockroomError::Internal("mutation removed no entity".into()))
    }
}

fn single(id: &EntityId) -> BTreeSet<EntityId> {
    BTreeSet::from([id.clone()])
}

/// Awaits a mutation spawned onto its own task.
pub(crate) async fn detached<T>(
    task: impl Future<Output = Result<T, StockroomError>> + Send + 'static,
) -> Result<T, StockroomError>
where
    T: Send + 'static,
{
    tokio::spawn(task).await.unwrap_or_else(|err| {
        Err(StockroomError::Internal(format!("mutation task failed: {err}")))
    })
}
