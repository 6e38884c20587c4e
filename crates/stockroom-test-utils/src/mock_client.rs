// SPDX-FileCopyrightText: 2026 Stockroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory backend implementing `ResourceClient` for deterministic tests.
//!
//! `MockResourceClient` keeps a per-model entity store with the backend's
//! soft-delete semantics, counts calls, can fail scripted calls, and can
//! hold calls in flight behind a [`Gate`] so tests can observe
//! intermediate states.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use stockroom_core::{
    BulkOutcome, Entity, EntityForm, EntityId, ListMeta, ListQuery, ListResult, ModelName,
    ResourceClient, Scope, StockroomError,
};
use tokio::sync::{Mutex, Notify, watch};

/// Kinds of calls the mock distinguishes for counting, failures, and gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockCall {
    List,
    SoftDelete,
    Restore,
    ForceDelete,
    BulkRestore,
    BulkForceDelete,
    Create,
    Update,
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub call: MockCall,
    pub model: ModelName,
    pub ids: BTreeSet<EntityId>,
    pub scope: Option<Scope>,
}

/// Holds calls of one kind until released.
///
/// Once released the gate stays open for every later call.
#[derive(Clone)]
pub struct Gate {
    inner: Arc<GateInner>,
}

struct GateInner {
    open: watch::Sender<bool>,
    arrived: Notify,
}

impl Gate {
    fn new() -> Self {
        let (open, _) = watch::channel(false);
        Self {
            inner: Arc::new(GateInner {
                open,
                arrived: Notify::new(),
            }),
        }
    }

    /// Lets every held and future call through.
    pub fn release(&self) {
        self.inner.open.send_replace(true);
    }

    /// Resolves once a call has reached the gate.
    pub async fn arrived(&self) {
        self.inner.arrived.notified().await;
    }

    async fn pass(&self) {
        self.inner.arrived.notify_one();
        let mut open = self.inner.open.subscribe();
        let _ = open.wait_for(|open| *open).await;
    }
}

#[derive(Default)]
struct MockState {
    store: HashMap<ModelName, Vec<Entity>>,
    failures: HashMap<MockCall, VecDeque<StockroomError>>,
    bulk_rejections: BTreeMap<EntityId, String>,
    gates: HashMap<MockCall, Gate>,
    log: Vec<RecordedCall>,
    reads_at_arrival: bool,
}

/// A scriptable in-memory backend.
#[derive(Default)]
pub struct MockResourceClient {
    state: Mutex<MockState>,
}

impl MockResourceClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store of `model` with `entities`, in order.
    ///
    /// # Panics
    ///
    /// Panics if `model` is not a valid model name.
    pub fn with_entities(mut self, model: &str, entities: Vec<Entity>) -> Self {
        let model = ModelName::new(model).expect("valid model name");
        self.state
            .get_mut()
            .store
            .entry(model)
            .or_default()
            .extend(entities);
        self
    }

    /// Evaluates list calls when they arrive instead of when they are
    /// released, like a server that is slow to respond. A held list then
    /// returns the data as it was before any later write.
    pub fn with_reads_at_arrival(mut self) -> Self {
        self.state.get_mut().reads_at_arrival = true;
        self
    }

    /// Makes the next call of kind `call` fail with `error`.
    pub async fn fail_next(&self, call: MockCall, error: StockroomError) {
        self.state
            .lock()
            .await
            .failures
            .entry(call)
            .or_default()
            .push_back(error);
    }

    /// Makes bulk calls report `id` as failed with `reason`.
    pub async fn reject_in_bulk(&self, id: impl Into<EntityId>, reason: &str) {
        self.state
            .lock()
            .await
            .bulk_rejections
            .insert(id.into(), reason.to_string());
    }

    /// Holds every call of kind `call` until the returned gate is released.
    pub async fn hold(&self, call: MockCall) -> Gate {
        let gate = Gate::new();
        self.state.lock().await.gates.insert(call, gate.clone());
        gate
    }

    /// Number of calls of kind `call` received so far.
    pub async fn calls(&self, call: MockCall) -> usize {
        self.state
            .lock()
            .await
            .log
            .iter()
            .filter(|c| c.call == call)
            .count()
    }

    pub async fn call_log(&self) -> Vec<RecordedCall> {
        self.state.lock().await.log.clone()
    }

    /// Current backend copy of an entity, if it exists.
    pub async fn entity(&self, model: &str, id: &str) -> Option<Entity> {
        let model = ModelName::new(model).ok()?;
        self.state
            .lock()
            .await
            .store
            .get(&model)?
            .iter()
            .find(|e| e.id().as_str() == id)
            .cloned()
    }

    /// Records the call, waits at its gate, then pops a scripted failure.
    async fn enter(
        &self,
        call: MockCall,
        model: &ModelName,
        ids: BTreeSet<EntityId>,
        scope: Option<Scope>,
    ) -> Result<(), StockroomError> {
        let gate = {
            let mut state = self.state.lock().await;
            state.log.push(RecordedCall {
                call,
                model: model.clone(),
                ids,
                scope,
            });
            state.gates.get(&call).cloned()
        };
        if let Some(gate) = gate {
            gate.pass().await;
        }

        let mut state = self.state.lock().await;
        match state.failures.get_mut(&call).and_then(VecDeque::pop_front) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn not_found(model: &ModelName, id: &EntityId) -> StockroomError {
    StockroomError::Backend {
        status_code: 404,
        message: format!("{model} {id} not found"),
    }
}

fn matches_filters(entity: &Entity, filters: &BTreeMap<String, String>) -> bool {
    filters.iter().all(|(field, value)| match entity.field(field) {
        Some(serde_json::Value::String(s)) => s == value,
        Some(other) => other.to_string() == *value,
        None => false,
    })
}

fn evaluate_list(state: &MockState, query: &ListQuery) -> ListResult {
    let matching = state
        .store
        .get(&query.model)
        .map(|entities| {
            entities
                .iter()
                .filter(|e| e.is_deleted() == (query.scope == Scope::Trash))
                .filter(|e| matches_filters(e, &query.filters))
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    page_of(query, matching)
}

fn page_of(query: &ListQuery, matching: Vec<Entity>) -> ListResult {
    let total = matching.len() as u64;
    let size = u64::from(query.page_size.max(1));
    let skip = (u64::from(query.page.max(1)) - 1) * size;
    let items = matching
        .into_iter()
        .skip(skip as usize)
        .take(size as usize)
        .collect();
    ListResult {
        query: query.clone(),
        items,
        meta: ListMeta {
            current: query.page,
            page_size: query.page_size,
            pages: total.div_ceil(size) as u32,
            total,
        },
    }
}

#[async_trait]
impl ResourceClient for MockResourceClient {
    async fn list_active(&self, query: &ListQuery) -> Result<ListResult, StockroomError> {
        self.list(query).await
    }

    async fn list_trash(&self, query: &ListQuery) -> Result<ListResult, StockroomError> {
        self.list(query).await
    }

    async fn list(&self, query: &ListQuery) -> Result<ListResult, StockroomError> {
        let early = {
            let state = self.state.lock().await;
            state.reads_at_arrival.then(|| evaluate_list(&state, query))
        };
        self.enter(MockCall::List, &query.model, BTreeSet::new(), Some(query.scope))
            .await?;
        match early {
            Some(result) => Ok(result),
            None => Ok(evaluate_list(&*self.state.lock().await, query)),
        }
    }

    async fn soft_delete(&self, model: &ModelName, id: &EntityId) -> Result<(), StockroomError> {
        self.enter(MockCall::SoftDelete, model, BTreeSet::from([id.clone()]), None)
            .await?;
        let mut state = self.state.lock().await;
        let entity = state
            .store
            .get_mut(model)
            .and_then(|entities| entities.iter_mut().find(|e| e.id() == id && !e.is_deleted()))
            .ok_or_else(|| not_found(model, id))?;
        entity.mark_deleted(Utc::now());
        Ok(())
    }

    async fn restore(&self, model: &ModelName, id: &EntityId) -> Result<Entity, StockroomError> {
        self.enter(MockCall::Restore, model, BTreeSet::from([id.clone()]), None)
            .await?;
        let mut state = self.state.lock().await;
        let entity = state
            .store
            .get_mut(model)
            .and_then(|entities| entities.iter_mut().find(|e| e.id() == id))
            .ok_or_else(|| not_found(model, id))?;
        entity.mark_restored();
        Ok(entity.clone())
    }

    async fn force_delete(&self, model: &ModelName, id: &EntityId) -> Result<(), StockroomError> {
        self.enter(MockCall::ForceDelete, model, BTreeSet::from([id.clone()]), None)
            .await?;
        let mut state = self.state.lock().await;
        let entities = state
            .store
            .get_mut(model)
            .ok_or_else(|| not_found(model, id))?;
        let before = entities.len();
        entities.retain(|e| e.id() != id);
        if entities.len() == before {
            return Err(not_found(model, id));
        }
        Ok(())
    }

    async fn bulk_restore(
        &self,
        model: &ModelName,
        ids: &BTreeSet<EntityId>,
    ) -> Result<BulkOutcome, StockroomError> {
        if ids.is_empty() {
            return Err(StockroomError::Validation(
                "bulk-restore requires at least one id".into(),
            ));
        }
        self.enter(MockCall::BulkRestore, model, ids.clone(), None)
            .await?;
        let mut state = self.state.lock().await;
        let rejections = state.bulk_rejections.clone();
        let mut outcome = BulkOutcome::default();
        for id in ids {
            if let Some(reason) = rejections.get(id) {
                outcome.failed.insert(id.clone(), reason.clone());
                continue;
            }
            let found = state
                .store
                .get_mut(model)
                .and_then(|entities| entities.iter_mut().find(|e| e.id() == id));
            match found {
                Some(entity) => {
                    entity.mark_restored();
                    outcome.succeeded.insert(id.clone());
                }
                None => {
                    outcome.failed.insert(id.clone(), "not found".into());
                }
            }
        }
        Ok(outcome)
    }

    async fn bulk_force_delete(
        &self,
        model: &ModelName,
        ids: &BTreeSet<EntityId>,
    ) -> Result<BulkOutcome, StockroomError> {
        if ids.is_empty() {
            return Err(StockroomError::Validation(
                "bulk-force-delete requires at least one id".into(),
            ));
        }
        self.enter(MockCall::BulkForceDelete, model, ids.clone(), None)
            .await?;
        let mut state = self.state.lock().await;
        let rejections = state.bulk_rejections.clone();
        let mut outcome = BulkOutcome::default();
        let entities = state.store.entry(model.clone()).or_default();
        for id in ids {
            if let Some(reason) = rejections.get(id) {
                outcome.failed.insert(id.clone(), reason.clone());
            } else if entities.iter().any(|e| e.id() == id) {
                entities.retain(|e| e.id() != id);
                outcome.succeeded.insert(id.clone());
            } else {
                outcome.failed.insert(id.clone(), "not found".into());
            }
        }
        Ok(outcome)
    }

    async fn create(&self, form: &EntityForm) -> Result<Entity, StockroomError> {
        form.validate()?;
        let model = form.model();
        self.enter(MockCall::Create, &model, BTreeSet::new(), None)
            .await?;
        let payload = form.payload()?;
        let mut state = self.state.lock().await;
        let entities = state.store.entry(model).or_default();
        let mut entity = Entity::new(format!("m{}", entities.len() + 1));
        if let serde_json::Value::Object(fields) = payload {
            for (name, value) in fields {
                entity = entity.with_field(&name, value);
            }
        }
        entities.push(entity.clone());
        Ok(entity)
    }

    async fn update(&self, id: &EntityId, form: &EntityForm) -> Result<Entity, StockroomError> {
        form.validate()?;
        let model = form.model();
        self.enter(MockCall::Update, &model, BTreeSet::from([id.clone()]), None)
            .await?;
        let payload = form.payload()?;
        let mut state = self.state.lock().await;
        let entity = state
            .store
            .get_mut(&model)
            .and_then(|entities| entities.iter_mut().find(|e| e.id() == id))
            .ok_or_else(|| not_found(&model, id))?;
        if let serde_json::Value::Object(fields) = payload {
            for (name, value) in fields {
                *entity = entity.clone().with_field(&name, value);
            }
        }
        Ok(entity.clone())
    }
}

/// A soft-deleted entity stamped now.
pub fn trashed(id: &str) -> Entity {
    let mut entity = Entity::new(id);
    entity.mark_deleted(Utc::now());
    entity
}
