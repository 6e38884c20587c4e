// SPDX-FileCopyrightText: 2026 Stockroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide cache of list results keyed by [`ListQuery`].

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use stockroom_core::{ListQuery, ListResult, ModelName, ResourceClient, Scope, StockroomError};
use tokio::sync::Mutex;
use tracing::debug;

type FetchResult = Result<Arc<ListResult>, StockroomError>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

/// A cached list result together with its staleness marker.
#[derive(Debug, Clone)]
pub struct CachedList {
    pub result: Arc<ListResult>,
    pub stale: bool,
}

#[derive(Default)]
struct Slot {
    result: Option<Arc<ListResult>>,
    /// Version the stored result was fetched under.
    result_version: u64,
    stale: bool,
    /// Bumped by every invalidation that touches this slot.
    version: u64,
    inflight: Option<InFlight>,
}

/// A fetch in progress and the slot version it started under.
struct InFlight {
    version: u64,
    fetch: SharedFetch,
}

#[derive(Default)]
struct CacheState {
    slots: HashMap<ListQuery, Slot>,
    /// Bumped by `invalidate_all`; fetches started under an older epoch
    /// never write back.
    epoch: u64,
}

/// Caches list results and de-duplicates concurrent identical fetches.
///
/// While a fetch is outstanding its shared future sits in the slot, so a
/// second `get` for an equal query awaits the same call instead of
/// issuing another one. The lock is never held across the network await.
pub struct QueryCache {
    client: Arc<dyn ResourceClient>,
    enabled: bool,
    state: Arc<Mutex<CacheState>>,
}

impl QueryCache {
    pub fn new(client: Arc<dyn ResourceClient>) -> Self {
        Self {
            client,
            enabled: true,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    /// Disables serving from cache; identical concurrent fetches are still shared.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The resource client fetches go through.
    pub fn client(&self) -> &Arc<dyn ResourceClient> {
        &self.client
    }

    /// Returns the cached result for `query` when fresh, otherwise fetches it.
    pub async fn get(&self, query: &ListQuery) -> Result<Arc<ListResult>, StockroomError> {
        query.validate()?;

        let fetch = {
            let mut state = self.state.lock().await;
            let epoch = state.epoch;
            let slot = state.slots.entry(query.clone()).or_default();

            if self.enabled
                && !slot.stale
                && let Some(result) = &slot.result
            {
                debug!(model = %query.model, scope = %query.scope, page = query.page, "cache hit");
                return Ok(Arc::clone(result));
            }

            // A fetch that started before the latest invalidation may carry
            // pre-write data, so only a fetch of the current version is joined.
            match &slot.inflight {
                Some(inflight) if inflight.version == slot.version => {
                    debug!(model = %query.model, scope = %query.scope, "joining in-flight fetch");
                    inflight.fetch.clone()
                }
                _ => {
                    let version = slot.version;
                    let fetch = self.start_fetch(query.clone(), version, epoch);
                    slot.inflight = Some(InFlight {
                        version,
                        fetch: fetch.clone(),
                    });
                    fetch
                }
            }
        };

        fetch.await
    }

    /// Returns whatever is cached for `query` without any I/O.
    pub async fn peek(&self, query: &ListQuery) -> Option<CachedList> {
        let state = self.state.lock().await;
        let slot = state.slots.get(query)?;
        slot.result.as_ref().map(|result| CachedList {
            result: Arc::clone(result),
            stale: slot.stale,
        })
    }

    /// Marks every entry for `model` (optionally only `scope`) stale.
    ///
    /// Entries are kept so they can still be shown while revalidating.
    pub async fn invalidate(&self, model: &ModelName, scope: Option<Scope>) {
        let mut state = self.state.lock().await;
        let mut touched = 0usize;
        for (query, slot) in state.slots.iter_mut() {
            if &query.model == model && scope.is_none_or(|s| s == query.scope) {
                slot.stale = true;
                slot.version += 1;
                touched += 1;
            }
        }
        debug!(model = %model, scope = ?scope, touched, "cache invalidated");
    }

    /// Invalidates both scopes of `model`; every write goes through this.
    pub async fn invalidate_for_write(&self, model: &ModelName) {
        self.invalidate(model, None).await;
    }

    /// Drops every entry, e.g. on sign-out.
    pub async fn invalidate_all(&self) {
        let mut state = self.state.lock().await;
        let dropped = state.slots.len();
        state.slots.clear();
        state.epoch += 1;
        debug!(dropped, "cache cleared");
    }

    fn start_fetch(&self, query: ListQuery, version: u64, epoch: u64) -> SharedFetch {
        let client = Arc::clone(&self.client);
        let state = Arc::clone(&self.state);

        async move {
            debug!(model = %query.model, scope = %query.scope, page = query.page, "fetching list");
            let outcome = client.list(&query).await.map(Arc::new);

            let mut state = state.lock().await;
            if state.epoch != epoch {
                debug!(model = %query.model, "cache cleared during fetch, result not stored");
                return outcome;
            }
            if let Some(slot) = state.slots.get_mut(&query) {
                if slot
                    .inflight
                    .as_ref()
                    .is_some_and(|inflight| inflight.version == version)
                {
                    slot.inflight = None;
                }
                // A failed fetch leaves the previous result untouched, and an
                // older fetch never overwrites a newer one.
                if let Ok(result) = &outcome
                    && (slot.result.is_none() || version >= slot.result_version)
                {
                    slot.result = Some(Arc::clone(result));
                    slot.result_version = version;
                    slot.stale = slot.version != version;
                } else if outcome.is_ok() {
                    debug!(model = %query.model, version, "older fetch result not stored");
                }
            }
            outcome
        }
        .boxed()
        .shared()
    }
}
