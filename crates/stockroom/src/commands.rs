// SPDX-FileCopyrightText: 2026 Stockroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand implementations.
//!
//! Every mutation runs against a freshly loaded view of the page the ids
//! live on, the same way a dashboard table issues them. Failures are
//! reported through the [`ConsoleNotifier`] before they are returned.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use secrecy::SecretString;
use stockroom_cache::QueryCache;
use stockroom_client::HttpResourceClient;
use stockroom_config::StockroomConfig;
use stockroom_core::{
    AppState, BulkOutcome, EntityId, ListQuery, ModelName, Scope, Session, StockroomError,
};
use stockroom_workflow::{ListView, Notifier, SoftDeleteController};
use tracing::debug;

use crate::console::{ConsoleNotifier, render_view};

/// Which page of a list to open, and how.
#[derive(Debug, Clone, Default)]
pub struct PageSelector {
    pub page: u32,
    pub page_size: Option<u32>,
    pub filters: BTreeMap<String, String>,
}

impl PageSelector {
    pub fn page(page: u32) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }
}

/// Wired-up client stack for one CLI invocation.
pub struct App {
    controller: SoftDeleteController,
    notifier: Arc<ConsoleNotifier>,
    state: AppState,
    plain: bool,
}

impl App {
    pub fn from_config(config: &StockroomConfig, plain: bool) -> Result<Self, StockroomError> {
        let mut state = AppState::default();
        let mut client = HttpResourceClient::new(&config.api)?;
        if let Some(token) = &config.api.auth_token {
            let session = Session::new("admin", SecretString::from(token.clone()));
            client = client.with_bearer_token(session.token().clone());
            state.sign_in(session);
        }

        let cache = Arc::new(QueryCache::new(Arc::new(client)).with_enabled(config.cache.enabled));
        let notifier = Arc::new(ConsoleNotifier::new(plain));
        let controller = SoftDeleteController::from_config(
            cache,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
            &config.workflow,
        );

        Ok(Self {
            controller,
            notifier,
            state,
            plain,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Ends the session and drops every cached list fetched under it.
    /// Returns false if nobody was signed in.
    pub async fn sign_out(&mut self) -> bool {
        if !self.state.sign_out() {
            return false;
        }
        self.controller.cache().invalidate_all().await;
        debug!("signed out, cached lists cleared");
        true
    }

    /// Renders one page of `model` in `scope`.
    pub async fn list(
        &self,
        model: ModelName,
        scope: Scope,
        selector: PageSelector,
    ) -> Result<String, StockroomError> {
        let view = self.open_loaded(model, scope, selector).await?;
        let rendered = render_view(&view.snapshot().await, self.plain);
        self.controller.dispose(&view).await;
        Ok(rendered)
    }

    /// Moves an entity to the trash, optionally undoing it right away.
    pub async fn delete(
        &self,
        model: ModelName,
        id: EntityId,
        page: u32,
        undo: bool,
    ) -> Result<(), StockroomError> {
        let view = self
            .open_loaded(model, Scope::Active, PageSelector::page(page))
            .await?;
        let result = self.controller.soft_delete(&view, &id).await;

        let result = match result {
            Ok(handle) if undo => match handle.invoke().await {
                Ok(Some(_)) => Ok(()),
                Ok(None) => {
                    self.notifier.notify_error("Undo is no longer available", None);
                    Ok(())
                }
                Err(err) => Err(err),
            },
            Ok(_) => Ok(()),
            Err(err) => Err(err),
        };
        self.controller.dispose(&view).await;
        result
    }

    pub async fn restore(
        &self,
        model: ModelName,
        id: EntityId,
        page: u32,
    ) -> Result<(), StockroomError> {
        let view = self
            .open_loaded(model, Scope::Trash, PageSelector::page(page))
            .await?;
        let result = self.controller.restore(&view, &id).await.map(|_| ());
        self.controller.dispose(&view).await;
        result
    }

    pub async fn force_delete(
        &self,
        model: ModelName,
        id: EntityId,
        page: u32,
    ) -> Result<(), StockroomError> {
        let view = self
            .open_loaded(model, Scope::Trash, PageSelector::page(page))
            .await?;
        let result = self.controller.force_delete(&view, &id).await;
        self.controller.dispose(&view).await;
        result
    }

    pub async fn bulk_restore(
        &self,
        model: ModelName,
        ids: BTreeSet<EntityId>,
        page: u32,
    ) -> Result<BulkOutcome, StockroomError> {
        let view = self
            .open_loaded(model, Scope::Trash, PageSelector::page(page))
            .await?;
        let result = self.controller.bulk_restore(&view, &ids).await;
        self.controller.dispose(&view).await;
        result
    }

    pub async fn bulk_force_delete(
        &self,
        model: ModelName,
        ids: BTreeSet<EntityId>,
        page: u32,
    ) -> Result<BulkOutcome, StockroomError> {
        let view = self
            .open_loaded(model, Scope::Trash, PageSelector::page(page))
            .await?;
        let result = self.controller.bulk_force_delete(&view, &ids).await;
        self.controller.dispose(&view).await;
        result
    }

    async fn open_loaded(
        &self,
        model: ModelName,
        scope: Scope,
        selector: PageSelector,
    ) -> Result<ListView, StockroomError> {
        let page_size = selector
            .page_size
            .unwrap_or(self.controller.options().default_page_size);
        let mut query = ListQuery::new(model, scope)
            .with_page(selector.page)
            .with_page_size(page_size);
        query.filters = selector.filters;

        let view = match self.controller.open_view(query) {
            Ok(view) => view,
            Err(err) => {
                self.notifier.notify_error(&err.user_message(), None);
                return Err(err);
            }
        };
        debug!(model = %view.model(), scope = %view.scope(), "loading view");

        if let Err(err) = self.controller.load(&view).await {
            self.notifier.notify_error(
                &format!("Could not load {}", view.model()),
                Some(&err.user_message()),
            );
            self.controller.dispose(&view).await;
            return Err(err);
        }
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_config::model::ApiConfig;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app(server: &MockServer) -> App {
        let config = StockroomConfig {
            api: ApiConfig {
                base_url: server.uri(),
                max_retries: 0,
                retry_delay_ms: 1,
                auth_token: Some("tok-1".into()),
                ..ApiConfig::default()
            },
            ..StockroomConfig::default()
        };
        App::from_config(&config, true).unwrap()
    }

    fn brand() -> ModelName {
        ModelName::new("brand").unwrap()
    }

    async fn mount_list(server: &MockServer, route: &str, results: serde_json::Value) {
        let total = results.as_array().map_or(0, Vec::len);
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "statusCode": 200,
                "data": {
                    "meta": { "current": 1, "pageSize": 10, "pages": 1, "total": total },
                    "results": results
                }
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn list_renders_the_active_page() {
        let server = MockServer::start().await;
        mount_list(
            &server,
            "/api/v1/soft-delete/brand",
            serde_json::json!([
                { "_id": "a1", "name": "Acme" },
                { "_id": "a2", "name": "Globex" }
            ]),
        )
        .await;

        let out = app(&server)
            .list(brand(), Scope::Active, PageSelector::page(1))
            .await
            .unwrap();
        assert!(out.starts_with("brand (active)\n"));
        assert!(out.contains("a1"));
        assert!(out.contains("Globex"));
        assert!(out.ends_with("page 1/1 (2 total)\n"));
    }

    #[tokio::test]
    async fn configured_token_signs_in_and_authenticates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/soft-delete/brand/deleted"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "statusCode": 200,
                "data": {
                    "meta": { "current": 1, "pageSize": 10, "pages": 0, "total": 0 },
                    "results": []
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let app = app(&server);
        assert_eq!(app.state().bearer_token(), Some("tok-1"));
        let out = app
            .list(brand(), Scope::Trash, PageSelector::page(1))
            .await
            .unwrap();
        assert!(out.contains("(no items)"));
    }

    #[tokio::test]
    async fn sign_out_clears_session_and_cached_lists() {
        let server = MockServer::start().await;
        mount_list(
            &server,
            "/api/v1/soft-delete/brand",
            serde_json::json!([{ "_id": "a1", "name": "Acme" }]),
        )
        .await;

        let mut app = app(&server);
        app.list(brand(), Scope::Active, PageSelector::page(1))
            .await
            .unwrap();
        let page_size = app.controller.options().default_page_size;
        let query = ListQuery::active(brand()).with_page_size(page_size);
        assert!(app.controller.cache().peek(&query).await.is_some());

        assert!(app.sign_out().await);
        assert!(app.state().session().is_none());
        assert!(app.controller.cache().peek(&query).await.is_none());
        assert!(!app.sign_out().await);
    }

    #[tokio::test]
    async fn delete_then_undo_restores() {
        let server = MockServer::start().await;
        mount_list(
            &server,
            "/api/v1/soft-delete/brand",
            serde_json::json!([{ "_id": "a1", "name": "Acme" }]),
        )
        .await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/brand/a1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/api/v1/soft-delete/brand/a1/restore"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "statusCode": 200,
                "data": { "_id": "a1", "name": "Acme", "deleted": false }
            })))
            .expect(1)
            .mount(&server)
            .await;

        app(&server)
            .delete(brand(), EntityId::from("a1"), 1, true)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_leaves_no_reference_cycle_behind() {
        let server = MockServer::start().await;
        mount_list(
            &server,
            "/api/v1/soft-delete/brand",
            serde_json::json!([{ "_id": "a1", "name": "Acme" }]),
        )
        .await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/brand/a1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let app = app(&server);
        let notifier = Arc::downgrade(&app.notifier);
        app.delete(brand(), EntityId::from("a1"), 1, false)
            .await
            .unwrap();
        drop(app);
        assert!(notifier.upgrade().is_none(), "notifier outlived the app");
    }

    #[tokio::test]
    async fn restore_of_id_missing_from_trash_never_hits_network() {
        let server = MockServer::start().await;
        mount_list(&server, "/api/v1/soft-delete/brand/deleted", serde_json::json!([])).await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = app(&server)
            .restore(brand(), EntityId::from("zz"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, StockroomError::Validation(_)));
    }

    #[tokio::test]
    async fn bulk_force_delete_reports_partial_outcome() {
        let server = MockServer::start().await;
        mount_list(
            &server,
            "/api/v1/soft-delete/brand/deleted",
            serde_json::json!([
                { "_id": "a1", "deleted": true },
                { "_id": "a2", "deleted": true }
            ]),
        )
        .await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/soft-delete/brand/bulk-force-delete"))
            .and(body_json(serde_json::json!({ "ids": ["a1", "a2"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "statusCode": 200,
                "data": {
                    "succeeded": ["a1"],
                    "failed": [{ "id": "a2", "reason": "referenced by order" }]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ids: BTreeSet<EntityId> = ["a1", "a2"].into_iter().map(EntityId::from).collect();
        let outcome = app(&server).bulk_force_delete(brand(), ids, 1).await.unwrap();
        assert!(outcome.is_partial());
        assert_eq!(outcome.failed[&EntityId::from("a2")], "referenced by order");
    }

    #[tokio::test]
    async fn load_failure_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/soft-delete/brand"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = app(&server)
            .delete(brand(), EntityId::from("a1"), 1, false)
            .await
            .unwrap_err();
        assert!(err.is_backend());
    }
}
