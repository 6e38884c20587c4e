// SPDX-FileCopyrightText: 2026 Stockroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the generic soft-delete admin API.
//!
//! Provides [`HttpResourceClient`] which handles URL construction,
//! bearer authentication, envelope unwrapping, and transient-error retry
//! for list reads.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use stockroom_config::model::ApiConfig;
use stockroom_core::{
    BulkOutcome, Entity, EntityForm, EntityId, ListQuery, ListResult, ModelName, ResourceClient,
    Scope, StockroomError,
};
use tracing::{debug, warn};

use crate::wire::{BulkRequest, BulkResponse, Envelope, ListPage};

/// Path prefix shared by every endpoint.
const API_PREFIX: &str = "api/v1";

/// HTTP implementation of [`ResourceClient`].
///
/// List reads retry on transient statuses (429, 500, 502, 503, 504);
/// mutations are sent exactly once.
#[derive(Debug, Clone)]
pub struct HttpResourceClient {
    client: reqwest::Client,
    base_url: Url,
    auth_token: Option<SecretString>,
    max_retries: u32,
    retry_delay: Duration,
}

impl HttpResourceClient {
    /// Creates a client from the `[api]` config section.
    pub fn new(config: &ApiConfig) -> Result<Self, StockroomError> {
        // A trailing slash makes `Url::join` append instead of replace.
        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| {
            StockroomError::Config(format!("invalid api.base_url `{}`: {e}", config.base_url))
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StockroomError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            auth_token: config.auth_token.clone().map(SecretString::from),
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    /// Replaces the bearer token, e.g. after the admin signs in.
    pub fn with_bearer_token(mut self, token: SecretString) -> Self {
        self.auth_token = Some(token);
        self
    }

    fn url(&self, segments: &[&str]) -> Result<Url, StockroomError> {
        let path = std::iter::once(API_PREFIX)
            .chain(segments.iter().copied())
            .collect::<Vec<_>>()
            .join("/");
        self.base_url
            .join(&path)
            .map_err(|e| StockroomError::Internal(format!("failed to build URL for {path}: {e}")))
    }

    fn list_url(&self, query: &ListQuery) -> Result<Url, StockroomError> {
        let model = query.model.as_str();
        let mut url = match query.scope {
            Scope::Active => self.url(&["soft-delete", model])?,
            Scope::Trash => self.url(&["soft-delete", model, "deleted"])?,
        };
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("current", &query.page.to_string());
            pairs.append_pair("pageSize", &query.page_size.to_string());
            if !query.filters.is_empty() {
                pairs.append_pair("filter", &query.filter_string());
            }
        }
        Ok(url)
    }

    /// Sends one request; transport failures become [`StockroomError::Network`].
    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response, StockroomError> {
        let mut request = self.client.request(method.clone(), url.clone());
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token.expose_secret());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| StockroomError::Network {
            message: format!("{method} {} failed: {e}", url.path()),
        })?;
        debug!(%method, path = url.path(), status = %response.status(), "response received");
        Ok(response)
    }

    /// Unwraps the envelope of a response, mapping failures to [`StockroomError::Backend`].
    ///
    /// Returns `Ok(None)` for a 2xx response with an empty body or no `data`.
    async fn read<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<Option<T>, StockroomError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| StockroomError::Network {
            message: format!("failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            return Err(backend_error(status, &body));
        }
        if body.trim().is_empty() {
            return Ok(None);
        }

        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
            StockroomError::Internal(format!("failed to parse API response: {e}"))
        })?;

        if let Some(code) = envelope.status_code
            && !(200..=299).contains(&code)
        {
            return Err(StockroomError::Backend {
                status_code: code,
                message: envelope
                    .message
                    .map(|m| m.into_text())
                    .unwrap_or_default(),
            });
        }
        Ok(envelope.data)
    }

    /// GETs a list page, retrying transient statuses.
    async fn fetch_list(&self, query: &ListQuery) -> Result<ListResult, StockroomError> {
        query.validate()?;
        let url = self.list_url(query)?;

        let mut attempt = 0;
        let response = loop {
            let response = self.send(Method::GET, url.clone(), None).await?;
            let status = response.status();
            if is_transient_error(status) && attempt < self.max_retries {
                attempt += 1;
                warn!(status = %status, attempt, model = %query.model, "transient error, will retry list");
                tokio::time::sleep(self.retry_delay).await;
                continue;
            }
            break response;
        };

        let page: ListPage = Self::read(response).await?.unwrap_or(ListPage {
            meta: Default::default(),
            results: Vec::new(),
        });

        let mut items = page.results;
        if query.scope == Scope::Trash {
            let before = items.len();
            items.retain(Entity::is_deleted);
            if items.len() != before {
                warn!(
                    model = %query.model,
                    dropped = before - items.len(),
                    "trash listing contained active entities"
                );
            }
        }

        Ok(ListResult {
            query: query.clone(),
            items,
            meta: page.meta,
        })
    }

    async fn bulk(
        &self,
        method: Method,
        model: &ModelName,
        action: &str,
        ids: &BTreeSet<EntityId>,
    ) -> Result<BulkOutcome, StockroomError> {
        if ids.is_empty() {
            return Err(StockroomError::Validation(format!(
                "{action} requires at least one id"
            )));
        }
        let url = self.url(&["soft-delete", model.as_str(), action])?;
        let body = serde_json::to_value(BulkRequest { ids })
            .map_err(|e| StockroomError::Internal(format!("failed to encode ids: {e}")))?;

        let response = self.send(method, url, Some(&body)).await?;
        let data: Option<BulkResponse> = Self::read(response).await?;
        let outcome: BulkOutcome = data
            .map(BulkOutcome::from)
            .unwrap_or_else(|| BulkOutcome {
                // No body: the server accepted every id.
                succeeded: ids.clone(),
                failed: Default::default(),
            });
        debug!(
            model = %model,
            action,
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "bulk call completed"
        );
        Ok(outcome)
    }

    async fn write_form(
        &self,
        method: Method,
        url: Url,
        form: &EntityForm,
    ) -> Result<Entity, StockroomError> {
        form.validate()?;
        let body = form.payload()?;
        let response = self.send(method, url, Some(&body)).await?;
        Self::read::<Entity>(response).await?.ok_or_else(|| {
            StockroomError::Internal(format!("{} write returned no entity", form.model()))
        })
    }
}

#[async_trait]
impl ResourceClient for HttpResourceClient {
    async fn list_active(&self, query: &ListQuery) -> Result<ListResult, StockroomError> {
        if query.scope != Scope::Active {
            return Err(StockroomError::Validation(
                "list_active called with a trash query".into(),
            ));
        }
        self.fetch_list(query).await
    }

    async fn list_trash(&self, query: &ListQuery) -> Result<ListResult, StockroomError> {
        if query.scope != Scope::Trash {
            return Err(StockroomError::Validation(
                "list_trash called with an active query".into(),
            ));
        }
        self.fetch_list(query).await
    }

    async fn soft_delete(&self, model: &ModelName, id: &EntityId) -> Result<(), StockroomError> {
        let url = self.url(&[model.as_str(), id.as_str()])?;
        let response = self.send(Method::DELETE, url, None).await?;
        Self::read::<serde_json::Value>(response).await?;
        Ok(())
    }

    async fn restore(&self, model: &ModelName, id: &EntityId) -> Result<Entity, StockroomError> {
        let url = self.url(&["soft-delete", model.as_str(), id.as_str(), "restore"])?;
        let response = self.send(Method::PATCH, url, None).await?;
        let mut entity = Self::read::<Entity>(response)
            .await?
            .unwrap_or_else(|| Entity::new(id.clone()));
        // Any 2xx means the entity is active now, whatever the body says.
        entity.mark_restored();
        Ok(entity)
    }

    async fn force_delete(&self, model: &ModelName, id: &EntityId) -> Result<(), StockroomError> {
        let url = self.url(&["soft-delete", model.as_str(), id.as_str(), "force-delete"])?;
        let response = self.send(Method::DELETE, url, None).await?;
        Self::read::<serde_json::Value>(response).await?;
        Ok(())
    }

    async fn bulk_restore(
        &self,
        model: &ModelName,
        ids: &BTreeSet<EntityId>,
    ) -> Result<BulkOutcome, StockroomError> {
        self.bulk(Method::PATCH, model, "bulk-restore", ids).await
    }

    async fn bulk_force_delete(
        &self,
        model: &ModelName,
        ids: &BTreeSet<EntityId>,
    ) -> Result<BulkOutcome, StockroomError> {
        self.bulk(Method::DELETE, model, "bulk-force-delete", ids).await
    }

    async fn create(&self, form: &EntityForm) -> Result<Entity, StockroomError> {
        let url = self.url(&[form.model().as_str()])?;
        self.write_form(Method::POST, url, form).await
    }

    async fn update(&self, id: &EntityId, form: &EntityForm) -> Result<Entity, StockroomError> {
        let url = self.url(&[form.model().as_str(), id.as_str()])?;
        self.write_form(Method::PATCH, url, form).await
    }
}

/// Builds a [`StockroomError::Backend`] from a non-2xx response body.
fn backend_error(status: StatusCode, body: &str) -> StockroomError {
    let message = serde_json::from_str::<Envelope<serde_json::Value>>(body)
        .ok()
        .and_then(|env| env.message)
        .map(|m| m.into_text())
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status.canonical_reason().unwrap_or_default().to_string()
            } else {
                trimmed.to_string()
            }
        });
    StockroomError::Backend {
        status_code: status.as_u16(),
        message,
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}
