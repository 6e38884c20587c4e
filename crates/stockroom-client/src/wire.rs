// SPDX-FileCopyrightText: 2026 Stockroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response envelope and payload shapes of the admin REST API.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use stockroom_core::{BulkOutcome, Entity, EntityId, ListMeta};

/// Wrapper around every response body: `{ statusCode, message, data? }`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub message: Option<EnvelopeMessage>,
    // Missing `data` deserializes as None without a `T: Default` bound.
    pub data: Option<T>,
}

/// Validation failures arrive as a list of messages, everything else as one string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EnvelopeMessage {
    Text(String),
    List(Vec<String>),
}

impl EnvelopeMessage {
    pub fn into_text(self) -> String {
        match self {
            EnvelopeMessage::Text(s) => s,
            EnvelopeMessage::List(items) => items.join("; "),
        }
    }
}

/// `data` of a list response.
#[derive(Debug, Deserialize)]
pub struct ListPage {
    #[serde(default)]
    pub meta: ListMeta,
    #[serde(default)]
    pub results: Vec<Entity>,
}

/// Request body of the bulk endpoints.
#[derive(Debug, Serialize)]
pub struct BulkRequest<'a> {
    pub ids: &'a BTreeSet<EntityId>,
}

/// `data` of a bulk response.
#[derive(Debug, Deserialize)]
pub struct BulkResponse {
    #[serde(default)]
    pub succeeded: Vec<EntityId>,
    #[serde(default)]
    pub failed: Vec<BulkFailure>,
}

#[derive(Debug, Deserialize)]
pub struct BulkFailure {
    pub id: EntityId,
    #[serde(default)]
    pub reason: String,
}

impl From<BulkResponse> for BulkOutcome {
    fn from(resp: BulkResponse) -> Self {
        let failed = resp
            .failed
            .into_iter()
            .map(|f| {
                let reason = if f.reason.trim().is_empty() {
                    "unknown reason".to_string()
                } else {
                    f.reason
                };
                (f.id, reason)
            })
            .collect::<std::collections::BTreeMap<_, _>>();
        // The failed list wins if the server names an id in both.
        let succeeded = resp
            .succeeded
            .into_iter()
            .filter(|id| !failed.contains_key(id))
            .collect();
        BulkOutcome { succeeded, failed }
    }
}
