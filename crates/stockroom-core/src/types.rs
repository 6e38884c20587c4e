// SPDX-FileCopyrightText: 2026 Stockroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the resource client, the query cache, and the
//! soft-delete workflow.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::error::StockroomError;

/// Opaque identifier of a backend entity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// Some backends emit numeric ids; both forms collapse to a string.
impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Number(i64),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Text(s) => EntityId(s),
            Repr::Number(n) => EntityId(n.to_string()),
        })
    }
}

/// Name of a backend resource type, e.g. `brand`, `products`, `categories`.
///
/// Model names are substituted into URL paths, so only ASCII letters,
/// digits, `-` and `_` are accepted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModelName(String);

impl ModelName {
    pub fn new(name: impl Into<String>) -> Result<Self, StockroomError> {
        let name = name.into();
        if name.is_empty() {
            return Err(StockroomError::Validation(
                "model name must not be empty".into(),
            ));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(StockroomError::Validation(format!(
                "model name `{name}` may only contain letters, digits, `-` and `_`"
            )));
        }
        Ok(Self(name))
    }

    /// Builds a name from a literal known to be path-safe.
    pub(crate) fn from_static(name: &'static str) -> Self {
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ModelName {
    type Error = StockroomError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ModelName> for String {
    fn from(value: ModelName) -> Self {
        value.0
    }
}

/// Partition of a model's entities by the `deleted` flag.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Entities with `deleted == false`.
    Active,
    /// Soft-deleted entities only.
    Trash,
}

/// A generic backend entity.
///
/// Holds the identifier and the soft-delete markers; every other field is
/// kept verbatim in [`Entity::fields`]. The invariant `deleted == true`
/// iff `deleted_at.is_some()` holds for every value of this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "EntityWire", into = "EntityWire")]
pub struct Entity {
    id: EntityId,
    deleted_at: Option<DateTime<Utc>>,
    fields: serde_json::Map<String, serde_json::Value>,
}

#[derive(Serialize, Deserialize)]
struct EntityWire {
    #[serde(alias = "_id")]
    id: EntityId,
    #[serde(default)]
    deleted: bool,
    #[serde(default, rename = "deletedAt")]
    deleted_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    fields: serde_json::Map<String, serde_json::Value>,
}

impl From<EntityWire> for Entity {
    fn from(wire: EntityWire) -> Self {
        // A timestamp wins over the flag; a bare flag is stamped now.
        let deleted_at = match (wire.deleted, wire.deleted_at) {
            (_, Some(at)) => Some(at),
            (true, None) => Some(Utc::now()),
            (false, None) => None,
        };
        Self {
            id: wire.id,
            deleted_at,
            fields: wire.fields,
        }
    }
}

impl From<Entity> for EntityWire {
    fn from(entity: Entity) -> Self {
        Self {
            id: entity.id,
            deleted: entity.deleted_at.is_some(),
            deleted_at: entity.deleted_at,
            fields: entity.fields,
        }
    }
}

impl Entity {
    /// Creates an active entity with no extra fields.
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            deleted_at: None,
            fields: serde_json::Map::new(),
        }
    }

    /// Adds a model-specific field.
    pub fn with_field(mut self, name: &str, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.fields
    }

    /// Marks the entity soft-deleted at `at`.
    pub fn mark_deleted(&mut self, at: DateTime<Utc>) {
        self.deleted_at = Some(at);
    }

    /// Clears the soft-delete markers.
    pub fn mark_restored(&mut self) {
        self.deleted_at = None;
    }

    /// Human-readable label: the first of `name`, `title`, `label` that is a string.
    pub fn label(&self) -> String {
        ["name", "title", "label"]
            .iter()
            .find_map(|key| self.fields.get(*key).and_then(|v| v.as_str()))
            .map(str::to_string)
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// Parameters of one list request.
///
/// Filters live in a sorted map, so two queries compare equal (and hash
/// equally) regardless of the order their filters were added in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListQuery {
    pub model: ModelName,
    pub filters: BTreeMap<String, String>,
    pub page: u32,
    pub page_size: u32,
    pub scope: Scope,
}

/// Page size used when a query does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Characters escaped inside a filter key or value.
const FILTER_COMPONENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'=')
    .add(b'#');

impl ListQuery {
    /// First page of the active (non-deleted) entities of `model`.
    pub fn active(model: ModelName) -> Self {
        Self::new(model, Scope::Active)
    }

    /// First page of the soft-deleted entities of `model`.
    pub fn trash(model: ModelName) -> Self {
        Self::new(model, Scope::Trash)
    }

    pub fn new(model: ModelName, scope: Scope) -> Self {
        Self {
            model,
            filters: BTreeMap::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            scope,
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    /// Rejects queries the backend cannot serve.
    pub fn validate(&self) -> Result<(), StockroomError> {
        if self.page < 1 {
            return Err(StockroomError::Validation(format!(
                "page must be at least 1, got {}",
                self.page
            )));
        }
        if self.page_size < 1 {
            return Err(StockroomError::Validation(format!(
                "page size must be at least 1, got {}",
                self.page_size
            )));
        }
        if self.filters.keys().any(|k| k.trim().is_empty()) {
            return Err(StockroomError::Validation(
                "filter field names must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Encodes the filters as the `filter` query parameter (`k=v&k2=v2`).
    ///
    /// Keys and values are percent-encoded, so a `&` or `=` inside either
    /// cannot split or merge pairs.
    pub fn filter_string(&self) -> String {
        self.filters
            .iter()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(k, FILTER_COMPONENT),
                    utf8_percent_encode(v, FILTER_COMPONENT)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Pagination metadata returned alongside a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMeta {
    #[serde(default)]
    pub current: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub pages: u32,
    #[serde(default)]
    pub total: u64,
}

/// One page of entities for a [`ListQuery`].
#[derive(Debug, Clone, PartialEq)]
pub struct ListResult {
    pub query: ListQuery,
    pub items: Vec<Entity>,
    pub meta: ListMeta,
}

impl ListResult {
    pub fn contains(&self, id: &EntityId) -> bool {
        self.items.iter().any(|e| e.id() == id)
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.items.iter().map(|e| e.id().clone()).collect()
    }
}

/// Per-id partition returned by bulk restore and bulk force delete.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BulkOutcome {
    pub succeeded: BTreeSet<EntityId>,
    pub failed: BTreeMap<EntityId, String>,
}

impl BulkOutcome {
    pub fn is_total_failure(&self) -> bool {
        self.succeeded.is_empty() && !self.failed.is_empty()
    }

    pub fn is_partial(&self) -> bool {
        !self.succeeded.is_empty() && !self.failed.is_empty()
    }
}

/// Kind of mutating call tracked while in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
pub enum OperationKind {
    SoftDelete,
    Restore,
    ForceDelete,
    BulkRestore,
    BulkForceDelete,
}

/// Lifecycle state of a [`PendingOperation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum OperationState {
    InFlight,
    Succeeded,
    Failed,
}

/// A mutating call the workflow has issued and not yet reported.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingOperation {
    pub id: Uuid,
    pub kind: OperationKind,
    pub model: ModelName,
    pub ids: BTreeSet<EntityId>,
    pub issued_at: DateTime<Utc>,
    pub state: OperationState,
}

impl PendingOperation {
    pub fn new(kind: OperationKind, model: ModelName, ids: BTreeSet<EntityId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            model,
            ids,
            issued_at: Utc::now(),
            state: OperationState::InFlight,
        }
    }
}
