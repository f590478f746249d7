//! Object CRUD and search.

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use digit_auth::SessionCookie;

use crate::errors::ApiError;
use crate::rest::RestApi;

/// Payload for creating (or updating) one object.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewObject {
    /// Entity the object belongs to. Required by the server.
    pub entity_id: String,
    /// Attribute values, flattened into the payload alongside `entityId`.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl NewObject {
    /// A payload for `entity_id` with no attributes yet.
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            attributes: Map::new(),
        }
    }

    /// Add one attribute value.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        let _ = self.attributes.insert(name.into(), value);
        self
    }
}

/// Parameters of an object search.
#[derive(Clone, Debug)]
pub struct SearchQuery {
    /// Entity to search in. Required by the server.
    pub entity_id: String,
    /// Maximum number of results. Must be positive.
    pub limit: u32,
    /// Attributes to fetch; empty means the server default set.
    pub attributes: Vec<String>,
    /// Optional server-side filter condition.
    pub condition: Option<Value>,
    /// Search at the database level instead of the entity level.
    pub db_search: bool,
}

impl SearchQuery {
    /// A query over `entity_id` returning at most `limit` objects.
    pub fn new(entity_id: impl Into<String>, limit: u32) -> Self {
        Self {
            entity_id: entity_id.into(),
            limit,
            attributes: Vec::new(),
            condition: None,
            db_search: false,
        }
    }

    /// Restrict the fetched attributes.
    #[must_use]
    pub fn attributes(mut self, attributes: Vec<String>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Filter with a server-side condition.
    #[must_use]
    pub fn condition(mut self, condition: Value) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Switch to a database-level search.
    #[must_use]
    pub fn db_search(mut self) -> Self {
        self.db_search = true;
        self
    }

    /// The search body the server expects.
    pub(crate) fn to_wire(&self) -> Value {
        let mut body = Map::new();
        let _ = body.insert("entityId".into(), Value::String(self.entity_id.clone()));
        let _ = body.insert("limit".into(), Value::from(self.limit));
        let _ = body.insert(
            "attributes".into(),
            Value::Array(
                self.attributes
                    .iter()
                    .map(|name| Value::String(name.clone()))
                    .collect(),
            ),
        );
        match &self.condition {
            Some(condition) => {
                let _ = body.insert("useCondition".into(), Value::Bool(true));
                let _ = body.insert("dataCondition".into(), condition.clone());
            }
            None => {
                let _ = body.insert("useCondition".into(), Value::Bool(false));
            }
        }
        let bind_type = if self.db_search { "UML" } else { "entity" };
        let _ = body.insert("bindType".into(), Value::String(bind_type.into()));
        Value::Object(body)
    }
}

impl RestApi {
    /// Create an object under a client-generated id; returns that id.
    pub async fn create_object(
        &self,
        cookie: &SessionCookie,
        new_object: &NewObject,
    ) -> Result<String, ApiError> {
        if new_object.entity_id.trim().is_empty() {
            return Err(ApiError::invalid_input("newObject.entityId must not be empty"));
        }
        let object_id = Uuid::new_v4().to_string();
        self.http
            .post(cookie, &format!("rest/data/entity/{object_id}"), new_object)
            .await?;
        Ok(object_id)
    }

    /// Overwrite the attributes of an existing object.
    pub async fn update_object(
        &self,
        cookie: &SessionCookie,
        object_id: &str,
        payload: &NewObject,
    ) -> Result<(), ApiError> {
        if object_id.trim().is_empty() {
            return Err(ApiError::invalid_input("objectId must not be empty"));
        }
        if payload.entity_id.trim().is_empty() {
            return Err(ApiError::invalid_input("payload.entityId must not be empty"));
        }
        self.http
            .post(cookie, &format!("rest/data/entity/{object_id}"), payload)
            .await
    }

    /// Search objects; the result is returned as the server sent it.
    pub async fn get_objects(
        &self,
        cookie: &SessionCookie,
        query: &SearchQuery,
    ) -> Result<Value, ApiError> {
        if query.entity_id.trim().is_empty() {
            return Err(ApiError::invalid_input("query.entityId must not be empty"));
        }
        if query.limit == 0 {
            return Err(ApiError::invalid_input("query.limit must be positive"));
        }
        self.http
            .post_json(cookie, "rest/data/entity/", &query.to_wire())
            .await
    }

    /// Delete the given objects.
    pub async fn delete_objects(
        &self,
        cookie: &SessionCookie,
        object_ids: &[String],
    ) -> Result<(), ApiError> {
        if object_ids.is_empty() {
            return Err(ApiError::invalid_input("objectIds must not be empty"));
        }
        self.http
            .post(
                cookie,
                "rest/data/deleteentity",
                &serde_json::json!({ "objectIds": object_ids }),
            )
            .await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
