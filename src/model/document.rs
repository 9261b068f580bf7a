use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::model::Id;

pub const ID_FIELD: &str = "_id";
pub const CREATED_AT_FIELD: &str = "createdAt";
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// The collections held by the entity store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    People,
    Cantons,
    Classes,
    Courses,
    Themes,
    Assistants,
    Children,
    Teachings,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::People => "people",
            Collection::Cantons => "cantons",
            Collection::Classes => "classes",
            Collection::Courses => "courses",
            Collection::Themes => "themes",
            Collection::Assistants => "assistants",
            Collection::Children => "children",
            Collection::Teachings => "teachings",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed record living in one collection of the store
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: Collection;
}

/// A stored record: a JSON object keyed by `_id`.
///
/// Typed entities convert to and from documents through serde, so the store never needs
/// to know about individual entity shapes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    pub fn from_entity<T: Serialize>(entity: &T) -> Result<Self> {
        match serde_json::to_value(entity).context("Failed to serialize entity")? {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(anyhow!("Entity did not serialize to an object: {}", other)),
        }
    }

    pub fn into_entity<T: DeserializeOwned>(self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.0))?)
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get(ID_FIELD).and_then(Value::as_str)
    }

    pub fn set_id(&mut self, id: Id) {
        self.0.insert(ID_FIELD.to_string(), Value::String(id));
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    /// Look up a dotted path such as `address.city`
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.0.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Assign a dotted path, creating intermediate objects as needed.
    /// A non-object value sitting on the way is replaced by an object.
    pub fn set_path(&mut self, path: &str, value: Value) {
        let segments: Vec<&str> = path.split('.').collect();
        let (last, parents) = match segments.split_last() {
            Some(split) => split,
            None => return,
        };

        let mut current = &mut self.0;
        for segment in parents {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            let Value::Object(map) = entry else {
                return;
            };
            current = map;
        }
        current.insert(last.to_string(), value);
    }

    /// Keep `_id` plus the named top-level fields
    pub fn project(&self, fields: &[&str]) -> Document {
        let mut projected = Map::new();
        for (key, value) in &self.0 {
            if key == ID_FIELD || fields.contains(&key.as_str()) {
                projected.insert(key.clone(), value.clone());
            }
        }
        Document(projected)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Document {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Outcome of a single-record update, mirroring the counts a document store reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub matched_count: u64,
    pub modified_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub deleted_count: u64,
}
