use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::Document;

/// Assignment of a value to a dotted field path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldUpdate {
    pub path: String,
    pub value: Value,
}

impl FieldUpdate {
    pub fn new(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            value,
        }
    }
}

/// Turn a PATCH body into field assignments.
///
/// Object values are merged one level deep: `{"address": {"city": "X"}}` becomes
/// `address.city = "X"` so sibling fields survive. Deeper nesting is assigned whole.
pub fn flatten_patch(patch: Map<String, Value>) -> Vec<FieldUpdate> {
    let mut updates = Vec::new();
    for (key, value) in patch {
        match value {
            Value::Object(nested) => {
                for (subkey, subvalue) in nested {
                    updates.push(FieldUpdate::new(format!("{}.{}", key, subkey), subvalue));
                }
            }
            value => updates.push(FieldUpdate::new(key, value)),
        }
    }
    updates
}

/// Apply assignments in order; returns whether anything changed
pub fn apply_updates(document: &mut Document, updates: &[FieldUpdate]) -> bool {
    let mut modified = false;
    for update in updates {
        if document.get_path(&update.path) != Some(&update.value) {
            document.set_path(&update.path, update.value.clone());
            modified = true;
        }
    }
    modified
}

/// Top-level fields touched by a set of assignments, in first-seen order
pub fn touched_fields(updates: &[FieldUpdate]) -> Vec<&str> {
    let mut fields: Vec<&str> = Vec::new();
    for update in updates {
        let root = update.path.split('.').next().unwrap_or_default();
        if !fields.contains(&root) {
            fields.push(root);
        }
    }
    fields
}
