use anyhow::Result;
use futures_util::future::BoxFuture;
use itertools::Itertools;
use serde_json::Value;
use std::collections::HashMap;

use crate::model::{Collection, Document, FilterExpr, Id};
use crate::store::traits::EntityStore;

/// Replace a reference field by (a projection of) the record it points to
#[derive(Debug, Clone, Copy)]
pub struct Populate {
    pub path: &'static str,
    pub from: Collection,
    /// Fields kept on the referenced record besides `_id`; `None` keeps everything
    pub select: Option<&'static [&'static str]>,
    /// Expansions applied to the referenced records before projection
    pub nested: &'static [Populate],
}

impl Populate {
    pub const fn new(path: &'static str, from: Collection) -> Self {
        Self {
            path,
            from,
            select: None,
            nested: &[],
        }
    }

    pub const fn select(mut self, fields: &'static [&'static str]) -> Self {
        self.select = Some(fields);
        self
    }

    pub const fn nested(mut self, nested: &'static [Populate]) -> Self {
        self.nested = nested;
        self
    }

    fn view(&self, document: Document) -> Value {
        match self.select {
            Some(fields) => {
                let mut kept: Vec<&str> = fields.to_vec();
                kept.extend(self.nested.iter().map(|nested| nested.path));
                document.project(&kept).into_value()
            }
            None => document.into_value(),
        }
    }
}

/// Paths a projection must keep so populated fields survive it
pub fn populated_paths(specs: &[Populate]) -> Vec<&'static str> {
    specs.iter().map(|spec| spec.path).collect()
}

fn referenced_ids(documents: &[Document], path: &str) -> Vec<Id> {
    documents
        .iter()
        .filter_map(|document| document.get(path))
        .flat_map(|value| match value {
            Value::String(id) => vec![id.clone()],
            Value::Array(items) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        })
        .unique()
        .collect()
}

/// Expand references on every document, one store read per populated path.
/// Returns BoxFuture because nested expansions recurse.
///
/// A single reference pointing nowhere becomes `null`; dangling ids inside an array
/// are dropped.
pub fn populate<'a, S: EntityStore>(
    store: &'a S,
    mut documents: Vec<Document>,
    specs: &'a [Populate],
) -> BoxFuture<'a, Result<Vec<Document>>> {
    Box::pin(async move {
        for spec in specs {
            let ids = referenced_ids(&documents, spec.path);
            if ids.is_empty() {
                continue;
            }

            let referenced = store.find_many(spec.from, &FilterExpr::id_in(&ids)).await?;
            // Nested expansion may replace `_id` itself, so remember the keys first
            let keys: Vec<Option<Id>> = referenced
                .iter()
                .map(|document| document.id().map(str::to_string))
                .collect();
            let referenced = populate(store, referenced, spec.nested).await?;

            let by_id: HashMap<Id, Value> = keys
                .into_iter()
                .zip(referenced)
                .filter_map(|(key, document)| key.map(|key| (key, spec.view(document))))
                .collect();

            for document in documents.iter_mut() {
                let expanded = match document.get(spec.path) {
                    Some(Value::String(id)) => by_id.get(id).cloned().unwrap_or(Value::Null),
                    Some(Value::Array(items)) => Value::Array(
                        items
                            .iter()
                            .filter_map(|item| item.as_str().and_then(|id| by_id.get(id)).cloned())
                            .collect(),
                    ),
                    _ => continue,
                };
                document.insert(spec.path, expanded);
            }
        }
        Ok(documents)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use serde_json::json;

    const CANTON_NAME: &[Populate] =
        &[Populate::new("cantonId", Collection::Cantons).select(&["name"])];
    const CLASS_WITH_CANTON: &[Populate] = &[Populate::new("classId", Collection::Classes)
        .select(&["periode"])
        .nested(CANTON_NAME)];

    async fn put(store: &InMemoryStore, collection: Collection, value: Value) -> Document {
        store
            .insert(collection, serde_json::from_value(value).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn expands_nested_references_with_selection() {
        let store = InMemoryStore::new();
        put(&store, Collection::Cantons, json!({"_id": "jura", "name": "Jura", "budget": 5})).await;
        let class = json!({"_id": "k1", "cantonId": "jura", "periode": "morning"});
        put(&store, Collection::Classes, class).await;
        let course = put(&store, Collection::Courses, json!({"_id": "c1", "classId": "k1"})).await;

        let populated = populate(&store, vec![course], CLASS_WITH_CANTON).await.unwrap();
        assert_eq!(
            populated[0].get("classId"),
            Some(&json!({
                "_id": "k1",
                "periode": "morning",
                "cantonId": {"_id": "jura", "name": "Jura"}
            }))
        );
    }

    #[tokio::test]
    async fn dangling_references_become_null() {
        let store = InMemoryStore::new();
        let course = json!({"_id": "c1", "classId": "gone"});
        let course = put(&store, Collection::Courses, course).await;

        let populated = populate(&store, vec![course], CLASS_WITH_CANTON).await.unwrap();
        assert_eq!(populated[0].get("classId"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn arrays_of_references_are_expanded() {
        const ABSENCE: &[Populate] =
            &[Populate::new("absence", Collection::People).select(&["firstName"])];

        let store = InMemoryStore::new();
        let marie = json!({"_id": "p1", "firstName": "Marie", "role": "child"});
        put(&store, Collection::People, marie).await;
        let course = json!({"_id": "c1", "absence": ["p1", "gone"]});
        let course = put(&store, Collection::Courses, course).await;

        let populated = populate(&store, vec![course], ABSENCE).await.unwrap();
        assert_eq!(
            populated[0].get("absence"),
            Some(&json!([{"_id": "p1", "firstName": "Marie"}]))
        );
    }

    #[tokio::test]
    async fn the_id_itself_can_be_expanded() {
        const PERSON: &[Populate] =
            &[Populate::new("_id", Collection::People).select(&["firstName", "lastName"])];

        let store = InMemoryStore::new();
        let jean = json!({"_id": "p1", "firstName": "Jean", "lastName": "Marais", "email": "x"});
        put(&store, Collection::People, jean).await;
        let assistant = json!({"_id": "p1", "cantonId": "jura"});
        let assistant = put(&store, Collection::Assistants, assistant).await;

        let populated = populate(&store, vec![assistant], PERSON).await.unwrap();
        assert_eq!(
            populated[0].get("_id"),
            Some(&json!({"_id": "p1", "firstName": "Jean", "lastName": "Marais"}))
        );
        assert_eq!(populated[0].get("cantonId"), Some(&json!("jura")));
    }
}
