use anyhow::{bail, Result};
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::logic::document_filter::filter_documents;
use crate::model::{Collection, DeleteResult, Document, FieldUpdate, FilterExpr, UpdateResult};
use crate::model::apply_updates;
use crate::store::traits::{check_updates, prepare_insert, touch, EntityStore};

/// Entity store kept in process memory. Documents stay in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held in a collection
    pub fn count(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .get(&collection)
            .map_or(0, Vec::len)
    }
}

#[async_trait::async_trait]
impl EntityStore for InMemoryStore {
    async fn find_many(
        &self,
        collection: Collection,
        filter: &FilterExpr,
    ) -> Result<Vec<Document>> {
        let collections = self.collections.read();
        match collections.get(&collection) {
            Some(documents) => filter_documents(documents, filter),
            None => Ok(Vec::new()),
        }
    }

    async fn find_by_id(&self, collection: Collection, id: &str) -> Result<Option<Document>> {
        let collections = self.collections.read();
        Ok(collections
            .get(&collection)
            .and_then(|documents| documents.iter().find(|document| document.id() == Some(id)))
            .cloned())
    }

    async fn insert(&self, collection: Collection, document: Document) -> Result<Document> {
        let document = prepare_insert(document);
        let mut collections = self.collections.write();
        let documents = collections.entry(collection).or_default();

        if documents.iter().any(|existing| existing.id() == document.id()) {
            bail!(
                "Duplicate key: '{}' already exists in {}",
                document.id().unwrap_or_default(),
                collection
            );
        }

        documents.push(document.clone());
        Ok(document)
    }

    async fn update_one(
        &self,
        collection: Collection,
        id: &str,
        updates: &[FieldUpdate],
    ) -> Result<UpdateResult> {
        check_updates(updates)?;

        let mut collections = self.collections.write();
        let target = collections
            .get_mut(&collection)
            .and_then(|documents| documents.iter_mut().find(|document| document.id() == Some(id)));

        let Some(document) = target else {
            return Ok(UpdateResult {
                matched_count: 0,
                modified_count: 0,
            });
        };

        let modified = apply_updates(document, updates);
        if modified {
            touch(document);
        }

        Ok(UpdateResult {
            matched_count: 1,
            modified_count: u64::from(modified),
        })
    }

    async fn delete_one(&self, collection: Collection, id: &str) -> Result<DeleteResult> {
        let mut collections = self.collections.write();
        let deleted_count = match collections.get_mut(&collection) {
            Some(documents) => match documents
                .iter()
                .position(|document| document.id() == Some(id))
            {
                Some(index) => {
                    documents.remove(index);
                    1
                }
                None => 0,
            },
            None => 0,
        };

        Ok(DeleteResult { deleted_count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_id_and_timestamps() {
        let store = InMemoryStore::new();
        let stored = store
            .insert(Collection::Themes, doc(json!({"title": "Gmail"})))
            .await
            .unwrap();

        let id = stored.id().unwrap().to_string();
        assert!(stored.get("createdAt").is_some());
        assert!(stored.get("updatedAt").is_some());

        let found = store.find_by_id(Collection::Themes, &id).await.unwrap().unwrap();
        assert_eq!(found, stored);
    }

    #[tokio::test]
    async fn client_ids_are_kept_and_unique() {
        let store = InMemoryStore::new();
        let assistant = doc(json!({"_id": "person-1", "cantonId": "c1"}));

        let stored = store.insert(Collection::Assistants, assistant.clone()).await.unwrap();
        assert_eq!(stored.id(), Some("person-1"));
        assert!(store.insert(Collection::Assistants, assistant).await.is_err());
        assert_eq!(store.count(Collection::Assistants), 1);
    }

    #[tokio::test]
    async fn find_many_keeps_insertion_order() {
        let store = InMemoryStore::new();
        for title in ["Word", "Gmail", "Excel"] {
            store
                .insert(Collection::Themes, doc(json!({"title": title})))
                .await
                .unwrap();
        }

        let themes = store
            .find_many(Collection::Themes, &FilterExpr::always())
            .await
            .unwrap();
        let titles: Vec<_> = themes.iter().filter_map(|t| t.get("title")).collect();
        assert_eq!(titles, vec![&json!("Word"), &json!("Gmail"), &json!("Excel")]);
    }

    #[tokio::test]
    async fn update_and_delete_report_counts() {
        let store = InMemoryStore::new();
        let stored = store
            .insert(
                Collection::Cantons,
                doc(json!({"name": "Jura", "address": {"city": "Delémont"}})),
            )
            .await
            .unwrap();
        let id = stored.id().unwrap().to_string();

        let updates = vec![FieldUpdate::new("address.city", json!("Porrentruy"))];
        let result = store.update_one(Collection::Cantons, &id, &updates).await.unwrap();
        assert_eq!(result, UpdateResult { matched_count: 1, modified_count: 1 });

        let result = store.update_one(Collection::Cantons, &id, &updates).await.unwrap();
        assert_eq!(result, UpdateResult { matched_count: 1, modified_count: 0 });

        let result = store.update_one(Collection::Cantons, "missing", &updates).await.unwrap();
        assert_eq!(result.matched_count, 0);

        let id_change = vec![FieldUpdate::new("_id", json!("other"))];
        assert!(store.update_one(Collection::Cantons, &id, &id_change).await.is_err());

        assert_eq!(store.delete_one(Collection::Cantons, &id).await.unwrap().deleted_count, 1);
        assert_eq!(store.delete_one(Collection::Cantons, &id).await.unwrap().deleted_count, 0);
    }
}
