use crate::model::{
    generate_id, Collection, DeleteResult, Document, Entity, FieldUpdate, FilterExpr, Id,
    UpdateResult, CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD,
};
use anyhow::{bail, Result};
use serde_json::Value;

/// Persistent collections of documents, queried with [`FilterExpr`]
#[async_trait::async_trait]
pub trait EntityStore: Send + Sync {
    /// All documents of a collection matching the filter, in insertion order
    async fn find_many(
        &self,
        collection: Collection,
        filter: &FilterExpr,
    ) -> Result<Vec<Document>>;
    async fn find_by_id(&self, collection: Collection, id: &str) -> Result<Option<Document>>;
    /// Store a new document, assigning an id when it carries none
    async fn insert(&self, collection: Collection, document: Document) -> Result<Document>;
    async fn update_one(
        &self,
        collection: Collection,
        id: &str,
        updates: &[FieldUpdate],
    ) -> Result<UpdateResult>;
    async fn delete_one(&self, collection: Collection, id: &str) -> Result<DeleteResult>;
}

/// Typed conveniences over any [`EntityStore`]
#[async_trait::async_trait]
pub trait EntityStoreExt: EntityStore {
    async fn get<T: Entity>(&self, id: &str) -> Result<Option<T>> {
        match self.find_by_id(T::COLLECTION, id).await? {
            Some(document) => Ok(Some(document.into_entity()?)),
            None => Ok(None),
        }
    }

    async fn exists(&self, collection: Collection, id: &str) -> Result<bool> {
        Ok(self.find_by_id(collection, id).await?.is_some())
    }

    /// Ids of the documents matching the filter, in store order
    async fn find_ids(&self, collection: Collection, filter: &FilterExpr) -> Result<Vec<Id>> {
        let documents = self.find_many(collection, filter).await?;
        Ok(documents
            .iter()
            .filter_map(|document| document.id().map(str::to_string))
            .collect())
    }
}

impl<S: EntityStore> EntityStoreExt for S {}

/// Give a document about to be inserted its id and timestamps
pub fn prepare_insert(mut document: Document) -> Document {
    if document.id().is_none() {
        document.set_id(generate_id());
    }
    let now = Value::String(chrono::Utc::now().to_rfc3339());
    document.insert(CREATED_AT_FIELD, now.clone());
    document.insert(UPDATED_AT_FIELD, now);
    document
}

/// Updates may never rewrite a document's identity
pub fn check_updates(updates: &[FieldUpdate]) -> Result<()> {
    for update in updates {
        if update.path == ID_FIELD || update.path.starts_with("_id.") {
            bail!("Field '{}' cannot be updated", ID_FIELD);
        }
    }
    Ok(())
}

pub fn touch(document: &mut Document) {
    document.insert(
        UPDATED_AT_FIELD,
        Value::String(chrono::Utc::now().to_rfc3339()),
    );
}
