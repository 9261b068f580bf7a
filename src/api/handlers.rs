use axum::{http::StatusCode, response::Json};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult, OrApiError};
use crate::logic::{
    insert_with_role_check, missing_references, populate, populated_paths, Populate,
    ReferenceField, RoleCheck, VerifiedInsert,
};
use crate::model::{
    apply_updates, flatten_patch, touched_fields, Collection, DeleteResult, Document, Entity,
    FieldUpdate, FilterExpr, Id, Role, UpdateResult,
};
use crate::store::traits::{check_updates, EntityStore};

pub type AppState<S> = Arc<S>;

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn home() -> &'static str {
    "We are on home"
}

/// How a read presents its records: the fields kept and the references expanded
#[derive(Debug, Clone, Copy)]
pub struct View {
    pub fields: Option<&'static [&'static str]>,
    pub populate: &'static [Populate],
}

impl View {
    pub const FULL: View = View {
        fields: None,
        populate: &[],
    };

    pub const fn select(fields: &'static [&'static str]) -> Self {
        Self {
            fields: Some(fields),
            populate: &[],
        }
    }

    pub const fn populate(mut self, populate: &'static [Populate]) -> Self {
        self.populate = populate;
        self
    }

    fn project(&self, document: Document) -> Value {
        match self.fields {
            Some(fields) => {
                let mut kept = fields.to_vec();
                kept.extend(populated_paths(self.populate));
                document.project(&kept).into_value()
            }
            None => document.into_value(),
        }
    }
}

async fn render<S: EntityStore>(
    store: &S,
    documents: Vec<Document>,
    view: &View,
    not_found: &str,
) -> ApiResult<Vec<Value>> {
    let documents = populate(store, documents, view.populate)
        .await
        .or_not_found(not_found)?;
    Ok(documents
        .into_iter()
        .map(|document| view.project(document))
        .collect())
}

pub async fn list_documents<S: EntityStore>(
    store: &S,
    collection: Collection,
    filter: &FilterExpr,
    view: &View,
    not_found: &str,
) -> ApiResult<Json<Vec<Value>>> {
    let documents = store
        .find_many(collection, filter)
        .await
        .or_not_found(not_found)?;
    log::debug!("{} {} matched", documents.len(), collection);
    Ok(Json(render(store, documents, view, not_found).await?))
}

pub async fn get_document<S: EntityStore>(
    store: &S,
    collection: Collection,
    id: &str,
    view: &View,
    not_found: &str,
) -> ApiResult<Json<Value>> {
    let document = store
        .find_by_id(collection, id)
        .await
        .or_not_found(not_found)?
        .ok_or_else(|| ApiError::NotFound(not_found.to_string()))?;

    render(store, vec![document], view, not_found)
        .await?
        .pop()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(not_found.to_string()))
}

/// Deserialize a request body into its typed form, reporting what is wrong with it
pub fn parse_body<T: DeserializeOwned>(body: Value) -> ApiResult<T> {
    serde_json::from_value(body)
        .map_err(|err| ApiError::BadRequest(format!("Bad request: {}", err)))
}

async fn check_references<S: EntityStore>(
    store: &S,
    document: &Document,
    references: &[ReferenceField],
) -> ApiResult<()> {
    let missing = missing_references(store, document, references)
        .await
        .or_bad_request("Bad request")?;
    if missing.is_empty() {
        Ok(())
    } else {
        Err(missing.into())
    }
}

/// Insert a new record once all its references resolve
pub async fn create_document<S: EntityStore, T: Serialize>(
    store: &S,
    collection: Collection,
    new: &T,
    references: &[ReferenceField],
) -> ApiResult<(StatusCode, Json<Document>)> {
    let document = Document::from_entity(new).or_bad_request("Bad request")?;
    check_references(store, &document, references).await?;

    let stored = store
        .insert(collection, document)
        .await
        .or_bad_request("Bad request")?;
    log::info!(
        "Created {} '{}'",
        collection,
        stored.id().unwrap_or_default()
    );
    Ok((StatusCode::CREATED, Json(stored)))
}

/// Post-insert role requirement of a create
pub struct RoleRequirement<'a> {
    pub person_ids: Vec<Id>,
    pub role: Role,
    /// Reported when a person has another role
    pub conflict: &'a str,
}

/// Like [`create_document`], then confirm the people behind the record have the
/// required role. A record failing the check is deleted again.
pub async fn create_with_role_check<S: EntityStore, T: Serialize>(
    store: &S,
    collection: Collection,
    new: &T,
    references: &[ReferenceField],
    requirement: RoleRequirement<'_>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let document = Document::from_entity(new).or_bad_request("Bad request")?;
    check_references(store, &document, references).await?;

    let outcome = insert_with_role_check(
        store,
        collection,
        document,
        &requirement.person_ids,
        requirement.role,
    )
    .await
    .or_bad_request("Bad request")?;

    match outcome {
        VerifiedInsert::Stored(stored) => Ok((StatusCode::CREATED, Json(stored))),
        VerifiedInsert::RolledBack(RoleCheck::PersonMissing(_)) => {
            Err(ApiError::NotFound("Person not found".to_string()))
        }
        VerifiedInsert::RolledBack(_) => {
            Err(ApiError::RoleConflict(requirement.conflict.to_string()))
        }
    }
}

pub async fn delete_document<S: EntityStore>(
    store: &S,
    collection: Collection,
    id: &str,
    not_found: &str,
) -> ApiResult<Json<DeleteResult>> {
    let result = store
        .delete_one(collection, id)
        .await
        .or_not_found(not_found)?;
    if result.deleted_count == 0 {
        return Err(ApiError::NotFound(not_found.to_string()));
    }
    log::info!("Deleted {} '{}'", collection, id);
    Ok(Json(result))
}

/// Apply a PATCH body to an existing record.
///
/// The merged record must still be a valid `T`; values are stored in the form `T`
/// serializes them to, and fields `T` does not know are dropped. References touched by
/// the patch must resolve.
pub async fn patch_document<S: EntityStore, T: Entity>(
    store: &S,
    id: &str,
    body: Value,
    references: &[ReferenceField],
    not_found: &str,
) -> ApiResult<Json<UpdateResult>> {
    let Value::Object(patch) = body else {
        return Err(ApiError::BadRequest(
            "Bad request: expected a JSON object".to_string(),
        ));
    };
    let updates = flatten_patch(patch);
    check_updates(&updates).map_err(|err| ApiError::BadRequest(err.to_string()))?;

    let mut merged = store
        .find_by_id(T::COLLECTION, id)
        .await
        .or_not_found(not_found)?
        .ok_or_else(|| ApiError::NotFound(not_found.to_string()))?;
    apply_updates(&mut merged, &updates);

    let entity: T = merged
        .into_entity()
        .map_err(|err| ApiError::BadRequest(format!("Bad request: {:#}", err)))?;
    let normalized = Document::from_entity(&entity).or_bad_request("Bad request")?;

    let updates: Vec<FieldUpdate> = updates
        .into_iter()
        .filter_map(|update| {
            let value = normalized.get_path(&update.path)?.clone();
            Some(FieldUpdate { value, ..update })
        })
        .collect();

    let touched = touched_fields(&updates);
    let changed: Vec<ReferenceField> = references
        .iter()
        .filter(|reference| touched.contains(&reference.path))
        .copied()
        .collect();
    check_references(store, &normalized, &changed).await?;

    let result = store
        .update_one(T::COLLECTION, id, &updates)
        .await
        .or_not_found(not_found)?;
    if result.matched_count == 0 {
        return Err(ApiError::NotFound(not_found.to_string()));
    }
    log::info!(
        "Updated {} '{}' ({} fields)",
        T::COLLECTION,
        id,
        updates.len()
    );
    Ok(Json(result))
}
