use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::Value;

use crate::api::error::ApiResult;
use crate::api::handlers::{
    create_with_role_check, delete_document, get_document, list_documents, parse_body,
    patch_document, AppState, RoleRequirement, View,
};
use crate::logic::{Populate, ReferenceField};
use crate::model::{
    Assistant, Collection, DeleteResult, Document, FilterExpr, NewAssistant, Role, UpdateResult,
};
use crate::store::traits::EntityStore;

const REFERENCES: &[ReferenceField] = &[
    ReferenceField::new("_id", "person", Collection::People),
    ReferenceField::new("cantonId", "canton", Collection::Cantons),
];

const DETAIL_POPULATE: &[Populate] = &[
    Populate::new("_id", Collection::People),
    Populate::new("cantonId", Collection::Cantons).select(&["name"]),
];

const DETAIL_VIEW: View = View::FULL.populate(DETAIL_POPULATE);

pub async fn list_assistants<S: EntityStore>(
    State(store): State<AppState<S>>,
) -> ApiResult<Json<Vec<Value>>> {
    list_documents(
        &*store,
        Collection::Assistants,
        &FilterExpr::always(),
        &View::FULL,
        "Assistants not found",
    )
    .await
}

pub async fn get_assistant<S: EntityStore>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    get_document(&*store, Collection::Assistants, &id, &DETAIL_VIEW, "Assistant not found").await
}

/// POST /assistants; the body's `_id` is the id of an existing person with role assistant
pub async fn create_assistant<S: EntityStore>(
    State(store): State<AppState<S>>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let new: NewAssistant = parse_body(body)?;
    let requirement = RoleRequirement {
        person_ids: new.id.iter().cloned().collect(),
        role: Role::Assistant,
        conflict: "Role of the person is not assistant",
    };
    create_with_role_check(&*store, Collection::Assistants, &new, REFERENCES, requirement).await
}

pub async fn delete_assistant<S: EntityStore>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResult>> {
    delete_document(&*store, Collection::Assistants, &id, "Assistant not found").await
}

pub async fn update_assistant<S: EntityStore>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<UpdateResult>> {
    patch_document::<S, Assistant>(&*store, &id, body, REFERENCES, "Assistant not found").await
}
