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
    Child, Collection, DeleteResult, Document, FilterExpr, NewChild, Role, UpdateResult,
};
use crate::store::traits::EntityStore;

const REFERENCES: &[ReferenceField] = &[
    ReferenceField::new("_id", "person", Collection::People),
    ReferenceField::new("classId", "class", Collection::Classes),
];

const CANTON_NAME: &[Populate] =
    &[Populate::new("cantonId", Collection::Cantons).select(&["name"])];

const DETAIL_POPULATE: &[Populate] = &[
    Populate::new("_id", Collection::People),
    Populate::new("classId", Collection::Classes)
        .select(&["periode"])
        .nested(CANTON_NAME),
];

const DETAIL_VIEW: View = View::FULL.populate(DETAIL_POPULATE);

pub async fn list_children<S: EntityStore>(
    State(store): State<AppState<S>>,
) -> ApiResult<Json<Vec<Value>>> {
    list_documents(
        &*store,
        Collection::Children,
        &FilterExpr::always(),
        &View::FULL,
        "Children not found",
    )
    .await
}

pub async fn get_child<S: EntityStore>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    get_document(&*store, Collection::Children, &id, &DETAIL_VIEW, "Child not found").await
}

pub async fn create_child<S: EntityStore>(
    State(store): State<AppState<S>>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let new: NewChild = parse_body(body)?;
    let requirement = RoleRequirement {
        person_ids: new.id.iter().cloned().collect(),
        role: Role::Child,
        conflict: "Role of the person is not child",
    };
    create_with_role_check(&*store, Collection::Children, &new, REFERENCES, requirement).await
}

pub async fn delete_child<S: EntityStore>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResult>> {
    delete_document(&*store, Collection::Children, &id, "Child not found").await
}

pub async fn update_child<S: EntityStore>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<UpdateResult>> {
    patch_document::<S, Child>(&*store, &id, body, REFERENCES, "Child not found").await
}
