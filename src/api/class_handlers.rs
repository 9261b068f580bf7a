use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde_json::Value;

use crate::api::error::{ApiResult, OrApiError};
use crate::api::handlers::{
    create_document, delete_document, get_document, list_documents, parse_body, patch_document,
    AppState, View,
};
use crate::api::params::ListParams;
use crate::logic::{resolve_if_present, Populate, QueryResolver, ReferenceField};
use crate::model::{
    Class, Collection, DeleteResult, Document, FilterBuilder, FilterExpr, NewClass, UpdateResult,
};
use crate::store::traits::EntityStore;

const REFERENCES: &[ReferenceField] =
    &[ReferenceField::new("cantonId", "canton", Collection::Cantons)];

const CANTON_NAME: &[Populate] =
    &[Populate::new("cantonId", Collection::Cantons).select(&["name"])];

const VIEW: View = View::select(&["periode"]).populate(CANTON_NAME);

/// GET /classes?periode=&canton=
pub async fn list_classes<S: EntityStore>(
    State(store): State<AppState<S>>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Json<Vec<Value>>> {
    let params = ListParams::from(params);
    let resolver = QueryResolver::new(&*store);

    let by_canton = resolve_if_present(params.all("canton"), |names| {
        resolver.classes_by_canton_name(names)
    })
    .await
    .or_not_found("Classes not found")?;

    let filter = FilterBuilder::new()
        .and_some(params.first("periode"), |period| FilterExpr::eq("periode", period))
        .and_some(by_canton, |ids| FilterExpr::id_in(&ids))
        .build();

    list_documents(&*store, Collection::Classes, &filter, &VIEW, "Classes not found").await
}

pub async fn get_class<S: EntityStore>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    get_document(&*store, Collection::Classes, &id, &VIEW, "Class not found").await
}

pub async fn create_class<S: EntityStore>(
    State(store): State<AppState<S>>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let new: NewClass = parse_body(body)?;
    create_document(&*store, Collection::Classes, &new, REFERENCES).await
}

pub async fn delete_class<S: EntityStore>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResult>> {
    delete_document(&*store, Collection::Classes, &id, "Class not found").await
}

pub async fn update_class<S: EntityStore>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<UpdateResult>> {
    patch_document::<S, Class>(&*store, &id, body, REFERENCES, "Class not found").await
}
