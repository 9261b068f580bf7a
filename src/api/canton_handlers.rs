use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde_json::Value;

use crate::api::error::ApiResult;
use crate::api::handlers::{
    create_document, delete_document, get_document, list_documents, parse_body, patch_document,
    AppState, View,
};
use crate::api::params::ListParams;
use crate::model::{
    Canton, Collection, DeleteResult, Document, FilterBuilder, FilterExpr, NewCanton, UpdateResult,
};
use crate::store::traits::EntityStore;

const LIST_VIEW: View = View::select(&["name"]);

/// GET /cantons?name=, repeatable
pub async fn list_cantons<S: EntityStore>(
    State(store): State<AppState<S>>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Json<Vec<Value>>> {
    let params = ListParams::from(params);
    let filter = FilterBuilder::new()
        .and_some(params.all("name"), |names| {
            FilterExpr::is_in("name", names.into_iter().map(Value::String).collect())
        })
        .build();

    list_documents(&*store, Collection::Cantons, &filter, &LIST_VIEW, "Cantons not found").await
}

pub async fn get_canton<S: EntityStore>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    get_document(&*store, Collection::Cantons, &id, &View::FULL, "Canton not found").await
}

pub async fn create_canton<S: EntityStore>(
    State(store): State<AppState<S>>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let new: NewCanton = parse_body(body)?;
    create_document(&*store, Collection::Cantons, &new, &[]).await
}

pub async fn delete_canton<S: EntityStore>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResult>> {
    delete_document(&*store, Collection::Cantons, &id, "Canton not found").await
}

pub async fn update_canton<S: EntityStore>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<UpdateResult>> {
    patch_document::<S, Canton>(&*store, &id, body, &[], "Canton not found").await
}
