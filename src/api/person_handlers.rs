use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde_json::Value;

use crate::api::error::{ApiError, ApiResult, OrApiError};
use crate::api::handlers::{
    create_document, delete_document, get_document, list_documents, parse_body, patch_document,
    AppState, View,
};
use crate::api::params::ListParams;
use crate::logic::{resolve_if_present, QueryResolver};
use crate::model::{
    Collection, DeleteResult, Document, FilterBuilder, FilterExpr, NewPerson, Person, Role,
    UpdateResult,
};
use crate::store::traits::EntityStore;

const LIST_VIEW: View = View::select(&["lastName", "firstName", "role"]);

/// GET /people?role=&name=&canton=&periode=
pub async fn list_people<S: EntityStore>(
    State(store): State<AppState<S>>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Json<Vec<Value>>> {
    let params = ListParams::from(params);
    let resolver = QueryResolver::new(&*store);

    let (by_name, by_canton, by_period) = tokio::try_join!(
        resolve_if_present(params.first("name"), |name| resolver.people_by_name(name)),
        resolve_if_present(params.all("canton"), |names| resolver.people_by_canton(names)),
        resolve_if_present(params.first("periode"), |period| resolver.children_by_period(period)),
    )
    .or_not_found("People not found")?;

    let filter = FilterBuilder::new()
        .and_some(params.first("role"), |role| FilterExpr::eq("role", role))
        .and_some(by_name, |ids| FilterExpr::id_in(&ids))
        .and_some(by_canton, |ids| FilterExpr::id_in(&ids))
        .and_some(by_period, |ids| FilterExpr::id_in(&ids))
        .build();

    list_documents(&*store, Collection::People, &filter, &LIST_VIEW, "People not found").await
}

pub async fn get_person<S: EntityStore>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    get_document(&*store, Collection::People, &id, &View::FULL, "Person not found").await
}

pub async fn create_person<S: EntityStore>(
    State(store): State<AppState<S>>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let new: NewPerson = parse_body(body)?;
    create_document(&*store, Collection::People, &new, &[]).await
}

pub async fn delete_person<S: EntityStore>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResult>> {
    delete_document(&*store, Collection::People, &id, "Person not found").await
}

pub async fn update_person<S: EntityStore>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<UpdateResult>> {
    if let Some(role) = body.get("role") {
        serde_json::from_value::<Role>(role.clone()).map_err(|_| {
            ApiError::BadRequest("The role is not boss, assistant or child".to_string())
        })?;
    }
    patch_document::<S, Person>(&*store, &id, body, &[], "Person not found").await
}

