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
    Collection, DeleteResult, Document, FilterBuilder, FilterExpr, NewTheme, Theme, UpdateResult,
};
use crate::store::traits::EntityStore;

const LIST_VIEW: View = View::select(&["title"]);

/// GET /themes?title=, a case-insensitive pattern
pub async fn list_themes<S: EntityStore>(
    State(store): State<AppState<S>>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Json<Vec<Value>>> {
    let params = ListParams::from(params);
    let filter = FilterBuilder::new()
        .and_some(params.first("title"), |title| {
            FilterExpr::matches_ignore_case("title", title)
        })
        .build();

    list_documents(&*store, Collection::Themes, &filter, &LIST_VIEW, "Themes not found").await
}

pub async fn get_theme<S: EntityStore>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    get_document(&*store, Collection::Themes, &id, &View::FULL, "Theme not found").await
}

pub async fn create_theme<S: EntityStore>(
    State(store): State<AppState<S>>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let new: NewTheme = parse_body(body)?;
    create_document(&*store, Collection::Themes, &new, &[]).await
}

pub async fn delete_theme<S: EntityStore>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResult>> {
    delete_document(&*store, Collection::Themes, &id, "Theme not found").await
}

pub async fn update_theme<S: EntityStore>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<UpdateResult>> {
    patch_document::<S, Theme>(&*store, &id, body, &[], "Theme not found").await
}
