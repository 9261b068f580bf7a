use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde_json::Value;

use crate::api::error::{ApiError, ApiResult, OrApiError};
use crate::api::handlers::{
    create_with_role_check, delete_document, get_document, list_documents, parse_body,
    patch_document, AppState, RoleRequirement, View,
};
use crate::api::params::ListParams;
use crate::logic::{date_filter, resolve_if_present, Populate, QueryResolver, ReferenceField};
use crate::model::{
    parse_date, Collection, Course, DeleteResult, Document, FilterBuilder, FilterExpr, NewCourse,
    Role, UpdateResult,
};
use crate::store::traits::EntityStore;

const REFERENCES: &[ReferenceField] = &[
    ReferenceField::new("themeId", "theme", Collection::Themes),
    ReferenceField::new("classId", "class", Collection::Classes),
    ReferenceField::new("absence", "child for absence", Collection::Children),
];

const CANTON_NAME: &[Populate] =
    &[Populate::new("cantonId", Collection::Cantons).select(&["name"])];

const LIST_POPULATE: &[Populate] = &[
    Populate::new("themeId", Collection::Themes).select(&["title"]),
    Populate::new("classId", Collection::Classes)
        .select(&["periode"])
        .nested(CANTON_NAME),
];

const LIST_VIEW: View = View::select(&["date"]).populate(LIST_POPULATE);

/// Parse a `date` query parameter; a value that is present but unreadable is rejected
pub(crate) fn date_param(params: &ListParams) -> ApiResult<Option<chrono::DateTime<chrono::Utc>>> {
    params
        .first("date")
        .map(|raw| {
            parse_date(raw).ok_or_else(|| {
                ApiError::BadRequest(format!("Bad request: invalid date '{}'", raw))
            })
        })
        .transpose()
}

/// GET /courses?themeTitle=&classCanton=&date=
pub async fn list_courses<S: EntityStore>(
    State(store): State<AppState<S>>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Json<Vec<Value>>> {
    let params = ListParams::from(params);
    let date = date_param(&params)?;
    let resolver = QueryResolver::new(&*store);

    let (by_theme, by_canton) = tokio::try_join!(
        resolve_if_present(params.first("themeTitle"), |title| resolver.themes_by_title(title)),
        resolve_if_present(params.all("classCanton"), |names| {
            resolver.classes_by_canton_name(names)
        }),
    )
    .or_not_found("Courses not found")?;

    let filter = FilterBuilder::new()
        .and_some(by_theme, |ids| FilterExpr::ref_in("themeId", &ids))
        .and_some(by_canton, |ids| FilterExpr::ref_in("classId", &ids))
        .and_some(date, date_filter)
        .build();

    list_documents(&*store, Collection::Courses, &filter, &LIST_VIEW, "Courses not found").await
}

pub async fn get_course<S: EntityStore>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    get_document(&*store, Collection::Courses, &id, &View::FULL, "Course not found").await
}

pub async fn create_course<S: EntityStore>(
    State(store): State<AppState<S>>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let new: NewCourse = parse_body(body)?;
    let requirement = RoleRequirement {
        person_ids: new.absence.clone(),
        role: Role::Child,
        conflict: "Role of one or more people for absence is not child",
    };
    create_with_role_check(&*store, Collection::Courses, &new, REFERENCES, requirement).await
}

pub async fn delete_course<S: EntityStore>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResult>> {
    delete_document(&*store, Collection::Courses, &id, "Course not found").await
}

pub async fn update_course<S: EntityStore>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<UpdateResult>> {
    patch_document::<S, Course>(&*store, &id, body, REFERENCES, "Course not found").await
}
