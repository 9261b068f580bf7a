use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde_json::Value;

use crate::api::course_handlers::date_param;
use crate::api::error::{ApiResult, OrApiError};
use crate::api::handlers::{
    create_with_role_check, delete_document, get_document, list_documents, parse_body,
    patch_document, AppState, RoleRequirement, View,
};
use crate::api::params::ListParams;
use crate::logic::{resolve_if_present, Populate, QueryResolver, ReferenceField};
use crate::model::{
    Collection, DeleteResult, Document, FilterBuilder, FilterExpr, NewTeaching, Role, Teaching,
    UpdateResult,
};
use crate::store::traits::EntityStore;

const REFERENCES: &[ReferenceField] = &[
    ReferenceField::new("assistantId", "assistant", Collection::Assistants),
    ReferenceField::new("courseId", "course", Collection::Courses),
];

const PERSON_NAME: &[Populate] =
    &[Populate::new("_id", Collection::People).select(&["firstName", "lastName"])];
const COURSE_CLASS: &[Populate] = &[Populate::new("classId", Collection::Classes)];

const LIST_POPULATE: &[Populate] = &[
    Populate::new("assistantId", Collection::Assistants).nested(PERSON_NAME),
    Populate::new("courseId", Collection::Courses).nested(COURSE_CLASS),
];

const DETAIL_POPULATE: &[Populate] = &[
    Populate::new("assistantId", Collection::Assistants),
    Populate::new("courseId", Collection::Courses),
];

const LIST_VIEW: View = View::select(&[]).populate(LIST_POPULATE);
const DETAIL_VIEW: View = View::FULL.populate(DETAIL_POPULATE);

/// GET /teachings?assistantName=&courseTheme=&canton=&date=
pub async fn list_teachings<S: EntityStore>(
    State(store): State<AppState<S>>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Json<Vec<Value>>> {
    let params = ListParams::from(params);
    let date = date_param(&params)?;
    let resolver = QueryResolver::new(&*store);

    let (by_assistant, by_theme, by_canton, by_date) = tokio::try_join!(
        resolve_if_present(params.first("assistantName"), |name| resolver.people_by_name(name)),
        resolve_if_present(params.first("courseTheme"), |title| {
            resolver.courses_by_theme_title(title)
        }),
        resolve_if_present(params.all("canton"), |names| resolver.courses_by_canton_name(names)),
        resolve_if_present(date, |date| resolver.courses_by_date(date)),
    )
    .or_not_found("Teachings not found")?;

    let filter = FilterBuilder::new()
        .and_some(by_assistant, |ids| FilterExpr::ref_in("assistantId", &ids))
        .and_some(by_theme, |ids| FilterExpr::ref_in("courseId", &ids))
        .and_some(by_canton, |ids| FilterExpr::ref_in("courseId", &ids))
        .and_some(by_date, |ids| FilterExpr::ref_in("courseId", &ids))
        .build();

    list_documents(&*store, Collection::Teachings, &filter, &LIST_VIEW, "Teachings not found").await
}

pub async fn get_teaching<S: EntityStore>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    get_document(&*store, Collection::Teachings, &id, &DETAIL_VIEW, "Teaching not found").await
}

/// POST /teachings; the person behind the assistant must still have role assistant
pub async fn create_teaching<S: EntityStore>(
    State(store): State<AppState<S>>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let new: NewTeaching = parse_body(body)?;
    let requirement = RoleRequirement {
        person_ids: new.assistant_id.iter().cloned().collect(),
        role: Role::Assistant,
        conflict: "Role of the person is not assistant",
    };
    create_with_role_check(&*store, Collection::Teachings, &new, REFERENCES, requirement).await
}

pub async fn delete_teaching<S: EntityStore>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResult>> {
    delete_document(&*store, Collection::Teachings, &id, "Teaching not found").await
}

pub async fn update_teaching<S: EntityStore>(
    State(store): State<AppState<S>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<UpdateResult>> {
    patch_document::<S, Teaching>(&*store, &id, body, REFERENCES, "Teaching not found").await
}
