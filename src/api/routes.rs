use axum::{routing::get, Router};
use std::sync::Arc;

use crate::api::{
    assistant_handlers, canton_handlers, child_handlers, class_handlers, course_handlers,
    handlers, person_handlers, teaching_handlers, theme_handlers,
};
use crate::store::traits::EntityStore;

pub fn create_router<S: EntityStore + 'static>() -> Router<Arc<S>> {
    Router::new()
        .route("/", get(handlers::home))
        .route("/health", get(handlers::health_check))
        // People
        .route(
            "/people",
            get(person_handlers::list_people::<S>).post(person_handlers::create_person::<S>),
        )
        .route(
            "/people/:id",
            get(person_handlers::get_person::<S>)
                .patch(person_handlers::update_person::<S>)
                .delete(person_handlers::delete_person::<S>),
        )
        // Cantons
        .route(
            "/cantons",
            get(canton_handlers::list_cantons::<S>).post(canton_handlers::create_canton::<S>),
        )
        .route(
            "/cantons/:id",
            get(canton_handlers::get_canton::<S>)
                .patch(canton_handlers::update_canton::<S>)
                .delete(canton_handlers::delete_canton::<S>),
        )
        // Classes
        .route(
            "/classes",
            get(class_handlers::list_classes::<S>).post(class_handlers::create_class::<S>),
        )
        .route(
            "/classes/:id",
            get(class_handlers::get_class::<S>)
                .patch(class_handlers::update_class::<S>)
                .delete(class_handlers::delete_class::<S>),
        )
        // Courses
        .route(
            "/courses",
            get(course_handlers::list_courses::<S>).post(course_handlers::create_course::<S>),
        )
        .route(
            "/courses/:id",
            get(course_handlers::get_course::<S>)
                .patch(course_handlers::update_course::<S>)
                .delete(course_handlers::delete_course::<S>),
        )
        // Themes
        .route(
            "/themes",
            get(theme_handlers::list_themes::<S>).post(theme_handlers::create_theme::<S>),
        )
        .route(
            "/themes/:id",
            get(theme_handlers::get_theme::<S>)
                .patch(theme_handlers::update_theme::<S>)
                .delete(theme_handlers::delete_theme::<S>),
        )
        // Assistants
        .route(
            "/assistants",
            get(assistant_handlers::list_assistants::<S>)
                .post(assistant_handlers::create_assistant::<S>),
        )
        .route(
            "/assistants/:id",
            get(assistant_handlers::get_assistant::<S>)
                .patch(assistant_handlers::update_assistant::<S>)
                .delete(assistant_handlers::delete_assistant::<S>),
        )
        // Children
        .route(
            "/children",
            get(child_handlers::list_children::<S>).post(child_handlers::create_child::<S>),
        )
        .route(
            "/children/:id",
            get(child_handlers::get_child::<S>)
                .patch(child_handlers::update_child::<S>)
                .delete(child_handlers::delete_child::<S>),
        )
        // Teachings
        .route(
            "/teachings",
            get(teaching_handlers::list_teachings::<S>)
                .post(teaching_handlers::create_teaching::<S>),
        )
        .route(
            "/teachings/:id",
            get(teaching_handlers::get_teaching::<S>)
                .patch(teaching_handlers::update_teaching::<S>)
                .delete(teaching_handlers::delete_teaching::<S>),
        )
}
