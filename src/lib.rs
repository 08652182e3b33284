pub mod attendance;
pub mod config;
pub mod err;
pub mod models;
pub mod report;
pub mod reports;
pub mod schema;
pub mod store;
pub mod students;

use axum::handler::Handler;
use axum::routing::{get, post};
use axum::{Extension, Router};
use serde::Serialize;
use tower::ServiceBuilder;

pub use crate::err::Error;
use crate::err::{Fine, Maybe, Nothing};
use crate::store::SharedStore;

pub type Payload<T> = Result<Maybe<T>, Error>;

pub fn proceeds<V>(value: V) -> Payload<V>
where
    V: Serialize,
{
    Ok(Fine(value))
}

pub fn breaks<V>(err: Error) -> Payload<V>
where
    V: Serialize,
{
    Ok(Nothing(err))
}

/// Builds the HTTP application on top of `store`.
pub fn app(store: SharedStore) -> Router {
    Router::new()
        .route("/", get(students::index))
        .route("/students/", get(students::student_list))
        .route(
            "/add-student/",
            get(students::student_form).post(students::add_student),
        )
        .route("/attendance/", get(attendance::attendance_sheet))
        .route("/save-attendance/", post(attendance::save_attendance))
        .route("/student-report/:id/", get(reports::student_report))
        .route("/class-report/", get(reports::class_report))
        .route("/search/", get(students::search_students))
        .fallback(err::handler404.into_service())
        .layer(ServiceBuilder::new().layer(Extension(store)))
}
