use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::Extension;
use chrono::Local;

use crate::models::ClassDateQuery;
use crate::report::{mark_sheet, ClassReport, StudentReport};
use crate::store::SharedStore;
use crate::{breaks, proceeds, Error, Payload};

pub async fn student_report(
    Extension(store): Extension<SharedStore>,
    id: Result<Path<i32>, PathRejection>,
) -> Payload<StudentReport> {
    let Path(id) = id?;
    let student = if let Some(student) = store.find_student(id).await? {
        student
    } else {
        return breaks(Error::not_found(format!(
            "Student with id `{}` does not exist!",
            id
        )));
    };

    let attendances = store.student_history(id).await?;
    proceeds(StudentReport::new(student, attendances))
}

pub async fn class_report(
    Extension(store): Extension<SharedStore>,
    query: Result<Query<ClassDateQuery>, QueryRejection>,
) -> Payload<ClassReport> {
    let Query(query) = query?;
    let (selected_class, selected_date) = query.resolve(Local::now().date_naive())?;

    let students = store.students_in_class(selected_class).await?;
    let records = store.marks_on(selected_class, selected_date).await?;
    proceeds(ClassReport::new(
        selected_class,
        selected_date,
        mark_sheet(students, records),
    ))
}
