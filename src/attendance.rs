use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::{Extension, Json};
use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::models::{ClassDateQuery, MarkedStudent, SaveAttendance, CLASSES};
use crate::report::mark_sheet;
use crate::store::SharedStore;
use crate::{proceeds, Payload};

/// Sheet of a class on one date, pre-filled with the marks already saved.
pub async fn attendance_sheet(
    Extension(store): Extension<SharedStore>,
    query: Result<Query<ClassDateQuery>, QueryRejection>,
) -> Payload<AttendanceSheet> {
    let Query(query) = query?;
    let (selected_class, selected_date) = query.resolve(Local::now().date_naive())?;

    let students = store.students_in_class(selected_class).await?;
    let records = store.marks_on(selected_class, selected_date).await?;
    proceeds(AttendanceSheet {
        selected_date,
        selected_class,
        students: mark_sheet(students, records),
        classes: CLASSES.collect(),
    })
}

pub async fn save_attendance(
    Extension(store): Extension<SharedStore>,
    payload: Result<Json<SaveAttendance>, JsonRejection>,
) -> Payload<AttendanceSaved> {
    let Json(SaveAttendance { date, attendance }) = payload?;
    let saved = store.save_marks(date, &attendance).await?;
    log::info!("Saved {} attendance mark(s) for {}", saved, date);
    proceeds(AttendanceSaved {
        message: "Attendance saved successfully",
        saved,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceSheet {
    selected_date: NaiveDate,
    selected_class: i32,
    students: Vec<MarkedStudent>,
    classes: Vec<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceSaved {
    message: &'static str,
    saved: usize,
}
