use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::extract::{Form, Query};
use axum::Extension;
use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::models::{RegisterStudent, SearchQuery, Student, CLASSES, DEFAULT_SECTION};
use crate::store::SharedStore;
use crate::{breaks, proceeds, Payload};

pub async fn index(Extension(store): Extension<SharedStore>) -> Payload<Dashboard> {
    let total_students = store.count_students().await?;
    proceeds(Dashboard {
        title: "School Attendance",
        total_students,
        classes: CLASSES.collect(),
        today: Local::now().date_naive(),
    })
}

pub async fn student_list(Extension(store): Extension<SharedStore>) -> Payload<StudentList> {
    let students = store.list_students().await?;
    proceeds(StudentList { students })
}

pub async fn student_form() -> Payload<StudentForm> {
    proceeds(StudentForm {
        classes: CLASSES.collect(),
        default_section: DEFAULT_SECTION,
    })
}

pub async fn add_student(
    Extension(store): Extension<SharedStore>,
    form: Result<Form<RegisterStudent>, FormRejection>,
) -> Payload<StudentAdded> {
    let Form(form) = form?;
    let new_student = match form.validate() {
        Ok(valid) => valid,
        Err(err) => return breaks(err),
    };

    let student = store.register_student(new_student).await?;
    log::info!(
        "Registered student {} ({}) in class {}",
        student.student_id,
        student.name,
        student.student_class
    );
    proceeds(StudentAdded {
        message: format!(
            "Student {} added successfully with ID: {}",
            student.name, student.student_id
        ),
        student,
    })
}

pub async fn search_students(
    Extension(store): Extension<SharedStore>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Payload<SearchResults> {
    let Query(SearchQuery { q }) = query?;
    let students = if q.is_empty() {
        Vec::new()
    } else {
        store.search(&q).await?
    };
    proceeds(SearchResults { students, query: q })
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    title: &'static str,
    total_students: i64,
    classes: Vec<i32>,
    today: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentList {
    students: Vec<Student>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentForm {
    classes: Vec<i32>,
    default_section: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentAdded {
    message: String,
    student: Student,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    students: Vec<Student>,
    query: String,
}
