mod memory;
mod pg;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::err::Error;
use crate::models::{Attendance, NewStudent, Student};

pub use memory::MemoryStore;
pub use pg::PgStore;

/// Highest per-class sequence number that still fits `STU<cc><nnn>`.
pub const MAX_SEQUENCE: i32 = 999;

pub type SharedStore = Arc<dyn Store>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Inserts a student, assigning the next id of its class.
    async fn register_student(&self, student: NewStudent) -> Result<Student, Error>;

    async fn count_students(&self) -> Result<i64, Error>;

    /// All students ordered by class, then name.
    async fn list_students(&self) -> Result<Vec<Student>, Error>;

    async fn find_student(&self, id: i32) -> Result<Option<Student>, Error>;

    /// Students of one class ordered by name.
    async fn students_in_class(&self, student_class: i32) -> Result<Vec<Student>, Error>;

    /// Attendance rows of a class on one date.
    async fn marks_on(&self, student_class: i32, date: NaiveDate)
        -> Result<Vec<Attendance>, Error>;

    /// Attendance rows of one student, newest first.
    async fn student_history(&self, id: i32) -> Result<Vec<Attendance>, Error>;

    /// Upserts every mark of the batch, or none of them.
    async fn save_marks(&self, date: NaiveDate, marks: &BTreeMap<i32, bool>)
        -> Result<usize, Error>;

    /// Case-insensitive substring search over name and student id.
    async fn search(&self, query: &str) -> Result<Vec<Student>, Error>;
}

pub fn student_code(student_class: i32, sequence: i32) -> String {
    format!("STU{:02}{:03}", student_class, sequence)
}

fn sequence_exhausted(student_class: i32) -> Error {
    Error::Conflict {
        message: format!(
            "Class {} has no free student numbers left (maximum {})",
            student_class, MAX_SEQUENCE
        ),
    }
}

fn unknown_students(ids: &[i32]) -> Error {
    let ids = ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    Error::not_found(format!("Unknown student id(s): {}", ids))
}
