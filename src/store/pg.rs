use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::{sequence_exhausted, student_code, unknown_students, Store, MAX_SEQUENCE};
use crate::err::Error;
use crate::models::{Attendance, NewStudent, Student};
use crate::schema;

#[derive(Clone)]
pub struct PgStore {
    pg: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pg = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        schema::prepare(&pg).await?;
        Ok(Self { pg })
    }
}

/// Escapes LIKE metacharacters and wraps the query for substring matching.
pub(crate) fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl Store for PgStore {
    async fn register_student(&self, student: NewStudent) -> Result<Student, Error> {
        let mut tx = self.pg.begin().await?;

        // first use of a class seeds its counter from the current population
        let (sequence,): (i32,) = sqlx::query_as(
            "INSERT INTO class_sequences (student_class, last_value) \
             VALUES ($1, (SELECT COUNT(*) FROM students WHERE student_class = $1)::INTEGER + 1) \
             ON CONFLICT (student_class) \
             DO UPDATE SET last_value = class_sequences.last_value + 1 \
             RETURNING last_value",
        )
        .bind(student.student_class)
        .fetch_one(&mut tx)
        .await?;

        if sequence > MAX_SEQUENCE {
            return Err(sequence_exhausted(student.student_class));
        }

        let created = sqlx::query_as::<_, Student>(
            "INSERT INTO students \
             (student_id, name, father_name, mother_name, student_class, section, date_of_birth, contact_number, address) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
        )
        .bind(student_code(student.student_class, sequence))
        .bind(&student.name)
        .bind(&student.father_name)
        .bind(&student.mother_name)
        .bind(student.student_class)
        .bind(&student.section)
        .bind(student.date_of_birth)
        .bind(&student.contact_number)
        .bind(&student.address)
        .fetch_one(&mut tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn count_students(&self) -> Result<i64, Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM students")
            .fetch_one(&self.pg)
            .await?;
        Ok(count)
    }

    async fn list_students(&self) -> Result<Vec<Student>, Error> {
        let students = sqlx::query_as::<_, Student>(
            "SELECT * FROM students ORDER BY student_class, name, id",
        )
        .fetch_all(&self.pg)
        .await?;
        Ok(students)
    }

    async fn find_student(&self, id: i32) -> Result<Option<Student>, Error> {
        let student = sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = $1 LIMIT 1")
            .bind(id)
            .fetch_optional(&self.pg)
            .await?;
        Ok(student)
    }

    async fn students_in_class(&self, student_class: i32) -> Result<Vec<Student>, Error> {
        let students = sqlx::query_as::<_, Student>(
            "SELECT * FROM students WHERE student_class = $1 ORDER BY name, id",
        )
        .bind(student_class)
        .fetch_all(&self.pg)
        .await?;
        Ok(students)
    }

    async fn marks_on(
        &self,
        student_class: i32,
        date: NaiveDate,
    ) -> Result<Vec<Attendance>, Error> {
        let marks = sqlx::query_as::<_, Attendance>(
            "SELECT a.* FROM attendance a \
             JOIN students s ON s.id = a.student \
             WHERE s.student_class = $1 AND a.date = $2",
        )
        .bind(student_class)
        .bind(date)
        .fetch_all(&self.pg)
        .await?;
        Ok(marks)
    }

    async fn student_history(&self, id: i32) -> Result<Vec<Attendance>, Error> {
        let marks = sqlx::query_as::<_, Attendance>(
            "SELECT * FROM attendance WHERE student = $1 ORDER BY date DESC",
        )
        .bind(id)
        .fetch_all(&self.pg)
        .await?;
        Ok(marks)
    }

    async fn save_marks(
        &self,
        date: NaiveDate,
        marks: &BTreeMap<i32, bool>,
    ) -> Result<usize, Error> {
        let ids: Vec<i32> = marks.keys().copied().collect();
        let mut tx = self.pg.begin().await?;

        let known: Vec<(i32,)> = sqlx::query_as("SELECT id FROM students WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut tx)
            .await?;
        let missing: Vec<i32> = ids
            .iter()
            .copied()
            .filter(|id| !known.iter().any(|(k,)| k == id))
            .collect();
        if !missing.is_empty() {
            return Err(unknown_students(&missing));
        }

        for (student, is_present) in marks {
            sqlx::query(
                "INSERT INTO attendance (student, date, is_present) VALUES ($1, $2, $3) \
                 ON CONFLICT (student, date) DO UPDATE SET is_present = EXCLUDED.is_present",
            )
            .bind(student)
            .bind(date)
            .bind(is_present)
            .execute(&mut tx)
            .await?;
        }

        tx.commit().await?;
        Ok(marks.len())
    }

    async fn search(&self, query: &str) -> Result<Vec<Student>, Error> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let students = sqlx::query_as::<_, Student>(
            "SELECT * FROM students WHERE name ILIKE $1 OR student_id ILIKE $1 \
             ORDER BY student_class, name, id",
        )
        .bind(like_pattern(query))
        .fetch_all(&self.pg)
        .await?;
        Ok(students)
    }
}
