//! Runs the store scenarios against a real PostgreSQL database.
//!
//! `DATABASE_URL=postgres://... cargo test --test pg -- --ignored`
//!
//! Each test owns one class number in the 90s and clears it first, so the
//! target database may hold other data.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use sqlx::PgPool;

use rollbook::models::NewStudent;
use rollbook::store::{PgStore, Store, MAX_SEQUENCE};
use rollbook::Error;

// concurrent CREATE TABLE IF NOT EXISTS can still collide on a fresh database
static SCHEMA: Mutex<()> = Mutex::new(());

async fn connect(student_class: i32) -> (PgStore, PgPool) {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at PostgreSQL");
    let store = {
        let _guard = SCHEMA.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        PgStore::connect(&url, 8).await.expect("connect store")
    };
    let pg = PgPool::connect(&url).await.expect("connect pool");

    sqlx::query("DELETE FROM students WHERE student_class = $1")
        .bind(student_class)
        .execute(&pg)
        .await
        .expect("clear students");
    sqlx::query("DELETE FROM class_sequences WHERE student_class = $1")
        .bind(student_class)
        .execute(&pg)
        .await
        .expect("clear sequence");
    (store, pg)
}

fn new_student(name: &str, student_class: i32) -> NewStudent {
    NewStudent {
        name: name.to_string(),
        father_name: "Father".to_string(),
        mother_name: "Mother".to_string(),
        student_class,
        section: "A".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
        contact_number: None,
        address: None,
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

async fn attendance_rows(pg: &PgPool, student: i32) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM attendance WHERE student = $1")
        .bind(student)
        .fetch_one(pg)
        .await
        .expect("count attendance");
    count
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn sequence_seeds_from_existing_students() {
    let (store, pg) = connect(91).await;

    // rows that predate the counter table
    for (code, name) in [("STU91001", "Old A"), ("STU91002", "Old B")] {
        sqlx::query(
            "INSERT INTO students (student_id, name, father_name, mother_name, student_class, section, date_of_birth) \
             VALUES ($1, $2, 'F', 'M', 91, 'A', '2015-01-01')",
        )
        .bind(code)
        .bind(name)
        .execute(&pg)
        .await
        .expect("insert legacy student");
    }

    let third = store.register_student(new_student("New", 91)).await.unwrap();
    assert_eq!(third.student_id, "STU91003");
    let fourth = store.register_student(new_student("Newer", 91)).await.unwrap();
    assert_eq!(fourth.student_id, "STU91004");
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn concurrent_registrations_get_distinct_ids() {
    let (store, _pg) = connect(92).await;
    let store = Arc::new(store);

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .register_student(new_student(&format!("S{}", i), 92))
                    .await
                    .unwrap()
                    .student_id
            })
        })
        .collect();
    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 16);
    assert_eq!(ids.first().map(String::as_str), Some("STU92001"));
    assert_eq!(ids.last().map(String::as_str), Some("STU92016"));
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn exhausted_sequence_rolls_back() {
    let (store, pg) = connect(93).await;
    sqlx::query("INSERT INTO class_sequences (student_class, last_value) VALUES (93, $1)")
        .bind(MAX_SEQUENCE)
        .execute(&pg)
        .await
        .expect("preset sequence");

    let err = store.register_student(new_student("Late", 93)).await.unwrap_err();
    assert!(matches!(err, Error::Conflict { .. }));

    let (last,): (i32,) =
        sqlx::query_as("SELECT last_value FROM class_sequences WHERE student_class = 93")
            .fetch_one(&pg)
            .await
            .expect("read sequence");
    assert_eq!(last, MAX_SEQUENCE);
    assert!(store.students_in_class(93).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn resaving_overwrites_in_place() {
    let (store, pg) = connect(94).await;
    let s = store.register_student(new_student("A", 94)).await.unwrap();

    store.save_marks(day(10), &BTreeMap::from([(s.id, true)])).await.unwrap();
    store.save_marks(day(10), &BTreeMap::from([(s.id, false)])).await.unwrap();

    assert_eq!(attendance_rows(&pg, s.id).await, 1);
    let history = store.student_history(s.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert!(!history[0].is_present);

    let marks = store.marks_on(94, day(10)).await.unwrap();
    assert_eq!(marks.len(), 1);
    assert!(store.marks_on(94, day(11)).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn unknown_student_writes_nothing() {
    let (store, pg) = connect(95).await;
    let s = store.register_student(new_student("A", 95)).await.unwrap();

    let batch = BTreeMap::from([(s.id, true), (i32::MAX, false)]);
    let err = store.save_marks(day(10), &batch).await.unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
    assert_eq!(attendance_rows(&pg, s.id).await, 0);
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn search_treats_wildcards_literally() {
    let (store, _pg) = connect(96).await;
    store.register_student(new_student("Ravi_K", 96)).await.unwrap();
    store.register_student(new_student("RaviXK", 96)).await.unwrap();

    let hits = store.search("ravi_").await.unwrap();
    let names: Vec<_> = hits
        .into_iter()
        .filter(|s| s.student_class == 96)
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["Ravi_K"]);
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn deleting_a_student_cascades_to_attendance() {
    let (store, pg) = connect(97).await;
    let s = store.register_student(new_student("A", 97)).await.unwrap();
    store.save_marks(day(3), &BTreeMap::from([(s.id, true)])).await.unwrap();

    sqlx::query("DELETE FROM students WHERE id = $1")
        .bind(s.id)
        .execute(&pg)
        .await
        .expect("delete student");
    assert_eq!(attendance_rows(&pg, s.id).await, 0);
}
