use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use super::{sequence_exhausted, student_code, unknown_students, Store, MAX_SEQUENCE};
use crate::err::Error;
use crate::models::{Attendance, NewStudent, Student};

/// Process-local store. Every operation holds the lock for its whole duration.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    students: Vec<Student>,
    attendance: BTreeMap<(i32, NaiveDate), Attendance>,
    sequences: HashMap<i32, i32>,
    last_student: i32,
    last_attendance: i32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn by_class_then_name(a: &Student, b: &Student) -> std::cmp::Ordering {
    (a.student_class, &a.name, a.id).cmp(&(b.student_class, &b.name, b.id))
}

#[async_trait]
impl Store for MemoryStore {
    async fn register_student(&self, student: NewStudent) -> Result<Student, Error> {
        let mut guard = self.tables.lock().await;
        let tables = &mut *guard;
        let class = student.student_class;

        let current = match tables.sequences.get(&class) {
            Some(last) => *last,
            None => tables
                .students
                .iter()
                .filter(|s| s.student_class == class)
                .count() as i32,
        };
        let sequence = current + 1;
        if sequence > MAX_SEQUENCE {
            return Err(sequence_exhausted(class));
        }

        let code = student_code(class, sequence);
        if tables.students.iter().any(|s| s.student_id == code) {
            return Err(Error::Conflict {
                message: format!("Student id `{}` already exists", code),
            });
        }

        tables.sequences.insert(class, sequence);
        tables.last_student += 1;
        let created = Student {
            id: tables.last_student,
            student_id: code,
            name: student.name,
            father_name: student.father_name,
            mother_name: student.mother_name,
            student_class: class,
            section: student.section,
            date_of_birth: student.date_of_birth,
            contact_number: student.contact_number,
            address: student.address,
        };
        tables.students.push(created.clone());
        Ok(created)
    }

    async fn count_students(&self) -> Result<i64, Error> {
        Ok(self.tables.lock().await.students.len() as i64)
    }

    async fn list_students(&self) -> Result<Vec<Student>, Error> {
        let mut students = self.tables.lock().await.students.clone();
        students.sort_by(by_class_then_name);
        Ok(students)
    }

    async fn find_student(&self, id: i32) -> Result<Option<Student>, Error> {
        let tables = self.tables.lock().await;
        Ok(tables.students.iter().find(|s| s.id == id).cloned())
    }

    async fn students_in_class(&self, student_class: i32) -> Result<Vec<Student>, Error> {
        let tables = self.tables.lock().await;
        let mut students: Vec<Student> = tables
            .students
            .iter()
            .filter(|s| s.student_class == student_class)
            .cloned()
            .collect();
        students.sort_by(|a, b| (&a.name, a.id).cmp(&(&b.name, b.id)));
        Ok(students)
    }

    async fn marks_on(
        &self,
        student_class: i32,
        date: NaiveDate,
    ) -> Result<Vec<Attendance>, Error> {
        let tables = self.tables.lock().await;
        Ok(tables
            .students
            .iter()
            .filter(|s| s.student_class == student_class)
            .filter_map(|s| tables.attendance.get(&(s.id, date)).cloned())
            .collect())
    }

    async fn student_history(&self, id: i32) -> Result<Vec<Attendance>, Error> {
        let tables = self.tables.lock().await;
        Ok(tables
            .attendance
            .range((id, NaiveDate::MIN)..=(id, NaiveDate::MAX))
            .rev()
            .map(|(_, att)| att.clone())
            .collect())
    }

    async fn save_marks(
        &self,
        date: NaiveDate,
        marks: &BTreeMap<i32, bool>,
    ) -> Result<usize, Error> {
        let mut guard = self.tables.lock().await;
        let tables = &mut *guard;

        let missing: Vec<i32> = marks
            .keys()
            .copied()
            .filter(|id| !tables.students.iter().any(|s| s.id == *id))
            .collect();
        if !missing.is_empty() {
            return Err(unknown_students(&missing));
        }

        for (&student, &is_present) in marks {
            match tables.attendance.get_mut(&(student, date)) {
                Some(existing) => existing.is_present = is_present,
                None => {
                    tables.last_attendance += 1;
                    let id = tables.last_attendance;
                    tables.attendance.insert(
                        (student, date),
                        Attendance {
                            id,
                            student,
                            date,
                            is_present,
                        },
                    );
                }
            }
        }
        Ok(marks.len())
    }

    async fn search(&self, query: &str) -> Result<Vec<Student>, Error> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let needle = query.to_lowercase();
        let tables = self.tables.lock().await;
        let mut students: Vec<Student> = tables
            .students
            .iter()
            .filter(|s| {
                s.name.to_lowercase().contains(&needle)
                    || s.student_id.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        students.sort_by(by_class_then_name);
        Ok(students)
    }
}
