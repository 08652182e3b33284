use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Attendance, Mark, MarkedStudent, Student, CLASSES};

/// Percentage of present days, rounded to two decimals with ties to even.
/// Zero when nothing was recorded.
pub fn attendance_percentage(present: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = present as f64 / total as f64 * 100.0;
    (raw * 100.0).round_ties_even() / 100.0
}

/// Pairs every student with its mark on the day the `records` were taken.
pub fn mark_sheet(students: Vec<Student>, records: Vec<Attendance>) -> Vec<MarkedStudent> {
    let by_student: HashMap<i32, Attendance> =
        records.into_iter().map(|att| (att.student, att)).collect();
    students
        .into_iter()
        .map(|student| {
            let status = Mark::of(by_student.get(&student.id));
            MarkedStudent { student, status }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentReport {
    pub student: Student,
    pub attendances: Vec<Attendance>,
    pub total_days: usize,
    pub present_days: usize,
    pub absent_days: usize,
    pub attendance_percentage: f64,
}

impl StudentReport {
    pub fn new(student: Student, attendances: Vec<Attendance>) -> Self {
        let total_days = attendances.len();
        let present_days = attendances.iter().filter(|a| a.is_present).count();
        Self {
            student,
            total_days,
            present_days,
            absent_days: total_days - present_days,
            attendance_percentage: attendance_percentage(present_days, total_days),
            attendances,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassReport {
    pub selected_class: i32,
    pub selected_date: NaiveDate,
    pub attendance_data: Vec<MarkedStudent>,
    pub total_students: usize,
    pub present_count: usize,
    pub absent_count: usize,
    pub not_marked_count: usize,
    pub classes: Vec<i32>,
}

impl ClassReport {
    pub fn new(selected_class: i32, selected_date: NaiveDate, sheet: Vec<MarkedStudent>) -> Self {
        let count = |mark: Mark| sheet.iter().filter(|row| row.status == mark).count();
        Self {
            selected_class,
            selected_date,
            total_students: sheet.len(),
            present_count: count(Mark::Present),
            absent_count: count(Mark::Absent),
            not_marked_count: count(Mark::Unmarked),
            attendance_data: sheet,
            classes: CLASSES.collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: i32, name: &str) -> Student {
        Student {
            id,
            student_id: format!("STU01{:03}", id),
            name: name.to_string(),
            father_name: "F".to_string(),
            mother_name: "M".to_string(),
            student_class: 1,
            section: "A".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
            contact_number: None,
            address: None,
        }
    }

    fn mark(id: i32, student: i32, day: u32, is_present: bool) -> Attendance {
        Attendance {
            id,
            student,
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            is_present,
        }
    }

    #[test]
    fn percentage_rounds_to_two_places() {
        assert_eq!(attendance_percentage(0, 0), 0.0);
        assert_eq!(attendance_percentage(1, 1), 100.0);
        assert_eq!(attendance_percentage(1, 3), 33.33);
        assert_eq!(attendance_percentage(2, 3), 66.67);
    }

    #[test]
    fn percentage_rounds_half_to_even() {
        // 1/32 is 3.125% exactly
        assert_eq!(attendance_percentage(1, 32), 3.12);
        assert_eq!(attendance_percentage(3, 32), 9.38);
    }

    #[test]
    fn student_report_totals_add_up() {
        let marks = vec![mark(1, 1, 3, true), mark(2, 1, 2, false), mark(3, 1, 1, true)];
        let report = StudentReport::new(student(1, "Asha"), marks);
        assert_eq!(report.total_days, 3);
        assert_eq!(report.present_days, 2);
        assert_eq!(report.absent_days, 1);
        assert_eq!(report.present_days + report.absent_days, report.total_days);
        assert_eq!(report.attendance_percentage, 66.67);
    }

    #[test]
    fn empty_history_reports_zero_percent() {
        let report = StudentReport::new(student(1, "Asha"), Vec::new());
        assert_eq!(report.total_days, 0);
        assert_eq!(report.attendance_percentage, 0.0);
    }

    #[test]
    fn class_report_counts_all_three_states() {
        let students = vec![student(1, "A"), student(2, "B"), student(3, "C"), student(4, "D")];
        let records = vec![mark(1, 1, 10, true), mark(2, 2, 10, false), mark(3, 4, 10, true)];
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let report = ClassReport::new(1, date, mark_sheet(students, records));

        assert_eq!(report.present_count, 2);
        assert_eq!(report.absent_count, 1);
        assert_eq!(report.not_marked_count, 1);
        assert_eq!(
            report.present_count + report.absent_count + report.not_marked_count,
            report.total_students
        );
        assert_eq!(report.attendance_data[2].status, Mark::Unmarked);
    }
}
