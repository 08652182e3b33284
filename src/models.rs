use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};

use crate::err::Error;

pub const DEFAULT_SECTION: &str = "A";
pub const DEFAULT_CLASS: i32 = 1;
/// Classes offered by the sheet and report selectors.
pub const CLASSES: std::ops::RangeInclusive<i32> = 1..=10;

const MAX_NAME: usize = 100;
const MAX_SECTION: usize = 10;
const MAX_CONTACT: usize = 15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    pub id: i32,
    pub student_id: String,
    pub name: String,
    pub father_name: String,
    pub mother_name: String,
    pub student_class: i32,
    pub section: String,
    pub date_of_birth: NaiveDate,
    pub contact_number: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attendance {
    pub id: i32,
    pub student: i32,
    pub date: NaiveDate,
    pub is_present: bool,
}

/// Attendance state of a student on one date. `Unmarked` means no row exists.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Mark {
    Present,
    Absent,
    Unmarked,
}

impl Mark {
    pub fn of(record: Option<&Attendance>) -> Mark {
        match record {
            Some(att) if att.is_present => Mark::Present,
            Some(_) => Mark::Absent,
            None => Mark::Unmarked,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mark::Present => "Present",
            Mark::Absent => "Absent",
            Mark::Unmarked => "Not Marked",
        }
    }
}

impl Serialize for Mark {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MarkedStudent {
    pub student: Student,
    pub status: Mark,
}

/// Registration form as posted by the add-student page.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterStudent {
    pub student_class: i32,
    #[serde(default)]
    pub section: Option<String>,
    pub name: String,
    pub father_name: String,
    pub mother_name: String,
    pub date_of_birth: NaiveDate,
    #[serde(default)]
    pub contact_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// A validated registration, ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStudent {
    pub name: String,
    pub father_name: String,
    pub mother_name: String,
    pub student_class: i32,
    pub section: String,
    pub date_of_birth: NaiveDate,
    pub contact_number: Option<String>,
    pub address: Option<String>,
}

impl RegisterStudent {
    pub fn validate(self) -> Result<NewStudent, Error> {
        if !(1..=99).contains(&self.student_class) {
            return Err(Error::invalid(format!(
                "`student_class` must be between 1 and 99, got {}",
                self.student_class
            )));
        }
        let section = match blank_to_none(self.section) {
            Some(section) => bounded("section", section, MAX_SECTION)?,
            None => DEFAULT_SECTION.to_string(),
        };
        let contact_number = match blank_to_none(self.contact_number) {
            Some(contact) => Some(bounded("contact_number", contact, MAX_CONTACT)?),
            None => None,
        };

        Ok(NewStudent {
            name: required("name", self.name)?,
            father_name: required("father_name", self.father_name)?,
            mother_name: required("mother_name", self.mother_name)?,
            student_class: self.student_class,
            section,
            date_of_birth: self.date_of_birth,
            contact_number,
            address: blank_to_none(self.address),
        })
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(field: &str, value: String) -> Result<String, Error> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(Error::invalid(format!("`{}` parameter was empty", field)));
    }
    bounded(field, value, MAX_NAME)
}

fn bounded(field: &str, value: String, max: usize) -> Result<String, Error> {
    if value.chars().count() > max {
        return Err(Error::invalid(format!(
            "`{}` must be at most {} characters",
            field, max
        )));
    }
    Ok(value)
}

/// Body of `POST /save-attendance/`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SaveAttendance {
    pub date: NaiveDate,
    pub attendance: BTreeMap<i32, bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassDateQuery {
    pub date: Option<String>,
    pub class: Option<String>,
}

impl ClassDateQuery {
    /// Resolves blank or missing values to class 1 and `today`.
    pub fn resolve(&self, today: NaiveDate) -> Result<(i32, NaiveDate), Error> {
        let class = match self.class.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_CLASS,
            Some(raw) => raw
                .parse::<i32>()
                .map_err(|_| Error::invalid(format!("Invalid class `{}`", raw)))?,
        };
        let date = match self.date.as_deref().map(str::trim) {
            None | Some("") => today,
            Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| Error::invalid(format!("Invalid date `{}`, expected YYYY-MM-DD", raw)))?,
        };
        Ok((class, date))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}
