//! Reads student rosters exported from a spreadsheet as CSV.
//!
//! The `Student ID` and `Full Name` columns are required. `Grade`, `Gender`, and `Country` are
//! picked up when present; any other column is ignored.

use crate::error::{DutyError, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::warn;

/// Columns every roster must have.
pub const REQUIRED_COLUMNS: [&str; 2] = ["Student ID", "Full Name"];

#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(rename = "Student ID")]
    student_id: String,
    #[serde(rename = "Full Name")]
    full_name: String,
    #[serde(rename = "Grade", default)]
    grade: Option<String>,
    #[serde(rename = "Gender", default)]
    gender: Option<String>,
    #[serde(rename = "Country", default)]
    country: Option<String>,
}

/// One student as listed on an imported roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub student_id: String,
    pub full_name: String,
    pub grade: Option<i32>,
    pub gender: Option<String>,
    pub country: Option<String>,
}

impl RosterEntry {
    pub fn new(student_id: &str, full_name: &str) -> Self {
        Self {
            student_id: student_id.to_string(),
            full_name: full_name.to_string(),
            grade: None,
            gender: None,
            country: None,
        }
    }

    pub fn with_grade(mut self, grade: i32) -> Self {
        self.grade = Some(grade);
        self
    }

    pub fn with_gender(mut self, gender: &str) -> Self {
        self.gender = Some(gender.to_string());
        self
    }

    pub fn with_country(mut self, country: &str) -> Self {
        self.country = Some(country.to_string());
        self
    }
}

/// The readable entries of a roster file, plus how many rows could not be read at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    pub entries: Vec<RosterEntry>,
    /// Rows that were too short or otherwise malformed to deserialize.
    pub unreadable: usize,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Spreadsheet exports often write whole numbers as `10.0`, so those are accepted too.
fn parse_grade(student_id: &str, raw: Option<String>) -> Option<i32> {
    let raw = non_empty(raw)?;

    if let Ok(grade) = raw.parse::<i32>() {
        return Some(grade);
    }

    match raw.parse::<f64>() {
        Ok(grade) if grade.fract() == 0.0 && grade.abs() <= f64::from(i32::MAX) => {
            Some(grade as i32)
        }
        _ => {
            warn!(student_id, grade = %raw, "ignoring unreadable grade");
            None
        }
    }
}

/// Parses a CSV roster from `reader`.
///
/// Malformed rows are skipped and counted in [`Roster::unreadable`]; only a missing required
/// column or an I/O failure aborts the read.
pub fn read_roster<R: Read>(reader: R) -> Result<Roster> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .collect();
    if !missing.is_empty() {
        return Err(DutyError::MissingColumns(REQUIRED_COLUMNS.join(", ")));
    }

    let mut roster = Roster::default();
    for row in reader.deserialize::<RosterRow>() {
        let row = match row {
            Ok(row) => row,
            Err(err) if matches!(err.kind(), csv::ErrorKind::Io(_)) => return Err(err.into()),
            Err(err) => {
                let line = err.position().map(|pos| pos.line());
                warn!(?line, error = %err, "skipping unreadable roster row");
                roster.unreadable += 1;
                continue;
            }
        };

        let student_id = row.student_id.trim().to_string();
        let grade = parse_grade(&student_id, row.grade);

        roster.entries.push(RosterEntry {
            full_name: row.full_name.trim().to_string(),
            student_id,
            grade,
            gender: non_empty(row.gender),
            country: non_empty(row.country),
        });
    }

    Ok(roster)
}

/// Parses the CSV roster stored at `path`.
pub fn read_roster_file(path: &Path) -> Result<Roster> {
    let file = File::open(path)?;
    read_roster(file)
}
