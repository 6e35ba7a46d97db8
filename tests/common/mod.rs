#![allow(dead_code)]

use chrono::NaiveDate;
use duty_roster::manager::{DutyManager, StudentQuery};
use duty_roster::models::Student;
use duty_roster::roster::RosterEntry;

pub fn manager() -> DutyManager {
    DutyManager::connect(":memory:").expect("in-memory database")
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// `count` roster rows with IDs `{prefix}01..`, cycling through grades, genders, and countries.
pub fn entries(prefix: &str, count: usize) -> Vec<RosterEntry> {
    const COUNTRIES: [&str; 3] = ["Kenya", "Uganda", "Tanzania"];

    (1..=count)
        .map(|i| {
            RosterEntry::new(&format!("{prefix}{i:02}"), &format!("{prefix} Student {i}"))
                .with_grade(9 + (i % 3) as i32)
                .with_gender(if i % 2 == 0 { "F" } else { "M" })
                .with_country(COUNTRIES[i % COUNTRIES.len()])
        })
        .collect()
}

/// Imports `count` students and seats all of them at `table`.
pub fn seat(manager: &mut DutyManager, table: i32, prefix: &str, count: usize) -> Vec<Student> {
    let rows = entries(prefix, count);
    manager.import_students(&rows).unwrap();

    rows.iter()
        .map(|row| {
            manager
                .reassign_student(&row.student_id, Some(table))
                .unwrap()
        })
        .collect()
}

pub fn all_students(manager: &mut DutyManager) -> Vec<Student> {
    manager.get_roster(&StudentQuery::default()).unwrap()
}

/// Every table's cached count matches the students actually seated there.
pub fn assert_counts_consistent(manager: &mut DutyManager) {
    let students = all_students(manager);
    for table in manager.get_tables().unwrap() {
        let seated = students
            .iter()
            .filter(|s| s.table_number == Some(table.table_number))
            .count();
        assert_eq!(
            table.current_count as usize, seated,
            "table {} count is stale",
            table.table_number
        );
    }
}
