use crate::error::DutyError;
use crate::schema::{daily_duties, dining_tables, students, terms, weekly_assignments};
use chrono::NaiveDate;
use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::Sqlite;
use std::fmt;
use std::str::FromStr;

/// A student on the roster.
///
/// `id` is the database key used by duty slots, `student_id` is the externally issued
/// identifier that appears on imported rosters.
#[derive(Queryable, Selectable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = students)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Student {
    pub id: i32,
    pub student_id: String,
    pub full_name: String,
    pub grade: Option<i32>,
    pub gender: Option<String>,
    pub country: Option<String>,
    pub table_number: Option<i32>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = students)]
pub struct NewStudent<'a> {
    pub student_id: &'a str,
    pub full_name: &'a str,
    pub grade: Option<i32>,
    pub gender: Option<&'a str>,
    pub country: Option<&'a str>,
}

/// The subset of a [`Student`] shown in a duty slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentSummary {
    pub id: i32,
    pub student_id: String,
    pub full_name: String,
}

impl From<&Student> for StudentSummary {
    fn from(student: &Student) -> Self {
        Self {
            id: student.id,
            student_id: student.student_id.clone(),
            full_name: student.full_name.clone(),
        }
    }
}

/// A dining-hall table. `capacity` is descriptive only and `current_count` is a cache of the
/// number of students seated at `table_number`.
#[derive(Queryable, Selectable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = dining_tables)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DiningTable {
    pub id: i32,
    pub table_number: i32,
    pub capacity: i32,
    pub current_count: i32,
}

#[derive(Insertable)]
#[diesel(table_name = dining_tables)]
pub struct NewDiningTable {
    pub table_number: i32,
    pub capacity: i32,
}

#[derive(Queryable, Selectable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = terms)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Term {
    pub id: i32,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub weeks: i32,
    pub is_active: bool,
}

#[derive(Insertable)]
#[diesel(table_name = terms)]
pub struct NewTerm<'a> {
    pub name: &'a str,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub weeks: i32,
    pub is_active: bool,
}

/// The table on duty for one week of a term.
#[derive(Queryable, Selectable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = weekly_assignments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WeeklyAssignment {
    pub id: i32,
    pub term_id: i32,
    pub week_number: i32,
    pub table_number: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Insertable)]
#[diesel(table_name = weekly_assignments)]
pub struct NewWeeklyAssignment {
    pub term_id: i32,
    pub week_number: i32,
    pub table_number: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// One of the two daily service windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub enum Shift {
    Am,
    Pm,
}

impl Shift {
    /// Both shifts, in the order they occur during a day.
    pub const ALL: [Shift; 2] = [Shift::Am, Shift::Pm];

    pub fn as_str(self) -> &'static str {
        match self {
            Shift::Am => "AM",
            Shift::Pm => "PM",
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Shift {
    type Err = DutyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AM" => Ok(Shift::Am),
            "PM" => Ok(Shift::Pm),
            other => Err(DutyError::InvalidShift(other.to_string())),
        }
    }
}

impl ToSql<Text, Sqlite> for Shift {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_str());
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Sqlite> for Shift {
    fn from_sql(bytes: <Sqlite as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        let value = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
        Ok(value.parse::<Shift>()?)
    }
}

/// Which of the two student positions of a [`DailyDuty`] to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Slot {
    First,
    Second,
}

impl Slot {
    pub fn index(self) -> usize {
        match self {
            Slot::First => 0,
            Slot::Second => 1,
        }
    }
}

/// A single shift on a single date, staffed by up to two students.
///
/// The two positions are stored as `student1_id` / `student2_id` and surfaced here as an
/// ordered pair indexed by [`Slot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyDuty {
    pub id: i32,
    pub weekly_assignment_id: i32,
    pub date: NaiveDate,
    pub shift: Shift,
    pub students: [Option<i32>; 2],
}

impl DailyDuty {
    pub fn student(&self, slot: Slot) -> Option<i32> {
        self.students[slot.index()]
    }

    pub fn is_fully_staffed(&self) -> bool {
        self.students.iter().all(Option::is_some)
    }
}

impl Queryable<daily_duties::SqlType, Sqlite> for DailyDuty {
    type Row = (i32, i32, NaiveDate, Shift, Option<i32>, Option<i32>);

    fn build(
        (id, weekly_assignment_id, date, shift, first, second): Self::Row,
    ) -> deserialize::Result<Self> {
        Ok(Self {
            id,
            weekly_assignment_id,
            date,
            shift,
            students: [first, second],
        })
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = daily_duties)]
pub struct NewDailyDuty {
    pub weekly_assignment_id: i32,
    pub date: NaiveDate,
    pub shift: Shift,
    pub student1_id: Option<i32>,
    pub student2_id: Option<i32>,
}

impl NewDailyDuty {
    pub fn new(
        weekly_assignment_id: i32,
        date: NaiveDate,
        shift: Shift,
        [student1_id, student2_id]: [Option<i32>; 2],
    ) -> Self {
        Self {
            weekly_assignment_id,
            date,
            shift,
            student1_id,
            student2_id,
        }
    }
}
