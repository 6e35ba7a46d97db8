//! The manager for recording, modifying, and retrieving students, tables, terms, and the duty
//! roster.
//!
//! Every mutating operation runs inside a single `BEGIN IMMEDIATE` transaction: either all of
//! its writes land or none do, and SQLite's write lock is taken before anything is read, so two
//! operations on the same term (say, generating the whole term while one of its weeks is being
//! regenerated) never interleave.

use crate::distributor;
use crate::error::{DutyError, Result};
use crate::models::{
    DailyDuty, DiningTable, NewDailyDuty, NewDiningTable, NewStudent, NewTerm, NewWeeklyAssignment,
    Shift, Slot, Student, StudentSummary, Term, WeeklyAssignment,
};
use crate::roster::{self, RosterEntry};
use crate::rotation;
use crate::schema::{daily_duties, dining_tables, students, terms, weekly_assignments};
use crate::settings::Settings;
use chrono::NaiveDate;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info, warn};

/// Table definitions, applied on every connect. All statements are `IF NOT EXISTS`.
const SCHEMA: &str = include_str!("../migrations/2025-01-06-000000_create_duty_tables/up.sql");

/// Which students to list, by table membership.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TableFilter {
    #[default]
    Any,
    Unassigned,
    Table(i32),
}

/// Column to sort the roster by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SortKey {
    #[default]
    StudentId,
    Name,
    Grade,
    Table,
    Country,
}

/// Filters and ordering for [`DutyManager::get_roster`].
#[derive(Debug, Clone, Default)]
pub struct StudentQuery {
    pub table: TableFilter,
    pub grade: Option<i32>,
    pub country: Option<String>,
    /// Case-insensitive substring of the name or student ID.
    pub search: Option<String>,
    pub sort: SortKey,
    pub descending: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Number of new students written.
    pub imported: usize,
    /// Student IDs that were already on the roster (or repeated in the input).
    pub skipped: Vec<String>,
    /// Rows without a student ID or name, or too malformed to read.
    pub rejected: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DistributionReport {
    pub assigned: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleReport {
    pub weeks: usize,
    pub duties: usize,
    /// Weeks whose table had nobody seated, so no daily duties were created.
    pub empty_weeks: Vec<i32>,
}

/// A daily duty with its students resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DutyView {
    pub id: i32,
    pub shift: Shift,
    pub students: [Option<StudentSummary>; 2],
}

/// One day of the weekly grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayView {
    pub date: NaiveDate,
    pub am: Option<DutyView>,
    pub pm: Option<DutyView>,
}

impl DayView {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            am: None,
            pm: None,
        }
    }

    pub fn shift(&self, shift: Shift) -> Option<&DutyView> {
        match shift {
            Shift::Am => self.am.as_ref(),
            Shift::Pm => self.pm.as_ref(),
        }
    }
}

/// A week of the duty roster laid out as 7 days by 2 shifts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekView {
    pub assignment: WeeklyAssignment,
    pub days: Vec<DayView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DutyStatus {
    OnTrack,
    Under,
}

impl DutyStatus {
    /// A student is on track with at least one duty per week of the term, give or take one.
    pub fn for_count(duty_count: i64, weeks: i32) -> Self {
        if duty_count >= i64::from(weeks) - 1 {
            DutyStatus::OnTrack
        } else {
            DutyStatus::Under
        }
    }
}

/// How many duties a student has in a term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DutyStanding {
    pub student: Student,
    pub duty_count: i64,
    pub expected: i32,
    pub status: DutyStatus,
}

/// The manager for recording, modifying, and retrieving duty roster data.
pub struct DutyManager {
    db: SqliteConnection,
}

impl DutyManager {
    /// Opens (creating if needed) the SQLite database at `database_url` and makes sure all
    /// tables exist.
    pub fn connect(database_url: &str) -> Result<Self> {
        let mut db = SqliteConnection::establish(database_url)?;

        // Cascading deletes rely on foreign keys, which SQLite leaves off by default.
        db.batch_execute("PRAGMA foreign_keys = ON;")?;
        db.batch_execute(SCHEMA)?;

        debug!(database_url, "connected to duty database");
        Ok(Self { db })
    }

    /// Connects to the database named in `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::connect(&settings.database_url)
    }

    // ----------------------- students -----------------------

    /// Returns the total number of students on the roster.
    pub fn num_students(&mut self) -> Result<usize> {
        let count: i64 = students::table.count().get_result(&mut self.db)?;
        Ok(count as usize)
    }

    /// Retrieves the students matching `query`.
    pub fn get_roster(&mut self, query: &StudentQuery) -> Result<Vec<Student>> {
        let mut select = students::table.select(Student::as_select()).into_boxed();

        select = match query.table {
            TableFilter::Any => select,
            TableFilter::Unassigned => select.filter(students::table_number.is_null()),
            TableFilter::Table(number) => select.filter(students::table_number.eq(number)),
        };
        if let Some(grade) = query.grade {
            select = select.filter(students::grade.eq(grade));
        }
        if let Some(country) = &query.country {
            select = select.filter(students::country.eq(country.as_str()));
        }
        if let Some(search) = &query.search {
            // LIKE is case-insensitive for ASCII in SQLite.
            let pattern = format!("%{search}%");
            select = select.filter(
                students::full_name
                    .like(pattern.clone())
                    .or(students::student_id.like(pattern)),
            );
        }

        // SQLite sorts NULLs first ascending and last descending.
        select = match (query.sort, query.descending) {
            (SortKey::StudentId, false) => select.order(students::student_id.asc()),
            (SortKey::StudentId, true) => select.order(students::student_id.desc()),
            (SortKey::Name, false) => select.order(students::full_name.asc()),
            (SortKey::Name, true) => select.order(students::full_name.desc()),
            (SortKey::Grade, false) => select.order(students::grade.asc()),
            (SortKey::Grade, true) => select.order(students::grade.desc()),
            (SortKey::Table, false) => select.order(students::table_number.asc()),
            (SortKey::Table, true) => select.order(students::table_number.desc()),
            (SortKey::Country, false) => select.order(students::country.asc()),
            (SortKey::Country, true) => select.order(students::country.desc()),
        };

        Ok(select.then_order_by(students::id.asc()).load(&mut self.db)?)
    }

    /// Retrieves a student by their externally issued ID.
    pub fn get_student(&mut self, student_id: &str) -> Result<Student> {
        students::table
            .filter(students::student_id.eq(student_id))
            .select(Student::as_select())
            .first(&mut self.db)
            .optional()?
            .ok_or_else(|| DutyError::StudentNotFound(student_id.to_string()))
    }

    /// Inserts the given roster entries, skipping any whose student ID is already taken.
    ///
    /// Duplicates are not updated; they are listed in [`ImportReport::skipped`].
    pub fn import_students(&mut self, entries: &[RosterEntry]) -> Result<ImportReport> {
        self.db.immediate_transaction(|conn| {
            let mut known: HashSet<String> = students::table
                .select(students::student_id)
                .load::<String>(conn)?
                .into_iter()
                .collect();

            let mut report = ImportReport::default();
            let mut fresh = Vec::new();

            for entry in entries {
                if entry.student_id.is_empty() || entry.full_name.is_empty() {
                    warn!(student_id = %entry.student_id, "rejecting roster row without ID or name");
                    report.rejected += 1;
                    continue;
                }
                if !known.insert(entry.student_id.clone()) {
                    debug!(student_id = %entry.student_id, "skipping duplicate student");
                    report.skipped.push(entry.student_id.clone());
                    continue;
                }

                fresh.push(NewStudent {
                    student_id: &entry.student_id,
                    full_name: &entry.full_name,
                    grade: entry.grade,
                    gender: entry.gender.as_deref(),
                    country: entry.country.as_deref(),
                });
            }

            if !fresh.is_empty() {
                report.imported = diesel::insert_into(students::table)
                    .values(&fresh)
                    .execute(conn)?;
            }

            info!(
                imported = report.imported,
                skipped = report.skipped.len(),
                rejected = report.rejected,
                "imported students"
            );
            Ok(report)
        })
    }

    /// Imports the CSV roster at `path` and, if any tables exist, distributes the newcomers.
    pub fn import_roster(
        &mut self,
        path: &Path,
    ) -> Result<(ImportReport, Option<DistributionReport>)> {
        let roster = roster::read_roster_file(path)?;
        let mut report = self.import_students(&roster.entries)?;
        report.rejected += roster.unreadable;

        if self.get_tables()?.is_empty() {
            info!("no tables yet, leaving imported students unassigned");
            return Ok((report, None));
        }

        let distribution = self.distribute()?;
        Ok((report, Some(distribution)))
    }

    /// Moves a student to the given table, or unassigns them with `None`.
    pub fn reassign_student(&mut self, student_id: &str, table: Option<i32>) -> Result<Student> {
        self.db.immediate_transaction(|conn| {
            let student = students::table
                .filter(students::student_id.eq(student_id))
                .select(Student::as_select())
                .first(conn)
                .optional()?
                .ok_or_else(|| DutyError::StudentNotFound(student_id.to_string()))?;

            if let Some(number) = table {
                find_table(conn, number)?;
            }

            let moved = diesel::update(students::table.find(student.id))
                .set(students::table_number.eq(table))
                .returning(Student::as_returning())
                .get_result(conn)?;
            recount_tables(conn)?;

            info!(student_id, from = ?student.table_number, to = ?table, "moved student");
            Ok(moved)
        })
    }

    /// Removes every student. Duty slots they held are emptied.
    pub fn clear_students(&mut self) -> Result<usize> {
        self.db.immediate_transaction(|conn| {
            let removed = diesel::delete(students::table).execute(conn)?;
            recount_tables(conn)?;

            info!(removed, "cleared all students");
            Ok(removed)
        })
    }

    // ----------------------- tables -----------------------

    /// Retrieves all tables in order of table number.
    pub fn get_tables(&mut self) -> Result<Vec<DiningTable>> {
        Ok(dining_tables::table
            .select(DiningTable::as_select())
            .order(dining_tables::table_number.asc())
            .load(&mut self.db)?)
    }

    /// Retrieves the students seated at `table_number`, by name.
    pub fn table_members(&mut self, table_number: i32) -> Result<Vec<Student>> {
        Ok(students::table
            .filter(students::table_number.eq(table_number))
            .select(Student::as_select())
            .order((students::full_name.asc(), students::id.asc()))
            .load(&mut self.db)?)
    }

    /// Adds a new table.
    pub fn add_table(&mut self, table_number: i32, capacity: i32) -> Result<DiningTable> {
        validate_table(table_number, capacity)?;

        self.db.immediate_transaction(|conn| {
            if table_exists(conn, table_number)? {
                return Err(DutyError::DuplicateTable(table_number));
            }

            diesel::insert_into(dining_tables::table)
                .values(NewDiningTable {
                    table_number,
                    capacity,
                })
                .execute(conn)?;
            recount_tables(conn)?;

            info!(table_number, capacity, "added table");
            find_table(conn, table_number)
        })
    }

    /// Changes a table's number and capacity. Students seated there follow it to its new number.
    pub fn edit_table(
        &mut self,
        table_number: i32,
        new_number: i32,
        capacity: i32,
    ) -> Result<DiningTable> {
        validate_table(new_number, capacity)?;

        self.db.immediate_transaction(|conn| {
            let table = find_table(conn, table_number)?;

            if new_number != table_number {
                if table_exists(conn, new_number)? {
                    return Err(DutyError::DuplicateTable(new_number));
                }

                diesel::update(students::table.filter(students::table_number.eq(table_number)))
                    .set(students::table_number.eq(new_number))
                    .execute(conn)?;
            }

            diesel::update(dining_tables::table.find(table.id))
                .set((
                    dining_tables::table_number.eq(new_number),
                    dining_tables::capacity.eq(capacity),
                ))
                .execute(conn)?;
            recount_tables(conn)?;

            info!(table_number, new_number, capacity, "updated table");
            find_table(conn, new_number)
        })
    }

    /// Deletes a table, unassigning everyone seated there. Returns how many students were
    /// unassigned.
    pub fn delete_table(&mut self, table_number: i32) -> Result<usize> {
        self.db.immediate_transaction(|conn| {
            let table = find_table(conn, table_number)?;

            let unassigned =
                diesel::update(students::table.filter(students::table_number.eq(table_number)))
                    .set(students::table_number.eq(None::<i32>))
                    .execute(conn)?;
            diesel::delete(dining_tables::table.find(table.id)).execute(conn)?;

            info!(table_number, unassigned, "deleted table");
            Ok(unassigned)
        })
    }

    // ----------------------- distribution -----------------------

    /// Seats every unassigned student at a table, balancing grade, gender, and country.
    ///
    /// Fails with [`DutyError::NoTables`] if there are no tables. Does nothing if everyone
    /// already has a table.
    pub fn distribute(&mut self) -> Result<DistributionReport> {
        self.db
            .immediate_transaction(|conn| distribute_unassigned(conn, &mut rand::rng()))
    }

    /// Clears every table assignment and distributes all students from scratch.
    pub fn redistribute(&mut self) -> Result<DistributionReport> {
        self.db.immediate_transaction(|conn| {
            if table_numbers(conn)?.is_empty() {
                return Err(DutyError::NoTables);
            }

            diesel::update(students::table)
                .set(students::table_number.eq(None::<i32>))
                .execute(conn)?;

            distribute_unassigned(conn, &mut rand::rng())
        })
    }

    // ----------------------- terms -----------------------

    /// Creates a term lasting `weeks` weeks from `start_date`. With `activate`, every other term
    /// is deactivated.
    pub fn create_term(
        &mut self,
        name: &str,
        start_date: NaiveDate,
        weeks: i32,
        activate: bool,
    ) -> Result<Term> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DutyError::EmptyTermName);
        }
        if weeks < 1 {
            return Err(DutyError::InvalidWeeks(weeks));
        }
        let end_date = rotation::term_end(start_date, weeks)?;

        self.db.immediate_transaction(|conn| {
            if activate {
                deactivate_terms(conn)?;
            }

            let term = diesel::insert_into(terms::table)
                .values(NewTerm {
                    name,
                    start_date,
                    end_date,
                    weeks,
                    is_active: activate,
                })
                .returning(Term::as_returning())
                .get_result(conn)?;

            info!(term_id = term.id, name, %start_date, weeks, activate, "created term");
            Ok(term)
        })
    }

    /// Makes `term_id` the only active term.
    pub fn activate_term(&mut self, term_id: i32) -> Result<Term> {
        self.db.immediate_transaction(|conn| {
            find_term(conn, term_id)?;

            deactivate_terms(conn)?;
            let term = diesel::update(terms::table.find(term_id))
                .set(terms::is_active.eq(true))
                .returning(Term::as_returning())
                .get_result(conn)?;

            info!(term_id, "activated term");
            Ok(term)
        })
    }

    /// Retrieves all terms, most recent start first.
    pub fn get_terms(&mut self) -> Result<Vec<Term>> {
        Ok(terms::table
            .select(Term::as_select())
            .order((terms::start_date.desc(), terms::id.desc()))
            .load(&mut self.db)?)
    }

    pub fn get_term(&mut self, term_id: i32) -> Result<Term> {
        find_term(&mut self.db, term_id)
    }

    /// The currently active term, if any.
    pub fn active_term(&mut self) -> Result<Option<Term>> {
        Ok(terms::table
            .filter(terms::is_active.eq(true))
            .select(Term::as_select())
            .first(&mut self.db)
            .optional()?)
    }

    /// Deletes a term along with its weekly assignments and daily duties.
    pub fn delete_term(&mut self, term_id: i32) -> Result<Term> {
        self.db.immediate_transaction(|conn| {
            let term = find_term(conn, term_id)?;
            diesel::delete(terms::table.find(term_id)).execute(conn)?;

            info!(term_id, name = %term.name, "deleted term");
            Ok(term)
        })
    }

    // ----------------------- duty roster -----------------------

    /// Builds the full duty roster for a term, replacing any roster it already had.
    ///
    /// Tables take weekly turns in order of table number. Weeks whose table is empty get a
    /// weekly assignment but no daily duties.
    pub fn generate_schedule(&mut self, term_id: i32) -> Result<ScheduleReport> {
        self.db.immediate_transaction(|conn| {
            let term = find_term(conn, term_id)?;
            let tables = table_numbers(conn)?;
            let plans = rotation::plan_rotation(term.start_date, term.weeks, &tables)?;

            let cleared = diesel::delete(
                weekly_assignments::table.filter(weekly_assignments::term_id.eq(term.id)),
            )
            .execute(conn)?;
            debug!(term_id, cleared, "cleared previous roster");

            let mut rng = rand::rng();
            let mut report = ScheduleReport::default();

            for plan in plans {
                let assignment = diesel::insert_into(weekly_assignments::table)
                    .values(NewWeeklyAssignment {
                        term_id: term.id,
                        week_number: plan.week_number,
                        table_number: plan.table_number,
                        start_date: plan.start_date,
                        end_date: plan.end_date,
                    })
                    .returning(WeeklyAssignment::as_returning())
                    .get_result(conn)?;

                let members = member_ids(conn, plan.table_number)?;
                let written = write_week_duties(conn, &assignment, &members, &mut rng)?;
                if written == 0 {
                    warn!(
                        week = plan.week_number,
                        table = plan.table_number,
                        "table has no students, week left without duties"
                    );
                    report.empty_weeks.push(plan.week_number);
                }

                report.weeks += 1;
                report.duties += written;
            }

            info!(
                term_id,
                weeks = report.weeks,
                duties = report.duties,
                "generated duty roster"
            );
            Ok(report)
        })
    }

    /// Redraws the daily duties of a single week from its table's current members. Other weeks
    /// are left untouched.
    pub fn regenerate_week(&mut self, weekly_assignment_id: i32) -> Result<usize> {
        self.db.immediate_transaction(|conn| {
            let assignment = weekly_assignments::table
                .find(weekly_assignment_id)
                .select(WeeklyAssignment::as_select())
                .first(conn)
                .optional()?
                .ok_or(DutyError::WeekNotFound(weekly_assignment_id))?;

            let members = member_ids(conn, assignment.table_number)?;
            if members.is_empty() {
                return Err(DutyError::EmptyTable(assignment.table_number));
            }

            diesel::delete(
                daily_duties::table
                    .filter(daily_duties::weekly_assignment_id.eq(assignment.id)),
            )
            .execute(conn)?;
            let written = write_week_duties(conn, &assignment, &members, &mut rand::rng())?;

            info!(
                weekly_assignment_id,
                week = assignment.week_number,
                written,
                "regenerated week"
            );
            Ok(written)
        })
    }

    /// Puts `student` (by database id) into one slot of a duty, or empties the slot with
    /// `None`. The student does not have to belong to the duty's table.
    pub fn update_duty_slot(
        &mut self,
        duty_id: i32,
        slot: Slot,
        student: Option<i32>,
    ) -> Result<Option<StudentSummary>> {
        self.db.immediate_transaction(|conn| {
            let summary = match student {
                Some(id) => {
                    let found = students::table
                        .find(id)
                        .select(Student::as_select())
                        .first(conn)
                        .optional()?
                        .ok_or_else(|| DutyError::StudentNotFound(id.to_string()))?;
                    Some(StudentSummary::from(&found))
                }
                None => None,
            };

            let target = daily_duties::table.find(duty_id);
            let updated = match slot {
                Slot::First => diesel::update(target)
                    .set(daily_duties::student1_id.eq(student))
                    .execute(conn)?,
                Slot::Second => diesel::update(target)
                    .set(daily_duties::student2_id.eq(student))
                    .execute(conn)?,
            };
            if updated == 0 {
                return Err(DutyError::DutyNotFound(duty_id));
            }

            info!(duty_id, ?slot, ?student, "updated duty slot");
            Ok(summary)
        })
    }

    /// Retrieves the weekly assignments of a term, by week number.
    pub fn weekly_assignments(&mut self, term_id: i32) -> Result<Vec<WeeklyAssignment>> {
        Ok(weekly_assignments::table
            .filter(weekly_assignments::term_id.eq(term_id))
            .select(WeeklyAssignment::as_select())
            .order(weekly_assignments::week_number.asc())
            .load(&mut self.db)?)
    }

    /// Retrieves the daily duties of one week, ordered by date then shift.
    pub fn week_duties(&mut self, weekly_assignment_id: i32) -> Result<Vec<DailyDuty>> {
        Ok(daily_duties::table
            .filter(daily_duties::weekly_assignment_id.eq(weekly_assignment_id))
            .order((daily_duties::date.asc(), daily_duties::shift.asc()))
            .load::<DailyDuty>(&mut self.db)?)
    }

    /// Lays out week `week_number` of a term as a 7-day grid with resolved students.
    ///
    /// Returns `None` if the term has no such week yet.
    pub fn week_view(&mut self, term_id: i32, week_number: i32) -> Result<Option<WeekView>> {
        let Some(assignment) = weekly_assignments::table
            .filter(weekly_assignments::term_id.eq(term_id))
            .filter(weekly_assignments::week_number.eq(week_number))
            .select(WeeklyAssignment::as_select())
            .first(&mut self.db)
            .optional()?
        else {
            return Ok(None);
        };

        let duties = self.week_duties(assignment.id)?;

        let ids: Vec<i32> = duties
            .iter()
            .flat_map(|duty| duty.students)
            .flatten()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let people: HashMap<i32, StudentSummary> = students::table
            .filter(students::id.eq_any(ids))
            .select(Student::as_select())
            .load(&mut self.db)?
            .iter()
            .map(|student| (student.id, StudentSummary::from(student)))
            .collect();

        let mut days = Vec::with_capacity(rotation::DAYS_PER_WEEK as usize);
        for date in assignment
            .start_date
            .iter_days()
            .take(rotation::DAYS_PER_WEEK as usize)
        {
            days.push(DayView::new(date));
        }

        for duty in duties {
            let offset = (duty.date - assignment.start_date).num_days();
            let Some(day) = usize::try_from(offset).ok().and_then(|i| days.get_mut(i)) else {
                warn!(duty_id = duty.id, date = %duty.date, "duty falls outside its week");
                continue;
            };

            let view = DutyView {
                id: duty.id,
                shift: duty.shift,
                students: duty
                    .students
                    .map(|slot| slot.and_then(|id| people.get(&id).cloned())),
            };
            match duty.shift {
                Shift::Am => day.am = Some(view),
                Shift::Pm => day.pm = Some(view),
            }
        }

        Ok(Some(WeekView { assignment, days }))
    }

    /// Counts the daily duties in `term_id` where `student` (by database id) holds either slot.
    pub fn student_duty_count(&mut self, term_id: i32, student: i32) -> Result<i64> {
        duty_count(&mut self.db, term_id, student)
    }

    /// Duty counts for every seated student, ordered by table then name, for `term_id` or the
    /// active term.
    pub fn duty_analytics(&mut self, term_id: Option<i32>) -> Result<(Term, Vec<DutyStanding>)> {
        let term = match term_id {
            Some(id) => self.get_term(id)?,
            None => self.active_term()?.ok_or(DutyError::NoActiveTerm)?,
        };

        let seated: Vec<Student> = students::table
            .filter(students::table_number.is_not_null())
            .select(Student::as_select())
            .order((students::table_number.asc(), students::full_name.asc()))
            .load(&mut self.db)?;

        let mut standings = Vec::with_capacity(seated.len());
        for student in seated {
            let duty_count = duty_count(&mut self.db, term.id, student.id)?;
            standings.push(DutyStanding {
                student,
                duty_count,
                expected: term.weeks,
                status: DutyStatus::for_count(duty_count, term.weeks),
            });
        }

        Ok((term, standings))
    }
}

fn validate_table(table_number: i32, capacity: i32) -> Result<()> {
    if table_number <= 0 {
        return Err(DutyError::InvalidTableNumber(table_number));
    }
    if capacity <= 0 {
        return Err(DutyError::InvalidCapacity(capacity));
    }
    Ok(())
}

fn find_table(conn: &mut SqliteConnection, table_number: i32) -> Result<DiningTable> {
    dining_tables::table
        .filter(dining_tables::table_number.eq(table_number))
        .select(DiningTable::as_select())
        .first(conn)
        .optional()?
        .ok_or(DutyError::TableNotFound(table_number))
}

fn table_exists(conn: &mut SqliteConnection, table_number: i32) -> Result<bool> {
    match find_table(conn, table_number) {
        Ok(_) => Ok(true),
        Err(DutyError::TableNotFound(_)) => Ok(false),
        Err(err) => Err(err),
    }
}

fn find_term(conn: &mut SqliteConnection, term_id: i32) -> Result<Term> {
    terms::table
        .find(term_id)
        .select(Term::as_select())
        .first(conn)
        .optional()?
        .ok_or(DutyError::TermNotFound(term_id))
}

fn deactivate_terms(conn: &mut SqliteConnection) -> QueryResult<usize> {
    diesel::update(terms::table)
        .set(terms::is_active.eq(false))
        .execute(conn)
}

fn table_numbers(conn: &mut SqliteConnection) -> QueryResult<Vec<i32>> {
    dining_tables::table
        .select(dining_tables::table_number)
        .order(dining_tables::table_number.asc())
        .load(conn)
}

fn member_ids(conn: &mut SqliteConnection, table_number: i32) -> QueryResult<Vec<i32>> {
    students::table
        .filter(students::table_number.eq(table_number))
        .select(students::id)
        .order(students::id.asc())
        .load(conn)
}

/// Brings every table's `current_count` in line with the students actually seated there.
fn recount_tables(conn: &mut SqliteConnection) -> QueryResult<usize> {
    diesel::sql_query(
        "UPDATE dining_tables SET current_count = \
         (SELECT COUNT(*) FROM students WHERE students.table_number = dining_tables.table_number)",
    )
    .execute(conn)
}

fn distribute_unassigned<R: Rng + ?Sized>(
    conn: &mut SqliteConnection,
    rng: &mut R,
) -> Result<DistributionReport> {
    let tables = table_numbers(conn)?;
    if tables.is_empty() {
        return Err(DutyError::NoTables);
    }

    let unassigned: Vec<Student> = students::table
        .filter(students::table_number.is_null())
        .select(Student::as_select())
        .order(students::id.asc())
        .load(conn)?;
    if unassigned.is_empty() {
        info!("no unassigned students to distribute");
        return Ok(DistributionReport::default());
    }

    let seated: Vec<Student> = students::table
        .filter(students::table_number.is_not_null())
        .select(Student::as_select())
        .load(conn)?;

    let distribution = distributor::distribute(&unassigned, &seated, &tables, rng)?;
    for &(student, table) in &distribution.assignments {
        diesel::update(students::table.find(student))
            .set(students::table_number.eq(table))
            .execute(conn)?;
    }
    recount_tables(conn)?;

    info!(
        assigned = distribution.len(),
        tables = tables.len(),
        "distributed students"
    );
    Ok(DistributionReport {
        assigned: distribution.len(),
    })
}

fn write_week_duties<R: Rng + ?Sized>(
    conn: &mut SqliteConnection,
    assignment: &WeeklyAssignment,
    members: &[i32],
    rng: &mut R,
) -> Result<usize> {
    let plans = rotation::plan_week(assignment.start_date, members, rng)?;
    if plans.is_empty() {
        return Ok(0);
    }

    let rows: Vec<NewDailyDuty> = plans
        .iter()
        .map(|plan| NewDailyDuty::new(assignment.id, plan.date, plan.shift, plan.students))
        .collect();

    Ok(diesel::insert_into(daily_duties::table)
        .values(&rows)
        .execute(conn)?)
}

fn duty_count(conn: &mut SqliteConnection, term_id: i32, student: i32) -> Result<i64> {
    Ok(daily_duties::table
        .inner_join(weekly_assignments::table)
        .filter(weekly_assignments::term_id.eq(term_id))
        .filter(
            daily_duties::student1_id
                .eq(student)
                .or(daily_duties::student2_id.eq(student)),
        )
        .count()
        .get_result(conn)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_track_allows_one_missed_week() {
        assert_eq!(DutyStatus::for_count(9, 10), DutyStatus::OnTrack);
        assert_eq!(DutyStatus::for_count(12, 10), DutyStatus::OnTrack);
        assert_eq!(DutyStatus::for_count(8, 10), DutyStatus::Under);
        assert_eq!(DutyStatus::for_count(0, 1), DutyStatus::OnTrack);
    }

    #[test]
    fn table_lookups_do_not_swallow_database_errors() {
        let mut manager = DutyManager::connect(":memory:").unwrap();
        manager.add_table(5, 8).unwrap();
        assert!(table_exists(&mut manager.db, 5).unwrap());
        assert!(!table_exists(&mut manager.db, 6).unwrap());

        // No schema at all, so the lookup itself fails.
        let mut bare = SqliteConnection::establish(":memory:").unwrap();
        assert!(matches!(
            table_exists(&mut bare, 5),
            Err(DutyError::Database(_))
        ));
    }

    #[test]
    fn table_numbers_and_capacity_must_be_positive() {
        assert!(validate_table(1, 8).is_ok());
        assert!(matches!(
            validate_table(0, 8),
            Err(DutyError::InvalidTableNumber(0))
        ));
        assert!(matches!(
            validate_table(3, 0),
            Err(DutyError::InvalidCapacity(0))
        ));
    }
}
