//! Planning for the weekly duty rotation.
//!
//! Tables take turns being on duty one week at a time, and within its week a table's students
//! are dealt out two per shift across seven days. Nothing here touches the database; the
//! [`crate::manager`] persists the plans.

use crate::error::{DutyError, Result};
use crate::models::Shift;
use chrono::{Days, NaiveDate};
use rand::Rng;
use rand::seq::SliceRandom;

/// Number of days covered by a weekly assignment.
pub const DAYS_PER_WEEK: u64 = 7;

/// Number of students staffing each shift.
pub const STUDENTS_PER_SHIFT: usize = 2;

/// Number of student slots that need filling in one week.
pub const SLOTS_PER_WEEK: usize = DAYS_PER_WEEK as usize * Shift::ALL.len() * STUDENTS_PER_SHIFT;

/// A table's turn on duty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekPlan {
    pub week_number: i32,
    pub table_number: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// The students on one shift of one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DutyPlan {
    pub date: NaiveDate,
    pub shift: Shift,
    pub students: [Option<i32>; STUDENTS_PER_SHIFT],
}

/// Returns the first and last day of the 1-indexed `week_number` of a term starting at
/// `term_start`.
pub fn week_window(term_start: NaiveDate, week_number: i32) -> Result<(NaiveDate, NaiveDate)> {
    let offset = u64::try_from(week_number - 1).map_err(|_| DutyError::InvalidWeeks(week_number))?;

    let start = term_start
        .checked_add_days(Days::new(offset * DAYS_PER_WEEK))
        .ok_or(DutyError::DateOutOfRange)?;
    let end = start
        .checked_add_days(Days::new(DAYS_PER_WEEK - 1))
        .ok_or(DutyError::DateOutOfRange)?;

    Ok((start, end))
}

/// The exclusive end of a term lasting `weeks` weeks.
pub fn term_end(term_start: NaiveDate, weeks: i32) -> Result<NaiveDate> {
    let weeks = u64::try_from(weeks).map_err(|_| DutyError::InvalidWeeks(weeks))?;

    term_start
        .checked_add_days(Days::new(weeks * DAYS_PER_WEEK))
        .ok_or(DutyError::DateOutOfRange)
}

/// Assigns tables to weeks round-robin: week `w` goes to `table_numbers[(w - 1) % len]`.
///
/// `table_numbers` is expected in ascending order. Returns [`DutyError::NoTables`] if it is
/// empty.
pub fn plan_rotation(
    term_start: NaiveDate,
    weeks: i32,
    table_numbers: &[i32],
) -> Result<Vec<WeekPlan>> {
    if table_numbers.is_empty() {
        return Err(DutyError::NoTables);
    }

    (1..=weeks)
        .zip(table_numbers.iter().cycle())
        .map(|(week_number, &table_number)| {
            let (start_date, end_date) = week_window(term_start, week_number)?;
            Ok(WeekPlan {
                week_number,
                table_number,
                start_date,
                end_date,
            })
        })
        .collect()
}

/// Builds the list students are drawn from for one week: the members in random order, repeated
/// cyclically until every slot of the week can be filled.
pub fn duty_pool<R: Rng + ?Sized>(members: &[i32], rng: &mut R) -> Vec<i32> {
    if members.is_empty() {
        return Vec::new();
    }

    let mut pool = members.to_vec();
    pool.shuffle(rng);

    let round = pool.len();
    while pool.len() < SLOTS_PER_WEEK {
        pool.extend_from_within(..round);
    }

    pool
}

/// Deals a table's `members` out over the week starting at `week_start`, two per shift, day by
/// day, AM before PM.
///
/// An empty table yields no duties.
pub fn plan_week<R: Rng + ?Sized>(
    week_start: NaiveDate,
    members: &[i32],
    rng: &mut R,
) -> Result<Vec<DutyPlan>> {
    let pool = duty_pool(members, rng);
    if pool.is_empty() {
        return Ok(Vec::new());
    }

    let mut next = 0;
    let mut draw = || {
        let student = pool[next % pool.len()];
        next += 1;
        Some(student)
    };

    let mut duties = Vec::with_capacity(DAYS_PER_WEEK as usize * Shift::ALL.len());
    for day in 0..DAYS_PER_WEEK {
        let date = week_start
            .checked_add_days(Days::new(day))
            .ok_or(DutyError::DateOutOfRange)?;

        for shift in Shift::ALL {
            duties.push(DutyPlan {
                date,
                shift,
                students: [draw(), draw()],
            });
        }
    }

    Ok(duties)
}
