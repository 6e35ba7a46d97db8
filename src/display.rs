use crate::error::{DutyError, Result};
use crate::manager::{DutyManager, DutyStatus, DutyView, StudentQuery};
use crate::models::{Student, StudentSummary};
use tabled::{Table, Tabled, settings::Style};

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn duty_cell(duty: Option<&DutyView>) -> String {
    let Some(duty) = duty else {
        return "-".to_string();
    };

    duty.students
        .iter()
        .map(|slot| {
            slot.as_ref()
                .map_or_else(|| "(empty)".to_string(), |s: &StudentSummary| s.full_name.clone())
        })
        .collect::<Vec<_>>()
        .join(" / ")
        + &format!(" [#{}]", duty.id)
}

/// Pretty prints the students matching `query`.
pub fn show_roster(manager: &mut DutyManager, query: &StudentQuery, verbose: bool) -> Result<()> {
    let roster = manager.get_roster(query)?;

    let mut table = if verbose {
        #[derive(Tabled)]
        struct FullStudent {
            #[tabled(rename = "Student ID")]
            student_id: String,
            name: String,
            grade: String,
            gender: String,
            country: String,
            table: String,
        }

        Table::new(roster.into_iter().map(|student| FullStudent {
            student_id: student.student_id,
            name: student.full_name,
            grade: or_dash(student.grade),
            gender: or_dash(student.gender),
            country: or_dash(student.country),
            table: or_dash(student.table_number),
        }))
    } else {
        #[derive(Tabled)]
        struct SimpleStudent {
            #[tabled(rename = "Student ID")]
            student_id: String,
            name: String,
            table: String,
        }

        Table::new(roster.into_iter().map(|student| SimpleStudent {
            student_id: student.student_id,
            name: student.full_name,
            table: or_dash(student.table_number),
        }))
    };

    table.with(Style::modern());
    println!("Roster:\n{table}");

    Ok(())
}

/// Prints all info about a student.
pub fn show_student_info(manager: &mut DutyManager, student_id: &str) -> Result<()> {
    let student: Student = manager.get_student(student_id)?;

    println!("Student Information:\n{:#?}", student);

    if let Some(term) = manager.active_term()? {
        let count = manager.student_duty_count(term.id, student.id)?;
        println!("Duties in {}: {count}", term.name);
    }

    Ok(())
}

/// Pretty prints every table with its occupancy and members.
pub fn show_tables(manager: &mut DutyManager) -> Result<()> {
    #[derive(Tabled)]
    struct TableRow {
        table: i32,
        seated: String,
        members: String,
    }

    let tables = manager.get_tables()?;
    let total_capacity: i32 = tables.iter().map(|t| t.capacity).sum();
    let total_seated: i32 = tables.iter().map(|t| t.current_count).sum();

    let mut rows = Vec::with_capacity(tables.len());
    for table in tables {
        let members = manager.table_members(table.table_number)?;
        rows.push(TableRow {
            table: table.table_number,
            seated: format!("{}/{}", table.current_count, table.capacity),
            members: members
                .iter()
                .map(|s| s.full_name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        });
    }

    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("Tables ({total_seated} seated, capacity {total_capacity}):\n{table}");

    Ok(())
}

/// Pretty prints all terms.
pub fn show_terms(manager: &mut DutyManager) -> Result<()> {
    #[derive(Tabled)]
    struct TermRow {
        id: i32,
        name: String,
        start: String,
        end: String,
        weeks: i32,
        active: String,
    }

    let terms = manager.get_terms()?;
    let mut table = Table::new(terms.into_iter().map(|term| TermRow {
        id: term.id,
        name: term.name,
        start: term.start_date.to_string(),
        end: term.end_date.to_string(),
        weeks: term.weeks,
        active: if term.is_active { "yes" } else { "" }.to_string(),
    }));
    table.with(Style::modern());
    println!("Terms:\n{table}");

    Ok(())
}

/// Pretty prints one week of a term's duty roster as a day-by-shift grid.
pub fn show_week(manager: &mut DutyManager, term_id: Option<i32>, week: i32) -> Result<()> {
    #[derive(Tabled)]
    struct DayRow {
        date: String,
        day: String,
        #[tabled(rename = "AM")]
        am: String,
        #[tabled(rename = "PM")]
        pm: String,
    }

    let term = match term_id {
        Some(id) => manager.get_term(id)?,
        None => manager.active_term()?.ok_or(DutyError::NoActiveTerm)?,
    };

    let Some(view) = manager.week_view(term.id, week)? else {
        println!(
            "{} has no roster for week {week} yet, generate one with `generate {}`.",
            term.name, term.id
        );
        return Ok(());
    };

    let rows = view.days.iter().map(|day| DayRow {
        date: day.date.to_string(),
        day: day.date.format("%A").to_string(),
        am: duty_cell(day.am.as_ref()),
        pm: duty_cell(day.pm.as_ref()),
    });
    let mut table = Table::new(rows);
    table.with(Style::modern());

    let assignment = &view.assignment;
    println!(
        "{} week {} ({} to {}), table {} [week #{}]:\n{table}",
        term.name,
        assignment.week_number,
        assignment.start_date,
        assignment.end_date,
        assignment.table_number,
        assignment.id
    );

    Ok(())
}

/// Pretty prints how many duties every seated student has in a term.
pub fn show_analytics(manager: &mut DutyManager, term_id: Option<i32>) -> Result<()> {
    #[derive(Tabled)]
    struct StandingRow {
        table: String,
        #[tabled(rename = "Student ID")]
        student_id: String,
        name: String,
        duties: i64,
        expected: i32,
        status: String,
    }

    let (term, standings) = manager.duty_analytics(term_id)?;

    let rows = standings.into_iter().map(|standing| StandingRow {
        table: or_dash(standing.student.table_number),
        student_id: standing.student.student_id,
        name: standing.student.full_name,
        duties: standing.duty_count,
        expected: standing.expected,
        status: match standing.status {
            DutyStatus::OnTrack => "on track",
            DutyStatus::Under => "under",
        }
        .to_string(),
    });
    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("Duty counts for {}:\n{table}", term.name);

    Ok(())
}
