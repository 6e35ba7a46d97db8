use clap::Parser;
use duty_roster::cli::{Cli, Command};
use duty_roster::display;
use duty_roster::manager::{DutyManager, StudentQuery, TableFilter};
use duty_roster::settings::{Settings, init_tracing};
use duty_roster::{DutyError, Result};
use tracing::warn;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load()?;
    init_tracing(&settings.log_level);

    let mut manager = DutyManager::from_settings(&settings)?;

    match run(&mut manager, cli.command) {
        // Missing tables, terms, or students are reported but are not failures.
        Err(err) if err.is_missing_prerequisite() => {
            warn!("{err}");
            eprintln!("{err}");
            Ok(())
        }
        other => other,
    }
}

fn run(manager: &mut DutyManager, command: Command) -> Result<()> {
    match command {
        Command::Import { file_path } => {
            let (report, distribution) = manager.import_roster(&file_path)?;
            println!(
                "Imported {} students ({} duplicates skipped, {} rows rejected).",
                report.imported,
                report.skipped.len(),
                report.rejected
            );
            match distribution {
                Some(distribution) => {
                    println!("Seated {} students at tables.", distribution.assigned)
                }
                None => println!("Create tables to assign students."),
            }
        }
        Command::Students {
            table,
            unassigned,
            grade,
            country,
            search,
            sort,
            desc,
            verbose,
        } => {
            let table = match (table, unassigned) {
                (_, true) => TableFilter::Unassigned,
                (Some(number), false) => TableFilter::Table(number),
                (None, false) => TableFilter::Any,
            };
            let query = StudentQuery {
                table,
                grade,
                country,
                search,
                sort,
                descending: desc,
            };
            display::show_roster(manager, &query, verbose)?;
        }
        Command::ShowStudent { student_id } => display::show_student_info(manager, &student_id)?,
        Command::MoveStudent { student_id, table } => {
            let target = (table != 0).then_some(table);
            let student = manager.reassign_student(&student_id, target)?;
            match student.table_number {
                Some(number) => println!("Student {} moved to table {number}.", student.student_id),
                None => println!("Student {} is now unassigned.", student.student_id),
            }
        }
        Command::ClearStudents => {
            let removed = manager.clear_students()?;
            println!("Removed {removed} students.");
        }
        Command::Tables => display::show_tables(manager)?,
        Command::AddTable {
            table_number,
            capacity,
        } => {
            let table = manager.add_table(table_number, capacity)?;
            println!(
                "Table {} added with capacity {}.",
                table.table_number, table.capacity
            );
        }
        Command::EditTable {
            table_number,
            number,
            capacity,
        } => {
            let current = manager
                .get_tables()?
                .into_iter()
                .find(|t| t.table_number == table_number)
                .ok_or(DutyError::TableNotFound(table_number))?;
            let table = manager.edit_table(
                table_number,
                number.unwrap_or(current.table_number),
                capacity.unwrap_or(current.capacity),
            )?;
            println!(
                "Table {} updated (capacity {}, {} seated).",
                table.table_number, table.capacity, table.current_count
            );
        }
        Command::DeleteTable { table_number } => {
            let unassigned = manager.delete_table(table_number)?;
            println!("Table {table_number} deleted, {unassigned} students unassigned.");
        }
        Command::Distribute => {
            let report = manager.distribute()?;
            if report.assigned == 0 {
                println!("No unassigned students to distribute.");
            } else {
                println!("Distributed {} students.", report.assigned);
            }
        }
        Command::Redistribute => {
            let report = manager.redistribute()?;
            println!("Redistributed {} students.", report.assigned);
        }
        Command::Terms => display::show_terms(manager)?,
        Command::AddTerm {
            name,
            start_date,
            weeks,
            active,
        } => {
            let term = manager.create_term(&name, start_date, weeks, active)?;
            println!(
                "Term \"{}\" created with id {} ({} to {}).",
                term.name, term.id, term.start_date, term.end_date
            );
        }
        Command::ActivateTerm { term_id } => {
            let term = manager.activate_term(term_id)?;
            println!("Term \"{}\" is now active.", term.name);
        }
        Command::DeleteTerm { term_id } => {
            let term = manager.delete_term(term_id)?;
            println!("Term \"{}\" deleted.", term.name);
        }
        Command::Generate { term_id } => {
            let report = manager.generate_schedule(term_id)?;
            println!(
                "Created duty schedule for {} weeks ({} duties).",
                report.weeks, report.duties
            );
            if !report.empty_weeks.is_empty() {
                println!(
                    "Weeks without duties (empty table): {:?}",
                    report.empty_weeks
                );
            }
        }
        Command::ShowWeek { term, week } => display::show_week(manager, term, week)?,
        Command::RegenerateWeek {
            weekly_assignment_id,
        } => {
            let written = manager.regenerate_week(weekly_assignment_id)?;
            println!("Week regenerated with {written} duties.");
        }
        Command::SetDuty {
            duty_id,
            slot,
            student_id,
        } => {
            let student = match student_id {
                Some(student_id) => Some(manager.get_student(&student_id)?.id),
                None => None,
            };
            match manager.update_duty_slot(duty_id, slot, student)? {
                Some(summary) => println!(
                    "Duty {duty_id} {slot:?} slot: {} ({}).",
                    summary.full_name, summary.student_id
                ),
                None => println!("Duty {duty_id} {slot:?} slot cleared."),
            }
        }
        Command::Analytics { term } => display::show_analytics(manager, term)?,
    }

    Ok(())
}
