//! This module contains the command-line interface [`Cli`] parser for managing dining tables and
//! the duty roster.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::manager::SortKey;
use crate::models::Slot;

/// The command line configuration struct, where the command-line interface parser is automatically
/// derived by [`clap::Parser`].
#[derive(Parser, Debug)]
#[command(name = "duty-roster", version, about = "Seat students at dining tables and rotate meal duties")]
pub struct Cli {
    /// The different commands available for managing tables, terms, and duties.
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import students from a CSV roster, then seat the newcomers if tables exist.
    Import { file_path: PathBuf },

    /// List the students on the roster.
    Students {
        /// Only students seated at this table.
        #[arg(long, conflicts_with = "unassigned")]
        table: Option<i32>,

        /// Only students without a table.
        #[arg(long)]
        unassigned: bool,

        #[arg(long)]
        grade: Option<i32>,

        #[arg(long)]
        country: Option<String>,

        /// Match against name or student ID.
        #[arg(long)]
        search: Option<String>,

        #[arg(long, value_enum, default_value_t = SortKey::StudentId)]
        sort: SortKey,

        #[arg(long)]
        desc: bool,

        /// Show every column.
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show a student and their table.
    ShowStudent { student_id: String },

    /// Move a student to another table. Table 0 unassigns them.
    MoveStudent { student_id: String, table: i32 },

    /// Remove every student from the roster.
    ClearStudents,

    /// List tables with their members.
    Tables,

    /// Add a table.
    AddTable { table_number: i32, capacity: i32 },

    /// Renumber a table or change its capacity.
    EditTable {
        table_number: i32,

        #[arg(long)]
        number: Option<i32>,

        #[arg(long)]
        capacity: Option<i32>,
    },

    /// Delete a table. Its students become unassigned.
    DeleteTable { table_number: i32 },

    /// Seat every unassigned student.
    Distribute,

    /// Clear all seating and distribute everyone again.
    Redistribute,

    /// List terms.
    Terms,

    /// Add a term. Dates are YYYY-MM-DD.
    AddTerm {
        name: String,
        start_date: NaiveDate,
        weeks: i32,

        /// Make this the active term.
        #[arg(long)]
        active: bool,
    },

    /// Make a term the active one.
    ActivateTerm { term_id: i32 },

    /// Delete a term and its whole roster.
    DeleteTerm { term_id: i32 },

    /// Generate (or regenerate) the duty roster of a term.
    Generate { term_id: i32 },

    /// Show one week of a term's roster.
    ShowWeek {
        /// Defaults to the active term.
        #[arg(long)]
        term: Option<i32>,

        #[arg(default_value_t = 1)]
        week: i32,
    },

    /// Redraw the duties of a single week.
    RegenerateWeek { weekly_assignment_id: i32 },

    /// Put a student into a duty slot, or empty the slot when no student is given.
    SetDuty {
        duty_id: i32,

        #[arg(value_enum)]
        slot: Slot,

        student_id: Option<String>,
    },

    /// Show how many duties each seated student has in a term.
    Analytics {
        /// Defaults to the active term.
        #[arg(long)]
        term: Option<i32>,
    },
}
