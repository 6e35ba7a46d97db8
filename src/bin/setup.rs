//! Sets up a fresh dining hall.
//!
//! Clears the current roster, makes sure tables `1..=tables` exist, imports the CSV roster at
//! `roster_path`, and seats everyone.

use clap::Parser;
use duty_roster::Result;
use duty_roster::display;
use duty_roster::manager::DutyManager;
use duty_roster::settings::{Settings, init_tracing};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
struct Args {
    /// The CSV roster to import.
    roster_path: PathBuf,

    /// How many tables the dining hall has.
    #[arg(long, default_value_t = 10)]
    tables: i32,

    /// Seats per table.
    #[arg(long, default_value_t = 8)]
    capacity: i32,
}

pub fn main() -> Result<()> {
    let args = Args::parse();

    let settings = Settings::load()?;
    init_tracing(&settings.log_level);
    let mut manager = DutyManager::from_settings(&settings)?;

    // Delete the entire roster before importing a new one.
    let removed = manager.clear_students()?;
    info!(removed, "cleared previous roster");

    let existing: Vec<i32> = manager
        .get_tables()?
        .into_iter()
        .map(|t| t.table_number)
        .collect();
    for number in (1..=args.tables).filter(|n| !existing.contains(n)) {
        manager.add_table(number, args.capacity)?;
    }

    let (report, distribution) = manager.import_roster(&args.roster_path)?;
    println!(
        "Imported {} students, seated {}.",
        report.imported,
        distribution.map_or(0, |d| d.assigned)
    );

    display::show_tables(&mut manager)
}
