pub mod cli;
pub mod display;
pub mod distributor;
pub mod error;
pub mod manager;
pub mod models;
pub mod roster;
pub mod rotation;
pub mod schema;
pub mod settings;

pub use error::{DutyError, Result};

use crate::manager::DutyManager;
use crate::settings::Settings;

/// Connects to the database named by `config.toml`, the environment, or the default path.
pub fn create_default_manager() -> Result<DutyManager> {
    let settings = Settings::load()?;
    DutyManager::from_settings(&settings)
}
