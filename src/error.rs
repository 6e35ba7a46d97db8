use thiserror::Error;

/// Broad classes of failure, used by callers to decide how loudly to report an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Something the operation depends on does not exist yet. The operation was a no-op.
    MissingPrerequisite,
    /// The request collides with existing data and was skipped.
    Conflict,
    /// The request itself is malformed.
    Invalid,
    /// Reading or writing the store failed. Every write of the operation was rolled back.
    Persistence,
}

#[derive(Error, Debug)]
pub enum DutyError {
    #[error("No tables available, create tables first")]
    NoTables,

    #[error("Term {0} not found")]
    TermNotFound(i32),

    #[error("No active term found, create or activate a term first")]
    NoActiveTerm,

    #[error("Weekly assignment {0} not found")]
    WeekNotFound(i32),

    #[error("Daily duty {0} not found")]
    DutyNotFound(i32),

    #[error("Student {0} not found")]
    StudentNotFound(String),

    #[error("Table {0} does not exist")]
    TableNotFound(i32),

    #[error("No students assigned to table {0}")]
    EmptyTable(i32),

    #[error("Table {0} already exists")]
    DuplicateTable(i32),

    #[error("Table numbers must be greater than 0, got {0}")]
    InvalidTableNumber(i32),

    #[error("Capacity must be greater than 0, got {0}")]
    InvalidCapacity(i32),

    #[error("A term must last at least one week, got {0}")]
    InvalidWeeks(i32),

    #[error("A term needs a name")]
    EmptyTermName,

    #[error("Invalid shift {0:?}, expected AM or PM")]
    InvalidShift(String),

    #[error("Date arithmetic left the supported calendar range")]
    DateOutOfRange,

    #[error("Roster file must contain columns: {0}")]
    MissingColumns(String),

    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Connection error: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl DutyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DutyError::NoTables
            | DutyError::TermNotFound(_)
            | DutyError::NoActiveTerm
            | DutyError::WeekNotFound(_)
            | DutyError::DutyNotFound(_)
            | DutyError::StudentNotFound(_)
            | DutyError::TableNotFound(_)
            | DutyError::EmptyTable(_) => ErrorKind::MissingPrerequisite,
            DutyError::DuplicateTable(_) => ErrorKind::Conflict,
            DutyError::InvalidTableNumber(_)
            | DutyError::InvalidCapacity(_)
            | DutyError::InvalidWeeks(_)
            | DutyError::EmptyTermName
            | DutyError::InvalidShift(_)
            | DutyError::DateOutOfRange
            | DutyError::MissingColumns(_) => ErrorKind::Invalid,
            DutyError::Database(_)
            | DutyError::Connection(_)
            | DutyError::Csv(_)
            | DutyError::Io(_)
            | DutyError::Config(_) => ErrorKind::Persistence,
        }
    }

    /// Whether this error only reports that the operation had nothing to work with.
    pub fn is_missing_prerequisite(&self) -> bool {
        self.kind() == ErrorKind::MissingPrerequisite
    }
}

pub type Result<T> = std::result::Result<T, DutyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_prerequisites_are_reported_as_such() {
        assert!(DutyError::NoTables.is_missing_prerequisite());
        assert!(DutyError::EmptyTable(3).is_missing_prerequisite());
        assert!(!DutyError::DuplicateTable(3).is_missing_prerequisite());
        assert_eq!(DutyError::DuplicateTable(3).kind(), ErrorKind::Conflict);
        assert_eq!(
            DutyError::Database(diesel::result::Error::NotFound).kind(),
            ErrorKind::Persistence
        );
    }

    #[test]
    fn messages_name_the_offending_item() {
        assert_eq!(DutyError::DuplicateTable(4).to_string(), "Table 4 already exists");
        assert_eq!(
            DutyError::InvalidShift("XM".to_string()).to_string(),
            "Invalid shift \"XM\", expected AM or PM"
        );
    }
}
