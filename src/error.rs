use thiserror::Error;

/// Domain-specific errors for the scheduler
#[derive(Error, Debug)]
pub enum SchedulerError {
    // Input/Parse errors
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON in '{file}': {message}")]
    JsonParse { file: String, message: String },

    #[error("Invalid time value '{0}' (expected HH:MM)")]
    InvalidTime(String),

    #[error("Unknown day name '{0}'")]
    UnknownDay(String),

    // Pin errors
    #[error("Fixed allocation references unknown section {section_id}")]
    UnknownPinnedSection { section_id: i64 },

    #[error("Fixed allocation for section {section_id} has no slot at {time}")]
    PinOutsideGrid { section_id: i64, time: String },

    // Solver errors
    #[error("ILP solver failed: {0}")]
    SolverFailed(String),

    #[error("No feasible solution found")]
    Infeasible,
}

/// Use anyhow::Result at application boundaries
pub type Result<T> = anyhow::Result<T>;
