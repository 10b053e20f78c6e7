//! Error types for pag-tracker

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    /// Referenced project, objective, or phase does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed input (missing field, unknown enum value, unparseable date)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TrackerError {
    pub fn project_not_found(id: &str) -> Self {
        Self::NotFound(format!("Project not found: {}", id))
    }

    pub fn objective_not_found(id: &str) -> Self {
        Self::NotFound(format!("Objective not found: {}", id))
    }

    pub fn phase_not_found(id: &str) -> Self {
        Self::NotFound(format!("Phase not found: {}", id))
    }
}
