//! SQLite storage for objectives, projects and their planning data
//!
//! One repository module per table. Repository functions take a borrowed
//! `rusqlite::Connection` and never hold state of their own; the
//! `Database` handle owns the connection and is injected into services.
//!
//! ## Tables
//!
//! - `objectives` - Policy objective catalog (unique `code`)
//! - `projects` - Project records
//! - `project_objective_links` - Weighted project → objective links, unique per pair
//! - `phases` - Ordered phases per project
//! - `maturity_assessments` - One checklist row per project (upsert)
//! - `planning_alerts` - Append-only planning alert log
//! - `alerts` - Append-only global alert log

pub mod schema;
pub mod objectives;
pub mod projects;
pub mod objective_links;
pub mod phases;
pub mod maturity;
pub mod planning_alerts;
pub mod alerts;

use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use tracing::{debug, info};

use crate::error::TrackerError;

/// SQLite database handle
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create the tracker database inside `storage_dir`
    pub fn open(storage_dir: &Path) -> Result<Self, TrackerError> {
        let db_path = storage_dir.join("tracker.db");
        info!("Opening SQLite database at {:?}", db_path);

        let conn = Connection::open(&db_path)?;

        // WAL keeps readers unblocked while a write commits
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, TrackerError> {
        debug!("Opening in-memory SQLite database");
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, TrackerError> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        schema::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run a read against the connection
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, TrackerError>
    where
        F: FnOnce(&Connection) -> Result<T, TrackerError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| TrackerError::Internal(format!("Lock poisoned: {}", e)))?;
        f(&conn)
    }

    /// Execute a write operation with exclusive access
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T, TrackerError>
    where
        F: FnOnce(&mut Connection) -> Result<T, TrackerError>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| TrackerError::Internal(format!("Lock poisoned: {}", e)))?;
        f(&mut conn)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats, TrackerError> {
        self.with_conn(|conn| {
            let count = |table: &str| -> Result<u64, TrackerError> {
                let n: i64 =
                    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
                Ok(n as u64)
            };

            Ok(DbStats {
                objective_count: count("objectives")?,
                project_count: count("projects")?,
                link_count: count("project_objective_links")?,
                phase_count: count("phases")?,
                assessment_count: count("maturity_assessments")?,
                planning_alert_count: count("planning_alerts")?,
                alert_count: count("alerts")?,
            })
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct DbStats {
    pub objective_count: u64,
    pub project_count: u64,
    pub link_count: u64,
    pub phase_count: u64,
    pub assessment_count: u64,
    pub planning_alert_count: u64,
    pub alert_count: u64,
}

/// Read a TEXT column into a typed enum, surfacing bad values as conversion errors
pub(crate) fn get_parsed<T>(row: &Row, column: &str) -> rusqlite::Result<T>
where
    T: FromStr<Err = TrackerError>,
{
    let text: String = row.get(column)?;
    text.parse::<T>().map_err(|e| {
        let index = row.as_ref().column_index(column).unwrap_or(0);
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e))
    })
}

/// Read a JSON TEXT column into a typed list
pub(crate) fn get_json_list<T>(row: &Row, column: &str) -> rusqlite::Result<Vec<T>>
where
    T: serde::de::DeserializeOwned,
{
    let text: Option<String> = row.get(column)?;
    match text {
        None => Ok(Vec::new()),
        Some(s) if s.is_empty() => Ok(Vec::new()),
        Some(s) => serde_json::from_str(&s).map_err(|e| {
            let index = row.as_ref().column_index(column).unwrap_or(0);
            rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e))
        }),
    }
}

/// Read an optional `YYYY-MM-DD` column
pub(crate) fn get_date(row: &Row, column: &str) -> rusqlite::Result<Option<chrono::NaiveDate>> {
    let text: Option<String> = row.get(column)?;
    crate::models::parse_date(column, text.as_deref()).map_err(|e| {
        let index = row.as_ref().column_index(column).unwrap_or(0);
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e))
    })
}

// Re-exports
pub use objectives::{CreateObjectiveInput, ObjectiveRow};
pub use projects::{CreateProjectInput, ProjectQuery, ProjectRow, UpdateProjectInput};
pub use objective_links::{LinkRow, LinkedObjectiveRow};
pub use phases::{CreatePhaseInput, PhaseRow, UpdatePhaseInput};
pub use maturity::AssessmentRow;
pub use planning_alerts::{CreatePlanningAlertInput, PlanningAlertRow};
pub use alerts::{AlertRow, CreateAlertInput};
