//! Global project alerts (append-only)

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::get_parsed;
use crate::error::TrackerError;
use crate::models::Severity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRow {
    pub id: String,
    pub project_id: String,
    pub severity: Severity,
    pub message: String,
    pub created_at: String,
}

impl AlertRow {
    fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            project_id: row.get("project_id")?,
            severity: get_parsed(row, "severity")?,
            message: row.get("message")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAlertInput {
    pub project_id: String,
    pub severity: Severity,
    pub message: String,
}

pub fn get_alert(conn: &Connection, id: &str) -> Result<Option<AlertRow>, TrackerError> {
    let row = conn
        .query_row("SELECT * FROM alerts WHERE id = ?", params![id], AlertRow::from_row)
        .optional()?;
    Ok(row)
}

/// List alerts oldest first, optionally for a single project
pub fn list_alerts(conn: &Connection, project_id: Option<&str>) -> Result<Vec<AlertRow>, TrackerError> {
    let rows = match project_id {
        Some(project_id) => {
            let mut stmt = conn
                .prepare("SELECT * FROM alerts WHERE project_id = ? ORDER BY created_at, rowid")?;
            let rows = stmt
                .query_map(params![project_id], AlertRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        }
        None => {
            let mut stmt = conn.prepare("SELECT * FROM alerts ORDER BY created_at, rowid")?;
            let rows = stmt
                .query_map([], AlertRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        }
    };
    Ok(rows)
}

pub fn create_alert(conn: &mut Connection, input: CreateAlertInput) -> Result<AlertRow, TrackerError> {
    let id = Uuid::new_v4().to_string();

    conn.execute(
        "INSERT INTO alerts (id, project_id, severity, message) VALUES (?, ?, ?, ?)",
        params![id, input.project_id, input.severity.as_str(), input.message],
    )?;

    get_alert(conn, &id)?
        .ok_or_else(|| TrackerError::Internal("Alert not found after insert".to_string()))
}
