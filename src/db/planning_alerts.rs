//! Planning alert log (append-only)

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::get_parsed;
use crate::error::TrackerError;
use crate::models::{AlertType, Severity};

/// Planning alert row from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningAlertRow {
    pub id: String,
    pub project_id: String,
    pub phase_id: Option<String>,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub message: String,
    pub created_at: String,
}

impl PlanningAlertRow {
    fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            project_id: row.get("project_id")?,
            phase_id: row.get("phase_id")?,
            alert_type: get_parsed(row, "alert_type")?,
            severity: get_parsed(row, "severity")?,
            message: row.get("message")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Input for logging a planning alert
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePlanningAlertInput {
    #[serde(default)]
    pub phase_id: Option<String>,
    #[serde(rename = "type", alias = "alert_type")]
    pub alert_type: AlertType,
    pub severity: Severity,
    pub message: String,
}

pub fn get_planning_alert(
    conn: &Connection,
    id: &str,
) -> Result<Option<PlanningAlertRow>, TrackerError> {
    let row = conn
        .query_row(
            "SELECT * FROM planning_alerts WHERE id = ?",
            params![id],
            PlanningAlertRow::from_row,
        )
        .optional()?;
    Ok(row)
}

/// Planning alerts of one project, newest first
pub fn list_planning_alerts(
    conn: &Connection,
    project_id: &str,
) -> Result<Vec<PlanningAlertRow>, TrackerError> {
    let mut stmt = conn.prepare(
        "SELECT * FROM planning_alerts WHERE project_id = ? ORDER BY created_at DESC, rowid DESC",
    )?;
    let rows = stmt
        .query_map(params![project_id], PlanningAlertRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Every planning alert, oldest first
pub fn list_all_planning_alerts(conn: &Connection) -> Result<Vec<PlanningAlertRow>, TrackerError> {
    let mut stmt = conn.prepare("SELECT * FROM planning_alerts ORDER BY created_at, rowid")?;
    let rows = stmt
        .query_map([], PlanningAlertRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn create_planning_alert(
    conn: &mut Connection,
    project_id: &str,
    input: CreatePlanningAlertInput,
) -> Result<PlanningAlertRow, TrackerError> {
    let id = Uuid::new_v4().to_string();

    conn.execute(
        r#"
        INSERT INTO planning_alerts (id, project_id, phase_id, alert_type, severity, message)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
        params![
            id,
            project_id,
            input.phase_id,
            input.alert_type.as_str(),
            input.severity.as_str(),
            input.message,
        ],
    )?;

    get_planning_alert(conn, &id)?
        .ok_or_else(|| TrackerError::Internal("Planning alert not found after insert".to_string()))
}
