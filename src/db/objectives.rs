//! Objective catalog operations

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::get_parsed;
use crate::error::TrackerError;
use crate::models::ObjectiveLevel;

/// Objective row from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveRow {
    pub id: String,
    pub code: String,
    pub title: String,
    pub level: ObjectiveLevel,
    pub sector: String,
    pub created_at: String,
}

impl ObjectiveRow {
    pub(crate) fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            code: row.get("code")?,
            title: row.get("title")?,
            level: get_parsed(row, "level")?,
            sector: row.get("sector")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Input for creating an objective
#[derive(Debug, Clone, Deserialize)]
pub struct CreateObjectiveInput {
    #[serde(default)]
    pub id: Option<String>,
    pub code: String,
    pub title: String,
    pub level: ObjectiveLevel,
    pub sector: String,
}

const SELECT_OBJECTIVE: &str = "SELECT id, code, title, level, sector, created_at FROM objectives";

/// Get objective by ID
pub fn get_objective(conn: &Connection, id: &str) -> Result<Option<ObjectiveRow>, TrackerError> {
    let row = conn
        .query_row(
            &format!("{} WHERE id = ?", SELECT_OBJECTIVE),
            params![id],
            ObjectiveRow::from_row,
        )
        .optional()?;
    Ok(row)
}

/// Get objective by its policy code
pub fn get_objective_by_code(
    conn: &Connection,
    code: &str,
) -> Result<Option<ObjectiveRow>, TrackerError> {
    let row = conn
        .query_row(
            &format!("{} WHERE code = ?", SELECT_OBJECTIVE),
            params![code],
            ObjectiveRow::from_row,
        )
        .optional()?;
    Ok(row)
}

/// List objectives ordered by code, optionally restricted to one sector
pub fn list_objectives(
    conn: &Connection,
    sector: Option<&str>,
) -> Result<Vec<ObjectiveRow>, TrackerError> {
    let rows = match sector {
        Some(sector) => {
            let mut stmt =
                conn.prepare(&format!("{} WHERE sector = ? ORDER BY code", SELECT_OBJECTIVE))?;
            let rows = stmt
                .query_map(params![sector], ObjectiveRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        }
        None => {
            let mut stmt = conn.prepare(&format!("{} ORDER BY code", SELECT_OBJECTIVE))?;
            let rows = stmt
                .query_map([], ObjectiveRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        }
    };
    Ok(rows)
}

/// Create an objective. A duplicate id or code is a conflict.
pub fn create_objective(
    conn: &mut Connection,
    input: CreateObjectiveInput,
) -> Result<ObjectiveRow, TrackerError> {
    if let Some(id) = input.id.as_deref() {
        if get_objective(conn, id)?.is_some() {
            return Err(TrackerError::Conflict(format!("Objective already exists: {}", id)));
        }
    }
    if get_objective_by_code(conn, &input.code)?.is_some() {
        return Err(TrackerError::Conflict(format!(
            "Objective code already exists: {}",
            input.code
        )));
    }

    let id = input.id.unwrap_or_else(|| Uuid::new_v4().to_string());

    conn.execute(
        "INSERT INTO objectives (id, code, title, level, sector) VALUES (?, ?, ?, ?, ?)",
        params![id, input.code, input.title, input.level.as_str(), input.sector],
    )?;

    get_objective(conn, &id)?
        .ok_or_else(|| TrackerError::Internal("Objective not found after insert".to_string()))
}
