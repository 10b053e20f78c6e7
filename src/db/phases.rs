//! Phase CRUD operations
//!
//! Phases are ordered by creation time within a project. There is no
//! sequencing between phases; each one transitions independently.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{get_date, get_json_list, get_parsed};
use crate::error::TrackerError;
use crate::models::{format_date, nullable, parse_date, patch_date, Deliverable, PhaseStatus};

/// Phase row from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseRow {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub planned_start: Option<NaiveDate>,
    pub planned_end: Option<NaiveDate>,
    pub actual_start: Option<NaiveDate>,
    pub actual_end: Option<NaiveDate>,
    pub status: PhaseStatus,
    pub deliverables: Vec<Deliverable>,
    pub created_at: String,
    pub updated_at: String,
}

impl PhaseRow {
    fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            project_id: row.get("project_id")?,
            name: row.get("name")?,
            planned_start: get_date(row, "planned_start")?,
            planned_end: get_date(row, "planned_end")?,
            actual_start: get_date(row, "actual_start")?,
            actual_end: get_date(row, "actual_end")?,
            status: get_parsed(row, "status")?,
            deliverables: get_json_list(row, "deliverables_json")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Input for creating a phase
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePhaseInput {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub planned_start: Option<String>,
    #[serde(default)]
    pub planned_end: Option<String>,
    #[serde(default)]
    pub actual_start: Option<String>,
    #[serde(default)]
    pub actual_end: Option<String>,
    #[serde(default = "default_status")]
    pub status: PhaseStatus,
    #[serde(default)]
    pub deliverables: Vec<Deliverable>,
}

fn default_status() -> PhaseStatus {
    PhaseStatus::Planned
}

/// Partial phase update; absent fields keep their stored value, a `null`
/// date clears it
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePhaseInput {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub planned_start: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub planned_end: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub actual_start: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub actual_end: Option<Option<String>>,
    pub status: Option<PhaseStatus>,
    pub deliverables: Option<Vec<Deliverable>>,
}

/// Get phase by ID
pub fn get_phase(conn: &Connection, id: &str) -> Result<Option<PhaseRow>, TrackerError> {
    let row = conn
        .query_row("SELECT * FROM phases WHERE id = ?", params![id], PhaseRow::from_row)
        .optional()?;
    Ok(row)
}

/// Phases of one project in creation order
pub fn list_phases(conn: &Connection, project_id: &str) -> Result<Vec<PhaseRow>, TrackerError> {
    let mut stmt =
        conn.prepare("SELECT * FROM phases WHERE project_id = ? ORDER BY created_at, rowid")?;
    let rows = stmt
        .query_map(params![project_id], PhaseRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Create a phase under a project
pub fn create_phase(
    conn: &mut Connection,
    project_id: &str,
    input: CreatePhaseInput,
) -> Result<PhaseRow, TrackerError> {
    let id = input.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
    let deliverables_json = serde_json::to_string(&input.deliverables)?;

    conn.execute(
        r#"
        INSERT INTO phases (
            id, project_id, name, planned_start, planned_end,
            actual_start, actual_end, status, deliverables_json
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            id,
            project_id,
            input.name,
            parse_date("planned_start", input.planned_start.as_deref())?.map(format_date),
            parse_date("planned_end", input.planned_end.as_deref())?.map(format_date),
            parse_date("actual_start", input.actual_start.as_deref())?.map(format_date),
            parse_date("actual_end", input.actual_end.as_deref())?.map(format_date),
            input.status.as_str(),
            deliverables_json,
        ],
    )?;

    get_phase(conn, &id)?
        .ok_or_else(|| TrackerError::Internal("Phase not found after insert".to_string()))
}

/// Merge a partial update into the stored phase and write it back
pub fn update_phase(
    conn: &mut Connection,
    id: &str,
    input: UpdatePhaseInput,
) -> Result<PhaseRow, TrackerError> {
    let existing = get_phase(conn, id)?.ok_or_else(|| TrackerError::phase_not_found(id))?;

    let planned_start = patch_date("planned_start", &input.planned_start, existing.planned_start)?;
    let planned_end = patch_date("planned_end", &input.planned_end, existing.planned_end)?;
    let actual_start = patch_date("actual_start", &input.actual_start, existing.actual_start)?;
    let actual_end = patch_date("actual_end", &input.actual_end, existing.actual_end)?;
    let name = input.name.unwrap_or(existing.name);
    let status = input.status.unwrap_or(existing.status);
    let deliverables = input.deliverables.unwrap_or(existing.deliverables);

    let tx = conn.transaction()?;
    tx.execute(
        r#"
        UPDATE phases SET
            name = ?, planned_start = ?, planned_end = ?, actual_start = ?, actual_end = ?,
            status = ?, deliverables_json = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
        params![
            name,
            planned_start.map(format_date),
            planned_end.map(format_date),
            actual_start.map(format_date),
            actual_end.map(format_date),
            status.as_str(),
            serde_json::to_string(&deliverables)?,
            id,
        ],
    )?;
    tx.commit()?;

    get_phase(conn, id)?
        .ok_or_else(|| TrackerError::Internal("Phase not found after update".to_string()))
}

/// Delete a phase by ID
pub fn delete_phase(conn: &mut Connection, id: &str) -> Result<bool, TrackerError> {
    let changes = conn.execute("DELETE FROM phases WHERE id = ?", params![id])?;
    Ok(changes > 0)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::projects::{create_project, tests::project_input};
    use crate::db::Database;

    pub(crate) fn phase_input(name: &str) -> CreatePhaseInput {
        CreatePhaseInput {
            id: None,
            name: name.to_string(),
            planned_start: Some("2024-01-01".into()),
            planned_end: Some("2024-01-10".into()),
            actual_start: None,
            actual_end: None,
            status: PhaseStatus::Planned,
            deliverables: vec![Deliverable {
                name: "Rapport de démarrage".into(),
                done: false,
            }],
        }
    }

    fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.with_conn_mut(|conn| create_project(conn, project_input("p1", "Kinshasa", "Santé")))
            .unwrap();
        db
    }

    #[test]
    fn test_phases_listed_in_creation_order() {
        let db = seeded();
        db.with_conn_mut(|conn| {
            create_phase(conn, "p1", phase_input("Planification"))?;
            create_phase(conn, "p1", phase_input("Exécution"))?;
            create_phase(conn, "p1", phase_input("Évaluation"))?;
            Ok(())
        })
        .unwrap();

        let names: Vec<String> = db
            .with_conn(|conn| list_phases(conn, "p1"))
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Planification", "Exécution", "Évaluation"]);
    }

    #[test]
    fn test_deliverables_round_trip_as_typed_records() {
        let db = seeded();
        let phase = db
            .with_conn_mut(|conn| create_phase(conn, "p1", phase_input("Planification")))
            .unwrap();
        assert_eq!(phase.deliverables.len(), 1);
        assert_eq!(phase.deliverables[0].name, "Rapport de démarrage");
    }

    #[test]
    fn test_update_merges_fields() {
        let db = seeded();
        let phase = db
            .with_conn_mut(|conn| create_phase(conn, "p1", phase_input("Planification")))
            .unwrap();

        let updated = db
            .with_conn_mut(|conn| {
                update_phase(
                    conn,
                    &phase.id,
                    UpdatePhaseInput {
                        actual_end: Some(Some("2024-01-15".into())),
                        status: Some(PhaseStatus::Completed),
                        ..Default::default()
                    },
                )
            })
            .unwrap();

        assert_eq!(updated.name, "Planification");
        assert_eq!(updated.status, PhaseStatus::Completed);
        assert_eq!(updated.planned_end, NaiveDate::from_ymd_opt(2024, 1, 10));
        assert_eq!(updated.actual_end, NaiveDate::from_ymd_opt(2024, 1, 15));
    }

    #[test]
    fn test_invalid_date_rejected() {
        let db = seeded();
        let mut input = phase_input("Planification");
        input.planned_end = Some("2024-13-45".into());

        let result = db.with_conn_mut(|conn| create_phase(conn, "p1", input));
        assert!(matches!(result, Err(TrackerError::InvalidInput(_))));
    }

    #[test]
    fn test_null_date_clears_and_absent_keeps() {
        let db = seeded();
        let mut input = phase_input("Planification");
        input.actual_end = Some("2024-01-15".into());
        let phase = db.with_conn_mut(|conn| create_phase(conn, "p1", input)).unwrap();

        let patch: UpdatePhaseInput = serde_json::from_str(r#"{"actual_end": null}"#).unwrap();
        assert_eq!(patch.actual_end, Some(None));
        assert_eq!(patch.planned_end, None);

        let updated = db.with_conn_mut(|conn| update_phase(conn, &phase.id, patch)).unwrap();
        assert_eq!(updated.actual_end, None);
        assert_eq!(updated.planned_end, NaiveDate::from_ymd_opt(2024, 1, 10));
    }
}
