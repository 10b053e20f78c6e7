//! Weighted project → objective links

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::objectives::ObjectiveRow;
use crate::analytics::alignment::clamp_weight;
use crate::error::TrackerError;

/// Link row from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRow {
    pub project_id: String,
    pub objective_id: String,
    pub weight: u8,
    pub created_at: String,
    pub updated_at: String,
}

impl LinkRow {
    fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            project_id: row.get("project_id")?,
            objective_id: row.get("objective_id")?,
            weight: row.get("weight")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// A linked objective joined with its catalog metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkedObjectiveRow {
    pub objective: ObjectiveRow,
    pub weight: u8,
}

/// Get a single link
pub fn get_link(
    conn: &Connection,
    project_id: &str,
    objective_id: &str,
) -> Result<Option<LinkRow>, TrackerError> {
    let row = conn
        .query_row(
            "SELECT * FROM project_objective_links WHERE project_id = ? AND objective_id = ?",
            params![project_id, objective_id],
            LinkRow::from_row,
        )
        .optional()?;
    Ok(row)
}

/// All objectives linked to a project, ordered by objective code
pub fn list_linked_objectives(
    conn: &Connection,
    project_id: &str,
) -> Result<Vec<LinkedObjectiveRow>, TrackerError> {
    let mut stmt = conn.prepare(
        r#"
        SELECT o.id, o.code, o.title, o.level, o.sector, o.created_at, l.weight
        FROM project_objective_links l
        JOIN objectives o ON o.id = l.objective_id
        WHERE l.project_id = ?
        ORDER BY o.code
        "#,
    )?;

    let rows = stmt
        .query_map(params![project_id], |row| {
            Ok(LinkedObjectiveRow {
                objective: ObjectiveRow::from_row(row)?,
                weight: row.get("weight")?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Insert a link or overwrite the weight of an existing one.
///
/// The stored weight is always clamped into [1, 5].
pub fn upsert_link(
    conn: &mut Connection,
    project_id: &str,
    objective_id: &str,
    weight: i64,
) -> Result<LinkRow, TrackerError> {
    let weight = clamp_weight(weight);

    conn.execute(
        r#"
        INSERT INTO project_objective_links (project_id, objective_id, weight)
        VALUES (?, ?, ?)
        ON CONFLICT (project_id, objective_id)
        DO UPDATE SET weight = excluded.weight, updated_at = datetime('now')
        "#,
        params![project_id, objective_id, weight],
    )?;

    get_link(conn, project_id, objective_id)?
        .ok_or_else(|| TrackerError::Internal("Link not found after upsert".to_string()))
}

/// Delete a link, returning whether it existed
pub fn delete_link(
    conn: &mut Connection,
    project_id: &str,
    objective_id: &str,
) -> Result<bool, TrackerError> {
    let changes = conn.execute(
        "DELETE FROM project_objective_links WHERE project_id = ? AND objective_id = ?",
        params![project_id, objective_id],
    )?;
    Ok(changes > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::objectives::{create_objective, CreateObjectiveInput};
    use crate::db::projects::{create_project, tests::project_input};
    use crate::db::Database;
    use crate::models::ObjectiveLevel;

    fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.with_conn_mut(|conn| {
            create_project(conn, project_input("p1", "Kinshasa", "Santé"))?;
            create_objective(
                conn,
                CreateObjectiveInput {
                    id: Some("o1".into()),
                    code: "SAN-01".into(),
                    title: "Accès aux soins".into(),
                    level: ObjectiveLevel::National,
                    sector: "Santé".into(),
                },
            )?;
            Ok(())
        })
        .unwrap();
        db
    }

    #[test]
    fn test_weight_is_clamped_on_store() {
        let db = seeded();

        let high = db.with_conn_mut(|conn| upsert_link(conn, "p1", "o1", 9)).unwrap();
        assert_eq!(high.weight, 5);

        let low = db.with_conn_mut(|conn| upsert_link(conn, "p1", "o1", 0)).unwrap();
        assert_eq!(low.weight, 1);
    }

    #[test]
    fn test_upsert_keeps_one_row_with_latest_weight() {
        let db = seeded();

        db.with_conn_mut(|conn| upsert_link(conn, "p1", "o1", 2)).unwrap();
        db.with_conn_mut(|conn| upsert_link(conn, "p1", "o1", 4)).unwrap();

        let linked = db.with_conn(|conn| list_linked_objectives(conn, "p1")).unwrap();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].weight, 4);
        assert_eq!(linked[0].objective.code, "SAN-01");
    }

    #[test]
    fn test_delete_link() {
        let db = seeded();
        db.with_conn_mut(|conn| upsert_link(conn, "p1", "o1", 3)).unwrap();

        assert!(db.with_conn_mut(|conn| delete_link(conn, "p1", "o1")).unwrap());
        assert!(!db.with_conn_mut(|conn| delete_link(conn, "p1", "o1")).unwrap());
    }
}
