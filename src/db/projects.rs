//! Project store operations

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{get_date, get_parsed};
use crate::error::TrackerError;
use crate::models::{format_date, nullable, parse_date, ProjectStatus};

/// Project row from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRow {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub sector: String,
    pub status: ProjectStatus,
    pub budget: f64,
    pub spent: f64,
    pub province: String,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub actual_end_date: Option<NaiveDate>,
    pub ministry: Option<String>,
    pub responsible_person: Option<String>,
    pub created_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ProjectRow {
    fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            sector: row.get("sector")?,
            status: get_parsed(row, "status")?,
            budget: row.get("budget")?,
            spent: row.get("spent")?,
            province: row.get("province")?,
            city: row.get("city")?,
            latitude: row.get("latitude")?,
            longitude: row.get("longitude")?,
            start_date: get_date(row, "start_date")?,
            end_date: get_date(row, "end_date")?,
            actual_end_date: get_date(row, "actual_end_date")?,
            ministry: row.get("ministry")?,
            responsible_person: row.get("responsible_person")?,
            created_by: row.get("created_by")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Input for creating a project
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProjectInput {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub sector: String,
    #[serde(default = "default_status")]
    pub status: ProjectStatus,
    #[serde(default)]
    pub budget: f64,
    #[serde(default)]
    pub spent: f64,
    pub province: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub actual_end_date: Option<String>,
    #[serde(default)]
    pub ministry: Option<String>,
    #[serde(default)]
    pub responsible_person: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

fn default_status() -> ProjectStatus {
    ProjectStatus::Planned
}

/// Partial update; absent fields keep their stored value, a `null` date
/// clears it
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProjectInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub sector: Option<String>,
    pub status: Option<ProjectStatus>,
    pub budget: Option<f64>,
    pub spent: Option<f64>,
    pub province: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "nullable")]
    pub start_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub end_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub actual_end_date: Option<Option<String>>,
    pub ministry: Option<String>,
    pub responsible_person: Option<String>,
}

/// Query parameters for listing projects
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectQuery {
    pub sector: Option<String>,
    pub province: Option<String>,
    pub status: Option<ProjectStatus>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    100
}

impl Default for ProjectQuery {
    fn default() -> Self {
        Self {
            sector: None,
            province: None,
            status: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

fn normalized_date(field: &str, value: Option<&str>) -> Result<Option<String>, TrackerError> {
    Ok(parse_date(field, value)?.map(format_date))
}

fn patched_date(
    field: &str,
    update: &Option<Option<String>>,
) -> Result<Option<Option<String>>, TrackerError> {
    update
        .as_ref()
        .map(|value| normalized_date(field, value.as_deref()))
        .transpose()
}

/// Get project by ID
pub fn get_project(conn: &Connection, id: &str) -> Result<Option<ProjectRow>, TrackerError> {
    let row = conn
        .query_row("SELECT * FROM projects WHERE id = ?", params![id], ProjectRow::from_row)
        .optional()?;
    Ok(row)
}

/// List projects in creation order with optional filters
pub fn list_projects(conn: &Connection, query: &ProjectQuery) -> Result<Vec<ProjectRow>, TrackerError> {
    let mut sql = String::from("SELECT * FROM projects WHERE 1=1");
    let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(sector) = &query.sector {
        sql.push_str(" AND sector = ?");
        params_vec.push(Box::new(sector.clone()));
    }

    if let Some(province) = &query.province {
        sql.push_str(" AND province = ?");
        params_vec.push(Box::new(province.clone()));
    }

    if let Some(status) = &query.status {
        sql.push_str(" AND status = ?");
        params_vec.push(Box::new(status.as_str()));
    }

    sql.push_str(" ORDER BY created_at, rowid LIMIT ? OFFSET ?");
    params_vec.push(Box::new(query.limit));
    params_vec.push(Box::new(query.offset));

    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_refs.as_slice(), ProjectRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// List every project, in creation order
pub fn list_all_projects(conn: &Connection) -> Result<Vec<ProjectRow>, TrackerError> {
    let mut stmt = conn.prepare("SELECT * FROM projects ORDER BY created_at, rowid")?;
    let rows = stmt
        .query_map([], ProjectRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Other projects sharing the exact province and sector strings
pub fn list_sibling_projects(
    conn: &Connection,
    project: &ProjectRow,
) -> Result<Vec<ProjectRow>, TrackerError> {
    let mut stmt = conn.prepare(
        "SELECT * FROM projects WHERE province = ? AND sector = ? AND id != ? ORDER BY created_at, rowid",
    )?;
    let rows = stmt
        .query_map(
            params![project.province, project.sector, project.id],
            ProjectRow::from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Create a project
pub fn create_project(
    conn: &mut Connection,
    input: CreateProjectInput,
) -> Result<ProjectRow, TrackerError> {
    let id = input.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());

    conn.execute(
        r#"
        INSERT INTO projects (
            id, title, description, sector, status, budget, spent, province, city,
            latitude, longitude, start_date, end_date, actual_end_date,
            ministry, responsible_person, created_by
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            id,
            input.title,
            input.description,
            input.sector,
            input.status.as_str(),
            input.budget,
            input.spent,
            input.province,
            input.city,
            input.latitude,
            input.longitude,
            normalized_date("start_date", input.start_date.as_deref())?,
            normalized_date("end_date", input.end_date.as_deref())?,
            normalized_date("actual_end_date", input.actual_end_date.as_deref())?,
            input.ministry,
            input.responsible_person,
            input.created_by,
        ],
    )?;

    get_project(conn, &id)?
        .ok_or_else(|| TrackerError::Internal("Project not found after insert".to_string()))
}

/// Apply a partial update, returning the updated row and the names of the
/// columns that were written
pub fn update_project(
    conn: &mut Connection,
    id: &str,
    input: &UpdateProjectInput,
) -> Result<(ProjectRow, Vec<String>), TrackerError> {
    let mut assignments: Vec<&'static str> = Vec::new();
    let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();

    macro_rules! set {
        ($column:literal, $value:expr) => {
            if let Some(value) = $value {
                assignments.push($column);
                params_vec.push(Box::new(value));
            }
        };
    }

    set!("title", input.title.clone());
    set!("description", input.description.clone());
    set!("sector", input.sector.clone());
    set!("status", input.status.map(|s| s.as_str()));
    set!("budget", input.budget);
    set!("spent", input.spent);
    set!("province", input.province.clone());
    set!("city", input.city.clone());
    set!("latitude", input.latitude);
    set!("longitude", input.longitude);
    set!("start_date", patched_date("start_date", &input.start_date)?);
    set!("end_date", patched_date("end_date", &input.end_date)?);
    set!("actual_end_date", patched_date("actual_end_date", &input.actual_end_date)?);
    set!("ministry", input.ministry.clone());
    set!("responsible_person", input.responsible_person.clone());

    if assignments.is_empty() {
        let row = get_project(conn, id)?.ok_or_else(|| TrackerError::project_not_found(id))?;
        return Ok((row, Vec::new()));
    }

    let set_clause: Vec<String> = assignments.iter().map(|c| format!("{} = ?", c)).collect();
    let sql = format!(
        "UPDATE projects SET {}, updated_at = datetime('now') WHERE id = ?",
        set_clause.join(", ")
    );
    params_vec.push(Box::new(id.to_string()));

    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let changed = conn.execute(&sql, params_refs.as_slice())?;

    if changed == 0 {
        return Err(TrackerError::project_not_found(id));
    }

    let row = get_project(conn, id)?
        .ok_or_else(|| TrackerError::Internal("Project not found after update".to_string()))?;

    Ok((row, assignments.into_iter().map(String::from).collect()))
}

/// Delete a project; links, phases, assessment and alerts cascade
pub fn delete_project(conn: &mut Connection, id: &str) -> Result<bool, TrackerError> {
    let changes = conn.execute("DELETE FROM projects WHERE id = ?", params![id])?;
    Ok(changes > 0)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::Database;

    pub(crate) fn project_input(id: &str, province: &str, sector: &str) -> CreateProjectInput {
        CreateProjectInput {
            id: Some(id.to_string()),
            title: format!("Project {}", id),
            description: None,
            sector: sector.to_string(),
            status: ProjectStatus::InProgress,
            budget: 1000.0,
            spent: 0.0,
            province: province.to_string(),
            city: None,
            latitude: None,
            longitude: None,
            start_date: Some("2024-01-01".to_string()),
            end_date: Some("2024-12-31".to_string()),
            actual_end_date: None,
            ministry: None,
            responsible_person: None,
            created_by: None,
        }
    }

    #[test]
    fn test_create_and_get() {
        let db = Database::open_in_memory().unwrap();
        let created = db
            .with_conn_mut(|conn| create_project(conn, project_input("p1", "Kinshasa", "Santé")))
            .unwrap();

        assert_eq!(created.status, ProjectStatus::InProgress);
        assert_eq!(created.start_date, NaiveDate::from_ymd_opt(2024, 1, 1));

        let fetched = db.with_conn(|conn| get_project(conn, "p1")).unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[test]
    fn test_siblings_match_province_and_sector_exactly() {
        let db = Database::open_in_memory().unwrap();
        let p1 = db
            .with_conn_mut(|conn| {
                let p1 = create_project(conn, project_input("p1", "Kinshasa", "Santé"))?;
                create_project(conn, project_input("p2", "Kinshasa", "Santé"))?;
                create_project(conn, project_input("p3", "Kinshasa", "sante"))?;
                create_project(conn, project_input("p4", "Kasaï", "Santé"))?;
                Ok(p1)
            })
            .unwrap();

        let siblings = db.with_conn(|conn| list_sibling_projects(conn, &p1)).unwrap();
        let ids: Vec<&str> = siblings.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p2"]);
    }

    #[test]
    fn test_partial_update_reports_changed_fields() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn_mut(|conn| create_project(conn, project_input("p1", "Kinshasa", "Santé")))
            .unwrap();

        let update = UpdateProjectInput {
            spent: Some(250.0),
            status: Some(ProjectStatus::Delayed),
            ..Default::default()
        };
        let (row, fields) = db
            .with_conn_mut(|conn| update_project(conn, "p1", &update))
            .unwrap();

        assert_eq!(row.spent, 250.0);
        assert_eq!(row.status, ProjectStatus::Delayed);
        assert_eq!(row.title, "Project p1");
        assert_eq!(fields, vec!["status", "spent"]);
    }

    #[test]
    fn test_update_missing_project() {
        let db = Database::open_in_memory().unwrap();
        let update = UpdateProjectInput {
            title: Some("x".into()),
            ..Default::default()
        };
        let result = db.with_conn_mut(|conn| update_project(conn, "nope", &update));
        assert!(matches!(result, Err(TrackerError::NotFound(_))));
    }

    #[test]
    fn test_list_filters() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn_mut(|conn| {
            create_project(conn, project_input("p1", "Kinshasa", "Santé"))?;
            create_project(conn, project_input("p2", "Kasaï", "Santé"))?;
            Ok(())
        })
        .unwrap();

        let query = ProjectQuery {
            province: Some("Kasaï".into()),
            ..Default::default()
        };
        let rows = db.with_conn(|conn| list_projects(conn, &query)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "p2");
    }
}
