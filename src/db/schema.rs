//! Database schema definitions

use rusqlite::Connection;
use tracing::info;

use crate::error::TrackerError;

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<(), TrackerError> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Creating new database schema v{}", SCHEMA_VERSION);
        create_tables(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        info!("Migrating schema from v{} to v{}", current_version, SCHEMA_VERSION);
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else {
        info!("Database schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get current schema version (0 if not initialized)
fn get_schema_version(conn: &Connection) -> Result<i32, TrackerError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
        [],
    )?;

    let version: Option<i32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(other),
        })?;

    Ok(version.unwrap_or(0))
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<(), TrackerError> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?)", [version])?;
    Ok(())
}

fn create_tables(conn: &Connection) -> Result<(), TrackerError> {
    conn.execute_batch(CATALOG_SCHEMA)
        .map_err(|e| TrackerError::Internal(format!("Failed to create catalog tables: {}", e)))?;

    conn.execute_batch(PLANNING_SCHEMA)
        .map_err(|e| TrackerError::Internal(format!("Failed to create planning tables: {}", e)))?;

    conn.execute_batch(INDEXES_SCHEMA)
        .map_err(|e| TrackerError::Internal(format!("Failed to create indexes: {}", e)))?;

    Ok(())
}

/// Objectives, projects and the weighted links between them
const CATALOG_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS objectives (
    id TEXT PRIMARY KEY NOT NULL,
    code TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    level TEXT NOT NULL DEFAULT 'national',
    sector TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    sector TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'planned',
    budget REAL NOT NULL DEFAULT 0 CHECK (budget >= 0),
    spent REAL NOT NULL DEFAULT 0 CHECK (spent >= 0),
    province TEXT NOT NULL,
    city TEXT,
    latitude REAL,
    longitude REAL,
    start_date TEXT,
    end_date TEXT,
    actual_end_date TEXT,
    ministry TEXT,
    responsible_person TEXT,
    created_by TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Weight is the project's contribution strength to the objective
CREATE TABLE IF NOT EXISTS project_objective_links (
    project_id TEXT NOT NULL,
    objective_id TEXT NOT NULL,
    weight INTEGER NOT NULL CHECK (weight BETWEEN 1 AND 5),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (project_id, objective_id),
    FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE,
    FOREIGN KEY (objective_id) REFERENCES objectives(id) ON DELETE CASCADE
);
"#;

/// Phases, maturity assessments and alert logs
const PLANNING_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS phases (
    id TEXT PRIMARY KEY NOT NULL,
    project_id TEXT NOT NULL,
    name TEXT NOT NULL,
    planned_start TEXT,
    planned_end TEXT,
    actual_start TEXT,
    actual_end TEXT,
    status TEXT NOT NULL DEFAULT 'planned',
    deliverables_json TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
);

-- One row per project, replaced whole on save
CREATE TABLE IF NOT EXISTS maturity_assessments (
    project_id TEXT PRIMARY KEY NOT NULL,
    budget_available INTEGER NOT NULL DEFAULT 0,
    disbursement_planned INTEGER NOT NULL DEFAULT 0,
    funding_source_confirmed INTEGER NOT NULL DEFAULT 0,
    contracts_signed INTEGER NOT NULL DEFAULT 0,
    feasibility_study INTEGER NOT NULL DEFAULT 0,
    technical_plans_validated INTEGER NOT NULL DEFAULT 0,
    documentation_complete INTEGER NOT NULL DEFAULT 0,
    governance_defined INTEGER NOT NULL DEFAULT 0,
    steering_committee_formed INTEGER NOT NULL DEFAULT 0,
    tenders_launched_awarded INTEGER NOT NULL DEFAULT 0,
    project_team_available INTEGER NOT NULL DEFAULT 0,
    logistics_ready INTEGER NOT NULL DEFAULT 0,
    risks_identified INTEGER NOT NULL DEFAULT 0,
    pag_alignment_percent REAL NOT NULL DEFAULT 0,
    attachments_json TEXT,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS planning_alerts (
    id TEXT PRIMARY KEY NOT NULL,
    project_id TEXT NOT NULL,
    phase_id TEXT,
    alert_type TEXT NOT NULL,
    severity TEXT NOT NULL,
    message TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE,
    FOREIGN KEY (phase_id) REFERENCES phases(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS alerts (
    id TEXT PRIMARY KEY NOT NULL,
    project_id TEXT NOT NULL,
    severity TEXT NOT NULL,
    message TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
);
"#;

const INDEXES_SCHEMA: &str = r#"
CREATE INDEX IF NOT EXISTS idx_objectives_sector ON objectives(sector);
CREATE INDEX IF NOT EXISTS idx_projects_sector_province ON projects(sector, province);
CREATE INDEX IF NOT EXISTS idx_projects_status ON projects(status);
CREATE INDEX IF NOT EXISTS idx_links_objective_id ON project_objective_links(objective_id);
CREATE INDEX IF NOT EXISTS idx_phases_project_id ON phases(project_id, created_at);
CREATE INDEX IF NOT EXISTS idx_planning_alerts_project_id ON planning_alerts(project_id);
CREATE INDEX IF NOT EXISTS idx_alerts_project_id ON alerts(project_id);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }
}
