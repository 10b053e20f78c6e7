//! Alignment service - objective links and the alignment score

use std::sync::Arc;

use rusqlite::Connection;
use serde_json::Value;
use tracing::debug;

use crate::analytics::alignment::{self, AlignmentResult};
use crate::db::{objective_links, objectives, projects, Database, LinkRow, ProjectRow};
use crate::error::TrackerError;

use super::events::{DomainEvent, EventBus};

pub struct AlignmentService {
    db: Arc<Database>,
    events: Arc<EventBus>,
}

/// Alignment of one project, read inside an existing connection scope
pub(crate) fn alignment_for(
    conn: &Connection,
    project: &ProjectRow,
) -> Result<AlignmentResult, TrackerError> {
    let links = objective_links::list_linked_objectives(conn, &project.id)?;
    let siblings = projects::list_sibling_projects(conn, project)?;
    let catalog = objectives::list_objectives(conn, Some(project.sector.as_str()))?;
    Ok(alignment::evaluate(project, links, &siblings, &catalog))
}

/// Read an integer weight from a request body value. Whole-number floats
/// such as `3.0` count as integers.
pub fn parse_weight(value: Option<&Value>) -> Result<i64, TrackerError> {
    match value {
        None | Some(Value::Null) => Err(TrackerError::InvalidInput("weight is required".into())),
        Some(v) => v
            .as_i64()
            .or_else(|| {
                v.as_f64()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| f as i64)
            })
            .ok_or_else(|| TrackerError::InvalidInput(format!("weight must be an integer, got {}", v))),
    }
}

impl AlignmentService {
    pub fn new(db: Arc<Database>, events: Arc<EventBus>) -> Self {
        Self { db, events }
    }

    /// Score, linked objectives, redundancy and suggestions for a project
    pub fn get_alignment(&self, project_id: &str) -> Result<AlignmentResult, TrackerError> {
        self.db.with_conn(|conn| {
            let project = projects::get_project(conn, project_id)?
                .ok_or_else(|| TrackerError::project_not_found(project_id))?;
            alignment_for(conn, &project)
        })
    }

    /// Link an objective, or overwrite the weight of an existing link.
    /// Out-of-range weights are clamped into [1, 5].
    pub fn link(
        &self,
        project_id: &str,
        objective_id: &str,
        weight: i64,
    ) -> Result<LinkRow, TrackerError> {
        let link = self.db.with_conn_mut(|conn| {
            if projects::get_project(conn, project_id)?.is_none() {
                return Err(TrackerError::project_not_found(project_id));
            }
            if objectives::get_objective(conn, objective_id)?.is_none() {
                return Err(TrackerError::objective_not_found(objective_id));
            }
            objective_links::upsert_link(conn, project_id, objective_id, weight)
        })?;

        debug!(
            project = %project_id,
            objective = %objective_id,
            requested = weight,
            stored = link.weight,
            "Upserted objective link"
        );

        self.events.emit(DomainEvent::ObjectiveLinked {
            project_id: link.project_id.clone(),
            objective_id: link.objective_id.clone(),
            weight: link.weight,
        });

        Ok(link)
    }

    /// Remove a link, returning whether it existed
    pub fn unlink(&self, project_id: &str, objective_id: &str) -> Result<bool, TrackerError> {
        let deleted = self
            .db
            .with_conn_mut(|conn| objective_links::delete_link(conn, project_id, objective_id))?;

        if deleted {
            self.events.emit(DomainEvent::ObjectiveUnlinked {
                project_id: project_id.to_string(),
                objective_id: objective_id.to_string(),
            });
        }

        Ok(deleted)
    }
}
