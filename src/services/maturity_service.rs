//! Maturity service - stored checklist plus recomputed score

use std::sync::Arc;

use rusqlite::Connection;

use crate::analytics::maturity::{self, MaturityAssessmentInput, MaturityResult};
use crate::db::{maturity as maturity_db, projects, Database};
use crate::error::TrackerError;

use super::events::{DomainEvent, EventBus};

pub struct MaturityService {
    db: Arc<Database>,
    events: Arc<EventBus>,
}

/// Maturity of one project; an unassessed project scores as all unchecked
pub(crate) fn maturity_for(conn: &Connection, project_id: &str) -> Result<MaturityResult, TrackerError> {
    let assessment = maturity_db::get_assessment(conn, project_id)?
        .map(|row| row.assessment)
        .unwrap_or_default();
    Ok(maturity::evaluate(assessment))
}

impl MaturityService {
    pub fn new(db: Arc<Database>, events: Arc<EventBus>) -> Self {
        Self { db, events }
    }

    pub fn get(&self, project_id: &str) -> Result<MaturityResult, TrackerError> {
        self.db.with_conn(|conn| {
            if projects::get_project(conn, project_id)?.is_none() {
                return Err(TrackerError::project_not_found(project_id));
            }
            maturity_for(conn, project_id)
        })
    }

    /// Merge the payload over the stored assessment, save it whole and
    /// return the freshly computed result
    pub fn save(
        &self,
        project_id: &str,
        input: MaturityAssessmentInput,
    ) -> Result<MaturityResult, TrackerError> {
        let result = self.db.with_conn_mut(|conn| {
            if projects::get_project(conn, project_id)?.is_none() {
                return Err(TrackerError::project_not_found(project_id));
            }

            let stored = maturity_db::get_assessment(conn, project_id)?;
            let assessment = input.merge(stored.as_ref().map(|row| &row.assessment));
            let row = maturity_db::upsert_assessment(conn, project_id, &assessment)?;
            Ok(maturity::evaluate(row.assessment))
        })?;

        self.events.emit(DomainEvent::AssessmentSaved {
            project_id: project_id.to_string(),
            score: result.score,
        });

        Ok(result)
    }
}
