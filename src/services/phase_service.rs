//! Phase service - phase CRUD with derived delay and progress

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::analytics::phase_progress::{self, PhaseMetrics};
use crate::db::{phases, projects, CreatePhaseInput, Database, PhaseRow, UpdatePhaseInput};
use crate::error::TrackerError;

use super::events::{DomainEvent, EventBus};
use super::project_service::require_text;

/// A stored phase with its metrics evaluated for a given day
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedPhase {
    pub phase: PhaseRow,
    pub metrics: PhaseMetrics,
}

impl TrackedPhase {
    pub fn new(phase: PhaseRow, today: NaiveDate) -> Self {
        let metrics = phase_progress::metrics(&phase, today);
        Self { phase, metrics }
    }
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub struct PhaseService {
    db: Arc<Database>,
    events: Arc<EventBus>,
}

impl PhaseService {
    pub fn new(db: Arc<Database>, events: Arc<EventBus>) -> Self {
        Self { db, events }
    }

    /// Phases of a project in creation order, evaluated against today
    pub fn list(&self, project_id: &str) -> Result<Vec<TrackedPhase>, TrackerError> {
        self.list_at(project_id, today())
    }

    pub fn list_at(&self, project_id: &str, today: NaiveDate) -> Result<Vec<TrackedPhase>, TrackerError> {
        let rows = self.db.with_conn(|conn| {
            if projects::get_project(conn, project_id)?.is_none() {
                return Err(TrackerError::project_not_found(project_id));
            }
            phases::list_phases(conn, project_id)
        })?;

        Ok(rows.into_iter().map(|p| TrackedPhase::new(p, today)).collect())
    }

    pub fn get(&self, id: &str) -> Result<TrackedPhase, TrackerError> {
        let row = self
            .db
            .with_conn(|conn| phases::get_phase(conn, id))?
            .ok_or_else(|| TrackerError::phase_not_found(id))?;
        Ok(TrackedPhase::new(row, today()))
    }

    pub fn create(&self, project_id: &str, input: CreatePhaseInput) -> Result<TrackedPhase, TrackerError> {
        require_text("name", &input.name)?;

        let row = self.db.with_conn_mut(|conn| {
            if projects::get_project(conn, project_id)?.is_none() {
                return Err(TrackerError::project_not_found(project_id));
            }
            if let Some(id) = input.id.as_deref() {
                if phases::get_phase(conn, id)?.is_some() {
                    return Err(TrackerError::Conflict(format!("Phase already exists: {}", id)));
                }
            }
            phases::create_phase(conn, project_id, input)
        })?;

        self.events.emit(DomainEvent::PhaseCreated {
            id: row.id.clone(),
            project_id: row.project_id.clone(),
        });

        Ok(TrackedPhase::new(row, today()))
    }

    /// Partial update; absent fields keep their stored value
    pub fn update(&self, id: &str, input: UpdatePhaseInput) -> Result<TrackedPhase, TrackerError> {
        if let Some(name) = &input.name {
            require_text("name", name)?;
        }

        let row = self.db.with_conn_mut(|conn| phases::update_phase(conn, id, input))?;

        self.events.emit(DomainEvent::PhaseUpdated {
            id: row.id.clone(),
            project_id: row.project_id.clone(),
        });

        Ok(TrackedPhase::new(row, today()))
    }

    pub fn delete(&self, id: &str) -> Result<bool, TrackerError> {
        let deleted = self.db.with_conn_mut(|conn| phases::delete_phase(conn, id))?;

        if deleted {
            self.events.emit(DomainEvent::PhaseDeleted { id: id.to_string() });
        }

        Ok(deleted)
    }
}
