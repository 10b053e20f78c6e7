//! Objective catalog service

use std::sync::Arc;

use crate::db::{objectives, CreateObjectiveInput, Database, ObjectiveRow};
use crate::error::TrackerError;

use super::events::{DomainEvent, EventBus};
use super::project_service::require_text;

pub struct ObjectiveService {
    db: Arc<Database>,
    events: Arc<EventBus>,
}

impl ObjectiveService {
    pub fn new(db: Arc<Database>, events: Arc<EventBus>) -> Self {
        Self { db, events }
    }

    pub fn get(&self, id: &str) -> Result<ObjectiveRow, TrackerError> {
        self.db
            .with_conn(|conn| objectives::get_objective(conn, id))?
            .ok_or_else(|| TrackerError::objective_not_found(id))
    }

    /// Catalog ordered by code, optionally restricted to one sector
    pub fn list(&self, sector: Option<&str>) -> Result<Vec<ObjectiveRow>, TrackerError> {
        self.db.with_conn(|conn| objectives::list_objectives(conn, sector))
    }

    pub fn create(&self, input: CreateObjectiveInput) -> Result<ObjectiveRow, TrackerError> {
        require_text("code", &input.code)?;
        require_text("title", &input.title)?;
        require_text("sector", &input.sector)?;

        let objective = self
            .db
            .with_conn_mut(|conn| objectives::create_objective(conn, input))?;

        self.events.emit(DomainEvent::ObjectiveCreated {
            id: objective.id.clone(),
            code: objective.code.clone(),
        });

        Ok(objective)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ObjectiveLevel;

    fn input(code: &str) -> CreateObjectiveInput {
        CreateObjectiveInput {
            id: None,
            code: code.to_string(),
            title: "Réduire la mortalité infantile".to_string(),
            level: ObjectiveLevel::National,
            sector: "Santé".to_string(),
        }
    }

    #[test]
    fn test_duplicate_code_conflicts() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let svc = ObjectiveService::new(db, Arc::new(EventBus::new()));

        svc.create(input("SAN-01")).unwrap();
        assert!(matches!(svc.create(input("SAN-01")), Err(TrackerError::Conflict(_))));
        assert_eq!(svc.list(None).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_code_rejected() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let svc = ObjectiveService::new(db, Arc::new(EventBus::new()));
        assert!(matches!(svc.create(input("")), Err(TrackerError::InvalidInput(_))));
    }
}
