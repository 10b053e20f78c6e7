//! Alert service - planning alerts and global project alerts
//!
//! Both logs are append-only and written on explicit request only.

use std::sync::Arc;

use crate::db::{
    alerts, phases, planning_alerts, projects, AlertRow, CreateAlertInput,
    CreatePlanningAlertInput, Database, PlanningAlertRow,
};
use crate::error::TrackerError;

use super::events::{DomainEvent, EventBus};
use super::project_service::require_text;

pub struct AlertService {
    db: Arc<Database>,
    events: Arc<EventBus>,
}

impl AlertService {
    pub fn new(db: Arc<Database>, events: Arc<EventBus>) -> Self {
        Self { db, events }
    }

    // =========================================================================
    // Planning alerts
    // =========================================================================

    /// Planning alerts of a project, newest first
    pub fn list_planning(&self, project_id: &str) -> Result<Vec<PlanningAlertRow>, TrackerError> {
        self.db.with_conn(|conn| {
            if projects::get_project(conn, project_id)?.is_none() {
                return Err(TrackerError::project_not_found(project_id));
            }
            planning_alerts::list_planning_alerts(conn, project_id)
        })
    }

    /// Log a planning alert. A referenced phase must belong to the project.
    pub fn create_planning(
        &self,
        project_id: &str,
        input: CreatePlanningAlertInput,
    ) -> Result<PlanningAlertRow, TrackerError> {
        require_text("message", &input.message)?;

        let alert = self.db.with_conn_mut(|conn| {
            if projects::get_project(conn, project_id)?.is_none() {
                return Err(TrackerError::project_not_found(project_id));
            }

            if let Some(phase_id) = input.phase_id.as_deref() {
                let phase = phases::get_phase(conn, phase_id)?
                    .ok_or_else(|| TrackerError::phase_not_found(phase_id))?;
                if phase.project_id != project_id {
                    return Err(TrackerError::InvalidInput(format!(
                        "Phase {} does not belong to project {}",
                        phase_id, project_id
                    )));
                }
            }

            planning_alerts::create_planning_alert(conn, project_id, input)
        })?;

        self.events.emit(DomainEvent::PlanningAlertCreated {
            id: alert.id.clone(),
            project_id: alert.project_id.clone(),
            alert_type: alert.alert_type,
            severity: alert.severity,
        });

        Ok(alert)
    }

    // =========================================================================
    // Global alerts
    // =========================================================================

    pub fn list(&self, project_id: Option<&str>) -> Result<Vec<AlertRow>, TrackerError> {
        self.db.with_conn(|conn| alerts::list_alerts(conn, project_id))
    }

    pub fn create(&self, input: CreateAlertInput) -> Result<AlertRow, TrackerError> {
        require_text("project_id", &input.project_id)?;
        require_text("message", &input.message)?;

        let alert = self.db.with_conn_mut(|conn| {
            if projects::get_project(conn, &input.project_id)?.is_none() {
                return Err(TrackerError::project_not_found(&input.project_id));
            }
            alerts::create_alert(conn, input)
        })?;

        self.events.emit(DomainEvent::AlertCreated {
            id: alert.id.clone(),
            project_id: alert.project_id.clone(),
            severity: alert.severity,
        });

        Ok(alert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::phases::tests::phase_input;
    use crate::db::projects::tests::project_input;
    use crate::models::{AlertType, Severity};

    fn seeded() -> (AlertService, String) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let phase_id = db
            .with_conn_mut(|conn| {
                projects::create_project(conn, project_input("p1", "Kinshasa", "Santé"))?;
                projects::create_project(conn, project_input("p2", "Kasaï", "Santé"))?;
                Ok(phases::create_phase(conn, "p2", phase_input("Travaux"))?.id)
            })
            .unwrap();
        (AlertService::new(db, Arc::new(EventBus::new())), phase_id)
    }

    fn planning(phase_id: Option<String>) -> CreatePlanningAlertInput {
        CreatePlanningAlertInput {
            phase_id,
            alert_type: AlertType::Delay,
            severity: Severity::High,
            message: "Retard de livraison".into(),
        }
    }

    #[test]
    fn test_phase_must_belong_to_project() {
        let (svc, phase_id) = seeded();

        let err = svc.create_planning("p1", planning(Some(phase_id.clone()))).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidInput(_)));

        let err = svc.create_planning("p1", planning(Some("ghost".into()))).unwrap_err();
        assert!(matches!(err, TrackerError::NotFound(_)));

        let alert = svc.create_planning("p2", planning(Some(phase_id.clone()))).unwrap();
        assert_eq!(alert.phase_id.as_deref(), Some(phase_id.as_str()));
        assert_eq!(svc.list_planning("p2").unwrap().len(), 1);
        assert!(svc.list_planning("p1").unwrap().is_empty());
    }

    #[test]
    fn test_planning_alert_without_phase() {
        let (svc, _) = seeded();
        let alert = svc.create_planning("p1", planning(None)).unwrap();
        assert_eq!(alert.alert_type, AlertType::Delay);
        assert!(alert.phase_id.is_none());
    }

    #[test]
    fn test_global_alert_requires_project() {
        let (svc, _) = seeded();
        let missing = CreateAlertInput {
            project_id: "p9".into(),
            severity: Severity::Critical,
            message: "Dépassement".into(),
        };
        assert!(matches!(svc.create(missing), Err(TrackerError::NotFound(_))));

        svc.create(CreateAlertInput {
            project_id: "p1".into(),
            severity: Severity::Low,
            message: "Note".into(),
        })
        .unwrap();
        assert_eq!(svc.list(Some("p1")).unwrap().len(), 1);
        assert!(svc.list(Some("p2")).unwrap().is_empty());
        assert_eq!(svc.list(None).unwrap().len(), 1);
    }
}
