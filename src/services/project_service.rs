//! Project service - validation and audit events around the project store

use std::sync::Arc;

use chrono::NaiveDate;

use crate::db::{projects, Database, ProjectQuery, ProjectRow};
use crate::error::TrackerError;
use crate::models::{parse_date, patch_date};

use super::events::{DomainEvent, EventBus};

pub struct ProjectService {
    db: Arc<Database>,
    events: Arc<EventBus>,
}

impl ProjectService {
    pub fn new(db: Arc<Database>, events: Arc<EventBus>) -> Self {
        Self { db, events }
    }

    // =========================================================================
    // Read Operations
    // =========================================================================

    /// Get a project, NotFound if missing
    pub fn get(&self, id: &str) -> Result<ProjectRow, TrackerError> {
        self.db
            .with_conn(|conn| projects::get_project(conn, id))?
            .ok_or_else(|| TrackerError::project_not_found(id))
    }

    pub fn list(&self, query: &ProjectQuery) -> Result<Vec<ProjectRow>, TrackerError> {
        if query.limit < 0 || query.offset < 0 {
            return Err(TrackerError::InvalidInput(
                "limit and offset must not be negative".into(),
            ));
        }
        self.db.with_conn(|conn| projects::list_projects(conn, query))
    }

    // =========================================================================
    // Write Operations
    // =========================================================================

    pub fn create(&self, input: projects::CreateProjectInput) -> Result<ProjectRow, TrackerError> {
        require_text("title", &input.title)?;
        require_text("sector", &input.sector)?;
        require_text("province", &input.province)?;
        require_amount("budget", input.budget)?;
        require_amount("spent", input.spent)?;
        validate_coordinates(input.latitude, input.longitude)?;
        validate_window(
            parse_date("start_date", input.start_date.as_deref())?,
            parse_date("end_date", input.end_date.as_deref())?,
        )?;

        let project = self.db.with_conn_mut(|conn| {
            if let Some(id) = input.id.as_deref() {
                if projects::get_project(conn, id)?.is_some() {
                    return Err(TrackerError::Conflict(format!("Project already exists: {}", id)));
                }
            }
            projects::create_project(conn, input)
        })?;

        self.events.emit(DomainEvent::ProjectCreated {
            id: project.id.clone(),
            title: project.title.clone(),
        });

        Ok(project)
    }

    /// Partial update; emits the list of written fields
    pub fn update(
        &self,
        id: &str,
        input: projects::UpdateProjectInput,
    ) -> Result<ProjectRow, TrackerError> {
        if let Some(title) = &input.title {
            require_text("title", title)?;
        }
        if let Some(sector) = &input.sector {
            require_text("sector", sector)?;
        }
        if let Some(province) = &input.province {
            require_text("province", province)?;
        }
        if let Some(budget) = input.budget {
            require_amount("budget", budget)?;
        }
        if let Some(spent) = input.spent {
            require_amount("spent", spent)?;
        }
        validate_coordinates(input.latitude, input.longitude)?;
        if input.start_date.is_some() || input.end_date.is_some() {
            let stored = self.get(id)?;
            validate_window(
                patch_date("start_date", &input.start_date, stored.start_date)?,
                patch_date("end_date", &input.end_date, stored.end_date)?,
            )?;
        }

        let (project, fields) = self
            .db
            .with_conn_mut(|conn| projects::update_project(conn, id, &input))?;

        if !fields.is_empty() {
            self.events.emit(DomainEvent::ProjectUpdated {
                id: project.id.clone(),
                fields,
            });
        }

        Ok(project)
    }

    /// Delete a project and everything hanging off it
    pub fn delete(&self, id: &str) -> Result<bool, TrackerError> {
        let deleted = self
            .db
            .with_conn_mut(|conn| projects::delete_project(conn, id))?;

        if deleted {
            self.events.emit(DomainEvent::ProjectDeleted { id: id.to_string() });
        }

        Ok(deleted)
    }
}

pub(crate) fn require_text(field: &str, value: &str) -> Result<(), TrackerError> {
    if value.trim().is_empty() {
        return Err(TrackerError::InvalidInput(format!("{} is required", field)));
    }
    Ok(())
}

fn require_amount(field: &str, value: f64) -> Result<(), TrackerError> {
    if !value.is_finite() || value < 0.0 {
        return Err(TrackerError::InvalidInput(format!(
            "{} must be a non-negative number",
            field
        )));
    }
    Ok(())
}

fn validate_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Result<(), TrackerError> {
    if let Some(lat) = latitude {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(TrackerError::InvalidInput("latitude must be within [-90, 90]".into()));
        }
    }
    if let Some(lng) = longitude {
        if !(-180.0..=180.0).contains(&lng) {
            return Err(TrackerError::InvalidInput("longitude must be within [-180, 180]".into()));
        }
    }
    Ok(())
}

fn validate_window(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<(), TrackerError> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(TrackerError::InvalidInput(
                "end_date must not be before start_date".into(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::projects::tests::project_input;
    use crate::db::UpdateProjectInput;
    use crate::models::ProjectStatus;

    fn service() -> (ProjectService, Arc<EventBus>) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let events = Arc::new(EventBus::new());
        (ProjectService::new(db, events.clone()), events)
    }

    #[test]
    fn test_create_rejects_negative_budget() {
        let (svc, _) = service();
        let mut input = project_input("p1", "Kinshasa", "Santé");
        input.budget = -1.0;

        let err = svc.create(input).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidInput(_)));
        assert!(svc.list(&ProjectQuery::default()).unwrap().is_empty());
    }

    #[test]
    fn test_create_requires_title() {
        let (svc, _) = service();
        let mut input = project_input("p1", "Kinshasa", "Santé");
        input.title = "  ".into();
        assert!(matches!(svc.create(input), Err(TrackerError::InvalidInput(_))));
    }

    #[test]
    fn test_end_date_before_start_is_rejected() {
        let (svc, _) = service();
        let mut input = project_input("p1", "Kinshasa", "Santé");
        input.end_date = Some("2023-12-31".into());
        assert!(matches!(svc.create(input), Err(TrackerError::InvalidInput(_))));

        svc.create(project_input("p2", "Kinshasa", "Santé")).unwrap();
        let result = svc.update(
            "p2",
            UpdateProjectInput {
                start_date: Some(Some("2025-02-01".into())),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(TrackerError::InvalidInput(_))));
        assert_eq!(svc.get("p2").unwrap().start_date, NaiveDate::from_ymd_opt(2024, 1, 1));
    }

    #[test]
    fn test_null_actual_end_date_clears() {
        let (svc, _) = service();
        let mut input = project_input("p1", "Kinshasa", "Santé");
        input.actual_end_date = Some("2025-03-01".into());
        svc.create(input).unwrap();

        let patch: UpdateProjectInput =
            serde_json::from_str(r#"{"actual_end_date": null}"#).unwrap();
        let updated = svc.update("p1", patch).unwrap();
        assert_eq!(updated.actual_end_date, None);
        assert_eq!(updated.end_date, NaiveDate::from_ymd_opt(2024, 12, 31));
    }

    #[test]
    fn test_concurrent_duplicate_creates_conflict() {
        let (svc, _) = service();
        let results: Vec<Result<ProjectRow, TrackerError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| svc.create(project_input("p1", "Kinshasa", "Santé"))))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, TrackerError::Conflict(_))));
        assert_eq!(svc.list(&ProjectQuery::default()).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_emits_changed_fields() {
        let (svc, events) = service();
        let mut receiver = events.subscribe();
        svc.create(project_input("p1", "Kinshasa", "Santé")).unwrap();

        let updated = svc
            .update(
                "p1",
                UpdateProjectInput {
                    status: Some(ProjectStatus::Delayed),
                    spent: Some(250.0),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.status, ProjectStatus::Delayed);
        assert_eq!(updated.spent, 250.0);

        assert!(matches!(receiver.recv().await.unwrap(), DomainEvent::ProjectCreated { .. }));
        match receiver.recv().await.unwrap() {
            DomainEvent::ProjectUpdated { id, fields } => {
                assert_eq!(id, "p1");
                assert!(fields.contains(&"status".to_string()));
                assert!(fields.contains(&"spent".to_string()));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let (svc, _) = service();
        assert!(matches!(svc.get("nope"), Err(TrackerError::NotFound(_))));
        assert!(!svc.delete("nope").unwrap());
    }
}
