//! End-to-end service flows against a file-backed database

use std::sync::Arc;

use chrono::NaiveDate;
use pag_tracker::analytics::maturity::{MaturityAssessmentInput, ReadinessStatus};
use pag_tracker::db::{
    CreateObjectiveInput, CreatePhaseInput, CreatePlanningAlertInput, CreateProjectInput,
    UpdatePhaseInput,
};
use pag_tracker::models::{AlertType, ObjectiveLevel, PhaseStatus, ProjectStatus, Severity};
use pag_tracker::{Database, Services, TrackerError};
use tempfile::TempDir;

fn project(id: &str, province: &str, sector: &str) -> CreateProjectInput {
    CreateProjectInput {
        id: Some(id.to_string()),
        title: format!("Projet {}", id),
        description: None,
        sector: sector.to_string(),
        status: ProjectStatus::InProgress,
        budget: 1_000_000.0,
        spent: 250_000.0,
        province: province.to_string(),
        city: Some("Kinshasa".to_string()),
        latitude: None,
        longitude: None,
        start_date: Some("2024-01-01".to_string()),
        end_date: Some("2024-12-31".to_string()),
        actual_end_date: None,
        ministry: Some("Ministère de la Santé".to_string()),
        responsible_person: None,
        created_by: None,
    }
}

fn objective(id: &str, code: &str, sector: &str) -> CreateObjectiveInput {
    CreateObjectiveInput {
        id: Some(id.to_string()),
        code: code.to_string(),
        title: format!("Objectif {}", code),
        level: ObjectiveLevel::National,
        sector: sector.to_string(),
    }
}

fn services(dir: &TempDir) -> Services {
    let db = Arc::new(Database::open(dir.path()).unwrap());
    Services::new(db)
}

#[test]
fn test_alignment_scenario() {
    let dir = TempDir::new().unwrap();
    let services = services(&dir);

    services.projects.create(project("P", "Kinshasa", "Santé")).unwrap();
    services.projects.create(project("P2", "Kinshasa", "Santé")).unwrap();
    services.projects.create(project("P3", "Kasaï", "Santé")).unwrap();

    services.objectives.create(objective("O1", "SAN-01", "Santé")).unwrap();
    services.objectives.create(objective("O2", "SAN-02", "Santé")).unwrap();
    services.objectives.create(objective("O3", "SAN-03", "Santé")).unwrap();
    services.objectives.create(objective("E1", "EDU-01", "Éducation")).unwrap();

    services.alignment.link("P", "O1", 4).unwrap();
    services.alignment.link("P", "O2", 2).unwrap();

    let result = services.alignment.get_alignment("P").unwrap();
    assert_eq!(result.score, 60);
    assert_eq!(result.redundancy.similar_projects, 1);

    let linked: Vec<&str> = result.objectives.iter().map(|l| l.objective.id.as_str()).collect();
    assert_eq!(linked, vec!["O1", "O2"]);

    let suggested: Vec<&str> = result.suggestions.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(suggested, vec!["O3"]);
}

#[test]
fn test_relink_keeps_single_row() {
    let dir = TempDir::new().unwrap();
    let services = services(&dir);

    services.projects.create(project("P", "Kinshasa", "Santé")).unwrap();
    services.objectives.create(objective("O1", "SAN-01", "Santé")).unwrap();

    services.alignment.link("P", "O1", 2).unwrap();
    services.alignment.link("P", "O1", 5).unwrap();

    let result = services.alignment.get_alignment("P").unwrap();
    assert_eq!(result.objectives.len(), 1);
    assert_eq!(result.objectives[0].weight, 5);
    assert_eq!(result.score, 100);
    assert_eq!(services.db.stats().unwrap().link_count, 1);
}

#[test]
fn test_data_survives_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let services = services(&dir);
        services.projects.create(project("P", "Kinshasa", "Santé")).unwrap();
        services
            .maturity
            .save(
                "P",
                MaturityAssessmentInput {
                    budget_available: Some(true),
                    disbursement_planned: Some(true),
                    funding_source_confirmed: Some(true),
                    contracts_signed: Some(true),
                    feasibility_study: Some(true),
                    technical_plans_validated: Some(true),
                    documentation_complete: Some(true),
                    governance_defined: Some(true),
                    steering_committee_formed: Some(true),
                    tenders_launched_awarded: Some(true),
                    pag_alignment_percent: Some(80.0),
                    ..Default::default()
                },
            )
            .unwrap();
    }

    let services = services(&dir);
    let result = services.maturity.get("P").unwrap();
    // 75 checklist points + 8 strategic
    assert_eq!(result.score, 83);
    assert_eq!(result.recommendation.status, ReadinessStatus::Ready);
    assert_eq!(result.dimensions.operational, 0);
    assert_eq!(result.recommendation.blocking_items.len(), 3);
}

#[test]
fn test_project_delete_cascades() {
    let dir = TempDir::new().unwrap();
    let services = services(&dir);

    services.projects.create(project("P", "Kinshasa", "Santé")).unwrap();
    services.objectives.create(objective("O1", "SAN-01", "Santé")).unwrap();
    services.alignment.link("P", "O1", 3).unwrap();
    let phase = services
        .phases
        .create(
            "P",
            CreatePhaseInput {
                id: None,
                name: "Études".to_string(),
                planned_start: Some("2024-01-01".to_string()),
                planned_end: Some("2024-01-10".to_string()),
                actual_start: None,
                actual_end: None,
                status: PhaseStatus::Planned,
                deliverables: vec![],
            },
        )
        .unwrap();
    services
        .alerts
        .create_planning(
            "P",
            CreatePlanningAlertInput {
                phase_id: Some(phase.phase.id.clone()),
                alert_type: AlertType::Delay,
                severity: Severity::Medium,
                message: "Retard".to_string(),
            },
        )
        .unwrap();

    assert!(services.projects.delete("P").unwrap());

    let stats = services.db.stats().unwrap();
    assert_eq!(stats.project_count, 0);
    assert_eq!(stats.link_count, 0);
    assert_eq!(stats.phase_count, 0);
    assert_eq!(stats.planning_alert_count, 0);
    assert_eq!(stats.objective_count, 1);
    assert!(matches!(
        services.phases.get(&phase.phase.id),
        Err(TrackerError::NotFound(_))
    ));
}

#[test]
fn test_indicator_summary_samples_phases() {
    let dir = TempDir::new().unwrap();
    let services = services(&dir);

    services.projects.create(project("P", "Kinshasa", "Santé")).unwrap();
    let mut other = project("Q", "Kasaï", "Éducation");
    other.spent = 1_250_000.0;
    services.projects.create(other).unwrap();

    let phase = |name: &str, status: PhaseStatus| CreatePhaseInput {
        id: None,
        name: name.to_string(),
        planned_start: Some("2024-01-01".to_string()),
        planned_end: Some("2024-01-10".to_string()),
        actual_start: None,
        actual_end: None,
        status,
        deliverables: vec![],
    };
    services.phases.create("P", phase("Études", PhaseStatus::Completed)).unwrap();
    let late = services.phases.create("P", phase("Travaux", PhaseStatus::InProgress)).unwrap();
    services
        .phases
        .update(
            &late.phase.id,
            UpdatePhaseInput {
                status: Some(PhaseStatus::Blocked),
                ..Default::default()
            },
        )
        .unwrap();
    services.phases.create("Q", phase("Études", PhaseStatus::Planned)).unwrap();
    services.phases.create("Q", phase("Appel d'offres", PhaseStatus::Planned)).unwrap();

    services
        .alerts
        .create_planning(
            "Q",
            CreatePlanningAlertInput {
                phase_id: None,
                alert_type: AlertType::BudgetDrift,
                severity: Severity::Critical,
                message: "Dépassement budgétaire".to_string(),
            },
        )
        .unwrap();

    let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let summary = services.indicators.summary_at(today).unwrap();

    assert_eq!(summary.project_count, 2);
    assert_eq!(summary.sample_size, 2);
    assert_eq!(summary.phase_delay_rate, 25.0);
    assert_eq!(summary.at_risk_projects, 1);
    assert_eq!(summary.budget.total_budget, 2_000_000.0);
    assert_eq!(summary.budget.variance, -500_000.0);
    assert_eq!(summary.budget.variance_percent, -25.0);
    assert_eq!(summary.top_sectors_by_spend[0].key, "Éducation");
    assert_eq!(summary.top_provinces_by_count.len(), 2);
    assert_eq!(summary.alert_trend.len(), 6);
}
