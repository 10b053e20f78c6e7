//! Maturity assessment storage (one row per project)

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use super::get_json_list;
use crate::analytics::maturity::MaturityAssessment;
use crate::error::TrackerError;

/// Stored assessment with its owning project
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentRow {
    pub project_id: String,
    pub assessment: MaturityAssessment,
    pub updated_at: String,
}

impl AssessmentRow {
    fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            project_id: row.get("project_id")?,
            assessment: MaturityAssessment {
                budget_available: row.get("budget_available")?,
                disbursement_planned: row.get("disbursement_planned")?,
                funding_source_confirmed: row.get("funding_source_confirmed")?,
                contracts_signed: row.get("contracts_signed")?,
                feasibility_study: row.get("feasibility_study")?,
                technical_plans_validated: row.get("technical_plans_validated")?,
                documentation_complete: row.get("documentation_complete")?,
                governance_defined: row.get("governance_defined")?,
                steering_committee_formed: row.get("steering_committee_formed")?,
                tenders_launched_awarded: row.get("tenders_launched_awarded")?,
                project_team_available: row.get("project_team_available")?,
                logistics_ready: row.get("logistics_ready")?,
                risks_identified: row.get("risks_identified")?,
                pag_alignment_percent: row.get("pag_alignment_percent")?,
                attachments: get_json_list(row, "attachments_json")?,
            },
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Get the stored assessment for a project
pub fn get_assessment(
    conn: &Connection,
    project_id: &str,
) -> Result<Option<AssessmentRow>, TrackerError> {
    let row = conn
        .query_row(
            "SELECT * FROM maturity_assessments WHERE project_id = ?",
            params![project_id],
            AssessmentRow::from_row,
        )
        .optional()?;
    Ok(row)
}

/// Replace the project's assessment as a whole
pub fn upsert_assessment(
    conn: &mut Connection,
    project_id: &str,
    assessment: &MaturityAssessment,
) -> Result<AssessmentRow, TrackerError> {
    let attachments_json = serde_json::to_string(&assessment.attachments)?;

    conn.execute(
        r#"
        INSERT INTO maturity_assessments (
            project_id, budget_available, disbursement_planned, funding_source_confirmed,
            contracts_signed, feasibility_study, technical_plans_validated,
            documentation_complete, governance_defined, steering_committee_formed,
            tenders_launched_awarded, project_team_available, logistics_ready,
            risks_identified, pag_alignment_percent, attachments_json
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (project_id) DO UPDATE SET
            budget_available = excluded.budget_available,
            disbursement_planned = excluded.disbursement_planned,
            funding_source_confirmed = excluded.funding_source_confirmed,
            contracts_signed = excluded.contracts_signed,
            feasibility_study = excluded.feasibility_study,
            technical_plans_validated = excluded.technical_plans_validated,
            documentation_complete = excluded.documentation_complete,
            governance_defined = excluded.governance_defined,
            steering_committee_formed = excluded.steering_committee_formed,
            tenders_launched_awarded = excluded.tenders_launched_awarded,
            project_team_available = excluded.project_team_available,
            logistics_ready = excluded.logistics_ready,
            risks_identified = excluded.risks_identified,
            pag_alignment_percent = excluded.pag_alignment_percent,
            attachments_json = excluded.attachments_json,
            updated_at = datetime('now')
        "#,
        params![
            project_id,
            assessment.budget_available,
            assessment.disbursement_planned,
            assessment.funding_source_confirmed,
            assessment.contracts_signed,
            assessment.feasibility_study,
            assessment.technical_plans_validated,
            assessment.documentation_complete,
            assessment.governance_defined,
            assessment.steering_committee_formed,
            assessment.tenders_launched_awarded,
            assessment.project_team_available,
            assessment.logistics_ready,
            assessment.risks_identified,
            assessment.pag_alignment_percent,
            attachments_json,
        ],
    )?;

    get_assessment(conn, project_id)?
        .ok_or_else(|| TrackerError::Internal("Assessment not found after upsert".to_string()))
}
