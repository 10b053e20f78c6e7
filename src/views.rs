//! View types for the HTTP API boundary
//!
//! These types use camelCase serialization for the TypeScript client.
//! Rows and analytics results stay snake_case.
//!
//! Pattern:
//! - Services return rows and analytics results
//! - The HTTP layer converts them into `*View` types
//! - ts-rs generates camelCase TypeScript from the view types
//!
//! Dates are exposed as `YYYY-MM-DD` strings.

use serde::Serialize;
use ts_rs::TS;

use crate::analytics::alignment::AlignmentResult;
use crate::analytics::indicators::{BudgetVariance, GroupTotal, MonthBucket};
use crate::analytics::maturity::{
    ChecklistItem, DimensionScores, MaturityAssessment, MaturityResult, ReadinessStatus,
};
use crate::db::{
    AlertRow, DbStats, LinkRow, LinkedObjectiveRow, ObjectiveRow, PlanningAlertRow, ProjectRow,
};
use crate::models::{
    format_date, AlertType, Attachment, Deliverable, ObjectiveLevel, PhaseStatus, ProjectStatus,
    Severity,
};
use crate::services::{IndicatorSummary, TrackedPhase};

fn date_string(date: Option<chrono::NaiveDate>) -> Option<String> {
    date.map(format_date)
}

// ============================================================================
// Objectives and Projects
// ============================================================================

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ObjectiveView {
    pub id: String,
    pub code: String,
    pub title: String,
    pub level: ObjectiveLevel,
    pub sector: String,
    pub created_at: String,
}

impl From<ObjectiveRow> for ObjectiveView {
    fn from(o: ObjectiveRow) -> Self {
        Self {
            id: o.id,
            code: o.code,
            title: o.title,
            level: o.level,
            sector: o.sector,
            created_at: o.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CoordinatesView {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProjectView {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub sector: String,
    pub status: ProjectStatus,
    pub budget: f64,
    pub spent: f64,
    pub province: String,
    pub city: Option<String>,
    /// Present only when both latitude and longitude are stored
    pub coordinates: Option<CoordinatesView>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub actual_end_date: Option<String>,
    pub ministry: Option<String>,
    pub responsible_person: Option<String>,
    pub created_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ProjectRow> for ProjectView {
    fn from(p: ProjectRow) -> Self {
        let coordinates = match (p.latitude, p.longitude) {
            (Some(latitude), Some(longitude)) => Some(CoordinatesView { latitude, longitude }),
            _ => None,
        };

        Self {
            id: p.id,
            title: p.title,
            description: p.description,
            sector: p.sector,
            status: p.status,
            budget: p.budget,
            spent: p.spent,
            province: p.province,
            city: p.city,
            coordinates,
            start_date: date_string(p.start_date),
            end_date: date_string(p.end_date),
            actual_end_date: date_string(p.actual_end_date),
            ministry: p.ministry,
            responsible_person: p.responsible_person,
            created_by: p.created_by,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

// ============================================================================
// Alignment
// ============================================================================

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LinkView {
    pub project_id: String,
    pub objective_id: String,
    pub weight: u8,
    pub created_at: String,
    pub updated_at: String,
}

impl From<LinkRow> for LinkView {
    fn from(l: LinkRow) -> Self {
        Self {
            project_id: l.project_id,
            objective_id: l.objective_id,
            weight: l.weight,
            created_at: l.created_at,
            updated_at: l.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LinkedObjectiveView {
    #[serde(flatten)]
    pub objective: ObjectiveView,
    pub weight: u8,
}

impl From<LinkedObjectiveRow> for LinkedObjectiveView {
    fn from(l: LinkedObjectiveRow) -> Self {
        Self {
            objective: l.objective.into(),
            weight: l.weight,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RedundancyView {
    pub similar_projects: usize,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AlignmentView {
    pub score: u32,
    pub objectives: Vec<LinkedObjectiveView>,
    pub redundancy: RedundancyView,
    pub suggestions: Vec<ObjectiveView>,
}

impl From<AlignmentResult> for AlignmentView {
    fn from(a: AlignmentResult) -> Self {
        Self {
            score: a.score,
            objectives: a.objectives.into_iter().map(Into::into).collect(),
            redundancy: RedundancyView {
                similar_projects: a.redundancy.similar_projects,
            },
            suggestions: a.suggestions.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================================================
// Maturity
// ============================================================================

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AssessmentView {
    pub budget_available: bool,
    pub disbursement_planned: bool,
    pub funding_source_confirmed: bool,
    pub contracts_signed: bool,
    pub feasibility_study: bool,
    pub technical_plans_validated: bool,
    pub documentation_complete: bool,
    pub governance_defined: bool,
    pub steering_committee_formed: bool,
    pub tenders_launched_awarded: bool,
    pub project_team_available: bool,
    pub logistics_ready: bool,
    pub risks_identified: bool,
    pub pag_alignment_percent: f64,
    pub attachments: Vec<Attachment>,
}

impl From<MaturityAssessment> for AssessmentView {
    fn from(a: MaturityAssessment) -> Self {
        Self {
            budget_available: a.budget_available,
            disbursement_planned: a.disbursement_planned,
            funding_source_confirmed: a.funding_source_confirmed,
            contracts_signed: a.contracts_signed,
            feasibility_study: a.feasibility_study,
            technical_plans_validated: a.technical_plans_validated,
            documentation_complete: a.documentation_complete,
            governance_defined: a.governance_defined,
            steering_committee_formed: a.steering_committee_formed,
            tenders_launched_awarded: a.tenders_launched_awarded,
            project_team_available: a.project_team_available,
            logistics_ready: a.logistics_ready,
            risks_identified: a.risks_identified,
            pag_alignment_percent: a.pag_alignment_percent,
            attachments: a.attachments,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DimensionScoresView {
    pub financial: u32,
    pub technical: u32,
    pub legal: u32,
    pub operational: u32,
    pub strategic: u32,
}

impl From<DimensionScores> for DimensionScoresView {
    fn from(d: DimensionScores) -> Self {
        Self {
            financial: d.financial,
            technical: d.technical,
            legal: d.legal,
            operational: d.operational,
            strategic: d.strategic,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RecommendationView {
    pub status: ReadinessStatus,
    pub message: String,
    pub blocking_items: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MaturityView {
    pub score: u32,
    pub dimensions: DimensionScoresView,
    pub recommendation: RecommendationView,
    pub assessment: AssessmentView,
}

impl From<MaturityResult> for MaturityView {
    fn from(m: MaturityResult) -> Self {
        Self {
            score: m.score,
            dimensions: m.dimensions.into(),
            recommendation: RecommendationView {
                status: m.recommendation.status,
                message: m.recommendation.message,
                blocking_items: m.recommendation.blocking_items,
            },
            assessment: m.assessment.into(),
        }
    }
}

// ============================================================================
// Phases
// ============================================================================

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PhaseView {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub planned_start: Option<String>,
    pub planned_end: Option<String>,
    pub actual_start: Option<String>,
    pub actual_end: Option<String>,
    pub status: PhaseStatus,
    pub deliverables: Vec<Deliverable>,
    pub is_delayed: bool,
    pub delay_days: Option<i64>,
    pub progress_percent: u32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<TrackedPhase> for PhaseView {
    fn from(t: TrackedPhase) -> Self {
        let p = t.phase;
        Self {
            id: p.id,
            project_id: p.project_id,
            name: p.name,
            planned_start: date_string(p.planned_start),
            planned_end: date_string(p.planned_end),
            actual_start: date_string(p.actual_start),
            actual_end: date_string(p.actual_end),
            status: p.status,
            deliverables: p.deliverables,
            is_delayed: t.metrics.is_delayed,
            delay_days: t.metrics.delay_days,
            progress_percent: t.metrics.progress_percent,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

// ============================================================================
// Alerts
// ============================================================================

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PlanningAlertView {
    pub id: String,
    pub project_id: String,
    pub phase_id: Option<String>,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: Severity,
    pub message: String,
    pub created_at: String,
}

impl From<PlanningAlertRow> for PlanningAlertView {
    fn from(a: PlanningAlertRow) -> Self {
        Self {
            id: a.id,
            project_id: a.project_id,
            phase_id: a.phase_id,
            alert_type: a.alert_type,
            severity: a.severity,
            message: a.message,
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AlertView {
    pub id: String,
    pub project_id: String,
    pub severity: Severity,
    pub message: String,
    pub created_at: String,
}

impl From<AlertRow> for AlertView {
    fn from(a: AlertRow) -> Self {
        Self {
            id: a.id,
            project_id: a.project_id,
            severity: a.severity,
            message: a.message,
            created_at: a.created_at,
        }
    }
}

// ============================================================================
// Indicators
// ============================================================================

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BudgetVarianceView {
    pub total_budget: f64,
    pub total_spent: f64,
    pub variance: f64,
    pub variance_percent: f64,
}

impl From<BudgetVariance> for BudgetVarianceView {
    fn from(b: BudgetVariance) -> Self {
        Self {
            total_budget: b.total_budget,
            total_spent: b.total_spent,
            variance: b.variance,
            variance_percent: b.variance_percent,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MonthBucketView {
    pub month: String,
    pub count: usize,
}

impl From<MonthBucket> for MonthBucketView {
    fn from(m: MonthBucket) -> Self {
        Self {
            month: m.month,
            count: m.count,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GroupTotalView {
    pub key: String,
    pub count: usize,
    pub spent: f64,
}

impl From<GroupTotal> for GroupTotalView {
    fn from(g: GroupTotal) -> Self {
        Self {
            key: g.key,
            count: g.count,
            spent: g.spent,
        }
    }
}

fn groups(groups: Vec<GroupTotal>) -> Vec<GroupTotalView> {
    groups.into_iter().map(Into::into).collect()
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct IndicatorSummaryView {
    pub project_count: usize,
    pub budget: BudgetVarianceView,
    pub at_risk_projects: usize,
    pub alert_trend: Vec<MonthBucketView>,
    pub top_sectors_by_count: Vec<GroupTotalView>,
    pub top_sectors_by_spend: Vec<GroupTotalView>,
    pub top_provinces_by_count: Vec<GroupTotalView>,
    pub top_provinces_by_spend: Vec<GroupTotalView>,
    pub sample_size: usize,
    pub phase_delay_rate: f64,
    pub average_alignment_score: f64,
    pub average_maturity_score: f64,
}

impl From<IndicatorSummary> for IndicatorSummaryView {
    fn from(s: IndicatorSummary) -> Self {
        Self {
            project_count: s.project_count,
            budget: s.budget.into(),
            at_risk_projects: s.at_risk_projects,
            alert_trend: s.alert_trend.into_iter().map(Into::into).collect(),
            top_sectors_by_count: groups(s.top_sectors_by_count),
            top_sectors_by_spend: groups(s.top_sectors_by_spend),
            top_provinces_by_count: groups(s.top_provinces_by_count),
            top_provinces_by_spend: groups(s.top_provinces_by_spend),
            sample_size: s.sample_size,
            phase_delay_rate: s.phase_delay_rate,
            average_alignment_score: s.average_alignment_score,
            average_maturity_score: s.average_maturity_score,
        }
    }
}

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct HealthView {
    pub status: String,
    pub version: String,
    pub objectives: u64,
    pub projects: u64,
    pub phases: u64,
    pub assessments: u64,
    pub alerts: u64,
}

impl From<DbStats> for HealthView {
    fn from(s: DbStats) -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            objectives: s.objective_count,
            projects: s.project_count,
            phases: s.phase_count,
            assessments: s.assessment_count,
            alerts: s.alert_count + s.planning_alert_count,
        }
    }
}
