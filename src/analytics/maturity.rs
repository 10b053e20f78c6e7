//! Project maturity assessment
//!
//! Thirteen checklist items grouped into four dimensions carry fixed
//! points; a fifth, strategic, dimension is driven by the PAG alignment
//! slider. Each dimension's points add up to its ceiling, and the ceilings
//! add up to 100, so the overall score is the plain sum of earned points.
//!
//! | Dimension   | Ceiling |
//! |-------------|---------|
//! | financial   | 30      |
//! | technical   | 25      |
//! | legal       | 20      |
//! | operational | 15      |
//! | strategic   | 10      |

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::round_score;
use crate::models::Attachment;

/// Score at or above which a project is ready
pub const READY_THRESHOLD: u32 = 80;

/// Score at or above which a project is preparing
pub const PREPARING_THRESHOLD: u32 = 50;

/// Unchecked items reported as blocking
pub const BLOCKING_ITEM_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Dimension {
    Financial,
    Technical,
    Legal,
    Operational,
    Strategic,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::Financial,
        Dimension::Technical,
        Dimension::Legal,
        Dimension::Operational,
        Dimension::Strategic,
    ];

    /// Share of the overall score this dimension can contribute
    pub fn ceiling(&self) -> u32 {
        match self {
            Dimension::Financial => 30,
            Dimension::Technical => 25,
            Dimension::Legal => 20,
            Dimension::Operational => 15,
            Dimension::Strategic => 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ChecklistItem {
    BudgetAvailable,
    DisbursementPlanned,
    FundingSourceConfirmed,
    ContractsSigned,
    FeasibilityStudy,
    TechnicalPlansValidated,
    DocumentationComplete,
    GovernanceDefined,
    SteeringCommitteeFormed,
    TendersLaunchedAwarded,
    ProjectTeamAvailable,
    LogisticsReady,
    RisksIdentified,
}

/// A checklist item with its dimension and point value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecklistEntry {
    pub item: ChecklistItem,
    pub dimension: Dimension,
    pub points: u32,
}

const fn entry(item: ChecklistItem, dimension: Dimension, points: u32) -> ChecklistEntry {
    ChecklistEntry {
        item,
        dimension,
        points,
    }
}

/// Checklist in declaration order; ties in blocking ranking follow this order
pub const CHECKLIST: [ChecklistEntry; 13] = [
    entry(ChecklistItem::BudgetAvailable, Dimension::Financial, 10),
    entry(ChecklistItem::DisbursementPlanned, Dimension::Financial, 10),
    entry(ChecklistItem::FundingSourceConfirmed, Dimension::Financial, 5),
    entry(ChecklistItem::ContractsSigned, Dimension::Financial, 5),
    entry(ChecklistItem::FeasibilityStudy, Dimension::Technical, 10),
    entry(ChecklistItem::TechnicalPlansValidated, Dimension::Technical, 10),
    entry(ChecklistItem::DocumentationComplete, Dimension::Technical, 5),
    entry(ChecklistItem::GovernanceDefined, Dimension::Legal, 5),
    entry(ChecklistItem::SteeringCommitteeFormed, Dimension::Legal, 5),
    entry(ChecklistItem::TendersLaunchedAwarded, Dimension::Legal, 10),
    entry(ChecklistItem::ProjectTeamAvailable, Dimension::Operational, 5),
    entry(ChecklistItem::LogisticsReady, Dimension::Operational, 5),
    entry(ChecklistItem::RisksIdentified, Dimension::Operational, 5),
];

/// Full checklist state for one project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaturityAssessment {
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

impl MaturityAssessment {
    pub fn is_checked(&self, item: ChecklistItem) -> bool {
        match item {
            ChecklistItem::BudgetAvailable => self.budget_available,
            ChecklistItem::DisbursementPlanned => self.disbursement_planned,
            ChecklistItem::FundingSourceConfirmed => self.funding_source_confirmed,
            ChecklistItem::ContractsSigned => self.contracts_signed,
            ChecklistItem::FeasibilityStudy => self.feasibility_study,
            ChecklistItem::TechnicalPlansValidated => self.technical_plans_validated,
            ChecklistItem::DocumentationComplete => self.documentation_complete,
            ChecklistItem::GovernanceDefined => self.governance_defined,
            ChecklistItem::SteeringCommitteeFormed => self.steering_committee_formed,
            ChecklistItem::TendersLaunchedAwarded => self.tenders_launched_awarded,
            ChecklistItem::ProjectTeamAvailable => self.project_team_available,
            ChecklistItem::LogisticsReady => self.logistics_ready,
            ChecklistItem::RisksIdentified => self.risks_identified,
        }
    }

    /// PAG alignment slider clamped into [0, 100]
    pub fn pag_alignment(&self) -> f64 {
        clamp_percent(self.pag_alignment_percent)
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Assessment payload as sent by the client. Missing fields fall back to the
/// stored assessment, then to false / 0.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MaturityAssessmentInput {
    pub budget_available: Option<bool>,
    pub disbursement_planned: Option<bool>,
    pub funding_source_confirmed: Option<bool>,
    pub contracts_signed: Option<bool>,
    pub feasibility_study: Option<bool>,
    pub technical_plans_validated: Option<bool>,
    pub documentation_complete: Option<bool>,
    pub governance_defined: Option<bool>,
    pub steering_committee_formed: Option<bool>,
    pub tenders_launched_awarded: Option<bool>,
    pub project_team_available: Option<bool>,
    pub logistics_ready: Option<bool>,
    pub risks_identified: Option<bool>,
    pub pag_alignment_percent: Option<f64>,
    pub attachments: Option<Vec<Attachment>>,
}

impl MaturityAssessmentInput {
    pub fn merge(self, stored: Option<&MaturityAssessment>) -> MaturityAssessment {
        let base = stored.cloned().unwrap_or_default();

        MaturityAssessment {
            budget_available: self.budget_available.unwrap_or(base.budget_available),
            disbursement_planned: self.disbursement_planned.unwrap_or(base.disbursement_planned),
            funding_source_confirmed: self
                .funding_source_confirmed
                .unwrap_or(base.funding_source_confirmed),
            contracts_signed: self.contracts_signed.unwrap_or(base.contracts_signed),
            feasibility_study: self.feasibility_study.unwrap_or(base.feasibility_study),
            technical_plans_validated: self
                .technical_plans_validated
                .unwrap_or(base.technical_plans_validated),
            documentation_complete: self
                .documentation_complete
                .unwrap_or(base.documentation_complete),
            governance_defined: self.governance_defined.unwrap_or(base.governance_defined),
            steering_committee_formed: self
                .steering_committee_formed
                .unwrap_or(base.steering_committee_formed),
            tenders_launched_awarded: self
                .tenders_launched_awarded
                .unwrap_or(base.tenders_launched_awarded),
            project_team_available: self
                .project_team_available
                .unwrap_or(base.project_team_available),
            logistics_ready: self.logistics_ready.unwrap_or(base.logistics_ready),
            risks_identified: self.risks_identified.unwrap_or(base.risks_identified),
            pag_alignment_percent: clamp_percent(
                self.pag_alignment_percent.unwrap_or(base.pag_alignment_percent),
            ),
            attachments: self.attachments.unwrap_or(base.attachments),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ReadinessStatus {
    Ready,
    Preparing,
    NotReady,
}

impl ReadinessStatus {
    pub fn message(&self) -> &'static str {
        match self {
            ReadinessStatus::Ready => "Project is ready to move into execution.",
            ReadinessStatus::Preparing => {
                "Project preparation is under way; close the remaining gaps before launch."
            }
            ReadinessStatus::NotReady => {
                "Project is not ready; key financial, technical or legal prerequisites are missing."
            }
        }
    }
}

/// Per-dimension scores, each expressed as a percentage of its own ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DimensionScores {
    pub financial: u32,
    pub technical: u32,
    pub legal: u32,
    pub operational: u32,
    pub strategic: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub status: ReadinessStatus,
    pub message: String,
    pub blocking_items: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaturityResult {
    pub assessment: MaturityAssessment,
    pub score: u32,
    pub dimensions: DimensionScores,
    pub recommendation: Recommendation,
}

/// Points earned in a dimension, on the dimension's ceiling scale
pub fn earned_points(assessment: &MaturityAssessment, dimension: Dimension) -> f64 {
    match dimension {
        Dimension::Strategic => {
            assessment.pag_alignment() / 100.0 * Dimension::Strategic.ceiling() as f64
        }
        _ => CHECKLIST
            .iter()
            .filter(|e| e.dimension == dimension && assessment.is_checked(e.item))
            .map(|e| e.points as f64)
            .sum(),
    }
}

/// Dimension score on a 0-100 scale
pub fn dimension_score(assessment: &MaturityAssessment, dimension: Dimension) -> u32 {
    match dimension {
        Dimension::Strategic => round_score(assessment.pag_alignment()),
        _ => round_score(earned_points(assessment, dimension) * 100.0 / dimension.ceiling() as f64),
    }
}

pub fn dimension_scores(assessment: &MaturityAssessment) -> DimensionScores {
    DimensionScores {
        financial: dimension_score(assessment, Dimension::Financial),
        technical: dimension_score(assessment, Dimension::Technical),
        legal: dimension_score(assessment, Dimension::Legal),
        operational: dimension_score(assessment, Dimension::Operational),
        strategic: dimension_score(assessment, Dimension::Strategic),
    }
}

/// Overall score: sum of earned points across all dimensions
pub fn overall_score(assessment: &MaturityAssessment) -> u32 {
    let total: f64 = Dimension::ALL
        .iter()
        .map(|d| earned_points(assessment, *d))
        .sum();
    round_score(total).min(100)
}

pub fn readiness_status(score: u32) -> ReadinessStatus {
    if score >= READY_THRESHOLD {
        ReadinessStatus::Ready
    } else if score >= PREPARING_THRESHOLD {
        ReadinessStatus::Preparing
    } else {
        ReadinessStatus::NotReady
    }
}

/// Unchecked items by points descending, declaration order on ties
pub fn top_blocking_items(assessment: &MaturityAssessment, limit: usize) -> Vec<ChecklistEntry> {
    let mut unchecked: Vec<ChecklistEntry> = CHECKLIST
        .iter()
        .copied()
        .filter(|e| !assessment.is_checked(e.item))
        .collect();
    // sort_by is stable, so equal points keep declaration order
    unchecked.sort_by(|a, b| b.points.cmp(&a.points));
    unchecked.truncate(limit);
    unchecked
}

/// Score an assessment from scratch
pub fn evaluate(mut assessment: MaturityAssessment) -> MaturityResult {
    assessment.pag_alignment_percent = assessment.pag_alignment();

    let score = overall_score(&assessment);
    let status = readiness_status(score);
    let blocking_items = top_blocking_items(&assessment, BLOCKING_ITEM_LIMIT)
        .into_iter()
        .map(|e| e.item)
        .collect();

    MaturityResult {
        dimensions: dimension_scores(&assessment),
        recommendation: Recommendation {
            status,
            message: status.message().to_string(),
            blocking_items,
        },
        score,
        assessment,
    }
}
