//! Alignment of a project with national policy objectives
//!
//! The score measures how far the weighted links saturate the maximum
//! possible contribution: every linked objective can contribute at most
//! `MAX_WEIGHT`, and a project with no links is scored against a single
//! empty slot so the ratio stays defined.
//!
//! Province and sector comparisons are exact string equality.

use std::collections::HashSet;

use serde::Serialize;

use super::round_score;
use crate::db::{LinkedObjectiveRow, ObjectiveRow, ProjectRow};

pub const MIN_WEIGHT: u8 = 1;
pub const MAX_WEIGHT: u8 = 5;

/// Number of unlinked same-sector objectives offered as suggestions
pub const SUGGESTION_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignmentResult {
    pub score: u32,
    pub objectives: Vec<LinkedObjectiveRow>,
    pub redundancy: Redundancy,
    pub suggestions: Vec<ObjectiveRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Redundancy {
    pub similar_projects: usize,
}

/// Clamp a requested link weight into [MIN_WEIGHT, MAX_WEIGHT]
pub fn clamp_weight(weight: i64) -> u8 {
    weight.clamp(MIN_WEIGHT as i64, MAX_WEIGHT as i64) as u8
}

/// `round(total_weight / (max(links, 1) * 5) * 100)`
pub fn alignment_score(weights: &[u8]) -> u32 {
    let total_possible = weights.len().max(1) as f64 * MAX_WEIGHT as f64;
    let total_weight: f64 = weights
        .iter()
        .map(|w| (*w).clamp(MIN_WEIGHT, MAX_WEIGHT) as f64)
        .sum();

    round_score(total_weight * 100.0 / total_possible).min(100)
}

/// Count other projects sharing the project's province and sector
pub fn count_similar_projects(project: &ProjectRow, candidates: &[ProjectRow]) -> usize {
    candidates
        .iter()
        .filter(|p| p.id != project.id)
        .filter(|p| p.province == project.province && p.sector == project.sector)
        .count()
}

/// Same-sector objectives not yet linked, ordered by code, at most `limit`
pub fn suggest_objectives(
    sector: &str,
    catalog: &[ObjectiveRow],
    linked: &[LinkedObjectiveRow],
    limit: usize,
) -> Vec<ObjectiveRow> {
    let linked_ids: HashSet<&str> = linked.iter().map(|l| l.objective.id.as_str()).collect();

    let mut candidates: Vec<&ObjectiveRow> = catalog
        .iter()
        .filter(|o| o.sector == sector && !linked_ids.contains(o.id.as_str()))
        .collect();
    candidates.sort_by(|a, b| a.code.cmp(&b.code));

    candidates.into_iter().take(limit).cloned().collect()
}

/// Compute the full alignment result for a project
pub fn evaluate(
    project: &ProjectRow,
    links: Vec<LinkedObjectiveRow>,
    candidates: &[ProjectRow],
    catalog: &[ObjectiveRow],
) -> AlignmentResult {
    let weights: Vec<u8> = links.iter().map(|l| l.weight).collect();
    let suggestions = suggest_objectives(&project.sector, catalog, &links, SUGGESTION_LIMIT);

    AlignmentResult {
        score: alignment_score(&weights),
        redundancy: Redundancy {
            similar_projects: count_similar_projects(project, candidates),
        },
        objectives: links,
        suggestions,
    }
}
