//! Per-phase delay and progress
//!
//! All values are derived from the stored phase on every read. `today` is
//! passed in by the caller so results are reproducible.

use chrono::NaiveDate;
use serde::Serialize;

use super::round_score;
use crate::db::PhaseRow;
use crate::models::PhaseStatus;

/// Progress reported when no usable start/end pair exists
pub const UNKNOWN_PROGRESS: u32 = 50;

/// Highest progress a blocked phase can report
pub const BLOCKED_PROGRESS_CAP: u32 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseMetrics {
    pub is_delayed: bool,
    pub delay_days: Option<i64>,
    pub progress_percent: u32,
}

/// Whole days the actual end overran the planned end, when positive
pub fn delay_days(phase: &PhaseRow) -> Option<i64> {
    match (phase.actual_end, phase.planned_end) {
        (Some(actual), Some(planned)) => {
            let days = (actual - planned).num_days();
            (days > 0).then_some(days)
        }
        _ => None,
    }
}

pub fn is_delayed(phase: &PhaseRow) -> bool {
    phase.status == PhaseStatus::Blocked || delay_days(phase).is_some()
}

fn effective_window(phase: &PhaseRow) -> Option<(NaiveDate, NaiveDate)> {
    let start = phase.planned_start.or(phase.actual_start)?;
    let end = phase.planned_end.or(phase.actual_end)?;
    (end > start).then_some((start, end))
}

/// Elapsed share of the effective window at `today`, in [0, 100]
pub fn progress_percent(phase: &PhaseRow, today: NaiveDate) -> u32 {
    match phase.status {
        PhaseStatus::Completed => return 100,
        PhaseStatus::Planned => return 0,
        PhaseStatus::InProgress | PhaseStatus::Blocked => {}
    }

    let progress = match effective_window(phase) {
        Some((start, end)) => {
            let total = (end - start).num_days() as f64;
            let elapsed = (today - start).num_days() as f64;
            round_score((elapsed / total * 100.0).clamp(0.0, 100.0))
        }
        None => UNKNOWN_PROGRESS,
    };

    if phase.status == PhaseStatus::Blocked {
        progress.min(BLOCKED_PROGRESS_CAP)
    } else {
        progress
    }
}

pub fn metrics(phase: &PhaseRow, today: NaiveDate) -> PhaseMetrics {
    PhaseMetrics {
        is_delayed: is_delayed(phase),
        delay_days: delay_days(phase),
        progress_percent: progress_percent(phase, today),
    }
}

/// Percentage of delayed phases across a set; 0 for an empty set
pub fn phase_delay_rate<'a, I>(phases: I) -> f64
where
    I: IntoIterator<Item = &'a PhaseRow>,
{
    let (total, delayed) = phases.into_iter().fold((0usize, 0usize), |(total, delayed), p| {
        (total + 1, delayed + usize::from(is_delayed(p)))
    });

    if total == 0 {
        0.0
    } else {
        delayed as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn phase(status: PhaseStatus) -> PhaseRow {
        PhaseRow {
            id: "ph-1".to_string(),
            project_id: "p1".to_string(),
            name: "Études".to_string(),
            planned_start: Some(date("2024-01-01")),
            planned_end: Some(date("2024-01-11")),
            actual_start: None,
            actual_end: None,
            status,
            deliverables: vec![],
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_late_completion_is_delayed() {
        let mut p = phase(PhaseStatus::Completed);
        p.planned_end = Some(date("2024-01-10"));
        p.actual_end = Some(date("2024-01-15"));

        assert!(is_delayed(&p));
        assert_eq!(delay_days(&p), Some(5));
    }

    #[test]
    fn test_early_or_on_time_not_delayed() {
        let mut p = phase(PhaseStatus::Completed);
        p.actual_end = Some(date("2024-01-11"));
        assert!(!is_delayed(&p));
        assert_eq!(delay_days(&p), None);

        p.actual_end = Some(date("2024-01-05"));
        assert_eq!(delay_days(&p), None);
    }

    #[test]
    fn test_blocked_is_delayed_without_dates() {
        let mut p = phase(PhaseStatus::Blocked);
        p.planned_end = None;
        assert!(is_delayed(&p));
        assert_eq!(delay_days(&p), None);
    }

    #[test]
    fn test_progress_extremes_ignore_dates() {
        let today = date("2030-01-01");
        assert_eq!(progress_percent(&phase(PhaseStatus::Planned), today), 0);
        assert_eq!(progress_percent(&phase(PhaseStatus::Completed), date("2000-01-01")), 100);
    }

    #[test]
    fn test_in_progress_elapsed_fraction() {
        let p = phase(PhaseStatus::InProgress);
        assert_eq!(progress_percent(&p, date("2024-01-06")), 50);
        assert_eq!(progress_percent(&p, date("2023-12-01")), 0);
        assert_eq!(progress_percent(&p, date("2024-03-01")), 100);
    }

    #[test]
    fn test_falls_back_to_actual_dates() {
        let mut p = phase(PhaseStatus::InProgress);
        p.planned_start = None;
        p.actual_start = Some(date("2024-01-01"));
        assert_eq!(progress_percent(&p, date("2024-01-03")), 20);
    }

    #[test]
    fn test_unknown_window_defaults_to_half() {
        let mut p = phase(PhaseStatus::InProgress);
        p.planned_start = None;
        assert_eq!(progress_percent(&p, date("2024-01-05")), UNKNOWN_PROGRESS);

        let mut inverted = phase(PhaseStatus::InProgress);
        inverted.planned_end = Some(date("2023-12-25"));
        assert_eq!(progress_percent(&inverted, date("2024-01-05")), UNKNOWN_PROGRESS);
    }

    #[test]
    fn test_blocked_progress_capped() {
        let p = phase(PhaseStatus::Blocked);
        assert_eq!(progress_percent(&p, date("2024-06-01")), BLOCKED_PROGRESS_CAP);
        assert_eq!(progress_percent(&p, date("2024-01-06")), 50);
    }

    #[test]
    fn test_delay_rate() {
        let on_time = phase(PhaseStatus::InProgress);
        let blocked = phase(PhaseStatus::Blocked);
        let phases = vec![on_time.clone(), blocked, on_time.clone(), on_time];

        assert_eq!(phase_delay_rate(&phases), 25.0);
        assert_eq!(phase_delay_rate(&Vec::<PhaseRow>::new()), 0.0);
    }
}
