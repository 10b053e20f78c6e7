//! Indicator service - dashboard summary over the whole project collection

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::analytics::indicators::{
    self, BudgetVariance, GroupMetric, GroupTotal, MonthBucket,
};
use crate::analytics::phase_progress;
use crate::config::Config;
use crate::db::{alerts, phases, planning_alerts, projects, Database};
use crate::error::TrackerError;

use super::alignment_service::alignment_for;
use super::maturity_service::maturity_for;
use super::phase_service::today;

/// Sampling and ranking knobs, taken from `Config`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorSettings {
    pub phase_sample_size: usize,
    pub trend_months: u32,
    pub top_n: usize,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for IndicatorSettings {
    fn from(config: &Config) -> Self {
        Self {
            phase_sample_size: config.phase_sample_size,
            trend_months: config.trend_months,
            top_n: config.top_n,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSummary {
    pub project_count: usize,
    pub budget: BudgetVariance,
    pub at_risk_projects: usize,
    pub alert_trend: Vec<MonthBucket>,
    pub top_sectors_by_count: Vec<GroupTotal>,
    pub top_sectors_by_spend: Vec<GroupTotal>,
    pub top_provinces_by_count: Vec<GroupTotal>,
    pub top_provinces_by_spend: Vec<GroupTotal>,
    pub sample_size: usize,
    pub phase_delay_rate: f64,
    pub average_alignment_score: f64,
    pub average_maturity_score: f64,
}

/// Calendar day of a stored `YYYY-MM-DD HH:MM:SS` timestamp
fn created_day(timestamp: &str) -> Option<NaiveDate> {
    timestamp
        .get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
}

pub struct IndicatorService {
    db: Arc<Database>,
    settings: IndicatorSettings,
}

impl IndicatorService {
    pub fn new(db: Arc<Database>, settings: IndicatorSettings) -> Self {
        Self { db, settings }
    }

    pub fn summary(&self) -> Result<IndicatorSummary, TrackerError> {
        self.summary_at(today())
    }

    /// Build the summary as of `today`, reading everything under one lock
    pub fn summary_at(&self, today: NaiveDate) -> Result<IndicatorSummary, TrackerError> {
        let settings = self.settings;

        self.db.with_conn(|conn| {
            let all_projects = projects::list_all_projects(conn)?;
            let global_alerts = alerts::list_alerts(conn, None)?;
            let planning = planning_alerts::list_all_planning_alerts(conn)?;

            let alert_days = global_alerts
                .iter()
                .map(|a| a.created_at.as_str())
                .chain(planning.iter().map(|a| a.created_at.as_str()))
                .filter_map(created_day);

            let sample = &all_projects[..all_projects.len().min(settings.phase_sample_size)];

            let mut sampled_phases = Vec::new();
            let mut alignment_scores = Vec::with_capacity(sample.len());
            let mut maturity_scores = Vec::with_capacity(sample.len());
            for project in sample {
                sampled_phases.extend(phases::list_phases(conn, &project.id)?);
                alignment_scores.push(alignment_for(conn, project)?.score);
                maturity_scores.push(maturity_for(conn, &project.id)?.score);
            }

            debug!(
                projects = all_projects.len(),
                sampled = sample.len(),
                phases = sampled_phases.len(),
                "Computed indicator summary"
            );

            Ok(IndicatorSummary {
                project_count: all_projects.len(),
                budget: indicators::budget_variance(&all_projects),
                at_risk_projects: indicators::at_risk_project_count(&global_alerts, &planning),
                alert_trend: indicators::monthly_alert_trend(alert_days, today, settings.trend_months),
                top_sectors_by_count: indicators::top_sectors(
                    &all_projects,
                    GroupMetric::Count,
                    settings.top_n,
                ),
                top_sectors_by_spend: indicators::top_sectors(
                    &all_projects,
                    GroupMetric::Spend,
                    settings.top_n,
                ),
                top_provinces_by_count: indicators::top_provinces(
                    &all_projects,
                    GroupMetric::Count,
                    settings.top_n,
                ),
                top_provinces_by_spend: indicators::top_provinces(
                    &all_projects,
                    GroupMetric::Spend,
                    settings.top_n,
                ),
                sample_size: sample.len(),
                phase_delay_rate: phase_progress::phase_delay_rate(&sampled_phases),
                average_alignment_score: indicators::average(&alignment_scores),
                average_maturity_score: indicators::average(&maturity_scores),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_day() {
        assert_eq!(
            created_day("2024-03-05 10:11:12"),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
        assert_eq!(created_day("2024-03"), None);
        assert_eq!(created_day("garbage-value"), None);
    }

    #[test]
    fn test_empty_database_summary() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let svc = IndicatorService::new(db, IndicatorSettings::default());
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();

        let summary = svc.summary_at(today).unwrap();
        assert_eq!(summary.project_count, 0);
        assert_eq!(summary.budget.variance_percent, 0.0);
        assert_eq!(summary.alert_trend.len(), 6);
        assert_eq!(summary.alert_trend[0].month, "2024-01");
        assert_eq!(summary.alert_trend[5].month, "2024-06");
        assert_eq!(summary.phase_delay_rate, 0.0);
        assert_eq!(summary.average_alignment_score, 0.0);
    }
}
