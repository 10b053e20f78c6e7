//! Dashboard rollups over already-fetched collections

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::db::{AlertRow, PlanningAlertRow, ProjectRow};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BudgetVariance {
    pub total_budget: f64,
    pub total_spent: f64,
    pub variance: f64,
    pub variance_percent: f64,
}

/// `sum(spent) - sum(budget)`, with the percent relative to total budget
pub fn budget_variance(projects: &[ProjectRow]) -> BudgetVariance {
    let total_budget: f64 = projects.iter().map(|p| p.budget).sum();
    let total_spent: f64 = projects.iter().map(|p| p.spent).sum();
    let variance = total_spent - total_budget;
    let variance_percent = if total_budget == 0.0 {
        0.0
    } else {
        variance / total_budget * 100.0
    };

    BudgetVariance {
        total_budget,
        total_spent,
        variance,
        variance_percent,
    }
}

/// Distinct projects referenced by a high or critical alert of either kind
pub fn at_risk_project_count(alerts: &[AlertRow], planning_alerts: &[PlanningAlertRow]) -> usize {
    let global = alerts
        .iter()
        .filter(|a| a.severity.is_at_risk())
        .map(|a| a.project_id.as_str());
    let planning = planning_alerts
        .iter()
        .filter(|a| a.severity.is_at_risk())
        .map(|a| a.project_id.as_str());

    global.chain(planning).collect::<HashSet<_>>().len()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthBucket {
    /// `YYYY-MM`
    pub month: String,
    pub count: usize,
}

fn months_back(year: i32, month: u32, back: u32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 - back as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

/// Alert counts per calendar month over the trailing `months` months
/// including the current one, oldest first. Dates outside the window are
/// ignored.
pub fn monthly_alert_trend<I>(dates: I, today: NaiveDate, months: u32) -> Vec<MonthBucket>
where
    I: IntoIterator<Item = NaiveDate>,
{
    let mut buckets: Vec<((i32, u32), usize)> = (0..months)
        .rev()
        .map(|back| (months_back(today.year(), today.month(), back), 0))
        .collect();

    for date in dates {
        let key = (date.year(), date.month());
        if let Some((_, count)) = buckets.iter_mut().find(|(k, _)| *k == key) {
            *count += 1;
        }
    }

    buckets
        .into_iter()
        .map(|((year, month), count)| MonthBucket {
            month: format!("{:04}-{:02}", year, month),
            count,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupMetric {
    Count,
    Spend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    pub key: String,
    pub count: usize,
    pub spent: f64,
}

/// Group projects by `key`, sort descending on `metric`, keep the top `n`.
/// Ties keep the order in which the group was first seen.
pub fn top_groups<F>(projects: &[ProjectRow], key: F, metric: GroupMetric, n: usize) -> Vec<GroupTotal>
where
    F: Fn(&ProjectRow) -> &str,
{
    let mut groups: Vec<GroupTotal> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for project in projects {
        let k = key(project);
        let slot = *index.entry(k).or_insert_with(|| {
            groups.push(GroupTotal {
                key: k.to_string(),
                count: 0,
                spent: 0.0,
            });
            groups.len() - 1
        });
        groups[slot].count += 1;
        groups[slot].spent += project.spent;
    }

    match metric {
        GroupMetric::Count => groups.sort_by(|a, b| b.count.cmp(&a.count)),
        GroupMetric::Spend => groups.sort_by(|a, b| b.spent.total_cmp(&a.spent)),
    }
    groups.truncate(n);
    groups
}

pub fn top_sectors(projects: &[ProjectRow], metric: GroupMetric, n: usize) -> Vec<GroupTotal> {
    top_groups(projects, |p| p.sector.as_str(), metric, n)
}

pub fn top_provinces(projects: &[ProjectRow], metric: GroupMetric, n: usize) -> Vec<GroupTotal> {
    top_groups(projects, |p| p.province.as_str(), metric, n)
}

/// Arithmetic mean, 0 for an empty slice
pub fn average(values: &[u32]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().map(|v| *v as f64).sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProjectStatus, Severity};

    fn project(id: &str, province: &str, sector: &str, budget: f64, spent: f64) -> ProjectRow {
        ProjectRow {
            id: id.to_string(),
            title: id.to_string(),
            description: None,
            sector: sector.to_string(),
            status: ProjectStatus::InProgress,
            budget,
            spent,
            province: province.to_string(),
            city: None,
            latitude: None,
            longitude: None,
            start_date: None,
            end_date: None,
            actual_end_date: None,
            ministry: None,
            responsible_person: None,
            created_by: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn alert(project_id: &str, severity: Severity) -> AlertRow {
        AlertRow {
            id: format!("a-{}", project_id),
            project_id: project_id.to_string(),
            severity,
            message: "budget".to_string(),
            created_at: String::new(),
        }
    }

    fn planning_alert(project_id: &str, severity: Severity) -> PlanningAlertRow {
        PlanningAlertRow {
            id: format!("pa-{}", project_id),
            project_id: project_id.to_string(),
            phase_id: None,
            alert_type: crate::models::AlertType::Delay,
            severity,
            message: "late".to_string(),
            created_at: String::new(),
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_budget_variance() {
        let projects = vec![
            project("p1", "Kinshasa", "Santé", 1000.0, 1200.0),
            project("p2", "Kinshasa", "Santé", 1000.0, 600.0),
        ];
        let v = budget_variance(&projects);
        assert_eq!(v.variance, -200.0);
        assert_eq!(v.variance_percent, -10.0);
    }

    #[test]
    fn test_budget_variance_zero_budget() {
        let projects = vec![project("p1", "Kinshasa", "Santé", 0.0, 50.0)];
        let v = budget_variance(&projects);
        assert_eq!(v.variance, 50.0);
        assert_eq!(v.variance_percent, 0.0);
        assert_eq!(budget_variance(&[]).variance_percent, 0.0);
    }

    #[test]
    fn test_at_risk_counts_distinct_projects() {
        let alerts = vec![
            alert("p1", Severity::High),
            alert("p2", Severity::Low),
            alert("p1", Severity::Critical),
        ];
        let planning = vec![
            planning_alert("p1", Severity::High),
            planning_alert("p3", Severity::Critical),
            planning_alert("p4", Severity::Medium),
        ];
        assert_eq!(at_risk_project_count(&alerts, &planning), 2);
    }

    #[test]
    fn test_trend_window_crosses_year() {
        let today = date("2024-02-15");
        let dates = vec![
            date("2024-02-01"),
            date("2024-02-14"),
            date("2023-12-31"),
            date("2023-09-01"),
            date("2023-08-31"),
            date("2025-01-01"),
        ];
        let trend = monthly_alert_trend(dates, today, 6);

        let months: Vec<&str> = trend.iter().map(|b| b.month.as_str()).collect();
        assert_eq!(
            months,
            vec!["2023-09", "2023-10", "2023-11", "2023-12", "2024-01", "2024-02"]
        );
        let counts: Vec<usize> = trend.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 0, 0, 1, 0, 2]);
    }

    #[test]
    fn test_top_sectors_by_count_ties_first_seen() {
        let projects = vec![
            project("p1", "Kinshasa", "Éducation", 0.0, 10.0),
            project("p2", "Kinshasa", "Santé", 0.0, 10.0),
            project("p3", "Kinshasa", "Énergie", 0.0, 10.0),
            project("p4", "Kinshasa", "Santé", 0.0, 10.0),
            project("p5", "Kinshasa", "Agriculture", 0.0, 10.0),
        ];
        let keys: Vec<String> = top_sectors(&projects, GroupMetric::Count, 3)
            .into_iter()
            .map(|g| g.key)
            .collect();
        assert_eq!(keys, vec!["Santé", "Éducation", "Énergie"]);
    }

    #[test]
    fn test_top_provinces_by_spend() {
        let projects = vec![
            project("p1", "Kinshasa", "Santé", 0.0, 100.0),
            project("p2", "Kasaï", "Santé", 0.0, 400.0),
            project("p3", "Kinshasa", "Santé", 0.0, 200.0),
            project("p4", "Katanga", "Santé", 0.0, 50.0),
        ];
        let top = top_provinces(&projects, GroupMetric::Spend, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].key, "Kasaï");
        assert_eq!(top[1].key, "Kinshasa");
        assert_eq!(top[1].count, 2);
        assert_eq!(top[1].spent, 300.0);
    }

    #[test]
    fn test_average() {
        assert_eq!(average(&[]), 0.0);
        assert_eq!(average(&[60, 80]), 70.0);
    }
}
