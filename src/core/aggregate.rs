use crate::domain::frame::compare_desc_missing_last;
use crate::domain::model::ProjectPoint;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

pub const TOP_RISK_ROWS: usize = 30;
pub const EXPLORER_ROWS: usize = 2000;
pub const INCONSISTENCY_SAMPLE_ROWS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub distinct_projects: usize,
    pub total_budget: f64,
    pub total_executed: f64,
    pub execution_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusGroup {
    /// `None` groups the projects with no audit status.
    pub status: Option<String>,
    pub projects: usize,
    pub budget: f64,
    pub executed: f64,
    pub unexecuted: f64,
    pub inconsistencies: usize,
    pub execution_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InconsistencySummary {
    pub flagged_projects: usize,
    pub flagged_budget: f64,
}

/// `numerator / denominator`, no value when the denominator is zero.
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

fn sum<'a>(
    projects: impl IntoIterator<Item = &'a ProjectPoint>,
    field: fn(&ProjectPoint) -> Option<f64>,
) -> f64 {
    projects.into_iter().filter_map(field).sum()
}

pub fn kpis(projects: &[ProjectPoint]) -> Kpis {
    let distinct: HashSet<i64> = projects.iter().map(|p| p.snip_id).collect();
    let total_budget = sum(projects, |p| p.current_budget);
    let total_executed = sum(projects, |p| p.executed_total);

    Kpis {
        distinct_projects: distinct.len(),
        total_budget,
        total_executed,
        execution_ratio: ratio(total_executed, total_budget),
    }
}

/// Counts and money per audit status. Named statuses come in ascending
/// order; the group without status, if any, is last.
pub fn status_breakdown(projects: &[ProjectPoint]) -> Vec<StatusGroup> {
    let mut named: BTreeMap<&str, Vec<&ProjectPoint>> = BTreeMap::new();
    let mut unnamed: Vec<&ProjectPoint> = Vec::new();
    for project in projects {
        match project.audit_status.as_deref() {
            Some(status) => named.entry(status).or_default().push(project),
            None => unnamed.push(project),
        }
    }

    let mut groups: Vec<StatusGroup> = named
        .into_iter()
        .map(|(status, members)| status_group(Some(status.to_string()), &members))
        .collect();
    if !unnamed.is_empty() {
        groups.push(status_group(None, &unnamed));
    }
    groups
}

fn status_group(status: Option<String>, members: &[&ProjectPoint]) -> StatusGroup {
    let distinct: HashSet<i64> = members.iter().map(|p| p.snip_id).collect();
    let budget = sum(members.iter().copied(), |p| p.current_budget);
    let executed = sum(members.iter().copied(), |p| p.executed_total);

    StatusGroup {
        status,
        projects: distinct.len(),
        budget,
        executed,
        unexecuted: sum(members.iter().copied(), |p| p.unexecuted_budget),
        inconsistencies: members.iter().filter(|p| p.is_inconsistent()).count(),
        execution_ratio: ratio(executed, budget),
    }
}

/// Indices of `projects` by fiscal risk, then unexecuted budget, both
/// descending with missing values last.
pub fn risk_order(projects: &[ProjectPoint]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..projects.len()).collect();
    order.sort_by(|&a, &b| {
        let (a, b) = (&projects[a], &projects[b]);
        compare_desc_missing_last(a.fiscal_risk, b.fiscal_risk).then_with(|| {
            compare_desc_missing_last(a.unexecuted_budget, b.unexecuted_budget)
        })
    });
    order
}

pub fn inconsistency_summary(projects: &[ProjectPoint]) -> InconsistencySummary {
    let flagged: Vec<&ProjectPoint> = projects.iter().filter(|p| p.is_inconsistent()).collect();
    InconsistencySummary {
        flagged_projects: flagged.len(),
        flagged_budget: sum(flagged.iter().copied(), |p| p.current_budget),
    }
}

/// Flagged projects with the largest current budget first.
pub fn inconsistency_sample(projects: &[ProjectPoint], limit: usize) -> Vec<&ProjectPoint> {
    let mut flagged: Vec<&ProjectPoint> = projects.iter().filter(|p| p.is_inconsistent()).collect();
    flagged.sort_by(|a, b| compare_desc_missing_last(a.current_budget, b.current_budget));
    flagged.truncate(limit);
    flagged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(
        snip: i64,
        status: Option<&str>,
        budget: Option<f64>,
        executed: Option<f64>,
    ) -> ProjectPoint {
        let mut p = ProjectPoint::new(snip);
        p.audit_status = status.map(str::to_string);
        p.current_budget = budget;
        p.executed_total = executed;
        p
    }

    #[test]
    fn test_kpis_skip_missing_values() {
        let projects = vec![
            project(1, Some("Finalizado"), Some(100.0), Some(50.0)),
            project(1, Some("Finalizado"), None, Some(10.0)),
            project(2, None, Some(300.0), None),
        ];
        let k = kpis(&projects);

        assert_eq!(k.distinct_projects, 2);
        assert_eq!(k.total_budget, 400.0);
        assert_eq!(k.total_executed, 60.0);
        assert_eq!(k.execution_ratio, Some(0.15));
    }

    #[test]
    fn test_kpis_zero_budget_has_no_ratio() {
        let k = kpis(&[project(1, None, None, Some(5.0))]);
        assert_eq!(k.execution_ratio, None);
        assert_eq!(kpis(&[]).distinct_projects, 0);
    }

    #[test]
    fn test_status_breakdown_orders_missing_last() {
        let mut flagged = project(3, Some("Finalizado"), Some(10.0), Some(10.0));
        flagged.inconsistency_flag = Some(true);
        let projects = vec![
            project(1, None, Some(5.0), None),
            project(2, Some("En ejecución"), Some(100.0), Some(25.0)),
            flagged,
            project(4, Some("Finalizado"), Some(30.0), Some(0.0)),
        ];

        let groups = status_breakdown(&projects);
        let names: Vec<Option<&str>> = groups.iter().map(|g| g.status.as_deref()).collect();
        assert_eq!(names, vec![Some("En ejecución"), Some("Finalizado"), None]);

        let finished = &groups[1];
        assert_eq!(finished.projects, 2);
        assert_eq!(finished.budget, 40.0);
        assert_eq!(finished.inconsistencies, 1);
        assert_eq!(finished.execution_ratio, Some(0.25));
        assert_eq!(groups[2].execution_ratio, Some(0.0));
    }

    #[test]
    fn test_risk_order_breaks_ties_on_unexecuted() {
        let mut a = ProjectPoint::new(1);
        a.fiscal_risk = Some(0.5);
        a.unexecuted_budget = Some(10.0);
        let mut b = ProjectPoint::new(2);
        b.fiscal_risk = Some(0.9);
        let mut c = ProjectPoint::new(3);
        c.fiscal_risk = Some(0.5);
        c.unexecuted_budget = Some(99.0);
        let d = ProjectPoint::new(4);
        let projects = vec![a, b, c, d];

        let order: Vec<i64> = risk_order(&projects)
            .into_iter()
            .map(|idx| projects[idx].snip_id)
            .collect();
        assert_eq!(order, vec![2, 3, 1, 4]);
    }

    #[test]
    fn test_inconsistency_summary_and_sample() {
        let mut a = project(1, None, Some(10.0), None);
        a.inconsistency_flag = Some(true);
        let mut b = project(2, None, Some(500.0), None);
        b.inconsistency_flag = Some(true);
        let mut c = project(3, None, Some(900.0), None);
        c.inconsistency_flag = Some(false);
        let d = project(4, None, Some(1000.0), None);
        let projects = vec![a, b, c, d];

        let summary = inconsistency_summary(&projects);
        assert_eq!(summary.flagged_projects, 2);
        assert_eq!(summary.flagged_budget, 510.0);

        let sample = inconsistency_sample(&projects, 1);
        assert_eq!(sample.len(), 1);
        assert_eq!(sample[0].snip_id, 2);
    }
}
