//! SLA performance metrics.
//!
//! Rolls up incident history into compliance and timing aggregates.

use crate::core::types::{Incident, IncidentStatus, Severity};
use crate::policy::PolicyCatalog;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Compliance and timing aggregates for a set of incidents.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Percentage of resolved incidents inside their resolution target
    pub compliance_pct: f64,
    /// Resolved incidents inside their resolution target
    pub compliant_incidents: usize,
    /// Resolved incidents considered
    pub total_incidents: usize,
    /// Resolved incidents past their resolution target
    pub breached_incidents: usize,
    /// Mean time to first response (ms, responded incidents only)
    pub average_response_ms: f64,
    /// Mean time to resolution (ms, resolved incidents only)
    pub average_resolution_ms: f64,
}

/// Overall and per-severity SLA metrics.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SlaMetrics {
    /// Aggregates across all severities
    pub overall: PerformanceMetrics,
    /// Aggregates per severity
    pub by_severity: HashMap<Severity, PerformanceMetrics>,
}

/// Computes SLA metrics from the full incident history.
///
/// Pure; recomputed on demand.
#[derive(Clone, Debug, Default)]
pub struct MetricsAggregator;

impl MetricsAggregator {
    /// Create a new aggregator.
    pub fn new() -> Self {
        Self
    }

    /// Aggregate compliance and timing metrics over `incidents`.
    ///
    /// Compliance counts only resolved incidents whose severity has a
    /// policy; an incident is compliant when its resolution time is within
    /// the policy's resolution target.
    pub fn aggregate(&self, incidents: &[Incident], catalog: &PolicyCatalog) -> SlaMetrics {
        let mut by_severity = HashMap::new();

        for severity in Severity::all() {
            let subset: Vec<&Incident> = incidents
                .iter()
                .filter(|i| i.severity == severity)
                .collect();
            by_severity.insert(severity, Self::compute(&subset, catalog));
        }

        let all: Vec<&Incident> = incidents.iter().collect();
        SlaMetrics {
            overall: Self::compute(&all, catalog),
            by_severity,
        }
    }

    fn compute(incidents: &[&Incident], catalog: &PolicyCatalog) -> PerformanceMetrics {
        let mut metrics = PerformanceMetrics::default();

        let mut resolution_sum: i64 = 0;
        let mut response_sum: i64 = 0;
        let mut response_count: usize = 0;

        for incident in incidents {
            if let Some(responded) = incident.first_response_at {
                response_sum += (responded - incident.created_at).num_milliseconds().max(0);
                response_count += 1;
            }

            if incident.status != IncidentStatus::Resolved {
                continue;
            }
            let Some(policy) = catalog.policy_for(incident.severity) else {
                continue;
            };

            let resolution_ms = (incident.updated_at - incident.created_at)
                .num_milliseconds()
                .max(0);
            metrics.total_incidents += 1;
            resolution_sum += resolution_ms;

            if resolution_ms <= policy.resolution_target_ms {
                metrics.compliant_incidents += 1;
            } else {
                metrics.breached_incidents += 1;
            }
        }

        if metrics.total_incidents > 0 {
            metrics.compliance_pct =
                metrics.compliant_incidents as f64 / metrics.total_incidents as f64 * 100.0;
            metrics.average_resolution_ms = resolution_sum as f64 / metrics.total_incidents as f64;
        }
        if response_count > 0 {
            metrics.average_response_ms = response_sum as f64 / response_count as f64;
        }

        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::now;
    use crate::policy::SlaPolicy;
    use chrono::Duration;

    fn catalog() -> PolicyCatalog {
        PolicyCatalog::new(vec![
            SlaPolicy::new(Severity::Critical, 900_000, 3_600_000),
            SlaPolicy::new(Severity::High, 1_800_000, 14_400_000),
        ])
    }

    fn resolved_incident(id: &str, severity: Severity, resolution_ms: i64) -> Incident {
        let created = now() - Duration::milliseconds(resolution_ms + 60_000);
        let mut incident = Incident::new(id, "Incident", severity)
            .with_created_at(created)
            .with_first_response_at(created + Duration::milliseconds(120_000))
            .with_status(IncidentStatus::Resolved);
        incident.updated_at = created + Duration::milliseconds(resolution_ms);
        incident
    }

    #[test]
    fn test_compliance_eight_of_ten() {
        let aggregator = MetricsAggregator::new();
        let mut incidents = Vec::new();
        for i in 0..8 {
            incidents.push(resolved_incident(
                &format!("in-{i}"),
                Severity::Critical,
                1_800_000,
            ));
        }
        for i in 8..10 {
            incidents.push(resolved_incident(
                &format!("in-{i}"),
                Severity::Critical,
                4_000_000,
            ));
        }

        let metrics = aggregator.aggregate(&incidents, &catalog());
        assert_eq!(metrics.overall.total_incidents, 10);
        assert_eq!(metrics.overall.compliant_incidents, 8);
        assert_eq!(metrics.overall.breached_incidents, 2);
        assert!((metrics.overall.compliance_pct - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_by_severity_split() {
        let aggregator = MetricsAggregator::new();
        let incidents = vec![
            resolved_incident("in-1", Severity::Critical, 1_800_000),
            resolved_incident("in-2", Severity::Critical, 4_000_000),
            resolved_incident("in-3", Severity::High, 7_200_000),
        ];

        let metrics = aggregator.aggregate(&incidents, &catalog());
        let critical = &metrics.by_severity[&Severity::Critical];
        assert_eq!(critical.total_incidents, 2);
        assert_eq!(critical.compliant_incidents, 1);
        assert!((critical.compliance_pct - 50.0).abs() < f64::EPSILON);

        let high = &metrics.by_severity[&Severity::High];
        assert_eq!(high.total_incidents, 1);
        assert!((high.compliance_pct - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unresolved_incidents_excluded_from_compliance() {
        let aggregator = MetricsAggregator::new();
        let incidents = vec![
            resolved_incident("in-1", Severity::Critical, 1_800_000),
            Incident::new("in-2", "Open incident", Severity::Critical),
        ];

        let metrics = aggregator.aggregate(&incidents, &catalog());
        assert_eq!(metrics.overall.total_incidents, 1);
    }

    #[test]
    fn test_average_times() {
        let aggregator = MetricsAggregator::new();
        let incidents = vec![
            resolved_incident("in-1", Severity::Critical, 1_000_000),
            resolved_incident("in-2", Severity::Critical, 3_000_000),
        ];

        let metrics = aggregator.aggregate(&incidents, &catalog());
        assert!((metrics.overall.average_resolution_ms - 2_000_000.0).abs() < 1.0);
        assert!((metrics.overall.average_response_ms - 120_000.0).abs() < 1.0);
    }

    #[test]
    fn test_empty_history() {
        let aggregator = MetricsAggregator::new();
        let metrics = aggregator.aggregate(&[], &catalog());
        assert_eq!(metrics.overall.total_incidents, 0);
        assert_eq!(metrics.overall.compliance_pct, 0.0);
    }
}
