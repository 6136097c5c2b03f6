//! SLA policy definitions and the per-severity catalog.

use crate::core::types::Severity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// SLA targets for one severity level.
///
/// Immutable once loaded into a catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlaPolicy {
    /// Severity this policy applies to
    pub severity: Severity,
    /// Maximum time to first response (ms)
    pub response_target_ms: i64,
    /// Maximum time to resolution (ms)
    pub resolution_target_ms: i64,
    /// Target compliance percentage
    pub compliance_target_pct: f64,
}

impl SlaPolicy {
    /// Create a new policy.
    pub fn new(severity: Severity, response_target_ms: i64, resolution_target_ms: i64) -> Self {
        Self {
            severity,
            response_target_ms,
            resolution_target_ms,
            compliance_target_pct: 95.0,
        }
    }

    /// Set compliance target.
    pub fn with_compliance_target(mut self, pct: f64) -> Self {
        self.compliance_target_pct = pct;
        self
    }
}

/// Catalog mapping each severity to its SLA policy.
///
/// One policy per severity; loading a duplicate severity replaces the
/// earlier entry (last wins).
#[derive(Clone, Debug, Default)]
pub struct PolicyCatalog {
    policies: HashMap<Severity, SlaPolicy>,
}

impl PolicyCatalog {
    /// Create a catalog from a list of policies.
    pub fn new(policies: Vec<SlaPolicy>) -> Self {
        let mut catalog = Self {
            policies: HashMap::new(),
        };
        for policy in policies {
            catalog.upsert(policy);
        }
        catalog
    }

    /// Create a catalog with standard incident-management defaults.
    pub fn standard() -> Self {
        Self::new(vec![
            SlaPolicy::new(Severity::Critical, 15 * 60 * 1000, 60 * 60 * 1000)
                .with_compliance_target(99.0),
            SlaPolicy::new(Severity::High, 30 * 60 * 1000, 4 * 60 * 60 * 1000)
                .with_compliance_target(95.0),
            SlaPolicy::new(Severity::Medium, 60 * 60 * 1000, 8 * 60 * 60 * 1000)
                .with_compliance_target(90.0),
            SlaPolicy::new(Severity::Low, 4 * 60 * 60 * 1000, 24 * 60 * 60 * 1000)
                .with_compliance_target(85.0),
        ])
    }

    /// Insert or replace the policy for a severity.
    pub fn upsert(&mut self, policy: SlaPolicy) {
        self.policies.insert(policy.severity, policy);
    }

    /// Look up the policy for a severity.
    pub fn policy_for(&self, severity: Severity) -> Option<&SlaPolicy> {
        self.policies.get(&severity)
    }

    /// Number of configured policies.
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}
