//! Breach detection.
//!
//! Diffs live SLA status against already-recorded breaches and emits
//! each new breach exactly once.

use crate::core::types::{new_id, now, Incident, Severity, Timestamp};
use crate::policy::PolicyCatalog;
use crate::sla::status::{BreachType, StatusCalculator};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A recorded SLA breach.
///
/// Created once per (incident, breach type); mutated only by
/// acknowledgment and execution back-links, never deleted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SlaBreach {
    /// Breach ID
    pub id: String,
    /// Incident ID
    pub incident_id: String,
    /// Incident title at detection time
    pub incident_title: String,
    /// Incident severity at detection time
    pub severity: Severity,
    /// Which deadline(s) were exceeded
    pub breach_type: BreachType,
    /// When the breach was detected
    pub breached_at: Timestamp,
    /// How far past the deadline at detection (ms)
    pub time_over_breach_ms: i64,
    /// Whether a human has acknowledged the breach
    pub acknowledged: bool,
    /// Acknowledgment time
    pub acknowledged_at: Option<Timestamp>,
    /// Who acknowledged
    pub acknowledged_by: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
    /// IDs of escalation executions fired for this breach
    pub escalation_executions: Vec<String>,
}

impl SlaBreach {
    /// Create a breach record for an incident.
    pub fn new(incident: &Incident, breach_type: BreachType, time_over_breach_ms: i64) -> Self {
        Self {
            id: new_id(),
            incident_id: incident.id.clone(),
            incident_title: incident.title.clone(),
            severity: incident.severity,
            breach_type,
            breached_at: now(),
            time_over_breach_ms,
            acknowledged: false,
            acknowledged_at: None,
            acknowledged_by: None,
            notes: None,
            escalation_executions: Vec::new(),
        }
    }

    /// Acknowledge the breach.
    pub fn acknowledge(&mut self, by: &str, notes: Option<&str>) {
        self.acknowledged = true;
        self.acknowledged_at = Some(now());
        self.acknowledged_by = Some(by.to_string());
        if let Some(n) = notes {
            self.notes = Some(n.to_string());
        }
    }

    /// Link an escalation execution to this breach.
    pub fn link_execution(&mut self, execution_id: &str) {
        self.escalation_executions.push(execution_id.to_string());
    }
}

/// Detects new breaches across the active incident set.
///
/// Detection is a set difference against already-recorded breaches:
/// running it twice with no incident-state change yields no new records.
#[derive(Clone, Debug, Default)]
pub struct BreachDetector {
    calculator: StatusCalculator,
}

impl BreachDetector {
    /// Create a detector with the default status calculator.
    pub fn new() -> Self {
        Self {
            calculator: StatusCalculator::new(),
        }
    }

    /// Create a detector using a specific calculator.
    pub fn with_calculator(calculator: StatusCalculator) -> Self {
        Self { calculator }
    }

    /// Scan active incidents and return breaches not yet recorded.
    ///
    /// `existing` is the full list of already-recorded breaches. Incidents
    /// whose severity has no policy are skipped.
    pub fn detect(
        &self,
        incidents: &[Incident],
        catalog: &PolicyCatalog,
        existing: &[SlaBreach],
        at: Timestamp,
    ) -> Vec<SlaBreach> {
        let mut new_breaches = Vec::new();

        for incident in incidents.iter().filter(|i| i.is_active()) {
            let Some(policy) = catalog.policy_for(incident.severity) else {
                continue;
            };

            let status = self.calculator.evaluate(incident, policy, at);
            if !status.is_breached() {
                continue;
            }

            if Self::already_recorded(existing, &incident.id, status.breach_type)
                || Self::already_recorded(&new_breaches, &incident.id, status.breach_type)
            {
                debug!(
                    incident_id = %incident.id,
                    breach_type = %status.breach_type,
                    "breach already recorded, suppressing"
                );
                continue;
            }

            new_breaches.push(SlaBreach::new(
                incident,
                status.breach_type,
                status.time_over_breach_ms,
            ));
        }

        new_breaches
    }

    fn already_recorded(breaches: &[SlaBreach], incident_id: &str, breach_type: BreachType) -> bool {
        breaches
            .iter()
            .any(|b| b.incident_id == incident_id && b.breach_type == breach_type)
    }
}
