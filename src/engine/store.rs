//! In-memory breach and execution stores.
//!
//! Indexed by incident so per-incident lookups (duplicate suppression,
//! cooldown, execution caps) stay cheap.

use crate::core::error::{Error, Result};
use crate::escalation::execution::{EscalationExecution, ExecutionStatus};
use crate::sla::detector::SlaBreach;
use crate::sla::status::BreachType;
use std::collections::HashMap;

/// Breach records indexed by incident.
#[derive(Debug, Default)]
pub struct BreachStore {
    by_incident: HashMap<String, Vec<SlaBreach>>,
}

impl BreachStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a breach record.
    pub fn insert(&mut self, breach: SlaBreach) {
        self.by_incident
            .entry(breach.incident_id.clone())
            .or_default()
            .push(breach);
    }

    /// Whether a breach is recorded for this (incident, breach type) pair.
    pub fn has(&self, incident_id: &str, breach_type: BreachType) -> bool {
        self.by_incident
            .get(incident_id)
            .is_some_and(|breaches| breaches.iter().any(|b| b.breach_type == breach_type))
    }

    /// Find the recorded breach for an (incident, breach type) pair.
    pub fn find(&self, incident_id: &str, breach_type: BreachType) -> Option<&SlaBreach> {
        self.by_incident
            .get(incident_id)?
            .iter()
            .find(|b| b.breach_type == breach_type)
    }

    /// Look up a breach by ID.
    pub fn get(&self, breach_id: &str) -> Option<&SlaBreach> {
        self.by_incident
            .values()
            .flatten()
            .find(|b| b.id == breach_id)
    }

    /// Acknowledge a breach.
    pub fn acknowledge(&mut self, breach_id: &str, by: &str, notes: Option<&str>) -> Result<()> {
        let breach = self
            .get_mut(breach_id)
            .ok_or_else(|| Error::BreachNotFound(breach_id.to_string()))?;
        breach.acknowledge(by, notes);
        Ok(())
    }

    /// Link an execution to a breach.
    pub fn link_execution(&mut self, breach_id: &str, execution_id: &str) -> Result<()> {
        let breach = self
            .get_mut(breach_id)
            .ok_or_else(|| Error::BreachNotFound(breach_id.to_string()))?;
        breach.link_execution(execution_id);
        Ok(())
    }

    /// Breaches recorded for an incident.
    pub fn for_incident(&self, incident_id: &str) -> Vec<SlaBreach> {
        self.by_incident
            .get(incident_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Snapshot of every recorded breach.
    pub fn snapshot(&self) -> Vec<SlaBreach> {
        self.by_incident.values().flatten().cloned().collect()
    }

    /// Total recorded breaches.
    pub fn len(&self) -> usize {
        self.by_incident.values().map(Vec::len).sum()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_mut(&mut self, breach_id: &str) -> Option<&mut SlaBreach> {
        self.by_incident
            .values_mut()
            .flatten()
            .find(|b| b.id == breach_id)
    }
}

/// Execution records indexed by incident.
#[derive(Debug, Default)]
pub struct ExecutionStore {
    by_incident: HashMap<String, Vec<EscalationExecution>>,
}

impl ExecutionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an execution record.
    pub fn insert(&mut self, execution: EscalationExecution) {
        self.by_incident
            .entry(execution.incident_id.clone())
            .or_default()
            .push(execution);
    }

    /// Replace a stored record with its finished state.
    pub fn replace(&mut self, execution: EscalationExecution) -> Result<()> {
        let stored = self
            .by_incident
            .get_mut(&execution.incident_id)
            .and_then(|list| list.iter_mut().find(|e| e.id == execution.id))
            .ok_or_else(|| Error::ExecutionNotFound(execution.id.clone()))?;
        *stored = execution;
        Ok(())
    }

    /// Mark every still-executing record for an incident as failed.
    ///
    /// Used when the incident's evaluation task dies mid-flight.
    pub fn fail_executing_for(&mut self, incident_id: &str) -> usize {
        let mut failed = 0;
        if let Some(list) = self.by_incident.get_mut(incident_id) {
            for execution in list
                .iter_mut()
                .filter(|e| e.status == ExecutionStatus::Executing)
            {
                execution.fail();
                failed += 1;
            }
        }
        failed
    }

    /// Executions recorded for an incident, in insertion order.
    pub fn for_incident(&self, incident_id: &str) -> Vec<EscalationExecution> {
        self.by_incident
            .get(incident_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of executions of a rule against an incident.
    pub fn count_for(&self, rule_id: &str, incident_id: &str) -> usize {
        self.by_incident
            .get(incident_id)
            .map(|list| list.iter().filter(|e| e.rule_id == rule_id).count())
            .unwrap_or(0)
    }

    /// Look up an execution by ID.
    pub fn get(&self, execution_id: &str) -> Option<&EscalationExecution> {
        self.by_incident
            .values()
            .flatten()
            .find(|e| e.id == execution_id)
    }

    /// Snapshot of every recorded execution.
    pub fn snapshot(&self) -> Vec<EscalationExecution> {
        self.by_incident.values().flatten().cloned().collect()
    }

    /// Total recorded executions.
    pub fn len(&self) -> usize {
        self.by_incident.values().map(Vec::len).sum()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Incident, Severity};
    use crate::escalation::rule::EscalationTrigger;

    fn breach(incident_id: &str, breach_type: BreachType) -> SlaBreach {
        let incident = Incident::new(incident_id, "Outage", Severity::Critical);
        SlaBreach::new(&incident, breach_type, 5_000)
    }

    #[test]
    fn test_breach_store_indexing() {
        let mut store = BreachStore::new();
        store.insert(breach("inc-1", BreachType::Response));
        store.insert(breach("inc-1", BreachType::Both));
        store.insert(breach("inc-2", BreachType::Resolution));

        assert_eq!(store.len(), 3);
        assert!(store.has("inc-1", BreachType::Response));
        assert!(store.has("inc-1", BreachType::Both));
        assert!(!store.has("inc-1", BreachType::Resolution));
        assert!(store.has("inc-2", BreachType::Resolution));
    }

    #[test]
    fn test_breach_store_acknowledge() {
        let mut store = BreachStore::new();
        let b = breach("inc-1", BreachType::Resolution);
        let id = b.id.clone();
        store.insert(b);

        store.acknowledge(&id, "alice", None).unwrap();
        assert!(store.get(&id).unwrap().acknowledged);

        let err = store.acknowledge("missing", "alice", None);
        assert!(err.is_err());
    }

    #[test]
    fn test_breach_store_link_execution() {
        let mut store = BreachStore::new();
        let b = breach("inc-1", BreachType::Resolution);
        let id = b.id.clone();
        store.insert(b);

        store.link_execution(&id, "exec-1").unwrap();
        assert_eq!(
            store.get(&id).unwrap().escalation_executions,
            vec!["exec-1"]
        );
    }

    #[test]
    fn test_execution_store_counts() {
        let mut store = ExecutionStore::new();
        store.insert(EscalationExecution::new("rule-1", "inc-1", EscalationTrigger::Breach));
        store.insert(EscalationExecution::new("rule-1", "inc-1", EscalationTrigger::Breach));
        store.insert(EscalationExecution::new("rule-2", "inc-1", EscalationTrigger::Breach));
        store.insert(EscalationExecution::new("rule-1", "inc-2", EscalationTrigger::Breach));

        assert_eq!(store.count_for("rule-1", "inc-1"), 2);
        assert_eq!(store.count_for("rule-2", "inc-1"), 1);
        assert_eq!(store.count_for("rule-1", "inc-2"), 1);
        assert_eq!(store.for_incident("inc-1").len(), 3);
    }

    #[test]
    fn test_execution_store_replace() {
        let mut store = ExecutionStore::new();
        let mut execution =
            EscalationExecution::new("rule-1", "inc-1", EscalationTrigger::Breach);
        store.insert(execution.clone());

        execution.complete();
        store.replace(execution.clone()).unwrap();
        assert_eq!(
            store.get(&execution.id).unwrap().status,
            ExecutionStatus::Completed
        );
    }

    #[test]
    fn test_fail_executing_for() {
        let mut store = ExecutionStore::new();
        let executing = EscalationExecution::new("rule-1", "inc-1", EscalationTrigger::Breach);
        let mut done = EscalationExecution::new("rule-2", "inc-1", EscalationTrigger::Breach);
        done.complete();
        let done_id = done.id.clone();
        let executing_id = executing.id.clone();
        store.insert(executing);
        store.insert(done);

        assert_eq!(store.fail_executing_for("inc-1"), 1);
        assert_eq!(
            store.get(&executing_id).unwrap().status,
            ExecutionStatus::Failed
        );
        assert_eq!(store.get(&done_id).unwrap().status, ExecutionStatus::Completed);
    }
}
