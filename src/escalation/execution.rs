//! Escalation execution records.
//!
//! One record per firing of one rule against one incident, with
//! action-by-action outcomes.

use crate::core::types::{new_id, now, Timestamp};
use crate::escalation::rule::{ActionType, EscalationTrigger};
use serde::{Deserialize, Serialize};

/// Execution lifecycle status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    /// Actions still running
    Executing,
    /// Action loop ran to completion
    Completed,
    /// The execution itself died before finishing
    Failed,
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionStatus::Executing => write!(f, "executing"),
            ExecutionStatus::Completed => write!(f, "completed"),
            ExecutionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome of one action within an execution.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// Action kind
    pub action_type: ActionType,
    /// When the action was attempted
    pub executed_at: Timestamp,
    /// Whether the handler reported success
    pub success: bool,
    /// Handler result on success
    pub result: Option<String>,
    /// Error message on failure
    pub error: Option<String>,
}

impl ActionOutcome {
    /// Record a successful action.
    pub fn success(action_type: ActionType, result: Option<String>) -> Self {
        Self {
            action_type,
            executed_at: now(),
            success: true,
            result,
            error: None,
        }
    }

    /// Record a failed action.
    pub fn failure(action_type: ActionType, error: &str) -> Self {
        Self {
            action_type,
            executed_at: now(),
            success: false,
            result: None,
            error: Some(error.to_string()),
        }
    }
}

/// One firing of one rule against one incident.
///
/// Append-only; terminal once completed or failed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EscalationExecution {
    /// Execution ID
    pub id: String,
    /// Rule that fired
    pub rule_id: String,
    /// Incident escalated
    pub incident_id: String,
    /// What fired the rule
    pub trigger: EscalationTrigger,
    /// When the rule fired
    pub triggered_at: Timestamp,
    /// When the action loop finished
    pub completed_at: Option<Timestamp>,
    /// Lifecycle status
    pub status: ExecutionStatus,
    /// Per-action outcomes, in execution order
    pub actions_executed: Vec<ActionOutcome>,
}

impl EscalationExecution {
    /// Create an execution in the executing state.
    pub fn new(rule_id: &str, incident_id: &str, trigger: EscalationTrigger) -> Self {
        Self {
            id: new_id(),
            rule_id: rule_id.to_string(),
            incident_id: incident_id.to_string(),
            trigger,
            triggered_at: now(),
            completed_at: None,
            status: ExecutionStatus::Executing,
            actions_executed: Vec::new(),
        }
    }

    /// Append an action outcome.
    pub fn record_outcome(&mut self, outcome: ActionOutcome) {
        self.actions_executed.push(outcome);
    }

    /// Mark the action loop as finished.
    ///
    /// Completed reflects control flow, not action success: an execution
    /// whose every action failed still completes.
    pub fn complete(&mut self) {
        self.status = ExecutionStatus::Completed;
        self.completed_at = Some(now());
    }

    /// Mark the execution itself as dead.
    pub fn fail(&mut self) {
        self.status = ExecutionStatus::Failed;
        self.completed_at = Some(now());
    }

    /// Number of actions that reported success.
    pub fn successful_actions(&self) -> usize {
        self.actions_executed.iter().filter(|a| a.success).count()
    }

    /// Human-readable "n/m actions completed" summary.
    pub fn success_summary(&self) -> String {
        format!(
            "{}/{} actions completed",
            self.successful_actions(),
            self.actions_executed.len()
        )
    }
}
