//! Escalation rule definitions.
//!
//! Condition-to-actions mappings that automate the response to breached
//! and at-risk incidents.

use crate::core::types::{new_id, Severity};
use crate::sla::status::BreachType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What causes a rule to be evaluated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EscalationTrigger {
    /// A recorded SLA breach
    Breach,
    /// An incident above the at-risk threshold
    AtRisk,
    /// An incident a configured time past its deadline
    TimeThreshold,
}

impl std::fmt::Display for EscalationTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EscalationTrigger::Breach => write!(f, "breach"),
            EscalationTrigger::AtRisk => write!(f, "at-risk"),
            EscalationTrigger::TimeThreshold => write!(f, "time-threshold"),
        }
    }
}

/// The closed set of escalation action kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Notify a team over its channels
    NotifyTeam,
    /// Request a severity upgrade on the incident
    UpgradeSeverity,
    /// Assign a senior responder
    AssignSenior,
    /// Trigger a remediation workflow
    TriggerWorkflow,
    /// Page the on-call rotation
    PageOncall,
    /// Create a tracking ticket
    CreateTicket,
    /// POST to a webhook
    SendWebhook,
    /// Approve a pending-approval incident
    AutoApprove,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::NotifyTeam => write!(f, "notify_team"),
            ActionType::UpgradeSeverity => write!(f, "upgrade_severity"),
            ActionType::AssignSenior => write!(f, "assign_senior"),
            ActionType::TriggerWorkflow => write!(f, "trigger_workflow"),
            ActionType::PageOncall => write!(f, "page_oncall"),
            ActionType::CreateTicket => write!(f, "create_ticket"),
            ActionType::SendWebhook => write!(f, "send_webhook"),
            ActionType::AutoApprove => write!(f, "auto_approve"),
        }
    }
}

/// One action in a rule, with its execution priority.
///
/// Lower priority numbers execute first.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EscalationAction {
    /// Action kind
    pub action_type: ActionType,
    /// Execution order (ascending)
    pub priority: u32,
    /// Handler-specific parameters
    pub params: HashMap<String, serde_json::Value>,
}

impl EscalationAction {
    /// Create an action.
    pub fn new(action_type: ActionType, priority: u32) -> Self {
        Self {
            action_type,
            priority,
            params: HashMap::new(),
        }
    }

    /// Add a parameter.
    pub fn with_param(mut self, key: &str, value: serde_json::Value) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }

    /// Get a string parameter.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(|v| v.as_str())
    }
}

/// Conditions a rule requires, AND-combined.
///
/// Unset fields always match.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RuleConditions {
    /// Incident severities the rule applies to
    pub severities: Option<Vec<Severity>>,
    /// Breach types the rule applies to
    pub breach_types: Option<Vec<BreachType>>,
    /// Minimum percent-complete for at-risk triggering
    pub at_risk_threshold_pct: Option<f64>,
    /// Minimum time past the deadline (ms)
    pub time_over_threshold_ms: Option<i64>,
}

/// A configured escalation rule.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EscalationRule {
    /// Rule ID
    pub id: String,
    /// Rule name
    pub name: String,
    /// Description
    pub description: String,
    /// What fires this rule
    pub trigger: EscalationTrigger,
    /// Runtime on/off toggle
    pub enabled: bool,
    /// AND-combined applicability conditions
    pub conditions: RuleConditions,
    /// Ordered actions (ascending priority)
    pub actions: Vec<EscalationAction>,
    /// Minimum time between firings per incident (ms)
    pub cooldown_ms: Option<i64>,
    /// Maximum firings per incident
    pub max_executions: Option<u32>,
}

impl EscalationRule {
    /// Create a new enabled rule with no conditions or actions.
    pub fn new(name: &str, trigger: EscalationTrigger) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            description: String::new(),
            trigger,
            enabled: true,
            conditions: RuleConditions::default(),
            actions: Vec::new(),
            cooldown_ms: None,
            max_executions: None,
        }
    }

    /// Set description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Restrict to specific severities.
    pub fn with_severities(mut self, severities: Vec<Severity>) -> Self {
        self.conditions.severities = Some(severities);
        self
    }

    /// Restrict to specific breach types.
    pub fn with_breach_types(mut self, breach_types: Vec<BreachType>) -> Self {
        self.conditions.breach_types = Some(breach_types);
        self
    }

    /// Require a minimum percent-complete.
    pub fn with_at_risk_threshold(mut self, pct: f64) -> Self {
        self.conditions.at_risk_threshold_pct = Some(pct);
        self
    }

    /// Require a minimum time past the deadline.
    pub fn with_time_over_threshold(mut self, ms: i64) -> Self {
        self.conditions.time_over_threshold_ms = Some(ms);
        self
    }

    /// Add an action.
    pub fn with_action(mut self, action: EscalationAction) -> Self {
        self.actions.push(action);
        self
    }

    /// Set the per-incident cooldown.
    pub fn with_cooldown_ms(mut self, ms: i64) -> Self {
        self.cooldown_ms = Some(ms);
        self
    }

    /// Cap firings per incident.
    pub fn with_max_executions(mut self, max: u32) -> Self {
        self.max_executions = Some(max);
        self
    }

    /// Actions sorted by ascending priority.
    pub fn actions_by_priority(&self) -> Vec<&EscalationAction> {
        let mut ordered: Vec<&EscalationAction> = self.actions.iter().collect();
        ordered.sort_by_key(|a| a.priority);
        ordered
    }
}
