//! Escalation execution.
//!
//! Runs a matched rule's actions in priority order against injected
//! side-effect handlers, recording per-action outcomes.

use crate::core::error::{Error, Result};
use crate::core::types::{Incident, Severity};
use crate::escalation::execution::{ActionOutcome, EscalationExecution};
use crate::escalation::rule::{ActionType, EscalationAction, EscalationRule, EscalationTrigger};
use crate::sla::detector::SlaBreach;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Side-effect handler invoked by the executor.
///
/// One method per action type. Implementations own the actual transports
/// (mail, chat, paging, ticketing); the executor never retries and treats
/// every call as fire-and-report. Handlers must not block indefinitely —
/// the executor bounds each call with a timeout regardless.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Notify a team over the given channels (e.g. "email", "chat").
    async fn notify_team(
        &self,
        team: &str,
        message: &str,
        channels: &[String],
    ) -> Result<Option<String>>;

    /// Request a severity upgrade on the incident.
    async fn upgrade_severity(
        &self,
        incident_id: &str,
        new_severity: Severity,
    ) -> Result<Option<String>>;

    /// Assign a senior responder from `team`.
    async fn assign_senior(&self, incident_id: &str, team: &str) -> Result<Option<String>>;

    /// Trigger a remediation workflow.
    async fn trigger_workflow(&self, workflow_id: &str) -> Result<Option<String>>;

    /// Page the on-call rotation for `team`.
    async fn page_oncall(&self, team: &str, urgency: &str) -> Result<Option<String>>;

    /// Create a tracking ticket in an external system.
    async fn create_ticket(&self, system: &str, summary: &str) -> Result<Option<String>>;

    /// POST a payload to a webhook.
    async fn send_webhook(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<Option<String>>;

    /// Approve a pending-approval incident.
    async fn auto_approve(&self, incident_id: &str) -> Result<Option<String>>;
}

/// Executor configuration.
#[derive(Clone, Debug)]
pub struct ExecutorConfig {
    /// Upper bound on each action handler call
    pub action_timeout: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            action_timeout: Duration::from_secs(10),
        }
    }
}

/// Runs escalation rules against an [`ActionHandler`].
///
/// Actions execute strictly in ascending priority order. Each action is
/// independently caught: a failure or timeout marks that action's outcome
/// and execution continues with the next action. The execution completes
/// once the loop finishes, whether or not any action succeeded.
pub struct EscalationExecutor {
    handler: Arc<dyn ActionHandler>,
    config: ExecutorConfig,
}

impl EscalationExecutor {
    /// Create an executor with the default config.
    pub fn new(handler: Arc<dyn ActionHandler>) -> Self {
        Self {
            handler,
            config: ExecutorConfig::default(),
        }
    }

    /// Set the executor config.
    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Fire `rule` against `incident`, returning the execution record.
    pub async fn execute(
        &self,
        rule: &EscalationRule,
        incident: &Incident,
        breach: Option<&SlaBreach>,
        trigger: EscalationTrigger,
    ) -> EscalationExecution {
        let execution = EscalationExecution::new(&rule.id, &incident.id, trigger);
        self.execute_prepared(execution, rule, incident, breach).await
    }

    /// Run the action loop for an already-created execution record.
    ///
    /// Lets callers register the record (in its executing state) before
    /// any side effect runs.
    pub async fn execute_prepared(
        &self,
        mut execution: EscalationExecution,
        rule: &EscalationRule,
        incident: &Incident,
        breach: Option<&SlaBreach>,
    ) -> EscalationExecution {
        let trigger = execution.trigger;

        for action in rule.actions_by_priority() {
            let outcome = match tokio::time::timeout(
                self.config.action_timeout,
                self.dispatch(action, incident, breach, trigger),
            )
            .await
            {
                Ok(Ok(result)) => ActionOutcome::success(action.action_type, result),
                Ok(Err(err)) => {
                    warn!(
                        rule_id = %rule.id,
                        incident_id = %incident.id,
                        action = %action.action_type,
                        error = %err,
                        "escalation action failed"
                    );
                    ActionOutcome::failure(action.action_type, &err.to_string())
                }
                Err(_) => {
                    let err = Error::ActionTimeout {
                        action: action.action_type.to_string(),
                    };
                    warn!(
                        rule_id = %rule.id,
                        incident_id = %incident.id,
                        action = %action.action_type,
                        "escalation action timed out"
                    );
                    ActionOutcome::failure(action.action_type, &err.to_string())
                }
            };
            execution.record_outcome(outcome);
        }

        execution.complete();
        execution
    }

    /// Route one action to its handler method, filling parameter defaults.
    async fn dispatch(
        &self,
        action: &EscalationAction,
        incident: &Incident,
        breach: Option<&SlaBreach>,
        trigger: EscalationTrigger,
    ) -> Result<Option<String>> {
        match action.action_type {
            ActionType::NotifyTeam => {
                let team = action.param_str("team").unwrap_or("incident-response");
                let default_message = format!(
                    "SLA escalation ({trigger}) for incident {}: {}",
                    incident.id, incident.title
                );
                let message = action.param_str("message").unwrap_or(&default_message);
                let channels = match action.params.get("channels").and_then(|v| v.as_array()) {
                    Some(values) => values
                        .iter()
                        .filter_map(|v| v.as_str().map(String::from))
                        .collect(),
                    None => vec!["email".to_string(), "chat".to_string()],
                };
                self.handler.notify_team(team, message, &channels).await
            }
            ActionType::UpgradeSeverity => {
                let new_severity = match action.param_str("severity") {
                    Some(s) => s
                        .parse::<Severity>()
                        .map_err(|e| Error::ActionFailed {
                            action: action.action_type.to_string(),
                            reason: e,
                        })?,
                    None => incident.severity.escalated(),
                };
                self.handler
                    .upgrade_severity(&incident.id, new_severity)
                    .await
            }
            ActionType::AssignSenior => {
                let team = action.param_str("team").unwrap_or("senior-engineers");
                self.handler.assign_senior(&incident.id, team).await
            }
            ActionType::TriggerWorkflow => {
                let workflow_id =
                    action
                        .param_str("workflow_id")
                        .ok_or_else(|| Error::ActionFailed {
                            action: action.action_type.to_string(),
                            reason: "missing workflow_id param".to_string(),
                        })?;
                self.handler.trigger_workflow(workflow_id).await
            }
            ActionType::PageOncall => {
                let team = action.param_str("team").unwrap_or("oncall");
                let urgency = action.param_str("urgency").unwrap_or("high");
                self.handler.page_oncall(team, urgency).await
            }
            ActionType::CreateTicket => {
                let system = action.param_str("system").unwrap_or("jira");
                let default_summary =
                    format!("SLA escalation for incident {}: {}", incident.id, incident.title);
                let summary = action.param_str("summary").unwrap_or(&default_summary);
                self.handler.create_ticket(system, summary).await
            }
            ActionType::SendWebhook => {
                let url = action.param_str("url").ok_or_else(|| Error::ActionFailed {
                    action: action.action_type.to_string(),
                    reason: "missing url param".to_string(),
                })?;
                let payload = serde_json::json!({
                    "incident_id": incident.id,
                    "incident_title": incident.title,
                    "severity": incident.severity,
                    "trigger": trigger,
                    "breach_id": breach.map(|b| b.id.clone()),
                    "breach_type": breach.map(|b| b.breach_type),
                });
                self.handler.send_webhook(url, &payload).await
            }
            ActionType::AutoApprove => self.handler.auto_approve(&incident.id).await,
        }
    }
}
