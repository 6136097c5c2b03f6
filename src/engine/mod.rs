//! SLA Engine Module
//!
//! Drives the evaluation pipeline on a recurring tick plus per-incident
//! change events: policy resolution, status computation, breach
//! detection, rule matching, and escalation execution.

pub mod config;
pub mod store;

pub use config::EngineConfig;
pub use store::{BreachStore, ExecutionStore};

use crate::core::error::{Error, Result};
use crate::core::types::{now, Incident, Timestamp};
use crate::escalation::execution::EscalationExecution;
use crate::escalation::executor::{ActionHandler, EscalationExecutor, ExecutorConfig};
use crate::escalation::matcher::RuleMatcher;
use crate::escalation::rule::{EscalationRule, EscalationTrigger};
use crate::policy::PolicyCatalog;
use crate::sla::detector::{BreachDetector, SlaBreach};
use crate::sla::metrics::{MetricsAggregator, SlaMetrics};
use crate::sla::status::{SlaState, SlaStatus, StatusCalculator};
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{debug, error, info, warn};

/// Source of incident records (the out-of-scope incident store).
#[async_trait]
pub trait IncidentProvider: Send + Sync {
    /// Incidents still tracked against their SLAs.
    async fn active_incidents(&self) -> Result<Vec<Incident>>;

    /// Full incident history, for metrics rollups.
    async fn all_incidents(&self) -> Result<Vec<Incident>>;
}

/// What one evaluation tick produced.
#[derive(Clone, Debug)]
pub struct TickReport {
    /// When the tick started
    pub started_at: Timestamp,
    /// Incidents evaluated
    pub evaluated: usize,
    /// Incidents skipped (missing policy or evaluation fault)
    pub skipped: usize,
    /// Breaches detected this tick
    pub new_breaches: Vec<SlaBreach>,
    /// Executions fired this tick
    pub executions: Vec<EscalationExecution>,
}

impl TickReport {
    fn new(started_at: Timestamp) -> Self {
        Self {
            started_at,
            evaluated: 0,
            skipped: 0,
            new_breaches: Vec::new(),
            executions: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct IncidentOutcome {
    new_breaches: Vec<SlaBreach>,
    executions: Vec<EscalationExecution>,
}

/// SLA tracking and escalation engine.
///
/// Breach and execution state lives in indexed in-memory stores behind
/// read-write locks. Evaluation of distinct incidents runs concurrently;
/// evaluation of one incident is serialized through a per-incident lock
/// so concurrent ticks cannot race to create duplicate breach or
/// execution records.
pub struct SlaEngine {
    config: EngineConfig,
    catalog: PolicyCatalog,
    calculator: StatusCalculator,
    detector: BreachDetector,
    matcher: RuleMatcher,
    executor: EscalationExecutor,
    rules: RwLock<Vec<EscalationRule>>,
    breaches: RwLock<BreachStore>,
    executions: RwLock<ExecutionStore>,
    incident_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    last_report: RwLock<Option<TickReport>>,
}

impl SlaEngine {
    /// Create an engine.
    pub fn new(
        catalog: PolicyCatalog,
        rules: Vec<EscalationRule>,
        handler: Arc<dyn ActionHandler>,
        config: EngineConfig,
    ) -> Self {
        let calculator =
            StatusCalculator::new().with_at_risk_threshold(config.at_risk_threshold_pct);
        let executor = EscalationExecutor::new(handler).with_config(ExecutorConfig {
            action_timeout: config.action_timeout,
        });
        Self {
            detector: BreachDetector::with_calculator(calculator.clone()),
            calculator,
            matcher: RuleMatcher::new(),
            executor,
            config,
            catalog,
            rules: RwLock::new(rules),
            breaches: RwLock::new(BreachStore::new()),
            executions: RwLock::new(ExecutionStore::new()),
            incident_locks: Mutex::new(HashMap::new()),
            last_report: RwLock::new(None),
        }
    }

    /// Evaluate every active incident once.
    ///
    /// Each incident runs in its own task: a panic or hang in one cannot
    /// block breach detection for the others.
    pub async fn tick(self: Arc<Self>, incidents: &[Incident]) -> TickReport {
        let mut report = TickReport::new(now());

        let (ids, handles): (Vec<_>, Vec<_>) = incidents
            .iter()
            .filter(|i| i.is_active())
            .cloned()
            .map(|incident| {
                let engine = Arc::clone(&self);
                let incident_id = incident.id.clone();
                let handle =
                    tokio::spawn(async move { engine.evaluate_incident(&incident).await });
                (incident_id, handle)
            })
            .unzip();

        for (incident_id, joined) in ids.into_iter().zip(join_all(handles).await) {
            match joined {
                Ok(Ok(outcome)) => {
                    report.evaluated += 1;
                    report.new_breaches.extend(outcome.new_breaches);
                    report.executions.extend(outcome.executions);
                }
                Ok(Err(Error::PolicyNotFound(severity))) => {
                    warn!(
                        incident_id = %incident_id,
                        %severity,
                        "no policy for incident severity, skipping"
                    );
                    report.skipped += 1;
                }
                Ok(Err(err)) => {
                    error!(incident_id = %incident_id, error = %err, "incident evaluation failed");
                    report.skipped += 1;
                }
                Err(join_err) => {
                    error!(
                        incident_id = %incident_id,
                        error = %join_err,
                        "incident evaluation task died"
                    );
                    self.executions
                        .write()
                        .await
                        .fail_executing_for(&incident_id);
                    report.skipped += 1;
                }
            }
        }

        debug!(
            evaluated = report.evaluated,
            skipped = report.skipped,
            new_breaches = report.new_breaches.len(),
            executions = report.executions.len(),
            "tick complete"
        );
        *self.last_report.write().await = Some(report.clone());
        report
    }

    /// Re-check a single incident outside the tick cadence.
    ///
    /// Intended for incident-mutation events. Errors abort tracking for
    /// this incident only.
    pub async fn notify_incident_changed(&self, incident: &Incident) -> Result<TickReport> {
        let mut report = TickReport::new(now());
        if !incident.is_active() {
            return Ok(report);
        }

        let outcome = self.evaluate_incident(incident).await?;
        report.evaluated = 1;
        report.new_breaches = outcome.new_breaches;
        report.executions = outcome.executions;
        Ok(report)
    }

    /// Run the evaluation loop until `shutdown` flips to true.
    pub async fn run(
        self: Arc<Self>,
        provider: Arc<dyn IncidentProvider>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut interval = tokio::time::interval(self.config.tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(
            interval_ms = self.config.tick_interval.as_millis() as u64,
            "SLA engine started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match provider.active_incidents().await {
                        Ok(incidents) => {
                            Arc::clone(&self).tick(&incidents).await;
                        }
                        Err(err) => {
                            error!(error = %err, "failed to fetch active incidents");
                        }
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("SLA engine stopping");
                        break;
                    }
                }
            }
        }
    }

    async fn evaluate_incident(&self, incident: &Incident) -> Result<IncidentOutcome> {
        let lock = self.incident_lock(&incident.id).await;
        let _guard = lock.lock().await;

        let policy = self
            .catalog
            .policy_for(incident.severity)
            .ok_or(Error::PolicyNotFound(incident.severity))?;
        let at = now();
        let status = self.calculator.evaluate(incident, policy, at);

        let mut outcome = IncidentOutcome::default();

        let active_breach = if status.is_breached() {
            let existing = self.breaches.read().await.for_incident(&incident.id);
            let detected =
                self.detector
                    .detect(std::slice::from_ref(incident), &self.catalog, &existing, at);

            let mut breaches = self.breaches.write().await;
            for breach in detected {
                info!(
                    incident_id = %incident.id,
                    breach_type = %breach.breach_type,
                    time_over_ms = breach.time_over_breach_ms,
                    "SLA breach detected"
                );
                breaches.insert(breach.clone());
                outcome.new_breaches.push(breach);
            }
            breaches.find(&incident.id, status.breach_type).cloned()
        } else {
            None
        };

        let triggers: &[EscalationTrigger] = match status.state {
            SlaState::Breached => &[EscalationTrigger::Breach, EscalationTrigger::TimeThreshold],
            SlaState::AtRisk => &[EscalationTrigger::AtRisk],
            SlaState::OnTrack => &[],
        };

        for &trigger in triggers {
            let matched: Vec<EscalationRule> = {
                let rules = self.rules.read().await;
                let history = self.executions.read().await.for_incident(&incident.id);
                self.matcher
                    .matching_rules(
                        incident,
                        &status,
                        active_breach.as_ref(),
                        trigger,
                        &rules,
                        &history,
                        at,
                    )
                    .into_iter()
                    .cloned()
                    .collect()
            };

            for rule in matched {
                let execution = EscalationExecution::new(&rule.id, &incident.id, trigger);
                self.executions.write().await.insert(execution.clone());
                if let Some(breach) = &active_breach {
                    self.breaches
                        .write()
                        .await
                        .link_execution(&breach.id, &execution.id)?;
                }

                let finished = self
                    .executor
                    .execute_prepared(execution, &rule, incident, active_breach.as_ref())
                    .await;
                info!(
                    rule = %rule.name,
                    incident_id = %incident.id,
                    trigger = %trigger,
                    summary = %finished.success_summary(),
                    "escalation rule fired"
                );
                self.executions.write().await.replace(finished.clone())?;
                outcome.executions.push(finished);
            }
        }

        Ok(outcome)
    }

    async fn incident_lock(&self, incident_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.incident_locks.lock().await;
        locks
            .entry(incident_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Compute one incident's live SLA status.
    pub fn status_of(&self, incident: &Incident) -> Result<SlaStatus> {
        let policy = self
            .catalog
            .policy_for(incident.severity)
            .ok_or(Error::PolicyNotFound(incident.severity))?;
        Ok(self.calculator.evaluate(incident, policy, now()))
    }

    /// Aggregate compliance metrics over an incident history.
    pub fn metrics(&self, incidents: &[Incident]) -> SlaMetrics {
        MetricsAggregator::new().aggregate(incidents, &self.catalog)
    }

    /// Snapshot of all recorded breaches.
    pub async fn breaches(&self) -> Vec<SlaBreach> {
        self.breaches.read().await.snapshot()
    }

    /// Snapshot of all recorded executions.
    pub async fn executions(&self) -> Vec<EscalationExecution> {
        self.executions.read().await.snapshot()
    }

    /// The most recent tick report, if any tick has run.
    pub async fn last_report(&self) -> Option<TickReport> {
        self.last_report.read().await.clone()
    }

    /// Acknowledge a recorded breach.
    pub async fn acknowledge_breach(
        &self,
        breach_id: &str,
        by: &str,
        notes: Option<&str>,
    ) -> Result<()> {
        self.breaches.write().await.acknowledge(breach_id, by, notes)
    }

    /// Toggle a rule on or off.
    pub async fn set_rule_enabled(&self, rule_id: &str, enabled: bool) -> Result<()> {
        let mut rules = self.rules.write().await;
        let rule = rules
            .iter_mut()
            .find(|r| r.id == rule_id)
            .ok_or_else(|| Error::RuleNotFound(rule_id.to_string()))?;
        rule.enabled = enabled;
        info!(rule = %rule.name, enabled, "escalation rule toggled");
        Ok(())
    }

    /// Add a rule at runtime.
    pub async fn add_rule(&self, rule: EscalationRule) {
        self.rules.write().await.push(rule);
    }

    /// Snapshot of the configured rules.
    pub async fn rules(&self) -> Vec<EscalationRule> {
        self.rules.read().await.clone()
    }
}
