//! Escalation rule matching.
//!
//! Selects every applicable rule for a firing trigger. Matching is a
//! fan-out: all applicable rules fire, there is no single winner.

use crate::core::types::{Incident, Timestamp};
use crate::escalation::execution::EscalationExecution;
use crate::escalation::rule::{EscalationRule, EscalationTrigger};
use crate::sla::detector::SlaBreach;
use crate::sla::status::SlaStatus;
use chrono::Duration;
use tracing::debug;

/// Matches escalation rules against incident state and execution history.
#[derive(Clone, Debug, Default)]
pub struct RuleMatcher;

impl RuleMatcher {
    /// Create a new matcher.
    pub fn new() -> Self {
        Self
    }

    /// Return every rule applicable to this trigger, in candidate order.
    ///
    /// `history` holds prior executions for this incident (any rule);
    /// cooldown and max-executions are checked against it.
    #[allow(clippy::too_many_arguments)]
    pub fn matching_rules<'a>(
        &self,
        incident: &Incident,
        status: &SlaStatus,
        breach: Option<&SlaBreach>,
        trigger: EscalationTrigger,
        rules: &'a [EscalationRule],
        history: &[EscalationExecution],
        at: Timestamp,
    ) -> Vec<&'a EscalationRule> {
        rules
            .iter()
            .filter(|rule| {
                self.is_applicable(rule, incident, status, breach, trigger, history, at)
            })
            .collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn is_applicable(
        &self,
        rule: &EscalationRule,
        incident: &Incident,
        status: &SlaStatus,
        breach: Option<&SlaBreach>,
        trigger: EscalationTrigger,
        history: &[EscalationExecution],
        at: Timestamp,
    ) -> bool {
        if !rule.enabled || rule.trigger != trigger {
            return false;
        }

        let conditions = &rule.conditions;

        if let Some(severities) = &conditions.severities {
            if !severities.contains(&incident.severity) {
                return false;
            }
        }

        if let Some(breach_types) = &conditions.breach_types {
            let breach_type = breach.map(|b| b.breach_type).unwrap_or(status.breach_type);
            if !breach_types.contains(&breach_type) {
                return false;
            }
        }

        if let Some(threshold) = conditions.at_risk_threshold_pct {
            if status.percent_complete < threshold {
                return false;
            }
        }

        if let Some(threshold) = conditions.time_over_threshold_ms {
            if status.time_over_breach_ms < threshold {
                return false;
            }
        }

        let prior: Vec<&EscalationExecution> = history
            .iter()
            .filter(|e| e.rule_id == rule.id && e.incident_id == incident.id)
            .collect();

        if let Some(max) = rule.max_executions {
            if prior.len() >= max as usize {
                debug!(
                    rule_id = %rule.id,
                    incident_id = %incident.id,
                    "max executions reached, suppressing"
                );
                return false;
            }
        }

        if let Some(cooldown_ms) = rule.cooldown_ms {
            let last_fired = prior.iter().map(|e| e.triggered_at).max();
            if let Some(last) = last_fired {
                if at - last < Duration::milliseconds(cooldown_ms) {
                    debug!(
                        rule_id = %rule.id,
                        incident_id = %incident.id,
                        "rule in cooldown, suppressing"
                    );
                    return false;
                }
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{now, Severity};
    use crate::escalation::rule::{ActionType, EscalationAction};
    use crate::sla::status::{BreachType, SlaState};

    fn breached_status(incident_id: &str) -> SlaStatus {
        SlaStatus {
            incident_id: incident_id.to_string(),
            state: SlaState::Breached,
            percent_complete: 102.0,
            time_to_breach_ms: -100_000,
            resolution_breached: true,
            breach_type: BreachType::Resolution,
            time_over_breach_ms: 100_000,
        }
    }

    fn critical_incident(id: &str) -> Incident {
        Incident::new(id, "Outage", Severity::Critical)
    }

    fn breach_rule() -> EscalationRule {
        EscalationRule::new("critical-breach", EscalationTrigger::Breach)
            .with_severities(vec![Severity::Critical])
            .with_action(EscalationAction::new(ActionType::NotifyTeam, 1))
    }

    fn execution_for(rule: &EscalationRule, incident_id: &str) -> EscalationExecution {
        EscalationExecution::new(&rule.id, incident_id, EscalationTrigger::Breach)
    }

    #[test]
    fn test_matches_enabled_rule() {
        let matcher = RuleMatcher::new();
        let incident = critical_incident("inc-1");
        let rules = vec![breach_rule()];

        let matched = matcher.matching_rules(
            &incident,
            &breached_status("inc-1"),
            None,
            EscalationTrigger::Breach,
            &rules,
            &[],
            now(),
        );
        assert_eq!(matched.len(), 1);
    }

    #[test]
    fn test_disabled_rule_never_matches() {
        let matcher = RuleMatcher::new();
        let incident = critical_incident("inc-1");
        let mut rule = breach_rule();
        rule.enabled = false;
        let rules = vec![rule];

        let matched = matcher.matching_rules(
            &incident,
            &breached_status("inc-1"),
            None,
            EscalationTrigger::Breach,
            &rules,
            &[],
            now(),
        );
        assert!(matched.is_empty());
    }

    #[test]
    fn test_trigger_must_match() {
        let matcher = RuleMatcher::new();
        let incident = critical_incident("inc-1");
        let rules = vec![breach_rule()];

        let matched = matcher.matching_rules(
            &incident,
            &breached_status("inc-1"),
            None,
            EscalationTrigger::AtRisk,
            &rules,
            &[],
            now(),
        );
        assert!(matched.is_empty());
    }

    #[test]
    fn test_severity_condition() {
        let matcher = RuleMatcher::new();
        let incident = Incident::new("inc-1", "Slow dashboard", Severity::Low);
        let rules = vec![breach_rule()];

        let matched = matcher.matching_rules(
            &incident,
            &breached_status("inc-1"),
            None,
            EscalationTrigger::Breach,
            &rules,
            &[],
            now(),
        );
        assert!(matched.is_empty());
    }

    #[test]
    fn test_breach_type_condition() {
        let matcher = RuleMatcher::new();
        let incident = critical_incident("inc-1");
        let rules = vec![breach_rule().with_breach_types(vec![BreachType::Response])];

        // Status carries a resolution breach; the rule wants response
        let matched = matcher.matching_rules(
            &incident,
            &breached_status("inc-1"),
            None,
            EscalationTrigger::Breach,
            &rules,
            &[],
            now(),
        );
        assert!(matched.is_empty());
    }

    #[test]
    fn test_time_over_threshold_condition() {
        let matcher = RuleMatcher::new();
        let incident = critical_incident("inc-1");
        let rules = vec![
            breach_rule().with_time_over_threshold(50_000),
            breach_rule().with_time_over_threshold(500_000),
        ];

        // 100,000ms over the deadline: first rule matches, second does not
        let matched = matcher.matching_rules(
            &incident,
            &breached_status("inc-1"),
            None,
            EscalationTrigger::Breach,
            &rules,
            &[],
            now(),
        );
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].conditions.time_over_threshold_ms, Some(50_000));
    }

    #[test]
    fn test_at_risk_threshold_condition() {
        let matcher = RuleMatcher::new();
        let incident = critical_incident("inc-1");
        let status = SlaStatus {
            incident_id: "inc-1".to_string(),
            state: SlaState::AtRisk,
            percent_complete: 85.0,
            time_to_breach_ms: 540_000,
            resolution_breached: false,
            breach_type: BreachType::None,
            time_over_breach_ms: 0,
        };
        let rules = vec![
            EscalationRule::new("at-risk-85", EscalationTrigger::AtRisk).with_at_risk_threshold(80.0),
            EscalationRule::new("at-risk-95", EscalationTrigger::AtRisk).with_at_risk_threshold(95.0),
        ];

        let matched = matcher.matching_rules(
            &incident,
            &status,
            None,
            EscalationTrigger::AtRisk,
            &rules,
            &[],
            now(),
        );
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].name, "at-risk-85");
    }

    #[test]
    fn test_cooldown_suppresses() {
        let matcher = RuleMatcher::new();
        let incident = critical_incident("inc-1");
        let rule = breach_rule().with_cooldown_ms(1_800_000);
        let history = vec![execution_for(&rule, "inc-1")];
        let rules = vec![rule];

        let matched = matcher.matching_rules(
            &incident,
            &breached_status("inc-1"),
            None,
            EscalationTrigger::Breach,
            &rules,
            &history,
            now(),
        );
        assert!(matched.is_empty());
    }

    #[test]
    fn test_cooldown_elapsed_allows_refire() {
        let matcher = RuleMatcher::new();
        let incident = critical_incident("inc-1");
        let rule = breach_rule().with_cooldown_ms(1_800_000);
        let mut past = execution_for(&rule, "inc-1");
        past.triggered_at = now() - Duration::milliseconds(2_000_000);
        let history = vec![past];
        let rules = vec![rule];

        let matched = matcher.matching_rules(
            &incident,
            &breached_status("inc-1"),
            None,
            EscalationTrigger::Breach,
            &rules,
            &history,
            now(),
        );
        assert_eq!(matched.len(), 1);
    }

    #[test]
    fn test_cooldown_is_per_incident() {
        let matcher = RuleMatcher::new();
        let incident = critical_incident("inc-2");
        let rule = breach_rule().with_cooldown_ms(1_800_000);
        // Recent firing, but for a different incident
        let history = vec![execution_for(&rule, "inc-1")];
        let rules = vec![rule];

        let matched = matcher.matching_rules(
            &incident,
            &breached_status("inc-2"),
            None,
            EscalationTrigger::Breach,
            &rules,
            &history,
            now(),
        );
        assert_eq!(matched.len(), 1);
    }

    #[test]
    fn test_max_executions_cap() {
        let matcher = RuleMatcher::new();
        let incident = critical_incident("inc-1");
        let rule = breach_rule().with_max_executions(2);
        let mut history = vec![execution_for(&rule, "inc-1"), execution_for(&rule, "inc-1")];
        for (i, e) in history.iter_mut().enumerate() {
            e.triggered_at = now() - Duration::milliseconds(10_000_000 * (i as i64 + 1));
        }
        let rules = vec![rule];

        let matched = matcher.matching_rules(
            &incident,
            &breached_status("inc-1"),
            None,
            EscalationTrigger::Breach,
            &rules,
            &history,
            now(),
        );
        assert!(matched.is_empty());
    }

    #[test]
    fn test_fan_out_all_applicable_rules() {
        let matcher = RuleMatcher::new();
        let incident = critical_incident("inc-1");
        let rules = vec![
            breach_rule(),
            EscalationRule::new("page-on-any-breach", EscalationTrigger::Breach)
                .with_action(EscalationAction::new(ActionType::PageOncall, 1)),
        ];

        let matched = matcher.matching_rules(
            &incident,
            &breached_status("inc-1"),
            None,
            EscalationTrigger::Breach,
            &rules,
            &[],
            now(),
        );
        assert_eq!(matched.len(), 2);
    }
}
