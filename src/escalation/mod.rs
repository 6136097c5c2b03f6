//! Escalation Module
//!
//! Provides automated escalation of breached and at-risk incidents:
//! - Rule definitions (triggers, conditions, ordered actions)
//! - Fan-out rule matching with cooldown and execution caps
//! - Best-effort action execution with per-action outcomes

pub mod execution;
pub mod executor;
pub mod matcher;
pub mod rule;

pub use execution::{ActionOutcome, EscalationExecution, ExecutionStatus};
pub use executor::{ActionHandler, EscalationExecutor, ExecutorConfig};
pub use matcher::RuleMatcher;
pub use rule::{
    ActionType, EscalationAction, EscalationRule, EscalationTrigger, RuleConditions,
};
