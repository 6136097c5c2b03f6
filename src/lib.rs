//! # slaguard - SLA tracking and escalation engine
//!
//! Tracks incident SLA compliance and automatically escalates incidents
//! that breach, or are at risk of breaching, their deadlines:
//! - **Policy**: per-severity response/resolution targets
//! - **SLA**: live status computation, breach detection, metrics
//! - **Escalation**: rule matching and best-effort action execution
//! - **Engine**: the recurring evaluation tick tying it together
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use slaguard::engine::{EngineConfig, SlaEngine};
//! use slaguard::escalation::{ActionType, EscalationAction, EscalationRule, EscalationTrigger};
//! use slaguard::policy::PolicyCatalog;
//! use std::sync::Arc;
//!
//! # fn handler() -> Arc<dyn slaguard::escalation::ActionHandler> { unimplemented!() }
//! #[tokio::main]
//! async fn main() {
//!     let rule = EscalationRule::new("critical-breach", EscalationTrigger::Breach)
//!         .with_action(EscalationAction::new(ActionType::NotifyTeam, 1))
//!         .with_action(EscalationAction::new(ActionType::PageOncall, 2));
//!
//!     let engine = Arc::new(SlaEngine::new(
//!         PolicyCatalog::standard(),
//!         vec![rule],
//!         handler(),
//!         EngineConfig::default(),
//!     ));
//!
//!     let report = engine.tick(&[]).await;
//!     println!("{} new breaches", report.new_breaches.len());
//! }
//! ```

pub mod core;
pub mod engine;
pub mod escalation;
pub mod policy;
pub mod sla;

pub use core::error::{Error, Result};
