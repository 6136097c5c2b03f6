//! Live SLA status computation.
//!
//! Pure calculation of one incident's standing against its policy.

use crate::core::types::{Incident, Timestamp};
use crate::policy::SlaPolicy;
use serde::{Deserialize, Serialize};

/// Default percent-complete threshold at which an incident becomes at-risk.
pub const DEFAULT_AT_RISK_THRESHOLD_PCT: f64 = 80.0;

/// Where an incident stands against its SLA deadlines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlaState {
    /// Within deadline, below the at-risk threshold
    OnTrack,
    /// Approaching the resolution deadline
    AtRisk,
    /// Past a deadline
    Breached,
}

impl std::fmt::Display for SlaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlaState::OnTrack => write!(f, "on-track"),
            SlaState::AtRisk => write!(f, "at-risk"),
            SlaState::Breached => write!(f, "breached"),
        }
    }
}

/// Which deadline(s) an incident has exceeded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreachType {
    /// No deadline exceeded
    None,
    /// First-response deadline exceeded
    Response,
    /// Resolution deadline exceeded
    Resolution,
    /// Both deadlines exceeded
    Both,
}

impl BreachType {
    /// Whether the response deadline is part of this breach.
    pub fn includes_response(&self) -> bool {
        matches!(self, BreachType::Response | BreachType::Both)
    }

    /// Whether the resolution deadline is part of this breach.
    pub fn includes_resolution(&self) -> bool {
        matches!(self, BreachType::Resolution | BreachType::Both)
    }
}

impl std::fmt::Display for BreachType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BreachType::None => write!(f, "none"),
            BreachType::Response => write!(f, "response"),
            BreachType::Resolution => write!(f, "resolution"),
            BreachType::Both => write!(f, "both"),
        }
    }
}

/// Derived SLA standing for one incident.
///
/// Recomputed on demand; never persisted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SlaStatus {
    /// Incident ID
    pub incident_id: String,
    /// On-track, at-risk, or breached
    pub state: SlaState,
    /// Elapsed time as a percentage of the resolution target (0 to unbounded)
    pub percent_complete: f64,
    /// Time until the resolution deadline (ms, negative once past)
    pub time_to_breach_ms: i64,
    /// Whether the resolution deadline has passed
    pub resolution_breached: bool,
    /// Which deadline(s) are exceeded
    pub breach_type: BreachType,
    /// How far past the deadline (ms, 0 unless breached)
    pub time_over_breach_ms: i64,
}

impl SlaStatus {
    /// Whether any deadline has been exceeded.
    pub fn is_breached(&self) -> bool {
        self.state == SlaState::Breached
    }
}

/// Pure SLA status calculator.
///
/// Deterministic given the supplied `now`; evaluating the same incident
/// repeatedly has no side effects.
#[derive(Clone, Debug)]
pub struct StatusCalculator {
    at_risk_threshold_pct: f64,
}

impl StatusCalculator {
    /// Create a calculator with the default at-risk threshold.
    pub fn new() -> Self {
        Self {
            at_risk_threshold_pct: DEFAULT_AT_RISK_THRESHOLD_PCT,
        }
    }

    /// Set the at-risk threshold (percent of resolution target consumed).
    pub fn with_at_risk_threshold(mut self, pct: f64) -> Self {
        self.at_risk_threshold_pct = pct;
        self
    }

    /// Compute the incident's standing against its policy at `now`.
    pub fn evaluate(&self, incident: &Incident, policy: &SlaPolicy, now: Timestamp) -> SlaStatus {
        let elapsed_ms = (now - incident.created_at).num_milliseconds().max(0);

        let resolution_target = policy.resolution_target_ms;
        let percent_complete = if resolution_target > 0 {
            elapsed_ms as f64 / resolution_target as f64 * 100.0
        } else {
            0.0
        };

        let resolution_breached = elapsed_ms >= resolution_target;

        // Response phase: the clock stops at first response. An incident
        // that was answered late stays response-breached.
        let response_elapsed_ms = match incident.first_response_at {
            Some(responded) => (responded - incident.created_at).num_milliseconds().max(0),
            None => elapsed_ms,
        };
        let response_breached = response_elapsed_ms >= policy.response_target_ms;

        let breach_type = match (response_breached, resolution_breached) {
            (true, true) => BreachType::Both,
            (true, false) => BreachType::Response,
            (false, true) => BreachType::Resolution,
            (false, false) => BreachType::None,
        };

        let state = if breach_type != BreachType::None {
            SlaState::Breached
        } else if percent_complete >= self.at_risk_threshold_pct {
            SlaState::AtRisk
        } else {
            SlaState::OnTrack
        };

        let time_over_breach_ms = match breach_type {
            BreachType::None => 0,
            _ => {
                let over_resolution = if resolution_breached {
                    elapsed_ms - resolution_target
                } else {
                    0
                };
                let over_response = if response_breached {
                    response_elapsed_ms - policy.response_target_ms
                } else {
                    0
                };
                over_resolution.max(over_response)
            }
        };

        SlaStatus {
            incident_id: incident.id.clone(),
            state,
            percent_complete,
            time_to_breach_ms: resolution_target - elapsed_ms,
            resolution_breached,
            breach_type,
            time_over_breach_ms,
        }
    }
}

impl Default for StatusCalculator {
    fn default() -> Self {
        Self::new()
    }
}
