//! Common types used across slaguard modules.

use serde::{Deserialize, Serialize};

/// Timestamp wrapper for consistent serialization.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Get current UTC timestamp.
pub fn now() -> Timestamp {
    chrono::Utc::now()
}

/// Generate a new unique identifier.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Incident severity level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Service down or major functionality broken
    Critical,
    /// Significant degradation
    High,
    /// Partial, recoverable impact
    Medium,
    /// Minor issue
    Low,
}

impl Severity {
    /// All severities, most severe first.
    pub fn all() -> [Severity; 4] {
        [
            Severity::Critical,
            Severity::High,
            Severity::Medium,
            Severity::Low,
        ]
    }

    /// One step more severe, saturating at critical.
    pub fn escalated(&self) -> Severity {
        match self {
            Severity::Critical | Severity::High => Severity::Critical,
            Severity::Medium => Severity::High,
            Severity::Low => Severity::Medium,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

/// Incident lifecycle status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IncidentStatus {
    /// Reported, not yet picked up
    New,
    /// Being worked on
    InProgress,
    /// Waiting on an approval step
    PendingApproval,
    /// Fixed and closed
    Resolved,
    /// Closed without resolution
    Failed,
}

impl IncidentStatus {
    /// Whether the incident has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, IncidentStatus::Resolved | IncidentStatus::Failed)
    }
}

impl std::fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IncidentStatus::New => write!(f, "new"),
            IncidentStatus::InProgress => write!(f, "in-progress"),
            IncidentStatus::PendingApproval => write!(f, "pending-approval"),
            IncidentStatus::Resolved => write!(f, "resolved"),
            IncidentStatus::Failed => write!(f, "failed"),
        }
    }
}

/// An incident as supplied by the incident store.
///
/// The engine only reads incidents; mutations (severity upgrades,
/// auto-approval) are requested back through action handlers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Incident {
    /// Incident ID
    pub id: String,
    /// Short title
    pub title: String,
    /// Severity
    pub severity: Severity,
    /// Lifecycle status
    pub status: IncidentStatus,
    /// Creation time
    pub created_at: Timestamp,
    /// Last mutation time
    pub updated_at: Timestamp,
    /// When a responder first acted, if they have
    pub first_response_at: Option<Timestamp>,
}

impl Incident {
    /// Create a new incident record.
    pub fn new(id: &str, title: &str, severity: Severity) -> Self {
        let created = now();
        Self {
            id: id.to_string(),
            title: title.to_string(),
            severity,
            status: IncidentStatus::New,
            created_at: created,
            updated_at: created,
            first_response_at: None,
        }
    }

    /// Set status.
    pub fn with_status(mut self, status: IncidentStatus) -> Self {
        self.status = status;
        self
    }

    /// Set creation time.
    pub fn with_created_at(mut self, created_at: Timestamp) -> Self {
        self.created_at = created_at;
        self
    }

    /// Set first response time.
    pub fn with_first_response_at(mut self, at: Timestamp) -> Self {
        self.first_response_at = Some(at);
        self
    }

    /// Whether the incident is still being tracked against its SLA.
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }
}
