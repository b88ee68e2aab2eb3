use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severity levels for activity log entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Deletions and review decisions
    Critical,
    /// Ordinary mutations
    #[default]
    Important,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Important => "important",
        }
    }
}

/// Entities whose mutations are recorded in the activity log.
pub trait Loggable: Serialize + Send + Sync {
    /// Prefix of event names, e.g. "report" in "report.created"
    fn entity_type() -> &'static str;

    /// The subject ID (usually the entity's primary key)
    fn subject_id(&self) -> Uuid;

    /// Severity level for logs (defaults to Important)
    fn severity(&self) -> Severity {
        Severity::Important
    }

    /// Severity of a specific action; deletions are always critical
    fn severity_for_action(&self, action: &str) -> Severity {
        match action {
            "deleted" => Severity::Critical,
            "created" | "updated" => self.severity(),
            _ => Severity::Important,
        }
    }
}
