use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;
use vaultline_core::{AppError, AppResult, OrgId};
use vaultline_domain::{Playbook, PlaybookId};

/// Status of one playbook run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybookRunStatus {
    /// Created but not yet resolved.
    Pending,
    /// Conditions matched and every action succeeded.
    Success,
    /// Conditions matched and at least one action failed, or evaluation broke.
    Failed,
    /// Conditions did not match.
    Skipped,
}

impl PlaybookRunStatus {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }

    /// Parses storage value.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "skipped" => Ok(Self::Skipped),
            _ => Err(AppError::Validation(format!(
                "unknown playbook run status '{value}'"
            ))),
        }
    }

    /// Returns whether no further transition is allowed.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns whether a run may move from this status to `next`.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(self, Self::Pending) && next.is_terminal()
    }
}

/// Diagnostic counters captured for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybookRunMetrics {
    /// Conditions evaluated.
    pub conditions_checked: usize,
    /// Conditions that held.
    pub conditions_matched: usize,
    /// Actions handed to the dispatcher.
    pub actions_attempted: usize,
    /// Actions that completed.
    pub actions_succeeded: usize,
    /// Actions that failed.
    pub actions_failed: usize,
    /// Wall time spent on the playbook in milliseconds.
    pub duration_ms: u64,
}

impl PlaybookRunMetrics {
    /// Returns the stored JSON form.
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "conditions_checked": self.conditions_checked,
            "conditions_matched": self.conditions_matched,
            "actions_attempted": self.actions_attempted,
            "actions_succeeded": self.actions_succeeded,
            "actions_failed": self.actions_failed,
            "duration_ms": self.duration_ms,
        })
    }
}

/// Run insertion payload for repository implementations.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybookRunDraft {
    /// Evaluated playbook.
    pub playbook_id: PlaybookId,
    /// Owning organization of the playbook.
    pub org_id: OrgId,
    /// Verbatim triggering payload.
    pub trigger_event: Value,
    /// Status the run is created with.
    pub status: PlaybookRunStatus,
    /// Diagnostic text, only kept for failed runs.
    pub error: Option<String>,
    /// Free-form metrics map.
    pub metrics: Value,
}

impl PlaybookRunDraft {
    /// Builds a draft already resolved to a terminal status.
    pub fn resolved(
        playbook: &Playbook,
        trigger_event: Value,
        status: PlaybookRunStatus,
        error: Option<String>,
        metrics: PlaybookRunMetrics,
    ) -> AppResult<Self> {
        if !PlaybookRunStatus::Pending.can_transition_to(status) {
            return Err(AppError::Validation(format!(
                "playbook run cannot be resolved with status '{}'",
                status.as_str()
            )));
        }

        Ok(Self {
            playbook_id: playbook.id(),
            org_id: playbook.org_id(),
            trigger_event,
            status,
            error: error.filter(|_| status == PlaybookRunStatus::Failed),
            metrics: metrics.to_json(),
        })
    }

    /// Builds a draft in pending state for actions that resolve later.
    #[must_use]
    pub fn pending(playbook: &Playbook, trigger_event: Value) -> Self {
        Self {
            playbook_id: playbook.id(),
            org_id: playbook.org_id(),
            trigger_event,
            status: PlaybookRunStatus::Pending,
            error: None,
            metrics: PlaybookRunMetrics::default().to_json(),
        }
    }

    /// Returns the completion timestamp a repository must store for this draft.
    #[must_use]
    pub fn completed_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.status.is_terminal().then_some(now)
    }
}

/// Persisted playbook run record.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybookRun {
    /// Stable run identifier.
    pub id: Uuid,
    /// Evaluated playbook.
    pub playbook_id: PlaybookId,
    /// Owning organization.
    pub org_id: OrgId,
    /// Verbatim triggering payload.
    pub trigger_event: Value,
    /// Run status.
    pub status: PlaybookRunStatus,
    /// Diagnostic text for failed runs.
    pub error: Option<String>,
    /// Free-form metrics map.
    pub metrics: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Set when the run reached a terminal status.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Playbook run listing query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybookRunListQuery {
    /// Optional playbook filter.
    pub playbook_id: Option<PlaybookId>,
    /// Page size.
    pub limit: usize,
    /// Row offset.
    pub offset: usize,
}

impl Default for PlaybookRunListQuery {
    fn default() -> Self {
        Self {
            playbook_id: None,
            limit: 50,
            offset: 0,
        }
    }
}
